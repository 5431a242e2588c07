//! Variant manifest (`topics/manifest.json`).
//!
//! The manifest enumerates the generated variants and names the default one.
//! It is the only artifact a client re-reads per session.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// File name of the manifest inside the topics directory.
pub const MANIFEST_FILE: &str = "manifest.json";

/// Description of one published variant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VariantInfo {
    pub display_name: String,
    pub version: String,
    #[serde(default)]
    pub last_built_timestamp: Option<DateTime<Utc>>,
}

/// Manifest document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub variants: BTreeMap<String, VariantInfo>,
    pub default_variant: String,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
}

impl Manifest {
    /// Minimal manifest listing a single variant that is also the default.
    pub fn single(variant: &str) -> Self {
        let mut variants = BTreeMap::new();
        variants.insert(
            variant.to_string(),
            VariantInfo {
                display_name: variant.to_string(),
                version: "unknown".to_string(),
                last_built_timestamp: None,
            },
        );
        Self {
            variants,
            default_variant: variant.to_string(),
            last_updated: None,
        }
    }

    pub fn contains(&self, variant: &str) -> bool {
        self.variants.contains_key(variant)
    }

    /// The default variant, or `fallback` when `defaultVariant` names a
    /// variant the manifest does not list.
    pub fn effective_default<'a>(&'a self, fallback: &'a str) -> &'a str {
        if self.contains(&self.default_variant) {
            &self.default_variant
        } else {
            fallback
        }
    }

    /// Insert or replace a variant entry, stamping build and update times.
    pub fn upsert_variant(
        &mut self,
        name: &str,
        display_name: &str,
        version: &str,
        built_at: DateTime<Utc>,
    ) {
        self.variants.insert(
            name.to_string(),
            VariantInfo {
                display_name: display_name.to_string(),
                version: version.to_string(),
                last_built_timestamp: Some(built_at),
            },
        );
        if !self.contains(&self.default_variant) {
            self.default_variant = name.to_string();
        }
        self.last_updated = Some(built_at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_wire_format() {
        let json = r#"{
            "variants": {
                "auto-v2.1": {"displayName": "Auto v2.1", "version": "2.1",
                              "lastBuiltTimestamp": "2025-03-01T12:00:00Z"}
            },
            "defaultVariant": "auto-v2.1",
            "lastUpdated": "2025-03-01T12:00:00Z"
        }"#;
        let manifest: Manifest = serde_json::from_str(json).unwrap();
        assert!(manifest.contains("auto-v2.1"));
        assert_eq!(manifest.variants["auto-v2.1"].display_name, "Auto v2.1");

        let out = serde_json::to_value(&manifest).unwrap();
        assert_eq!(out["defaultVariant"], "auto-v2.1");
        assert!(out["variants"]["auto-v2.1"]["lastBuiltTimestamp"].is_string());
    }

    #[test]
    fn test_effective_default_tolerates_missing_key() {
        let mut manifest = Manifest::single("auto-v2.1");
        manifest.default_variant = "gone".to_string();
        assert_eq!(manifest.effective_default("auto-v2.1"), "auto-v2.1");
    }

    #[test]
    fn test_upsert_keeps_existing_default() {
        let mut manifest = Manifest::single("auto-v2.1");
        manifest.upsert_variant("manual-v1", "Manual", "1.0", Utc::now());
        assert_eq!(manifest.default_variant, "auto-v2.1");
        assert_eq!(manifest.variants.len(), 2);
        assert!(manifest.last_updated.is_some());
    }

    #[test]
    fn test_upsert_repairs_dangling_default() {
        let mut manifest = Manifest {
            variants: BTreeMap::new(),
            default_variant: "nothing".to_string(),
            last_updated: None,
        };
        manifest.upsert_variant("v3", "V3", "3.0", Utc::now());
        assert_eq!(manifest.default_variant, "v3");
    }
}
