//! Variant registry (`variants.json`) and manifest publication.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use atlas_types::{Manifest, ProjectionConfig, MANIFEST_FILE};

use crate::error::PipelineError;
use crate::inputs::read_optional_json;
use crate::writer::{ArtifactWriter, WriteReport};

const UNVERSIONED: &str = "unknown";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct VariantsConfig {
    #[serde(default)]
    pub variants: BTreeMap<String, VariantDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct VariantDefinition {
    #[serde(default)]
    pub version: String,
    /// Display name
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub settings: VariantSettings,
}

/// Projection overrides. Unknown keys in the file are ignored.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VariantSettings {
    pub n_neighbors: Option<usize>,
    pub min_dist: Option<f32>,
    pub spread: Option<f32>,
    pub n_epochs: Option<usize>,
    pub seed: Option<u64>,
}

impl VariantSettings {
    /// `base` with every override that is set applied on top.
    pub fn apply(&self, base: &ProjectionConfig) -> ProjectionConfig {
        ProjectionConfig {
            n_neighbors: self.n_neighbors.unwrap_or(base.n_neighbors),
            min_dist: self.min_dist.unwrap_or(base.min_dist),
            spread: self.spread.unwrap_or(base.spread),
            n_epochs: self.n_epochs.unwrap_or(base.n_epochs),
            seed: self.seed.or(base.seed),
            ..base.clone()
        }
    }
}

/// The variant a run generates, with its effective projection settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedVariant {
    pub name: String,
    pub display_name: String,
    pub version: String,
    pub projection: ProjectionConfig,
}

/// Look up `variant` in the registry at `path` and apply its overrides.
///
/// A missing registry means no overrides.
///
/// # Errors
///
/// `Config` if `variant` is not a single path segment or the merged
/// projection settings are invalid; `VariantNotFound` if the registry exists
/// but does not define `variant`.
pub fn resolve_variant(
    path: &Path,
    variant: &str,
    base: &ProjectionConfig,
) -> Result<ResolvedVariant, PipelineError> {
    validate_variant_name(variant)?;

    let resolved = match read_optional_json::<VariantsConfig>(path)? {
        None => {
            warn!(path = %path.display(), "Variant registry not found; using configured settings");
            ResolvedVariant {
                name: variant.to_string(),
                display_name: variant.to_string(),
                version: UNVERSIONED.to_string(),
                projection: base.clone(),
            }
        }
        Some(registry) => {
            let definition = registry
                .variants
                .get(variant)
                .ok_or_else(|| PipelineError::VariantNotFound(variant.to_string()))?;
            info!(
                variant,
                display_name = %definition.name,
                version = %definition.version,
                "Loaded variant"
            );
            ResolvedVariant {
                name: variant.to_string(),
                display_name: non_empty_or(&definition.name, variant),
                version: non_empty_or(&definition.version, UNVERSIONED),
                projection: definition.settings.apply(base),
            }
        }
    };

    resolved.projection.validate().map_err(PipelineError::Config)?;
    Ok(resolved)
}

/// Variant names become directory names under `topics/`.
fn validate_variant_name(variant: &str) -> Result<(), PipelineError> {
    let trimmed = variant.trim();
    if trimmed.is_empty()
        || trimmed != variant
        || variant.contains(['/', '\\'])
        || variant.contains("..")
    {
        return Err(PipelineError::Config(format!("invalid variant name '{variant}'")));
    }
    Ok(())
}

fn non_empty_or(value: &str, fallback: &str) -> String {
    if value.is_empty() {
        fallback.to_string()
    } else {
        value.to_string()
    }
}

/// Read the canonical manifest of `topics_writer`'s directory, if present.
///
/// # Errors
///
/// `MalformedInput` if the file exists but does not decode.
pub fn load_manifest(topics_writer: &ArtifactWriter) -> Result<Option<Manifest>, PipelineError> {
    read_optional_json(&topics_writer.canonical_dir().join(MANIFEST_FILE))
}

/// Record `variant` as built on top of `existing` (from [`load_manifest`])
/// and write the result through the writer so the public copy matches.
pub fn publish_manifest(
    topics_writer: &ArtifactWriter,
    existing: Option<Manifest>,
    variant: &ResolvedVariant,
    built_at: DateTime<Utc>,
) -> Result<(Manifest, WriteReport), PipelineError> {
    let mut manifest = match existing {
        Some(existing) => existing,
        None => Manifest {
            variants: BTreeMap::new(),
            default_variant: variant.name.clone(),
            last_updated: None,
        },
    };

    manifest.upsert_variant(
        &variant.name,
        &variant.display_name,
        &variant.version,
        built_at,
    );

    let report = topics_writer.write_artifact(MANIFEST_FILE, &manifest)?;
    info!(
        variant = %variant.name,
        default_variant = %manifest.default_variant,
        variants = manifest.variants.len(),
        "Published manifest"
    );
    Ok((manifest, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const REGISTRY: &str = r#"{
        "variants": {
            "auto-v2.1": {
                "version": "2.1",
                "name": "Auto V2.1",
                "settings": {"nNeighbors": 30, "minDist": 0.05, "minClusterSize": 8}
            },
            "plain": {"version": "", "name": "", "settings": {}}
        }
    }"#;

    fn registry(temp: &TempDir) -> std::path::PathBuf {
        let path = temp.path().join("variants.json");
        fs::write(&path, REGISTRY).unwrap();
        path
    }

    #[test]
    fn test_overrides_applied() {
        let temp = TempDir::new().unwrap();
        let base = ProjectionConfig::default();
        let resolved = resolve_variant(&registry(&temp), "auto-v2.1", &base).unwrap();

        assert_eq!(resolved.display_name, "Auto V2.1");
        assert_eq!(resolved.version, "2.1");
        assert_eq!(resolved.projection.n_neighbors, 30);
        assert!((resolved.projection.min_dist - 0.05).abs() < 1e-6);
        assert_eq!(resolved.projection.n_epochs, base.n_epochs);
    }

    #[test]
    fn test_blank_names_fall_back() {
        let temp = TempDir::new().unwrap();
        let resolved =
            resolve_variant(&registry(&temp), "plain", &ProjectionConfig::default()).unwrap();
        assert_eq!(resolved.display_name, "plain");
        assert_eq!(resolved.version, "unknown");
    }

    #[test]
    fn test_unknown_variant_is_error() {
        let temp = TempDir::new().unwrap();
        let err = resolve_variant(&registry(&temp), "nope", &ProjectionConfig::default())
            .unwrap_err();
        assert!(matches!(err, PipelineError::VariantNotFound(ref v) if v == "nope"));
    }

    #[test]
    fn test_missing_registry_means_no_overrides() {
        let temp = TempDir::new().unwrap();
        let base = ProjectionConfig::default();
        let resolved =
            resolve_variant(&temp.path().join("variants.json"), "anything", &base).unwrap();
        assert_eq!(resolved.name, "anything");
        assert_eq!(resolved.projection, base);
    }

    #[test]
    fn test_invalid_override_rejected() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("variants.json");
        fs::write(&path, r#"{"variants": {"bad": {"settings": {"nNeighbors": 1}}}}"#).unwrap();
        let err = resolve_variant(&path, "bad", &ProjectionConfig::default()).unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));
    }

    fn resolved(name: &str) -> ResolvedVariant {
        ResolvedVariant {
            name: name.to_string(),
            display_name: name.to_uppercase(),
            version: "1".to_string(),
            projection: ProjectionConfig::default(),
        }
    }

    #[test]
    fn test_publish_manifest_upserts() {
        let temp = TempDir::new().unwrap();
        let writer = ArtifactWriter::new(temp.path(), None).scoped("topics");

        assert!(load_manifest(&writer).unwrap().is_none());
        let (first, _) = publish_manifest(&writer, None, &resolved("v1"), Utc::now()).unwrap();
        assert_eq!(first.default_variant, "v1");
        assert!(first.variants["v1"].last_built_timestamp.is_some());

        let existing = load_manifest(&writer).unwrap();
        assert_eq!(existing.as_ref(), Some(&first));
        let (second, report) =
            publish_manifest(&writer, existing, &resolved("v2"), Utc::now()).unwrap();
        assert_eq!(second.default_variant, "v1");
        assert_eq!(second.variants.len(), 2);
        assert_eq!(second.variants["v2"].display_name, "V2");

        let on_disk: Manifest =
            serde_json::from_slice(&fs::read(report.canonical).unwrap()).unwrap();
        assert_eq!(on_disk, second);
    }

    #[test]
    fn test_corrupt_manifest_is_malformed() {
        let temp = TempDir::new().unwrap();
        let writer = ArtifactWriter::new(temp.path(), None).scoped("topics");
        fs::create_dir_all(writer.canonical_dir()).unwrap();
        fs::write(writer.canonical_dir().join(MANIFEST_FILE), "not json").unwrap();

        let err = load_manifest(&writer).unwrap_err();
        assert!(matches!(err, PipelineError::MalformedInput(_)));
    }

    #[test]
    fn test_variant_name_must_be_single_segment() {
        let temp = TempDir::new().unwrap();
        let path = registry(&temp);
        for name in ["../x", "a/b", "a\\b", "..", "", " v1"] {
            let err = resolve_variant(&path, name, &ProjectionConfig::default()).unwrap_err();
            assert!(
                matches!(err, PipelineError::Config(ref m) if m.contains("invalid variant name")),
                "{name:?} accepted"
            );
        }
    }
}
