//! Variant Manifest Resolver.
//!
//! Decides which variant is active and turns artifact names into fetch
//! paths. Topic artifacts live under `{base}/{variant}/{file}`; raw podcast
//! data lives under `{podcasts_base}/{podcast}/{file}`. With a CDN base URL
//! configured, both are prefixed with it instead of staying same-origin.
//!
//! A locked variant pins the resolver for its whole lifetime: requests to
//! switch are ignored and every resolution returns the locked name.

use std::sync::{PoisonError, RwLock};

use tracing::{debug, error, info, warn};

use atlas_types::{ClientSettings, Manifest, DEFAULT_VARIANT, MANIFEST_FILE};

use crate::fetcher::{fetch_artifact, ArtifactSource};

/// Same-origin prefix of variant-scoped topic artifacts.
pub const TOPICS_BASE: &str = "/topics";

/// Same-origin prefix of podcast-scoped raw data.
pub const PODCASTS_BASE: &str = "/podcasts";

/// Immutable resolver configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverConfig {
    pub base: String,
    pub podcasts_base: String,
    /// External mirror; `None` keeps every path same-origin
    pub cdn_base_url: Option<String>,
    pub locked_variant: Option<String>,
    pub default_variant: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            base: TOPICS_BASE.to_string(),
            podcasts_base: PODCASTS_BASE.to_string(),
            cdn_base_url: None,
            locked_variant: None,
            default_variant: DEFAULT_VARIANT.to_string(),
        }
    }
}

impl ResolverConfig {
    pub fn with_cdn(mut self, url: impl Into<String>) -> Self {
        self.cdn_base_url = Some(url.into());
        self
    }

    pub fn with_locked_variant(mut self, variant: impl Into<String>) -> Self {
        self.locked_variant = Some(variant.into());
        self
    }

    pub fn with_default_variant(mut self, variant: impl Into<String>) -> Self {
        self.default_variant = variant.into();
        self
    }
}

impl From<&ClientSettings> for ResolverConfig {
    fn from(settings: &ClientSettings) -> Self {
        Self {
            cdn_base_url: settings
                .cdn_base_url
                .clone()
                .filter(|url| !url.trim().is_empty()),
            locked_variant: settings
                .locked_variant
                .clone()
                .filter(|v| !v.trim().is_empty()),
            default_variant: settings.default_variant.clone(),
            ..Default::default()
        }
    }
}

#[derive(Debug)]
struct ActiveVariant {
    name: String,
    /// Set through `set_variant` rather than defaulted
    explicit: bool,
}

/// Resolves the active variant and artifact paths.
#[derive(Debug)]
pub struct VariantResolver {
    config: ResolverConfig,
    active: RwLock<ActiveVariant>,
}

impl VariantResolver {
    pub fn new(config: ResolverConfig) -> Self {
        let name = config
            .locked_variant
            .clone()
            .unwrap_or_else(|| config.default_variant.clone());
        if let Some(locked) = &config.locked_variant {
            info!(variant = %locked, "Variant locked");
        }
        Self {
            config,
            active: RwLock::new(ActiveVariant {
                name,
                explicit: false,
            }),
        }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn locked_variant(&self) -> Option<&str> {
        self.config.locked_variant.as_deref()
    }

    pub fn is_locked(&self) -> bool {
        self.config.locked_variant.is_some()
    }

    pub fn active_variant(&self) -> String {
        self.active
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .name
            .clone()
    }

    /// Switch the active variant. Ignored while locked; returns whether the
    /// switch took effect.
    pub fn set_variant(&self, variant: &str) -> bool {
        if let Some(locked) = self.locked_variant() {
            if variant != locked {
                debug!(requested = variant, locked, "Ignoring variant change while locked");
            }
            return false;
        }
        let mut active = self.active.write().unwrap_or_else(PoisonError::into_inner);
        active.name = variant.to_string();
        active.explicit = true;
        true
    }

    /// Adopt the manifest's default variant unless locked or already chosen.
    pub fn adopt_manifest_default(&self, manifest: &Manifest) -> String {
        if self.is_locked() {
            return self.active_variant();
        }
        let mut active = self.active.write().unwrap_or_else(PoisonError::into_inner);
        if !active.explicit {
            active.name = manifest
                .effective_default(&self.config.default_variant)
                .to_string();
        }
        active.name.clone()
    }

    /// Variant a request resolves to: the locked one, else `requested`,
    /// else the active one.
    pub fn resolve_variant(&self, requested: Option<&str>) -> String {
        if let Some(locked) = self.locked_variant() {
            return locked.to_string();
        }
        match requested {
            Some(variant) => variant.to_string(),
            None => self.active_variant(),
        }
    }

    /// Path of a variant-scoped artifact.
    ///
    /// ```
    /// use atlas_client::{ResolverConfig, VariantResolver};
    ///
    /// let resolver = VariantResolver::new(ResolverConfig::default());
    /// assert_eq!(
    ///     resolver.resolve_path("taxonomy.json", None),
    ///     "/topics/auto-v2.1/taxonomy.json"
    /// );
    /// ```
    pub fn resolve_path(&self, file_name: &str, variant: Option<&str>) -> String {
        let variant = self.resolve_variant(variant);
        self.external(&format!("{}/{}/{}", self.config.base, variant, file_name))
    }

    pub fn manifest_path(&self) -> String {
        self.external(&format!("{}/{}", self.config.base, MANIFEST_FILE))
    }

    /// Path of podcast-scoped raw data (episodes, speaker stats, indices).
    pub fn podcast_path(&self, podcast_id: &str, file_name: &str) -> String {
        self.external(&format!(
            "{}/{}/{}",
            self.config.podcasts_base, podcast_id, file_name
        ))
    }

    fn external(&self, relative: &str) -> String {
        match &self.config.cdn_base_url {
            Some(cdn) => format!("{}{}", cdn.trim_end_matches('/'), relative),
            None => relative.to_string(),
        }
    }

    /// Manifest used when the real one cannot be loaded: a single entry for
    /// the locked variant, or the default one.
    pub fn fallback_manifest(&self) -> Manifest {
        let variant = self
            .locked_variant()
            .unwrap_or(&self.config.default_variant);
        Manifest::single(variant)
    }

    /// Fetch the manifest, substituting [`Self::fallback_manifest`] on any
    /// failure.
    pub async fn get_manifest<S>(&self, source: &S) -> Manifest
    where
        S: ArtifactSource + ?Sized,
    {
        let path = self.manifest_path();
        match fetch_artifact::<Manifest, _>(source, &path).await {
            Ok(manifest) => {
                debug!(path = %path, variants = manifest.variants.len(), "Loaded manifest");
                manifest
            }
            Err(e) if e.is_decode() => {
                error!(error = %e, "Manifest is not valid; using fallback");
                self.fallback_manifest()
            }
            Err(e) => {
                warn!(error = %e, "Manifest unavailable; using fallback");
                self.fallback_manifest()
            }
        }
    }
}
