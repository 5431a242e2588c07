//! Configuration loading for Podcast Atlas.
//!
//! Layered config: defaults -> config file -> env vars -> CLI flags.
//! The default config file lives at `~/.config/podcast-atlas/config.toml`
//! (platform equivalent via `directories`).

use config::{Config, Environment, File};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::AtlasError;

/// Variant used when neither the configuration nor the manifest names one.
pub const DEFAULT_VARIANT: &str = "auto-v2.1";

/// Parameters for the 2-D topic projection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProjectionConfig {
    /// Size of the local neighborhood used to build the fuzzy graph.
    #[serde(default = "default_n_neighbors")]
    pub n_neighbors: usize,

    /// Minimum distance between embedded points.
    #[serde(default = "default_min_dist")]
    pub min_dist: f32,

    /// Effective scale of embedded points; together with `min_dist`
    /// controls how clumped the layout is.
    #[serde(default = "default_spread")]
    pub spread: f32,

    /// Optimization epochs.
    #[serde(default = "default_n_epochs")]
    pub n_epochs: usize,

    /// Initial SGD learning rate.
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f32,

    /// Negative samples per positive edge sample.
    #[serde(default = "default_negative_sample_rate")]
    pub negative_sample_rate: usize,

    /// Seed for the random source. Unseeded runs draw from OS entropy.
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_n_neighbors() -> usize {
    15
}
fn default_min_dist() -> f32 {
    0.1
}
fn default_spread() -> f32 {
    1.0
}
fn default_n_epochs() -> usize {
    200
}
fn default_learning_rate() -> f32 {
    1.0
}
fn default_negative_sample_rate() -> usize {
    5
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            n_neighbors: default_n_neighbors(),
            min_dist: default_min_dist(),
            spread: default_spread(),
            n_epochs: default_n_epochs(),
            learning_rate: default_learning_rate(),
            negative_sample_rate: default_negative_sample_rate(),
            seed: None,
        }
    }
}

impl ProjectionConfig {
    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.n_neighbors < 2 {
            return Err(format!("n_neighbors must be >= 2, got {}", self.n_neighbors));
        }
        if self.spread <= 0.0 {
            return Err(format!("spread must be > 0, got {}", self.spread));
        }
        if self.min_dist < 0.0 || self.min_dist > self.spread {
            return Err(format!(
                "min_dist must be within 0.0..=spread ({}), got {}",
                self.spread, self.min_dist
            ));
        }
        if self.n_epochs == 0 {
            return Err("n_epochs must be > 0".to_string());
        }
        Ok(())
    }
}

/// Ranking sizes for co-occurrence summaries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CooccurrenceConfig {
    /// Top-K entities by episode count in the cluster artifact
    #[serde(default = "default_cluster_top_k")]
    pub cluster_top_k: usize,

    /// Top-K entities by episode count in the speaker artifact
    #[serde(default = "default_speaker_top_k")]
    pub speaker_top_k: usize,
}

fn default_cluster_top_k() -> usize {
    20
}
fn default_speaker_top_k() -> usize {
    15
}

impl Default for CooccurrenceConfig {
    fn default() -> Self {
        Self {
            cluster_top_k: default_cluster_top_k(),
            speaker_top_k: default_speaker_top_k(),
        }
    }
}

/// Boilerplate topic filtering applied before projection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Topics present in at least this share of all episodes are dropped.
    #[serde(default = "default_ubiquitous_share")]
    pub ubiquitous_topic_max_episode_share: f64,

    /// Drop topics whose label mentions intro/outro.
    #[serde(default = "default_true")]
    pub drop_intro_outro: bool,
}

fn default_ubiquitous_share() -> f64 {
    0.90
}
fn default_true() -> bool {
    true
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            ubiquitous_topic_max_episode_share: default_ubiquitous_share(),
            drop_intro_outro: default_true(),
        }
    }
}

/// Runtime client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientSettings {
    /// External content store. When set, topic-manifest, variant artifact
    /// and podcast fetches go to this mirror instead of same-origin paths.
    #[serde(default)]
    pub cdn_base_url: Option<String>,

    /// Single-variant deployment: every variant change request is ignored.
    #[serde(default)]
    pub locked_variant: Option<String>,

    /// Variant used when nothing else selects one
    #[serde(default = "default_variant")]
    pub default_variant: String,

    /// Origin that same-origin relative paths are resolved against
    #[serde(default)]
    pub origin: Option<String>,
}

fn default_variant() -> String {
    DEFAULT_VARIANT.to_string()
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            cdn_base_url: None,
            locked_variant: None,
            default_variant: default_variant(),
            origin: None,
        }
    }
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Podcast the run derives artifacts for
    #[serde(default = "default_podcast_id")]
    pub podcast_id: String,

    /// Root that relative input paths are resolved against
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// Topic embeddings database
    #[serde(default = "default_embeddings_path")]
    pub embeddings_path: String,

    /// Curated cluster taxonomy
    #[serde(default = "default_taxonomy_path")]
    pub taxonomy_path: String,

    /// Episode metadata directory (empty = podcasts/{podcast_id}/episodes)
    #[serde(default)]
    pub episodes_dir: String,

    /// Generation-side variant definitions
    #[serde(default = "default_variants_path")]
    pub variants_path: String,

    /// Canonical artifact store
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Client-servable directory; copies are skipped when it does not exist
    #[serde(default = "default_public_dir")]
    pub public_dir: String,

    /// Variant name the run publishes under
    #[serde(default = "default_variant")]
    pub variant: String,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub projection: ProjectionConfig,

    #[serde(default)]
    pub cooccurrence: CooccurrenceConfig,

    #[serde(default)]
    pub filter: FilterConfig,

    #[serde(default)]
    pub client: ClientSettings,
}

fn default_podcast_id() -> String {
    "freakshow".to_string()
}

fn default_data_dir() -> String {
    ".".to_string()
}

fn default_embeddings_path() -> String {
    "db/topic-embeddings.json".to_string()
}

fn default_taxonomy_path() -> String {
    "topic-taxonomy.json".to_string()
}

fn default_variants_path() -> String {
    "variants.json".to_string()
}

fn default_output_dir() -> String {
    "db".to_string()
}

fn default_public_dir() -> String {
    "frontend/public".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            podcast_id: default_podcast_id(),
            data_dir: default_data_dir(),
            embeddings_path: default_embeddings_path(),
            taxonomy_path: default_taxonomy_path(),
            episodes_dir: String::new(),
            variants_path: default_variants_path(),
            output_dir: default_output_dir(),
            public_dir: default_public_dir(),
            variant: default_variant(),
            log_level: default_log_level(),
            projection: ProjectionConfig::default(),
            cooccurrence: CooccurrenceConfig::default(),
            filter: FilterConfig::default(),
            client: ClientSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings with layered precedence:
    /// 1. Built-in defaults
    /// 2. Config file (~/.config/podcast-atlas/config.toml)
    /// 3. CLI-specified config file (optional)
    /// 4. Environment variables (ATLAS_*, nested keys joined with `__`)
    ///
    /// CLI flags should be applied by the caller after this returns.
    pub fn load(cli_config_path: Option<&str>) -> Result<Self, AtlasError> {
        let config_dir = ProjectDirs::from("", "", "podcast-atlas")
            .map(|p| p.config_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        let default_config_path = config_dir.join("config");

        let mut builder = Config::builder()
            .set_default("podcast_id", default_podcast_id())
            .map_err(|e| AtlasError::Config(e.to_string()))?
            .set_default("output_dir", default_output_dir())
            .map_err(|e| AtlasError::Config(e.to_string()))?
            .set_default("public_dir", default_public_dir())
            .map_err(|e| AtlasError::Config(e.to_string()))?
            .set_default("variant", default_variant())
            .map_err(|e| AtlasError::Config(e.to_string()))?
            .set_default("log_level", default_log_level())
            .map_err(|e| AtlasError::Config(e.to_string()))?
            .add_source(File::with_name(&default_config_path.to_string_lossy()).required(false));

        if let Some(path) = cli_config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // ATLAS_OUTPUT_DIR, ATLAS_CLIENT__CDN_BASE_URL, ATLAS_PROJECTION__SEED, ...
        builder = builder.add_source(
            Environment::with_prefix("ATLAS")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder
            .build()
            .map_err(|e| AtlasError::Config(e.to_string()))?;

        let settings: Settings = config
            .try_deserialize()
            .map_err(|e| AtlasError::Config(e.to_string()))?;

        settings.projection.validate().map_err(AtlasError::Config)?;
        Ok(settings)
    }

    /// Resolve a configured path against `data_dir` unless it is absolute.
    pub fn resolve_path(&self, path: &str) -> PathBuf {
        let p = Path::new(path);
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            Path::new(&self.data_dir).join(p)
        }
    }

    pub fn embeddings_file(&self) -> PathBuf {
        self.resolve_path(&self.embeddings_path)
    }

    pub fn taxonomy_file(&self) -> PathBuf {
        self.resolve_path(&self.taxonomy_path)
    }

    pub fn variants_file(&self) -> PathBuf {
        self.resolve_path(&self.variants_path)
    }

    /// Episode metadata directory, derived from the podcast id when unset.
    pub fn episodes_directory(&self) -> PathBuf {
        if self.episodes_dir.trim().is_empty() {
            self.resolve_path(&format!("podcasts/{}/episodes", self.podcast_id))
        } else {
            self.resolve_path(&self.episodes_dir)
        }
    }

    /// Canonical artifact root. Artifacts land under `{output_dir}/topics`.
    pub fn output_root(&self) -> PathBuf {
        self.resolve_path(&self.output_dir)
    }

    /// Client-servable root. Copies land under `{public_dir}/topics`.
    pub fn public_root(&self) -> PathBuf {
        self.resolve_path(&self.public_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.podcast_id, "freakshow");
        assert_eq!(settings.variant, DEFAULT_VARIANT);
        assert_eq!(settings.output_dir, "db");
        assert!(settings.client.cdn_base_url.is_none());
        assert!(settings.client.locked_variant.is_none());
    }

    #[test]
    fn test_load_with_defaults() {
        let settings = Settings::load(None).unwrap();
        assert_eq!(settings.podcast_id, "freakshow");
        assert_eq!(settings.projection.n_neighbors, 15);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("atlas.toml");
        std::fs::write(
            &path,
            r#"
podcast_id = "lage"
variant = "manual-v1"

[projection]
n_neighbors = 8
seed = 7

[client]
cdn_base_url = "https://cdn.example.org"
"#,
        )
        .unwrap();

        let settings = Settings::load(Some(path.to_str().unwrap())).unwrap();
        assert_eq!(settings.podcast_id, "lage");
        assert_eq!(settings.variant, "manual-v1");
        assert_eq!(settings.projection.n_neighbors, 8);
        assert_eq!(settings.projection.seed, Some(7));
        assert!((settings.projection.min_dist - 0.1).abs() < f32::EPSILON);
        assert_eq!(
            settings.client.cdn_base_url.as_deref(),
            Some("https://cdn.example.org")
        );
    }

    #[test]
    fn test_episodes_directory_default() {
        let settings = Settings {
            data_dir: "/srv/atlas".to_string(),
            ..Default::default()
        };
        assert_eq!(
            settings.episodes_directory(),
            PathBuf::from("/srv/atlas/podcasts/freakshow/episodes")
        );
    }

    #[test]
    fn test_resolve_absolute_path_untouched() {
        let settings = Settings {
            data_dir: "/srv/atlas".to_string(),
            taxonomy_path: "/data/taxonomy.json".to_string(),
            ..Default::default()
        };
        assert_eq!(settings.taxonomy_file(), PathBuf::from("/data/taxonomy.json"));
        assert_eq!(
            settings.output_root(),
            PathBuf::from("/srv/atlas/db")
        );
    }

    #[test]
    fn test_projection_config_validation() {
        let mut config = ProjectionConfig::default();
        assert!(config.validate().is_ok());

        config.n_neighbors = 1;
        assert!(config.validate().is_err());

        config.n_neighbors = 15;
        config.min_dist = 2.0;
        assert!(config.validate().is_err());
    }
}
