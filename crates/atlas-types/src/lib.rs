//! # atlas-types
//!
//! Shared domain types for Podcast Atlas.
//!
//! This crate defines the data structures exchanged between the offline
//! derivation pipeline and the runtime client:
//! - Episodes and episode metadata
//! - Topics with embeddings and the curated cluster taxonomy
//! - The variant manifest
//! - Derived artifact documents (co-occurrence, projection, timeline)
//! - Settings: layered configuration
//!
//! ## Usage
//!
//! ```rust
//! use atlas_types::{Manifest, Settings};
//!
//! let settings = Settings::default();
//! assert_eq!(settings.variant, "auto-v2.1");
//! ```

pub mod artifact;
pub mod config;
pub mod episode;
pub mod error;
pub mod manifest;
pub mod taxonomy;
pub mod topic;

pub use artifact::{
    ClusterCount, CooccurrenceArtifact, CooccurrenceRow, CooccurrenceStatistics,
    CooccurrenceValue, EntityCount, EntitySummary, ProjectionArtifact, ProjectionParameters,
    ProjectionPoint, ProjectionStatistics, TimelineArtifact, TimelineEntity, YearCount,
    CLUSTER_COOCCURRENCE_FILE, CLUSTER_TIMELINE_FILE, PROJECTION_FILE,
    SPEAKER_COOCCURRENCE_FILE, SPEAKER_TIMELINE_FILE, UNCLUSTERED_ID, UNCLUSTERED_NAME,
};
pub use config::{
    ClientSettings, CooccurrenceConfig, FilterConfig, ProjectionConfig, Settings,
    DEFAULT_VARIANT,
};
pub use episode::{EpisodeId, EpisodeMetadata};
pub use error::AtlasError;
pub use manifest::{Manifest, VariantInfo, MANIFEST_FILE};
pub use taxonomy::{Taxonomy, TaxonomyCluster};
pub use topic::{EmbeddingsDatabase, TopicWithEmbedding};
