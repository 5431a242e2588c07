//! # atlas-pipeline
//!
//! Offline derivation of Podcast Atlas analytics artifacts.
//!
//! A generation run reads the topic embeddings database, the curated cluster
//! taxonomy and per-episode metadata, then writes:
//! - cluster and speaker co-occurrence matrices
//! - a 2-D UMAP projection of the topic embeddings
//! - per-year cluster and speaker timelines
//! - an updated variant manifest
//!
//! Runs are single-threaded batch jobs. Every input error aborts the run.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use atlas_pipeline::{Generator, Step};
//! use atlas_types::Settings;
//!
//! let settings = Settings::load(None)?;
//! let report = Generator::new(settings).run(&Step::ALL)?;
//! println!("wrote {} files", report.files.len());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod cooccurrence;
pub mod entities;
pub mod error;
pub mod filter;
pub mod generator;
pub mod inputs;
pub mod projection;
pub mod similarity;
pub mod taxonomy_index;
pub mod timeline;
pub mod variants;
pub mod writer;

pub use cooccurrence::{build_cooccurrence, CooccurrenceMatrix};
pub use entities::{cluster_entities, slugify, speaker_entities, EntityWithEpisodes};
pub use error::PipelineError;
pub use filter::{filter_boilerplate_topics, FilterReport};
pub use generator::{Generator, RunReport, Step, StepReport, TOPICS_DIR};
pub use inputs::{load_embeddings, load_episodes, load_taxonomy};
pub use projection::{
    annotate_points, build_projection_artifact, find_ab_params, project, Coordinate2D,
};
pub use taxonomy_index::{build_topic_cluster_index, ClusterMembership, TopicClusterIndex};
pub use timeline::{build_timeline, episode_years, Timeline};
pub use variants::{
    load_manifest, publish_manifest, resolve_variant, ResolvedVariant, VariantSettings,
    VariantsConfig,
};
pub use writer::{ArtifactWriter, WriteReport};
