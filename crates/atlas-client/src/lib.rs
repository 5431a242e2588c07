//! Runtime access to published Podcast Atlas artifacts.
//!
//! This crate provides:
//! - `VariantResolver` for choosing the active variant (with lock support)
//!   and deriving fetch paths, same-origin or on an external mirror
//! - `ArtifactSource` and its reqwest-backed `HttpFetcher`
//! - `AtlasClient`, which combines the two
//!
//! # Example
//!
//! ```rust,no_run
//! use atlas_client::AtlasClient;
//! use atlas_types::{ClientSettings, CooccurrenceArtifact};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let settings = ClientSettings {
//!         origin: Some("http://localhost:8080".to_string()),
//!         ..Default::default()
//!     };
//!     let client = AtlasClient::from_settings(&settings)?;
//!
//!     // Falls back to a built-in manifest if the server has none.
//!     let manifest = client.manifest().await;
//!     println!("default variant: {}", manifest.default_variant);
//!
//!     let matrix: CooccurrenceArtifact = client
//!         .load("speaker-cooccurrence.json", None)
//!         .await?;
//!     println!("{} speakers", matrix.statistics.total_entities);
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod error;
pub mod fetcher;
pub mod resolver;

pub use client::AtlasClient;
pub use error::FetchError;
pub use fetcher::{fetch_artifact, ArtifactSource, HttpFetcher, StaticSource, DEFAULT_TIMEOUT};
pub use resolver::{ResolverConfig, VariantResolver, PODCASTS_BASE, TOPICS_BASE};
