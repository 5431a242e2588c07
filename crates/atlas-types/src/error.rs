//! Error types shared across Podcast Atlas crates.

use thiserror::Error;

/// Errors raised while assembling shared configuration.
#[derive(Debug, Error)]
pub enum AtlasError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}
