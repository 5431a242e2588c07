//! Error types for artifact retrieval.

use thiserror::Error;

/// Errors surfaced by an artifact fetch. Nothing here is retried.
#[derive(Error, Debug)]
pub enum FetchError {
    /// The request could not be sent or the body could not be read
    #[error("Transport error fetching {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-success status
    #[error("HTTP {status} fetching {url}")]
    Status { url: String, status: u16 },

    /// The body is not valid JSON or not the expected shape
    #[error("Failed to decode {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    /// A relative path was given but no origin is configured
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The HTTP client could not be built
    #[error("Client configuration error: {0}")]
    Config(String),
}

impl FetchError {
    /// URL the failure refers to, when there is one.
    pub fn url(&self) -> Option<&str> {
        match self {
            FetchError::Transport { url, .. }
            | FetchError::Status { url, .. }
            | FetchError::Decode { url, .. } => Some(url),
            FetchError::InvalidUrl(_) | FetchError::Config(_) => None,
        }
    }

    pub fn is_decode(&self) -> bool {
        matches!(self, FetchError::Decode { .. })
    }
}
