//! Pipeline error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that abort a generation run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A required source document is absent
    #[error("Required input missing: {}", path.display())]
    InputMissing { path: PathBuf },

    /// A source document parses but violates a required shape
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// Filesystem failure while reading inputs or writing artifacts
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Requested variant is not defined in the variant registry
    #[error("Variant '{0}' not found in variant registry")]
    VariantNotFound(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl PipelineError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PipelineError::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PipelineError::InputMissing {
            path: PathBuf::from("db/topic-embeddings.json"),
        };
        assert_eq!(
            err.to_string(),
            "Required input missing: db/topic-embeddings.json"
        );

        let err = PipelineError::VariantNotFound("v9".to_string());
        assert_eq!(err.to_string(), "Variant 'v9' not found in variant registry");
    }

    #[test]
    fn test_from_serde_error() {
        let json_err = serde_json::from_str::<u32>("[]").unwrap_err();
        let err: PipelineError = json_err.into();
        assert!(matches!(err, PipelineError::Serialization(_)));
    }
}
