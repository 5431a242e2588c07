//! Artifact Writer: one serialization, up to two published copies.
//!
//! The canonical copy always lands under the output root. The client-servable
//! copy lands under the public root only when that root already exists as a
//! directory; otherwise it is skipped. Both copies receive the same bytes.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info};

use crate::error::PipelineError;

/// Where one artifact was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteReport {
    pub name: String,
    pub canonical: PathBuf,
    /// `None` when the public root does not exist
    pub public: Option<PathBuf>,
    pub bytes: usize,
}

/// Writes JSON artifacts under a canonical root and an optional public root.
#[derive(Debug, Clone)]
pub struct ArtifactWriter {
    canonical_root: PathBuf,
    public_root: Option<PathBuf>,
    scope: PathBuf,
}

impl ArtifactWriter {
    pub fn new(canonical_root: impl Into<PathBuf>, public_root: Option<PathBuf>) -> Self {
        Self {
            canonical_root: canonical_root.into(),
            public_root,
            scope: PathBuf::new(),
        }
    }

    /// Writer for a subdirectory, mirrored under both roots.
    pub fn scoped(&self, segment: impl AsRef<Path>) -> Self {
        Self {
            canonical_root: self.canonical_root.clone(),
            public_root: self.public_root.clone(),
            scope: self.scope.join(segment),
        }
    }

    pub fn canonical_dir(&self) -> PathBuf {
        self.canonical_root.join(&self.scope)
    }

    /// Public directory for this scope, if the public root exists.
    pub fn public_dir(&self) -> Option<PathBuf> {
        self.public_root
            .as_ref()
            .filter(|root| root.is_dir())
            .map(|root| root.join(&self.scope))
    }

    /// Serialize `payload` once and write it to both locations.
    ///
    /// # Errors
    ///
    /// `Serialization` if the payload cannot be encoded, `Io` if a write
    /// to an existing location fails.
    pub fn write_artifact<T: Serialize>(
        &self,
        name: &str,
        payload: &T,
    ) -> Result<WriteReport, PipelineError> {
        let mut bytes = serde_json::to_vec_pretty(payload)?;
        bytes.push(b'\n');

        let canonical = write_bytes(&self.canonical_dir(), name, &bytes)?;

        let public = match self.public_dir() {
            Some(dir) => Some(write_bytes(&dir, name, &bytes)?),
            None => {
                debug!(name, "Public root absent; skipping client copy");
                None
            }
        };

        info!(
            name,
            bytes = bytes.len(),
            canonical = %canonical.display(),
            public = public.is_some(),
            "Wrote artifact"
        );

        Ok(WriteReport {
            name: name.to_string(),
            canonical,
            public,
            bytes: bytes.len(),
        })
    }
}

fn write_bytes(dir: &Path, name: &str, bytes: &[u8]) -> Result<PathBuf, PipelineError> {
    fs::create_dir_all(dir).map_err(|e| PipelineError::io(dir, e))?;
    let path = dir.join(name);
    fs::write(&path, bytes).map_err(|e| PipelineError::io(&path, e))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_writes_identical_copies() {
        let temp = TempDir::new().unwrap();
        let canonical = temp.path().join("db");
        let public = temp.path().join("public");
        fs::create_dir_all(&public).unwrap();

        let writer = ArtifactWriter::new(&canonical, Some(public.clone())).scoped("topics/v1");
        let report = writer
            .write_artifact("a.json", &json!({"generatedAt": "now", "n": 1}))
            .unwrap();

        assert_eq!(report.canonical, canonical.join("topics/v1/a.json"));
        let public_path = report.public.clone().unwrap();
        assert_eq!(public_path, public.join("topics/v1/a.json"));

        let first = fs::read(&report.canonical).unwrap();
        let second = fs::read(&public_path).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), report.bytes);
    }

    #[test]
    fn test_missing_public_root_is_skipped() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("does-not-exist");
        let writer = ArtifactWriter::new(temp.path().join("db"), Some(missing.clone()));

        let report = writer.write_artifact("b.json", &json!([1, 2, 3])).unwrap();
        assert!(report.public.is_none());
        assert!(report.canonical.exists());
        assert!(!missing.exists());
    }

    #[test]
    fn test_no_public_root() {
        let temp = TempDir::new().unwrap();
        let writer = ArtifactWriter::new(temp.path(), None).scoped("topics");
        assert!(writer.public_dir().is_none());
        assert_eq!(writer.canonical_dir(), temp.path().join("topics"));
    }

    #[test]
    fn test_canonical_write_failure_is_io_error() {
        let temp = TempDir::new().unwrap();
        let blocker = temp.path().join("file");
        fs::write(&blocker, b"x").unwrap();

        let writer = ArtifactWriter::new(&blocker, None);
        let err = writer.write_artifact("c.json", &json!({})).unwrap_err();
        assert!(matches!(err, PipelineError::Io { .. }));
    }
}
