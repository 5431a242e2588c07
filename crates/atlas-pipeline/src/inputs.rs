//! Loading of upstream input documents.
//!
//! Inputs are read-only and produced by earlier tooling. A missing required
//! file is `InputMissing`; a file that does not decode, or decodes into an
//! inconsistent shape, is `MalformedInput`. Neither is guessed around.

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use tracing::{debug, info};
use walkdir::WalkDir;

use atlas_types::{EmbeddingsDatabase, EpisodeMetadata, Taxonomy};

use crate::error::PipelineError;

/// Read and decode a JSON document that must exist.
pub fn read_required_json<T: DeserializeOwned>(path: &Path) -> Result<T, PipelineError> {
    if !path.exists() {
        return Err(PipelineError::InputMissing {
            path: path.to_path_buf(),
        });
    }
    let bytes = fs::read(path).map_err(|e| PipelineError::io(path, e))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| PipelineError::MalformedInput(format!("{}: {}", path.display(), e)))
}

/// Read and decode a JSON document that may be absent.
pub fn read_optional_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, PipelineError> {
    if !path.exists() {
        return Ok(None);
    }
    read_required_json(path).map(Some)
}

/// Load the topic embeddings database and check that every vector shares
/// one dimensionality.
pub fn load_embeddings(path: &Path) -> Result<EmbeddingsDatabase, PipelineError> {
    let db: EmbeddingsDatabase = read_required_json(path)?;
    validate_embeddings(&db)?;
    info!(
        path = %path.display(),
        model = %db.embedding_model,
        topics = db.topics.len(),
        "Loaded embeddings database"
    );
    Ok(db)
}

fn validate_embeddings(db: &EmbeddingsDatabase) -> Result<(), PipelineError> {
    let Some(first) = db.topics.first() else {
        return Ok(());
    };
    let dim = if db.embedding_dimensions > 0 {
        db.embedding_dimensions
    } else {
        first.embedding.len()
    };
    if dim == 0 {
        return Err(PipelineError::MalformedInput(
            "embedding vectors are empty".to_string(),
        ));
    }
    for topic in &db.topics {
        if topic.embedding.len() != dim {
            return Err(PipelineError::MalformedInput(format!(
                "topic '{}' has embedding dimension {}, expected {}",
                topic.topic,
                topic.embedding.len(),
                dim
            )));
        }
    }
    Ok(())
}

/// Load the curated cluster taxonomy.
pub fn load_taxonomy(path: &Path) -> Result<Taxonomy, PipelineError> {
    let taxonomy: Taxonomy = read_required_json(path)?;
    info!(
        path = %path.display(),
        clusters = taxonomy.clusters.len(),
        "Loaded taxonomy"
    );
    Ok(taxonomy)
}

/// Load per-episode metadata from `{dir}/**/{number}.json`.
///
/// Files whose stem is not an episode number are skipped. Results are
/// ordered by episode number.
pub fn load_episodes(dir: &Path) -> Result<Vec<EpisodeMetadata>, PipelineError> {
    if !dir.is_dir() {
        return Err(PipelineError::InputMissing {
            path: dir.to_path_buf(),
        });
    }

    let mut episodes = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(dir).to_path_buf();
            PipelineError::io(path, std::io::Error::other(e.to_string()))
        })?;
        let path = entry.path();
        if !entry.file_type().is_file() || path.extension().and_then(|e| e.to_str()) != Some("json")
        {
            continue;
        }
        let is_episode_file = path
            .file_stem()
            .and_then(|s| s.to_str())
            .is_some_and(|s| s.parse::<u32>().is_ok());
        if !is_episode_file {
            debug!(path = %path.display(), "Skipping non-episode file");
            continue;
        }
        let episode: EpisodeMetadata = read_required_json(path)?;
        episodes.push(episode);
    }

    episodes.sort_by_key(|e| e.number);
    info!(dir = %dir.display(), count = episodes.len(), "Loaded episode metadata");
    Ok(episodes)
}
