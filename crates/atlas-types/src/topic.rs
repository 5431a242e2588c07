//! Topic and embedding input types.

use serde::{Deserialize, Serialize};

use crate::episode::EpisodeId;

/// Embeddings database produced upstream (`db/topic-embeddings.json`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddingsDatabase {
    #[serde(default)]
    pub embedding_model: String,
    #[serde(default)]
    pub created_at: String,
    /// Declared dimensionality; 0 when the producer did not record it
    #[serde(default)]
    pub embedding_dimensions: usize,
    #[serde(default)]
    pub total_topics_raw: usize,
    pub topics: Vec<TopicWithEmbedding>,
}

/// A topic label with keywords, episode membership and its embedding vector.
///
/// The label doubles as the topic identifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicWithEmbedding {
    pub topic: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub count: usize,
    #[serde(default)]
    pub episodes: Vec<EpisodeId>,
    pub embedding: Vec<f32>,
}

impl TopicWithEmbedding {
    pub fn new(topic: impl Into<String>, episodes: Vec<EpisodeId>, embedding: Vec<f32>) -> Self {
        Self {
            topic: topic.into(),
            keywords: Vec::new(),
            count: episodes.len(),
            episodes,
            embedding,
        }
    }
}
