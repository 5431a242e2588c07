//! Derived artifact documents.
//!
//! Every artifact is written once per generation run and served read-only.
//! Field names follow the camelCase wire format consumed by the frontend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::episode::EpisodeId;

/// Cluster id carried by topics no taxonomy cluster claims.
pub const UNCLUSTERED_ID: &str = "unclustered";

/// Display name paired with [`UNCLUSTERED_ID`].
pub const UNCLUSTERED_NAME: &str = "Unclustered";

// File names inside a variant directory, shared by the writer and readers.
pub const CLUSTER_COOCCURRENCE_FILE: &str = "cluster-cooccurrence.json";
pub const SPEAKER_COOCCURRENCE_FILE: &str = "speaker-cooccurrence.json";
pub const PROJECTION_FILE: &str = "topic-umap.json";
pub const CLUSTER_TIMELINE_FILE: &str = "cluster-timeline.json";
pub const SPEAKER_TIMELINE_FILE: &str = "speaker-timeline.json";

// ===== Co-occurrence =====

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CooccurrenceArtifact {
    pub generated_at: DateTime<Utc>,
    pub description: String,
    pub statistics: CooccurrenceStatistics,
    pub entities: Vec<EntitySummary>,
    pub matrix: Vec<CooccurrenceRow>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct CooccurrenceStatistics {
    pub total_entities: usize,
    /// Unordered entity pairs with a non-empty episode intersection
    pub total_combinations: usize,
    pub top_entities_by_episodes: Vec<EntityCount>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EntityCount {
    pub id: String,
    pub name: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EntitySummary {
    pub id: String,
    pub name: String,
    pub total_episodes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CooccurrenceRow {
    pub entity_id: String,
    pub entity_name: String,
    pub values: Vec<CooccurrenceValue>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CooccurrenceValue {
    pub other_entity_id: String,
    pub other_entity_name: String,
    pub count: usize,
    /// Shared episodes, ascending
    pub episodes: Vec<EpisodeId>,
}

// ===== Projection =====

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionArtifact {
    pub created_at: DateTime<Utc>,
    pub method: String,
    pub parameters: ProjectionParameters,
    pub total_topics: usize,
    pub total_clusters: usize,
    pub points: Vec<ProjectionPoint>,
    pub statistics: ProjectionStatistics,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionParameters {
    pub n_components: usize,
    pub n_neighbors: usize,
    pub min_dist: f32,
    pub spread: f32,
}

/// A topic joined with its 2-D coordinates and cluster membership.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionPoint {
    pub topic: String,
    pub keywords: Vec<String>,
    pub count: usize,
    pub episodes: Vec<EpisodeId>,
    pub x: f32,
    pub y: f32,
    pub cluster_id: String,
    pub cluster_name: String,
    pub is_outlier: bool,
}

impl ProjectionPoint {
    pub fn is_unclustered(&self) -> bool {
        self.cluster_id == UNCLUSTERED_ID
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionStatistics {
    pub clustered_topics: usize,
    pub unclustered_topics: usize,
    pub top_clusters: Vec<ClusterCount>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ClusterCount {
    pub cluster_id: String,
    pub cluster_name: String,
    pub topic_count: usize,
}

// ===== Timeline =====

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TimelineArtifact {
    pub generated_at: DateTime<Utc>,
    pub description: String,
    pub years: Vec<i32>,
    pub entities: Vec<TimelineEntity>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEntity {
    pub id: String,
    pub name: String,
    pub total_episodes: usize,
    pub by_year: Vec<YearCount>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct YearCount {
    pub year: i32,
    pub count: usize,
}
