//! Curated cluster taxonomy (`topic-taxonomy.json`).

use serde::{Deserialize, Serialize};

use crate::episode::EpisodeId;

/// Cluster taxonomy document.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Taxonomy {
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub method: String,
    pub clusters: Vec<TaxonomyCluster>,
}

/// One cluster. Membership is defined by `sample_topics`; topics listed by
/// no cluster are unclustered.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct TaxonomyCluster {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub is_outlier: bool,
    #[serde(default)]
    pub sample_topics: Vec<String>,
    /// Episodes the cluster spans, when the taxonomy records them
    #[serde(default)]
    pub episodes: Vec<EpisodeId>,
}

impl TaxonomyCluster {
    pub fn new(id: impl Into<String>, name: impl Into<String>, sample_topics: &[&str]) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            sample_topics: sample_topics.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_taxonomy() {
        let json = r#"{
            "createdAt": "2025-01-02T10:00:00Z",
            "method": "hdbscan-v2",
            "clusters": [
                {"id": "apple", "name": "Apple", "description": "12 Topics",
                 "isOutlier": false, "topicCount": 12, "episodeCount": 40,
                 "sampleTopics": ["iPhone", "macOS"], "episodes": [1, 2]},
                {"id": "sonstiges", "name": "Sonstiges", "isOutlier": true,
                 "sampleTopics": []}
            ]
        }"#;
        let taxonomy: Taxonomy = serde_json::from_str(json).unwrap();
        assert_eq!(taxonomy.clusters.len(), 2);
        assert_eq!(taxonomy.clusters[0].sample_topics, vec!["iPhone", "macOS"]);
        assert!(taxonomy.clusters[1].is_outlier);
        assert!(taxonomy.clusters[1].episodes.is_empty());
    }
}
