//! Topic -> cluster lookup built from the curated taxonomy.
//!
//! Every topic listed in a cluster's `sampleTopics` is registered under that
//! cluster. When two clusters list the same topic, the cluster visited later
//! in taxonomy order wins. Topics listed by no cluster are absent from the
//! index and count as unclustered.

use std::collections::HashMap;

use tracing::{debug, warn};

use atlas_types::{Taxonomy, UNCLUSTERED_ID, UNCLUSTERED_NAME};

/// Cluster membership of one topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterMembership {
    pub cluster_id: String,
    pub cluster_name: String,
    pub cluster_description: String,
    pub is_outlier: bool,
}

impl ClusterMembership {
    /// Membership used for topics without a taxonomy entry.
    pub fn unclustered() -> Self {
        Self {
            cluster_id: UNCLUSTERED_ID.to_string(),
            cluster_name: UNCLUSTERED_NAME.to_string(),
            cluster_description: String::new(),
            is_outlier: false,
        }
    }
}

/// Lookup from topic identifier to cluster membership.
#[derive(Debug, Clone, Default)]
pub struct TopicClusterIndex {
    entries: HashMap<String, ClusterMembership>,
    overwritten: usize,
}

impl TopicClusterIndex {
    pub fn get(&self, topic: &str) -> Option<&ClusterMembership> {
        self.entries.get(topic)
    }

    /// Membership for `topic`, or the unclustered sentinel.
    pub fn membership_or_unclustered(&self, topic: &str) -> ClusterMembership {
        self.get(topic)
            .cloned()
            .unwrap_or_else(ClusterMembership::unclustered)
    }

    pub fn contains(&self, topic: &str) -> bool {
        self.entries.contains_key(topic)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of registrations that replaced an earlier cluster's claim.
    pub fn overwritten(&self) -> usize {
        self.overwritten
    }
}

/// Build the topic -> cluster index (last write wins on collisions).
pub fn build_topic_cluster_index(taxonomy: &Taxonomy) -> TopicClusterIndex {
    let mut index = TopicClusterIndex::default();

    for cluster in &taxonomy.clusters {
        let membership = ClusterMembership {
            cluster_id: cluster.id.clone(),
            cluster_name: cluster.name.clone(),
            cluster_description: cluster.description.clone(),
            is_outlier: cluster.is_outlier,
        };
        for topic in &cluster.sample_topics {
            if let Some(previous) = index.entries.insert(topic.clone(), membership.clone()) {
                if previous.cluster_id != cluster.id {
                    index.overwritten += 1;
                    debug!(
                        topic = %topic,
                        from = %previous.cluster_id,
                        to = %cluster.id,
                        "Topic claimed by more than one cluster"
                    );
                }
            }
        }
    }

    if index.overwritten > 0 {
        warn!(
            collisions = index.overwritten,
            "Taxonomy assigns some topics to several clusters; later clusters win"
        );
    }

    index
}

#[cfg(test)]
mod tests {
    use super::*;
    use atlas_types::TaxonomyCluster;

    fn taxonomy() -> Taxonomy {
        let mut outliers = TaxonomyCluster::new("sonstiges", "Sonstiges", &["Wetter"]);
        outliers.is_outlier = true;
        Taxonomy {
            clusters: vec![
                TaxonomyCluster::new("apple", "Apple", &["iPhone", "macOS", "Siri"]),
                TaxonomyCluster::new("ki", "KI", &["Siri", "ChatGPT"]),
                outliers,
            ],
            ..Default::default()
        }
    }

    #[test]
    fn test_index_registers_sample_topics() {
        let index = build_topic_cluster_index(&taxonomy());
        assert_eq!(index.len(), 5);
        assert_eq!(index.get("iPhone").unwrap().cluster_id, "apple");
        assert_eq!(index.get("ChatGPT").unwrap().cluster_name, "KI");
    }

    #[test]
    fn test_later_cluster_wins_on_collision() {
        let index = build_topic_cluster_index(&taxonomy());
        assert_eq!(index.get("Siri").unwrap().cluster_id, "ki");
        assert_eq!(index.overwritten(), 1);
    }

    #[test]
    fn test_outlier_flag_carried() {
        let index = build_topic_cluster_index(&taxonomy());
        assert!(index.get("Wetter").unwrap().is_outlier);
        assert!(!index.get("iPhone").unwrap().is_outlier);
    }

    #[test]
    fn test_unknown_topic_is_unclustered() {
        let index = build_topic_cluster_index(&taxonomy());
        assert!(!index.contains("Fahrrad"));
        let membership = index.membership_or_unclustered("Fahrrad");
        assert_eq!(membership.cluster_id, UNCLUSTERED_ID);
        assert!(!membership.is_outlier);
    }

    #[test]
    fn test_empty_taxonomy() {
        let index = build_topic_cluster_index(&Taxonomy::default());
        assert!(index.is_empty());
    }
}
