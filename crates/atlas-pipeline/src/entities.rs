//! Entities annotated with the episodes they appear in.
//!
//! Clusters and speakers are both turned into [`EntityWithEpisodes`] before
//! co-occurrence and timeline construction.

use std::collections::{BTreeSet, HashMap};

use tracing::debug;

use atlas_types::{EpisodeId, EpisodeMetadata, Taxonomy, TopicWithEmbedding};

use crate::taxonomy_index::TopicClusterIndex;

/// An identifier, display name and the set of episodes the entity appears in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityWithEpisodes {
    pub id: String,
    pub name: String,
    pub episodes: BTreeSet<EpisodeId>,
}

impl EntityWithEpisodes {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        episodes: impl IntoIterator<Item = EpisodeId>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            episodes: episodes.into_iter().collect(),
        }
    }

    pub fn episode_count(&self) -> usize {
        self.episodes.len()
    }
}

/// One entity per taxonomy cluster, in taxonomy order.
///
/// Uses the cluster's recorded episodes when present; otherwise the union
/// of episodes of every topic the index assigns to the cluster.
pub fn cluster_entities(
    taxonomy: &Taxonomy,
    topics: &[TopicWithEmbedding],
    index: &TopicClusterIndex,
) -> Vec<EntityWithEpisodes> {
    let mut derived: HashMap<&str, BTreeSet<EpisodeId>> = HashMap::new();
    for topic in topics {
        if let Some(membership) = index.get(&topic.topic) {
            derived
                .entry(membership.cluster_id.as_str())
                .or_default()
                .extend(topic.episodes.iter().copied());
        }
    }

    taxonomy
        .clusters
        .iter()
        .map(|cluster| {
            let episodes = if cluster.episodes.is_empty() {
                derived.get(cluster.id.as_str()).cloned().unwrap_or_default()
            } else {
                cluster.episodes.iter().copied().collect()
            };
            EntityWithEpisodes {
                id: cluster.id.clone(),
                name: cluster.name.clone(),
                episodes,
            }
        })
        .collect()
}

/// One entity per distinct speaker, in order of first appearance.
///
/// Speakers whose names slugify identically are merged under the first
/// spelling seen.
pub fn speaker_entities(episodes: &[EpisodeMetadata]) -> Vec<EntityWithEpisodes> {
    let mut entities: Vec<EntityWithEpisodes> = Vec::new();
    let mut by_slug: HashMap<String, usize> = HashMap::new();

    for episode in episodes {
        for speaker in &episode.speakers {
            let name = speaker.trim();
            let slug = slugify(name);
            if slug.is_empty() {
                debug!(episode = episode.number, "Skipping blank speaker name");
                continue;
            }
            let idx = *by_slug.entry(slug.clone()).or_insert_with(|| {
                entities.push(EntityWithEpisodes::new(slug, name, []));
                entities.len() - 1
            });
            entities[idx].episodes.insert(episode.number);
        }
    }

    entities
}

/// Lowercase, with every run of non-alphanumeric characters collapsed to `-`.
pub fn slugify(name: &str) -> String {
    name.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}
