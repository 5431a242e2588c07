//! Pairwise co-occurrence matrix over entities with episode sets.
//!
//! Entities are ordered by episode count, descending, with ties kept in
//! input order. That ordering fixes both the row order and the order of
//! values inside each row, so identical inputs always produce identical
//! matrices. Each unordered pair is intersected once and the result is
//! mirrored into both rows, which keeps the matrix symmetric by
//! construction.

use std::cmp::Reverse;
use std::collections::HashSet;

use chrono::Utc;
use tracing::{debug, info, instrument};

use atlas_types::{
    CooccurrenceArtifact, CooccurrenceRow, CooccurrenceStatistics, CooccurrenceValue,
    EntityCount, EntitySummary, EpisodeId,
};

use crate::entities::EntityWithEpisodes;
use crate::error::PipelineError;

/// Symmetric co-occurrence matrix plus summary statistics.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CooccurrenceMatrix {
    /// Qualifying entities, densest first
    pub entities: Vec<EntitySummary>,
    /// One row per entity that shares at least one episode with another
    pub rows: Vec<CooccurrenceRow>,
    pub statistics: CooccurrenceStatistics,
}

impl CooccurrenceMatrix {
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn row(&self, entity_id: &str) -> Option<&CooccurrenceRow> {
        self.rows.iter().find(|r| r.entity_id == entity_id)
    }

    /// The (a, b) cell, if the two entities share any episode.
    pub fn value(&self, a: &str, b: &str) -> Option<&CooccurrenceValue> {
        self.row(a)?.values.iter().find(|v| v.other_entity_id == b)
    }

    /// Wrap the matrix into the published document shape.
    pub fn into_artifact(self, description: impl Into<String>) -> CooccurrenceArtifact {
        CooccurrenceArtifact {
            generated_at: Utc::now(),
            description: description.into(),
            statistics: self.statistics,
            entities: self.entities,
            matrix: self.rows,
        }
    }
}

/// Build the co-occurrence matrix.
///
/// Entities with no episodes are dropped first. `top_k` bounds the
/// episode-count ranking in the statistics.
///
/// # Errors
///
/// Returns `MalformedInput` if two entities share an identifier.
#[instrument(skip(entities), fields(input = entities.len()))]
pub fn build_cooccurrence(
    entities: &[EntityWithEpisodes],
    top_k: usize,
) -> Result<CooccurrenceMatrix, PipelineError> {
    let mut seen = HashSet::with_capacity(entities.len());
    for entity in entities {
        if !seen.insert(entity.id.as_str()) {
            return Err(PipelineError::MalformedInput(format!(
                "duplicate entity id '{}'",
                entity.id
            )));
        }
    }

    let mut ordered: Vec<&EntityWithEpisodes> =
        entities.iter().filter(|e| !e.episodes.is_empty()).collect();
    let dropped = entities.len() - ordered.len();
    if dropped > 0 {
        debug!(dropped, "Dropped entities without episodes");
    }
    if ordered.is_empty() {
        info!("No entities with episodes; emitting empty matrix");
        return Ok(CooccurrenceMatrix::default());
    }

    // Stable sort: ties keep input order.
    ordered.sort_by_key(|e| Reverse(e.episodes.len()));

    let n = ordered.len();

    // upper[i][j - i - 1] holds the intersection of entities i and j (i < j).
    let upper: Vec<Vec<Vec<EpisodeId>>> = (0..n)
        .map(|i| {
            ((i + 1)..n)
                .map(|j| shared_episodes(ordered[i], ordered[j]))
                .collect()
        })
        .collect();

    let total_combinations = upper
        .iter()
        .flatten()
        .filter(|shared| !shared.is_empty())
        .count();

    let mut rows = Vec::new();
    for i in 0..n {
        let values: Vec<CooccurrenceValue> = (0..n)
            .filter(|&j| j != i)
            .filter_map(|j| {
                let shared = if i < j {
                    &upper[i][j - i - 1]
                } else {
                    &upper[j][i - j - 1]
                };
                if shared.is_empty() {
                    return None;
                }
                Some(CooccurrenceValue {
                    other_entity_id: ordered[j].id.clone(),
                    other_entity_name: ordered[j].name.clone(),
                    count: shared.len(),
                    episodes: shared.clone(),
                })
            })
            .collect();

        if !values.is_empty() {
            rows.push(CooccurrenceRow {
                entity_id: ordered[i].id.clone(),
                entity_name: ordered[i].name.clone(),
                values,
            });
        }
    }

    let summaries: Vec<EntitySummary> = ordered
        .iter()
        .map(|e| EntitySummary {
            id: e.id.clone(),
            name: e.name.clone(),
            total_episodes: e.episode_count(),
        })
        .collect();

    let top_entities_by_episodes = ordered
        .iter()
        .take(top_k)
        .map(|e| EntityCount {
            id: e.id.clone(),
            name: e.name.clone(),
            count: e.episode_count(),
        })
        .collect();

    info!(
        entities = n,
        combinations = total_combinations,
        rows = rows.len(),
        "Built co-occurrence matrix"
    );

    Ok(CooccurrenceMatrix {
        entities: summaries,
        rows,
        statistics: CooccurrenceStatistics {
            total_entities: n,
            total_combinations,
            top_entities_by_episodes,
        },
    })
}

/// Ascending intersection of two episode sets.
fn shared_episodes(a: &EntityWithEpisodes, b: &EntityWithEpisodes) -> Vec<EpisodeId> {
    let (small, large) = if a.episodes.len() <= b.episodes.len() {
        (&a.episodes, &b.episodes)
    } else {
        (&b.episodes, &a.episodes)
    };
    small
        .iter()
        .copied()
        .filter(|ep| large.contains(ep))
        .collect()
}
