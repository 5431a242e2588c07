//! Per-year episode counts for clusters and speakers.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{Datelike, Utc};
use tracing::{debug, info};

use atlas_types::{EpisodeId, EpisodeMetadata, TimelineArtifact, TimelineEntity, YearCount};

use crate::entities::EntityWithEpisodes;

/// Timeline rows plus the overall year axis.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Timeline {
    /// Every year with at least one counted episode, ascending
    pub years: Vec<i32>,
    pub entities: Vec<TimelineEntity>,
}

impl Timeline {
    pub fn into_artifact(self, description: impl Into<String>) -> TimelineArtifact {
        TimelineArtifact {
            generated_at: Utc::now(),
            description: description.into(),
            years: self.years,
            entities: self.entities,
        }
    }
}

/// Release year per episode number, for episodes with a parseable date.
pub fn episode_years(episodes: &[EpisodeMetadata]) -> HashMap<EpisodeId, i32> {
    let years: HashMap<EpisodeId, i32> = episodes
        .iter()
        .filter_map(|ep| ep.release_date().map(|d| (ep.number, d.year())))
        .collect();
    let undated = episodes.len() - years.len();
    if undated > 0 {
        debug!(undated, "Episodes without a parseable release date");
    }
    years
}

/// Count each entity's episodes per release year.
///
/// Entities without episodes are skipped; the rest are ordered by episode
/// count, descending, ties in input order. Episodes without a known year
/// count toward `total_episodes` but not toward any year.
pub fn build_timeline(
    entities: &[EntityWithEpisodes],
    years_by_episode: &HashMap<EpisodeId, i32>,
) -> Timeline {
    let mut ordered: Vec<&EntityWithEpisodes> =
        entities.iter().filter(|e| !e.episodes.is_empty()).collect();
    ordered.sort_by_key(|e| Reverse(e.episodes.len()));

    let mut all_years = BTreeSet::new();
    let rows: Vec<TimelineEntity> = ordered
        .iter()
        .map(|entity| {
            let mut per_year: BTreeMap<i32, usize> = BTreeMap::new();
            for year in entity
                .episodes
                .iter()
                .filter_map(|ep| years_by_episode.get(ep))
            {
                *per_year.entry(*year).or_default() += 1;
            }
            all_years.extend(per_year.keys().copied());
            TimelineEntity {
                id: entity.id.clone(),
                name: entity.name.clone(),
                total_episodes: entity.episode_count(),
                by_year: per_year
                    .into_iter()
                    .map(|(year, count)| YearCount { year, count })
                    .collect(),
            }
        })
        .collect();

    info!(
        entities = rows.len(),
        years = all_years.len(),
        "Built timeline"
    );

    Timeline {
        years: all_years.into_iter().collect(),
        entities: rows,
    }
}
