//! Episode types.

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};

/// Episode number, unique per podcast. The unit of co-occurrence membership.
pub type EpisodeId = u32;

/// Per-episode metadata as stored in `podcasts/{id}/episodes/*.json`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EpisodeMetadata {
    pub number: EpisodeId,
    #[serde(default)]
    pub title: Option<String>,
    /// Release date, `YYYY-MM-DD` or RFC 3339
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub speakers: Vec<String>,
}

impl EpisodeMetadata {
    /// Parse the release date, accepting RFC 3339 timestamps and plain dates.
    pub fn release_date(&self) -> Option<NaiveDate> {
        let raw = self.date.as_deref()?.trim();
        if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
            return Some(ts.date_naive());
        }
        raw.get(..10)
            .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
    }
}
