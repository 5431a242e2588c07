//! Removal of boilerplate topics before projection.
//!
//! Intro/outro segments and topics present in nearly every episode carry no
//! signal for the layout and would pull every cluster toward one point.

use std::collections::HashSet;

use tracing::info;

use atlas_types::{EpisodeId, FilterConfig, TopicWithEmbedding};

/// Counts of topics removed by [`filter_boilerplate_topics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterReport {
    pub kept: usize,
    pub dropped_by_name: usize,
    pub dropped_by_share: usize,
    /// Distinct episodes across all input topics
    pub total_episodes: usize,
}

impl FilterReport {
    pub fn dropped(&self) -> usize {
        self.dropped_by_name + self.dropped_by_share
    }
}

fn is_intro_outro(label: &str) -> bool {
    let lower = label.to_lowercase();
    lower.contains("intro") || lower.contains("outro")
}

/// Drop intro/outro topics and topics at or above the ubiquity threshold.
///
/// Episode share is measured against the distinct episodes referenced by
/// any input topic. Input order is preserved.
pub fn filter_boilerplate_topics(
    topics: Vec<TopicWithEmbedding>,
    config: &FilterConfig,
) -> (Vec<TopicWithEmbedding>, FilterReport) {
    let all_episodes: HashSet<EpisodeId> = topics
        .iter()
        .flat_map(|t| t.episodes.iter().copied())
        .collect();
    let total_episodes = all_episodes.len().max(1);

    let mut report = FilterReport {
        total_episodes: all_episodes.len(),
        ..Default::default()
    };

    let kept: Vec<TopicWithEmbedding> = topics
        .into_iter()
        .filter(|topic| {
            if config.drop_intro_outro && is_intro_outro(&topic.topic) {
                report.dropped_by_name += 1;
                return false;
            }
            let distinct: HashSet<&EpisodeId> = topic.episodes.iter().collect();
            let share = distinct.len() as f64 / total_episodes as f64;
            if share >= config.ubiquitous_topic_max_episode_share {
                report.dropped_by_share += 1;
                return false;
            }
            true
        })
        .collect();

    report.kept = kept.len();

    if report.dropped() > 0 {
        info!(
            by_name = report.dropped_by_name,
            by_share = report.dropped_by_share,
            threshold = config.ubiquitous_topic_max_episode_share,
            total_episodes = report.total_episodes,
            kept = report.kept,
            "Filtered boilerplate topics"
        );
    }

    (kept, report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn topic(label: &str, episodes: &[EpisodeId]) -> TopicWithEmbedding {
        TopicWithEmbedding::new(label, episodes.to_vec(), vec![1.0, 0.0])
    }

    fn labels(topics: &[TopicWithEmbedding]) -> Vec<&str> {
        topics.iter().map(|t| t.topic.as_str()).collect()
    }

    #[test]
    fn test_drops_intro_outro_case_insensitive() {
        let topics = vec![
            topic("Intro und Begrüßung", &[1]),
            topic("Rust", &[2]),
            topic("Sendungs-OUTRO", &[3]),
        ];
        let (kept, report) = filter_boilerplate_topics(topics, &FilterConfig::default());
        assert_eq!(labels(&kept), vec!["Rust"]);
        assert_eq!(report.dropped_by_name, 2);
        assert_eq!(report.dropped_by_share, 0);
    }

    #[test]
    fn test_drops_ubiquitous_topics() {
        let mut topics: Vec<TopicWithEmbedding> =
            (1..=10).map(|i| topic(&format!("t{i}"), &[i])).collect();
        topics.push(topic("everywhere", &(1..=9).collect::<Vec<_>>()));
        topics.push(topic("common", &(1..=8).collect::<Vec<_>>()));

        let (kept, report) = filter_boilerplate_topics(topics, &FilterConfig::default());
        assert_eq!(report.total_episodes, 10);
        assert_eq!(report.dropped_by_share, 1);
        assert!(!labels(&kept).contains(&"everywhere"));
        assert!(labels(&kept).contains(&"common"));
    }

    #[test]
    fn test_name_filter_can_be_disabled() {
        let config = FilterConfig {
            drop_intro_outro: false,
            ..Default::default()
        };
        let topics = vec![topic("Intro", &[1]), topic("Other", &[2]), topic("More", &[3])];
        let (kept, report) = filter_boilerplate_topics(topics, &config);
        assert_eq!(kept.len(), 3);
        assert_eq!(report.dropped(), 0);
    }

    #[test]
    fn test_empty_input() {
        let (kept, report) = filter_boilerplate_topics(Vec::new(), &FilterConfig::default());
        assert!(kept.is_empty());
        assert_eq!(report, FilterReport::default());
    }
}
