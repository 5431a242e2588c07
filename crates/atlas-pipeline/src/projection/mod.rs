//! Projection Engine: UMAP over topic embeddings.
//!
//! Embeddings are unit-normalized and compared by cosine distance. The
//! pipeline is neighbor search, fuzzy graph symmetrization, curve fitting
//! for the low-dimensional kernel, then SGD from a uniform random start.
//! All randomness is drawn from the caller's RNG, so a seeded RNG gives
//! identical coordinates for identical input.

mod graph;
mod layout;

use std::collections::HashMap;

use chrono::Utc;
use rand::Rng;
use tracing::{debug, info, instrument};

use atlas_types::{
    ClusterCount, ProjectionArtifact, ProjectionConfig, ProjectionParameters, ProjectionPoint,
    ProjectionStatistics, TopicWithEmbedding,
};

use crate::error::PipelineError;
use crate::similarity::normalize;
use crate::taxonomy_index::TopicClusterIndex;

pub use layout::find_ab_params;

/// Output dimensionality. Fixed.
pub const N_COMPONENTS: usize = 2;

/// Number of clusters listed in the projection statistics.
pub const TOP_CLUSTERS: usize = 10;

const INIT_RANGE: f32 = 10.0;

/// A point in the 2-D layout.
pub type Coordinate2D = [f32; 2];

/// Project embeddings to 2-D.
///
/// Output index `i` corresponds to input index `i`.
///
/// # Errors
///
/// `Config` for invalid parameters, `MalformedInput` when vectors are
/// empty or differ in dimension.
#[instrument(skip(embeddings, params, rng), fields(points = embeddings.len()))]
pub fn project<R: Rng + ?Sized>(
    embeddings: &[Vec<f32>],
    params: &ProjectionConfig,
    rng: &mut R,
) -> Result<Vec<Coordinate2D>, PipelineError> {
    params.validate().map_err(PipelineError::Config)?;

    let Some(first) = embeddings.first() else {
        return Ok(Vec::new());
    };
    let dim = first.len();
    if dim == 0 {
        return Err(PipelineError::MalformedInput(
            "embedding vectors are empty".to_string(),
        ));
    }
    if let Some((i, bad)) = embeddings.iter().enumerate().find(|(_, e)| e.len() != dim) {
        return Err(PipelineError::MalformedInput(format!(
            "embedding {i} has {} dimensions, expected {dim}",
            bad.len()
        )));
    }
    if embeddings.len() == 1 {
        return Ok(vec![[0.0, 0.0]]);
    }

    let data: Vec<Vec<f32>> = embeddings
        .iter()
        .map(|e| {
            let mut v = e.clone();
            normalize(&mut v);
            v
        })
        .collect();

    // n_neighbors counts the point itself.
    let k = params.n_neighbors.min(data.len()) - 1;
    let knn = graph::nearest_neighbors(&data, k);
    let edges = graph::fuzzy_simplicial_set(&knn);
    let (a, b) = find_ab_params(params.spread, params.min_dist);
    debug!(k, edges = edges.len(), a, b, "Built fuzzy neighborhood graph");

    let mut coords: Vec<Coordinate2D> = (0..data.len())
        .map(|_| {
            [
                rng.random_range(-INIT_RANGE..INIT_RANGE),
                rng.random_range(-INIT_RANGE..INIT_RANGE),
            ]
        })
        .collect();

    layout::optimize_layout(
        &mut coords,
        &edges,
        layout::LayoutParams {
            a,
            b,
            n_epochs: params.n_epochs,
            learning_rate: params.learning_rate,
            negative_sample_rate: params.negative_sample_rate,
        },
        rng,
    );

    info!(
        points = coords.len(),
        epochs = params.n_epochs,
        "Projection complete"
    );
    Ok(coords)
}

/// Join coordinates back to their topics by position and attach cluster
/// membership. Topics without a taxonomy entry get the unclustered sentinel.
///
/// # Panics
///
/// Panics if `topics` and `coords` differ in length.
pub fn annotate_points(
    topics: &[TopicWithEmbedding],
    coords: &[Coordinate2D],
    index: &TopicClusterIndex,
) -> Vec<ProjectionPoint> {
    assert_eq!(
        topics.len(),
        coords.len(),
        "Topics and coordinates must have same length"
    );

    topics
        .iter()
        .zip(coords)
        .map(|(topic, &[x, y])| {
            let membership = index.membership_or_unclustered(&topic.topic);
            ProjectionPoint {
                topic: topic.topic.clone(),
                keywords: topic.keywords.clone(),
                count: topic.count,
                episodes: topic.episodes.clone(),
                x,
                y,
                cluster_id: membership.cluster_id,
                cluster_name: membership.cluster_name,
                is_outlier: membership.is_outlier,
            }
        })
        .collect()
}

/// Assemble the projection document.
///
/// `total_clusters` is the taxonomy's cluster count.
pub fn build_projection_artifact(
    points: Vec<ProjectionPoint>,
    params: &ProjectionConfig,
    total_clusters: usize,
) -> ProjectionArtifact {
    let unclustered_topics = points.iter().filter(|p| p.is_unclustered()).count();
    let clustered_topics = points.len() - unclustered_topics;

    // First-seen order, then a stable sort keeps ties deterministic.
    let mut order: Vec<(&str, &str)> = Vec::new();
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for point in points.iter().filter(|p| !p.is_unclustered()) {
        let count = counts.entry(point.cluster_id.as_str()).or_insert_with(|| {
            order.push((point.cluster_id.as_str(), point.cluster_name.as_str()));
            0
        });
        *count += 1;
    }
    let mut top_clusters: Vec<ClusterCount> = order
        .into_iter()
        .map(|(id, name)| ClusterCount {
            cluster_id: id.to_string(),
            cluster_name: name.to_string(),
            topic_count: counts[id],
        })
        .collect();
    top_clusters.sort_by(|a, b| b.topic_count.cmp(&a.topic_count));
    top_clusters.truncate(TOP_CLUSTERS);

    ProjectionArtifact {
        created_at: Utc::now(),
        method: "umap".to_string(),
        parameters: ProjectionParameters {
            n_components: N_COMPONENTS,
            n_neighbors: params.n_neighbors,
            min_dist: params.min_dist,
            spread: params.spread,
        },
        total_topics: points.len(),
        total_clusters,
        statistics: ProjectionStatistics {
            clustered_topics,
            unclustered_topics,
            top_clusters,
        },
        points,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::taxonomy_index::build_topic_cluster_index;
    use atlas_types::{Taxonomy, TaxonomyCluster, UNCLUSTERED_ID};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    /// Two well-separated groups in 8 dimensions.
    fn two_groups(per_group: usize) -> Vec<Vec<f32>> {
        let mut rng = StdRng::seed_from_u64(99);
        let mut out = Vec::new();
        for group in 0..2 {
            for _ in 0..per_group {
                let v: Vec<f32> = (0..8)
                    .map(|d| {
                        let base = if (d < 4) == (group == 0) { 1.0 } else { 0.0 };
                        base + rng.random_range(-0.05..0.05)
                    })
                    .collect();
                out.push(v);
            }
        }
        out
    }

    fn small_params() -> ProjectionConfig {
        ProjectionConfig {
            n_neighbors: 5,
            n_epochs: 100,
            ..Default::default()
        }
    }

    #[test]
    fn test_seeded_runs_are_identical() {
        let data = two_groups(10);
        let params = small_params();
        let first = project(&data, &params, &mut StdRng::seed_from_u64(42)).unwrap();
        let second = project(&data, &params, &mut StdRng::seed_from_u64(42)).unwrap();
        assert_eq!(first.len(), data.len());
        assert_eq!(first, second);
        assert!(first.iter().all(|p| p[0].is_finite() && p[1].is_finite()));
    }

    #[test]
    fn test_groups_stay_apart() {
        let data = two_groups(10);
        let coords = project(&data, &small_params(), &mut StdRng::seed_from_u64(1)).unwrap();

        let dist = |i: usize, j: usize| {
            ((coords[i][0] - coords[j][0]).powi(2) + (coords[i][1] - coords[j][1]).powi(2)).sqrt()
        };
        let (mut intra, mut inter) = (Vec::new(), Vec::new());
        for i in 0..20 {
            for j in (i + 1)..20 {
                if (i < 10) == (j < 10) {
                    intra.push(dist(i, j));
                } else {
                    inter.push(dist(i, j));
                }
            }
        }
        let mean = |v: &[f32]| v.iter().sum::<f32>() / v.len() as f32;
        assert!(mean(&intra) < mean(&inter));
    }

    #[test]
    fn test_degenerate_inputs() {
        let params = ProjectionConfig::default();
        let mut rng = StdRng::seed_from_u64(0);
        assert!(project(&[], &params, &mut rng).unwrap().is_empty());
        assert_eq!(
            project(&[vec![1.0, 2.0]], &params, &mut rng).unwrap(),
            vec![[0.0, 0.0]]
        );
        let pair = project(&[vec![1.0, 0.0], vec![0.0, 1.0]], &params, &mut rng).unwrap();
        assert_eq!(pair.len(), 2);
    }

    #[test]
    fn test_dimension_mismatch_is_malformed() {
        let data = vec![vec![1.0, 0.0], vec![1.0, 0.0, 0.0]];
        let err = project(&data, &ProjectionConfig::default(), &mut StdRng::seed_from_u64(0))
            .unwrap_err();
        assert!(matches!(err, PipelineError::MalformedInput(_)));
    }

    #[test]
    fn test_invalid_params_rejected() {
        let params = ProjectionConfig {
            n_neighbors: 1,
            ..Default::default()
        };
        let err = project(&[vec![1.0]], &params, &mut StdRng::seed_from_u64(0)).unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));
    }

    fn taxonomy() -> Taxonomy {
        Taxonomy {
            clusters: vec![
                TaxonomyCluster::new("apple", "Apple", &["iPhone", "macOS"]),
                TaxonomyCluster {
                    is_outlier: true,
                    ..TaxonomyCluster::new("misc", "Sonstiges", &["Wetter"])
                },
            ],
            ..Default::default()
        }
    }

    fn topics() -> Vec<TopicWithEmbedding> {
        ["iPhone", "macOS", "Wetter", "Kaffee"]
            .iter()
            .map(|t| TopicWithEmbedding::new(*t, vec![1, 2], vec![1.0, 0.0]))
            .collect()
    }

    #[test]
    fn test_annotate_points_every_topic_once() {
        let topics = topics();
        let index = build_topic_cluster_index(&taxonomy());
        let coords: Vec<Coordinate2D> = (0..topics.len()).map(|i| [i as f32, 0.0]).collect();
        let points = annotate_points(&topics, &coords, &index);

        assert_eq!(points.len(), topics.len());
        let names: HashSet<&str> = points.iter().map(|p| p.topic.as_str()).collect();
        assert_eq!(names.len(), topics.len());

        assert_eq!(points[0].cluster_id, "apple");
        assert_eq!(points[1].x, 1.0);
        assert!(points[2].is_outlier);
        assert_eq!(points[3].cluster_id, UNCLUSTERED_ID);
        assert!(!points[3].is_outlier);
    }

    #[test]
    #[should_panic(expected = "same length")]
    fn test_annotate_points_length_mismatch_panics() {
        let index = build_topic_cluster_index(&taxonomy());
        annotate_points(&topics(), &[[0.0, 0.0]], &index);
    }

    #[test]
    fn test_build_projection_artifact_statistics() {
        let index = build_topic_cluster_index(&taxonomy());
        let coords = vec![[0.0, 0.0]; 4];
        let points = annotate_points(&topics(), &coords, &index);
        let artifact = build_projection_artifact(points, &ProjectionConfig::default(), 2);

        assert_eq!(artifact.method, "umap");
        assert_eq!(artifact.parameters.n_components, 2);
        assert_eq!(artifact.total_topics, 4);
        assert_eq!(artifact.total_clusters, 2);
        assert_eq!(artifact.statistics.clustered_topics, 3);
        assert_eq!(artifact.statistics.unclustered_topics, 1);
        assert_eq!(artifact.statistics.top_clusters[0].cluster_id, "apple");
        assert_eq!(artifact.statistics.top_clusters[0].topic_count, 2);
        assert_eq!(artifact.statistics.top_clusters.len(), 2);
    }
}
