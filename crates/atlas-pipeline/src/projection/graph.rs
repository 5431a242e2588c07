//! Fuzzy neighborhood graph over unit-normalized embeddings.

use std::collections::BTreeMap;

use crate::similarity::unit_cosine_distance;

const SMOOTH_K_ITERATIONS: usize = 64;
const SMOOTH_K_TOLERANCE: f32 = 1e-5;
const MIN_K_DIST_SCALE: f32 = 1e-3;

/// k nearest neighbors per point, nearest first, self excluded.
#[derive(Debug, Clone)]
pub(crate) struct KnnGraph {
    pub indices: Vec<Vec<usize>>,
    pub distances: Vec<Vec<f32>>,
}

/// An undirected weighted edge with `head < tail`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Edge {
    pub head: usize,
    pub tail: usize,
    pub weight: f32,
}

/// Brute-force neighbor search. Ties break on the lower index.
pub(crate) fn nearest_neighbors(data: &[Vec<f32>], k: usize) -> KnnGraph {
    let n = data.len();
    let k = k.min(n.saturating_sub(1));
    let mut indices = Vec::with_capacity(n);
    let mut distances = Vec::with_capacity(n);

    for (i, point) in data.iter().enumerate() {
        let mut row: Vec<(f32, usize)> = data
            .iter()
            .enumerate()
            .filter(|&(j, _)| j != i)
            .map(|(j, other)| (unit_cosine_distance(point, other), j))
            .collect();

        let by_distance =
            |a: &(f32, usize), b: &(f32, usize)| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1));
        if k < row.len() {
            row.select_nth_unstable_by(k, by_distance);
            row.truncate(k);
        }
        row.sort_by(by_distance);

        indices.push(row.iter().map(|&(_, j)| j).collect());
        distances.push(row.iter().map(|&(d, _)| d).collect());
    }

    KnnGraph { indices, distances }
}

/// Per-point `(sigma, rho)` so that the membership strengths of each
/// neighborhood sum to `log2(k + 1)`.
pub(crate) fn smooth_knn_distances(distances: &[Vec<f32>]) -> Vec<(f32, f32)> {
    let all: Vec<f32> = distances.iter().flatten().copied().collect();
    let mean_all = if all.is_empty() {
        0.0
    } else {
        all.iter().sum::<f32>() / all.len() as f32
    };

    distances
        .iter()
        .map(|row| {
            if row.is_empty() {
                return (1.0, 0.0);
            }
            let target = ((row.len() + 1) as f32).log2();
            let rho = row.iter().copied().find(|&d| d > 0.0).unwrap_or(0.0);

            let mut lo = 0.0f32;
            let mut hi = f32::INFINITY;
            let mut mid = 1.0f32;

            for _ in 0..SMOOTH_K_ITERATIONS {
                let psum: f32 = row
                    .iter()
                    .map(|&d| {
                        let gap = d - rho;
                        if gap > 0.0 {
                            (-gap / mid).exp()
                        } else {
                            1.0
                        }
                    })
                    .sum();

                if (psum - target).abs() < SMOOTH_K_TOLERANCE {
                    break;
                }
                if psum > target {
                    hi = mid;
                    mid = (lo + hi) / 2.0;
                } else {
                    lo = mid;
                    mid = if hi.is_infinite() {
                        mid * 2.0
                    } else {
                        (lo + hi) / 2.0
                    };
                }
            }

            let mean_row = row.iter().sum::<f32>() / row.len() as f32;
            let floor = if rho > 0.0 { mean_row } else { mean_all };
            (mid.max(MIN_K_DIST_SCALE * floor), rho)
        })
        .collect()
}

/// Symmetrized membership graph: `w = a + b - a * b` over both directions.
///
/// Edges come out sorted by `(head, tail)`.
pub(crate) fn fuzzy_simplicial_set(knn: &KnnGraph) -> Vec<Edge> {
    let scales = smooth_knn_distances(&knn.distances);
    let mut directed: BTreeMap<(usize, usize), f32> = BTreeMap::new();

    for (i, (neighbors, dists)) in knn.indices.iter().zip(&knn.distances).enumerate() {
        let (sigma, rho) = scales[i];
        for (&j, &d) in neighbors.iter().zip(dists) {
            let gap = d - rho;
            let strength = if gap > 0.0 && sigma > 0.0 {
                (-gap / sigma).exp()
            } else {
                1.0
            };
            directed.insert((i, j), strength);
        }
    }

    let mut edges: BTreeMap<(usize, usize), f32> = BTreeMap::new();
    for (&(i, j), &w_ij) in &directed {
        let key = (i.min(j), i.max(j));
        if edges.contains_key(&key) {
            continue;
        }
        let w_ji = directed.get(&(j, i)).copied().unwrap_or(0.0);
        edges.insert(key, w_ij + w_ji - w_ij * w_ji);
    }

    edges
        .into_iter()
        .filter(|&(_, w)| w > 0.0)
        .map(|((head, tail), weight)| Edge { head, tail, weight })
        .collect()
}
