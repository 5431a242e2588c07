//! Low-dimensional layout: curve fitting and stochastic gradient descent.

use rand::Rng;

use super::graph::Edge;
use super::Coordinate2D;

const CURVE_SAMPLES: usize = 300;
const FIT_MAX_ITERATIONS: usize = 500;
const GRADIENT_CLIP: f32 = 4.0;
const REPULSION_STRENGTH: f32 = 1.0;

/// Fit `1 / (1 + a * x^(2b))` to the target membership curve for
/// `spread`/`min_dist`, using damped least squares.
///
/// For `spread = 1.0, min_dist = 0.1` this gives `a ≈ 1.577, b ≈ 0.895`.
pub fn find_ab_params(spread: f32, min_dist: f32) -> (f32, f32) {
    let spread = f64::from(spread);
    let min_dist = f64::from(min_dist);

    let xs: Vec<f64> = (0..CURVE_SAMPLES)
        .map(|i| spread * 3.0 * i as f64 / (CURVE_SAMPLES - 1) as f64)
        .collect();
    let ys: Vec<f64> = xs
        .iter()
        .map(|&x| {
            if x < min_dist {
                1.0
            } else {
                (-(x - min_dist) / spread).exp()
            }
        })
        .collect();

    let cost = |a: f64, b: f64| -> f64 {
        xs.iter()
            .zip(&ys)
            .map(|(&x, &y)| {
                let r = curve(x, a, b) - y;
                r * r
            })
            .sum()
    };

    let (mut a, mut b) = (1.0f64, 1.0f64);
    let mut current = cost(a, b);
    let mut lambda = 1e-3f64;

    for _ in 0..FIT_MAX_ITERATIONS {
        // Normal equations J^T J and J^T r.
        let (mut jaa, mut jab, mut jbb, mut ga, mut gb) = (0.0, 0.0, 0.0, 0.0, 0.0);
        for (&x, &y) in xs.iter().zip(&ys) {
            if x <= 0.0 {
                continue;
            }
            let p = x.powf(2.0 * b);
            let denom = (1.0 + a * p).powi(2);
            let da = -p / denom;
            let db = -a * p * 2.0 * x.ln() / denom;
            let r = curve(x, a, b) - y;
            jaa += da * da;
            jab += da * db;
            jbb += db * db;
            ga += da * r;
            gb += db * r;
        }

        let mut improved = false;
        while lambda < 1e12 {
            let m00 = jaa * (1.0 + lambda);
            let m11 = jbb * (1.0 + lambda);
            let det = m00 * m11 - jab * jab;
            if det.abs() < f64::EPSILON {
                lambda *= 10.0;
                continue;
            }
            let step_a = -(m11 * ga - jab * gb) / det;
            let step_b = -(m00 * gb - jab * ga) / det;
            let (na, nb) = (a + step_a, b + step_b);

            if na > 0.0 && nb > 0.0 {
                let candidate = cost(na, nb);
                if candidate < current {
                    let converged = (current - candidate) < 1e-14
                        || (step_a.abs() < 1e-10 && step_b.abs() < 1e-10);
                    a = na;
                    b = nb;
                    current = candidate;
                    lambda = (lambda * 0.1).max(1e-12);
                    improved = !converged;
                    break;
                }
            }
            lambda *= 10.0;
        }

        if !improved {
            break;
        }
    }

    (a as f32, b as f32)
}

fn curve(x: f64, a: f64, b: f64) -> f64 {
    1.0 / (1.0 + a * x.powf(2.0 * b))
}

/// Optimization settings for [`optimize_layout`].
#[derive(Debug, Clone, Copy)]
pub(crate) struct LayoutParams {
    pub a: f32,
    pub b: f32,
    pub n_epochs: usize,
    pub learning_rate: f32,
    pub negative_sample_rate: usize,
}

fn clip(value: f32) -> f32 {
    value.clamp(-GRADIENT_CLIP, GRADIENT_CLIP)
}

fn squared_distance(p: Coordinate2D, q: Coordinate2D) -> f32 {
    (p[0] - q[0]).powi(2) + (p[1] - q[1]).powi(2)
}

/// Per-edge sampling period: the heaviest edge is sampled every epoch.
fn epochs_per_sample(edges: &[Edge], n_epochs: usize) -> Vec<f32> {
    let max_weight = edges.iter().map(|e| e.weight).fold(0.0f32, f32::max);
    edges
        .iter()
        .map(|e| {
            let samples = n_epochs as f32 * e.weight / max_weight;
            if samples > 0.0 {
                n_epochs as f32 / samples
            } else {
                -1.0
            }
        })
        .collect()
}

/// Move `embedding` in place: attraction along edges, repulsion from
/// randomly sampled points. The learning rate decays linearly to zero.
pub(crate) fn optimize_layout<R: Rng + ?Sized>(
    embedding: &mut [Coordinate2D],
    edges: &[Edge],
    params: LayoutParams,
    rng: &mut R,
) {
    let n = embedding.len();
    if n < 2 || edges.is_empty() {
        return;
    }

    let LayoutParams { a, b, .. } = params;
    let per_sample = epochs_per_sample(edges, params.n_epochs);
    let sample_negatives = params.negative_sample_rate > 0;
    let negative_rate = params.negative_sample_rate.max(1) as f32;
    let per_negative: Vec<f32> = per_sample.iter().map(|&e| e / negative_rate).collect();
    let mut next_sample = per_sample.clone();
    let mut next_negative = per_negative.clone();

    for epoch in 0..params.n_epochs {
        let epoch_f = epoch as f32;
        let alpha = params.learning_rate * (1.0 - epoch_f / params.n_epochs as f32);

        for (e, edge) in edges.iter().enumerate() {
            if per_sample[e] <= 0.0 || next_sample[e] > epoch_f {
                continue;
            }

            let (j, k) = (edge.head, edge.tail);
            let current = embedding[j];
            let other = embedding[k];
            let dist_sq = squared_distance(current, other);

            let attract = if dist_sq > 0.0 {
                -2.0 * a * b * dist_sq.powf(b - 1.0) / (a * dist_sq.powf(b) + 1.0)
            } else {
                0.0
            };
            for d in 0..2 {
                let grad = clip(attract * (current[d] - other[d]));
                embedding[j][d] += grad * alpha;
                embedding[k][d] -= grad * alpha;
            }
            next_sample[e] += per_sample[e];

            if !sample_negatives {
                continue;
            }
            let n_negative = ((epoch_f - next_negative[e]) / per_negative[e]).floor().max(0.0);
            for _ in 0..n_negative as usize {
                let k = rng.random_range(0..n);
                if k == j {
                    continue;
                }
                let current = embedding[j];
                let other = embedding[k];
                let dist_sq = squared_distance(current, other);
                let repel = if dist_sq > 0.0 {
                    2.0 * REPULSION_STRENGTH * b
                        / ((0.001 + dist_sq) * (a * dist_sq.powf(b) + 1.0))
                } else {
                    0.0
                };
                for d in 0..2 {
                    let grad = if repel > 0.0 {
                        clip(repel * (current[d] - other[d]))
                    } else {
                        GRADIENT_CLIP
                    };
                    embedding[j][d] += grad * alpha;
                }
            }
            next_negative[e] += n_negative * per_negative[e];
        }
    }
}
