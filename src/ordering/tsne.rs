//! Exact t-SNE onto one dimension
//!
//! Small-N batch embedding: every step is O(N^2), which is fine for the
//! folder sizes this tool targets. All randomness comes from a `StdRng`
//! seeded from `EmbeddingParams::seed`, and all reductions run in a fixed
//! order, so the same input always yields the same coordinates.

use crate::config::EmbeddingParams;
use crate::models::FeatureVector;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Entropy tolerance when calibrating each row to the target perplexity
const PERPLEXITY_TOLERANCE: f64 = 1e-5;
const PERPLEXITY_STEPS: usize = 100;
const POWER_ITERATIONS: usize = 100;
/// Standard deviation of the initial layout
const INIT_SCALE: f64 = 1e-4;
const MIN_GAIN: f64 = 0.01;
const MIN_GRAD_NORM: f64 = 1e-7;
const MIN_PROBABILITY: f64 = 1e-12;

/// Embed the feature vectors onto a single axis
///
/// Callers guarantee at least one vector and equal lengths.
pub fn embed_1d(features: &[FeatureVector], params: &EmbeddingParams) -> Vec<f64> {
    let n = features.len();
    let data: Vec<Vec<f64>> = features
        .iter()
        .map(|f| f.as_slice().iter().map(|&v| v as f64).collect())
        .collect();

    let distances = squared_distances(&data);
    let perplexity = effective_perplexity(params.perplexity, n);
    let p = joint_probabilities(&distances, n, perplexity);

    let mut rng = StdRng::seed_from_u64(params.seed);
    let mut y = pca_init(&data, &mut rng);

    tracing::debug!(
        samples = n,
        perplexity,
        iterations = params.iterations,
        "Running 1-D t-SNE"
    );

    optimize(&p, &mut y, params);
    y
}

/// Perplexity must stay below the number of neighbours
pub fn effective_perplexity(requested: f64, n: usize) -> f64 {
    let upper = n.saturating_sub(1) as f64 / 3.0;
    requested.min(upper).max(1.0)
}

fn squared_distances(data: &[Vec<f64>]) -> Vec<f64> {
    let n = data.len();
    let mut distances = vec![0.0f64; n * n];
    for i in 0..n {
        for j in (i + 1)..n {
            let d: f64 = data[i]
                .iter()
                .zip(data[j].iter())
                .map(|(a, b)| (a - b) * (a - b))
                .sum();
            distances[i * n + j] = d;
            distances[j * n + i] = d;
        }
    }
    distances
}

/// Symmetrised joint probabilities P_ij = (p_j|i + p_i|j) / 2N
fn joint_probabilities(distances: &[f64], n: usize, perplexity: f64) -> Vec<f64> {
    let target_entropy = perplexity.ln();
    let mut conditional = vec![0.0f64; n * n];

    for i in 0..n {
        let row = calibrate_row(&distances[i * n..(i + 1) * n], i, target_entropy);
        conditional[i * n..(i + 1) * n].copy_from_slice(&row);
    }

    let mut joint = vec![0.0f64; n * n];
    let denom = 2.0 * n as f64;
    for i in 0..n {
        for j in 0..n {
            if i != j {
                let value = (conditional[i * n + j] + conditional[j * n + i]) / denom;
                joint[i * n + j] = value.max(MIN_PROBABILITY);
            }
        }
    }
    joint
}

/// Binary search for the Gaussian precision that hits the target entropy
///
/// Distances are shifted by the row minimum before exponentiating; the
/// entropy is invariant under the shift and the nearest neighbour then
/// contributes exactly 1, so the normaliser never underflows.
fn calibrate_row(distances: &[f64], i: usize, target_entropy: f64) -> Vec<f64> {
    let n = distances.len();
    let mut row = vec![0.0f64; n];
    if n < 2 {
        return row;
    }

    let min_distance = distances
        .iter()
        .enumerate()
        .filter(|(j, _)| *j != i)
        .map(|(_, d)| *d)
        .fold(f64::INFINITY, f64::min);

    let mut beta = 1.0f64;
    let mut beta_low = 0.0f64;
    let mut beta_high = f64::INFINITY;
    let mut sum = 1.0f64;

    for _ in 0..PERPLEXITY_STEPS {
        sum = 0.0;
        let mut weighted = 0.0f64;
        for j in 0..n {
            if j == i {
                row[j] = 0.0;
                continue;
            }
            let d = distances[j] - min_distance;
            let p = (-d * beta).exp();
            row[j] = p;
            sum += p;
            weighted += d * p;
        }

        let entropy = sum.ln() + beta * weighted / sum;
        let diff = entropy - target_entropy;
        if diff.abs() < PERPLEXITY_TOLERANCE {
            break;
        }

        if diff > 0.0 {
            beta_low = beta;
            beta = if beta_high.is_infinite() {
                beta * 2.0
            } else {
                (beta + beta_high) / 2.0
            };
        } else {
            beta_high = beta;
            beta = (beta + beta_low) / 2.0;
        }
    }

    for value in row.iter_mut() {
        *value /= sum;
    }
    row
}

/// First principal component, rescaled to a tiny spread
///
/// Falls back to a seeded Gaussian layout when the data has no variance.
fn pca_init(data: &[Vec<f64>], rng: &mut StdRng) -> Vec<f64> {
    let n = data.len();
    let dim = data.first().map_or(0, |row| row.len());

    let mut mean = vec![0.0f64; dim];
    for row in data {
        for (m, v) in mean.iter_mut().zip(row.iter()) {
            *m += v;
        }
    }
    for m in mean.iter_mut() {
        *m /= n as f64;
    }
    let centered: Vec<Vec<f64>> = data
        .iter()
        .map(|row| row.iter().zip(mean.iter()).map(|(v, m)| v - m).collect())
        .collect();

    let mut component: Vec<f64> = (0..dim).map(|_| rng.gen::<f64>() - 0.5).collect();
    if normalize(&mut component).is_none() {
        return gaussian_init(n, rng);
    }

    for _ in 0..POWER_ITERATIONS {
        let projections: Vec<f64> = centered.iter().map(|row| dot(row, &component)).collect();
        let mut next = vec![0.0f64; dim];
        for (row, p) in centered.iter().zip(projections.iter()) {
            for (acc, v) in next.iter_mut().zip(row.iter()) {
                *acc += v * p;
            }
        }
        if normalize(&mut next).is_none() {
            return gaussian_init(n, rng);
        }
        component = next;
    }

    // Fix the sign so the layout does not depend on the starting vector
    let pivot = component
        .iter()
        .copied()
        .fold(0.0f64, |best, v| if v.abs() > best.abs() { v } else { best });
    if pivot < 0.0 {
        for c in component.iter_mut() {
            *c = -*c;
        }
    }

    let coords: Vec<f64> = centered.iter().map(|row| dot(row, &component)).collect();
    let std = std_dev(&coords);
    if !(std > 1e-12) {
        return gaussian_init(n, rng);
    }
    coords.iter().map(|c| c / std * INIT_SCALE).collect()
}

fn gaussian_init(n: usize, rng: &mut StdRng) -> Vec<f64> {
    (0..n)
        .map(|_| {
            // Box-Muller
            let u1: f64 = rng.gen_range(f64::EPSILON..1.0);
            let u2: f64 = rng.gen();
            (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos() * INIT_SCALE
        })
        .collect()
}

/// Gradient descent with momentum and per-point gains
fn optimize(p: &[f64], y: &mut [f64], params: &EmbeddingParams) {
    let n = y.len();
    let learning_rate = stable_learning_rate(p, n, params.early_exaggeration);
    let mut update = vec![0.0f64; n];
    let mut gains = vec![1.0f64; n];

    for iteration in 0..params.iterations {
        let exaggerating = iteration < params.exaggeration_iterations;
        let (exaggeration, momentum) = if exaggerating {
            (params.early_exaggeration, 0.5)
        } else {
            (1.0, 0.8)
        };

        let grad = gradient(p, y, exaggeration);

        for i in 0..n {
            let same_direction = update[i] * grad[i] >= 0.0;
            gains[i] = if same_direction {
                gains[i] * 0.8
            } else {
                gains[i] + 0.2
            };
            gains[i] = gains[i].max(MIN_GAIN);
            update[i] = momentum * update[i] - learning_rate * gains[i] * grad[i];
            y[i] += update[i];
        }

        let grad_norm = grad.iter().map(|g| g * g).sum::<f64>().sqrt();
        if !exaggerating && grad_norm < MIN_GRAD_NORM {
            tracing::debug!(iteration, grad_norm, "t-SNE converged");
            break;
        }
    }
}

/// Step size that keeps the first iterations from overshooting
///
/// While the layout is much smaller than 1 the kernel is ~1 and the gradient
/// is linear in `y`, with curvature at most `4 * exaggeration * 2 * max_i
/// sum_j P_ij` (Gershgorin on the Laplacian of P). The usual
/// `max(N / exaggeration / 4, 50)` is capped so one step never exceeds that
/// curvature.
fn stable_learning_rate(p: &[f64], n: usize, exaggeration: f64) -> f64 {
    let exaggeration = exaggeration.max(1.0);
    let heuristic = (n as f64 / exaggeration / 4.0).max(50.0);
    let max_row = p
        .chunks(n.max(1))
        .map(|row| row.iter().sum::<f64>())
        .fold(0.0f64, f64::max);
    if !(max_row > 0.0) {
        return heuristic;
    }
    heuristic.min(1.0 / (8.0 * exaggeration * max_row))
}

/// KL(P || Q) gradient with a Student-t kernel in one dimension
fn gradient(p: &[f64], y: &[f64], exaggeration: f64) -> Vec<f64> {
    let n = y.len();
    let mut kernel = vec![0.0f64; n * n];
    let mut kernel_sum = 0.0f64;
    for i in 0..n {
        for j in (i + 1)..n {
            let diff = y[i] - y[j];
            let k = 1.0 / (1.0 + diff * diff);
            kernel[i * n + j] = k;
            kernel[j * n + i] = k;
            kernel_sum += 2.0 * k;
        }
    }
    let kernel_sum = kernel_sum.max(f64::MIN_POSITIVE);

    let mut grad = vec![0.0f64; n];
    for i in 0..n {
        let mut g = 0.0f64;
        for j in 0..n {
            if i == j {
                continue;
            }
            let k = kernel[i * n + j];
            let q = (k / kernel_sum).max(MIN_PROBABILITY);
            g += (exaggeration * p[i * n + j] - q) * k * (y[i] - y[j]);
        }
        grad[i] = 4.0 * g;
    }
    grad
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

fn normalize(v: &mut [f64]) -> Option<()> {
    let norm = v.iter().map(|x| x * x).sum::<f64>().sqrt();
    if !(norm > 1e-300) {
        return None;
    }
    for x in v.iter_mut() {
        *x /= norm;
    }
    Some(())
}

fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let var = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / values.len() as f64;
    var.sqrt()
}
