use super::cosine_similarity;
use crate::models::{FeatureVector, OrderedIndexList};

/// Symmetric N x N cosine similarity matrix with a unit diagonal
#[derive(Debug, Clone)]
pub struct SimilarityMatrix {
    size: usize,
    values: Vec<f32>,
}

impl SimilarityMatrix {
    /// Compute all pairwise similarities
    ///
    /// Only the upper triangle is computed; the lower one is mirrored.
    pub fn compute(features: &[FeatureVector]) -> Self {
        let size = features.len();
        let mut values = vec![0.0f32; size * size];

        for i in 0..size {
            values[i * size + i] = 1.0;
            for j in (i + 1)..size {
                let sim = cosine_similarity(features[i].as_slice(), features[j].as_slice());
                values[i * size + j] = sim;
                values[j * size + i] = sim;
            }
        }

        Self { size, values }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn get(&self, i: usize, j: usize) -> f32 {
        self.values[i * self.size + j]
    }

    /// Most similar distinct pair, if there are at least two images
    pub fn most_similar_pair(&self) -> Option<(usize, usize, f32)> {
        let mut best: Option<(usize, usize, f32)> = None;
        for i in 0..self.size {
            for j in (i + 1)..self.size {
                let sim = self.get(i, j);
                if best.map_or(true, |(_, _, b)| sim > b) {
                    best = Some((i, j, sim));
                }
            }
        }
        best
    }

    /// Mean similarity over all distinct pairs (1.0 for a single image)
    pub fn mean_off_diagonal(&self) -> f32 {
        if self.size < 2 {
            return 1.0;
        }
        let mut total = 0.0f64;
        for i in 0..self.size {
            for j in (i + 1)..self.size {
                total += self.get(i, j) as f64;
            }
        }
        let pairs = (self.size * (self.size - 1) / 2) as f64;
        (total / pairs) as f32
    }

    /// Mean similarity between images that end up next to each other
    ///
    /// A good visual order scores higher than `mean_off_diagonal`.
    pub fn neighbour_score(&self, order: &OrderedIndexList) -> f32 {
        let ranks = order.as_slice();
        if ranks.len() < 2 {
            return 1.0;
        }
        let total: f64 = ranks
            .windows(2)
            .map(|w| self.get(w[0], w[1]) as f64)
            .sum();
        (total / (ranks.len() - 1) as f64) as f32
    }
}
