//! Ordering engine
//!
//! Turns N feature vectors into a total visual order: pairwise cosine
//! similarity for diagnostics, a seeded 1-D t-SNE as the sort key, then an
//! ascending sort with ties broken by discovery order.

pub mod tsne;

use crate::config::EmbeddingParams;
use crate::error::OrderError;
use crate::models::{FeatureVector, OrderedIndexList};
use crate::vector::SimilarityMatrix;

/// Result of ordering a feature set
#[derive(Debug, Clone)]
pub struct VisualOrder {
    /// Rank -> image index
    pub order: OrderedIndexList,
    /// Pairwise cosine similarities
    pub similarity: SimilarityMatrix,
}

impl VisualOrder {
    /// Mean similarity between images placed next to each other
    pub fn neighbour_similarity(&self) -> f32 {
        self.similarity.neighbour_score(&self.order)
    }
}

/// Computes visual orders with fixed embedding parameters
#[derive(Debug, Clone)]
pub struct OrderingEngine {
    params: EmbeddingParams,
}

impl OrderingEngine {
    pub fn new(params: EmbeddingParams) -> Self {
        Self { params }
    }

    /// Order the images so that similar ones are adjacent
    ///
    /// With one or two images there is nothing to embed and discovery order
    /// is returned.
    pub fn order(&self, features: &[FeatureVector]) -> Result<VisualOrder, OrderError> {
        let expected = features.first().ok_or(OrderError::Empty)?.len();
        if let Some((index, found)) = features
            .iter()
            .map(|f| f.len())
            .enumerate()
            .find(|(_, len)| *len != expected)
        {
            return Err(OrderError::DimensionMismatch {
                index,
                expected,
                found,
            });
        }

        let similarity = SimilarityMatrix::compute(features);

        let coordinates = if features.len() <= 2 {
            (0..features.len()).map(|i| i as f64).collect()
        } else {
            tsne::embed_1d(features, &self.params)
        };

        let order = OrderedIndexList::by_ascending_key(&coordinates);

        Ok(VisualOrder { order, similarity })
    }
}

impl Default for OrderingEngine {
    fn default() -> Self {
        Self::new(EmbeddingParams::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fv(values: &[f32]) -> FeatureVector {
        FeatureVector::new(values.to_vec())
    }

    fn assert_bijection(order: &OrderedIndexList, n: usize) {
        assert_eq!(order.len(), n);
        let mut sorted = order.as_slice().to_vec();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..n).collect::<Vec<_>>());
    }

    #[test]
    fn test_empty_is_rejected() {
        let engine = OrderingEngine::default();
        assert_eq!(engine.order(&[]).unwrap_err(), OrderError::Empty);
    }

    #[test]
    fn test_dimension_mismatch() {
        let engine = OrderingEngine::default();
        let err = engine
            .order(&[fv(&[1.0, 2.0]), fv(&[1.0, 2.0]), fv(&[1.0])])
            .unwrap_err();
        assert_eq!(
            err,
            OrderError::DimensionMismatch {
                index: 2,
                expected: 2,
                found: 1
            }
        );
    }

    #[test]
    fn test_single_image() {
        let result = OrderingEngine::default().order(&[fv(&[0.3, 0.1])]).unwrap();
        assert_eq!(result.order.as_slice(), &[0]);
        assert_eq!(result.similarity.size(), 1);
    }

    #[test]
    fn test_two_images_keep_discovery_order() {
        let result = OrderingEngine::default()
            .order(&[fv(&[1.0, 0.0]), fv(&[0.0, 1.0])])
            .unwrap();
        assert_eq!(result.order.as_slice(), &[0, 1]);
    }

    #[test]
    fn test_order_is_bijection_and_deterministic() {
        let features: Vec<FeatureVector> = (0..9)
            .map(|i| fv(&[(i % 3) as f32, (i * i % 7) as f32, 1.0 + i as f32 * 0.1]))
            .collect();
        let engine = OrderingEngine::default();

        let first = engine.order(&features).unwrap();
        let second = engine.order(&features).unwrap();

        assert_bijection(&first.order, 9);
        assert_eq!(first.order, second.order);
    }

    #[test]
    fn test_similar_images_become_neighbours() {
        // Two colour families, interleaved in discovery order
        let mut features = Vec::new();
        for k in 0..5 {
            let jitter = k as f32 * 0.01;
            features.push(fv(&[1.0, jitter, 0.1]));
            features.push(fv(&[jitter, 0.1, 1.0]));
        }

        let result = OrderingEngine::default().order(&features).unwrap();
        assert_bijection(&result.order, 10);

        let family: Vec<usize> = result.order.iter().map(|i| i % 2).collect();
        let switches = family.windows(2).filter(|w| w[0] != w[1]).count();
        assert_eq!(switches, 1, "families should form contiguous runs: {:?}", family);
        assert!(result.neighbour_similarity() > result.similarity.mean_off_diagonal());
    }
}
