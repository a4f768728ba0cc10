/// Fixed-length visual summary of one image
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector(Vec<f32>);

impl FeatureVector {
    pub fn new(values: Vec<f32>) -> Self {
        Self(values)
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Final visual order: position `rank` holds the index of the image placed there
///
/// Always a permutation of `0..len`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderedIndexList(Vec<usize>);

impl OrderedIndexList {
    /// Wrap a permutation, returning None if it is not a bijection on `0..len`
    pub fn from_permutation(indices: Vec<usize>) -> Option<Self> {
        let mut seen = vec![false; indices.len()];
        for &idx in &indices {
            if idx >= seen.len() || seen[idx] {
                return None;
            }
            seen[idx] = true;
        }
        Some(Self(indices))
    }

    /// Discovery order
    pub fn identity(len: usize) -> Self {
        Self((0..len).collect())
    }

    /// Ascending order of `keys`, ties broken by original index
    pub fn by_ascending_key(keys: &[f64]) -> Self {
        let mut indices: Vec<usize> = (0..keys.len()).collect();
        indices.sort_by(|&a, &b| keys[a].total_cmp(&keys[b]).then(a.cmp(&b)));
        Self(indices)
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.iter().copied()
    }
}
