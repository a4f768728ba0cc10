//! Image loading and feature extraction
//!
//! - `loader` - Decode, convert to RGB and resize to the model input size
//! - `extractor` - The `FeatureExtractor` seam and its ResNet50 implementation

pub mod extractor;
pub mod loader;

pub use extractor::{FeatureExtractor, ResnetExtractor};
pub use loader::{load_image, PreparedImage};

use crate::error::LoadError;
use crate::models::FeatureVector;
use std::path::Path;

/// Load one image and run it through the extractor
///
/// Any failure is reported as a `LoadError` for this file only.
pub fn extract_features<E: FeatureExtractor + ?Sized>(
    extractor: &E,
    path: &Path,
    target_size: u32,
) -> Result<FeatureVector, LoadError> {
    let prepared = load_image(path, target_size)?;
    tracing::debug!(
        path = %path.display(),
        "Prepared {}x{} input",
        prepared.width(),
        prepared.height()
    );

    extractor
        .extract(&prepared)
        .map_err(|message| LoadError::Extract {
            path: path.to_path_buf(),
            message,
        })
}
