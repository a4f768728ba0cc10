use crate::config::SortConfig;
use crate::models::FeatureVector;
use fastembed::{ImageEmbedding, ImageEmbeddingModel, ImageInitOptions};

use super::loader::PreparedImage;

/// Maps a prepared image to a fixed-length feature vector
///
/// Implementations must be deterministic for the lifetime of the process:
/// the same image always yields the same vector, and every vector has the
/// same length.
pub trait FeatureExtractor {
    /// Short name for logging
    fn name(&self) -> &str;

    /// Extract features from one image
    fn extract(&self, image: &PreparedImage) -> Result<FeatureVector, String>;
}

/// ResNet50 (ImageNet weights, average pooled) via fastembed
///
/// Note: This downloads the model on first use (~100MB)
pub struct ResnetExtractor {
    model: ImageEmbedding,
}

impl ResnetExtractor {
    pub fn new(config: &SortConfig) -> Result<Self, String> {
        let mut options = ImageInitOptions::new(ImageEmbeddingModel::Resnet50)
            .with_show_download_progress(config.show_download_progress);

        if let Some(dir) = &config.model_cache_dir {
            options = options.with_cache_dir(dir.clone());
        }

        let model = ImageEmbedding::try_new(options)
            .map_err(|e| format!("Failed to load ResNet50: {}", e))?;

        Ok(Self { model })
    }
}

impl FeatureExtractor for ResnetExtractor {
    fn name(&self) -> &str {
        "resnet50"
    }

    /// fastembed applies the model's own resize and ImageNet normalisation
    /// to the encoded bytes, so the input matches what the weights expect.
    fn extract(&self, image: &PreparedImage) -> Result<FeatureVector, String> {
        let bytes = image
            .to_png_bytes()
            .map_err(|e| format!("Failed to encode image: {}", e))?;

        let mut embeddings = self
            .model
            .embed_bytes(&[bytes.as_slice()], Some(1))
            .map_err(|e| format!("Model inference failed: {}", e))?;

        embeddings
            .pop()
            .map(FeatureVector::new)
            .ok_or_else(|| "Model returned no embedding".to_string())
    }
}

/// Mean colour of the image, three values
#[cfg(test)]
pub(crate) struct MeanColorExtractor;

#[cfg(test)]
impl FeatureExtractor for MeanColorExtractor {
    fn name(&self) -> &str {
        "mean-color"
    }

    fn extract(&self, image: &PreparedImage) -> Result<FeatureVector, String> {
        Ok(FeatureVector::new(image.mean_rgb().to_vec()))
    }
}
