//! Run configuration
//!
//! The tool exposes no flags: every value here has a fixed default. The only
//! external input is the model cache location, read from the environment.

use std::path::PathBuf;

/// Environment variable overriding the model cache directory
pub const MODEL_CACHE_ENV: &str = "SIMSORT_MODEL_CACHE";

/// Configuration for a sorting run
#[derive(Debug, Clone)]
pub struct SortConfig {
    /// Images are resized to `target_size` x `target_size` before extraction
    pub target_size: u32,
    /// Supported extensions, lowercase, without the dot
    pub extensions: Vec<String>,
    /// Parameters for the 1-D embedding
    pub embedding: EmbeddingParams,
    /// Where the embedding model is cached (None = fastembed default)
    pub model_cache_dir: Option<PathBuf>,
    /// Show a progress bar while the model downloads
    pub show_download_progress: bool,
}

impl Default for SortConfig {
    fn default() -> Self {
        Self {
            target_size: 224,
            extensions: vec!["jpg".to_string(), "jpeg".to_string(), "png".to_string()],
            embedding: EmbeddingParams::default(),
            model_cache_dir: None,
            show_download_progress: true,
        }
    }
}

impl SortConfig {
    /// Defaults plus the model cache directory from the environment
    ///
    /// Falls back to `<platform cache dir>/simsort/models`.
    pub fn from_env() -> Self {
        let model_cache_dir = std::env::var_os(MODEL_CACHE_ENV)
            .map(PathBuf::from)
            .or_else(|| dirs::cache_dir().map(|d| d.join("simsort").join("models")));

        Self {
            model_cache_dir,
            ..Default::default()
        }
    }

    /// Check whether an extension (without dot, any case) is supported
    pub fn is_supported_extension(&self, ext: &str) -> bool {
        self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext))
    }
}

/// Parameters for the seeded t-SNE that produces the sort key
///
/// The seed is part of the run configuration and is handed to the ordering
/// engine explicitly, so identical feature sets always give identical orders.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingParams {
    pub seed: u64,
    pub perplexity: f64,
    pub iterations: usize,
    /// Attraction multiplier for the first `exaggeration_iterations` steps.
    /// 1.0 disables it: on folder-sized inputs a larger factor contracts the
    /// whole layout onto one point before the repulsion can act.
    pub early_exaggeration: f64,
    /// Length of the early phase (momentum 0.5, then 0.8)
    pub exaggeration_iterations: usize,
}

impl Default for EmbeddingParams {
    fn default() -> Self {
        Self {
            seed: 42,
            perplexity: 30.0,
            iterations: 1000,
            early_exaggeration: 1.0,
            exaggeration_iterations: 250,
        }
    }
}
