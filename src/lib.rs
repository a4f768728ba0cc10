//! Visual similarity sorting
//!
//! Reorders a folder of images so that visually similar images sit next to
//! each other, then renames them in place to `0001.ext`, `0002.ext`, ...
//!
//! ## Modules
//! - `discovery` - Recursive scan for supported image files
//! - `vision` - Image loading and feature extraction
//! - `vector` - Cosine similarity and the pairwise similarity matrix
//! - `ordering` - 1-D embedding and the final visual order
//! - `rename` - Two-phase, collision-free in-place renaming
//! - `pipeline` - The driver tying the steps together

pub mod config;
pub mod discovery;
pub mod error;
pub mod models;
pub mod ordering;
pub mod pipeline;
pub mod rename;
pub mod vector;
pub mod vision;

pub use config::{EmbeddingParams, SortConfig};
pub use error::{LoadError, OrderError, RenameError, SortError};
pub use models::{FeatureVector, ImageFile, OrderedIndexList};
pub use pipeline::{ImageSorter, SortOutcome, SortPhase, SortProgress};
pub use vision::{FeatureExtractor, PreparedImage, ResnetExtractor};
