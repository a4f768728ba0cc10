//! Error types
//!
//! Per-file load failures are recoverable and collected by the driver.
//! Everything else stops the run.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::rename::RenameReport;

/// Failure to turn one image file into a feature vector
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Failed to open {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to decode {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Feature extraction failed for {}: {message}", path.display())]
    Extract { path: PathBuf, message: String },
}

impl LoadError {
    /// The file this error refers to
    pub fn path(&self) -> &PathBuf {
        match self {
            LoadError::Io { path, .. }
            | LoadError::Decode { path, .. }
            | LoadError::Extract { path, .. } => path,
        }
    }
}

/// Invalid input to the ordering engine
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OrderError {
    #[error("Cannot order an empty feature set")]
    Empty,

    #[error("Feature vector {index} has length {found}, expected {expected}")]
    DimensionMismatch {
        index: usize,
        expected: usize,
        found: usize,
    },
}

/// Failure while planning or executing the two-phase rename
///
/// `Stage` and `Commit` carry a report of where every file currently is, so
/// the user can resolve a partially applied run by hand.
#[derive(Debug, Error)]
pub enum RenameError {
    #[error("Target {} already exists and is not part of this run", target.display())]
    Conflict { target: PathBuf },

    #[error("Order covers {order} images but {paths} paths were given")]
    OrderMismatch { paths: usize, order: usize },

    #[error("File has no extension: {}", path.display())]
    MissingExtension { path: PathBuf },

    #[error("Staging {} failed: {source}", path.display())]
    Stage {
        path: PathBuf,
        #[source]
        source: io::Error,
        report: Box<RenameReport>,
    },

    #[error("Renaming {} to {} failed: {source}", from.display(), to.display())]
    Commit {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
        report: Box<RenameReport>,
    },
}

impl RenameError {
    /// Location report for failures that happened after mutation started
    pub fn report(&self) -> Option<&RenameReport> {
        match self {
            RenameError::Stage { report, .. } | RenameError::Commit { report, .. } => {
                Some(&**report)
            }
            _ => None,
        }
    }
}

/// Fatal errors for a whole run
#[derive(Debug, Error)]
pub enum SortError {
    #[error("Not a directory: {}", .0.display())]
    InvalidFolder(PathBuf),

    #[error("No images found in {}", .0.display())]
    NoImages(PathBuf),

    #[error("None of the {0} discovered images could be processed")]
    AllFailed(usize),

    #[error("Failed to initialize feature extractor: {0}")]
    Model(String),

    #[error(transparent)]
    Order(#[from] OrderError),

    #[error(transparent)]
    Rename(#[from] RenameError),
}
