//! Image discovery
//!
//! Walks the target folder recursively and classifies every regular file by
//! extension. Read-only: nothing on disk is touched here.

use crate::config::SortConfig;
use crate::models::ImageFile;
use std::path::Path;
use walkdir::WalkDir;

/// Result of scanning a folder
#[derive(Debug, Clone, Default)]
pub struct ScanResult {
    /// Supported images in discovery order
    pub images: Vec<ImageFile>,
    /// Regular files skipped because of their extension
    pub ignored_files: usize,
    /// Total size of the supported images in bytes
    pub total_size_bytes: u64,
}

impl ScanResult {
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

/// Scan a folder for supported images
///
/// Entries are visited sorted by file name so repeated runs see the same
/// discovery order. Symlinks are not followed and not reported.
pub fn scan_folder(folder: &Path, config: &SortConfig) -> ScanResult {
    let mut result = ScanResult::default();

    for entry in WalkDir::new(folder)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| match e {
            Ok(entry) => Some(entry),
            Err(err) => {
                tracing::warn!("Skipping unreadable entry: {}", err);
                None
            }
        })
    {
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let supported = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|ext| config.is_supported_extension(ext))
            .unwrap_or(false);

        if !supported {
            result.ignored_files += 1;
            continue;
        }

        match ImageFile::from_path(path) {
            Ok(image) => {
                result.total_size_bytes += image.size;
                result.images.push(image);
            }
            Err(err) => {
                tracing::warn!(path = %path.display(), "Failed to read metadata: {}", err);
            }
        }
    }

    result
}
