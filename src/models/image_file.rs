use std::path::{Path, PathBuf};

/// A discovered image on disk
///
/// Only valid until the renamer moves it; after a run the path is stale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    /// Absolute or folder-relative path as discovered
    pub path: PathBuf,
    /// File name including extension
    pub name: String,
    /// File size in bytes
    pub size: u64,
}

impl ImageFile {
    /// Create an ImageFile from a path
    ///
    /// Uses `symlink_metadata`, so a symlink reports its own size.
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let metadata = std::fs::symlink_metadata(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        Ok(Self {
            path: path.to_path_buf(),
            name,
            size: metadata.len(),
        })
    }
}
