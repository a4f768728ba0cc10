//! Filesystem helpers for the rename phases
//!
//! Renames here never overwrite, and directory entries can be fsynced so a
//! finished phase survives a crash.

use std::fs;
use std::io;
use std::path::Path;

/// Check whether anything (file, directory or dangling symlink) exists at `path`
pub fn path_occupied(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

/// Rename `from` to `to`, refusing to replace an existing entry
///
/// `fs::rename` silently replaces the target on Unix; this checks first.
/// The check and the rename are not atomic together, which is acceptable
/// for a single-threaded batch run over a folder nobody else is editing.
pub fn rename_no_clobber(from: &Path, to: &Path) -> io::Result<()> {
    if path_occupied(to) {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("Target already exists: {}", to.display()),
        ));
    }
    fs::rename(from, to)
}

/// Check whether `a` and `b` name the same directory entry
///
/// Besides identical paths this covers case variants of one name on a
/// case-insensitive filesystem: same directory, names equal ignoring ASCII
/// case, and the same underlying file.
pub fn same_entry(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    let names_match = match (a.file_name(), b.file_name()) {
        (Some(x), Some(y)) => x.eq_ignore_ascii_case(y),
        _ => false,
    };
    names_match && a.parent() == b.parent() && same_file(a, b)
}

#[cfg(unix)]
fn same_file(a: &Path, b: &Path) -> bool {
    use std::os::unix::fs::MetadataExt;

    match (fs::symlink_metadata(a), fs::symlink_metadata(b)) {
        (Ok(x), Ok(y)) => x.dev() == y.dev() && x.ino() == y.ino(),
        _ => false,
    }
}

// NTFS directories are case-insensitive unless configured otherwise
#[cfg(not(unix))]
fn same_file(a: &Path, b: &Path) -> bool {
    path_occupied(a) && path_occupied(b)
}

/// Sync a directory so completed renames are durable
///
/// On POSIX systems this opens the directory and calls fsync. Elsewhere it
/// is a no-op.
pub fn sync_directory(path: &Path) -> io::Result<()> {
    #[cfg(unix)]
    {
        use std::fs::OpenOptions;
        use std::os::unix::fs::OpenOptionsExt;

        let dir = OpenOptions::new()
            .read(true)
            .custom_flags(libc::O_DIRECTORY)
            .open(path)?;
        dir.sync_all()?;
    }

    // The rename itself is atomic on NTFS
    #[cfg(not(unix))]
    {
        let _ = path;
    }

    Ok(())
}
