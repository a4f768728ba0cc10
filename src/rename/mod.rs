//! Two-phase in-place renamer
//!
//! Renaming N files to `0001.ext..000N.ext` is unsafe in a single pass when
//! the old and new names overlap (e.g. `0003.jpg` exists and is also a
//! target). The renamer therefore runs two ordered phases:
//!
//! 1. **Stage**: every original moves to a unique `temp_<uuid><ext>` name in
//!    its own directory, fully separating the two namespaces.
//! 2. **Commit**: the staged file at each rank moves to its canonical name.
//!
//! The phases are encoded as types: `RenamePlan::stage` consumes the plan
//! and yields a `StagedRename`, which is the only thing that can commit.
//! A failure in either phase stops immediately and reports where every file
//! is. Nothing is rolled back.

pub mod io;

use crate::error::RenameError;
use crate::models::OrderedIndexList;
use std::collections::{BTreeSet, HashSet};
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use self::io::{path_occupied, rename_no_clobber, same_entry, sync_directory};

/// Where a file of the plan currently lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileLocation {
    /// Still under its original name
    Original(PathBuf),
    /// Under its temporary staging name
    Staged(PathBuf),
    /// Under its final canonical name
    Canonical(PathBuf),
}

impl FileLocation {
    pub fn path(&self) -> &Path {
        match self {
            FileLocation::Original(p) | FileLocation::Staged(p) | FileLocation::Canonical(p) => p,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            FileLocation::Original(_) => "original",
            FileLocation::Staged(_) => "staged",
            FileLocation::Canonical(_) => "renamed",
        }
    }
}

/// State of one file when a rename phase was interrupted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileState {
    pub original: PathBuf,
    pub location: FileLocation,
}

/// Location of every file in a plan, in discovery order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenameReport {
    pub files: Vec<FileState>,
}

impl RenameReport {
    pub fn original_count(&self) -> usize {
        self.count(|l| matches!(l, FileLocation::Original(_)))
    }

    pub fn staged_count(&self) -> usize {
        self.count(|l| matches!(l, FileLocation::Staged(_)))
    }

    pub fn canonical_count(&self) -> usize {
        self.count(|l| matches!(l, FileLocation::Canonical(_)))
    }

    fn count(&self, pred: impl Fn(&FileLocation) -> bool) -> usize {
        self.files.iter().filter(|f| pred(&f.location)).count()
    }
}

impl fmt::Display for RenameReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} original, {} staged, {} renamed",
            self.original_count(),
            self.staged_count(),
            self.canonical_count()
        )?;
        for state in &self.files {
            writeln!(
                f,
                "  [{}] {} -> {}",
                state.location.label(),
                state.original.display(),
                state.location.path().display()
            )?;
        }
        Ok(())
    }
}

/// Names assigned to one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedRename {
    pub original: PathBuf,
    pub staged: PathBuf,
    pub canonical: PathBuf,
}

/// A completed rename
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameRecord {
    /// 0-based position in the visual order
    pub rank: usize,
    pub original: PathBuf,
    pub final_path: PathBuf,
}

/// Validated, not yet executed rename plan
#[derive(Debug, Clone)]
pub struct RenamePlan {
    /// Indexed like the input paths (discovery order)
    entries: Vec<PlannedRename>,
    /// Rank -> entry index
    ranks: Vec<usize>,
}

impl RenamePlan {
    /// Assign staging and canonical names
    ///
    /// Rank `i` becomes `{i+1:04}.{ext}` next to its original, extension case
    /// preserved. Rejects the plan without touching the disk if a canonical
    /// name is already taken by a file that is not part of the run.
    pub fn build(paths: &[PathBuf], order: &OrderedIndexList) -> Result<Self, RenameError> {
        if paths.len() != order.len() {
            return Err(RenameError::OrderMismatch {
                paths: paths.len(),
                order: order.len(),
            });
        }

        let mut entries: Vec<Option<PlannedRename>> = vec![None; paths.len()];
        for (rank, index) in order.iter().enumerate() {
            let original = &paths[index];
            let ext = original
                .extension()
                .ok_or_else(|| RenameError::MissingExtension {
                    path: original.clone(),
                })?;
            let dir = original.parent().unwrap_or_else(|| Path::new(""));

            let mut canonical_name = OsString::from(format!("{:04}.", rank + 1));
            canonical_name.push(ext);
            let mut staged_name = OsString::from(format!("temp_{}.", Uuid::new_v4().simple()));
            staged_name.push(ext);

            entries[index] = Some(PlannedRename {
                original: original.clone(),
                staged: dir.join(staged_name),
                canonical: dir.join(canonical_name),
            });
        }

        // `order` is a permutation of 0..len, so every slot is filled
        let entries: Vec<PlannedRename> = entries.into_iter().flatten().collect();

        let originals: HashSet<&PathBuf> = entries.iter().map(|e| &e.original).collect();
        let held_by_run = |target: &Path| {
            originals.contains(&target.to_path_buf())
                || entries.iter().any(|e| same_entry(&e.original, target))
        };
        if let Some(taken) = entries
            .iter()
            .find(|e| path_occupied(&e.canonical) && !held_by_run(&e.canonical))
        {
            return Err(RenameError::Conflict {
                target: taken.canonical.clone(),
            });
        }

        Ok(Self {
            entries,
            ranks: order.as_slice().to_vec(),
        })
    }

    /// Run the stage phase
    ///
    /// On failure the error report lists which files were staged and which
    /// still carry their original names.
    pub fn stage(self) -> Result<StagedRename, RenameError> {
        let mut locations: Vec<FileLocation> = self
            .entries
            .iter()
            .map(|e| FileLocation::Original(e.original.clone()))
            .collect();

        for (index, entry) in self.entries.iter().enumerate() {
            if let Err(source) = rename_no_clobber(&entry.original, &entry.staged) {
                return Err(RenameError::Stage {
                    path: entry.original.clone(),
                    source,
                    report: Box::new(self.report(&locations)),
                });
            }
            tracing::debug!(
                from = %entry.original.display(),
                to = %entry.staged.display(),
                "Staged"
            );
            locations[index] = FileLocation::Staged(entry.staged.clone());
        }

        self.sync_directories();
        Ok(StagedRename {
            plan: self,
            locations,
        })
    }

    fn report(&self, locations: &[FileLocation]) -> RenameReport {
        RenameReport {
            files: self
                .entries
                .iter()
                .zip(locations.iter())
                .map(|(e, l)| FileState {
                    original: e.original.clone(),
                    location: l.clone(),
                })
                .collect(),
        }
    }

    fn sync_directories(&self) {
        let dirs: BTreeSet<&Path> = self
            .entries
            .iter()
            .filter_map(|e| e.canonical.parent())
            .collect();
        for dir in dirs {
            if let Err(e) = sync_directory(dir) {
                tracing::warn!(path = %dir.display(), "Failed to sync directory: {}", e);
            }
        }
    }
}

/// Every file of the plan sits under its staging name
#[derive(Debug)]
pub struct StagedRename {
    plan: RenamePlan,
    locations: Vec<FileLocation>,
}

impl StagedRename {
    /// Temporary paths in discovery order
    pub fn staged_paths(&self) -> Vec<PathBuf> {
        self.plan.entries.iter().map(|e| e.staged.clone()).collect()
    }

    /// Run the commit phase, rank by rank
    pub fn commit(mut self) -> Result<Vec<RenameRecord>, RenameError> {
        let mut records = Vec::with_capacity(self.plan.entries.len());

        for (rank, &index) in self.plan.ranks.iter().enumerate() {
            let entry = &self.plan.entries[index];

            if let Err(source) = rename_no_clobber(&entry.staged, &entry.canonical) {
                return Err(RenameError::Commit {
                    from: entry.staged.clone(),
                    to: entry.canonical.clone(),
                    source,
                    report: Box::new(self.plan.report(&self.locations)),
                });
            }

            tracing::info!(
                "Renamed: {} -> {}",
                display_name(&entry.original),
                display_name(&entry.canonical)
            );
            self.locations[index] = FileLocation::Canonical(entry.canonical.clone());
            records.push(RenameRecord {
                rank,
                original: entry.original.clone(),
                final_path: entry.canonical.clone(),
            });
        }

        self.plan.sync_directories();
        Ok(records)
    }
}

/// Stage and commit in one call, returning final paths in rank order
pub fn rename_in_order(
    paths: &[PathBuf],
    order: &OrderedIndexList,
) -> Result<Vec<PathBuf>, RenameError> {
    let records = RenamePlan::build(paths, order)?.stage()?.commit()?;
    Ok(records.into_iter().map(|r| r.final_path).collect())
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn write_files(dir: &Path, files: &[(&str, &str)]) -> Vec<PathBuf> {
        files
            .iter()
            .map(|(name, content)| {
                let path = dir.join(name);
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent).unwrap();
                }
                fs::write(&path, content).unwrap();
                path
            })
            .collect()
    }

    fn order(indices: &[usize]) -> OrderedIndexList {
        OrderedIndexList::from_permutation(indices.to_vec()).unwrap()
    }

    fn listing(dir: &Path) -> Vec<(String, String)> {
        let mut files: Vec<(String, String)> = fs::read_dir(dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().unwrap().is_file())
            .map(|e| {
                (
                    e.file_name().to_string_lossy().to_string(),
                    fs::read_to_string(e.path()).unwrap(),
                )
            })
            .collect();
        files.sort();
        files
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_case_variant_of_another_file_is_still_a_conflict() {
        let dir = tempdir().unwrap();
        // Two files on a case-sensitive volume, only one of them in the run
        write_files(dir.path(), &[("0001.jpg", "not part of the run")]);
        let paths = write_files(dir.path(), &[("0001.JPG", "in the run"), ("b.jpg", "B")]);

        let err = RenamePlan::build(&paths, &order(&[1, 0])).unwrap_err();

        assert!(matches!(
            err,
            RenameError::Conflict { ref target } if *target == dir.path().join("0001.jpg")
        ));
    }

    #[test]
    fn test_renumbers_across_extensions() {
        let dir = tempdir().unwrap();
        let paths = write_files(dir.path(), &[("a.png", "A"), ("b.jpg", "B"), ("c.jpg", "C")]);

        let finals = rename_in_order(&paths, &order(&[1, 2, 0])).unwrap();

        assert_eq!(
            finals,
            vec![
                dir.path().join("0001.jpg"),
                dir.path().join("0002.jpg"),
                dir.path().join("0003.png"),
            ]
        );
        assert_eq!(
            listing(dir.path()),
            vec![
                ("0001.jpg".to_string(), "B".to_string()),
                ("0002.jpg".to_string(), "C".to_string()),
                ("0003.png".to_string(), "A".to_string()),
            ]
        );
    }

    #[test]
    fn test_overlapping_names_are_not_lost() {
        let dir = tempdir().unwrap();
        // 0001.jpg exists but ends up last
        let paths = write_files(
            dir.path(),
            &[("0001.jpg", "first"), ("0002.jpg", "second"), ("x.jpg", "third")],
        );

        rename_in_order(&paths, &order(&[2, 1, 0])).unwrap();

        assert_eq!(
            listing(dir.path()),
            vec![
                ("0001.jpg".to_string(), "third".to_string()),
                ("0002.jpg".to_string(), "second".to_string()),
                ("0003.jpg".to_string(), "first".to_string()),
            ]
        );
    }

    #[test]
    fn test_all_files_staged_before_commit() {
        let dir = tempdir().unwrap();
        let paths = write_files(
            dir.path(),
            &[("0001.jpg", "1"), ("0002.jpg", "2"), ("0003.jpg", "3")],
        );

        let staged = RenamePlan::build(&paths, &order(&[2, 0, 1]))
            .unwrap()
            .stage()
            .unwrap();

        for original in &paths {
            assert!(!original.exists(), "{} should be staged", original.display());
        }
        let temps = staged.staged_paths();
        let unique: HashSet<&PathBuf> = temps.iter().collect();
        assert_eq!(unique.len(), 3);
        for temp in &temps {
            assert!(temp.exists());
            let name = temp.file_name().unwrap().to_string_lossy().to_string();
            assert!(name.starts_with("temp_") && name.ends_with(".jpg"));
        }

        staged.commit().unwrap();
        assert_eq!(
            listing(dir.path()),
            vec![
                ("0001.jpg".to_string(), "3".to_string()),
                ("0002.jpg".to_string(), "1".to_string()),
                ("0003.jpg".to_string(), "2".to_string()),
            ]
        );
    }

    #[test]
    fn test_canonical_names_already_in_order_are_stable() {
        let dir = tempdir().unwrap();
        let paths = write_files(dir.path(), &[("0001.jpg", "a"), ("0002.jpg", "b")]);
        let before = listing(dir.path());

        let finals = rename_in_order(&paths, &OrderedIndexList::identity(2)).unwrap();

        assert_eq!(finals, paths);
        assert_eq!(listing(dir.path()), before);
    }

    #[test]
    fn test_extension_case_is_preserved() {
        let dir = tempdir().unwrap();
        let paths = write_files(dir.path(), &[("Photo.JPG", "p"), ("shot.Png", "s")]);

        let finals = rename_in_order(&paths, &order(&[1, 0])).unwrap();

        assert_eq!(
            finals,
            vec![dir.path().join("0001.Png"), dir.path().join("0002.JPG")]
        );
    }

    #[test]
    fn test_subdirectories_share_numbering() {
        let dir = tempdir().unwrap();
        let paths = write_files(
            dir.path(),
            &[("top.jpg", "t"), ("nested/inner.jpg", "i"), ("nested/other.png", "o")],
        );

        let finals = rename_in_order(&paths, &order(&[1, 0, 2])).unwrap();

        assert_eq!(
            finals,
            vec![
                dir.path().join("nested").join("0001.jpg"),
                dir.path().join("0002.jpg"),
                dir.path().join("nested").join("0003.png"),
            ]
        );
        assert_eq!(fs::read_to_string(&finals[0]).unwrap(), "i");
    }

    #[test]
    fn test_conflict_with_unrelated_file_is_rejected_up_front() {
        let dir = tempdir().unwrap();
        // 0001.jpg is on disk but not part of the run (e.g. failed to decode)
        write_files(dir.path(), &[("0001.jpg", "corrupt")]);
        let paths = write_files(dir.path(), &[("b.jpg", "B")]);
        let before = listing(dir.path());

        let err = RenamePlan::build(&paths, &OrderedIndexList::identity(1)).unwrap_err();

        assert!(matches!(
            err,
            RenameError::Conflict { ref target } if *target == dir.path().join("0001.jpg")
        ));
        assert_eq!(listing(dir.path()), before);
    }

    #[test]
    fn test_order_length_mismatch() {
        let dir = tempdir().unwrap();
        let paths = write_files(dir.path(), &[("a.jpg", "a"), ("b.jpg", "b")]);

        let err = RenamePlan::build(&paths, &OrderedIndexList::identity(1)).unwrap_err();
        assert!(matches!(err, RenameError::OrderMismatch { paths: 2, order: 1 }));
    }

    #[test]
    fn test_stage_failure_reports_partial_state() {
        let dir = tempdir().unwrap();
        let paths = write_files(dir.path(), &[("a.jpg", "a"), ("b.jpg", "b"), ("c.jpg", "c")]);
        let plan = RenamePlan::build(&paths, &order(&[2, 1, 0])).unwrap();

        // b.jpg disappears between planning and staging
        fs::remove_file(&paths[1]).unwrap();

        let err = plan.stage().unwrap_err();
        let report = err.report().unwrap();

        assert!(matches!(err, RenameError::Stage { ref path, .. } if *path == paths[1]));
        assert_eq!(report.staged_count(), 1);
        assert_eq!(report.original_count(), 2);
        assert!(matches!(report.files[0].location, FileLocation::Staged(_)));
        assert_eq!(report.files[2].location, FileLocation::Original(paths[2].clone()));
        // Staged file is left under its temp name, not rolled back
        assert!(report.files[0].location.path().exists());
        assert!(paths[2].exists());
    }

    #[test]
    fn test_commit_refuses_to_overwrite() {
        let dir = tempdir().unwrap();
        let paths = write_files(dir.path(), &[("a.jpg", "a"), ("b.jpg", "b"), ("c.jpg", "c")]);
        let staged = RenamePlan::build(&paths, &OrderedIndexList::identity(3))
            .unwrap()
            .stage()
            .unwrap();

        // Someone drops a file onto a target name mid-run
        let intruder = dir.path().join("0002.jpg");
        fs::write(&intruder, "intruder").unwrap();

        let err = staged.commit().unwrap_err();
        let report = err.report().unwrap();

        match &err {
            RenameError::Commit { to, source, .. } => {
                assert_eq!(to, &intruder);
                assert_eq!(source.kind(), std::io::ErrorKind::AlreadyExists);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(report.canonical_count(), 1);
        assert_eq!(report.staged_count(), 2);
        assert_eq!(fs::read_to_string(&intruder).unwrap(), "intruder");
        assert_eq!(fs::read_to_string(dir.path().join("0001.jpg")).unwrap(), "a");

        let text = report.to_string();
        assert!(text.starts_with("0 original, 2 staged, 1 renamed"));
    }
}
