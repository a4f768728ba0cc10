//! Sorting pipeline
//!
//! Discovery -> per-image load and extract -> ordering -> two-phase rename.
//! Per-image failures are collected and skipped; everything else is fatal.

use crate::config::SortConfig;
use crate::discovery::scan_folder;
use crate::error::{LoadError, SortError};
use crate::models::{FeatureVector, ImageFile};
use crate::ordering::OrderingEngine;
use crate::rename::{RenamePlan, RenameRecord};
use crate::vision::{extract_features, FeatureExtractor};
use std::path::{Path, PathBuf};

/// Pipeline phase reported to the progress callback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortPhase {
    Discovering,
    Extracting,
    Ordering,
    Staging,
    Committing,
    Done,
}

/// Progress update
#[derive(Debug, Clone)]
pub struct SortProgress {
    pub phase: SortPhase,
    pub current: usize,
    pub total: usize,
    pub current_file: Option<PathBuf>,
    pub message: String,
}

impl SortProgress {
    fn phase(phase: SortPhase, total: usize, message: impl Into<String>) -> Self {
        Self {
            phase,
            current: 0,
            total,
            current_file: None,
            message: message.into(),
        }
    }
}

/// Summary of a completed run
#[derive(Debug)]
pub struct SortOutcome {
    /// Number of supported files found
    pub discovered: usize,
    /// Files excluded because they could not be loaded
    pub skipped: Vec<LoadError>,
    /// Renames performed, in rank order
    pub records: Vec<RenameRecord>,
    /// Mean cosine similarity between rank neighbours
    pub neighbour_similarity: f32,
}

impl SortOutcome {
    /// Final paths in visual order
    pub fn final_paths(&self) -> Vec<PathBuf> {
        self.records.iter().map(|r| r.final_path.clone()).collect()
    }
}

/// Orders and renames the images of a folder
pub struct ImageSorter<E: FeatureExtractor> {
    extractor: E,
    config: SortConfig,
    engine: OrderingEngine,
}

impl<E: FeatureExtractor> ImageSorter<E> {
    pub fn new(extractor: E, config: SortConfig) -> Self {
        let engine = OrderingEngine::new(config.embedding.clone());
        Self {
            extractor,
            config,
            engine,
        }
    }

    /// Run the full pipeline on `folder`
    ///
    /// The filesystem is only modified once every image has been processed
    /// and the rename plan has been validated.
    pub fn sort_folder<F>(&self, folder: &Path, progress: F) -> Result<SortOutcome, SortError>
    where
        F: Fn(SortProgress),
    {
        if !folder.is_dir() {
            return Err(SortError::InvalidFolder(folder.to_path_buf()));
        }

        // 1. Discover
        progress(SortProgress::phase(
            SortPhase::Discovering,
            0,
            format!("Finding images in {}...", folder.display()),
        ));
        let scan = scan_folder(folder, &self.config);
        if scan.is_empty() {
            return Err(SortError::NoImages(folder.to_path_buf()));
        }
        let discovered = scan.images.len();
        tracing::info!(
            "Found {} images ({} bytes, {} other files ignored)",
            discovered,
            scan.total_size_bytes,
            scan.ignored_files
        );

        // 2. Load and extract, one image at a time
        let (valid, features, skipped) = self.extract_all(&scan.images, &progress);
        if valid.is_empty() {
            return Err(SortError::AllFailed(discovered));
        }
        tracing::info!(
            "Extracted features with {}: {} ok, {} skipped",
            self.extractor.name(),
            valid.len(),
            skipped.len()
        );

        // 3. Order
        progress(SortProgress::phase(
            SortPhase::Ordering,
            valid.len(),
            "Ordering images by visual similarity...",
        ));
        let visual = self.engine.order(&features)?;
        let neighbour_similarity = visual.neighbour_similarity();
        if let Some((i, j, sim)) = visual.similarity.most_similar_pair() {
            tracing::debug!(
                "Most similar pair: {} / {} ({:.3})",
                valid[i].display(),
                valid[j].display(),
                sim
            );
        }
        tracing::info!(
            "Neighbour similarity {:.3} (mean over all pairs {:.3})",
            neighbour_similarity,
            visual.similarity.mean_off_diagonal()
        );

        // 4. Rename
        let plan = RenamePlan::build(&valid, &visual.order)?;
        progress(SortProgress::phase(
            SortPhase::Staging,
            valid.len(),
            "Staging files under temporary names...",
        ));
        let staged = plan.stage()?;
        progress(SortProgress::phase(
            SortPhase::Committing,
            valid.len(),
            "Renaming files into visual order...",
        ));
        let records = staged.commit()?;

        tracing::info!(
            "Done! {} images ordered by similarity in {}",
            records.len(),
            folder.display()
        );
        progress(SortProgress {
            phase: SortPhase::Done,
            current: records.len(),
            total: records.len(),
            current_file: None,
            message: format!("{} images renamed", records.len()),
        });

        Ok(SortOutcome {
            discovered,
            skipped,
            records,
            neighbour_similarity,
        })
    }

    /// Per-image results split into survivors and failures, discovery order kept
    fn extract_all<F>(
        &self,
        images: &[ImageFile],
        progress: &F,
    ) -> (Vec<PathBuf>, Vec<FeatureVector>, Vec<LoadError>)
    where
        F: Fn(SortProgress),
    {
        let total = images.len();
        let mut valid = Vec::with_capacity(total);
        let mut features = Vec::with_capacity(total);
        let mut skipped = Vec::new();

        for (i, image) in images.iter().enumerate() {
            progress(SortProgress {
                phase: SortPhase::Extracting,
                current: i + 1,
                total,
                current_file: Some(image.path.clone()),
                message: format!("Processing {}", image.name),
            });

            match extract_features(&self.extractor, &image.path, self.config.target_size) {
                Ok(vector) => {
                    valid.push(image.path.clone());
                    features.push(vector);
                }
                Err(err) => {
                    tracing::warn!("Skipping image: {}", err);
                    skipped.push(err);
                }
            }
        }

        (valid, features, skipped)
    }
}
