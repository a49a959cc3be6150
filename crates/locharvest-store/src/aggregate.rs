//! Merges every persisted checkpoint into the final deduplicated dataset.
//!
//! Checkpoint artifacts are enumerated recursively under the maps directory
//! in file-name order at every level, so the merge order (and therefore which
//! copy of a page wins on a key collision) is the same on every platform.
//!
//! On a collision the later artifact's page replaces the earlier one in the
//! merged map. Records that appeared only in a replaced copy are not dropped:
//! they are appended after the merged pages before deduplication, so a
//! business seen by any run reaches the dataset, while businesses present in
//! the winning copy take their fields from it.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use locharvest_core::PlaceRecord;
use tokio::fs;
use tokio::task;
use walkdir::WalkDir;

use crate::atomic::write_atomic;
use crate::checkpoint::{read_checkpoint, CheckpointMap};
use crate::error::StoreError;
use crate::layout::{ArtifactLayout, LOG_EXTENSION, MAP_EXTENSION};
use crate::tabular;

/// Counts reported after an aggregation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateSummary {
    /// Checkpoint artifacts read.
    pub artifacts: usize,
    /// Distinct page keys in the merged map.
    pub pages: usize,
    /// Records in the merged map plus records only found in replaced pages.
    pub records_in: usize,
    /// Records written after deduplication.
    pub records_out: usize,
    pub output_file: PathBuf,
}

/// Result of merging all checkpoint artifacts.
#[derive(Debug, Default)]
pub struct MergedCheckpoints {
    pub map: CheckpointMap,
    /// Records from pages that a later artifact replaced, in load order.
    pub superseded: Vec<PlaceRecord>,
    pub artifacts: usize,
}

impl MergedCheckpoints {
    /// Flattened records, merged pages first (key order), then superseded.
    #[must_use]
    pub fn into_records(self) -> impl Iterator<Item = PlaceRecord> {
        self.map.into_records().chain(self.superseded)
    }
}

/// Keeps the first record for each `placeId`, preserving order.
///
/// Records without a `placeId` have nothing to collide on and are all kept.
#[must_use]
pub fn dedupe_by_place_id<I>(records: I) -> Vec<PlaceRecord>
where
    I: IntoIterator<Item = PlaceRecord>,
{
    let mut seen: HashSet<String> = HashSet::new();
    records
        .into_iter()
        .filter(|record| match record.id() {
            Some(id) => seen.insert(id.to_owned()),
            None => true,
        })
        .collect()
}

/// Builds the final dataset from the checkpoint maps under one output root.
#[derive(Debug, Clone)]
pub struct Aggregator {
    maps_dir: PathBuf,
}

impl Aggregator {
    #[must_use]
    pub fn new(layout: &ArtifactLayout) -> Self {
        Self {
            maps_dir: layout.maps_dir(),
        }
    }

    /// Checkpoint artifacts under the maps directory, sorted by file name.
    ///
    /// A missing maps directory yields an empty list. Temp files left by an
    /// interrupted write (`.name.tmp`) are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Walk`] if a directory cannot be listed.
    ///
    /// This walks the filesystem synchronously; async callers go through
    /// [`Aggregator::load_merged`], which runs it on the blocking pool.
    pub fn artifact_paths(&self) -> Result<Vec<PathBuf>, StoreError> {
        if !self.maps_dir.is_dir() {
            tracing::warn!(
                dir = %self.maps_dir.display(),
                "checkpoint directory does not exist; nothing to aggregate"
            );
            return Ok(Vec::new());
        }

        let mut paths = Vec::new();
        for entry in WalkDir::new(&self.maps_dir).sort_by_file_name() {
            let entry = entry?;
            if entry.file_type().is_file() && is_checkpoint_artifact(entry.path()) {
                paths.push(entry.into_path());
            }
        }
        Ok(paths)
    }

    /// Loads and merges every checkpoint artifact, later ones winning.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if listing or reading any artifact fails, or
    /// [`StoreError::Join`] if the directory walk panics.
    pub async fn load_merged(&self) -> Result<MergedCheckpoints, StoreError> {
        let walker = self.clone();
        let paths = task::spawn_blocking(move || walker.artifact_paths()).await??;

        let mut merged = MergedCheckpoints::default();
        for path in paths {
            let map = read_checkpoint(&path).await?;
            tracing::debug!(path = %path.display(), pages = map.len(), "merging checkpoint");
            for (key, records) in map {
                if let Some(replaced) = merged.map.insert(key, records) {
                    merged.superseded.extend(replaced);
                }
            }
            merged.artifacts += 1;
        }
        Ok(merged)
    }

    /// Merges, deduplicates, and writes the dataset CSV to `output_file`,
    /// creating its parent directory if needed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if any artifact cannot be read or the output
    /// cannot be written.
    pub async fn run(&self, output_file: &Path) -> Result<AggregateSummary, StoreError> {
        let merged = self.load_merged().await?;
        let artifacts = merged.artifacts;
        let pages = merged.map.len();
        let records_in = merged.map.record_count() + merged.superseded.len();

        let dataset = dedupe_by_place_id(merged.into_records());
        let bytes = tabular::dataset_csv(&dataset).map_err(StoreError::csv(output_file))?;

        if let Some(parent) = output_file.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(StoreError::io(parent))?;
        }
        write_atomic(output_file, &bytes).await?;

        let summary = AggregateSummary {
            artifacts,
            pages,
            records_in,
            records_out: dataset.len(),
            output_file: output_file.to_path_buf(),
        };
        tracing::info!(
            artifacts = summary.artifacts,
            pages = summary.pages,
            records_in = summary.records_in,
            records_out = summary.records_out,
            output = %summary.output_file.display(),
            "aggregated checkpoints"
        );
        Ok(summary)
    }
}

fn is_checkpoint_artifact(path: &Path) -> bool {
    let hidden = path
        .file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with('.'));
    let known_extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext == MAP_EXTENSION || ext == LOG_EXTENSION);
    !hidden && known_extension
}

#[cfg(test)]
#[path = "aggregate_test.rs"]
mod tests;
