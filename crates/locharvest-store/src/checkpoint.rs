//! Per-run checkpoint persistence.
//!
//! After every fetched page [`CheckpointStore::record_page`] writes, in order:
//!
//! 1. the raw page body to its own file (never overwritten by later pages),
//! 2. the cumulative checkpoint map (whole-map rewrite, or one appended log
//!    line in [`CheckpointMode::Log`]),
//! 3. a CSV snapshot of the cumulative map.
//!
//! Whole-file writes go through a temp file and a rename. The in-memory map
//! only gains the page once step 2 has succeeded, so memory and disk never
//! disagree about which pages are recorded.

use std::collections::btree_map;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use locharvest_core::{CheckpointKey, CheckpointMode, PlaceRecord, SearchTarget};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::fs;

use crate::atomic::write_atomic;
use crate::error::StoreError;
use crate::layout::ArtifactLayout;
use crate::{log, tabular};

/// Pages of records keyed by `(zone, page)`, serialised as a JSON object
/// keyed `"{zone}_{page}"`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CheckpointMap(BTreeMap<CheckpointKey, Vec<PlaceRecord>>);

impl CheckpointMap {
    /// Stores `records` under `key`, returning the value it replaced.
    pub fn insert(
        &mut self,
        key: CheckpointKey,
        records: Vec<PlaceRecord>,
    ) -> Option<Vec<PlaceRecord>> {
        self.0.insert(key, records)
    }

    #[must_use]
    pub fn get(&self, key: &CheckpointKey) -> Option<&Vec<PlaceRecord>> {
        self.0.get(key)
    }

    #[must_use]
    pub fn contains(&self, key: &CheckpointKey) -> bool {
        self.0.contains_key(key)
    }

    pub fn remove(&mut self, key: &CheckpointKey) -> Option<Vec<PlaceRecord>> {
        self.0.remove(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn iter(&self) -> btree_map::Iter<'_, CheckpointKey, Vec<PlaceRecord>> {
        self.0.iter()
    }

    #[must_use]
    pub fn keys(&self) -> btree_map::Keys<'_, CheckpointKey, Vec<PlaceRecord>> {
        self.0.keys()
    }

    /// Total number of records across all pages.
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }

    /// Highest recorded page for `zone`, with that page's records.
    #[must_use]
    pub fn last_page(&self, zone: &str) -> Option<(u32, &[PlaceRecord])> {
        self.0
            .iter()
            .filter(|(key, _)| key.zone == zone)
            .next_back()
            .map(|(key, records)| (key.page, records.as_slice()))
    }

    /// All records in key order.
    #[must_use]
    pub fn records(&self) -> impl Iterator<Item = &PlaceRecord> {
        self.0.values().flatten()
    }

    #[must_use]
    pub fn into_records(self) -> impl Iterator<Item = PlaceRecord> {
        self.0.into_values().flatten()
    }
}

impl<'a> IntoIterator for &'a CheckpointMap {
    type Item = (&'a CheckpointKey, &'a Vec<PlaceRecord>);
    type IntoIter = btree_map::Iter<'a, CheckpointKey, Vec<PlaceRecord>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl IntoIterator for CheckpointMap {
    type Item = (CheckpointKey, Vec<PlaceRecord>);
    type IntoIter = btree_map::IntoIter<CheckpointKey, Vec<PlaceRecord>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Reads a checkpoint artifact, choosing the decoder from its extension
/// (`.jsonl` is a log, anything else a whole-map JSON object).
///
/// # Errors
///
/// Returns [`StoreError::Io`] if the file cannot be read, [`StoreError::Json`]
/// if a map does not decode, or [`StoreError::CorruptLog`] for a damaged log.
pub async fn read_checkpoint(path: &Path) -> Result<CheckpointMap, StoreError> {
    if path.extension().is_some_and(|ext| ext == crate::layout::LOG_EXTENSION) {
        return log::read_log(path).await;
    }
    let bytes = fs::read(path).await.map_err(StoreError::io(path))?;
    serde_json::from_slice(&bytes).map_err(StoreError::json(path))
}

/// Persists the pages of one run (one zone + query).
///
/// Pure persistence: it neither fetches nor decides when a run ends.
#[derive(Debug)]
pub struct CheckpointStore {
    layout: ArtifactLayout,
    target: SearchTarget,
    mode: CheckpointMode,
    map: CheckpointMap,
    /// Whether the next log write must rewrite the whole log rather than
    /// append to it: true until the first page of this process is recorded.
    rewrite_log: bool,
}

impl CheckpointStore {
    /// Opens a store for a fresh run with an empty map.
    ///
    /// Creates the artifact directories. An existing checkpoint for the same
    /// zone + query is left untouched until the first page is recorded, at
    /// which point it is replaced.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the directories cannot be created.
    pub async fn open(
        layout: ArtifactLayout,
        target: SearchTarget,
        mode: CheckpointMode,
    ) -> Result<Self, StoreError> {
        layout.ensure_dirs().await?;
        Ok(Self {
            layout,
            target,
            mode,
            map: CheckpointMap::default(),
            rewrite_log: true,
        })
    }

    /// Opens a store seeded with whatever an earlier run of the same zone +
    /// query persisted (an empty map if nothing was).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the directories cannot be created or the
    /// existing checkpoint cannot be read.
    pub async fn resume(
        layout: ArtifactLayout,
        target: SearchTarget,
        mode: CheckpointMode,
    ) -> Result<Self, StoreError> {
        let mut store = Self::open(layout, target, mode).await?;
        let path = store.map_path();
        if fs::try_exists(&path).await.map_err(StoreError::io(&path))? {
            store.map = read_checkpoint(&path).await?;
            tracing::info!(
                path = %path.display(),
                pages = store.map.len(),
                records = store.map.record_count(),
                "resuming from existing checkpoint"
            );
        }
        Ok(store)
    }

    #[must_use]
    pub fn map(&self) -> &CheckpointMap {
        &self.map
    }

    #[must_use]
    pub fn target(&self) -> &SearchTarget {
        &self.target
    }

    #[must_use]
    pub fn layout(&self) -> &ArtifactLayout {
        &self.layout
    }

    #[must_use]
    pub fn map_path(&self) -> PathBuf {
        self.layout.map_path(&self.target, self.mode)
    }

    /// Records one fetched page.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DuplicatePage`] if `page` is already in this
    /// run's map, or any I/O / encoding error from the three writes. If the
    /// raw page or the map cannot be written the in-memory map is unchanged.
    pub async fn record_page(
        &mut self,
        page: u32,
        raw: &Value,
        records: Vec<PlaceRecord>,
    ) -> Result<(), StoreError> {
        let key = CheckpointKey::new(self.target.zone.clone(), page);
        if self.map.contains(&key) {
            return Err(StoreError::DuplicatePage {
                key: key.to_string(),
            });
        }

        let page_path = self.layout.page_path(&self.target, page);
        let raw_bytes = serde_json::to_vec(raw).map_err(StoreError::json(&page_path))?;
        write_atomic(&page_path, &raw_bytes).await?;

        self.map.insert(key.clone(), records);
        if let Err(err) = self.write_map(&key).await {
            self.map.remove(&key);
            return Err(err);
        }

        self.write_snapshot().await?;

        tracing::debug!(
            key = %key,
            pages = self.map.len(),
            records = self.map.record_count(),
            "checkpoint recorded"
        );
        Ok(())
    }

    /// Persists the cumulative map after `key` was added to it.
    async fn write_map(&mut self, key: &CheckpointKey) -> Result<(), StoreError> {
        let path = self.map_path();
        match self.mode {
            CheckpointMode::Snapshot => {
                let bytes = serde_json::to_vec(&self.map).map_err(StoreError::json(&path))?;
                write_atomic(&path, &bytes).await
            }
            CheckpointMode::Log if self.rewrite_log => {
                let bytes = log::encode_map(&self.map).map_err(StoreError::json(&path))?;
                write_atomic(&path, &bytes).await?;
                self.rewrite_log = false;
                Ok(())
            }
            CheckpointMode::Log => {
                let records = self.map.get(key).map_or(&[][..], Vec::as_slice);
                let line = log::encode_entry(key, records).map_err(StoreError::json(&path))?;
                log::append(&path, &line).await
            }
        }
    }

    async fn write_snapshot(&self) -> Result<(), StoreError> {
        let path = self.layout.snapshot_path(&self.target);
        let bytes = tabular::snapshot_csv(&self.map).map_err(StoreError::csv(&path))?;
        write_atomic(&path, &bytes).await
    }
}

#[cfg(test)]
#[path = "checkpoint_test.rs"]
mod tests;
