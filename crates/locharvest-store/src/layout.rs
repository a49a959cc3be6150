//! Directory layout of a harvest output root.
//!
//! ```text
//! {root}/
//!   jsons/{query}_{zone}_{page}.json   raw page responses, one per page
//!   dicts/{query}_dict_{zone}.json     cumulative checkpoint map (snapshot mode)
//!   dicts/{query}_log_{zone}.jsonl     cumulative checkpoint log (log mode)
//!   dfs/{query}_{zone}.csv             cumulative tabular snapshot
//!   {query}_final.csv                  default final dataset path
//! ```
//!
//! Query and zone are slugged before they become part of a file name.

use std::path::{Path, PathBuf};

use locharvest_core::{slug, CheckpointMode, SearchTarget};
use tokio::fs;

use crate::error::StoreError;

pub const PAGES_DIR: &str = "jsons";
pub const MAPS_DIR: &str = "dicts";
pub const SNAPSHOTS_DIR: &str = "dfs";

pub(crate) const MAP_EXTENSION: &str = "json";
pub(crate) const LOG_EXTENSION: &str = "jsonl";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactLayout {
    root: PathBuf,
}

impl ArtifactLayout {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn pages_dir(&self) -> PathBuf {
        self.root.join(PAGES_DIR)
    }

    #[must_use]
    pub fn maps_dir(&self) -> PathBuf {
        self.root.join(MAPS_DIR)
    }

    #[must_use]
    pub fn snapshots_dir(&self) -> PathBuf {
        self.root.join(SNAPSHOTS_DIR)
    }

    #[must_use]
    pub fn page_path(&self, target: &SearchTarget, page: u32) -> PathBuf {
        self.pages_dir().join(format!(
            "{}_{}_{page}.json",
            slug(&target.query),
            slug(&target.zone)
        ))
    }

    #[must_use]
    pub fn map_path(&self, target: &SearchTarget, mode: CheckpointMode) -> PathBuf {
        let query = slug(&target.query);
        let zone = slug(&target.zone);
        let file_name = match mode {
            CheckpointMode::Snapshot => format!("{query}_dict_{zone}.{MAP_EXTENSION}"),
            CheckpointMode::Log => format!("{query}_log_{zone}.{LOG_EXTENSION}"),
        };
        self.maps_dir().join(file_name)
    }

    #[must_use]
    pub fn snapshot_path(&self, target: &SearchTarget) -> PathBuf {
        self.snapshots_dir().join(format!(
            "{}_{}.csv",
            slug(&target.query),
            slug(&target.zone)
        ))
    }

    /// Final dataset path used when the caller does not name one.
    #[must_use]
    pub fn default_output_file(&self, query: &str) -> PathBuf {
        self.root.join(format!("{}_final.csv", slug(query)))
    }

    /// Creates the three artifact subdirectories if they do not exist.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if a directory cannot be created.
    pub async fn ensure_dirs(&self) -> Result<(), StoreError> {
        for dir in [self.pages_dir(), self.maps_dir(), self.snapshots_dir()] {
            fs::create_dir_all(&dir).await.map_err(StoreError::io(&dir))?;
        }
        Ok(())
    }
}
