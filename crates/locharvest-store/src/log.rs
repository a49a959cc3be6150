//! Append-only checkpoint log.
//!
//! One JSON object per line, one line per recorded page:
//!
//! ```text
//! {"key":"mar_del_plata_0","records":[{...},{...}]}
//! {"key":"mar_del_plata_1","records":[{...}]}
//! ```
//!
//! The map is rebuilt on load, later lines overwriting earlier ones for the
//! same key. Every complete line ends in `\n`; an unterminated final line that
//! does not parse is the remains of an interrupted append and is dropped.
//! Any other unparsable line is corruption.

use std::path::Path;

use locharvest_core::{CheckpointKey, PlaceRecord};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::checkpoint::CheckpointMap;
use crate::error::StoreError;

#[derive(Serialize)]
struct EntryRef<'a> {
    key: &'a CheckpointKey,
    records: &'a [PlaceRecord],
}

#[derive(Deserialize)]
struct Entry {
    key: CheckpointKey,
    records: Vec<PlaceRecord>,
}

/// Encodes one page as a newline-terminated log line.
pub(crate) fn encode_entry(
    key: &CheckpointKey,
    records: &[PlaceRecord],
) -> Result<Vec<u8>, serde_json::Error> {
    let mut line = serde_json::to_vec(&EntryRef { key, records })?;
    line.push(b'\n');
    Ok(line)
}

/// Encodes a whole map as a log, one line per key in key order.
pub(crate) fn encode_map(map: &CheckpointMap) -> Result<Vec<u8>, serde_json::Error> {
    let mut out = Vec::new();
    for (key, records) in map.iter() {
        out.extend(encode_entry(key, records)?);
    }
    Ok(out)
}

/// Rebuilds a checkpoint map from log text read from `path`.
pub(crate) fn parse_log(path: &Path, text: &str) -> Result<CheckpointMap, StoreError> {
    let mut map = CheckpointMap::default();
    let segments: Vec<&str> = text.split('\n').collect();
    let last = segments.len().saturating_sub(1);

    for (index, segment) in segments.iter().enumerate() {
        let line = segment.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<Entry>(line) {
            Ok(entry) => {
                map.insert(entry.key, entry.records);
            }
            // Only the final segment can lack its terminating newline.
            Err(err) if index == last => {
                tracing::warn!(
                    path = %path.display(),
                    line = index + 1,
                    error = %err,
                    "dropping torn trailing checkpoint log line"
                );
            }
            Err(_) => {
                return Err(StoreError::CorruptLog {
                    path: path.to_path_buf(),
                    line: index + 1,
                });
            }
        }
    }

    Ok(map)
}

/// Reads and rebuilds the log at `path`.
pub(crate) async fn read_log(path: &Path) -> Result<CheckpointMap, StoreError> {
    let text = fs::read_to_string(path)
        .await
        .map_err(StoreError::io(path))?;
    parse_log(path, &text)
}

/// Appends pre-encoded `line` to the log at `path` and syncs it to disk.
pub(crate) async fn append(path: &Path, line: &[u8]) -> Result<(), StoreError> {
    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await
        .map_err(StoreError::io(path))?;
    file.write_all(line).await.map_err(StoreError::io(path))?;
    file.sync_data().await.map_err(StoreError::io(path))?;
    Ok(())
}
