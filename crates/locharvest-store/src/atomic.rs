use std::path::Path;

use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::error::StoreError;

/// Writes `bytes` to `path` via a temp file in the same directory and a
/// rename, so readers see either the previous content or the new content.
///
/// The parent directory must already exist.
pub(crate) async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    let file_name = path
        .file_name()
        .map_or_else(|| "artifact".into(), |name| name.to_string_lossy());
    let temp_path = parent.join(format!(".{file_name}.tmp"));

    let mut file = fs::File::create(&temp_path)
        .await
        .map_err(StoreError::io(&temp_path))?;
    file.write_all(bytes)
        .await
        .map_err(StoreError::io(&temp_path))?;
    file.sync_all().await.map_err(StoreError::io(&temp_path))?;
    drop(file);

    if let Err(err) = fs::rename(&temp_path, path).await {
        let _ = fs::remove_file(&temp_path).await;
        return Err(StoreError::Io {
            path: path.to_path_buf(),
            source: err,
        });
    }

    tracing::debug!(path = %path.display(), bytes = bytes.len(), "artifact written");
    Ok(())
}
