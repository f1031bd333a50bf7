//! Local filesystem adapter (secondary/driven adapter)
//!
//! Implements [`ILocalFileSystem`] using `tokio::fs` for async file operations.
//!
//! ## Design Decisions
//!
//! - **Atomic writes**: Uses write-to-temp + rename so an interrupted
//!   transfer never leaves a partial file under the final name. The temp
//!   file is a hidden, randomly named sibling created exclusively through
//!   `tempfile`, so it never clobbers a mirrored file.
//! - **Timestamps**: `filetime` sets both atime and mtime to the remote
//!   modification time; it runs on a blocking thread.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use drivemirror_core::ports::ILocalFileSystem;
use filetime::FileTime;
use tokio::io::AsyncWriteExt;
use tracing::{debug, instrument};

/// Prefix of the hidden sibling a write goes through before the rename
pub(crate) const TMP_PREFIX: &str = ".drivemirror-";
const TMP_SUFFIX: &str = ".tmp";

/// Adapter that bridges the [`ILocalFileSystem`] port to the real filesystem.
///
/// This is a zero-sized struct because all operations derive their context
/// from the path arguments. The mirror root lives at a higher layer.
#[derive(Debug, Clone, Default)]
pub struct LocalFileSystemAdapter;

impl LocalFileSystemAdapter {
    /// Create a new `LocalFileSystemAdapter`.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

/// Write `data` to `path` through a temporary sibling
///
/// The sibling is flushed to disk and renamed over `path`. It is removed
/// again when any step fails, including the rename.
pub(crate) async fn write_atomic(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    let named = tokio::task::spawn_blocking(move || {
        tempfile::Builder::new()
            .prefix(TMP_PREFIX)
            .suffix(TMP_SUFFIX)
            .tempfile_in(dir)
    })
    .await??;
    let (file, tmp) = named.into_parts();
    debug!(tmp = %tmp.display(), "writing to temporary file");

    let mut file = tokio::fs::File::from_std(file);
    file.write_all(data).await?;
    file.sync_all().await?;
    drop(file);

    let target = path.to_path_buf();
    tokio::task::spawn_blocking(move || tmp.persist(target))
        .await?
        .map_err(|e| e.error)?;
    Ok(())
}

#[async_trait::async_trait]
impl ILocalFileSystem for LocalFileSystemAdapter {
    #[instrument(skip(self, data), fields(path = %path.display(), bytes = data.len()))]
    async fn write_file_atomic(&self, path: &Path, data: &[u8]) -> anyhow::Result<u64> {
        // Path bounding may have shortened ancestors that do not exist yet.
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        write_atomic(path, data).await?;

        debug!("write complete");
        Ok(data.len() as u64)
    }

    #[instrument(skip(self), fields(path = %path.display()))]
    async fn create_directory(&self, path: &Path) -> anyhow::Result<()> {
        tokio::fs::create_dir_all(path).await?;
        debug!("directory ready");
        Ok(())
    }

    async fn modified_time(&self, path: &Path) -> anyhow::Result<Option<DateTime<Utc>>> {
        let metadata = match tokio::fs::metadata(path).await {
            Ok(m) => m,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        if !metadata.is_file() {
            return Ok(None);
        }

        Ok(Some(DateTime::<Utc>::from(metadata.modified()?)))
    }

    #[instrument(skip(self), fields(path = %path.display(), %time))]
    async fn set_modified_time(&self, path: &Path, time: DateTime<Utc>) -> anyhow::Result<()> {
        let ft = FileTime::from_unix_time(time.timestamp(), time.timestamp_subsec_nanos());
        let target = path.to_path_buf();

        tokio::task::spawn_blocking(move || filetime::set_file_times(&target, ft, ft)).await??;
        Ok(())
    }
}

// ============================================================================
// Unit tests
// ============================================================================
