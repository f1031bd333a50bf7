//! Local filesystem port (driven/secondary port)
//!
//! This module defines the interface for writing the local mirror.
//!
//! ## Design Notes
//!
//! - Uses `anyhow::Result` because filesystem errors are adapter-specific.
//! - File modification times double as sync state: after a write the local
//!   mtime is set to the remote modification time, and a later run may skip
//!   the transfer when the two agree.

use std::path::Path;

use chrono::{DateTime, Utc};

// ============================================================================
// ILocalFileSystem trait
// ============================================================================

/// Port trait for local filesystem operations
///
/// ## Implementation Notes
///
/// - All paths are absolute paths below the sync root.
/// - Implementations should handle concurrent access gracefully.
#[async_trait::async_trait]
pub trait ILocalFileSystem: Send + Sync {
    /// Writes data to a file atomically, replacing any existing content
    ///
    /// Parent directories are created when missing. The data is first
    /// written to a temporary sibling and renamed into place, so readers
    /// never observe a partial file.
    ///
    /// # Arguments
    /// * `path` - Absolute path to the file
    /// * `data` - The data to write
    ///
    /// # Returns
    /// Number of bytes written
    async fn write_file_atomic(&self, path: &Path, data: &[u8]) -> anyhow::Result<u64>;

    /// Creates a directory and all missing parents (no-op if it exists)
    async fn create_directory(&self, path: &Path) -> anyhow::Result<()>;

    /// Returns the modification time of a regular file
    ///
    /// # Returns
    /// `None` if the path does not exist or is not a regular file
    async fn modified_time(&self, path: &Path) -> anyhow::Result<Option<DateTime<Utc>>>;

    /// Sets the modification (and access) time of a file
    async fn set_modified_time(&self, path: &Path, time: DateTime<Utc>) -> anyhow::Result<()>;
}
