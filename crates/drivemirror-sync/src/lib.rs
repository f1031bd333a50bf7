//! DriveMirror Sync - Incremental mirroring engine
//!
//! Provides:
//! - Depth-first traversal of a shared drive with full pagination
//! - Timestamp-based change detection against the metadata ledger
//! - Atomic transfers with local mtime as secondary sync state
//! - Run reports combined with a census of the remote drive
//!
//! ## Modules
//!
//! - [`detector`] - Decides what to do with each listed item
//! - [`engine`] - Traversal engine orchestrating a mirror run
//! - [`filesystem`] - Local filesystem adapter (atomic writes, mtimes)
//! - [`ledger_store`] - JSON persistence of the metadata ledger
//! - [`report`] - Writes the rendered run summary to the reports directory
//! - [`transfer`] - Downloads or exports one file into the mirror

pub mod detector;
pub mod engine;
pub mod filesystem;
pub mod ledger_store;
pub mod report;
pub mod transfer;

use std::path::PathBuf;

use thiserror::Error;

/// Errors that end a mirror run or a persistence operation
#[derive(Debug, Error)]
pub enum SyncError {
    /// The run was cancelled (Ctrl-C or deadline)
    #[error("Run cancelled")]
    Cancelled,

    /// An I/O error occurred during file operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The ledger could not be read, parsed or written
    #[error("Ledger error at {path}: {message}")]
    Ledger { path: PathBuf, message: String },

    /// A folder listing failed; the traversal cannot continue
    #[error("Failed to list folder {0}")]
    Listing(String),
}

impl SyncError {
    /// Returns true if `err` (or anything it wraps) is a cancellation
    pub fn is_cancellation(err: &anyhow::Error) -> bool {
        matches!(err.downcast_ref::<SyncError>(), Some(SyncError::Cancelled))
    }
}
