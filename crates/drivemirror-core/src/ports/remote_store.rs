//! Remote store port (driven/secondary port)
//!
//! This module defines the interface for reading a hierarchical remote file
//! store. The implementation targets Google Drive shared drives, but nothing
//! here is Drive-specific beyond the shape of a listing page.
//!
//! ## Design Notes
//!
//! - Uses `anyhow::Result` because transport errors are adapter-specific.
//!   Structured remote failures are carried as an [`ApiError`] inside the
//!   `anyhow::Error`, so callers can `downcast_ref::<ApiError>()` to react
//!   to a specific reason code.
//! - Pagination is explicit: callers pass back `next_page_token` until it is
//!   `None`. The adapter never drains pages on its own.
//! - Content is returned fully buffered; the adapter consumes the body chunk
//!   by chunk so a dropped future aborts the transfer.

use thiserror::Error;

use crate::domain::{RemoteId, RemoteItem};

// ============================================================================
// ApiError
// ============================================================================

/// Structured failure reported by the remote API
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("HTTP {status}: {message}")]
pub struct ApiError {
    /// HTTP status code
    pub status: u16,
    /// Machine-readable reason code (e.g. `exportSizeLimitExceeded`)
    pub reason: Option<String>,
    /// Human-readable message from the API
    pub message: String,
}

impl ApiError {
    pub const EXPORT_SIZE_LIMIT_EXCEEDED: &'static str = "exportSizeLimitExceeded";
    pub const BAD_REQUEST: &'static str = "badRequest";

    pub fn new(status: u16, reason: Option<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            reason,
            message: message.into(),
        }
    }

    /// Returns true if the API tagged this failure with `reason`
    pub fn has_reason(&self, reason: &str) -> bool {
        self.reason.as_deref() == Some(reason)
    }

    /// Returns true when the request was rejected for missing or expired credentials
    pub fn is_auth_failure(&self) -> bool {
        self.status == 401
    }
}

// ============================================================================
// Listing DTOs
// ============================================================================

/// A listing entry the adapter could not turn into a [`RemoteItem`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedEntry {
    pub name: String,
    pub mime_type: String,
    pub reason: String,
}

/// One page of a folder listing
#[derive(Debug, Clone, Default)]
pub struct ListPage {
    /// Items in listing order
    pub items: Vec<RemoteItem>,
    /// Malformed entries, reported per item by the caller
    pub rejected: Vec<RejectedEntry>,
    /// Continuation token for the next page (None on the last page)
    pub next_page_token: Option<String>,
}

/// One page of the drive-wide census
#[derive(Debug, Clone, Default)]
pub struct CensusPage {
    /// Size of every item on the page; `None` for virtual documents and folders
    pub sizes: Vec<Option<u64>>,
    pub next_page_token: Option<String>,
}

// ============================================================================
// IRemoteStore trait
// ============================================================================

/// Port trait for read-only access to the remote store
///
/// ## Implementation Notes
///
/// - Listings exclude trashed items.
/// - Transport-level throttling (HTTP 429 / 5xx) may be retried internally;
///   any other failure is returned to the caller unchanged.
#[async_trait::async_trait]
pub trait IRemoteStore: Send + Sync {
    /// Lists one page of the direct children of a folder
    ///
    /// # Arguments
    /// * `folder_id` - The folder to list
    /// * `page_token` - Continuation token from the previous page (None for the first)
    async fn list_children(
        &self,
        folder_id: &RemoteId,
        page_token: Option<&str>,
    ) -> anyhow::Result<ListPage>;

    /// Downloads the raw bytes of a binary file
    async fn fetch_content(&self, id: &RemoteId) -> anyhow::Result<Vec<u8>>;

    /// Exports a virtual document to the given MIME type
    ///
    /// # Arguments
    /// * `id` - The document to export
    /// * `format` - Target MIME type, e.g. `application/pdf`
    async fn export_content(&self, id: &RemoteId, format: &str) -> anyhow::Result<Vec<u8>>;

    /// Fetches one page of the census over every non-trashed item in the drive
    async fn census_page(&self, page_token: Option<&str>) -> anyhow::Result<CensusPage>;
}
