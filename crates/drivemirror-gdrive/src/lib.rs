//! DriveMirror GDrive - Google Drive v3 API client
//!
//! Provides async client for:
//! - Paginated listing of shared drive folders
//! - Drive-wide census (item count and total size)
//! - Raw content download and export of workspace documents
//! - Bearer token providers (static token, system keyring with OAuth2 refresh)
//!
//! ## Modules
//!
//! - [`auth`] - Token storage and credential providers
//! - [`client`] - Drive API HTTP client with throttling backoff
//! - [`files`] - Folder listing and census queries
//! - [`content`] - File download and export
//! - [`provider`] - `IRemoteStore` implementation

pub mod auth;
pub mod client;
pub mod content;
pub mod files;
pub mod provider;

use thiserror::Error;

/// Errors raised by the Drive adapter itself
///
/// Failures reported by the API are surfaced as
/// [`drivemirror_core::ports::ApiError`] instead, so callers can inspect the
/// reason code.
#[derive(Debug, Error)]
pub enum DriveError {
    /// No usable credentials were found
    #[error("No credentials: {0}")]
    NoCredentials(String),

    /// The access token has expired and cannot be refreshed
    #[error("Token expired and no refresh is possible for account '{0}'")]
    TokenExpired(String),

    /// The API response could not be parsed or was malformed
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}
