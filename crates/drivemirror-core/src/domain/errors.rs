//! Domain error types
//!
//! This module defines error types specific to domain operations,
//! such as invalid identifiers, unknown timestamps, and path errors.

use thiserror::Error;

/// Errors that can occur in domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Invalid remote item identifier
    #[error("Invalid remote ID: {0}")]
    InvalidRemoteId(String),

    /// A remote timestamp could not be parsed as RFC 3339
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// Invalid local path
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Generic validation failure
    #[error("Validation failed: {0}")]
    ValidationFailed(String),
}
