//! RemoteItem domain entity
//!
//! An immutable snapshot of one entry in a remote folder listing.

use chrono::{DateTime, Utc};

use super::errors::DomainError;
use super::mime::MimeKind;
use super::newtypes::RemoteId;

/// A file, folder or shortcut as reported by the remote store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteItem {
    pub id: RemoteId,
    /// Raw remote name, not yet sanitized
    pub name: String,
    pub mime: MimeKind,
    /// Last modification time with fractional-second precision
    pub modified_time: DateTime<Utc>,
    /// Size in bytes; absent for virtual documents and folders
    pub size: Option<u64>,
}

impl RemoteItem {
    pub fn new(
        id: RemoteId,
        name: impl Into<String>,
        mime: MimeKind,
        modified_time: DateTime<Utc>,
        size: Option<u64>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            mime,
            modified_time,
            size,
        }
    }

    /// Build an item from the raw strings of a listing entry
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidRemoteId`] or
    /// [`DomainError::InvalidTimestamp`] when the fields are malformed.
    pub fn from_listing(
        id: &str,
        name: &str,
        mime_type: &str,
        modified_time: &str,
        size: Option<u64>,
    ) -> Result<Self, DomainError> {
        let id = RemoteId::new(id.to_string())?;
        let modified_time = DateTime::parse_from_rfc3339(modified_time)
            .map_err(|e| DomainError::InvalidTimestamp(format!("{modified_time}: {e}")))?
            .with_timezone(&Utc);

        Ok(Self::new(
            id,
            name,
            MimeKind::parse(mime_type),
            modified_time,
            size,
        ))
    }

    pub fn is_folder(&self) -> bool {
        self.mime == MimeKind::Folder
    }

    pub fn is_shortcut(&self) -> bool {
        self.mime == MimeKind::Shortcut
    }
}
