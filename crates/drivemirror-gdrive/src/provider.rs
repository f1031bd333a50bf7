//! DriveRemoteStore - IRemoteStore implementation for Google Drive
//!
//! Wraps the [`DriveClient`] and delegates to the files and content modules
//! to fulfil the [`IRemoteStore`] port contract for one shared drive.
//!
//! ## Design Notes
//!
//! - No interior mutability is needed: token refresh lives behind the
//!   client's [`ICredentialProvider`](drivemirror_core::ports::ICredentialProvider).
//! - Every call is scoped to the configured shared drive.

use anyhow::Result;
use tracing::debug;

use drivemirror_core::domain::RemoteId;
use drivemirror_core::ports::{CensusPage, IRemoteStore, ListPage};

use crate::client::DriveClient;
use crate::{content, files};

/// Remote store backed by a single Google shared drive
pub struct DriveRemoteStore {
    client: DriveClient,
    drive_id: RemoteId,
}

impl DriveRemoteStore {
    /// Creates a new `DriveRemoteStore` for `drive_id`
    pub fn new(client: DriveClient, drive_id: RemoteId) -> Self {
        Self { client, drive_id }
    }

    pub fn drive_id(&self) -> &RemoteId {
        &self.drive_id
    }
}

#[async_trait::async_trait]
impl IRemoteStore for DriveRemoteStore {
    async fn list_children(
        &self,
        folder_id: &RemoteId,
        page_token: Option<&str>,
    ) -> Result<ListPage> {
        debug!(folder = %folder_id, has_token = page_token.is_some(), "DriveRemoteStore::list_children");
        files::list_children(&self.client, &self.drive_id, folder_id, page_token).await
    }

    async fn fetch_content(&self, id: &RemoteId) -> Result<Vec<u8>> {
        content::fetch(&self.client, id).await
    }

    async fn export_content(&self, id: &RemoteId, format: &str) -> Result<Vec<u8>> {
        content::export(&self.client, id, format).await
    }

    async fn census_page(&self, page_token: Option<&str>) -> Result<CensusPage> {
        debug!(has_token = page_token.is_some(), "DriveRemoteStore::census_page");
        files::census_page(&self.client, &self.drive_id, page_token).await
    }
}
