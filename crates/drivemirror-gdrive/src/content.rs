//! File content download and export
//!
//! Binary files are fetched with `alt=media`. Workspace documents (Docs,
//! Sheets, Slides, ...) have no binary content and must go through the
//! export endpoint with a target MIME type.

use anyhow::Result;
use tracing::debug;

use drivemirror_core::domain::RemoteId;

use crate::client::DriveClient;

/// Downloads the raw bytes of a binary file
///
/// Makes `GET /files/{id}?alt=media&supportsAllDrives=true`.
pub async fn fetch(client: &DriveClient, id: &RemoteId) -> Result<Vec<u8>> {
    let path = format!("/files/{id}");
    debug!(%id, "Fetching file content");

    client
        .download(
            &path,
            &[
                ("alt", "media".to_string()),
                ("supportsAllDrives", "true".to_string()),
            ],
        )
        .await
}

/// Exports a workspace document to `format`
///
/// Makes `GET /files/{id}/export?mimeType={format}`. The API caps exports at
/// 10 MB and answers larger documents with `exportSizeLimitExceeded`.
pub async fn export(client: &DriveClient, id: &RemoteId, format: &str) -> Result<Vec<u8>> {
    let path = format!("/files/{id}/export");
    debug!(%id, format, "Exporting document");

    client
        .download(&path, &[("mimeType", format.to_string())])
        .await
}
