//! Folder listing and census queries against `GET /files`
//!
//! Both queries are scoped to a single shared drive (`corpora=drive`) and
//! exclude trashed items. Each call fetches exactly one page; the caller
//! drives pagination with `nextPageToken`.
//!
//! See: <https://developers.google.com/drive/api/reference/rest/v3/files/list>

use anyhow::Result;
use serde::Deserialize;
use tracing::{debug, warn};

use drivemirror_core::domain::{RemoteId, RemoteItem};
use drivemirror_core::ports::{CensusPage, ListPage, RejectedEntry};

use crate::client::DriveClient;

/// Path of the files collection relative to the API base URL
const FILES_PATH: &str = "/files";

/// Fields requested for a folder listing
const LIST_FIELDS: &str = "nextPageToken, files(id, name, mimeType, modifiedTime, size)";

/// Listing order; keeps collision suffixes on the same item across runs
const LIST_ORDER: &str = "name,createdTime";

/// Fields requested for the census
const CENSUS_FIELDS: &str = "nextPageToken, files(size)";

/// Largest page size the API accepts
const PAGE_SIZE: u32 = 1000;

// ============================================================================
// Drive API response types (JSON deserialization)
// ============================================================================

/// Raw response of `GET /files`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileListResponse {
    #[serde(default)]
    files: Vec<FileResource>,
    next_page_token: Option<String>,
}

/// A file resource restricted to the requested fields
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileResource {
    #[serde(default)]
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    mime_type: String,
    modified_time: Option<String>,
    /// int64 fields are serialized as JSON strings by Google APIs
    size: Option<SizeField>,
}

/// `size` as emitted by the API (string) or by lenient fakes (number)
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SizeField {
    Text(String),
    Number(u64),
}

impl SizeField {
    fn value(&self) -> Option<u64> {
        match self {
            Self::Text(s) => s.parse().ok(),
            Self::Number(n) => Some(*n),
        }
    }
}

// ============================================================================
// Conversion to port-level types
// ============================================================================

fn parse_resource(resource: FileResource) -> Result<RemoteItem, RejectedEntry> {
    let reject = |reason: String| RejectedEntry {
        name: resource.name.clone(),
        mime_type: resource.mime_type.clone(),
        reason,
    };

    let modified_time = resource
        .modified_time
        .as_deref()
        .ok_or_else(|| reject("missing modifiedTime".to_string()))?;

    let size = match &resource.size {
        None => None,
        Some(field) => Some(
            field
                .value()
                .ok_or_else(|| reject(format!("invalid size {field:?}")))?,
        ),
    };

    RemoteItem::from_listing(
        &resource.id,
        &resource.name,
        &resource.mime_type,
        modified_time,
        size,
    )
    .map_err(|e| reject(e.to_string()))
}

fn into_list_page(response: FileListResponse) -> ListPage {
    let mut page = ListPage {
        next_page_token: response.next_page_token,
        ..ListPage::default()
    };

    for resource in response.files {
        match parse_resource(resource) {
            Ok(item) => page.items.push(item),
            Err(rejected) => {
                warn!(name = %rejected.name, reason = %rejected.reason, "Malformed listing entry");
                page.rejected.push(rejected);
            }
        }
    }
    page
}

fn shared_drive_params(drive_id: &RemoteId) -> Vec<(&'static str, String)> {
    vec![
        ("corpora", "drive".to_string()),
        ("driveId", drive_id.to_string()),
        ("includeItemsFromAllDrives", "true".to_string()),
        ("supportsAllDrives", "true".to_string()),
        ("spaces", "drive".to_string()),
        ("pageSize", PAGE_SIZE.to_string()),
    ]
}

// ============================================================================
// Query functions
// ============================================================================

/// Fetches one page of the non-trashed children of `folder_id`
///
/// # Arguments
///
/// * `client` - Authenticated [`DriveClient`]
/// * `drive_id` - Shared drive that contains the folder
/// * `folder_id` - Folder to list
/// * `page_token` - `nextPageToken` of the previous page, `None` for the first
///
/// # Errors
///
/// Returns an error if the request fails, the API reports an error, or the
/// body is not a file list. Individual malformed entries are not errors; they
/// come back in [`ListPage::rejected`].
pub async fn list_children(
    client: &DriveClient,
    drive_id: &RemoteId,
    folder_id: &RemoteId,
    page_token: Option<&str>,
) -> Result<ListPage> {
    let mut query = shared_drive_params(drive_id);
    query.push(("q", format!("'{folder_id}' in parents and trashed=false")));
    query.push(("fields", LIST_FIELDS.to_string()));
    query.push(("orderBy", LIST_ORDER.to_string()));
    if let Some(token) = page_token {
        query.push(("pageToken", token.to_string()));
    }

    let response: FileListResponse = client.get_json(FILES_PATH, &query).await?;
    let page = into_list_page(response);

    debug!(
        folder = %folder_id,
        items = page.items.len(),
        rejected = page.rejected.len(),
        has_next = page.next_page_token.is_some(),
        "Received listing page"
    );
    Ok(page)
}

/// Fetches one page of the census over every non-trashed item of the drive
pub async fn census_page(
    client: &DriveClient,
    drive_id: &RemoteId,
    page_token: Option<&str>,
) -> Result<CensusPage> {
    let mut query = shared_drive_params(drive_id);
    query.push(("q", "trashed=false".to_string()));
    query.push(("fields", CENSUS_FIELDS.to_string()));
    if let Some(token) = page_token {
        query.push(("pageToken", token.to_string()));
    }

    let response: FileListResponse = client.get_json(FILES_PATH, &query).await?;
    let sizes = response
        .files
        .iter()
        .map(|f| f.size.as_ref().and_then(SizeField::value))
        .collect::<Vec<_>>();

    debug!(
        items = sizes.len(),
        has_next = response.next_page_token.is_some(),
        "Received census page"
    );
    Ok(CensusPage {
        sizes,
        next_page_token: response.next_page_token,
    })
}

// ============================================================================
// Tests
// ============================================================================
