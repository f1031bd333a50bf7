//! Shared test helpers for Drive API integration tests
//!
//! Provides a wiremock-based mock server and a [`DriveRemoteStore`] pointing
//! at it. Backoff delays are shrunk so throttling tests run quickly.

use std::sync::Arc;
use std::time::Duration;

use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

use drivemirror_core::domain::RemoteId;
use drivemirror_gdrive::auth::StaticTokenProvider;
use drivemirror_gdrive::client::DriveClient;
use drivemirror_gdrive::provider::DriveRemoteStore;

pub const DRIVE_ID: &str = "0ADriveTest001";
pub const TOKEN: &str = "test-access-token";

pub fn id(s: &str) -> RemoteId {
    RemoteId::new(s.to_string()).unwrap()
}

/// Client against `server` with a static token and millisecond backoff
pub fn client(server: &MockServer) -> DriveClient {
    DriveClient::with_base_url(Arc::new(StaticTokenProvider::new(TOKEN)), server.uri())
        .with_max_retries(3)
        .with_initial_backoff(Duration::from_millis(5))
}

/// Starts a mock server and returns it with a store for [`DRIVE_ID`]
pub async fn setup_drive_mock() -> (MockServer, DriveRemoteStore) {
    let server = MockServer::start().await;
    let store = DriveRemoteStore::new(client(&server), id(DRIVE_ID));
    (server, store)
}

/// A Drive error envelope with a single reason
pub fn error_body(code: u16, reason: &str, message: &str) -> serde_json::Value {
    serde_json::json!({
        "error": {
            "code": code,
            "message": message,
            "errors": [{ "domain": "global", "reason": reason, "message": message }]
        }
    })
}

/// Mounts one listing page for `folder_id`
///
/// `page_token` selects which request the page answers (None for the first).
pub async fn mount_listing_page(
    server: &MockServer,
    folder_id: &str,
    page_token: Option<&str>,
    files: serde_json::Value,
    next_page_token: Option<&str>,
) {
    let mut body = serde_json::json!({ "files": files });
    if let Some(next) = next_page_token {
        body["nextPageToken"] = serde_json::Value::String(next.to_string());
    }

    let mock = Mock::given(method("GET"))
        .and(path("/files"))
        .and(query_param(
            "q",
            format!("'{folder_id}' in parents and trashed=false").as_str(),
        ));

    let mock = match page_token {
        Some(token) => mock.and(query_param("pageToken", token)),
        None => mock.and(query_param_is_missing("pageToken")),
    };

    mock.respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// Mounts a media download for `item_id`
pub async fn mount_media(server: &MockServer, item_id: &str, content: &[u8]) {
    Mock::given(method("GET"))
        .and(path(format!("/files/{item_id}").as_str()))
        .and(query_param("alt", "media"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(content.to_vec()))
        .mount(server)
        .await;
}
