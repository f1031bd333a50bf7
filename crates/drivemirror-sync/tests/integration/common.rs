//! Shared fixtures: an in-memory drive and a recording filesystem

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

use drivemirror_core::domain::{LocalPathBuilder, MimeKind, RemoteId, RemoteItem};
use drivemirror_core::ports::{
    ApiError, CensusPage, ILocalFileSystem, IRemoteStore, ListPage, RejectedEntry,
};
use drivemirror_sync::engine::SyncEngine;
use drivemirror_sync::filesystem::LocalFileSystemAdapter;
use drivemirror_sync::ledger_store::JsonLedgerStore;

pub const ROOT_ID: &str = "root0001";
pub const T0: &str = "2024-01-10T09:30:00.250Z";
pub const DOCX: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

pub fn id(s: &str) -> RemoteId {
    RemoteId::new(s.to_string()).unwrap()
}

pub fn at(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
}

pub fn file(item_id: &str, name: &str, mime: &str, modified: &str) -> RemoteItem {
    RemoteItem::new(id(item_id), name, MimeKind::parse(mime), at(modified), Some(1))
}

pub fn folder(item_id: &str, name: &str) -> RemoteItem {
    RemoteItem::new(id(item_id), name, MimeKind::Folder, at(T0), None)
}

pub fn shortcut(item_id: &str, name: &str) -> RemoteItem {
    RemoteItem::new(id(item_id), name, MimeKind::Shortcut, at(T0), None)
}

// ============================================================================
// FakeDrive
// ============================================================================

/// In-memory shared drive
///
/// Folders hold one or more listing pages. Every content request is logged
/// as `fetch:<id>` or `export:<id>:<format>`.
#[derive(Default)]
pub struct FakeDrive {
    pages: Mutex<HashMap<String, Vec<ListPage>>>,
    content: Mutex<HashMap<String, Vec<u8>>>,
    failures: Mutex<HashMap<String, ApiError>>,
    broken_folders: Mutex<Vec<String>>,
    census: Mutex<Vec<Vec<Option<u64>>>>,
    hang_on: Mutex<Option<(String, CancellationToken)>>,
    pub requests: Mutex<Vec<String>>,
}

impl FakeDrive {
    pub fn new() -> Self {
        Self::default()
    }

    /// Single-page folder listing
    pub fn folder(&self, folder_id: &str, items: Vec<RemoteItem>) {
        self.paged_folder(folder_id, vec![items]);
    }

    /// Multi-page folder listing, chained with page tokens
    pub fn paged_folder(&self, folder_id: &str, pages: Vec<Vec<RemoteItem>>) {
        let count = pages.len();
        let pages = pages
            .into_iter()
            .enumerate()
            .map(|(i, items)| ListPage {
                items,
                rejected: Vec::new(),
                next_page_token: (i + 1 < count).then(|| format!("{folder_id}-p{}", i + 1)),
            })
            .collect();
        self.pages.lock().unwrap().insert(folder_id.to_string(), pages);
    }

    /// Append a malformed entry to the first page of `folder_id`
    pub fn reject(&self, folder_id: &str, name: &str, mime_type: &str, reason: &str) {
        let mut pages = self.pages.lock().unwrap();
        let page = pages
            .entry(folder_id.to_string())
            .or_insert_with(|| vec![ListPage::default()]);
        page[0].rejected.push(RejectedEntry {
            name: name.to_string(),
            mime_type: mime_type.to_string(),
            reason: reason.to_string(),
        });
    }

    pub fn content(&self, item_id: &str, data: &[u8]) {
        self.content
            .lock()
            .unwrap()
            .insert(item_id.to_string(), data.to_vec());
    }

    pub fn fail(&self, item_id: &str, error: ApiError) {
        self.failures
            .lock()
            .unwrap()
            .insert(item_id.to_string(), error);
    }

    pub fn break_folder(&self, folder_id: &str) {
        self.broken_folders.lock().unwrap().push(folder_id.to_string());
    }

    pub fn census(&self, pages: Vec<Vec<Option<u64>>>) {
        *self.census.lock().unwrap() = pages;
    }

    /// Cancel `token` when `item_id` is requested and never answer
    pub fn hang_on(&self, item_id: &str, token: CancellationToken) {
        *self.hang_on.lock().unwrap() = Some((item_id.to_string(), token));
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn clear_requests(&self) {
        self.requests.lock().unwrap().clear();
    }

    async fn serve(&self, item_id: &RemoteId, request: String) -> anyhow::Result<Vec<u8>> {
        self.requests.lock().unwrap().push(request);

        let hang = self
            .hang_on
            .lock()
            .unwrap()
            .as_ref()
            .filter(|(hang_id, _)| hang_id == item_id.as_str())
            .map(|(_, token)| token.clone());
        if let Some(token) = hang {
            token.cancel();
            std::future::pending::<()>().await;
        }

        if let Some(err) = self.failures.lock().unwrap().get(item_id.as_str()) {
            return Err(err.clone().into());
        }
        Ok(self
            .content
            .lock()
            .unwrap()
            .get(item_id.as_str())
            .cloned()
            .unwrap_or_else(|| format!("content of {item_id}").into_bytes()))
    }
}

fn page_index(token: Option<&str>) -> usize {
    token
        .and_then(|t| t.rsplit("-p").next())
        .and_then(|n| n.parse().ok())
        .unwrap_or(0)
}

#[async_trait::async_trait]
impl IRemoteStore for FakeDrive {
    async fn list_children(
        &self,
        folder_id: &RemoteId,
        page_token: Option<&str>,
    ) -> anyhow::Result<ListPage> {
        self.requests
            .lock()
            .unwrap()
            .push(format!("list:{folder_id}:{}", page_token.unwrap_or("-")));

        if self.broken_folders.lock().unwrap().contains(&folder_id.to_string()) {
            return Err(ApiError::new(500, None, "Internal Server Error").into());
        }

        let pages = self.pages.lock().unwrap();
        Ok(pages
            .get(folder_id.as_str())
            .and_then(|p| p.get(page_index(page_token)))
            .cloned()
            .unwrap_or_default())
    }

    async fn fetch_content(&self, item_id: &RemoteId) -> anyhow::Result<Vec<u8>> {
        self.serve(item_id, format!("fetch:{item_id}")).await
    }

    async fn export_content(&self, item_id: &RemoteId, format: &str) -> anyhow::Result<Vec<u8>> {
        self.serve(item_id, format!("export:{item_id}:{format}")).await
    }

    async fn census_page(&self, page_token: Option<&str>) -> anyhow::Result<CensusPage> {
        let pages = self.census.lock().unwrap();
        let index = page_token.and_then(|t| t.parse::<usize>().ok()).unwrap_or(0);
        Ok(CensusPage {
            sizes: pages.get(index).cloned().unwrap_or_default(),
            next_page_token: (index + 1 < pages.len()).then(|| (index + 1).to_string()),
        })
    }
}

// ============================================================================
// RecordingFs
// ============================================================================

/// Real filesystem that logs `mkdir:<rel>` and `write:<rel>` operations
pub struct RecordingFs {
    inner: LocalFileSystemAdapter,
    root: PathBuf,
    pub ops: Mutex<Vec<String>>,
}

impl RecordingFs {
    pub fn new(root: &Path) -> Self {
        Self {
            inner: LocalFileSystemAdapter::new(),
            root: root.to_path_buf(),
            ops: Mutex::new(Vec::new()),
        }
    }

    fn log(&self, op: &str, path: &Path) {
        let rel = path.strip_prefix(&self.root).unwrap_or(path);
        self.ops
            .lock()
            .unwrap()
            .push(format!("{op}:{}", rel.display()));
    }

    pub fn ops(&self) -> Vec<String> {
        self.ops.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ILocalFileSystem for RecordingFs {
    async fn write_file_atomic(&self, path: &Path, data: &[u8]) -> anyhow::Result<u64> {
        self.log("write", path);
        self.inner.write_file_atomic(path, data).await
    }

    async fn create_directory(&self, path: &Path) -> anyhow::Result<()> {
        self.log("mkdir", path);
        self.inner.create_directory(path).await
    }

    async fn modified_time(&self, path: &Path) -> anyhow::Result<Option<DateTime<Utc>>> {
        self.inner.modified_time(path).await
    }

    async fn set_modified_time(&self, path: &Path, time: DateTime<Utc>) -> anyhow::Result<()> {
        self.inner.set_modified_time(path, time).await
    }
}

// ============================================================================
// Harness
// ============================================================================

/// A drive, a temp mirror root and a ledger file, wired into an engine
pub struct Harness {
    pub drive: Arc<FakeDrive>,
    pub fs: Arc<RecordingFs>,
    pub dir: TempDir,
}

impl Harness {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let fs = Arc::new(RecordingFs::new(&dir.path().join("mirror")));
        Self {
            drive: Arc::new(FakeDrive::new()),
            fs,
            dir,
        }
    }

    pub fn root(&self) -> PathBuf {
        self.dir.path().join("mirror")
    }

    pub fn ledger_store(&self) -> JsonLedgerStore {
        JsonLedgerStore::new(self.dir.path().join("metadata/file_metadata.json"))
    }

    pub fn engine(&self) -> SyncEngine {
        self.engine_with_paths(LocalPathBuilder::new(self.root()))
    }

    pub fn engine_with_paths(&self, paths: LocalPathBuilder) -> SyncEngine {
        SyncEngine::new(
            self.drive.clone(),
            self.fs.clone(),
            Arc::new(self.ledger_store()),
            paths,
            id(ROOT_ID),
        )
    }
}
