//! Transfer of one remote file into the local mirror
//!
//! A transfer resolves the local path, skips when the local file already
//! carries the remote modification time, otherwise downloads (or exports)
//! the content, writes it atomically and stamps it with the remote mtime.
//! Only a completed write is recorded in the ledger, together with the local
//! path it went to.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use drivemirror_core::domain::{
    DownloadedItem, LedgerRecord, LocalPathBuilder, PathClaims, RemoteItem, TransferPlan,
};
use drivemirror_core::ports::{ApiError, ILocalFileSystem, IRemoteStore};

use crate::engine::RunContext;
use crate::SyncError;

/// Local mtimes within this distance of the remote time count as current
const MTIME_TOLERANCE_MS: i64 = 1000;

/// Result of a successful [`TransferExecutor::execute`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transfer {
    /// Content written to disk
    Downloaded(DownloadedItem),
    /// Local file already matches; nothing fetched
    UpToDate,
}

/// Executes transfers against a remote store and the local filesystem
pub struct TransferExecutor {
    remote: Arc<dyn IRemoteStore>,
    local: Arc<dyn ILocalFileSystem>,
    paths: LocalPathBuilder,
}

impl TransferExecutor {
    pub fn new(
        remote: Arc<dyn IRemoteStore>,
        local: Arc<dyn ILocalFileSystem>,
        paths: LocalPathBuilder,
    ) -> Self {
        Self {
            remote,
            local,
            paths,
        }
    }

    pub fn paths(&self) -> &LocalPathBuilder {
        &self.paths
    }

    /// Assign a local file path to every file among `items` below `parent`
    ///
    /// Folders and shortcuts get `None`. Paths recorded in the ledger are
    /// reserved first, as long as the item's name still maps to them, so an
    /// item that received a collision suffix keeps it whether or not it
    /// changed. The remaining files then claim their natural path in listing
    /// order.
    pub fn claim_targets(
        &self,
        parent: &Path,
        items: &[RemoteItem],
        ctx: &mut RunContext,
    ) -> Vec<Option<PathBuf>> {
        let natural: Vec<Option<PathBuf>> = items
            .iter()
            .map(|item| match item.mime.plan() {
                TransferPlan::Recurse | TransferPlan::Ignore => None,
                TransferPlan::Fetch | TransferPlan::Export(_) => {
                    Some(self.paths.file_path(parent, item))
                }
            })
            .collect();

        let mut targets = vec![None; items.len()];

        for (i, item) in items.iter().enumerate() {
            let Some(natural) = &natural[i] else { continue };
            let Some(recorded) = ctx.ledger.get(&item.id).and_then(|r| r.local_path.as_ref())
            else {
                continue;
            };

            let recorded = self.paths.root().join(recorded);
            let still_mapped =
                &recorded == natural || recorded == PathClaims::disambiguate(natural, &item.id);
            if still_mapped && ctx.claims.reserve(recorded.clone(), &item.id) {
                targets[i] = Some(recorded);
            }
        }

        for (i, item) in items.iter().enumerate() {
            if targets[i].is_some() {
                continue;
            }
            if let Some(natural) = natural[i].clone() {
                targets[i] = Some(ctx.claims.claim(natural, &item.id));
            }
        }

        targets
    }

    /// Bring `item` up to date at `target`, a path from [`claim_targets`]
    ///
    /// On success the ledger and the downloaded list in `ctx` are updated.
    /// On error neither is touched and no file is left under the target
    /// name; cancellation surfaces as [`SyncError::Cancelled`].
    ///
    /// [`claim_targets`]: Self::claim_targets
    pub async fn execute(
        &self,
        item: &RemoteItem,
        target: &Path,
        ctx: &mut RunContext,
        cancel: &CancellationToken,
    ) -> Result<Transfer> {
        if let Some(local_time) = self.local.modified_time(target).await? {
            if within_tolerance(local_time, item.modified_time) {
                debug!(id = %item.id, path = %target.display(), "Local file already current");
                return Ok(Transfer::UpToDate);
            }
        }

        let download = async {
            match item.mime.plan() {
                TransferPlan::Export(format) => {
                    self.remote.export_content(&item.id, format).await
                }
                _ => self.remote.fetch_content(&item.id).await,
            }
        };

        let data = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(SyncError::Cancelled.into()),
            data = download => data?,
        };

        let byte_size = self
            .local
            .write_file_atomic(target, &data)
            .await
            .with_context(|| format!("Failed to write {}", target.display()))?;
        self.local
            .set_modified_time(target, item.modified_time)
            .await
            .with_context(|| format!("Failed to set modification time on {}", target.display()))?;

        ctx.ledger.record(
            item.id.clone(),
            LedgerRecord {
                name: item.name.clone(),
                mime_type: item.mime.as_mime().to_string(),
                modified_time: item.modified_time,
                size: byte_size,
                local_path: target
                    .strip_prefix(self.paths.root())
                    .ok()
                    .map(Path::to_path_buf),
            },
        );

        let downloaded = DownloadedItem {
            id: item.id.clone(),
            name: item.name.clone(),
            byte_size,
        };
        ctx.report.add_downloaded(downloaded.clone());

        debug!(id = %item.id, path = %target.display(), bytes = byte_size, "Transferred");
        Ok(Transfer::Downloaded(downloaded))
    }
}

fn within_tolerance(local: DateTime<Utc>, remote: DateTime<Utc>) -> bool {
    (local - remote).num_milliseconds().abs() <= MTIME_TOLERANCE_MS
}

/// Report line for a failed transfer of `item`
pub fn failure_message(item: &RemoteItem, err: &anyhow::Error) -> String {
    match err.downcast_ref::<ApiError>() {
        Some(api) if api.has_reason(ApiError::EXPORT_SIZE_LIMIT_EXCEEDED) => format!(
            "Cannot export file '{}' because it exceeds the export size limit.",
            item.name
        ),
        Some(api) if api.has_reason(ApiError::BAD_REQUEST) => format!(
            "Cannot export file '{}' due to unsupported conversion.",
            item.name
        ),
        _ => format!(
            "Failed to process '{}' (MIME: {}). Error: {err:#}",
            item.name, item.mime
        ),
    }
}
