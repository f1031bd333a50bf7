//! Mirror traversal engine
//!
//! The [`SyncEngine`] mirrors one shared drive folder tree to local disk.
//!
//! ## Run Flow
//!
//! 1. **Load**: Read the metadata ledger (empty on first run)
//! 2. **Traverse**: For each folder, drain every listing page, then walk the
//!    items in listing order, descending depth-first into subfolders
//! 3. **Persist**: Save the ledger (also when the traversal failed or was
//!    cancelled, so committed transfers are not repeated)
//! 4. **Census**: Count every non-trashed item of the drive and combine the
//!    totals with the run report into a [`RunSummary`]
//!
//! ## Failure Policy
//!
//! A failed transfer becomes one report line and one warning; its siblings
//! carry on and the ledger is left untouched so the next run retries it.
//! A failed listing ends the run.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Local;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use drivemirror_core::domain::{
    Census, Ledger, LocalPathBuilder, PathClaims, RemoteId, RunReport, RunSummary,
};
use drivemirror_core::ports::{ILedgerStore, ILocalFileSystem, IRemoteStore, ListPage};

use crate::detector::{detect, ChangeDecision};
use crate::transfer::{failure_message, Transfer, TransferExecutor};
use crate::SyncError;

// ============================================================================
// RunContext
// ============================================================================

/// Mutable state of a single run, threaded through the traversal by `&mut`
#[derive(Debug, Default)]
pub struct RunContext {
    pub ledger: Ledger,
    pub report: RunReport,
    /// Local file paths handed out so far, with their owning remote ids
    pub claims: PathClaims,
}

impl RunContext {
    pub fn new(ledger: Ledger) -> Self {
        Self {
            ledger,
            ..Self::default()
        }
    }
}

type FolderFuture<'a> = Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;

// ============================================================================
// SyncEngine
// ============================================================================

/// Mirrors a remote folder tree into a local directory
pub struct SyncEngine {
    remote: Arc<dyn IRemoteStore>,
    local: Arc<dyn ILocalFileSystem>,
    ledger_store: Arc<dyn ILedgerStore>,
    transfers: TransferExecutor,
    root_folder: RemoteId,
}

impl SyncEngine {
    /// Create a new SyncEngine
    ///
    /// # Arguments
    /// * `remote` - Listing and content access for the shared drive
    /// * `local` - Filesystem the mirror is written to
    /// * `ledger_store` - Persistence for the metadata ledger
    /// * `paths` - Local path builder rooted at the mirror directory
    /// * `root_folder` - Remote folder mirrored into the root directory
    pub fn new(
        remote: Arc<dyn IRemoteStore>,
        local: Arc<dyn ILocalFileSystem>,
        ledger_store: Arc<dyn ILedgerStore>,
        paths: LocalPathBuilder,
        root_folder: RemoteId,
    ) -> Self {
        let transfers = TransferExecutor::new(Arc::clone(&remote), Arc::clone(&local), paths);
        Self {
            remote,
            local,
            ledger_store,
            transfers,
            root_folder,
        }
    }

    pub fn root(&self) -> &Path {
        self.transfers.paths().root()
    }

    /// Perform a full mirror run
    ///
    /// # Errors
    /// Returns [`SyncError::Cancelled`] when `cancel` fires, and the
    /// underlying error when a listing, the ledger or the census fails. The
    /// ledger of committed transfers is saved in every case where it was
    /// loaded.
    #[tracing::instrument(skip(self, cancel), fields(root = %self.root().display(), folder = %self.root_folder))]
    pub async fn run(&self, cancel: &CancellationToken) -> Result<RunSummary> {
        let ledger = self
            .ledger_store
            .load()
            .await
            .context("Failed to load metadata ledger")?;
        info!(records = ledger.len(), "Starting mirror run");

        let mut ctx = RunContext::new(ledger);
        let root = self.root().to_path_buf();

        let traversal = match self.local.create_directory(&root).await {
            Ok(()) => {
                self.mirror_folder(&self.root_folder, root, &mut ctx, cancel)
                    .await
            }
            Err(e) => Err(e.context(format!("Failed to create mirror root {}", root.display()))),
        };

        let saved = self
            .ledger_store
            .save(&ctx.ledger)
            .await
            .context("Failed to save metadata ledger");

        if let Err(e) = traversal {
            if SyncError::is_cancellation(&e) {
                warn!(
                    downloaded = ctx.report.downloaded.len(),
                    "Run cancelled; committed transfers kept"
                );
            } else {
                error!(error = %format!("{e:#}"), "Mirror run aborted");
            }
            if let Err(save_err) = saved {
                error!(error = %format!("{save_err:#}"), "Ledger not saved after abort");
            }
            return Err(e);
        }
        saved?;

        info!(
            downloaded = ctx.report.downloaded.len(),
            bytes = ctx.report.downloaded_bytes(),
            errors = ctx.report.errors.len(),
            "Traversal complete"
        );

        let census = self.census(cancel).await?;
        Ok(RunSummary::new(ctx.report, census, Local::now()))
    }

    /// Count every non-trashed item of the drive and sum their sizes
    pub async fn census(&self, cancel: &CancellationToken) -> Result<Census> {
        run_census(self.remote.as_ref(), cancel).await
    }

    /// Mirror `folder_id` into `local_dir`, recursing into subfolders
    fn mirror_folder<'a>(
        &'a self,
        folder_id: &'a RemoteId,
        local_dir: PathBuf,
        ctx: &'a mut RunContext,
        cancel: &'a CancellationToken,
    ) -> FolderFuture<'a> {
        Box::pin(async move {
            let listing = self.list_folder(folder_id, cancel).await?;
            debug!(
                folder = %folder_id,
                path = %local_dir.display(),
                items = listing.items.len(),
                "Processing folder"
            );

            for rejected in &listing.rejected {
                let message = format!(
                    "Failed to process '{}' (MIME: {}). Error: {}",
                    rejected.name, rejected.mime_type, rejected.reason
                );
                warn!(folder = %folder_id, "{message}");
                ctx.report.add_error(message);
            }

            // Every file claims its path, unchanged ones included, so a
            // changed sibling can never take over a path already on disk.
            let targets = self
                .transfers
                .claim_targets(&local_dir, &listing.items, ctx);

            for (item, target) in listing.items.iter().zip(targets) {
                if cancel.is_cancelled() {
                    return Err(SyncError::Cancelled.into());
                }

                match detect(item, &ctx.ledger) {
                    ChangeDecision::Recurse => {
                        let dir = self.transfers.paths().folder_path(&local_dir, item);
                        if let Err(e) = self.local.create_directory(&dir).await {
                            let message = failure_message(item, &e);
                            warn!(id = %item.id, path = %dir.display(), "{message}");
                            ctx.report.add_error(message);
                            continue;
                        }
                        self.mirror_folder(&item.id, dir, ctx, cancel).await?;
                    }
                    ChangeDecision::Ignore => {
                        debug!(id = %item.id, name = %item.name, "Skipping shortcut");
                    }
                    ChangeDecision::Unchanged => {
                        debug!(id = %item.id, name = %item.name, "Unchanged since last run");
                    }
                    ChangeDecision::Transfer => {
                        // Files always have a target
                        let Some(target) = target else { continue };
                        match self.transfers.execute(item, &target, ctx, cancel).await {
                            Ok(Transfer::Downloaded(d)) => {
                                info!(id = %item.id, name = %item.name, bytes = d.byte_size, "Downloaded");
                            }
                            Ok(Transfer::UpToDate) => {}
                            Err(e) if SyncError::is_cancellation(&e) => return Err(e),
                            Err(e) => {
                                let message = failure_message(item, &e);
                                warn!(id = %item.id, "{message}");
                                ctx.report.add_error(message);
                            }
                        }
                    }
                }
            }

            Ok(())
        })
    }

    /// Fetch every listing page of `folder_id`
    async fn list_folder(
        &self,
        folder_id: &RemoteId,
        cancel: &CancellationToken,
    ) -> Result<ListPage> {
        let mut listing = ListPage::default();
        let mut page_token: Option<String> = None;

        loop {
            let page = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(SyncError::Cancelled.into()),
                page = self.remote.list_children(folder_id, page_token.as_deref()) => {
                    page.with_context(|| SyncError::Listing(folder_id.to_string()))?
                }
            };

            listing.items.extend(page.items);
            listing.rejected.extend(page.rejected);
            match page.next_page_token {
                Some(next) => page_token = Some(next),
                None => break,
            }
        }

        Ok(listing)
    }
}

// ============================================================================
// Census
// ============================================================================

/// Drain the census pages of `remote` into totals
#[tracing::instrument(skip(remote, cancel))]
pub async fn run_census(remote: &dyn IRemoteStore, cancel: &CancellationToken) -> Result<Census> {
    let mut census = Census::default();
    let mut page_token: Option<String> = None;

    loop {
        let page = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(SyncError::Cancelled.into()),
            page = remote.census_page(page_token.as_deref()) => {
                page.context("Failed to count drive items")?
            }
        };

        census.add_page(&page.sizes);
        match page.next_page_token {
            Some(next) => page_token = Some(next),
            None => break,
        }
    }

    info!(
        items = census.total_items,
        bytes = census.total_bytes,
        "Census complete"
    );
    Ok(census)
}
