//! Sync command - Mirror the shared drive to local disk
//!
//! Provides the `drivemirror sync` CLI command which:
//! 1. Loads and validates the configuration
//! 2. Creates the adapters (Drive API, filesystem, JSON ledger)
//! 3. Runs the SyncEngine until done, Ctrl-C or the `--timeout` deadline
//! 4. Saves the run report and echoes it to the console

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use drivemirror_core::config::{expand_home, Config};
use drivemirror_core::domain::{LocalPathBuilder, RemoteId};
use drivemirror_core::ports::ApiError;
use drivemirror_sync::engine::SyncEngine;
use drivemirror_sync::filesystem::LocalFileSystemAdapter;
use drivemirror_sync::ledger_store::JsonLedgerStore;
use drivemirror_sync::report::ReportWriter;
use drivemirror_sync::SyncError;

use super::{remote_store, CommandContext};

#[derive(Debug, Args)]
pub struct SyncCommand {
    /// Stop the run after this many seconds, keeping completed transfers
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,
}

impl SyncCommand {
    pub async fn execute(&self, ctx: &CommandContext) -> Result<()> {
        let formatter = ctx.formatter();
        let config = ctx.validated_config()?;

        let engine = build_engine(&config)?;
        let reports = ReportWriter::new(expand_home(&config.reports.dir));

        let cancel = CancellationToken::new();
        spawn_ctrl_c(cancel.clone());
        if let Some(secs) = self.timeout {
            spawn_deadline(cancel.clone(), Duration::from_secs(secs));
        }

        formatter.info(&format!("Mirroring into {}", engine.root().display()));

        let summary = match engine.run(&cancel).await {
            Ok(summary) => summary,
            Err(e) => {
                if SyncError::is_cancellation(&e) {
                    formatter.warn("Run cancelled; completed transfers were kept");
                } else if e
                    .downcast_ref::<ApiError>()
                    .is_some_and(ApiError::is_auth_failure)
                {
                    formatter.error("The Drive API rejected the credentials");
                    formatter.info("Run 'drivemirror auth import <file>' or set auth.access_token");
                }
                return Err(e);
            }
        };

        let report_path = reports.write(&summary).await?;

        if ctx.is_json() {
            let mut json = serde_json::to_value(&summary).context("Failed to serialize summary")?;
            json["report_path"] = serde_json::Value::String(report_path.display().to_string());
            formatter.print_json(&json);
        } else {
            for line in summary.render_lines() {
                formatter.line(&line);
            }
            formatter.line("");
            formatter.success(&format!("Report saved to {}", report_path.display()));
        }

        if summary.error_count > 0 {
            warn!(errors = summary.error_count, "Run finished with errors");
        }
        Ok(())
    }
}

fn build_engine(config: &Config) -> Result<SyncEngine> {
    let remote = Arc::new(remote_store(config)?);

    let start = config
        .sync
        .start_folder()
        .context("sync.drive_id is not set")?;
    let root_folder = RemoteId::new(start.to_string()).context("Invalid start folder id")?;

    let paths = LocalPathBuilder::new(expand_home(&config.sync.root)).with_limits(
        config.sync.max_name_length,
        config.sync.max_path_length,
        config.sync.component_limit,
    );
    let ledger = JsonLedgerStore::new(expand_home(&config.ledger.path));

    Ok(SyncEngine::new(
        remote,
        Arc::new(LocalFileSystemAdapter::new()),
        Arc::new(ledger),
        paths,
        root_folder,
    ))
}

pub(crate) fn spawn_ctrl_c(token: CancellationToken) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received SIGINT (Ctrl+C)");
                token.cancel();
            }
            Err(e) => warn!(error = %e, "Failed to install Ctrl+C handler"),
        }
    });
}

fn spawn_deadline(token: CancellationToken, after: Duration) {
    tokio::spawn(async move {
        tokio::select! {
            _ = tokio::time::sleep(after) => {
                info!(secs = after.as_secs(), "Run deadline reached");
                token.cancel();
            }
            _ = token.cancelled() => {}
        }
    });
}
