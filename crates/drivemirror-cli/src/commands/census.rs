//! Census command - Count items on the shared drive
//!
//! Runs only the census part of a mirror run: every non-trashed item of the
//! drive, folders included, with the sum of the reported sizes.

use anyhow::Result;
use clap::Args;
use tokio_util::sync::CancellationToken;

use drivemirror_sync::engine::run_census;

use super::sync::spawn_ctrl_c;
use super::{remote_store, CommandContext};
use crate::output::format_bytes;

#[derive(Debug, Args)]
pub struct CensusCommand {}

impl CensusCommand {
    pub async fn execute(&self, ctx: &CommandContext) -> Result<()> {
        let formatter = ctx.formatter();
        let config = ctx.validated_config()?;
        let remote = remote_store(&config)?;

        let cancel = CancellationToken::new();
        spawn_ctrl_c(cancel.clone());

        let census = run_census(&remote, &cancel).await?;

        if ctx.is_json() {
            formatter.print_json(&serde_json::json!({
                "drive_id": remote.drive_id().to_string(),
                "total_items": census.total_items,
                "total_bytes": census.total_bytes,
            }));
        } else {
            formatter.success(&format!("Shared drive {}", remote.drive_id()));
            formatter.info(&format!("Items: {}", census.total_items));
            formatter.info(&format!(
                "Size:  {} ({} bytes)",
                format_bytes(census.total_bytes),
                census.total_bytes
            ));
        }
        Ok(())
    }
}
