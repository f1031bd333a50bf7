//! Ledger command - Show metadata ledger statistics

use anyhow::{Context, Result};
use clap::Args;

use drivemirror_core::config::expand_home;
use drivemirror_core::domain::Ledger;
use drivemirror_core::ports::ILedgerStore;
use drivemirror_sync::ledger_store::JsonLedgerStore;

use super::CommandContext;
use crate::output::format_bytes;

#[derive(Debug, Args)]
pub struct LedgerCommand {
    /// Also list every record
    #[arg(long)]
    pub list: bool,
}

/// Record count per source MIME type, most common first
fn mime_breakdown(ledger: &Ledger) -> Vec<(String, usize)> {
    let mut counts = std::collections::BTreeMap::<&str, usize>::new();
    for (_, record) in ledger.iter() {
        *counts.entry(record.mime_type.as_str()).or_default() += 1;
    }
    let mut breakdown: Vec<_> = counts
        .into_iter()
        .map(|(mime, n)| (mime.to_string(), n))
        .collect();
    breakdown.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    breakdown
}

impl LedgerCommand {
    pub async fn execute(&self, ctx: &CommandContext) -> Result<()> {
        let formatter = ctx.formatter();
        let config = ctx.config()?;
        let store = JsonLedgerStore::new(expand_home(&config.ledger.path));

        let ledger = store.load().await.context("Failed to read ledger")?;
        let breakdown = mime_breakdown(&ledger);

        if ctx.is_json() {
            let mut json = serde_json::json!({
                "path": store.path().display().to_string(),
                "records": ledger.len(),
                "total_bytes": ledger.total_bytes(),
                "by_mime_type": breakdown
                    .iter()
                    .map(|(mime, n)| serde_json::json!({"mime_type": mime, "records": n}))
                    .collect::<Vec<_>>(),
            });
            if self.list {
                json["entries"] =
                    serde_json::to_value(&ledger).context("Failed to serialize ledger")?;
            }
            formatter.print_json(&json);
            return Ok(());
        }

        formatter.success(&format!("Ledger ({})", store.path().display()));
        formatter.info(&format!("Records: {}", ledger.len()));
        formatter.info(&format!("Size:    {}", format_bytes(ledger.total_bytes())));
        for (mime, n) in &breakdown {
            formatter.info(&format!("  {n:>6}  {mime}"));
        }

        if self.list {
            formatter.info("");
            for (id, record) in ledger.iter() {
                let local = record
                    .local_path
                    .as_deref()
                    .map(|p| format!("  -> {}", p.display()))
                    .unwrap_or_default();
                formatter.info(&format!(
                    "{}  {}  {:>10}  {}{}",
                    id,
                    record.modified_time.to_rfc3339(),
                    record.size,
                    record.name,
                    local
                ));
            }
        }
        Ok(())
    }
}
