//! JSON ledger persistence
//!
//! The ledger is a single pretty-printed JSON object keyed by remote id.
//! Saves go through a temporary sibling and a rename, so a crash leaves
//! either the previous ledger or the new one on disk.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::Result;
use drivemirror_core::domain::Ledger;
use drivemirror_core::ports::ILedgerStore;
use tracing::{debug, info};

use crate::filesystem::write_atomic;
use crate::SyncError;

/// [`ILedgerStore`] backed by a JSON file
#[derive(Debug, Clone)]
pub struct JsonLedgerStore {
    path: PathBuf,
}

impl JsonLedgerStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn ledger_error(&self, message: impl ToString) -> SyncError {
        SyncError::Ledger {
            path: self.path.clone(),
            message: message.to_string(),
        }
    }
}

#[async_trait::async_trait]
impl ILedgerStore for JsonLedgerStore {
    async fn load(&self) -> Result<Ledger> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(path = %self.path.display(), "No ledger yet, starting empty");
                return Ok(Ledger::new());
            }
            Err(e) => return Err(SyncError::Io(e).into()),
        };

        let ledger: Ledger = serde_json::from_str(&raw).map_err(|e| self.ledger_error(e))?;
        debug!(path = %self.path.display(), records = ledger.len(), "Ledger loaded");
        Ok(ledger)
    }

    async fn save(&self, ledger: &Ledger) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(SyncError::Io)?;
        }

        let json = serde_json::to_string_pretty(ledger).map_err(|e| self.ledger_error(e))?;

        write_atomic(&self.path, json.as_bytes())
            .await
            .map_err(|e| self.ledger_error(format!("write: {e}")))?;

        info!(path = %self.path.display(), records = ledger.len(), "Ledger saved");
        Ok(())
    }
}
