//! Ledger persistence port (driven/secondary port)

use crate::domain::Ledger;

/// Port trait for loading and saving the metadata ledger
///
/// ## Implementation Notes
///
/// - `load` returns an empty ledger when no prior state exists; a first run
///   is not an error.
/// - `save` must durably replace the prior state. A crash during `save` must
///   leave either the old or the new ledger, never a truncated one.
#[async_trait::async_trait]
pub trait ILedgerStore: Send + Sync {
    async fn load(&self) -> anyhow::Result<Ledger>;

    async fn save(&self, ledger: &Ledger) -> anyhow::Result<()>;
}
