//! Change detection against the metadata ledger
//!
//! Only the remote modification time is compared. Content hashes and sizes
//! are not consulted; an item whose timestamp equals the recorded one is
//! considered unchanged.

use drivemirror_core::domain::{Ledger, RemoteItem, TransferPlan};

/// Outcome of [`detect`] for one listed item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeDecision {
    /// Folder: create the local directory and descend
    Recurse,
    /// Shortcut: skip silently
    Ignore,
    /// New or modified file
    Transfer,
    /// File recorded with the same modification time
    Unchanged,
}

/// Decide what the traversal should do with `item`
pub fn detect(item: &RemoteItem, ledger: &Ledger) -> ChangeDecision {
    match item.mime.plan() {
        TransferPlan::Recurse => ChangeDecision::Recurse,
        TransferPlan::Ignore => ChangeDecision::Ignore,
        TransferPlan::Fetch | TransferPlan::Export(_) => match ledger.get(&item.id) {
            Some(record) if record.modified_time == item.modified_time => {
                ChangeDecision::Unchanged
            }
            _ => ChangeDecision::Transfer,
        },
    }
}
