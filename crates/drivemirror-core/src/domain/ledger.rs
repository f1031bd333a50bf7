//! Metadata ledger
//!
//! The ledger remembers, per remote id, what was last written to local disk.
//! It is the primary input to change detection.
//!
//! ## Design Notes
//!
//! - A record exists for an id only once that item's content has been
//!   written successfully. Skips and failures never touch the ledger.
//! - Records are kept in a `BTreeMap` so the persisted JSON has sorted keys
//!   and diffs cleanly between runs.
//! - The serialized shape is `{ "<id>": { "name", "mimeType", "modifiedTime",
//!   "size", "localPath" } }`. `localPath` is missing in ledgers written
//!   before paths were recorded.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::newtypes::RemoteId;

/// Metadata of one item as of its last successful write
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerRecord {
    /// Remote name at the time of the write
    pub name: String,
    /// Remote MIME type (the source type, not the export format)
    pub mime_type: String,
    /// Remote modification time that was written
    pub modified_time: DateTime<Utc>,
    /// Size of the written local file in bytes
    pub size: u64,
    /// Path the content was written to, relative to the mirror root
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_path: Option<PathBuf>,
}

/// All ledger records, keyed by remote id
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ledger {
    records: BTreeMap<RemoteId, LedgerRecord>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &RemoteId) -> Option<&LedgerRecord> {
        self.records.get(id)
    }

    /// Insert or overwrite the record for `id`
    pub fn record(&mut self, id: RemoteId, record: LedgerRecord) {
        self.records.insert(id, record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Sum of recorded on-disk sizes
    pub fn total_bytes(&self) -> u64 {
        self.records.values().map(|r| r.size).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&RemoteId, &LedgerRecord)> {
        self.records.iter()
    }
}
