//! Domain entities and business logic
//!
//! This module contains the core domain types for DriveMirror:
//! - Newtypes for validated identifiers
//! - Remote items and their semantic MIME kinds
//! - Local naming (sanitizer, path bound, collision claims)
//! - The metadata ledger used for change detection
//! - Run report aggregation
//! - Domain-specific error types

pub mod errors;
pub mod item;
pub mod ledger;
pub mod mime;
pub mod naming;
pub mod newtypes;
pub mod report;

// Re-export commonly used types
pub use errors::DomainError;
pub use item::RemoteItem;
pub use ledger::{Ledger, LedgerRecord};
pub use mime::{normalize_extension, MimeKind, TransferPlan};
pub use naming::{sanitize_name, sanitize_name_with_limit, LocalPathBuilder, PathClaims};
pub use newtypes::*;
pub use report::{Census, DownloadedItem, RunReport, RunSummary};
