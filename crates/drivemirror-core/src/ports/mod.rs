//! Port definitions (hexagonal architecture interfaces)
//!
//! This module defines the port traits that form the boundaries of the
//! hexagonal architecture. Ports are interfaces that the domain core
//! depends on, but whose implementations live in adapter crates.
//!
//! ## Ports Overview
//!
//! - [`IRemoteStore`] - Read-only access to the remote drive (Google Drive)
//! - [`ICredentialProvider`] - Bearer tokens for the remote API
//! - [`ILedgerStore`] - Persistence of the metadata ledger
//! - [`ILocalFileSystem`] - Writing the local mirror

pub mod credentials;
pub mod ledger_store;
pub mod local_filesystem;
pub mod remote_store;

pub use credentials::{ICredentialProvider, Tokens};
pub use ledger_store::ILedgerStore;
pub use local_filesystem::ILocalFileSystem;
pub use remote_store::{ApiError, CensusPage, IRemoteStore, ListPage, RejectedEntry};
