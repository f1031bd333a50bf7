//! DriveMirror Core - Domain logic and business rules
//!
//! This crate contains the hexagonal architecture core with:
//! - **Domain entities** - `RemoteItem`, `MimeKind`, `Ledger`, `RunReport`
//! - **Naming** - Name sanitizer, bounded path builder, collision claims
//! - **Port definitions** - Traits for adapters: `IRemoteStore`, `ICredentialProvider`,
//!   `ILedgerStore`, `ILocalFileSystem`
//! - **Configuration** - YAML configuration with validation
//!
//! # Architecture
//!
//! This crate follows the hexagonal (ports & adapters) architecture pattern.
//! The domain module contains pure business logic with no I/O.
//! Ports define trait interfaces that adapter crates implement.

pub mod config;
pub mod domain;
pub mod ports;
