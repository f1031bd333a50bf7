//! Integration tests for drivemirror-sync
//!
//! Runs the engine against an in-memory drive and a temporary directory.

mod common;
mod test_cancellation;
mod test_failures;
mod test_mirror;
