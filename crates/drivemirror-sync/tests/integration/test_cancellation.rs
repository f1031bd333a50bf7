//! Cancellation keeps committed work and leaves no partial files

use tokio_util::sync::CancellationToken;

use drivemirror_core::ports::ILedgerStore;
use drivemirror_sync::SyncError;

use crate::common::{file, id, Harness, ROOT_ID, T0};

#[tokio::test]
async fn test_cancelled_before_start() {
    let h = Harness::new();
    h.drive.folder(ROOT_ID, vec![file("never001", "never", "text/plain", T0)]);

    let token = CancellationToken::new();
    token.cancel();
    let err = h.engine().run(&token).await.unwrap_err();

    assert!(SyncError::is_cancellation(&err));
    assert!(h.drive.requests().is_empty());
    assert!(h.ledger_store().load().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_cancel_during_transfer() {
    let h = Harness::new();
    h.drive.folder(
        ROOT_ID,
        vec![
            file("first001", "first", "text/plain", T0),
            file("second01", "second", "text/plain", T0),
            file("third001", "third", "text/plain", T0),
        ],
    );
    let token = CancellationToken::new();
    h.drive.hang_on("second01", token.clone());

    let err = h.engine().run(&token).await.unwrap_err();

    assert!(SyncError::is_cancellation(&err));
    assert!(h.root().join("first.txt").is_file());
    assert!(!h.root().join("second.txt").exists());
    let leftovers = std::fs::read_dir(h.root())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|name| name.starts_with(".drivemirror-"))
        .count();
    assert_eq!(leftovers, 0);
    assert!(!h.drive.requests().iter().any(|r| r.contains("third001")));

    let ledger = h.ledger_store().load().await.unwrap();
    assert_eq!(ledger.len(), 1);
    assert!(ledger.get(&id("first001")).is_some());
}

#[tokio::test]
async fn test_census_honours_cancellation() {
    let h = Harness::new();
    h.drive.census(vec![vec![Some(1)]]);

    let token = CancellationToken::new();
    token.cancel();
    let err = h.engine().census(&token).await.unwrap_err();

    assert!(SyncError::is_cancellation(&err));
}
