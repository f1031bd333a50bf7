//! Per-item failures and fatal listing errors

use tokio_util::sync::CancellationToken;

use drivemirror_core::ports::{ApiError, ILedgerStore};
use drivemirror_sync::SyncError;

use crate::common::{file, folder, id, Harness, ROOT_ID, T0};

const GDOC: &str = "application/vnd.google-apps.document";

#[tokio::test]
async fn test_failed_export_does_not_stop_siblings() {
    let h = Harness::new();
    h.drive.folder(
        ROOT_ID,
        vec![
            file("item0001", "One", GDOC, T0),
            file("item0002", "Two", GDOC, T0),
            file("item0003", "Three", "application/pdf", T0),
        ],
    );
    h.drive.fail(
        "item0002",
        ApiError::new(
            403,
            Some(ApiError::EXPORT_SIZE_LIMIT_EXCEEDED.to_string()),
            "This file is too large to be exported.",
        ),
    );

    let summary = h.engine().run(&CancellationToken::new()).await.unwrap();

    let names: Vec<_> = summary
        .report
        .downloaded
        .iter()
        .map(|d| d.name.as_str())
        .collect();
    assert_eq!(names, vec!["One", "Three"]);
    assert_eq!(
        summary.report.errors,
        vec!["Cannot export file 'Two' because it exceeds the export size limit."]
    );
    assert!(!h.root().join("Two.docx").exists());

    let ledger = h.ledger_store().load().await.unwrap();
    assert!(ledger.get(&id("item0002")).is_none());
    assert_eq!(ledger.len(), 2);

    // The failed item is retried on the next run, and only that one
    h.drive.clear_requests();
    let retry = h.engine().run(&CancellationToken::new()).await.unwrap();
    let transfers: Vec<_> = h
        .drive
        .requests()
        .into_iter()
        .filter(|r| !r.starts_with("list:"))
        .collect();
    assert_eq!(transfers.len(), 1);
    assert!(transfers[0].starts_with("export:item0002:"));
    assert_eq!(retry.error_count, 1);
}

#[tokio::test]
async fn test_unsupported_conversion_message() {
    let h = Harness::new();
    h.drive.folder(ROOT_ID, vec![file("form0001", "Survey", "application/vnd.google-apps.form", T0)]);
    h.drive.fail(
        "form0001",
        ApiError::new(400, Some(ApiError::BAD_REQUEST.to_string()), "Bad Request"),
    );

    let summary = h.engine().run(&CancellationToken::new()).await.unwrap();

    assert_eq!(
        summary.report.errors,
        vec!["Cannot export file 'Survey' due to unsupported conversion."]
    );
}

#[tokio::test]
async fn test_generic_failure_message() {
    let h = Harness::new();
    h.drive.folder(ROOT_ID, vec![file("bin00001", "movie", "video/mp4", T0)]);
    h.drive.fail("bin00001", ApiError::new(404, Some("notFound".into()), "File not found"));

    let summary = h.engine().run(&CancellationToken::new()).await.unwrap();

    assert_eq!(
        summary.report.errors,
        vec!["Failed to process 'movie' (MIME: video/mp4). Error: HTTP 404: File not found"]
    );
    assert_eq!(summary.downloaded_count, 0);
}

#[tokio::test]
async fn test_rejected_entries_are_reported() {
    let h = Harness::new();
    h.drive.folder(ROOT_ID, vec![file("good0001", "good", "text/plain", T0)]);
    h.drive.reject(ROOT_ID, "odd", "text/plain", "missing modifiedTime");

    let summary = h.engine().run(&CancellationToken::new()).await.unwrap();

    assert_eq!(summary.downloaded_count, 1);
    assert_eq!(
        summary.report.errors,
        vec!["Failed to process 'odd' (MIME: text/plain). Error: missing modifiedTime"]
    );
}

#[tokio::test]
async fn test_listing_failure_is_fatal_but_ledger_is_saved() {
    let h = Harness::new();
    h.drive.folder(
        ROOT_ID,
        vec![
            file("early001", "early", "text/plain", T0),
            folder("broken01", "Broken"),
            file("late0001", "late", "text/plain", T0),
        ],
    );
    h.drive.break_folder("broken01");

    let err = h.engine().run(&CancellationToken::new()).await.unwrap_err();

    assert!(matches!(
        err.downcast_ref::<SyncError>(),
        Some(SyncError::Listing(folder)) if folder == "broken01"
    ));
    assert_eq!(err.downcast_ref::<ApiError>().unwrap().status, 500);

    let ledger = h.ledger_store().load().await.unwrap();
    assert!(ledger.get(&id("early001")).is_some());
    assert!(ledger.get(&id("late0001")).is_none());
}

#[tokio::test]
async fn test_root_listing_failure() {
    let h = Harness::new();
    h.drive.break_folder(ROOT_ID);

    let err = h.engine().run(&CancellationToken::new()).await.unwrap_err();

    assert!(matches!(
        err.downcast_ref::<SyncError>(),
        Some(SyncError::Listing(_))
    ));
    assert!(h.ledger_store().path().exists());
}
