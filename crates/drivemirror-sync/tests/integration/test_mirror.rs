//! End-to-end mirror runs against the in-memory drive

use chrono::Duration;
use tokio_util::sync::CancellationToken;

use drivemirror_core::domain::LocalPathBuilder;
use drivemirror_core::ports::{ILedgerStore, ILocalFileSystem};
use drivemirror_sync::filesystem::LocalFileSystemAdapter;

use crate::common::{at, file, folder, id, shortcut, Harness, DOCX, ROOT_ID, T0};

#[tokio::test]
async fn test_tree_layout_and_folder_order() {
    let h = Harness::new();
    h.drive.folder(
        ROOT_ID,
        vec![
            file("fileA01", "A", "application/pdf", T0),
            folder("folderB1", "B"),
        ],
    );
    h.drive.folder("folderB1", vec![file("fileC01", "C", "text/plain", T0)]);

    let summary = h.engine().run(&CancellationToken::new()).await.unwrap();

    assert!(h.root().join("A.pdf").is_file());
    assert!(h.root().join("B").is_dir());
    assert_eq!(
        std::fs::read(h.root().join("B/C.txt")).unwrap(),
        b"content of fileC01"
    );
    assert_eq!(summary.downloaded_count, 2);

    let ops = h.fs.ops();
    let mkdir_b = ops.iter().position(|op| op == "mkdir:B").unwrap();
    let write_c = ops.iter().position(|op| op == "write:B/C.txt").unwrap();
    assert!(mkdir_b < write_c);
}

#[tokio::test]
async fn test_second_run_downloads_nothing() {
    let h = Harness::new();
    h.drive.folder(
        ROOT_ID,
        vec![
            file("doc0001", "Plan", "application/vnd.google-apps.document", T0),
            folder("sub0001", "Archive"),
        ],
    );
    h.drive.folder("sub0001", vec![file("img0001", "photo.jpg", "image/jpeg", T0)]);

    let first = h.engine().run(&CancellationToken::new()).await.unwrap();
    assert_eq!(first.downloaded_count, 2);

    h.drive.clear_requests();
    let second = h.engine().run(&CancellationToken::new()).await.unwrap();

    assert_eq!(second.downloaded_count, 0);
    assert_eq!(second.error_count, 0);
    assert!(h
        .drive
        .requests()
        .iter()
        .all(|r| r.starts_with("list:")));
}

#[tokio::test]
async fn test_changed_timestamp_triggers_transfer() {
    let h = Harness::new();
    h.drive.folder(ROOT_ID, vec![file("txt0001", "notes", "text/plain", T0)]);
    h.engine().run(&CancellationToken::new()).await.unwrap();

    let later = (at(T0) + Duration::hours(2)).to_rfc3339();
    h.drive.folder(ROOT_ID, vec![file("txt0001", "notes", "text/plain", &later)]);
    h.drive.content("txt0001", b"edited");
    h.drive.clear_requests();

    let summary = h.engine().run(&CancellationToken::new()).await.unwrap();

    assert_eq!(summary.downloaded_count, 1);
    assert_eq!(h.drive.requests().last().unwrap(), "fetch:txt0001");
    assert_eq!(std::fs::read(h.root().join("notes.txt")).unwrap(), b"edited");

    let ledger = h.ledger_store().load().await.unwrap();
    assert_eq!(ledger.get(&id("txt0001")).unwrap().modified_time, at(&later));
}

#[tokio::test]
async fn test_matching_local_mtime_skips_network() {
    let h = Harness::new();
    h.drive.folder(ROOT_ID, vec![file("txt0002", "Notes", "text/plain", T0)]);

    let existing = h.root().join("Notes.txt");
    let fs = LocalFileSystemAdapter::new();
    fs.write_file_atomic(&existing, b"already here").await.unwrap();
    fs.set_modified_time(&existing, at(T0) + Duration::milliseconds(500))
        .await
        .unwrap();

    let summary = h.engine().run(&CancellationToken::new()).await.unwrap();

    assert_eq!(summary.downloaded_count, 0);
    assert_eq!(summary.error_count, 0);
    assert!(!h.drive.requests().iter().any(|r| r.starts_with("fetch:")));
    assert_eq!(std::fs::read(&existing).unwrap(), b"already here");
    assert!(h.ledger_store().load().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_shortcuts_leave_no_trace() {
    let h = Harness::new();
    h.drive.folder(
        ROOT_ID,
        vec![
            shortcut("short01", "Link to elsewhere"),
            file("real001", "Real", "application/zip", T0),
        ],
    );

    let summary = h.engine().run(&CancellationToken::new()).await.unwrap();

    assert_eq!(summary.downloaded_count, 1);
    assert!(summary.report.downloaded.iter().all(|d| d.id != id("short01")));
    assert!(summary.report.errors.is_empty());
    assert!(!h.drive.requests().iter().any(|r| r.contains("short01")));

    let ledger = h.ledger_store().load().await.unwrap();
    assert!(ledger.get(&id("short01")).is_none());
    assert!(ledger.get(&id("real001")).is_some());
}

#[tokio::test]
async fn test_exports_use_target_format_and_extension() {
    let h = Harness::new();
    h.drive.folder(
        ROOT_ID,
        vec![file("doc0002", "Budget: 2024?", "application/vnd.google-apps.document", T0)],
    );
    h.drive.content("doc0002", b"PK\x03\x04docx");

    let summary = h.engine().run(&CancellationToken::new()).await.unwrap();

    assert_eq!(h.drive.requests().last().unwrap(), &format!("export:doc0002:{DOCX}"));
    let written = h.root().join("Budget 2024.docx");
    assert_eq!(std::fs::read(&written).unwrap(), b"PK\x03\x04docx");
    assert_eq!(summary.report.downloaded[0].name, "Budget: 2024?");
    assert_eq!(summary.downloaded_bytes, 8);

    let record = h.ledger_store().load().await.unwrap();
    let record = record.get(&id("doc0002")).unwrap();
    assert_eq!(record.mime_type, "application/vnd.google-apps.document");
    assert_eq!(record.size, 8);
}

#[tokio::test]
async fn test_local_mtime_matches_remote() {
    let h = Harness::new();
    h.drive.folder(ROOT_ID, vec![file("png0001", "chart", "image/png", T0)]);

    h.engine().run(&CancellationToken::new()).await.unwrap();

    let mtime = LocalFileSystemAdapter::new()
        .modified_time(&h.root().join("chart.png"))
        .await
        .unwrap()
        .unwrap();
    assert!((mtime - at(T0)).num_milliseconds().abs() < 1000);
}

#[tokio::test]
async fn test_all_listing_pages_are_processed() {
    let h = Harness::new();
    h.drive.paged_folder(
        ROOT_ID,
        vec![
            vec![file("pg1item1", "one", "text/plain", T0)],
            vec![file("pg2item1", "two", "text/plain", T0)],
            vec![file("pg3item1", "three", "text/plain", T0)],
        ],
    );

    let summary = h.engine().run(&CancellationToken::new()).await.unwrap();

    assert_eq!(summary.downloaded_count, 3);
    let lists: Vec<_> = h
        .drive
        .requests()
        .into_iter()
        .filter(|r| r.starts_with("list:"))
        .collect();
    assert_eq!(
        lists,
        vec![
            "list:root0001:-",
            "list:root0001:root0001-p1",
            "list:root0001:root0001-p2"
        ]
    );
}

#[tokio::test]
async fn test_colliding_names_get_id_suffix() {
    let h = Harness::new();
    h.drive.folder(
        ROOT_ID,
        vec![
            file("dupA0000aaa", "Report", "application/pdf", T0),
            file("dupB0000bbb", "Report?", "application/pdf", T0),
        ],
    );
    h.drive.content("dupA0000aaa", b"first");
    h.drive.content("dupB0000bbb", b"second");

    let summary = h.engine().run(&CancellationToken::new()).await.unwrap();

    assert_eq!(summary.downloaded_count, 2);
    assert_eq!(std::fs::read(h.root().join("Report.pdf")).unwrap(), b"first");
    assert_eq!(
        std::fs::read(h.root().join("Report_dupB0000.pdf")).unwrap(),
        b"second"
    );
}

#[tokio::test]
async fn test_collision_suffix_is_kept_across_runs() {
    let h = Harness::new();
    h.drive.folder(
        ROOT_ID,
        vec![
            file("AAAAAAAAaaa", "report?", "application/pdf", T0),
            file("BBBBBBBBbbb", "report*", "application/pdf", T0),
        ],
    );
    h.drive.content("AAAAAAAAaaa", b"A-content");
    h.drive.content("BBBBBBBBbbb", b"B-content");
    h.engine().run(&CancellationToken::new()).await.unwrap();

    assert_eq!(std::fs::read(h.root().join("report.pdf")).unwrap(), b"A-content");
    assert_eq!(
        std::fs::read(h.root().join("report_BBBBBBBB.pdf")).unwrap(),
        b"B-content"
    );

    // Only B changed, and it is now listed first
    let edited = "2024-02-01T08:00:00Z";
    h.drive.folder(
        ROOT_ID,
        vec![
            file("BBBBBBBBbbb", "report*", "application/pdf", edited),
            file("AAAAAAAAaaa", "report?", "application/pdf", T0),
        ],
    );
    h.drive.content("BBBBBBBBbbb", b"B-edited");
    let summary = h.engine().run(&CancellationToken::new()).await.unwrap();

    assert_eq!(summary.downloaded_count, 1);
    assert_eq!(std::fs::read(h.root().join("report.pdf")).unwrap(), b"A-content");
    assert_eq!(
        std::fs::read(h.root().join("report_BBBBBBBB.pdf")).unwrap(),
        b"B-edited"
    );

    let ledger = h.ledger_store().load().await.unwrap();
    let b = ledger.get(&id("BBBBBBBBbbb")).unwrap();
    assert_eq!(b.modified_time, at(edited));
    assert_eq!(
        b.local_path.as_deref(),
        Some(std::path::Path::new("report_BBBBBBBB.pdf"))
    );
}

#[tokio::test]
async fn test_file_named_like_a_temp_sibling_survives() {
    let h = Harness::new();
    h.drive.folder(
        ROOT_ID,
        vec![
            file("rawtmp001", "report.pdf.tmp", "application/octet-stream", T0),
            file("pdf000001", "report", "application/pdf", T0),
        ],
    );
    h.drive.content("rawtmp001", b"raw bytes");
    h.drive.content("pdf000001", b"%PDF-1.7");

    let summary = h.engine().run(&CancellationToken::new()).await.unwrap();

    assert_eq!(summary.downloaded_count, 2);
    assert_eq!(summary.error_count, 0);
    assert_eq!(
        std::fs::read(h.root().join("report.pdf.tmp")).unwrap(),
        b"raw bytes"
    );
    assert_eq!(std::fs::read(h.root().join("report.pdf")).unwrap(), b"%PDF-1.7");

    h.drive.clear_requests();
    let second = h.engine().run(&CancellationToken::new()).await.unwrap();
    assert_eq!(second.downloaded_count, 0);
    assert!(h.root().join("report.pdf.tmp").is_file());
}

#[tokio::test]
async fn test_census_percentage() {
    let h = Harness::new();
    let files = (0..25)
        .map(|i| file(&format!("file{i:04}"), &format!("f{i}"), "text/plain", T0))
        .collect();
    h.drive.folder(ROOT_ID, files);
    h.drive.census(vec![
        vec![Some(1024); 40],
        vec![None; 40],
        vec![Some(2048); 20],
    ]);

    let summary = h.engine().run(&CancellationToken::new()).await.unwrap();

    assert_eq!(summary.census.total_items, 100);
    assert_eq!(summary.census.total_bytes, 40 * 1024 + 20 * 2048);
    assert_eq!(summary.downloaded_count, 25);
    assert!((summary.percentage - 25.0).abs() < f64::EPSILON);
    assert!(summary
        .render()
        .contains("Percentage of drive downloaded this run: 25.00%"));
}

#[tokio::test]
async fn test_empty_census_reports_zero_percent() {
    let h = Harness::new();
    h.drive.folder(ROOT_ID, vec![file("only001", "only", "text/plain", T0)]);

    let summary = h.engine().run(&CancellationToken::new()).await.unwrap();

    assert_eq!(summary.census.total_items, 0);
    assert_eq!(summary.percentage, 0.0);
}

#[tokio::test]
async fn test_long_file_name_stays_in_its_folder() {
    let h = Harness::new();
    let long = "x".repeat(45);
    h.drive.folder(ROOT_ID, vec![folder("deep0001", &long)]);
    h.drive.folder("deep0001", vec![file("leaf0001", &long, "application/pdf", T0)]);

    let limit = h.root().to_string_lossy().chars().count() + 80;
    let paths = LocalPathBuilder::new(h.root()).with_limits(50, limit, 30);
    h.engine_with_paths(paths)
        .run(&CancellationToken::new())
        .await
        .unwrap();

    // Cutting the leaf alone is enough, so the folder keeps its full name
    let leaf = h
        .root()
        .join(&long)
        .join(format!("{}.pdf", "x".repeat(26)));
    assert!(leaf.is_file());
    assert_eq!(std::fs::read_dir(h.root()).unwrap().count(), 1);
}

#[tokio::test]
async fn test_deep_long_paths_cut_every_component() {
    let h = Harness::new();
    let long = "x".repeat(45);
    h.drive.folder(ROOT_ID, vec![folder("deep0001", &long)]);
    h.drive.folder("deep0001", vec![folder("deep0002", &long)]);
    h.drive.folder("deep0002", vec![file("leaf0001", &long, "application/pdf", T0)]);

    let limit = h.root().to_string_lossy().chars().count() + 100;
    let paths = LocalPathBuilder::new(h.root()).with_limits(50, limit, 30);
    h.engine_with_paths(paths)
        .run(&CancellationToken::new())
        .await
        .unwrap();

    // Folders fit, so they keep full names; the file path overflows even
    // with a cut leaf, so every component below the root is cut, extension
    // kept on the leaf
    assert!(h.root().join(&long).join(&long).is_dir());
    let short = "x".repeat(30);
    let leaf = h
        .root()
        .join(&short)
        .join(&short)
        .join(format!("{}.pdf", "x".repeat(26)));
    assert!(leaf.is_file());
}
