//! 保存処理の統合テスト

use image_batch_common::{
    ExportError, ItemOutcome, Payload, ProcessedResult, ProcessingOptions, SessionController, SourceFile,
    TaggedReply, TargetFormat,
};
use image_batch_rust::error::ImageBatchError;
use image_batch_rust::export::{export_all_to_dir, export_single_to_dir, BulkMode, ZipArchiver};
use std::time::Duration;
use tempfile::tempdir;

fn result(format: &str, data: &[u8]) -> ItemOutcome {
    Some(ProcessedResult {
        index: 0,
        payload: Payload::Binary(data.to_vec()),
        byte_size: data.len() as u64,
        width: 8,
        height: 8,
        format: format.to_string(),
    })
}

/// 3枚中2枚が成功したセッション
fn converted_session() -> SessionController {
    let mut session = SessionController::new();
    session
        .ingest(vec![
            SourceFile::new("first.jpg", "image/jpeg", vec![1; 100]),
            SourceFile::new("second.png", "image/png", vec![2; 100]),
            SourceFile::new("third.gif", "image/gif", vec![3; 100]),
        ])
        .unwrap();

    let request = session
        .start_run(&ProcessingOptions::new(70, TargetFormat::Png))
        .unwrap();
    session.apply_reply(TaggedReply {
        token: request.token,
        outcome: Ok(vec![result("png", b"one"), None, result("png", b"three")]),
    });
    session
}

#[test]
fn test_export_single_writes_processed_name() {
    let dir = tempdir().expect("Failed to create temp dir");
    let session = converted_session();

    let path = export_single_to_dir(&session, 2, dir.path()).unwrap();
    assert_eq!(path, dir.path().join("third_processed.png"));
    assert_eq!(std::fs::read(&path).unwrap(), b"three");
}

#[test]
fn test_export_single_not_ready() {
    let dir = tempdir().expect("Failed to create temp dir");
    let session = converted_session();

    let err = export_single_to_dir(&session, 1, dir.path()).unwrap_err();
    assert!(matches!(
        err,
        ImageBatchError::Session(image_batch_common::Error::Export(ExportError::NotReady(1)))
    ));
    assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_sequential_fallback_skips_failures() {
    let dir = tempdir().expect("Failed to create temp dir");
    let session = converted_session();

    let summary = export_all_to_dir(
        &session,
        dir.path(),
        BulkMode::Sequential {
            stagger: Duration::from_millis(300),
        },
    )
    .await
    .unwrap();

    assert!(!summary.archived);
    assert_eq!(
        summary.written,
        vec![
            dir.path().join("first_processed.png"),
            dir.path().join("third_processed.png"),
        ]
    );
}

#[tokio::test]
async fn test_export_all_twice_same_entries() {
    let dir = tempdir().expect("Failed to create temp dir");
    let session = converted_session();

    let first = session
        .exporter()
        .export_all(Some(&ZipArchiver), "a.zip")
        .unwrap();
    let second = session
        .exporter()
        .export_all(Some(&ZipArchiver), "a.zip")
        .unwrap();
    assert_eq!(first, second);

    let summary = export_all_to_dir(&session, dir.path(), BulkMode::Archive)
        .await
        .unwrap();
    let file = std::fs::File::open(&summary.written[0]).unwrap();
    let zip = zip::ZipArchive::new(file).unwrap();
    let names: Vec<&str> = zip.file_names().collect();
    assert_eq!(names.len(), 2);
    assert!(names.contains(&"first_processed.png"));
    assert!(names.contains(&"third_processed.png"));
}

#[tokio::test]
async fn test_export_all_nothing_to_export() {
    let dir = tempdir().expect("Failed to create temp dir");
    let mut session = SessionController::new();
    session
        .ingest(vec![SourceFile::new("a.jpg", "image/jpeg", vec![1])])
        .unwrap();

    let err = export_all_to_dir(&session, dir.path(), BulkMode::Archive)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("Nothing to export"));
}
