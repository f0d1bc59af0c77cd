//! Integration tests for multipart uploads
//!
//! Verifies the upload request shape, success handling, and the mapping
//! of remote rejections onto the transfer error taxonomy.

use larkpush_core::domain::{FolderToken, UploadError};
use larkpush_core::ports::IDriveProvider;
use wiremock::matchers::{header, header_exists, method, path};
use wiremock::{Mock, ResponseTemplate};

use crate::common;

fn parent() -> FolderToken {
    FolderToken::new("fldparent01".to_string()).unwrap()
}

/// Writes a small file into a temp dir and returns (dir, path).
fn temp_file(contents: &[u8]) -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("report.docx");
    std::fs::write(&path, contents).expect("write temp file");
    (dir, path)
}

#[tokio::test]
async fn test_upload_succeeds() {
    let (server, provider) = common::setup_drive_mock().await;
    common::mount_upload_success(&server, "boxuploaded01").await;

    let (_dir, file_path) = temp_file(b"quarterly report body");

    provider
        .upload_file(&file_path, "report.docx", &parent())
        .await
        .expect("upload failed");
}

#[tokio::test]
async fn test_upload_sends_multipart_with_bearer() {
    let (server, provider) = common::setup_drive_mock().await;

    Mock::given(method("POST"))
        .and(path("/open-apis/drive/v1/files/upload_all"))
        .and(header("authorization", format!("Bearer {}", common::TEST_TOKEN)))
        .and(header_exists("content-type"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "code": 0,
            "msg": "success",
            "data": { "file_token": "boxuploaded02" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (_dir, file_path) = temp_file(b"content");

    provider
        .upload_file(&file_path, "report.docx", &parent())
        .await
        .expect("upload failed");
}

#[tokio::test]
async fn test_upload_empty_file() {
    let (server, provider) = common::setup_drive_mock().await;
    common::mount_upload_success(&server, "boxempty").await;

    let (_dir, file_path) = temp_file(b"");

    provider
        .upload_file(&file_path, "report.docx", &parent())
        .await
        .expect("empty upload failed");
}

#[tokio::test]
async fn test_upload_rejection_maps_to_transfer_error() {
    let (server, provider) = common::setup_drive_mock().await;

    Mock::given(method("POST"))
        .and(path("/open-apis/drive/v1/files/upload_all"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "code": 1061045,
            "msg": "quota exceeded"
        })))
        .mount(&server)
        .await;

    let (_dir, file_path) = temp_file(b"content");

    let err = provider
        .upload_file(&file_path, "report.docx", &parent())
        .await
        .unwrap_err();

    match err.downcast_ref::<UploadError>() {
        Some(UploadError::Transfer { key, code, reason }) => {
            assert_eq!(key, "report.docx");
            assert_eq!(*code, Some(1061045));
            assert!(reason.contains("quota exceeded"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_upload_http_error_is_transfer_not_fatal() {
    let (server, provider) = common::setup_drive_mock().await;

    Mock::given(method("POST"))
        .and(path("/open-apis/drive/v1/files/upload_all"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let (_dir, file_path) = temp_file(b"content");

    let err = provider
        .upload_file(&file_path, "report.docx", &parent())
        .await
        .unwrap_err();

    let upload_err = err.downcast_ref::<UploadError>().expect("taxonomy error");
    assert!(matches!(upload_err, UploadError::Transfer { code: None, .. }));
    assert!(!upload_err.is_fatal());
}

#[tokio::test]
async fn test_upload_missing_local_file_is_local_io() {
    let (server, provider) = common::setup_drive_mock().await;
    common::mount_upload_success(&server, "boxnever").await;

    let err = provider
        .upload_file(
            std::path::Path::new("/nonexistent/report.docx"),
            "report.docx",
            &parent(),
        )
        .await
        .unwrap_err();

    let upload_err = err.downcast_ref::<UploadError>().expect("taxonomy error");
    assert!(matches!(upload_err, UploadError::LocalIo { .. }));
    assert!(!upload_err.is_fatal());
}
