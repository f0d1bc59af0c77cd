//! Integration tests for folder lookup and creation
//!
//! Verifies exact-name matching, type filtering, pagination, and the
//! create call against the mocked drive endpoints.

use larkpush_core::domain::FolderToken;
use larkpush_core::ports::IDriveProvider;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

use crate::common;

fn parent() -> FolderToken {
    FolderToken::new("fldparent01".to_string()).unwrap()
}

#[tokio::test]
async fn test_find_returns_matching_folder() {
    let (server, provider) = common::setup_drive_mock().await;

    common::mount_folder_listing(
        &server,
        serde_json::json!([
            {"token": "boxfile01", "name": "notes.docx", "type": "file"},
            {"token": "fldpub01", "name": "00_Publish", "type": "folder"}
        ]),
    )
    .await;

    let found = provider
        .find_child_folder(&parent(), "00_Publish")
        .await
        .expect("listing failed");

    assert_eq!(found, Some(FolderToken::new("fldpub01".to_string()).unwrap()));
}

#[tokio::test]
async fn test_find_returns_none_when_absent() {
    let (server, provider) = common::setup_drive_mock().await;

    common::mount_folder_listing(
        &server,
        serde_json::json!([
            {"token": "fldother", "name": "01_Drafts", "type": "folder"}
        ]),
    )
    .await;

    let found = provider
        .find_child_folder(&parent(), "00_Publish")
        .await
        .expect("listing failed");

    assert_eq!(found, None);
}

#[tokio::test]
async fn test_find_ignores_files_with_matching_name() {
    let (server, provider) = common::setup_drive_mock().await;

    // A file named like the folder we want must not satisfy the lookup.
    common::mount_folder_listing(
        &server,
        serde_json::json!([
            {"token": "boxfile02", "name": "00_Publish", "type": "file"}
        ]),
    )
    .await;

    let found = provider
        .find_child_folder(&parent(), "00_Publish")
        .await
        .expect("listing failed");

    assert_eq!(found, None);
}

#[tokio::test]
async fn test_find_matches_case_sensitively() {
    let (server, provider) = common::setup_drive_mock().await;

    common::mount_folder_listing(
        &server,
        serde_json::json!([
            {"token": "fldlower", "name": "00_publish", "type": "folder"}
        ]),
    )
    .await;

    let found = provider
        .find_child_folder(&parent(), "00_Publish")
        .await
        .expect("listing failed");

    assert_eq!(found, None);
}

#[tokio::test]
async fn test_find_follows_pagination() {
    let (server, provider) = common::setup_drive_mock().await;

    // Page 1: no match, has_more with a cursor.
    Mock::given(method("GET"))
        .and(path("/open-apis/drive/v1/files"))
        .and(query_param("folder_token", "fldparent01"))
        .and(query_param("page_size", "200"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "code": 0,
            "msg": "success",
            "data": {
                "files": [
                    {"token": "fldaaa", "name": "01_Drafts", "type": "folder"}
                ],
                "has_more": true,
                "next_page_token": "cursor-2"
            }
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    // Page 2: requested with the cursor, contains the match.
    Mock::given(method("GET"))
        .and(path("/open-apis/drive/v1/files"))
        .and(query_param("page_token", "cursor-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "code": 0,
            "msg": "success",
            "data": {
                "files": [
                    {"token": "fldpub02", "name": "00_Publish", "type": "folder"}
                ],
                "has_more": false
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let found = provider
        .find_child_folder(&parent(), "00_Publish")
        .await
        .expect("listing failed");

    assert_eq!(found, Some(FolderToken::new("fldpub02".to_string()).unwrap()));
}

#[tokio::test]
async fn test_find_carries_bearer_token() {
    let (server, provider) = common::setup_drive_mock().await;

    Mock::given(method("GET"))
        .and(path("/open-apis/drive/v1/files"))
        .and(header(
            "authorization",
            format!("Bearer {}", common::TEST_TOKEN),
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "code": 0,
            "msg": "success",
            "data": { "files": [], "has_more": false }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let found = provider
        .find_child_folder(&parent(), "00_Publish")
        .await
        .expect("listing failed");
    assert_eq!(found, None);
}

#[tokio::test]
async fn test_create_folder_returns_new_token() {
    let (server, provider) = common::setup_drive_mock().await;
    common::mount_create_folder(&server, "fldnew42").await;

    let created = provider
        .create_folder(&parent(), "03_EPS")
        .await
        .expect("create failed");

    assert_eq!(created, FolderToken::new("fldnew42".to_string()).unwrap());
}

#[tokio::test]
async fn test_create_folder_sends_name_and_parent() {
    let (server, provider) = common::setup_drive_mock().await;

    Mock::given(method("POST"))
        .and(path("/open-apis/drive/v1/files/create_folder"))
        .and(body_json(serde_json::json!({
            "name": "00_Publish",
            "folder_token": "fldparent01"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "code": 0,
            "msg": "success",
            "data": { "token": "fldcreated" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    provider
        .create_folder(&parent(), "00_Publish")
        .await
        .expect("create failed");
}

#[tokio::test]
async fn test_create_folder_surfaces_remote_rejection() {
    let (server, provider) = common::setup_drive_mock().await;

    Mock::given(method("POST"))
        .and(path("/open-apis/drive/v1/files/create_folder"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "code": 1062507,
            "msg": "no permission on parent node"
        })))
        .mount(&server)
        .await;

    let err = provider
        .create_folder(&parent(), "00_Publish")
        .await
        .unwrap_err();

    let text = err.to_string();
    assert!(text.contains("1062507"));
    assert!(text.contains("no permission"));
}
