//! Integration tests for tenant token exchange
//!
//! Verifies token acquisition, caching across calls, refresh inside the
//! expiry margin, and the fatal classification of authentication failures.

use larkpush_core::domain::UploadError;
use larkpush_core::ports::IDriveProvider;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common;

#[tokio::test]
async fn test_authenticate_succeeds() {
    let (_server, provider) = common::setup_drive_mock().await;

    provider.authenticate().await.expect("authentication failed");
}

#[tokio::test]
async fn test_token_request_carries_credentials() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/open-apis/auth/v3/tenant_access_token/internal"))
        .and(body_json(serde_json::json!({
            "app_id": "cli_test_app",
            "app_secret": "test-secret"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "code": 0,
            "msg": "ok",
            "tenant_access_token": "t-abc",
            "expire": 7200
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = common::provider_for(&server);
    provider.authenticate().await.expect("authentication failed");
}

#[tokio::test]
async fn test_token_is_cached_across_calls() {
    let server = MockServer::start().await;

    // Exactly one token exchange despite repeated authentication.
    Mock::given(method("POST"))
        .and(path("/open-apis/auth/v3/tenant_access_token/internal"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "code": 0,
            "msg": "ok",
            "tenant_access_token": common::TEST_TOKEN,
            "expire": 7200
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = common::provider_for(&server);
    provider.authenticate().await.expect("first authentication");
    provider.authenticate().await.expect("second authentication");
    provider.authenticate().await.expect("third authentication");
}

#[tokio::test]
async fn test_token_inside_margin_is_refreshed() {
    let server = MockServer::start().await;

    // Tokens expiring within the 300 second margin are refreshed on the
    // next call, so two authentications mean two exchanges.
    Mock::given(method("POST"))
        .and(path("/open-apis/auth/v3/tenant_access_token/internal"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "code": 0,
            "msg": "ok",
            "tenant_access_token": common::TEST_TOKEN,
            "expire": 200
        })))
        .expect(2)
        .mount(&server)
        .await;

    let provider = common::provider_for(&server);
    provider.authenticate().await.expect("first authentication");
    provider.authenticate().await.expect("second authentication");
}

#[tokio::test]
async fn test_rejected_credentials_are_fatal() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/open-apis/auth/v3/tenant_access_token/internal"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "code": 10003,
            "msg": "invalid app_secret"
        })))
        .mount(&server)
        .await;

    let provider = common::provider_for(&server);
    let err = provider.authenticate().await.unwrap_err();

    let upload_err = err.downcast_ref::<UploadError>().expect("taxonomy error");
    assert!(upload_err.is_fatal());
    assert!(err.to_string().contains("10003"));
    assert!(err.to_string().contains("invalid app_secret"));
}

#[tokio::test]
async fn test_http_error_is_fatal_authentication() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/open-apis/auth/v3/tenant_access_token/internal"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let provider = common::provider_for(&server);
    let err = provider.authenticate().await.unwrap_err();

    let upload_err = err.downcast_ref::<UploadError>().expect("taxonomy error");
    assert!(matches!(upload_err, UploadError::Authentication(_)));
    assert!(upload_err.is_fatal());
}

#[tokio::test]
async fn test_auth_failure_blocks_drive_calls() {
    // No token endpoint mounted at all: every drive call must fail at
    // the token exchange, before touching the drive endpoints.
    let server = MockServer::start().await;
    let provider = common::provider_for(&server);

    let parent = larkpush_core::domain::FolderToken::new("fldparent01".to_string()).unwrap();
    let err = provider
        .find_child_folder(&parent, "00_Publish")
        .await
        .unwrap_err();

    let upload_err = err.downcast_ref::<UploadError>().expect("taxonomy error");
    assert!(matches!(upload_err, UploadError::Authentication(_)));
}
