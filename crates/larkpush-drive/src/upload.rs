//! Multipart streaming file upload
//!
//! Sends one local file to the drive's upload endpoint as a multipart form.
//! The file body is streamed from disk rather than buffered, so large
//! documents do not inflate the process footprint.
//!
//! Failures are reported as [`UploadError`]: unreadable local files map to
//! `LocalIo`, everything the remote rejects maps to `Transfer` with the
//! remote error code when one was returned. The caller owns the task
//! context and re-keys the error with the full logical key.

use std::path::Path;

use anyhow::Result;
use larkpush_core::domain::{FolderToken, UploadError};
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Method};
use serde::Deserialize;
use tokio_util::io::ReaderStream;
use tracing::debug;

use crate::client::{ApiEnvelope, DriveClient};
use crate::rate_limit::SlidingWindowLimiter;

/// Upload endpoint path
const UPLOAD_PATH: &str = "/open-apis/drive/v1/files/upload_all";

/// Parent type the drive expects for explorer uploads
const PARENT_TYPE: &str = "explorer";

/// Payload of a successful upload
#[derive(Debug, Deserialize)]
struct UploadData {
    #[serde(default)]
    file_token: Option<String>,
}

/// Uploads one local file into the folder identified by `parent`.
///
/// Builds a multipart form with the metadata fields (`file_name`,
/// `parent_type`, `parent_node`, `size`) and the streamed `file` part,
/// then checks both the HTTP status and the envelope code of the reply.
///
/// # Errors
/// * [`UploadError::LocalIo`] - the local file cannot be statted or opened
/// * [`UploadError::Transfer`] - transport failure, non-success HTTP
///   status, or a non-zero envelope code (carried in `code`)
pub async fn upload_file(
    client: &DriveClient,
    limiter: &SlidingWindowLimiter,
    access_token: &str,
    local_path: &Path,
    file_name: &str,
    parent: &FolderToken,
) -> Result<()> {
    let metadata = tokio::fs::metadata(local_path)
        .await
        .map_err(|source| UploadError::LocalIo {
            path: local_path.to_path_buf(),
            source,
        })?;
    let size = metadata.len();

    let file = tokio::fs::File::open(local_path)
        .await
        .map_err(|source| UploadError::LocalIo {
            path: local_path.to_path_buf(),
            source,
        })?;

    let file_part = Part::stream_with_length(Body::wrap_stream(ReaderStream::new(file)), size)
        .file_name(file_name.to_string())
        .mime_str("application/octet-stream")
        .map_err(|e| transfer_error(file_name, None, format!("building file part: {e}")))?;

    let form = Form::new()
        .text("file_name", file_name.to_string())
        .text("parent_type", PARENT_TYPE)
        .text("parent_node", parent.to_string())
        .text("size", size.to_string())
        .part("file", file_part);

    debug!(
        path = %local_path.display(),
        file_name,
        parent = %parent,
        size,
        "Uploading file"
    );

    limiter.acquire().await;

    let response = client
        .authed_request(Method::POST, UPLOAD_PATH, access_token)
        .multipart(form)
        .send()
        .await
        .map_err(|e| transfer_error(file_name, None, format!("upload request failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        return Err(transfer_error(file_name, None, format!("upload returned HTTP {status}")).into());
    }

    let envelope: ApiEnvelope<UploadData> = response
        .json()
        .await
        .map_err(|e| transfer_error(file_name, None, format!("malformed upload response: {e}")))?;

    if envelope.code != 0 {
        return Err(transfer_error(file_name, Some(envelope.code), envelope.msg).into());
    }

    let file_token = envelope
        .data
        .and_then(|data| data.file_token)
        .unwrap_or_default();
    debug!(file_name, file_token = %file_token, "Upload accepted");
    Ok(())
}

/// Builds a transfer error keyed by the bare file name.
fn transfer_error(file_name: &str, code: Option<i64>, reason: impl Into<String>) -> UploadError {
    UploadError::Transfer {
        key: file_name.to_string(),
        code,
        reason: reason.into(),
    }
}

// ============================================================================
// Tests
// ============================================================================
