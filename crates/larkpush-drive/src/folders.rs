//! Folder lookup and creation in the drive explorer
//!
//! The drive addresses folders by opaque token, not by path, so resolving a
//! logical directory means walking children by name one level at a time.
//! This module provides the two primitives that walk needs: a paged search
//! for a named child folder and the create call for a missing one.

use anyhow::{Context, Result};
use larkpush_core::domain::FolderToken;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::client::{ApiEnvelope, DriveClient};
use crate::rate_limit::SlidingWindowLimiter;

/// File listing endpoint path
const FILES_PATH: &str = "/open-apis/drive/v1/files";

/// Folder creation endpoint path
const CREATE_FOLDER_PATH: &str = "/open-apis/drive/v1/files/create_folder";

/// Entry type string the drive uses for folders
const FOLDER_TYPE: &str = "folder";

/// Page size for child listings
pub const FOLDER_PAGE_SIZE: u32 = 200;

// ============================================================================
// Wire types
// ============================================================================

/// One entry of a folder listing
#[derive(Debug, Deserialize)]
struct DriveEntry {
    token: String,
    name: String,
    /// Entry type, `"folder"` for folders, `"file"`/`"docx"`/... otherwise
    #[serde(rename = "type")]
    kind: String,
}

/// One page of a folder listing
#[derive(Debug, Deserialize)]
struct FileListPage {
    #[serde(default)]
    files: Vec<DriveEntry>,
    #[serde(default)]
    has_more: bool,
    #[serde(default)]
    next_page_token: Option<String>,
}

/// Request body for folder creation
#[derive(Debug, Serialize)]
struct CreateFolderRequest<'a> {
    name: &'a str,
    folder_token: &'a str,
}

/// Payload of a successful folder creation
#[derive(Debug, Deserialize)]
struct CreateFolderData {
    token: String,
}

// ============================================================================
// Operations
// ============================================================================

/// Searches the children of `parent` for a folder named `name`.
///
/// Pages through the listing (200 entries per page, following
/// `next_page_token` while `has_more` is set) and returns the token of the
/// first folder-typed child whose name matches exactly, case-sensitively.
/// Files with a matching name are ignored. Returns `Ok(None)` when the
/// listing is exhausted without a match.
///
/// Each page request is admitted by `limiter` separately.
pub async fn find_child_folder(
    client: &DriveClient,
    limiter: &SlidingWindowLimiter,
    access_token: &str,
    parent: &FolderToken,
    name: &str,
) -> Result<Option<FolderToken>> {
    let page_size = FOLDER_PAGE_SIZE.to_string();
    let mut page_token: Option<String> = None;
    let mut pages = 0u32;

    loop {
        limiter.acquire().await;

        let mut request = client
            .authed_request(Method::GET, FILES_PATH, access_token)
            .query(&[
                ("folder_token", parent.as_str()),
                ("page_size", page_size.as_str()),
            ]);
        if let Some(token) = &page_token {
            request = request.query(&[("page_token", token.as_str())]);
        }

        let envelope: ApiEnvelope<FileListPage> = request
            .send()
            .await
            .with_context(|| format!("listing children of folder '{parent}'"))?
            .error_for_status()
            .with_context(|| format!("listing children of folder '{parent}'"))?
            .json()
            .await
            .with_context(|| format!("parsing child listing of folder '{parent}'"))?;

        let page = envelope.into_data("list children")?;
        pages += 1;

        for entry in &page.files {
            if entry.kind == FOLDER_TYPE && entry.name == name {
                debug!(
                    parent = %parent,
                    name,
                    token = %entry.token,
                    pages,
                    "Found existing child folder"
                );
                return Ok(Some(FolderToken::new(entry.token.clone())?));
            }
        }

        match (page.has_more, page.next_page_token) {
            (true, Some(next)) if !next.is_empty() => page_token = Some(next),
            _ => {
                debug!(parent = %parent, name, pages, "No child folder with that name");
                return Ok(None);
            }
        }
    }
}

/// Creates a folder named `name` under `parent` and returns its token.
pub async fn create_folder(
    client: &DriveClient,
    limiter: &SlidingWindowLimiter,
    access_token: &str,
    parent: &FolderToken,
    name: &str,
) -> Result<FolderToken> {
    limiter.acquire().await;

    let envelope: ApiEnvelope<CreateFolderData> = client
        .authed_request(Method::POST, CREATE_FOLDER_PATH, access_token)
        .json(&CreateFolderRequest {
            name,
            folder_token: parent.as_str(),
        })
        .send()
        .await
        .with_context(|| format!("creating folder '{name}' under '{parent}'"))?
        .error_for_status()
        .with_context(|| format!("creating folder '{name}' under '{parent}'"))?
        .json()
        .await
        .with_context(|| format!("parsing create response for folder '{name}'"))?;

    let data = envelope.into_data("create folder")?;
    debug!(parent = %parent, name, token = %data.token, "Created child folder");
    Ok(FolderToken::new(data.token)?)
}

// ============================================================================
// Tests
// ============================================================================
