//! Drive provider port (driven/secondary port)
//!
//! This module defines the interface for interacting with the remote drive.
//! The primary implementation targets the Lark/Feishu Drive API, but the
//! trait only speaks in domain terms (folder tokens, file names) so the
//! engine never sees wire details.
//!
//! ## Design Notes
//!
//! - Uses `anyhow::Result` because errors at port boundaries are
//!   adapter-specific and don't need domain-level classification.
//! - Uses `#[async_trait]` for async trait methods.
//! - Implementations own authentication and rate limiting; callers treat
//!   every method as ready to use once `authenticate` has succeeded.

use std::path::Path;

use crate::domain::newtypes::FolderToken;

/// Port trait for remote drive operations
///
/// All interactions with the remote drive go through this interface.
/// Implementations handle the provider-specific API calls, token refresh,
/// rate limiting, and error mapping.
#[async_trait::async_trait]
pub trait IDriveProvider: Send + Sync {
    /// Verifies credentials and primes the access token
    ///
    /// Called once at the start of a run so credential problems surface
    /// before any scanning work is wasted.
    async fn authenticate(&self) -> anyhow::Result<()>;

    /// Looks up a direct child folder by exact name
    ///
    /// # Arguments
    /// * `parent` - Token of the folder to search in
    /// * `name` - Exact child folder name
    ///
    /// # Returns
    /// The child folder token, or `None` if no folder with that name exists
    async fn find_child_folder(
        &self,
        parent: &FolderToken,
        name: &str,
    ) -> anyhow::Result<Option<FolderToken>>;

    /// Creates a child folder
    ///
    /// # Arguments
    /// * `parent` - Token of the folder to create in
    /// * `name` - Name of the new folder
    ///
    /// # Returns
    /// The token of the created folder
    async fn create_folder(&self, parent: &FolderToken, name: &str)
        -> anyhow::Result<FolderToken>;

    /// Uploads a local file into a remote folder
    ///
    /// # Arguments
    /// * `local_path` - Absolute path of the file to read
    /// * `file_name` - Name the file takes remotely
    /// * `parent` - Token of the destination folder
    async fn upload_file(
        &self,
        local_path: &Path,
        file_name: &str,
        parent: &FolderToken,
    ) -> anyhow::Result<()>;
}
