//! Source scanner port (driven/secondary port)
//!
//! This module defines the interface for local discovery: which directories
//! under the root are eligible for publishing, and which files they hold.
//! Keeping discovery behind a port lets the engine run against a fake tree
//! in tests while the real adapter walks the filesystem.

use std::path::{Path, PathBuf};

use crate::domain::newtypes::RemoteDir;
use crate::domain::task::UploadTask;

/// An eligible publish directory paired with its logical remote location
///
/// This is a port-level DTO; the scanner decides eligibility and derives
/// the remote directory, the engine only carries the pair forward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EligibleDir {
    /// Absolute local path of the publish directory
    pub local_path: PathBuf,
    /// Logical remote directory the contents map to
    pub remote_dir: RemoteDir,
}

/// Port trait for discovering publishable content under a local root
#[async_trait::async_trait]
pub trait ISourceScanner: Send + Sync {
    /// Finds all eligible publish directories under the root
    ///
    /// Unreadable directories are skipped with a warning, never treated as
    /// fatal.
    ///
    /// # Arguments
    /// * `root` - Absolute path of the local root to scan
    ///
    /// # Returns
    /// Eligible directories in discovery order
    async fn find_eligible_directories(&self, root: &Path) -> anyhow::Result<Vec<EligibleDir>>;

    /// Lists the files directly inside each eligible directory
    ///
    /// Only direct children count; nested subdirectories are not descended
    /// into.
    ///
    /// # Arguments
    /// * `dirs` - Eligible directories from `find_eligible_directories`
    ///
    /// # Returns
    /// One task per file, in directory order
    async fn list_files(&self, dirs: &[EligibleDir]) -> anyhow::Result<Vec<UploadTask>>;
}
