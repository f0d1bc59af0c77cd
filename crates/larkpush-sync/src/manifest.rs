//! Failure manifest
//!
//! Every run that ends with failed tasks writes their serialized form to a
//! manifest file. A later `--retry` invocation replays exactly those tasks
//! without re-scanning the tree. A clean run deletes the manifest, so its
//! presence always means the last run left work behind.
//!
//! Entries carry the derived `logical_key` alongside the task fields for
//! whoever inspects the file by hand; loading revalidates the task fields
//! and ignores the stored key.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use larkpush_core::domain::UploadTask;
use serde::Serialize;
use tracing::{debug, info};

/// Default manifest file name
pub const DEFAULT_MANIFEST_FILE: &str = "failed_uploads.json";

/// Serialized manifest entry
#[derive(Debug, Serialize)]
struct ManifestEntry<'a> {
    local_path: &'a Path,
    remote_dir: &'a str,
    file_name: &'a str,
    logical_key: String,
}

impl<'a> From<&'a UploadTask> for ManifestEntry<'a> {
    fn from(task: &'a UploadTask) -> Self {
        Self {
            local_path: task.local_path(),
            remote_dir: task.remote_dir().as_str(),
            file_name: task.file_name(),
            logical_key: task.logical_key(),
        }
    }
}

/// Persisted list of failed upload tasks
#[derive(Debug, Clone)]
pub struct FailureManifest {
    path: PathBuf,
}

impl FailureManifest {
    /// Creates a manifest handle for `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the manifest file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether a manifest file currently exists.
    pub async fn exists(&self) -> bool {
        tokio::fs::try_exists(&self.path).await.unwrap_or(false)
    }

    /// Writes the failed tasks, replacing any prior manifest.
    pub async fn save(&self, tasks: &[UploadTask]) -> Result<()> {
        let entries: Vec<ManifestEntry<'_>> = tasks.iter().map(ManifestEntry::from).collect();
        let json =
            serde_json::to_string_pretty(&entries).context("serializing failure manifest")?;

        tokio::fs::write(&self.path, json)
            .await
            .with_context(|| format!("writing {}", self.path.display()))?;

        info!(
            path = %self.path.display(),
            tasks = tasks.len(),
            "Wrote failure manifest"
        );
        Ok(())
    }

    /// Loads the failed tasks of the previous run.
    ///
    /// # Errors
    /// A missing or unparseable manifest is an error: retry mode must not
    /// silently run against half a task list.
    pub async fn load(&self) -> Result<Vec<UploadTask>> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("no failure manifest at {}", self.path.display()))?;

        let tasks: Vec<UploadTask> = serde_json::from_str(&content)
            .with_context(|| format!("parsing failure manifest {}", self.path.display()))?;

        debug!(
            path = %self.path.display(),
            tasks = tasks.len(),
            "Loaded failure manifest"
        );
        Ok(tasks)
    }

    /// Deletes the manifest after a clean run. Missing file is fine.
    pub async fn remove(&self) -> Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {
                debug!(path = %self.path.display(), "Removed failure manifest");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => {
                Err(e).with_context(|| format!("removing manifest {}", self.path.display()))
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
