//! Upload task types
//!
//! An [`UploadTask`] pairs a local file with its logical remote directory.
//! Tasks are created during scanning, filtered during diffing, and handed to
//! the transfer pool. A [`PendingUpload`] is a task that survived the diff
//! together with the digest computed at diff time.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::errors::DomainError;
use super::newtypes::{Digest, RemoteDir};

// ============================================================================
// UploadTask
// ============================================================================

/// A single file queued for transfer
///
/// The logical key (`<remote_dir>/<file_name>`) identifies the task in the
/// history store and in failure manifests, independent of the local root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TaskRecord", into = "TaskRecord")]
pub struct UploadTask {
    local_path: PathBuf,
    remote_dir: RemoteDir,
    file_name: String,
}

impl UploadTask {
    /// Create a new UploadTask
    ///
    /// # Errors
    /// Returns error if the local path is not absolute or the file name is
    /// empty or contains a path separator
    pub fn new(
        local_path: PathBuf,
        remote_dir: RemoteDir,
        file_name: String,
    ) -> Result<Self, DomainError> {
        if !local_path.is_absolute() {
            return Err(DomainError::InvalidTask(format!(
                "Local path must be absolute: {}",
                local_path.display()
            )));
        }

        if file_name.is_empty() {
            return Err(DomainError::InvalidTask(
                "File name cannot be empty".to_string(),
            ));
        }

        if file_name.contains('/') || file_name.contains('\\') {
            return Err(DomainError::InvalidTask(format!(
                "File name must not contain path separators: {file_name}"
            )));
        }

        Ok(Self {
            local_path,
            remote_dir,
            file_name,
        })
    }

    /// Absolute path of the local file
    #[must_use]
    pub fn local_path(&self) -> &Path {
        &self.local_path
    }

    /// Logical remote directory the file belongs to
    #[must_use]
    pub fn remote_dir(&self) -> &RemoteDir {
        &self.remote_dir
    }

    /// File name as it will appear remotely
    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// History key: `<remote_dir>/<file_name>`
    #[must_use]
    pub fn logical_key(&self) -> String {
        self.remote_dir.key_for(&self.file_name)
    }
}

/// Serialized form of an UploadTask
///
/// Kept separate so deserialization re-runs validation.
#[derive(Debug, Serialize, Deserialize)]
struct TaskRecord {
    local_path: PathBuf,
    remote_dir: RemoteDir,
    file_name: String,
}

impl TryFrom<TaskRecord> for UploadTask {
    type Error = DomainError;

    fn try_from(record: TaskRecord) -> Result<Self, Self::Error> {
        Self::new(record.local_path, record.remote_dir, record.file_name)
    }
}

impl From<UploadTask> for TaskRecord {
    fn from(task: UploadTask) -> Self {
        Self {
            local_path: task.local_path,
            remote_dir: task.remote_dir,
            file_name: task.file_name,
        }
    }
}

// ============================================================================
// PendingUpload
// ============================================================================

/// A task that passed the diff, with the digest computed at that point
///
/// The digest is recorded into history only after the transfer succeeds, so
/// a file changed on disk after diffing is picked up again on the next run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingUpload {
    pub task: UploadTask,
    pub digest: Digest,
}

impl PendingUpload {
    /// Pair a diffed task with its content digest
    #[must_use]
    pub fn new(task: UploadTask, digest: Digest) -> Self {
        Self { task, digest }
    }
}

// ============================================================================
// Tests
// ============================================================================
