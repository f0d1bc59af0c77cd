//! Domain error types
//!
//! This module defines two error families: [`DomainError`] for validation
//! failures at construction time (invalid newtypes, malformed tasks, illegal
//! phase transitions), and [`UploadError`] for the run-level taxonomy the
//! orchestrator uses to decide between aborting the run and failing a
//! single task.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur when constructing or transitioning domain values
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Invalid remote folder token
    #[error("Invalid folder token: {0}")]
    InvalidFolderToken(String),

    /// Invalid logical remote directory
    #[error("Invalid remote directory: {0}")]
    InvalidRemoteDir(String),

    /// Invalid content digest
    #[error("Invalid digest: {0}")]
    InvalidDigest(String),

    /// Invalid upload task field
    #[error("Invalid task: {0}")]
    InvalidTask(String),

    /// Invalid run phase transition attempt
    #[error("Invalid phase transition from {from} to {to}")]
    InvalidPhase {
        /// The current phase
        from: String,
        /// The attempted target phase
        to: String,
    },
}

/// Run-level error taxonomy
///
/// `Configuration` and `Authentication` are fatal: the run aborts before or
/// at the point they occur. The remaining variants are per-task: they are
/// recorded against the task (or the tasks under a directory) and never
/// abort sibling work.
#[derive(Debug, Error)]
pub enum UploadError {
    /// Required configuration is missing or invalid (fatal)
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Token exchange against the auth endpoint failed (fatal)
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// A logical directory could not be found or created
    #[error("folder resolution failed for '{dir}': {reason}")]
    FolderResolution {
        /// The logical remote directory that could not be resolved
        dir: String,
        /// Underlying cause
        reason: String,
    },

    /// The remote store rejected or aborted a single file transfer
    #[error("transfer failed for '{key}'{}: {reason}", fmt_code(.code))]
    Transfer {
        /// Logical key of the failed task
        key: String,
        /// Application-level error code, when the remote returned one
        code: Option<i64>,
        /// Underlying cause or remote error message
        reason: String,
    },

    /// A local file could not be read
    #[error("local i/o error for '{path}': {source}")]
    LocalIo {
        /// The unreadable local path
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl UploadError {
    /// Whether this error aborts the whole run rather than a single task
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Configuration(_) | Self::Authentication(_))
    }
}

fn fmt_code(code: &Option<i64>) -> String {
    match code {
        Some(code) => format!(" (code {code})"),
        None => String::new(),
    }
}
