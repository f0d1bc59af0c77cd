//! Run report
//!
//! Aggregated outcome of a single upload run, serialized as-is for JSON
//! output and summarized for the human formatter.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::task::UploadTask;

/// Outcome of an upload run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Whether this was a dry run (no remote calls)
    pub dry_run: bool,
    /// Files found during scanning
    pub discovered: usize,
    /// Files skipped because history already holds their digest
    pub skipped: usize,
    /// Files transferred successfully
    pub transferred: usize,
    /// Files that failed to transfer
    pub failed: usize,
    /// Tasks a dry run would have transferred
    pub planned: Vec<UploadTask>,
    /// Tasks that failed, for the retry manifest
    pub failed_tasks: Vec<UploadTask>,
    /// Human-readable error messages accumulated during the run
    pub errors: Vec<String>,
    /// Whether the run was cancelled before completing
    pub cancelled: bool,
    /// When the run started
    pub started_at: DateTime<Utc>,
    /// When the run finished, None while still in progress
    pub finished_at: Option<DateTime<Utc>>,
}

impl RunReport {
    /// Start a new report with the clock running
    #[must_use]
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            discovered: 0,
            skipped: 0,
            transferred: 0,
            failed: 0,
            planned: Vec::new(),
            failed_tasks: Vec::new(),
            errors: Vec::new(),
            cancelled: false,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Record a failed task together with its error message
    pub fn record_failure(&mut self, task: UploadTask, error: impl Into<String>) {
        self.failed += 1;
        self.errors.push(error.into());
        self.failed_tasks.push(task);
    }

    /// Stop the clock
    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Elapsed run time in milliseconds, up to now if still running
    #[must_use]
    pub fn duration_ms(&self) -> i64 {
        let end = self.finished_at.unwrap_or_else(Utc::now);
        (end - self.started_at).num_milliseconds()
    }

    /// Whether every task succeeded and the run completed normally
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failed == 0 && self.errors.is_empty() && !self.cancelled
    }
}

// ============================================================================
// Tests
// ============================================================================
