//! Upload engine
//!
//! Drives a full run through the phase machine: scan the local tree (or
//! load the failure manifest in retry mode), diff candidates against the
//! upload history, pre-create every distinct remote folder serially, fan
//! the surviving tasks out to a bounded transfer pool, then persist
//! history and the failure manifest.
//!
//! Fatal errors (configuration, authentication, a missing retry manifest)
//! abort the run as `Err`. Everything per-task is caught at the task
//! boundary, recorded in the [`RunReport`], and never stops sibling work.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use larkpush_core::domain::{
    FolderToken, PendingUpload, RemoteDir, RunPhase, RunReport, UploadError, UploadTask,
};
use larkpush_core::ports::{IDriveProvider, ISourceScanner};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::fingerprint;
use crate::history::HistoryStore;
use crate::manifest::FailureManifest;
use crate::resolver::RemotePathResolver;

/// Default transfer pool width
pub const DEFAULT_POOL_WIDTH: usize = 5;

// ============================================================================
// EngineOptions
// ============================================================================

/// Run mode switches
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Diff and list intended transfers without any remote I/O
    pub dry_run: bool,
    /// Transfer every candidate regardless of history
    pub force: bool,
    /// Replay the failure manifest instead of scanning
    pub retry: bool,
    /// Transfer pool width; 1 means serial execution
    pub workers: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            force: false,
            retry: false,
            workers: DEFAULT_POOL_WIDTH,
        }
    }
}

// ============================================================================
// UploadEngine
// ============================================================================

/// Outcome of one transfer pool task
enum TaskOutcome {
    /// Uploaded and recorded in history
    Transferred,
    /// Attempted (or unresolvable) and failed
    Failed { task: UploadTask, error: String },
    /// Cancellation observed before the task started
    NotStarted,
}

/// Phased upload orchestrator
///
/// Owns the history store and manifest for the run; talks to the drive
/// and the local tree through ports only.
pub struct UploadEngine {
    provider: Arc<dyn IDriveProvider>,
    scanner: Arc<dyn ISourceScanner>,
    resolver: Arc<RemotePathResolver>,
    history: Arc<HistoryStore>,
    manifest: FailureManifest,
    options: EngineOptions,
}

impl UploadEngine {
    /// Creates an engine for one run.
    ///
    /// # Arguments
    /// * `provider` - Remote drive port (authenticated lazily)
    /// * `scanner` - Local discovery port
    /// * `root_folder` - Remote folder all logical paths resolve under
    /// * `history` - Loaded history store
    /// * `manifest` - Failure manifest handle
    /// * `options` - Mode switches and pool width
    pub fn new(
        provider: Arc<dyn IDriveProvider>,
        scanner: Arc<dyn ISourceScanner>,
        root_folder: FolderToken,
        history: HistoryStore,
        manifest: FailureManifest,
        options: EngineOptions,
    ) -> Self {
        let resolver = Arc::new(RemotePathResolver::new(Arc::clone(&provider), root_folder));
        Self {
            provider,
            scanner,
            resolver,
            history: Arc::new(history),
            manifest,
            options,
        }
    }

    /// Runs the full pipeline once.
    ///
    /// Returns the aggregated report; per-task failures live inside it.
    /// `Err` means the run never got to (or through) the transfer phase:
    /// failed authentication, a fatal scanner error, or a missing retry
    /// manifest.
    #[tracing::instrument(skip(self, cancel), fields(root = %root.display()))]
    pub async fn run(&self, root: &Path, cancel: CancellationToken) -> Result<RunReport> {
        let mut report = RunReport::new(self.options.dry_run);
        let mut phase = RunPhase::Idle;

        // Credential problems must surface before any tree walking; a dry
        // run performs no remote I/O at all, so it skips this too.
        if !self.options.dry_run {
            self.provider.authenticate().await?;
        }

        // ==================== Scanning ====================
        phase = phase.transition_to(RunPhase::Scanning)?;
        info!(
            retry = self.options.retry,
            force = self.options.force,
            workers = self.options.workers,
            "Run started"
        );

        let tasks: Vec<UploadTask> = if self.options.retry {
            let tasks = self.manifest.load().await?;
            info!(tasks = tasks.len(), "Replaying failure manifest");
            tasks
        } else {
            let dirs = self.scanner.find_eligible_directories(root).await?;
            debug!(dirs = dirs.len(), "Eligible directories collected");
            self.scanner.list_files(&dirs).await?
        };
        report.discovered = tasks.len();

        if tasks.is_empty() {
            info!("Nothing to upload");
            phase.transition_to(RunPhase::Done)?;
            report.finish();
            return Ok(report);
        }

        if cancel.is_cancelled() {
            return self.finalize_cancelled(phase, report).await;
        }

        // ==================== Diffing ====================
        phase = phase.transition_to(RunPhase::Diffing)?;
        let mut pending: Vec<PendingUpload> = Vec::new();

        for task in tasks {
            let digest = match fingerprint::fingerprint(task.local_path()).await {
                Ok(digest) => digest,
                Err(e) => {
                    warn!(key = %task.logical_key(), error = %e, "Cannot fingerprint file");
                    report.record_failure(task, format!("{e:#}"));
                    continue;
                }
            };

            // Retry mode replays every manifest task; force ignores
            // history. Otherwise an unchanged digest means a skip.
            if !self.options.force && !self.options.retry {
                if let Some(stored) = self.history.get(&task.logical_key()).await {
                    if stored == digest {
                        debug!(key = %task.logical_key(), "Unchanged, skipping");
                        report.skipped += 1;
                        continue;
                    }
                }
            }

            pending.push(PendingUpload::new(task, digest));
        }
        info!(
            pending = pending.len(),
            skipped = report.skipped,
            "Diff finished"
        );

        if self.options.dry_run {
            report.planned = pending.into_iter().map(|p| p.task).collect();
            phase.transition_to(RunPhase::Done)?;
            report.finish();
            info!(planned = report.planned.len(), "Dry run finished");
            return Ok(report);
        }

        if pending.is_empty() {
            return self.finalize(phase, report).await;
        }

        if cancel.is_cancelled() {
            return self.finalize_cancelled(phase, report).await;
        }

        // ==================== FolderPrecreation ====================
        // Strictly serial: racing find-or-create calls for the same
        // segment would create duplicate remote folders.
        phase = phase.transition_to(RunPhase::FolderPrecreation)?;
        let dirs = distinct_dirs(&pending);
        info!(dirs = dirs.len(), "Pre-creating remote folders");

        for dir in &dirs {
            if let Err(e) = self.resolver.resolve(dir).await {
                // Tasks under this directory fail individually during
                // the transfer phase.
                warn!(dir = %dir, error = %e, "Folder pre-creation failed");
            }
        }

        if cancel.is_cancelled() {
            return self.finalize_cancelled(phase, report).await;
        }

        // ==================== Transferring ====================
        phase = phase.transition_to(RunPhase::Transferring)?;
        let semaphore = Arc::new(Semaphore::new(self.options.workers.max(1)));
        let mut pool = JoinSet::new();

        for item in pending {
            pool.spawn(Self::transfer_task(
                Arc::clone(&self.provider),
                Arc::clone(&self.resolver),
                Arc::clone(&self.history),
                Arc::clone(&semaphore),
                cancel.clone(),
                item,
            ));
        }

        while let Some(joined) = pool.join_next().await {
            match joined {
                Ok(TaskOutcome::Transferred) => report.transferred += 1,
                Ok(TaskOutcome::Failed { task, error }) => report.record_failure(task, error),
                Ok(TaskOutcome::NotStarted) => {}
                Err(e) => {
                    error!(error = %e, "Transfer worker panicked");
                    report.errors.push(format!("transfer worker failed: {e}"));
                }
            }
        }

        if cancel.is_cancelled() {
            return self.finalize_cancelled(phase, report).await;
        }
        self.finalize(phase, report).await
    }

    /// One pool task: admission, cancellation check, resolve, upload.
    async fn transfer_task(
        provider: Arc<dyn IDriveProvider>,
        resolver: Arc<RemotePathResolver>,
        history: Arc<HistoryStore>,
        semaphore: Arc<Semaphore>,
        cancel: CancellationToken,
        item: PendingUpload,
    ) -> TaskOutcome {
        let _permit = match semaphore.acquire_owned().await {
            Ok(permit) => permit,
            // The semaphore lives for the whole phase and is never closed.
            Err(_) => return TaskOutcome::NotStarted,
        };

        if cancel.is_cancelled() {
            debug!(key = %item.task.logical_key(), "Cancelled before start");
            return TaskOutcome::NotStarted;
        }

        let task = item.task;
        let key = task.logical_key();

        // The cache was warmed during pre-creation; a miss here means
        // that directory could not be resolved.
        let folder = match resolver.resolve_cached(task.remote_dir()) {
            Some(folder) => folder,
            None => {
                let err = UploadError::FolderResolution {
                    dir: task.remote_dir().to_string(),
                    reason: "folder pre-creation failed".to_string(),
                };
                warn!(key = %key, error = %err, "Transfer failed");
                return TaskOutcome::Failed {
                    task,
                    error: err.to_string(),
                };
            }
        };

        match provider
            .upload_file(task.local_path(), task.file_name(), &folder)
            .await
        {
            Ok(()) => {
                history.record(key.clone(), item.digest).await;
                debug!(key = %key, "Transferred");
                TaskOutcome::Transferred
            }
            Err(e) => {
                let err = classify_failure(&task, e);
                warn!(key = %key, error = %err, "Transfer failed");
                TaskOutcome::Failed {
                    task,
                    error: err.to_string(),
                }
            }
        }
    }

    /// Marks the report cancelled and drains through Finalizing.
    async fn finalize_cancelled(&self, phase: RunPhase, mut report: RunReport) -> Result<RunReport> {
        info!("Cancellation requested, finalizing early");
        report.cancelled = true;
        let phase = phase.transition_to(RunPhase::Cancelling)?;
        self.finalize(phase, report).await
    }

    /// Persists history, writes or clears the manifest, closes the run.
    async fn finalize(&self, phase: RunPhase, mut report: RunReport) -> Result<RunReport> {
        let phase = phase.transition_to(RunPhase::Finalizing)?;
        debug!("Finalizing run");

        if let Err(e) = self.history.save().await {
            warn!(error = %e, "Could not save upload history");
            report.errors.push(format!("saving history: {e:#}"));
        }

        if report.failed > 0 {
            if let Err(e) = self.manifest.save(&report.failed_tasks).await {
                warn!(error = %e, "Could not write failure manifest");
                report.errors.push(format!("writing manifest: {e:#}"));
            }
        } else if !report.cancelled {
            // A fully clean pass leaves no manifest behind. A cancelled
            // run without failures keeps whatever manifest already exists.
            if let Err(e) = self.manifest.remove().await {
                warn!(error = %e, "Could not remove failure manifest");
                report.errors.push(format!("removing manifest: {e:#}"));
            }
        }

        phase.transition_to(RunPhase::Done)?;
        report.finish();
        info!(
            discovered = report.discovered,
            transferred = report.transferred,
            skipped = report.skipped,
            failed = report.failed,
            cancelled = report.cancelled,
            duration_ms = report.duration_ms(),
            "Run finished"
        );
        Ok(report)
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Distinct remote directories among pending tasks, first-seen order.
fn distinct_dirs(pending: &[PendingUpload]) -> Vec<RemoteDir> {
    let mut seen = HashSet::new();
    let mut dirs = Vec::new();
    for item in pending {
        let dir = item.task.remote_dir();
        if seen.insert(dir.as_str().to_string()) {
            dirs.push(dir.clone());
        }
    }
    dirs
}

/// Re-keys a transfer-layer error with the task's logical key.
///
/// The drive adapter only knows the bare file name; the engine owns the
/// full task context.
fn classify_failure(task: &UploadTask, err: anyhow::Error) -> UploadError {
    match err.downcast::<UploadError>() {
        Ok(UploadError::Transfer { code, reason, .. }) => UploadError::Transfer {
            key: task.logical_key(),
            code,
            reason,
        },
        Ok(other) => other,
        Err(err) => UploadError::Transfer {
            key: task.logical_key(),
            code: None,
            reason: format!("{err:#}"),
        },
    }
}

// ============================================================================
// Tests
// ============================================================================
