//! Shared fixtures for engine integration tests
//!
//! Provides an in-memory drive double with call counters and failure
//! injection, plus helpers to build publish trees on disk and wire an
//! engine against a scratch state directory.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use larkpush_core::domain::{FolderToken, UploadError, UploadTask};
use larkpush_core::ports::IDriveProvider;
use larkpush_sync::history::{HistoryStore, DEFAULT_HISTORY_FILE};
use larkpush_sync::manifest::{FailureManifest, DEFAULT_MANIFEST_FILE};
use larkpush_sync::{EngineOptions, PublishDirScanner, UploadEngine};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

/// Remote folder all test runs resolve under
pub const ROOT_TOKEN: &str = "root";

// ============================================================================
// FakeDriveProvider
// ============================================================================

/// In-memory drive standing in for the real provider
///
/// Folders live in a (parent, name) map so find/create behave like the
/// remote namespace. Failure injection is keyed by folder or file name.
#[derive(Default)]
pub struct FakeDriveProvider {
    folders: Mutex<HashMap<(String, String), String>>,
    uploads: Mutex<Vec<String>>,
    failing_uploads: Mutex<HashSet<String>>,
    failing_folders: Mutex<HashSet<String>>,
    fail_auth: AtomicBool,
    auth_calls: AtomicUsize,
    find_calls: AtomicUsize,
    create_calls: AtomicUsize,
    upload_calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    upload_delay: Mutex<Option<Duration>>,
    cancel_after: Mutex<Option<(usize, CancellationToken)>>,
}

impl FakeDriveProvider {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Uploads of this file name fail with a quota error.
    pub fn fail_upload(&self, file_name: &str) {
        self.failing_uploads
            .lock()
            .unwrap()
            .insert(file_name.to_string());
    }

    /// Creation of a folder with this name fails with a permission error.
    pub fn fail_folder(&self, name: &str) {
        self.failing_folders
            .lock()
            .unwrap()
            .insert(name.to_string());
    }

    /// Token exchange fails from now on.
    pub fn refuse_auth(&self) {
        self.fail_auth.store(true, Ordering::SeqCst);
    }

    /// Every upload sleeps this long before completing.
    pub fn slow_uploads(&self, delay: Duration) {
        *self.upload_delay.lock().unwrap() = Some(delay);
    }

    /// Cancels `token` once the n-th upload call has started.
    pub fn cancel_after(&self, uploads: usize, token: CancellationToken) {
        *self.cancel_after.lock().unwrap() = Some((uploads, token));
    }

    pub fn auth_count(&self) -> usize {
        self.auth_calls.load(Ordering::SeqCst)
    }

    pub fn find_count(&self) -> usize {
        self.find_calls.load(Ordering::SeqCst)
    }

    pub fn create_count(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn upload_count(&self) -> usize {
        self.upload_calls.load(Ordering::SeqCst)
    }

    /// Highest number of uploads observed in flight at once.
    pub fn peak_concurrency(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Successful uploads as `<parent-token>/<file-name>`, arrival order.
    pub fn uploaded(&self) -> Vec<String> {
        self.uploads.lock().unwrap().clone()
    }
}

#[async_trait]
impl IDriveProvider for FakeDriveProvider {
    async fn authenticate(&self) -> anyhow::Result<()> {
        self.auth_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_auth.load(Ordering::SeqCst) {
            return Err(
                UploadError::Authentication("code 10003: invalid app_secret".to_string()).into(),
            );
        }
        Ok(())
    }

    async fn find_child_folder(
        &self,
        parent: &FolderToken,
        name: &str,
    ) -> anyhow::Result<Option<FolderToken>> {
        self.find_calls.fetch_add(1, Ordering::SeqCst);
        let found = self
            .folders
            .lock()
            .unwrap()
            .get(&(parent.as_str().to_string(), name.to_string()))
            .cloned();
        match found {
            Some(token) => Ok(Some(FolderToken::new(token)?)),
            None => Ok(None),
        }
    }

    async fn create_folder(
        &self,
        parent: &FolderToken,
        name: &str,
    ) -> anyhow::Result<FolderToken> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_folders.lock().unwrap().contains(name) {
            return Err(UploadError::Transfer {
                key: name.to_string(),
                code: Some(1061004),
                reason: "no permission to create folder".to_string(),
            }
            .into());
        }

        let token = format!("{}-{}", parent.as_str(), name);
        self.folders.lock().unwrap().insert(
            (parent.as_str().to_string(), name.to_string()),
            token.clone(),
        );
        Ok(FolderToken::new(token)?)
    }

    async fn upload_file(
        &self,
        local_path: &Path,
        file_name: &str,
        parent: &FolderToken,
    ) -> anyhow::Result<()> {
        let calls = self.upload_calls.fetch_add(1, Ordering::SeqCst) + 1;
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        if let Some((after, token)) = self.cancel_after.lock().unwrap().clone() {
            if calls >= after {
                token.cancel();
            }
        }

        let delay = *self.upload_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if !local_path.exists() {
            return Err(UploadError::LocalIo {
                path: local_path.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
            }
            .into());
        }

        if self.failing_uploads.lock().unwrap().contains(file_name) {
            return Err(UploadError::Transfer {
                key: file_name.to_string(),
                code: Some(1061045),
                reason: "file quota exceeded".to_string(),
            }
            .into());
        }

        self.uploads
            .lock()
            .unwrap()
            .push(format!("{}/{}", parent.as_str(), file_name));
        Ok(())
    }
}

// ============================================================================
// Fixture helpers
// ============================================================================

/// Subtree the scanner searches recursively; projects nest under it so the
/// real discovery rules pick them up.
const SCAN_SUBTREE: &str = "02_Policy/02_GPS";

/// Builds `<root>/02_Policy/02_GPS/<project>/00_Publish/<file>` trees with
/// the given contents. The derived remote dir is `<project>/00_Publish`.
pub fn publish_tree(projects: &[(&str, &[(&str, &str)])]) -> TempDir {
    let root = TempDir::new().unwrap();
    for (project, files) in projects {
        let dir = root.path().join(SCAN_SUBTREE).join(project).join("00_Publish");
        std::fs::create_dir_all(&dir).unwrap();
        for (name, contents) in *files {
            std::fs::write(dir.join(name), contents).unwrap();
        }
    }
    root
}

/// Path of a file inside a `publish_tree` project.
pub fn publish_file(root: &Path, project: &str, name: &str) -> PathBuf {
    root.join(SCAN_SUBTREE).join(project).join("00_Publish").join(name)
}

/// Wires an engine against the real scanner and a scratch state dir.
///
/// History and manifest live under `state` so tests can reload them after
/// a run to assert on what was persisted.
pub async fn build_engine(
    state: &Path,
    provider: Arc<FakeDriveProvider>,
    options: EngineOptions,
) -> UploadEngine {
    let history = HistoryStore::load(state.join(DEFAULT_HISTORY_FILE)).await;
    let manifest = FailureManifest::new(state.join(DEFAULT_MANIFEST_FILE));
    UploadEngine::new(
        provider,
        Arc::new(PublishDirScanner::new()),
        FolderToken::new(ROOT_TOKEN.to_string()).unwrap(),
        history,
        manifest,
        options,
    )
}

pub fn history_path(state: &Path) -> PathBuf {
    state.join(DEFAULT_HISTORY_FILE)
}

pub fn manifest_path(state: &Path) -> PathBuf {
    state.join(DEFAULT_MANIFEST_FILE)
}

/// Reloads the persisted history and looks up one key.
pub async fn history_digest(state: &Path, key: &str) -> Option<String> {
    let store = HistoryStore::load(history_path(state)).await;
    store.get(key).await.map(|d| d.as_str().to_string())
}

/// Loads the persisted failure manifest.
pub async fn manifest_tasks(state: &Path) -> Vec<UploadTask> {
    FailureManifest::new(manifest_path(state))
        .load()
        .await
        .unwrap()
}
