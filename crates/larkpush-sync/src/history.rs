//! Upload history store
//!
//! Maps each logical key to the digest of the bytes last transferred
//! successfully. The mapping is loaded once at the start of a run, mutated
//! by concurrent workers as transfers succeed, and written back wholesale
//! at the end. A key is present exactly when some prior run transferred
//! that file; failed transfers record nothing.
//!
//! The on-disk form is a flat, pretty-printed JSON object. A missing or
//! corrupt file downgrades to an empty mapping with a warning, so a lost
//! history only costs re-uploads, never the run.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use larkpush_core::domain::Digest;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Default history file name
pub const DEFAULT_HISTORY_FILE: &str = ".upload_history.json";

/// Durable logical key to digest mapping
///
/// Interior mutability behind an async mutex: workers call [`record`]
/// concurrently during the transfer phase, each read-modify-write runs
/// under the lock.
///
/// [`record`]: HistoryStore::record
#[derive(Debug)]
pub struct HistoryStore {
    path: PathBuf,
    entries: Mutex<HashMap<String, Digest>>,
}

impl HistoryStore {
    /// Creates an empty store that will persist to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Loads the store from `path`.
    ///
    /// Missing file means a first run; a file that fails to parse is
    /// logged and treated as empty. Neither case is an error.
    pub async fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();

        let entries = match tokio::fs::read_to_string(&path).await {
            Ok(content) => match serde_json::from_str::<HashMap<String, Digest>>(&content) {
                Ok(entries) => {
                    debug!(
                        path = %path.display(),
                        entries = entries.len(),
                        "Loaded upload history"
                    );
                    entries
                }
                Err(e) => {
                    warn!(
                        path = %path.display(),
                        error = %e,
                        "Upload history is corrupt, starting with an empty one"
                    );
                    HashMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No upload history yet");
                HashMap::new()
            }
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "Upload history is unreadable, starting with an empty one"
                );
                HashMap::new()
            }
        };

        Self {
            path,
            entries: Mutex::new(entries),
        }
    }

    /// Returns the stored digest for a logical key, if any.
    pub async fn get(&self, key: &str) -> Option<Digest> {
        self.entries.lock().await.get(key).cloned()
    }

    /// Records the digest of a successfully transferred file.
    pub async fn record(&self, key: impl Into<String>, digest: Digest) {
        self.entries.lock().await.insert(key.into(), digest);
    }

    /// Number of recorded keys.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    /// Whether the store holds no keys.
    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    /// Persists the full mapping atomically.
    ///
    /// Writes to a sibling temp file and renames over the target, so a
    /// crash mid-write never leaves a half-written history behind.
    pub async fn save(&self) -> Result<()> {
        let entries = self.entries.lock().await;
        let json = serde_json::to_string_pretty(&*entries).context("serializing upload history")?;
        drop(entries);

        // Temp file in the same directory so the rename stays on one
        // filesystem.
        let tmp_path = {
            let mut p = self.path.as_os_str().to_owned();
            p.push(".tmp");
            PathBuf::from(p)
        };

        tokio::fs::write(&tmp_path, json)
            .await
            .with_context(|| format!("writing {}", tmp_path.display()))?;
        tokio::fs::rename(&tmp_path, &self.path)
            .await
            .with_context(|| format!("renaming into {}", self.path.display()))?;

        debug!(path = %self.path.display(), "Saved upload history");
        Ok(())
    }

    /// Path the store persists to.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

// ============================================================================
// Tests
// ============================================================================
