//! Publish directory discovery
//!
//! Walks the local root for directories eligible to publish, under three
//! fixed layout rules:
//!
//! 1. `<root>/01_BCG/00_Publish` is taken directly when present.
//! 2. `<root>/02_Policy/02_GPS` and `<root>/02_Policy/03_EPS` are searched
//!    recursively for directories named `00_Publish`.
//! 3. `<root>/03_Reg_WI/02_in working Reg WI` is searched recursively the
//!    same way.
//!
//! Everything else under the root is ignored. Each eligible directory maps
//! to the logical remote directory `<parent name>/00_Publish`, and only its
//! direct files become tasks. Unreadable directories are logged and
//! skipped.

use std::path::{Path, PathBuf};

use anyhow::Result;
use async_trait::async_trait;
use larkpush_core::domain::{RemoteDir, UploadTask};
use larkpush_core::ports::{EligibleDir, ISourceScanner};
use tracing::{debug, warn};

/// Name every publish directory carries
pub const PUBLISH_DIR: &str = "00_Publish";

/// Subtrees searched recursively for publish directories, relative to root
const RECURSIVE_ROOTS: &[&[&str]] = &[
    &["02_Policy", "02_GPS"],
    &["02_Policy", "03_EPS"],
    &["03_Reg_WI", "02_in working Reg WI"],
];

/// Filesystem scanner for the fixed publish layout
///
/// Stateless; the layout rules are baked in. The engine only sees the
/// [`ISourceScanner`] port, so tests swap in a fake tree instead.
#[derive(Debug, Default)]
pub struct PublishDirScanner;

impl PublishDirScanner {
    /// Creates a scanner.
    pub fn new() -> Self {
        Self
    }

    /// Walks `base` for directories named `00_Publish`, depth-first.
    ///
    /// A matched publish directory is not descended into. Directories
    /// that cannot be read are logged and skipped.
    async fn collect_publish_dirs(&self, base: &Path, found: &mut Vec<EligibleDir>) {
        let mut stack = vec![base.to_path_buf()];

        while let Some(dir) = stack.pop() {
            let mut entries = match tokio::fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) => {
                    warn!(path = %dir.display(), error = %e, "Skipping unreadable directory");
                    continue;
                }
            };

            loop {
                let entry = match entries.next_entry().await {
                    Ok(Some(entry)) => entry,
                    Ok(None) => break,
                    Err(e) => {
                        warn!(path = %dir.display(), error = %e, "Skipping unreadable entry");
                        break;
                    }
                };

                let is_dir = entry
                    .file_type()
                    .await
                    .map(|t| t.is_dir())
                    .unwrap_or(false);
                if !is_dir {
                    continue;
                }

                let path = entry.path();
                if entry.file_name() == PUBLISH_DIR {
                    match eligible_for(&path) {
                        Ok(eligible) => found.push(eligible),
                        Err(e) => {
                            warn!(path = %path.display(), error = %e, "Skipping publish directory");
                        }
                    }
                } else {
                    stack.push(path);
                }
            }
        }
    }
}

/// Derives the eligible-directory record for a publish directory.
///
/// The logical remote directory is `<parent name>/<publish name>`.
fn eligible_for(path: &Path) -> Result<EligibleDir> {
    let parent_name = path
        .parent()
        .and_then(Path::file_name)
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow::anyhow!("publish directory has no usable parent name"))?;

    let remote_dir = RemoteDir::new(format!("{parent_name}/{PUBLISH_DIR}"))?;
    Ok(EligibleDir {
        local_path: path.to_path_buf(),
        remote_dir,
    })
}

#[async_trait]
impl ISourceScanner for PublishDirScanner {
    #[tracing::instrument(skip(self), fields(root = %root.display()))]
    async fn find_eligible_directories(&self, root: &Path) -> Result<Vec<EligibleDir>> {
        let mut found = Vec::new();

        // Rule 1: the BCG publish directory is taken as-is.
        let direct = root.join("01_BCG").join(PUBLISH_DIR);
        if tokio::fs::metadata(&direct).await.map(|m| m.is_dir()).unwrap_or(false) {
            found.push(eligible_for(&direct)?);
        }

        // Rules 2 and 3: recursive search under the fixed subtrees.
        for segments in RECURSIVE_ROOTS {
            let base = segments.iter().fold(root.to_path_buf(), |p, s| p.join(s));
            if !tokio::fs::metadata(&base).await.map(|m| m.is_dir()).unwrap_or(false) {
                debug!(path = %base.display(), "Search root absent, skipping");
                continue;
            }
            self.collect_publish_dirs(&base, &mut found).await;
        }

        // Filesystem iteration order is not stable; sort for determinism.
        found.sort_by(|a, b| a.local_path.cmp(&b.local_path));
        debug!(eligible = found.len(), "Discovery finished");
        Ok(found)
    }

    async fn list_files(&self, dirs: &[EligibleDir]) -> Result<Vec<UploadTask>> {
        let mut tasks = Vec::new();

        for dir in dirs {
            let mut entries = match tokio::fs::read_dir(&dir.local_path).await {
                Ok(entries) => entries,
                Err(e) => {
                    warn!(
                        path = %dir.local_path.display(),
                        error = %e,
                        "Skipping unreadable publish directory"
                    );
                    continue;
                }
            };

            let mut names: Vec<(String, PathBuf)> = Vec::new();
            while let Ok(Some(entry)) = entries.next_entry().await {
                let is_file = entry
                    .file_type()
                    .await
                    .map(|t| t.is_file())
                    .unwrap_or(false);
                if !is_file {
                    continue;
                }

                match entry.file_name().to_str() {
                    Some(name) => names.push((name.to_string(), entry.path())),
                    None => {
                        warn!(
                            path = %entry.path().display(),
                            "Skipping file with non-UTF-8 name"
                        );
                    }
                }
            }
            names.sort();

            for (name, path) in names {
                tasks.push(UploadTask::new(path, dir.remote_dir.clone(), name)?);
            }
        }

        debug!(tasks = tasks.len(), "Listed publish files");
        Ok(tasks)
    }
}

// ============================================================================
// Tests
// ============================================================================
