//! Remote path resolution
//!
//! The drive addresses folders by opaque token; the engine thinks in
//! slash-delimited logical directories. [`RemotePathResolver`] bridges the
//! two: it walks a logical path segment by segment from the configured root
//! folder, finding or creating each child, and memoizes every resolved
//! (parent, segment) pair for the rest of the process.
//!
//! The engine resolves all distinct directories serially before the
//! transfer pool starts, so the create calls never race. Workers then use
//! [`RemotePathResolver::resolve_cached`], which is a lock-free cache walk.

use std::sync::Arc;

use anyhow::Result;
use dashmap::DashMap;
use larkpush_core::domain::{FolderToken, RemoteDir, UploadError};
use larkpush_core::ports::IDriveProvider;
use tracing::debug;

/// Logical directory to folder token resolver with a process-lifetime cache
pub struct RemotePathResolver {
    provider: Arc<dyn IDriveProvider>,
    root: FolderToken,
    /// (parent token, child name) -> child token; never invalidated
    cache: DashMap<(FolderToken, String), FolderToken>,
}

impl RemotePathResolver {
    /// Creates a resolver rooted at the configured parent folder.
    pub fn new(provider: Arc<dyn IDriveProvider>, root: FolderToken) -> Self {
        Self {
            provider,
            root,
            cache: DashMap::new(),
        }
    }

    /// Root folder every logical path is relative to.
    pub fn root(&self) -> &FolderToken {
        &self.root
    }

    /// Number of memoized (parent, segment) pairs.
    pub fn cached_segments(&self) -> usize {
        self.cache.len()
    }

    /// Resolves a logical directory, creating missing segments.
    ///
    /// Each segment is looked up in the cache first; on a miss the remote
    /// store is searched for an exactly-named child folder and one is
    /// created when absent. Either way the result is cached before the
    /// walk moves on.
    ///
    /// Must not run concurrently for overlapping paths; the engine calls
    /// it serially during folder pre-creation.
    ///
    /// # Errors
    /// [`UploadError::FolderResolution`] naming the directory when any
    /// lookup or create call fails.
    pub async fn resolve(&self, dir: &RemoteDir) -> Result<FolderToken> {
        let mut parent = self.root.clone();

        for segment in dir.segments() {
            let key = (parent.clone(), segment.to_string());

            if let Some(hit) = self.cache.get(&key) {
                parent = hit.clone();
                continue;
            }

            let found = self
                .provider
                .find_child_folder(&parent, segment)
                .await
                .map_err(|e| resolution_error(dir, &e))?;

            let token = match found {
                Some(token) => {
                    debug!(dir = %dir, segment, token = %token, "Resolved existing folder");
                    token
                }
                None => {
                    let token = self
                        .provider
                        .create_folder(&parent, segment)
                        .await
                        .map_err(|e| resolution_error(dir, &e))?;
                    debug!(dir = %dir, segment, token = %token, "Created missing folder");
                    token
                }
            };

            self.cache.insert(key, token.clone());
            parent = token;
        }

        Ok(parent)
    }

    /// Walks the cache only; `None` means pre-creation failed for `dir`.
    pub fn resolve_cached(&self, dir: &RemoteDir) -> Option<FolderToken> {
        let mut parent = self.root.clone();
        for segment in dir.segments() {
            let key = (parent, segment.to_string());
            parent = self.cache.get(&key)?.clone();
        }
        Some(parent)
    }
}

fn resolution_error(dir: &RemoteDir, cause: &anyhow::Error) -> UploadError {
    UploadError::FolderResolution {
        dir: dir.to_string(),
        reason: format!("{cause:#}"),
    }
}

// ============================================================================
// Tests
// ============================================================================
