//! Content fingerprinting
//!
//! Change detection compares a file's SHA-256 digest against the one stored
//! in the upload history. Files are read in fixed-size chunks so the cost
//! in memory is constant regardless of file size.

use std::path::Path;

use anyhow::Result;
use larkpush_core::domain::{Digest, UploadError};
use sha2::{Digest as _, Sha256};
use tokio::io::AsyncReadExt;
use tracing::trace;

/// Read chunk size for fingerprinting
pub const CHUNK_SIZE: usize = 8192;

/// Computes the SHA-256 digest of a file's contents.
///
/// # Errors
/// [`UploadError::LocalIo`] when the file cannot be opened or read. The
/// caller fails only the task for this file, never the run.
pub async fn fingerprint(path: &Path) -> Result<Digest> {
    let mut file = tokio::fs::File::open(path)
        .await
        .map_err(|source| UploadError::LocalIo {
            path: path.to_path_buf(),
            source,
        })?;

    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; CHUNK_SIZE];

    loop {
        let read = file
            .read(&mut buffer)
            .await
            .map_err(|source| UploadError::LocalIo {
                path: path.to_path_buf(),
                source,
            })?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }

    let hex = format!("{:x}", hasher.finalize());
    trace!(path = %path.display(), digest = %hex, "Fingerprinted file");
    Ok(Digest::new(hex)?)
}

// ============================================================================
// Tests
// ============================================================================
