//! Domain newtypes with validation
//!
//! Strongly-typed wrappers for remote folder identifiers, logical remote
//! directories, and content digests. Each newtype ensures data validity at
//! construction time.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::DomainError;

// ============================================================================
// FolderToken
// ============================================================================

/// Remote folder identifier (opaque drive token)
///
/// Format: alphanumeric string such as "fldcnqquW1svRIYVT2Np6IuLCKd".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FolderToken(String);

impl FolderToken {
    /// Create a new FolderToken
    ///
    /// # Errors
    /// Returns error if the token is empty or contains invalid characters
    pub fn new(token: String) -> Result<Self, DomainError> {
        if token.is_empty() {
            return Err(DomainError::InvalidFolderToken(
                "Folder token cannot be empty".to_string(),
            ));
        }

        // Drive tokens are alphanumeric with occasional - or _
        if !token
            .chars()
            .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
        {
            return Err(DomainError::InvalidFolderToken(format!(
                "Folder token contains invalid characters: {token}"
            )));
        }

        Ok(Self(token))
    }

    /// Get the inner string reference
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for FolderToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for FolderToken {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.to_string())
    }
}

impl TryFrom<String> for FolderToken {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<FolderToken> for String {
    fn from(token: FolderToken) -> Self {
        token.0
    }
}

// ============================================================================
// RemoteDir
// ============================================================================

/// Logical remote directory path, e.g. "ProjectA/00_Publish"
///
/// Slash-delimited, relative to the configured root folder. No leading or
/// trailing slash, no empty segments, no traversal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RemoteDir(String);

impl RemoteDir {
    /// Create a new RemoteDir
    ///
    /// # Errors
    /// Returns error if the path is empty, has leading/trailing slashes,
    /// empty segments, or traversal components
    pub fn new(path: String) -> Result<Self, DomainError> {
        if path.is_empty() {
            return Err(DomainError::InvalidRemoteDir(
                "Remote directory cannot be empty".to_string(),
            ));
        }

        if path.starts_with('/') || path.ends_with('/') {
            return Err(DomainError::InvalidRemoteDir(format!(
                "Remote directory must not start or end with '/': {path}"
            )));
        }

        if path.contains('\\') {
            return Err(DomainError::InvalidRemoteDir(format!(
                "Remote directory must use '/' separators: {path}"
            )));
        }

        for segment in path.split('/') {
            if segment.is_empty() {
                return Err(DomainError::InvalidRemoteDir(format!(
                    "Remote directory contains an empty segment: {path}"
                )));
            }
            if segment == "." || segment == ".." {
                return Err(DomainError::InvalidRemoteDir(format!(
                    "Remote directory contains a traversal segment: {path}"
                )));
            }
        }

        Ok(Self(path))
    }

    /// Get the inner string reference
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Ordered path segments, outermost first
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }

    /// The logical history key for a file inside this directory
    #[must_use]
    pub fn key_for(&self, file_name: &str) -> String {
        format!("{}/{file_name}", self.0)
    }
}

impl Display for RemoteDir {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RemoteDir {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.to_string())
    }
}

impl TryFrom<String> for RemoteDir {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<RemoteDir> for String {
    fn from(dir: RemoteDir) -> Self {
        dir.0
    }
}

// ============================================================================
// Digest
// ============================================================================

/// SHA-256 content digest in lowercase hex
///
/// Format: exactly 64 hexadecimal characters. Uppercase input is normalized
/// to lowercase so hand-edited history files still compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Digest(String);

impl Digest {
    /// Expected hex length of a SHA-256 digest
    const EXPECTED_LEN: usize = 64;

    /// Create a new Digest
    ///
    /// # Errors
    /// Returns error if the string is not 64 hex characters
    pub fn new(hex: String) -> Result<Self, DomainError> {
        if hex.len() != Self::EXPECTED_LEN {
            return Err(DomainError::InvalidDigest(format!(
                "Digest has wrong length: expected {} hex chars, got {}",
                Self::EXPECTED_LEN,
                hex.len()
            )));
        }

        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(DomainError::InvalidDigest(format!(
                "Digest is not valid hex: {hex}"
            )));
        }

        Ok(Self(hex.to_lowercase()))
    }

    /// Get the inner string reference
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Digest {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Digest {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.to_string())
    }
}

impl TryFrom<String> for Digest {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<Digest> for String {
    fn from(digest: Digest) -> Self {
        digest.0
    }
}

// ============================================================================
// Tests
// ============================================================================
