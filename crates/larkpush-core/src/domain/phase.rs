//! Run phase state machine
//!
//! A run moves through a fixed sequence of phases. Transitions are validated
//! so the engine cannot skip a phase or resurrect a finished run.
//!
//! Normal flow:
//! Idle -> Scanning -> Diffing -> FolderPrecreation -> Transferring -> Finalizing -> Done
//!
//! Shortcuts: Diffing goes straight to Finalizing when nothing survived the
//! diff, and to Done on a dry run. Cancellation is reachable from any busy
//! phase and drains through Finalizing.

use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

use super::errors::DomainError;

/// Phase of an upload run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RunPhase {
    /// No run in progress
    Idle,
    /// Walking the local tree for eligible directories and files
    Scanning,
    /// Hashing files and comparing against history
    Diffing,
    /// Resolving and creating remote folders ahead of transfer
    FolderPrecreation,
    /// Transfer pool is moving files
    Transferring,
    /// Persisting history and the failure manifest
    Finalizing,
    /// Cancellation requested, draining in-flight work
    Cancelling,
    /// Run finished
    Done,
}

impl RunPhase {
    /// Whether a transition from `self` to `next` is legal
    #[must_use]
    pub fn can_transition_to(&self, next: RunPhase) -> bool {
        use RunPhase::{
            Cancelling, Diffing, Done, Finalizing, FolderPrecreation, Idle, Scanning, Transferring,
        };

        matches!(
            (self, next),
            (Idle, Scanning)
                | (Scanning, Diffing)
                | (Scanning, Done)
                | (Diffing, FolderPrecreation)
                | (Diffing, Finalizing)
                | (Diffing, Done)
                | (FolderPrecreation, Transferring)
                | (Transferring, Finalizing)
                | (Finalizing, Done)
                | (Scanning, Cancelling)
                | (Diffing, Cancelling)
                | (FolderPrecreation, Cancelling)
                | (Transferring, Cancelling)
                | (Cancelling, Finalizing)
                | (Cancelling, Done)
        )
    }

    /// Validate and perform a transition
    ///
    /// # Errors
    /// Returns error if the transition is not legal
    pub fn transition_to(&self, next: RunPhase) -> Result<RunPhase, DomainError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(DomainError::InvalidPhase {
                from: self.to_string(),
                to: next.to_string(),
            })
        }
    }

    /// Whether the run has finished
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunPhase::Done)
    }
}

impl Display for RunPhase {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunPhase::Idle => "idle",
            RunPhase::Scanning => "scanning",
            RunPhase::Diffing => "diffing",
            RunPhase::FolderPrecreation => "folder-precreation",
            RunPhase::Transferring => "transferring",
            RunPhase::Finalizing => "finalizing",
            RunPhase::Cancelling => "cancelling",
            RunPhase::Done => "done",
        };
        write!(f, "{s}")
    }
}

// ============================================================================
// Tests
// ============================================================================
