//! Integration tests for larkpush-sync
//!
//! Runs the upload engine end-to-end against real publish trees on disk
//! and an in-memory drive double, covering idempotence, change detection,
//! failure capture, retry, force, dry-run, cancellation, and pool width.

mod common;
