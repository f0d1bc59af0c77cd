//! larkpush Sync - Upload orchestration engine
//!
//! Provides:
//! - Publish-directory discovery under the fixed layout rules
//! - Content-addressed change detection against the upload history
//! - Remote path resolution with a process-lifetime folder cache
//! - Bounded-concurrency transfer with cooperative cancellation
//! - Failure manifest persistence for crash-resilient retry
//!
//! ## Modules
//!
//! - [`discovery`] - `ISourceScanner` adapter walking the local tree
//! - [`engine`] - Phased orchestrator driving a full run
//! - [`fingerprint`] - Streaming SHA-256 content digests
//! - [`history`] - Logical key to digest store with atomic persistence
//! - [`manifest`] - Failed task list consumed by the retry mode
//! - [`resolver`] - Logical directory to folder token resolution

pub mod discovery;
pub mod engine;
pub mod fingerprint;
pub mod history;
pub mod manifest;
pub mod resolver;

pub use discovery::PublishDirScanner;
pub use engine::{EngineOptions, UploadEngine};
