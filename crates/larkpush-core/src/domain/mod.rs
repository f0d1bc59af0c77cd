//! Domain entities and business logic
//!
//! This module contains the core domain types for larkpush:
//! - Newtypes for type-safe identifiers and validated domain values
//! - The immutable upload task value type
//! - The run phase state machine
//! - The run report summary
//! - Domain-specific error types

pub mod errors;
pub mod newtypes;
pub mod phase;
pub mod report;
pub mod task;

// Re-export commonly used types
pub use errors::{DomainError, UploadError};
pub use newtypes::{Digest, FolderToken, RemoteDir};
pub use phase::RunPhase;
pub use report::RunReport;
pub use task::{PendingUpload, UploadTask};
