//! Port definitions (hexagonal architecture interfaces)
//!
//! This module defines the port traits that form the boundaries of the
//! hexagonal architecture. Ports are interfaces that the domain core
//! depends on, but whose implementations live in adapter crates.
//!
//! ## Ports Overview
//!
//! - [`IDriveProvider`] - Remote drive operations (auth, folders, uploads)
//! - [`ISourceScanner`] - Local discovery of publish directories and files

pub mod drive_provider;
pub mod source_scanner;

pub use drive_provider::IDriveProvider;
pub use source_scanner::{EligibleDir, ISourceScanner};
