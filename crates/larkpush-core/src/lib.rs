//! larkpush Core - Domain logic and business rules
//!
//! This crate contains the hexagonal architecture core with:
//! - **Domain types** - `UploadTask`, validated newtypes, the run phase
//!   machine, the error taxonomy, and the `RunReport` summary
//! - **Port definitions** - Traits for adapters: `IDriveProvider`,
//!   `ISourceScanner`
//! - **Configuration** - YAML config with environment overrides
//!
//! # Architecture
//!
//! This crate follows the hexagonal (ports & adapters) architecture pattern.
//! The domain module contains pure business logic with no external I/O.
//! Ports define trait interfaces that adapter crates implement: the drive
//! adapter talks to the remote document store, the scanner adapter walks the
//! local publish tree, and the sync crate orchestrates both through the
//! port interfaces.

pub mod config;
pub mod domain;
pub mod ports;
