//! larkpush-drive - Lark/Feishu Drive API client
//!
//! Provides the async client for:
//! - Tenant access token acquisition and refresh
//! - Folder listing and creation in the drive explorer
//! - Multipart file uploads
//! - Sliding-window rate limiting across all API calls
//!
//! ## Modules
//!
//! - [`auth`] - Tenant token provider with expiry-margin refresh
//! - [`client`] - Drive API HTTP client with proxy support
//! - [`folders`] - Folder lookup and creation, with pagination
//! - [`provider`] - [`IDriveProvider`] implementation tying it all together
//! - [`rate_limit`] - Sliding-window limiter shared by every call
//! - [`upload`] - Multipart streaming upload
//!
//! [`IDriveProvider`]: larkpush_core::ports::IDriveProvider

pub mod auth;
pub mod client;
pub mod folders;
pub mod provider;
pub mod rate_limit;
pub mod upload;

pub use client::{DriveClient, ProxyMode};
pub use provider::FeishuDriveProvider;
