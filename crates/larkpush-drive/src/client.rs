//! Drive API HTTP client
//!
//! Provides a typed HTTP client for the Lark/Feishu open platform. Handles
//! endpoint construction, optional proxy wiring, and the `{code, msg, data}`
//! response envelope every drive endpoint wraps its payload in.

use anyhow::{Context, Result};
use reqwest::{Client, Method, RequestBuilder};
use serde::Deserialize;
use tracing::debug;

// ============================================================================
// Response envelope
// ============================================================================

/// Standard response envelope of the open platform
///
/// Every endpoint returns `{"code": 0, "msg": "success", "data": {...}}`.
/// A non-zero `code` means the request was received but rejected; the HTTP
/// status is usually still 200 in that case.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiEnvelope<T> {
    pub code: i64,
    #[serde(default)]
    pub msg: String,
    pub data: Option<T>,
}

impl<T> ApiEnvelope<T> {
    /// Unwraps the payload, turning a non-zero code into an error
    ///
    /// `what` names the operation for the error message.
    pub fn into_data(self, what: &str) -> Result<T> {
        if self.code != 0 {
            anyhow::bail!("{what} failed with code {}: {}", self.code, self.msg);
        }
        self.data
            .with_context(|| format!("{what} response carried no data"))
    }
}

// ============================================================================
// DriveClient
// ============================================================================

/// Outbound proxy behaviour for drive API calls
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProxyMode {
    /// Honor system proxy settings (`HTTP_PROXY`, `HTTPS_PROXY`)
    System,
    /// Route every request through the given proxy URL
    Explicit(String),
    /// Never proxy, even when system proxy variables are set
    Disabled,
}

/// HTTP client for drive API calls
///
/// Wraps `reqwest::Client` with base URL construction and proxy routing.
/// Authentication is per-request; callers obtain a token from the token
/// provider and pass it to [`DriveClient::authed_request`].
#[derive(Debug, Clone)]
pub struct DriveClient {
    /// The underlying HTTP client
    client: Client,
    /// Base URL for API requests, no trailing slash
    base_url: String,
}

impl DriveClient {
    /// Creates a new DriveClient
    ///
    /// # Arguments
    /// * `base_url` - API base, e.g. `https://open.feishu.cn`
    /// * `proxy` - How outbound requests are proxied
    pub fn new(base_url: impl Into<String>, proxy: ProxyMode) -> Result<Self> {
        let mut builder = Client::builder();
        match proxy {
            ProxyMode::System => {}
            ProxyMode::Explicit(url) => {
                debug!(proxy = %url, "Routing drive API calls through proxy");
                builder = builder.proxy(
                    reqwest::Proxy::all(&url)
                        .with_context(|| format!("Invalid proxy URL: {url}"))?,
                );
            }
            ProxyMode::Disabled => {
                debug!("Proxying disabled for drive API calls");
                builder = builder.no_proxy();
            }
        }
        let client = builder.build().context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    /// Creates an unauthenticated request builder for the given method and path
    ///
    /// Automatically prepends the base URL.
    ///
    /// # Arguments
    /// * `method` - HTTP method
    /// * `path` - API path relative to base URL, e.g. `/open-apis/drive/v1/files`
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        self.client.request(method, url)
    }

    /// Creates a request builder with a bearer token attached
    ///
    /// # Arguments
    /// * `method` - HTTP method
    /// * `path` - API path relative to base URL
    /// * `access_token` - Tenant access token for the Authorization header
    pub fn authed_request(&self, method: Method, path: &str, access_token: &str) -> RequestBuilder {
        self.request(method, path).bearer_auth(access_token)
    }

    /// Returns the base URL for API requests
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

// ============================================================================
// Tests
// ============================================================================
