//! Tenant access token acquisition and refresh
//!
//! The open platform authenticates server apps with a short-lived tenant
//! access token obtained from the app credentials. The token endpoint is
//! the one call that does NOT use the `{code, msg, data}` envelope: the
//! token and its lifetime come back at the top level of the response.
//!
//! [`TokenProvider`] caches the current token together with its expiry
//! (tracked on the monotonic clock) and hands out clones until the token
//! enters the refresh margin, at which point the next caller refreshes it
//! in-band. All of this happens under one async mutex, so concurrent
//! workers never race two refreshes.

use std::time::Duration;

use anyhow::Result;
use larkpush_core::domain::UploadError;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::client::DriveClient;

/// Token endpoint path, relative to the API base
const TOKEN_PATH: &str = "/open-apis/auth/v3/tenant_access_token/internal";

/// Tokens inside this margin of expiry are refreshed before use
pub const REFRESH_MARGIN: Duration = Duration::from_secs(300);

// ============================================================================
// Wire types
// ============================================================================

/// Request body for the tenant token endpoint
#[derive(Debug, Serialize)]
struct TokenRequest<'a> {
    app_id: &'a str,
    app_secret: &'a str,
}

/// Response body of the tenant token endpoint
///
/// On rejection (`code != 0`) the token fields are absent.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    code: i64,
    #[serde(default)]
    msg: String,
    #[serde(default)]
    tenant_access_token: Option<String>,
    /// Token lifetime in seconds, typically 7200
    #[serde(default)]
    expire: u64,
}

// ============================================================================
// TokenProvider
// ============================================================================

/// A token plus the monotonic instant it stops being valid
#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    expires_at: Instant,
}

impl CachedToken {
    /// Whether the token is still outside the refresh margin
    fn is_fresh(&self, now: Instant) -> bool {
        now + REFRESH_MARGIN < self.expires_at
    }
}

/// Caching tenant access token provider
///
/// Shared across all workers of a run. [`TokenProvider::get_token`] is the
/// only entry point; it transparently performs the initial exchange and
/// any refresh. Failures are [`UploadError::Authentication`], which the
/// run treats as fatal.
#[derive(Debug)]
pub struct TokenProvider {
    client: DriveClient,
    app_id: String,
    app_secret: String,
    cached: Mutex<Option<CachedToken>>,
}

impl TokenProvider {
    /// Creates a provider for the given app credentials.
    pub fn new(
        client: DriveClient,
        app_id: impl Into<String>,
        app_secret: impl Into<String>,
    ) -> Self {
        Self {
            client,
            app_id: app_id.into(),
            app_secret: app_secret.into(),
            cached: Mutex::new(None),
        }
    }

    /// Returns a valid tenant access token, refreshing if needed.
    ///
    /// Holds the internal lock across the refresh so that concurrent
    /// callers wait for one exchange instead of issuing their own.
    ///
    /// # Errors
    /// [`UploadError::Authentication`] when the endpoint is unreachable,
    /// returns a non-success HTTP status, or rejects the credentials
    /// with a non-zero code.
    pub async fn get_token(&self) -> Result<String> {
        let mut cached = self.cached.lock().await;

        if let Some(token) = cached.as_ref() {
            if token.is_fresh(Instant::now()) {
                return Ok(token.value.clone());
            }
            debug!("Tenant token inside refresh margin, refreshing");
        }

        let fresh = self.fetch_token().await?;
        let value = fresh.value.clone();
        *cached = Some(fresh);
        Ok(value)
    }

    /// Performs the token exchange against the auth endpoint.
    async fn fetch_token(&self) -> Result<CachedToken> {
        let response = self
            .client
            .request(Method::POST, TOKEN_PATH)
            .json(&TokenRequest {
                app_id: &self.app_id,
                app_secret: &self.app_secret,
            })
            .send()
            .await
            .map_err(|e| UploadError::Authentication(format!("token request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(UploadError::Authentication(format!(
                "token endpoint returned HTTP {status}"
            ))
            .into());
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| UploadError::Authentication(format!("malformed token response: {e}")))?;

        if body.code != 0 {
            return Err(UploadError::Authentication(format!(
                "token exchange rejected with code {}: {}",
                body.code, body.msg
            ))
            .into());
        }

        let value = body.tenant_access_token.ok_or_else(|| {
            UploadError::Authentication("token response carried no tenant_access_token".to_string())
        })?;

        info!(expire_secs = body.expire, "Obtained tenant access token");

        Ok(CachedToken {
            value,
            expires_at: Instant::now() + Duration::from_secs(body.expire),
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
