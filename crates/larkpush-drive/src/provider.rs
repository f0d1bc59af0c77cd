//! [`IDriveProvider`] implementation for the Lark/Feishu drive
//!
//! Bundles the HTTP client, the tenant token provider, and the shared
//! rate limiter into the provider interface the upload engine works
//! against. Every method fetches the current token (cached outside the
//! refresh margin) and routes the actual call through the rate limiter.

use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use larkpush_core::config::Config;
use larkpush_core::domain::{FolderToken, UploadError};
use larkpush_core::ports::IDriveProvider;
use tracing::debug;

use crate::auth::TokenProvider;
use crate::client::{DriveClient, ProxyMode};
use crate::folders;
use crate::rate_limit::SlidingWindowLimiter;
use crate::upload;

/// Drive provider backed by the Lark/Feishu open platform
///
/// Cheap to share behind an `Arc`; all interior state (token cache, rate
/// limiter window) is already synchronized.
#[derive(Debug)]
pub struct FeishuDriveProvider {
    client: DriveClient,
    tokens: TokenProvider,
    limiter: SlidingWindowLimiter,
}

impl FeishuDriveProvider {
    /// Creates a provider from its parts.
    pub fn new(
        client: DriveClient,
        app_id: impl Into<String>,
        app_secret: impl Into<String>,
        limiter: SlidingWindowLimiter,
    ) -> Self {
        Self {
            tokens: TokenProvider::new(client.clone(), app_id, app_secret),
            client,
            limiter,
        }
    }

    /// Creates a provider from the application configuration.
    ///
    /// # Errors
    /// [`UploadError::Configuration`] when credentials are missing. An
    /// invalid proxy URL also fails construction.
    pub fn from_config(config: &Config) -> Result<Self> {
        let missing = config.missing_credentials();
        if !missing.is_empty() {
            return Err(
                UploadError::Configuration(format!("missing: {}", missing.join(", "))).into(),
            );
        }

        // Bypass turns proxying off entirely; system env proxies must not
        // apply either. Otherwise an explicit URL wins over env settings.
        let proxy = if config.proxy.bypass {
            ProxyMode::Disabled
        } else {
            match config.effective_proxy_url() {
                Some(url) => ProxyMode::Explicit(url),
                None => ProxyMode::System,
            }
        };
        let client = DriveClient::new(config.transfer.api_base.clone(), proxy)?;
        let limiter = SlidingWindowLimiter::new(
            config.transfer.rate_limit_calls as usize,
            Duration::from_secs_f64(config.transfer.rate_limit_period_secs),
        );

        let app_id = config.credentials.app_id.clone().unwrap_or_default();
        let app_secret = config.credentials.app_secret.clone().unwrap_or_default();

        Ok(Self::new(client, app_id, app_secret, limiter))
    }

    /// Returns the base URL this provider talks to.
    pub fn base_url(&self) -> &str {
        self.client.base_url()
    }
}

#[async_trait]
impl IDriveProvider for FeishuDriveProvider {
    /// Validates the credentials by forcing a token exchange.
    async fn authenticate(&self) -> Result<()> {
        debug!("Authenticating against the drive API");
        self.limiter.acquire().await;
        self.tokens.get_token().await.map(|_| ())
    }

    async fn find_child_folder(
        &self,
        parent: &FolderToken,
        name: &str,
    ) -> Result<Option<FolderToken>> {
        let token = self.tokens.get_token().await?;
        folders::find_child_folder(&self.client, &self.limiter, &token, parent, name).await
    }

    async fn create_folder(&self, parent: &FolderToken, name: &str) -> Result<FolderToken> {
        let token = self.tokens.get_token().await?;
        folders::create_folder(&self.client, &self.limiter, &token, parent, name).await
    }

    async fn upload_file(
        &self,
        local_path: &Path,
        file_name: &str,
        parent: &FolderToken,
    ) -> Result<()> {
        let token = self.tokens.get_token().await?;
        upload::upload_file(
            &self.client,
            &self.limiter,
            &token,
            local_path,
            file_name,
            parent,
        )
        .await
    }
}

// ============================================================================
// Tests
// ============================================================================
