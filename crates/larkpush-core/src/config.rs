//! Configuration module for larkpush.
//!
//! Provides typed configuration structs that map to the YAML configuration file,
//! with loading, validation, defaults, and environment overrides. Environment
//! variables win over file values because credentials are normally injected
//! through the environment rather than written to disk.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Config struct with sub-sections
// ---------------------------------------------------------------------------

/// Top-level configuration for larkpush.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub credentials: CredentialsConfig,
    pub transfer: TransferConfig,
    pub proxy: ProxyConfig,
    pub storage: StorageConfig,
}

/// App credentials and destination folder.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CredentialsConfig {
    /// Application ID issued by the drive platform. `None` until configured.
    pub app_id: Option<String>,
    /// Application secret paired with `app_id`.
    pub app_secret: Option<String>,
    /// Token of the remote root folder all uploads land under.
    pub parent_node: Option<String>,
}

/// Transfer pool and API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferConfig {
    /// Number of concurrent upload workers.
    pub workers: u32,
    /// Maximum API calls per rate-limit window.
    pub rate_limit_calls: u32,
    /// Length of the rate-limit window in seconds.
    pub rate_limit_period_secs: f64,
    /// Base URL of the drive API, no trailing slash.
    pub api_base: String,
}

/// Outbound HTTP proxy settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProxyConfig {
    /// Full proxy URL, e.g. `http://proxy.corp:8080`. Wins over `port`.
    pub url: Option<String>,
    /// Port of a local proxy; expands to `http://127.0.0.1:<port>`.
    pub port: Option<u16>,
    /// When true, no proxy is used even if `url` or `port` is set.
    pub bypass: bool,
}

/// On-disk state file names, resolved relative to the scanned root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// History store mapping logical keys to content digests.
    pub history_file: String,
    /// Manifest of failed tasks written after an unclean run.
    pub manifest_file: String,
}

// ---------------------------------------------------------------------------
// Config::load()
// ---------------------------------------------------------------------------

impl Config {
    /// Load configuration from a YAML file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Try to load from `path`; fall back to [`Config::default`] on any error.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Platform-appropriate default path for the configuration file.
    ///
    /// Typically `$XDG_CONFIG_HOME/larkpush/config.yaml` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("larkpush")
            .join("config.yaml")
    }
}

// ---------------------------------------------------------------------------
// Config::default()
// ---------------------------------------------------------------------------

// Config, CredentialsConfig and ProxyConfig derive Default because all their
// fields implement Default. (clippy::derivable_impls)

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            workers: 5,
            rate_limit_calls: 5,
            rate_limit_period_secs: 1.0,
            api_base: "https://open.feishu.cn".to_string(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            history_file: ".upload_history.json".to_string(),
            manifest_file: "failed_uploads.json".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Environment overrides
// ---------------------------------------------------------------------------

/// Environment variable holding the application ID.
pub const ENV_APP_ID: &str = "FEISHU_APP_ID";
/// Environment variable holding the application secret.
pub const ENV_APP_SECRET: &str = "FEISHU_APP_SECRET";
/// Environment variable holding the remote root folder token.
pub const ENV_PARENT_NODE: &str = "FEISHU_PARENT_NODE";
/// Environment variable holding a full proxy URL.
pub const ENV_PROXY_URL: &str = "PROXY_URL";
/// Environment variable holding a local proxy port.
pub const ENV_PROXY_PORT: &str = "PROXY_PORT";

impl Config {
    /// Apply overrides from the given variable map.
    ///
    /// Pure so tests can drive it without touching the process environment.
    /// Unknown keys are ignored; an unparseable `PROXY_PORT` is ignored with
    /// a warning.
    pub fn apply_overrides(&mut self, vars: &HashMap<String, String>) {
        if let Some(v) = vars.get(ENV_APP_ID) {
            self.credentials.app_id = Some(v.clone());
        }
        if let Some(v) = vars.get(ENV_APP_SECRET) {
            self.credentials.app_secret = Some(v.clone());
        }
        if let Some(v) = vars.get(ENV_PARENT_NODE) {
            self.credentials.parent_node = Some(v.clone());
        }
        if let Some(v) = vars.get(ENV_PROXY_URL) {
            self.proxy.url = Some(v.clone());
        }
        if let Some(v) = vars.get(ENV_PROXY_PORT) {
            match v.parse::<u16>() {
                Ok(port) => self.proxy.port = Some(port),
                Err(_) => {
                    tracing::warn!(value = %v, "ignoring unparseable {ENV_PROXY_PORT}");
                }
            }
        }
    }

    /// Apply overrides from the process environment.
    pub fn apply_env_overrides(&mut self) {
        let vars: HashMap<String, String> = std::env::vars().collect();
        self.apply_overrides(&vars);
    }

    /// Names of required credential fields that are still unset.
    ///
    /// An empty vector means the configuration is runnable.
    pub fn missing_credentials(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.credentials.app_id.is_none() {
            missing.push("credentials.app_id");
        }
        if self.credentials.app_secret.is_none() {
            missing.push("credentials.app_secret");
        }
        if self.credentials.parent_node.is_none() {
            missing.push("credentials.parent_node");
        }
        missing
    }

    /// The proxy URL to use, after applying precedence rules.
    ///
    /// `bypass` wins over everything, an explicit `url` wins over `port`,
    /// and a bare `port` expands to a localhost URL.
    pub fn effective_proxy_url(&self) -> Option<String> {
        if self.proxy.bypass {
            return None;
        }
        if let Some(url) = &self.proxy.url {
            return Some(url.clone());
        }
        self.proxy.port.map(|port| format!("http://127.0.0.1:{port}"))
    }
}

// ---------------------------------------------------------------------------
// Config::validate()
// ---------------------------------------------------------------------------

/// A single validation error found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path to the offending field, e.g. `"transfer.workers"`.
    pub field: String,
    /// Human-readable explanation.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl Config {
    /// Validate the configuration and return all errors found.
    ///
    /// An empty vector means the configuration is structurally valid.
    /// Missing credentials are reported by [`Config::missing_credentials`]
    /// instead, so a fresh config still validates.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        // --- transfer ---
        if self.transfer.workers == 0 || self.transfer.workers > 64 {
            errors.push(ValidationError {
                field: "transfer.workers".into(),
                message: "must be in range 1..=64".into(),
            });
        }
        if self.transfer.rate_limit_calls == 0 {
            errors.push(ValidationError {
                field: "transfer.rate_limit_calls".into(),
                message: "must be greater than 0".into(),
            });
        }
        if !(self.transfer.rate_limit_period_secs > 0.0) {
            errors.push(ValidationError {
                field: "transfer.rate_limit_period_secs".into(),
                message: "must be greater than 0".into(),
            });
        }
        if !self.transfer.api_base.starts_with("http://")
            && !self.transfer.api_base.starts_with("https://")
        {
            errors.push(ValidationError {
                field: "transfer.api_base".into(),
                message: format!(
                    "must start with http:// or https://, got '{}'",
                    self.transfer.api_base
                ),
            });
        }
        if self.transfer.api_base.ends_with('/') {
            errors.push(ValidationError {
                field: "transfer.api_base".into(),
                message: "must not end with '/'".into(),
            });
        }

        // --- proxy ---
        if self.proxy.port == Some(0) {
            errors.push(ValidationError {
                field: "proxy.port".into(),
                message: "must be greater than 0".into(),
            });
        }

        // --- storage ---
        for (field, value) in [
            ("storage.history_file", &self.storage.history_file),
            ("storage.manifest_file", &self.storage.manifest_file),
        ] {
            if value.is_empty() {
                errors.push(ValidationError {
                    field: field.into(),
                    message: "must not be empty".into(),
                });
            } else if value.contains('/') || value.contains('\\') {
                errors.push(ValidationError {
                    field: field.into(),
                    message: format!("must be a bare file name, got '{value}'"),
                });
            }
        }

        errors
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
