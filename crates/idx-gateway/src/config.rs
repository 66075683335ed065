//! Gateway configuration.

use std::path::Path;
use std::time::Duration;

use idx_auth::Credential;
use idx_client::{HttpConfig, RetryPolicy, DEFAULT_PRIVATE_URL, DEFAULT_PUBLIC_URL};
use serde::Deserialize;
use tracing::info;

use crate::error::{AppError, AppResult};

pub const API_KEY_VAR: &str = "INDODAX_API_KEY";
pub const API_SECRET_VAR: &str = "INDODAX_API_SECRET";
/// Older name for the secret variable, still honoured.
pub const LEGACY_SECRET_VAR: &str = "INDODAX_SECRET_KEY";

/// Gateway configuration, loaded from TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_private_url")]
    pub private_url: String,

    #[serde(default = "default_public_url")]
    pub public_url: String,

    /// Per-attempt HTTP timeout.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default)]
    pub retry: RetryConfig,
}

fn default_private_url() -> String {
    DEFAULT_PRIVATE_URL.to_string()
}

fn default_public_url() -> String {
    DEFAULT_PUBLIC_URL.to_string()
}

fn default_timeout_ms() -> u64 {
    30_000
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            private_url: default_private_url(),
            public_url: default_public_url(),
            timeout_ms: default_timeout_ms(),
            retry: RetryConfig::default(),
        }
    }
}

/// Transport retry settings.
#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    /// Total attempts for idempotent operations, including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
}

fn default_max_attempts() -> u32 {
    2
}

fn default_backoff_ms() -> u64 {
    250
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff_ms: default_backoff_ms(),
        }
    }
}

impl GatewayConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &str) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Failed to read config: {e}")))?;

        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> AppResult<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path`, falling back to defaults when it does not exist.
    pub fn load_or_default(path: &str) -> AppResult<Self> {
        if Path::new(path).exists() {
            Self::from_file(path)
        } else {
            info!(config_path = %path, "Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    fn validate(&self) -> AppResult<()> {
        if self.timeout_ms == 0 {
            return Err(AppError::Config("timeout_ms must be positive".into()));
        }
        if self.retry.max_attempts == 0 {
            return Err(AppError::Config("retry.max_attempts must be at least 1".into()));
        }
        Ok(())
    }

    pub fn http_config(&self) -> HttpConfig {
        HttpConfig {
            private_url: self.private_url.clone(),
            public_url: self.public_url.clone(),
            timeout: Duration::from_millis(self.timeout_ms),
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retry.max_attempts,
            backoff: Duration::from_millis(self.retry.backoff_ms),
        }
    }
}

/// Read the API credential through `lookup` (normally `std::env::var`).
///
/// Empty values count as missing.
pub fn load_credential<F>(lookup: F) -> AppResult<Credential>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    let key = get(API_KEY_VAR).ok_or(AppError::MissingCredential(API_KEY_VAR))?;
    let secret = get(API_SECRET_VAR)
        .or_else(|| get(LEGACY_SECRET_VAR))
        .ok_or(AppError::MissingCredential(API_SECRET_VAR))?;

    Ok(Credential::new(key, secret))
}
