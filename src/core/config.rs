//! Configuration management

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

use crate::core::errors::{Result, SyncError};

/// Default REST endpoint for the Google Cloud Translation v2 API
const DEFAULT_API_ENDPOINT: &str = "https://translation.googleapis.com/language/translate/v2";

/// Configuration for the translation provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslatorConfig {
    /// API key sent with every request
    pub api_key: String,
    /// Endpoint the provider posts to
    pub api_endpoint: String,
    /// Retries per leaf before giving up on it
    pub max_retries: u32,
    /// Base delay between retries, doubled per attempt
    pub retry_delay_ms: u64,
    /// Per-request timeout
    pub timeout_ms: u64,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            api_key: std::env::var("TRANSLATE_API_KEY").unwrap_or_default(),
            api_endpoint: std::env::var("TRANSLATE_API_ENDPOINT")
                .unwrap_or_else(|_| DEFAULT_API_ENDPOINT.to_string()),
            max_retries: 2,
            retry_delay_ms: 500,
            timeout_ms: 30000,
        }
    }
}

impl TranslatorConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("TRANSLATE_API_KEY").map_err(|_| SyncError::Config {
            message: "TRANSLATE_API_KEY environment variable is required".to_string(),
        })?;

        let api_endpoint = std::env::var("TRANSLATE_API_ENDPOINT")
            .unwrap_or_else(|_| DEFAULT_API_ENDPOINT.to_string());

        let max_retries = parse_env("MAX_RETRIES", 2)?;
        let retry_delay_ms = parse_env("RETRY_DELAY_MS", 500)?;
        let timeout_ms = parse_env("REQUEST_TIMEOUT_MS", 30000)?;

        Ok(Self {
            api_key,
            api_endpoint,
            max_retries,
            retry_delay_ms,
            timeout_ms,
        })
    }

    /// Load from JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.api_key.is_empty() {
            return Err(SyncError::Config {
                message: "API key is required".to_string(),
            });
        }

        if self.api_endpoint.is_empty() {
            return Err(SyncError::Config {
                message: "API endpoint is required".to_string(),
            });
        }

        if self.timeout_ms == 0 {
            return Err(SyncError::Config {
                message: "timeout_ms must be greater than 0".to_string(),
            });
        }

        if self.max_retries > 10 {
            warn!("max_retries is unusually high: {}", self.max_retries);
        }

        Ok(())
    }
}

/// Read a numeric env var, falling back to `default` when unset
fn parse_env<T: std::str::FromStr>(name: &str, default: T) -> Result<T> {
    match std::env::var(name) {
        Ok(raw) => raw.parse::<T>().map_err(|_| SyncError::Config {
            message: format!("{} must be a number, got {:?}", name, raw),
        }),
        Err(_) => Ok(default),
    }
}
