//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `HEARTH_API_BASE_URL` - Backend REST API base URL (e.g., `https://shop.example.com/api`)
//!
//! ## Optional
//! - `HEARTH_STATE_DIR` - Directory for persisted session and cart state
//!   (default: `$HOME/.hearth`, or `.hearth` when `HOME` is unset)
//! - `HEARTH_HTTP_TIMEOUT_SECS` - Per-request timeout in seconds (default: 30)
//! - `HEARTH_LOG_FORMAT` - `json` for JSON log lines, anything else for text
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error event sample rate (default: 1.0)

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_STATE_DIR: &str = ".hearth";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Storefront client configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Backend REST API base URL, always ending in `/`
    pub api_base_url: Url,
    /// Directory for persisted client state
    pub state_dir: PathBuf,
    /// Per-request HTTP timeout
    pub http_timeout: Duration,
    /// Log line format
    pub log_format: LogFormat,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate
    pub sentry_sample_rate: f32,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let raw_url = lookup("HEARTH_API_BASE_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar("HEARTH_API_BASE_URL".to_string()))?;
        let api_base_url = parse_base_url(&raw_url)
            .map_err(|e| ConfigError::InvalidEnvVar("HEARTH_API_BASE_URL".to_string(), e))?;

        let state_dir = lookup("HEARTH_STATE_DIR").map_or_else(
            || {
                lookup("HOME").map_or_else(
                    || PathBuf::from(DEFAULT_STATE_DIR),
                    |home| PathBuf::from(home).join(DEFAULT_STATE_DIR),
                )
            },
            PathBuf::from,
        );

        let timeout_secs = match lookup("HEARTH_HTTP_TIMEOUT_SECS") {
            Some(raw) => raw
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or_else(|| {
                    ConfigError::InvalidEnvVar(
                        "HEARTH_HTTP_TIMEOUT_SECS".to_string(),
                        format!("expected a positive number of seconds, got `{raw}`"),
                    )
                })?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        let log_format = match lookup("HEARTH_LOG_FORMAT").as_deref() {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Text,
        };

        let sentry_sample_rate = match lookup("SENTRY_SAMPLE_RATE") {
            Some(raw) => raw
                .parse::<f32>()
                .ok()
                .filter(|rate| (0.0..=1.0).contains(rate))
                .ok_or_else(|| {
                    ConfigError::InvalidEnvVar(
                        "SENTRY_SAMPLE_RATE".to_string(),
                        format!("expected a number between 0 and 1, got `{raw}`"),
                    )
                })?,
            None => 1.0,
        };

        Ok(Self {
            api_base_url,
            state_dir,
            http_timeout: Duration::from_secs(timeout_secs),
            log_format,
            sentry_dsn: lookup("SENTRY_DSN").filter(|v| !v.is_empty()),
            sentry_environment: lookup("SENTRY_ENVIRONMENT"),
            sentry_sample_rate,
        })
    }
}

/// Parse an API base URL and normalize it to end with a slash so relative
/// endpoint paths join underneath it.
///
/// # Errors
///
/// Returns a description of the problem if the URL is unparseable or not
/// http(s).
pub fn parse_base_url(raw: &str) -> Result<Url, String> {
    let mut url = Url::parse(raw.trim()).map_err(|e| e.to_string())?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("unsupported scheme `{}`", url.scheme()));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}
