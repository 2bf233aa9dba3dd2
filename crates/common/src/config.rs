use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

const DEFAULT_POLL_INTERVAL_SECS: u64 = 60;
const DEFAULT_STATE_FILE: &str = "/data/state.json";
pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";
pub const DEFAULT_GITHUB_WEB_URL: &str = "https://github.com";
const DEFAULT_GITHUB_TIMEOUT_SECS: u64 = 30;
const DEFAULT_WEBHOOK_TIMEOUT_SECS: u64 = 10;

/// Global application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// GitHub token used as the bearer credential for the notifications API
    pub github_token: String,

    /// Destination URL for delivery payloads
    pub webhook_url: String,

    /// Seconds to sleep between poll cycles (default: 60)
    pub poll_interval_secs: u64,

    /// Path of the JSON file holding the watermark
    pub state_file: PathBuf,

    /// Base URL of the GitHub REST API (default: https://api.github.com)
    pub github_api_url: String,

    /// Base URL of the GitHub web UI, used when rewriting API links
    pub github_web_url: String,

    /// Per-request timeout for the notifications API in seconds (default: 30)
    pub github_timeout_secs: u64,

    /// Per-request timeout for webhook delivery in seconds (default: 10)
    pub webhook_timeout_secs: u64,
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// A `.env` file in the working directory is honoured when present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup. Empty values are
    /// treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Ok(Self {
            github_token: get("GITHUB_TOKEN").ok_or(ConfigError::Missing("GITHUB_TOKEN"))?,
            webhook_url: get("WEBHOOK_URL").ok_or(ConfigError::Missing("WEBHOOK_URL"))?,
            poll_interval_secs: parse_positive(
                "POLL_INTERVAL",
                get("POLL_INTERVAL"),
                DEFAULT_POLL_INTERVAL_SECS,
            )?,
            state_file: get("STATE_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_FILE)),
            github_api_url: get("GITHUB_API_URL")
                .unwrap_or_else(|| DEFAULT_GITHUB_API_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            github_web_url: get("GITHUB_WEB_URL")
                .unwrap_or_else(|| DEFAULT_GITHUB_WEB_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            github_timeout_secs: parse_positive(
                "GITHUB_TIMEOUT_SECS",
                get("GITHUB_TIMEOUT_SECS"),
                DEFAULT_GITHUB_TIMEOUT_SECS,
            )?,
            webhook_timeout_secs: parse_positive(
                "WEBHOOK_TIMEOUT_SECS",
                get("WEBHOOK_TIMEOUT_SECS"),
                DEFAULT_WEBHOOK_TIMEOUT_SECS,
            )?,
        })
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn github_timeout(&self) -> Duration {
        Duration::from_secs(self.github_timeout_secs)
    }

    pub fn webhook_timeout(&self) -> Duration {
        Duration::from_secs(self.webhook_timeout_secs)
    }
}

fn parse_positive(
    key: &'static str,
    value: Option<String>,
    default: u64,
) -> Result<u64, ConfigError> {
    let Some(raw) = value else {
        return Ok(default);
    };

    match raw.trim().parse::<u64>() {
        Ok(0) => Err(ConfigError::Invalid {
            key,
            reason: "must be greater than zero".to_string(),
        }),
        Ok(n) => Ok(n),
        Err(_) => Err(ConfigError::Invalid {
            key,
            reason: format!("'{raw}' is not a valid u64"),
        }),
    }
}
