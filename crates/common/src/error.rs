use std::path::PathBuf;

use thiserror::Error;

/// Invalid or missing startup configuration. Always fatal.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    Missing(&'static str),

    #[error("{key} is invalid: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Failures reading or writing the persisted watermark.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("State file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("State file {} is corrupt: {reason}", path.display())]
    Corrupt { path: PathBuf, reason: String },

    #[error("State encode error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Failures fetching the notification feed.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Notification feed returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Notification feed request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Notification feed returned an undecodable body: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Failures delivering a single payload to the webhook.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("Webhook request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Webhook payload encode error: {0}")]
    Encode(#[from] serde_json::Error),
}
