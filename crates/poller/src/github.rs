//! GitHub notifications feed client.
//!
//! Issues `GET /notifications?all=false`, so only unread threads come back.
//! Threads the user has already read are never returned and so never
//! re-delivered.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, USER_AGENT};

use octoping_common::error::FetchError;
use octoping_common::traits::NotificationFeed;
use octoping_common::types::Notification;

/// Client identifier sent with every API request.
pub const CLIENT_USER_AGENT: &str = "octoping";

const GITHUB_MEDIA_TYPE: &str = "application/vnd.github+json";
const GITHUB_API_VERSION: &str = "2022-11-28";

/// Default per-request timeout for the notifications call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Polls the authenticated user's unread notifications.
pub struct GithubFeed {
    client: reqwest::Client,
    api_url: String,
    token: String,
    timeout: Duration,
}

impl GithubFeed {
    /// `api_url` is the REST root, e.g. `https://api.github.com` (no trailing slash).
    pub fn new(api_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), api_url, token)
    }

    pub fn with_client(
        client: reqwest::Client,
        api_url: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn notifications_url(&self) -> String {
        format!("{}/notifications", self.api_url)
    }
}

#[async_trait]
impl NotificationFeed for GithubFeed {
    /// A page that is not a JSON array fails with `FetchError::Decode`;
    /// individual records that do not decode are logged and dropped.
    async fn fetch(&self) -> Result<Vec<Notification>, FetchError> {
        let url = self.notifications_url();

        let resp = self
            .client
            .get(&url)
            .timeout(self.timeout)
            .query(&[("all", "false")])
            .bearer_auth(&self.token)
            .header(ACCEPT, GITHUB_MEDIA_TYPE)
            .header(USER_AGENT, CLIENT_USER_AGENT)
            .header("X-GitHub-Api-Version", GITHUB_API_VERSION)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(FetchError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = resp.bytes().await?;
        let records: Vec<serde_json::Value> = serde_json::from_slice(&bytes)?;
        let total = records.len();
        let notifications: Vec<Notification> = records
            .into_iter()
            .filter_map(|record| {
                let id = record.get("id").cloned().unwrap_or_default();
                match Notification::from_value(record) {
                    Ok(n) => Some(n),
                    Err(e) => {
                        tracing::warn!(
                            id = %id,
                            error = %e,
                            "Skipping malformed notification record"
                        );
                        None
                    }
                }
            })
            .collect();

        tracing::debug!(
            count = notifications.len(),
            dropped = total - notifications.len(),
            "Fetched notifications"
        );
        Ok(notifications)
    }
}
