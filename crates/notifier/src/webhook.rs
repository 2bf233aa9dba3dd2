use std::time::Duration;

use async_trait::async_trait;

use octoping_common::error::DeliveryError;
use octoping_common::traits::NotificationSink;
use octoping_common::types::{DeliveryPayload, DeliveryReceipt};

/// Default per-request timeout for webhook calls.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// POSTs delivery payloads as JSON to a fixed URL.
///
/// Any HTTP status counts as "the receiver answered"; only transport errors
/// and timeouts are returned as `Err`.
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), url, DEFAULT_TIMEOUT)
    }

    pub fn with_client(client: reqwest::Client, url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client,
            url: url.into(),
            timeout,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl NotificationSink for WebhookNotifier {
    async fn deliver(&self, payload: &DeliveryPayload) -> Result<DeliveryReceipt, DeliveryError> {
        let body = serde_json::to_vec(payload)?;

        let resp = self
            .client
            .post(&self.url)
            .timeout(self.timeout)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;

        let status = resp.status();
        tracing::debug!(id = %payload.id, status = status.as_u16(), "Webhook responded");

        Ok(DeliveryReceipt {
            status: status.as_u16(),
            success: status.is_success(),
        })
    }

    fn name(&self) -> &'static str {
        "webhook"
    }
}
