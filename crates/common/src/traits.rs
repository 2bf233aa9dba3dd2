use async_trait::async_trait;

use crate::error::{DeliveryError, FetchError};
use crate::types::{DeliveryPayload, DeliveryReceipt, Notification};

/// Source of unread notifications.
#[async_trait]
pub trait NotificationFeed: Send + Sync {
    /// Fetch the current unread notifications, in the order the source
    /// returns them (newest first for GitHub).
    async fn fetch(&self) -> Result<Vec<Notification>, FetchError>;
}

/// Destination for rendered delivery payloads.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Deliver one payload. An `Ok` receipt means the receiver answered,
    /// whatever the status.
    async fn deliver(&self, payload: &DeliveryPayload) -> Result<DeliveryReceipt, DeliveryError>;

    /// Human-readable name for logs.
    fn name(&self) -> &'static str;
}
