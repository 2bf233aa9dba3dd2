//! Delivery pipeline.
//!
//! Given a fetched notification list and the current watermark:
//! 1. Walks the list oldest-first (GitHub returns newest-first, and the
//!    list is sorted by `updated_at` in case the feed is not strictly ordered)
//! 2. Drops anything at or below the watermark
//! 3. Renders and delivers each remaining notification
//! 4. Computes the candidate watermark for the cycle
//!
//! Delivery is best-effort. A failed delivery is logged and the watermark
//! still moves past it, so one bad item never wedges the feed.

use chrono::{DateTime, Utc};

use octoping_common::traits::NotificationSink;
use octoping_common::types::{Notification, Watermark};

use crate::render::Renderer;

/// Tallies for one pass over the feed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleOutcome {
    /// Items newer than the watermark
    pub examined: usize,
    /// Items at or below the watermark
    pub skipped: usize,
    /// Items whose `updated_at` could not be parsed
    pub invalid: usize,
    /// Deliveries answered with a 2xx status
    pub delivered: usize,
    /// Deliveries that errored or got a non-2xx answer
    pub failed: usize,
    /// Watermark after this pass
    pub watermark: Option<Watermark>,
}

impl CycleOutcome {
    /// Whether the pass moved the watermark beyond `previous`.
    pub fn advanced_from(&self, previous: Option<Watermark>) -> bool {
        match (self.watermark, previous) {
            (Some(new), Some(old)) => new > old,
            (Some(_), None) => true,
            (None, _) => false,
        }
    }
}

/// Parse a GitHub timestamp (`2024-05-01T10:00:00Z`) into UTC.
pub fn parse_timestamp(raw: &str) -> Result<Watermark, chrono::ParseError> {
    DateTime::parse_from_rfc3339(raw).map(|ts| ts.with_timezone(&Utc))
}

/// Filters, orders, renders and forwards notifications.
pub struct DeliveryPipeline<S> {
    sink: S,
    renderer: Renderer,
}

impl<S: NotificationSink> DeliveryPipeline<S> {
    pub fn new(sink: S, renderer: Renderer) -> Self {
        Self { sink, renderer }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Deliver every notification newer than `watermark`, oldest first.
    pub async fn process(
        &self,
        notifications: &[Notification],
        watermark: Option<Watermark>,
    ) -> CycleOutcome {
        let mut outcome = CycleOutcome {
            watermark,
            ..Default::default()
        };

        let mut pending = Vec::with_capacity(notifications.len());
        for notification in notifications.iter().rev() {
            match parse_timestamp(&notification.updated_at) {
                Ok(ts) => pending.push((ts, notification)),
                Err(e) => {
                    tracing::warn!(
                        id = %notification.id,
                        updated_at = %notification.updated_at,
                        error = %e,
                        "Skipping notification with unparseable timestamp"
                    );
                    outcome.invalid += 1;
                }
            }
        }
        // Stable, so equal timestamps keep the reversed feed order.
        pending.sort_by_key(|(ts, _)| *ts);

        for (updated_at, notification) in pending {
            if watermark.is_some_and(|w| updated_at <= w) {
                outcome.skipped += 1;
                continue;
            }

            outcome.examined += 1;
            let payload = self.renderer.payload(notification);

            match self.sink.deliver(&payload).await {
                Ok(receipt) if receipt.success => {
                    tracing::info!(
                        id = %notification.id,
                        reason = %notification.reason,
                        repository = %notification.repository.full_name,
                        status = receipt.status,
                        "Notification delivered"
                    );
                    outcome.delivered += 1;
                }
                Ok(receipt) => {
                    tracing::warn!(
                        id = %notification.id,
                        sink = self.sink.name(),
                        status = receipt.status,
                        "Webhook answered with non-success status"
                    );
                    outcome.failed += 1;
                }
                Err(e) => {
                    tracing::warn!(
                        id = %notification.id,
                        sink = self.sink.name(),
                        error = %e,
                        "Notification delivery failed"
                    );
                    outcome.failed += 1;
                }
            }

            if outcome.watermark.is_none_or(|w| updated_at > w) {
                outcome.watermark = Some(updated_at);
            }
        }

        outcome
    }
}
