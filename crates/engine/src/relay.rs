//! Cycle driver: fetch, deliver, persist, sleep, repeat.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;

use octoping_common::error::{FetchError, StateError};
use octoping_common::traits::{NotificationFeed, NotificationSink};
use octoping_common::types::Watermark;

use crate::pipeline::{CycleOutcome, DeliveryPipeline};
use crate::state::StateStore;

/// Errors that end the relay loop.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    State(#[from] StateError),
}

/// Owns the in-memory watermark and drives one cycle per tick.
pub struct Relay<F, S> {
    feed: F,
    pipeline: DeliveryPipeline<S>,
    store: StateStore,
    watermark: Option<Watermark>,
    poll_interval: Duration,
}

impl<F, S> Relay<F, S>
where
    F: NotificationFeed,
    S: NotificationSink,
{
    pub fn new(
        feed: F,
        pipeline: DeliveryPipeline<S>,
        store: StateStore,
        watermark: Option<Watermark>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            feed,
            pipeline,
            store,
            watermark,
            poll_interval,
        }
    }

    /// Build a relay seeded with the watermark currently on disk.
    pub async fn start(
        feed: F,
        pipeline: DeliveryPipeline<S>,
        store: StateStore,
        poll_interval: Duration,
    ) -> Result<Self, StateError> {
        let watermark = store.load().await?;
        match watermark {
            Some(w) => tracing::info!(watermark = %w, "Resuming from persisted watermark"),
            None => tracing::info!(
                path = %store.path().display(),
                "No persisted watermark, delivering all unread notifications"
            ),
        }

        Ok(Self::new(feed, pipeline, store, watermark, poll_interval))
    }

    pub fn watermark(&self) -> Option<Watermark> {
        self.watermark
    }

    /// Run a single fetch-deliver-persist pass.
    pub async fn run_cycle(&mut self) -> Result<CycleOutcome, RelayError> {
        let notifications = self.feed.fetch().await?;
        tracing::debug!(count = notifications.len(), "Fetched unread notifications");

        let outcome = self.pipeline.process(&notifications, self.watermark).await;

        if outcome.advanced_from(self.watermark)
            && let Some(new_watermark) = outcome.watermark
        {
            self.store.save(new_watermark).await?;
            self.watermark = Some(new_watermark);
        }

        tracing::info!(
            fetched = notifications.len(),
            examined = outcome.examined,
            skipped = outcome.skipped,
            invalid = outcome.invalid,
            delivered = outcome.delivered,
            failed = outcome.failed,
            watermark = ?self.watermark,
            "Poll cycle complete"
        );

        Ok(outcome)
    }

    /// Run cycles until `shutdown` resolves or a cycle fails.
    pub async fn run<Fut>(&mut self, shutdown: Fut) -> Result<(), RelayError>
    where
        Fut: Future<Output = ()>,
    {
        tracing::info!(
            poll_interval_secs = self.poll_interval.as_secs(),
            sink = self.pipeline.sink().name(),
            "Relay started"
        );

        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                result = self.run_cycle() => {
                    if let Err(e) = result {
                        tracing::error!(error = %e, "Poll cycle failed");
                        return Err(e);
                    }
                }
            }

            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                _ = tokio::time::sleep(self.poll_interval) => {}
            }
        }

        tracing::info!(watermark = ?self.watermark, "Relay stopped");
        Ok(())
    }
}
