//! Drains the outbox into the remote store, one batch per call.

use crate::delivery::DeliveryClient;
use crate::remote::RemoteDocument;
use crate::OutboxResult;
use chrono::{SecondsFormat, Utc};
use outbox_database::OutboxStore;
use tracing::{debug, info, warn};

/// Default maximum events per flush.
pub const DEFAULT_BATCH_SIZE: usize = 5;

/// What one flush did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushReport {
    /// Events fetched from the outbox.
    pub attempted: usize,
    /// Events confirmed remotely and marked sent.
    pub delivered: usize,
    /// Events left pending for a later flush.
    pub unconfirmed: usize,
}

impl FlushReport {
    pub fn is_empty(&self) -> bool {
        self.attempted == 0
    }
}

/// Moves the oldest pending events to the remote store.
///
/// `flush` never sleeps or retries; callers own the pacing.
#[derive(Clone, Debug)]
pub struct FlushCoordinator {
    store: OutboxStore,
    delivery: DeliveryClient,
    batch_size: usize,
}

impl FlushCoordinator {
    pub fn new(store: OutboxStore, delivery: DeliveryClient, batch_size: usize) -> Self {
        Self {
            store,
            delivery,
            batch_size: batch_size.max(1),
        }
    }

    pub fn store(&self) -> &OutboxStore {
        &self.store
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Send one batch of unsent events and mark the confirmed ones sent.
    ///
    /// Unconfirmed events stay unsent. Errors from the remote store are
    /// returned untouched so the caller can decide on a cooldown.
    pub async fn flush(&self) -> OutboxResult<FlushReport> {
        let events = self.store.fetch_unsent(self.batch_size).await?;
        if events.is_empty() {
            return Ok(FlushReport::default());
        }

        let captured_at = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);
        let docs: Vec<RemoteDocument> = events
            .iter()
            .map(|event| RemoteDocument::from_event(event, &captured_at))
            .collect();

        let outcome = self.delivery.send_batch(&docs).await?;

        // Keep local order when marking and logging.
        let succeeded: Vec<String> = docs
            .iter()
            .filter(|d| outcome.succeeded.contains(&d.event_id))
            .map(|d| d.event_id.clone())
            .collect();

        if !succeeded.is_empty() {
            self.store.mark_sent(succeeded.clone()).await?;
            info!(count = succeeded.len(), "Sent log batch to remote store");
            for doc in docs.iter().filter(|d| outcome.succeeded.contains(&d.event_id)) {
                debug!(event_id = %doc.event_id, message = %doc.message, "Delivered event");
            }
        }

        if !outcome.failed.is_empty() {
            warn!(
                count = outcome.failed.len(),
                "Events failed to be confirmed; will retry later"
            );
        }

        Ok(FlushReport {
            attempted: events.len(),
            delivered: succeeded.len(),
            unconfirmed: outcome.failed.len(),
        })
    }
}
