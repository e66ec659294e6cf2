//! Batch delivery with reconciliation.

use crate::remote::{BulkInsertOutcome, RemoteDocument, RemoteStore};
use crate::OutboxResult;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};

/// Partition of one batch after delivery.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryOutcome {
    /// Present in the remote store; safe to mark sent.
    pub succeeded: HashSet<String>,
    /// Not confirmed; stay pending for the next flush.
    pub failed: HashSet<String>,
}

/// Sends bounded batches to the remote store.
///
/// Each call is one unordered bulk insert. When the store reports that some
/// documents did not go in, the batch's ids are looked up remotely and
/// whatever exists now counts as delivered, whoever inserted it. The unique
/// index on `event_id` is what makes retrying the rest safe.
#[derive(Clone)]
pub struct DeliveryClient {
    remote: Arc<dyn RemoteStore>,
}

impl DeliveryClient {
    pub fn new(remote: Arc<dyn RemoteStore>) -> Self {
        Self { remote }
    }

    /// Deliver `docs`, returning which ids are confirmed.
    ///
    /// Connectivity and unexpected errors are returned as-is: the whole
    /// batch is unresolved and should be retried later.
    pub async fn send_batch(&self, docs: &[RemoteDocument]) -> OutboxResult<DeliveryOutcome> {
        if docs.is_empty() {
            return Ok(DeliveryOutcome::default());
        }

        match self.remote.insert_unordered(docs).await? {
            BulkInsertOutcome::Complete => Ok(DeliveryOutcome {
                succeeded: docs.iter().map(|d| d.event_id.clone()).collect(),
                failed: HashSet::new(),
            }),
            BulkInsertOutcome::Partial { detail } => {
                debug!(count = docs.len(), detail = %detail, "Bulk insert partially failed, reconciling");
                self.reconcile(docs).await
            }
        }
    }

    async fn reconcile(&self, docs: &[RemoteDocument]) -> OutboxResult<DeliveryOutcome> {
        let event_ids: Vec<String> = docs.iter().map(|d| d.event_id.clone()).collect();
        let found = self.remote.existing_event_ids(&event_ids).await?;

        let (succeeded, failed): (HashSet<String>, HashSet<String>) = event_ids
            .into_iter()
            .partition(|event_id| found.contains(event_id));

        info!(
            succeeded = succeeded.len(),
            failed = failed.len(),
            "Reconciled partially failed batch"
        );

        Ok(DeliveryOutcome { succeeded, failed })
    }
}

impl std::fmt::Debug for DeliveryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeliveryClient").finish_non_exhaustive()
    }
}
