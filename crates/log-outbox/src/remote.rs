//! The remote store seam.

use crate::OutboxResult;
use async_trait::async_trait;
use outbox_database::{OutboxEvent, Severity};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Document shape stored remotely. `event_id` carries a unique index there.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteDocument {
    pub event_id: String,
    pub timestamp: String,
    pub message: String,
    pub severity: Severity,
    /// When this delivery attempt was built.
    pub captured_at: String,
}

impl RemoteDocument {
    pub fn from_event(event: &OutboxEvent, captured_at: &str) -> Self {
        Self {
            event_id: event.event_id.clone(),
            timestamp: event.timestamp.clone(),
            message: event.message.clone(),
            severity: event.severity,
            captured_at: captured_at.to_string(),
        }
    }
}

/// Outcome of an unordered bulk insert that reached the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BulkInsertOutcome {
    /// Every document was accepted.
    Complete,
    /// Some documents conflicted with the unique index or were rejected.
    /// `detail` is informational only and never used to pick winners.
    Partial { detail: String },
}

/// A handle to the remote log store.
///
/// Transport failures come back as [`OutboxError::Connectivity`](crate::OutboxError::Connectivity);
/// anything the store itself rejects per-document is a
/// [`BulkInsertOutcome::Partial`].
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Insert all documents, continuing past individual failures.
    async fn insert_unordered(&self, docs: &[RemoteDocument]) -> OutboxResult<BulkInsertOutcome>;

    /// Which of `event_ids` currently exist in the store.
    async fn existing_event_ids(&self, event_ids: &[String]) -> OutboxResult<HashSet<String>>;
}
