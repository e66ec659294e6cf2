//! In-memory remote store for tests.
//!
//! Behaves like a document collection with a unique index on `event_id`
//! and unordered bulk inserts: every acceptable document goes in, the rest
//! are reported as a partial failure.

use crate::remote::{BulkInsertOutcome, RemoteDocument, RemoteStore};
use crate::{OutboxError, OutboxResult};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashSet};
use parking_lot::Mutex;

#[derive(Default)]
struct Inner {
    documents: BTreeMap<String, RemoteDocument>,
    reachable: bool,
    rejected: HashSet<String>,
    drop_acks: bool,
    insert_calls: usize,
    reconcile_calls: usize,
}

/// Shared-state fake of the remote log store.
pub struct MemoryRemoteStore {
    inner: Mutex<Inner>,
}

impl Default for MemoryRemoteStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRemoteStore {
    /// A reachable, empty store.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                reachable: true,
                ..Default::default()
            }),
        }
    }

    /// An unreachable, empty store.
    pub fn unreachable() -> Self {
        let store = Self::new();
        store.set_reachable(false);
        store
    }

    /// Toggle transport failures for every call.
    pub fn set_reachable(&self, reachable: bool) {
        self.inner.lock().reachable = reachable;
    }

    /// Refuse to store this id until [`accept`](Self::accept) is called.
    pub fn reject(&self, event_id: &str) {
        self.inner.lock().rejected.insert(event_id.to_string());
    }

    pub fn accept(&self, event_id: &str) {
        self.inner.lock().rejected.remove(event_id);
    }

    /// Store documents but answer inserts with a connectivity error, as if
    /// the acknowledgement was lost on the way back.
    pub fn set_drop_acks(&self, drop_acks: bool) {
        self.inner.lock().drop_acks = drop_acks;
    }

    /// Seed a document as if another sender had delivered it.
    pub fn preload(&self, doc: RemoteDocument) {
        let mut inner = self.inner.lock();
        inner.documents.entry(doc.event_id.clone()).or_insert(doc);
    }

    pub fn document_count(&self) -> usize {
        self.inner.lock().documents.len()
    }

    pub fn contains(&self, event_id: &str) -> bool {
        self.inner.lock().documents.contains_key(event_id)
    }

    pub fn documents(&self) -> Vec<RemoteDocument> {
        self.inner.lock().documents.values().cloned().collect()
    }

    pub fn insert_calls(&self) -> usize {
        self.inner.lock().insert_calls
    }

    pub fn reconcile_calls(&self) -> usize {
        self.inner.lock().reconcile_calls
    }
}

#[async_trait]
impl RemoteStore for MemoryRemoteStore {
    async fn insert_unordered(&self, docs: &[RemoteDocument]) -> OutboxResult<BulkInsertOutcome> {
        let mut inner = self.inner.lock();
        inner.insert_calls += 1;

        if !inner.reachable {
            return Err(OutboxError::Connectivity("connection refused".to_string()));
        }

        let mut conflicts = 0;
        let mut rejections = 0;
        for doc in docs {
            if inner.rejected.contains(&doc.event_id) {
                rejections += 1;
            } else if inner.documents.contains_key(&doc.event_id) {
                conflicts += 1;
            } else {
                inner.documents.insert(doc.event_id.clone(), doc.clone());
            }
        }

        if inner.drop_acks {
            return Err(OutboxError::Connectivity("response lost".to_string()));
        }

        if conflicts + rejections == 0 {
            Ok(BulkInsertOutcome::Complete)
        } else {
            Ok(BulkInsertOutcome::Partial {
                detail: format!("{} duplicate key errors, {} rejected", conflicts, rejections),
            })
        }
    }

    async fn existing_event_ids(&self, event_ids: &[String]) -> OutboxResult<HashSet<String>> {
        let mut inner = self.inner.lock();
        inner.reconcile_calls += 1;

        if !inner.reachable {
            return Err(OutboxError::Connectivity("connection refused".to_string()));
        }

        Ok(event_ids
            .iter()
            .filter(|id| inner.documents.contains_key(*id))
            .cloned()
            .collect())
    }
}
