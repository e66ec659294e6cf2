//! Partial bulk failures are resolved by asking the remote what it has.

use super::harness::{event, TestHarness};
use crate::remote::RemoteDocument;
use crate::testing::MemoryRemoteStore;
use crate::DeliveryClient;
use std::sync::Arc;

fn doc(event_id: &str) -> RemoteDocument {
    let e = event(event_id);
    RemoteDocument {
        event_id: e.event_id,
        timestamp: e.timestamp,
        message: e.message,
        severity: e.severity,
        captured_at: "2024-03-01T12:00:01.000000Z".to_string(),
    }
}

#[tokio::test]
async fn test_complete_batch_skips_reconciliation() {
    let remote = Arc::new(MemoryRemoteStore::new());
    let client = DeliveryClient::new(remote.clone());

    let outcome = client.send_batch(&[doc("a"), doc("b")]).await.unwrap();

    assert_eq!(outcome.succeeded.len(), 2);
    assert!(outcome.failed.is_empty());
    assert_eq!(remote.reconcile_calls(), 0);
}

#[tokio::test]
async fn test_empty_batch_makes_no_remote_calls() {
    let remote = Arc::new(MemoryRemoteStore::new());
    let client = DeliveryClient::new(remote.clone());

    let outcome = client.send_batch(&[]).await.unwrap();

    assert!(outcome.succeeded.is_empty());
    assert!(outcome.failed.is_empty());
    assert_eq!(remote.insert_calls(), 0);
}

#[tokio::test]
async fn test_duplicates_count_as_delivered() {
    let remote = Arc::new(MemoryRemoteStore::new());
    remote.preload(doc("a"));
    let client = DeliveryClient::new(remote.clone());

    let outcome = client
        .send_batch(&[doc("a"), doc("b"), doc("c")])
        .await
        .unwrap();

    assert_eq!(remote.reconcile_calls(), 1);
    assert_eq!(outcome.succeeded.len(), 3);
    assert!(outcome.failed.is_empty());
    assert_eq!(remote.document_count(), 3);
}

#[tokio::test]
async fn test_rejected_documents_stay_failed() {
    let remote = Arc::new(MemoryRemoteStore::new());
    remote.reject("b");
    let client = DeliveryClient::new(remote.clone());

    let outcome = client
        .send_batch(&[doc("a"), doc("b"), doc("c")])
        .await
        .unwrap();

    assert!(outcome.succeeded.contains("a"));
    assert!(outcome.succeeded.contains("c"));
    assert_eq!(outcome.failed.len(), 1);
    assert!(outcome.failed.contains("b"));
}

#[tokio::test]
async fn test_outcome_partitions_the_batch() {
    let remote = Arc::new(MemoryRemoteStore::new());
    remote.preload(doc("b"));
    remote.reject("d");
    let client = DeliveryClient::new(remote.clone());

    let batch = [doc("a"), doc("b"), doc("c"), doc("d")];
    let outcome = client.send_batch(&batch).await.unwrap();

    assert!(outcome.succeeded.is_disjoint(&outcome.failed));
    assert_eq!(outcome.succeeded.len() + outcome.failed.len(), batch.len());
}

#[tokio::test]
async fn test_flush_marks_only_confirmed_events() {
    let harness = TestHarness::new(5).await;
    harness.append_many("evt", 3).await;
    harness.remote.reject("evt-01");

    let report = harness.coordinator.flush().await.unwrap();

    assert_eq!(report.attempted, 3);
    assert_eq!(report.delivered, 2);
    assert_eq!(report.unconfirmed, 1);
    assert!(harness.is_sent("evt-00").await);
    assert!(!harness.is_sent("evt-01").await);
    assert!(harness.is_sent("evt-02").await);

    harness.remote.accept("evt-01");
    let report = harness.coordinator.flush().await.unwrap();
    assert_eq!(report.attempted, 1);
    assert_eq!(report.delivered, 1);
    assert!(harness.unsent_ids().await.is_empty());
}
