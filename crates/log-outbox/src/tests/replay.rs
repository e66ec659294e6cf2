//! Redelivering events the remote already holds never duplicates them.

use super::harness::TestHarness;

#[tokio::test]
async fn test_lost_ack_then_retry_is_deduplicated() {
    let harness = TestHarness::new(5).await;
    harness.append_many("evt", 4).await;

    harness.remote.set_drop_acks(true);
    assert!(harness.coordinator.flush().await.is_err());
    assert_eq!(harness.remote.document_count(), 4);
    assert_eq!(harness.unsent_ids().await.len(), 4);

    harness.remote.set_drop_acks(false);
    let report = harness.coordinator.flush().await.unwrap();

    assert_eq!(report.delivered, 4);
    assert_eq!(harness.remote.reconcile_calls(), 1);
    assert_eq!(harness.remote.document_count(), 4);
    assert!(harness.unsent_ids().await.is_empty());
}

#[tokio::test]
async fn test_two_coordinators_on_one_outbox() {
    let harness = TestHarness::new(5).await;
    harness.append_many("evt", 5).await;

    // A second coordinator over the same outbox and remote, as the
    // ingestion path and the scheduler are.
    let other = TestHarness::with_store(harness.store.clone(), harness.remote.clone(), 5);

    let (a, b) = tokio::join!(harness.coordinator.flush(), other.coordinator.flush());
    a.unwrap();
    b.unwrap();

    assert_eq!(harness.remote.document_count(), 5);
    assert!(harness.unsent_ids().await.is_empty());
}
