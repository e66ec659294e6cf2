//! An event is only marked sent once the remote store holds it.

use super::harness::TestHarness;
use crate::OutboxError;

#[tokio::test]
async fn test_unreachable_remote_leaves_events_unsent() {
    let harness = TestHarness::new(5).await;
    harness.append_many("evt", 3).await;
    harness.remote.set_reachable(false);

    let err = harness.coordinator.flush().await.unwrap_err();

    assert!(matches!(err, OutboxError::Connectivity(_)));
    assert!(err.is_retryable());
    assert_eq!(harness.unsent_ids().await.len(), 3);
    assert_eq!(harness.remote.document_count(), 0);
}

#[tokio::test]
async fn test_lost_ack_marks_nothing() {
    let harness = TestHarness::new(5).await;
    harness.append_many("evt", 2).await;
    harness.remote.set_drop_acks(true);

    assert!(harness.coordinator.flush().await.is_err());

    // Stored remotely, but unconfirmed locally.
    assert_eq!(harness.remote.document_count(), 2);

    assert_eq!(harness.store.count_sent().await.unwrap(), 0);
}

#[tokio::test]
async fn test_every_sent_event_exists_remotely() {
    let harness = TestHarness::new(3).await;
    let ids = harness.append_many("evt", 8).await;

    // Alternate outages and partial rejections across flushes.
    harness.remote.reject("evt-01");
    harness.coordinator.flush().await.unwrap();
    harness.remote.set_reachable(false);
    let _ = harness.coordinator.flush().await;
    harness.remote.set_reachable(true);
    harness.remote.reject("evt-05");
    harness.coordinator.flush().await.unwrap();
    harness.coordinator.flush().await.unwrap();

    for id in &ids {
        if harness.is_sent(id).await {
            assert!(harness.remote.contains(id), "{} sent but not remote", id);
        }
    }

    harness.remote.accept("evt-01");
    harness.remote.accept("evt-05");
    for _ in 0..5 {
        harness.coordinator.flush().await.unwrap();
    }

    for id in &ids {
        assert!(harness.is_sent(id).await);
        assert!(harness.remote.contains(id));
    }
}

#[tokio::test]
async fn test_flush_on_empty_outbox_is_a_no_op() {
    let harness = TestHarness::new(5).await;

    let report = harness.coordinator.flush().await.unwrap();

    assert!(report.is_empty());
    assert_eq!(harness.remote.insert_calls(), 0);
}
