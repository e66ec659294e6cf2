//! The retry loop drains the outbox on its own.

use super::harness::TestHarness;
use crate::{RetryScheduler, RetrySchedulerConfig};
use std::time::Duration;
use tokio::time::{sleep, timeout};

fn fast() -> RetrySchedulerConfig {
    RetrySchedulerConfig {
        interval: Duration::from_millis(20),
        cooldown: Duration::from_millis(10),
    }
}

#[tokio::test]
async fn test_scheduler_drains_backlog() {
    let harness = TestHarness::new(5).await;
    harness.append_many("evt", 12).await;

    let handle = RetryScheduler::new(harness.coordinator.clone(), fast()).start();

    let drained = timeout(Duration::from_secs(5), async {
        while harness.store.count_unsent().await.unwrap() > 0 {
            sleep(Duration::from_millis(10)).await;
        }
    })
    .await;
    handle.abort();

    assert!(drained.is_ok(), "scheduler did not drain the outbox");
    assert_eq!(harness.remote.document_count(), 12);
}

#[tokio::test]
async fn test_scheduler_survives_outage() {
    let harness = TestHarness::new(5).await;
    harness.append_many("evt", 3).await;
    harness.remote.set_reachable(false);

    let handle = RetryScheduler::new(harness.coordinator.clone(), fast()).start();

    let failed_once = timeout(Duration::from_secs(5), async {
        while harness.remote.insert_calls() < 2 {
            sleep(Duration::from_millis(10)).await;
        }
    })
    .await;
    assert!(failed_once.is_ok());
    assert!(!handle.is_finished());

    harness.remote.set_reachable(true);
    let drained = timeout(Duration::from_secs(5), async {
        while harness.store.count_unsent().await.unwrap() > 0 {
            sleep(Duration::from_millis(10)).await;
        }
    })
    .await;
    handle.abort();

    assert!(drained.is_ok());
}

#[test]
fn test_default_pacing() {
    let config = RetrySchedulerConfig::default();
    assert_eq!(config.interval, Duration::from_secs(30));
    assert!(config.cooldown < config.interval);
}
