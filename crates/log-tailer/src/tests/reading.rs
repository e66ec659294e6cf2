//! Line handling on a single, stable file.

use super::harness::{settle, TailHarness};
use crate::{LineFilter, PollOutcome, StartPosition, TailPhase};
use outbox_database::Severity;

#[tokio::test]
async fn test_waits_for_missing_file() {
    let harness = TailHarness::new().await;
    let mut tailer = harness.tailer(StartPosition::Beginning);

    assert_eq!(tailer.poll_once().await.unwrap(), PollOutcome::Waiting);
    assert_eq!(tailer.phase(), TailPhase::WaitingForFile);

    harness.write("ERROR first\n");
    assert_eq!(
        tailer.poll_once().await.unwrap(),
        PollOutcome::Opened {
            offset: 0,
            resumed: false
        }
    );
    assert_eq!(tailer.phase(), TailPhase::Opened);

    settle(&mut tailer).await;
    assert_eq!(tailer.phase(), TailPhase::Reading);
    assert_eq!(harness.messages().await, vec!["ERROR first"]);
}

#[tokio::test]
async fn test_start_at_end_skips_existing_lines() {
    let harness = TailHarness::new().await;
    harness.write("ERROR old\n");

    let mut tailer = harness.tailer(StartPosition::End);
    settle(&mut tailer).await;
    assert!(harness.messages().await.is_empty());

    harness.write("ERROR new\n");
    settle(&mut tailer).await;
    assert_eq!(harness.messages().await, vec!["ERROR new"]);
}

#[tokio::test]
async fn test_lines_are_appended_in_order_with_severity() {
    let harness = TailHarness::new().await;
    harness.write("WARNING: cache cold\nCRITICAL: disk failure\n\nall good\r\n");

    let mut tailer = harness.tailer(StartPosition::Beginning);
    settle(&mut tailer).await;

    let events = harness.events().await;
    let summary: Vec<(&str, Severity)> = events
        .iter()
        .map(|e| (e.message.as_str(), e.severity))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("WARNING: cache cold", Severity::Warning),
            ("CRITICAL: disk failure", Severity::Critical),
            ("all good", Severity::Info),
        ]
    );
}

#[tokio::test]
async fn test_partial_line_waits_for_newline() {
    let harness = TailHarness::new().await;
    harness.write("");
    let mut tailer = harness.tailer(StartPosition::Beginning);
    settle(&mut tailer).await;

    harness.write("ERROR par");
    settle(&mut tailer).await;
    assert!(harness.messages().await.is_empty());
    assert_eq!(tailer.offset(), 0);

    harness.write("tial\n");
    settle(&mut tailer).await;
    assert_eq!(harness.messages().await, vec!["ERROR partial"]);
    assert_eq!(tailer.offset(), "ERROR partial\n".len() as u64);
}

#[tokio::test]
async fn test_filter_skips_lines() {
    let harness = TailHarness::new().await;
    harness.write("INFO boot\nERROR boom\nTraceback (most recent call last):\nWARNING meh\n");

    let mut tailer = harness.tailer_with_filter(StartPosition::Beginning, LineFilter::default());
    let outcomes = settle(&mut tailer).await;

    assert!(outcomes.contains(&PollOutcome::Lines(crate::LineStats {
        lines: 4,
        appended: 2,
        duplicates: 0,
        skipped: 2,
    })));
    assert_eq!(
        harness.messages().await,
        vec!["ERROR boom", "Traceback (most recent call last):"]
    );
}

#[tokio::test]
async fn test_each_event_triggers_a_flush() {
    let harness = TailHarness::new().await;
    harness.remote.set_reachable(true);
    harness.write("ERROR one\nERROR two\n");

    let mut tailer = harness.tailer(StartPosition::Beginning);
    settle(&mut tailer).await;

    assert_eq!(harness.remote.document_count(), 2);
    assert_eq!(harness.store.count_sent().await.unwrap(), 2);
}

#[tokio::test]
async fn test_flush_failure_does_not_stop_ingestion() {
    let harness = TailHarness::new().await;
    harness.write("ERROR one\nERROR two\n");

    let mut tailer = harness.tailer(StartPosition::Beginning);
    settle(&mut tailer).await;

    assert_eq!(harness.remote.insert_calls(), 2);
    assert_eq!(harness.store.count_unsent().await.unwrap(), 2);
}

#[tokio::test]
async fn test_overlong_line_is_truncated_and_buffer_stays_bounded() {
    let harness = TailHarness::new().await;
    let mut tailer = harness.tailer(StartPosition::Beginning);

    let head = format!("ERROR {}", "x".repeat(crate::MAX_LINE_BYTES));
    harness.write(&head);
    harness.write(&"y".repeat(crate::MAX_LINE_BYTES * 2));
    settle(&mut tailer).await;

    let messages = harness.messages().await;
    assert_eq!(messages.len(), 1);
    assert!(messages[0].starts_with("ERROR xxx"));
    assert_eq!(messages[0].chars().count(), crate::MAX_MESSAGE_CHARS);
    let written = std::fs::metadata(&harness.log_path).unwrap().len();
    assert_eq!(tailer.offset(), written);

    harness.write("yyy\nERROR next\n");
    settle(&mut tailer).await;

    let messages = harness.messages().await;
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1], "ERROR next");
    let written = std::fs::metadata(&harness.log_path).unwrap().len();
    assert_eq!(tailer.offset(), written);
}
