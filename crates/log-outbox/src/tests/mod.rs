//! Integration tests for outbox delivery.
//!
//! - `harness.rs`       - Shared store/remote/coordinator setup
//! - `reconciliation.rs` - Partial bulk failures resolved by lookup
//! - `at_least_once.rs` - No event is marked sent before the remote has it
//! - `crash_safety.rs`  - Pending events survive a restart and drain afterwards
//! - `replay.rs`        - Redelivery after lost acknowledgements stays deduplicated
//! - `batching.rs`      - Bounded batches drain the backlog in local order
//! - `scheduler.rs`     - The retry loop drains without ingestion

mod at_least_once;
mod reconciliation;
mod replay;
mod scheduler;
