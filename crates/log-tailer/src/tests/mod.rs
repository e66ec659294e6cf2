//! Tailer scenario tests against real files in a temp directory.
//!
//! - `harness.rs`  - Temp log file, outbox and in-memory remote
//! - `reading.rs`  - Line handling, partial lines, filtering, flush per event
//! - `rotation.rs` - Rotation, truncation and disappearing files
//! - `resume.rs`   - Persisted cursor across restarts

mod reading;
