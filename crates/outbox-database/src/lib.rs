//! SQLite outbox for the log agent.
//!
//! This crate provides:
//! - [`OutboxStore`]: durable, append-only queue of classified events with a
//!   sent flag per record, on a dedicated executor thread
//! - Persisted tail cursors so a restarted tailer resumes where it stopped
//! - Schema migrations and model types
//!
//! ```ignore
//! let store = OutboxStore::open(path).await?;
//! store.append(event).await?;
//! let batch = store.fetch_unsent(5).await?;
//! store.mark_sent(ids).await?;
//! ```

mod error;
mod migrations;
mod models;
pub mod queries;
mod store;

pub use error::{DatabaseError, DatabaseResult};
pub use migrations::run_migrations;
pub use models::*;
pub use store::OutboxStore;
