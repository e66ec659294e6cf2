//! Delivery side of the log outbox.
//!
//! This crate moves events from the local [`OutboxStore`](outbox_database::OutboxStore)
//! to the remote log store with at-least-once semantics:
//!
//! - [`RemoteStore`]: the seam to the remote collection (unique index on `event_id`)
//! - [`RestRemoteStore`]: PostgREST-style HTTP implementation
//! - [`DeliveryClient`]: one bulk insert per batch, reconciled on partial failure
//! - [`FlushCoordinator`]: drains one bounded batch and marks confirmed ids sent
//! - [`RetryScheduler`]: the periodic flush loop on its own task
//!
//! Ingestion calls [`FlushCoordinator::flush`] opportunistically after each
//! append; the scheduler is the path that guarantees eventual delivery.

mod delivery;
mod error;
mod flush;
mod remote;
mod rest;
mod scheduler;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

#[cfg(test)]
mod tests;

pub use delivery::{DeliveryClient, DeliveryOutcome};
pub use error::{OutboxError, OutboxResult};
pub use flush::{FlushCoordinator, FlushReport, DEFAULT_BATCH_SIZE};
pub use remote::{BulkInsertOutcome, RemoteDocument, RemoteStore};
pub use rest::{remote_table_ddl, RestRemoteStore, RestStoreConfig};
pub use scheduler::{
    RetryScheduler, RetrySchedulerConfig, DEFAULT_RETRY_COOLDOWN, DEFAULT_RETRY_INTERVAL,
};
