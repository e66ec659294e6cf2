//! Ingestion side of the log agent.
//!
//! - [`classify`]: line to [`NewOutboxEvent`](outbox_database::NewOutboxEvent)
//!   with keyword-precedence severity
//! - [`LineFilter`]: regex pre-filter on raw lines
//! - [`Tailer`]: rotation-aware file follower that appends to the outbox
//!   and triggers a best-effort flush per event

mod classifier;
mod error;
mod filter;
mod identity;
mod tailer;

#[cfg(test)]
mod tests;

pub use classifier::{classify, severity_of, MAX_MESSAGE_CHARS};
pub use error::{TailerError, TailerResult};
pub use filter::{LineFilter, DEFAULT_PATTERN};
pub use identity::file_identity;
pub use tailer::{
    LineStats, PollOutcome, StartPosition, TailPhase, Tailer, TailerConfig, DEFAULT_POLL_INTERVAL,
    MAX_LINE_BYTES,
};
