//! Tailer error types.

use log_outbox::OutboxError;
use outbox_database::DatabaseError;
use thiserror::Error;

/// Tailer error type.
#[derive(Error, Debug)]
pub enum TailerError {
    /// Reading or opening the watched file failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Appending to the outbox failed. Fatal to the ingestion loop.
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Outbox error: {0}")]
    Outbox(#[from] OutboxError),

    /// The line filter pattern does not compile.
    #[error("Invalid line filter pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Result type for tailer operations.
pub type TailerResult<T> = Result<T, TailerError>;
