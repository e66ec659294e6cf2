//! Outbox delivery error types.

use outbox_database::DatabaseError;
use thiserror::Error;

/// Outbox delivery error type.
///
/// Partial batch failures never appear here: they are resolved into
/// succeeded/failed sets by reconciliation.
#[derive(Error, Debug)]
pub enum OutboxError {
    /// Local store failure (I/O, corruption, disk full).
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Connection or timeout talking to the remote store. Retryable.
    #[error("Remote store unreachable: {0}")]
    Connectivity(String),

    /// Remote store answered with a status we cannot interpret.
    #[error("Remote store error: {status} - {message}")]
    RemoteStatus {
        /// HTTP status code.
        status: u16,
        /// Response body.
        message: String,
    },

    /// Any other remote failure (bad response body, protocol error).
    #[error("Unexpected remote error: {0}")]
    UnexpectedRemote(String),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Client construction or configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl OutboxError {
    /// Whether the whole batch should simply be retried later.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Connectivity(_))
    }
}

impl From<reqwest::Error> for OutboxError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_connect() || e.is_timeout() {
            Self::Connectivity(e.to_string())
        } else if let Some(status) = e.status() {
            Self::RemoteStatus {
                status: status.as_u16(),
                message: e.to_string(),
            }
        } else {
            Self::UnexpectedRemote(e.to_string())
        }
    }
}

/// Result type alias using OutboxError.
pub type OutboxResult<T> = Result<T, OutboxError>;
