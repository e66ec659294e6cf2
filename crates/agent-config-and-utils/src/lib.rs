//! Configuration and paths for the log outbox agent.

mod config;
mod error;
mod paths;

pub use config::{
    AgentConfig, DEFAULT_BATCH_SIZE, DEFAULT_COLLECTION_NAME, DEFAULT_CONNECT_TIMEOUT_SECS,
    DEFAULT_DB_NAME, DEFAULT_LOG_LEVEL, DEFAULT_MATCH_REGEX, DEFAULT_POLL_INTERVAL_MS,
    DEFAULT_REMOTE_URI, DEFAULT_RETRY_COOLDOWN_SECS, DEFAULT_RETRY_INTERVAL_SECS,
};
pub use error::{ConfigError, ConfigResult};
pub use paths::Paths;
