//! Agent configuration.
//!
//! Built once at startup (by the binary's CLI layer) and handed to each
//! component's constructor. Nothing below reads the environment.

use crate::{ConfigError, ConfigResult, Paths};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Default remote store base URL.
pub const DEFAULT_REMOTE_URI: &str = "http://127.0.0.1:3000";

/// Default remote schema.
pub const DEFAULT_DB_NAME: &str = "log_monitoring";

/// Default remote table.
pub const DEFAULT_COLLECTION_NAME: &str = "logs";

pub const DEFAULT_BATCH_SIZE: usize = 5;
pub const DEFAULT_RETRY_INTERVAL_SECS: u64 = 30;
pub const DEFAULT_RETRY_COOLDOWN_SECS: u64 = 5;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 500;

/// Default line filter.
pub const DEFAULT_MATCH_REGEX: &str = "(ERROR|CRITICAL|FATAL|Exception|Traceback)";

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Full agent configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentConfig {
    /// File to tail.
    pub log_file: PathBuf,
    /// Remote store base URL.
    pub remote_uri: String,
    /// Remote schema.
    pub db_name: String,
    /// Remote table.
    pub collection_name: String,
    /// Remote API key. Never serialized.
    #[serde(default, skip_serializing)]
    pub remote_api_key: Option<String>,
    /// Local outbox database.
    pub outbox_path: PathBuf,
    /// Max events per flush.
    pub batch_size: usize,
    pub retry_interval_secs: u64,
    pub retry_cooldown_secs: u64,
    pub connect_timeout_secs: u64,
    pub poll_interval_ms: u64,
    /// Line filter; `None` passes every line.
    pub match_regex: Option<String>,
    /// Replay the file from the start instead of tailing new lines only.
    pub start_at_beginning: bool,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
    /// JSONL file for the agent's own logs.
    pub agent_log_path: Option<PathBuf>,
}

impl AgentConfig {
    /// Defaults for everything except the tailed file.
    pub fn new(log_file: PathBuf, paths: &Paths) -> Self {
        Self {
            log_file,
            remote_uri: DEFAULT_REMOTE_URI.to_string(),
            db_name: DEFAULT_DB_NAME.to_string(),
            collection_name: DEFAULT_COLLECTION_NAME.to_string(),
            remote_api_key: None,
            outbox_path: paths.outbox_file(),
            batch_size: DEFAULT_BATCH_SIZE,
            retry_interval_secs: DEFAULT_RETRY_INTERVAL_SECS,
            retry_cooldown_secs: DEFAULT_RETRY_COOLDOWN_SECS,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            match_regex: Some(DEFAULT_MATCH_REGEX.to_string()),
            start_at_beginning: false,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            agent_log_path: None,
        }
    }

    /// Check ranges and cross-field constraints.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.batch_size == 0 {
            return Err(ConfigError::Invalid("batch size must be at least 1".to_string()));
        }
        if self.retry_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "retry interval must be at least 1 second".to_string(),
            ));
        }
        if self.retry_cooldown_secs >= self.retry_interval_secs {
            return Err(ConfigError::Invalid(format!(
                "retry cooldown ({}s) must be shorter than the retry interval ({}s)",
                self.retry_cooldown_secs, self.retry_interval_secs
            )));
        }
        if self.connect_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "connect timeout must be at least 1 second".to_string(),
            ));
        }
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "poll interval must be at least 1 ms".to_string(),
            ));
        }

        let url = self.remote_url()?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid(format!(
                "remote URI must be http or https, got {}",
                url.scheme()
            )));
        }

        for (name, value) in [
            ("database name", &self.db_name),
            ("collection name", &self.collection_name),
        ] {
            if !is_identifier(value) {
                return Err(ConfigError::Invalid(format!(
                    "{} must be a non-empty identifier, got {:?}",
                    name, value
                )));
            }
        }

        if self.log_file.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("log file path is empty".to_string()));
        }

        Ok(())
    }

    /// Parse the remote store URL.
    pub fn remote_url(&self) -> ConfigResult<Url> {
        Ok(Url::parse(&self.remote_uri)?)
    }

    pub fn retry_interval(&self) -> Duration {
        Duration::from_secs(self.retry_interval_secs)
    }

    pub fn retry_cooldown(&self) -> Duration {
        Duration::from_secs(self.retry_cooldown_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Pretty JSON of the effective configuration, without secrets.
    pub fn to_json_pretty(&self) -> ConfigResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn is_identifier(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}
