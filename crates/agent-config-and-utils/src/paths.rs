//! File system paths for the agent.

use crate::{ConfigError, ConfigResult};
use std::path::PathBuf;

/// Manages file system paths for the agent.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Base directory for agent state (~/.log-outbox)
    base_dir: PathBuf,
}

impl Paths {
    /// Paths under `~/.log-outbox`.
    pub fn new() -> ConfigResult<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| ConfigError::Path("Could not determine home directory".to_string()))?;

        Ok(Self {
            base_dir: home.join(".log-outbox"),
        })
    }

    /// Create a new Paths instance with a custom base directory.
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Default outbox database (~/.log-outbox/outbox.db).
    pub fn outbox_file(&self) -> PathBuf {
        self.base_dir.join("outbox.db")
    }
}
