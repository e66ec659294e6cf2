//! Periodic, authoritative flush loop.

use crate::flush::FlushCoordinator;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Default pause between scheduled flushes.
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(30);

/// Default extra pause after a failed flush.
pub const DEFAULT_RETRY_COOLDOWN: Duration = Duration::from_secs(5);

/// Pacing for [`RetryScheduler`].
#[derive(Debug, Clone, Copy)]
pub struct RetrySchedulerConfig {
    /// Sleep before every flush attempt.
    pub interval: Duration,
    /// Additional sleep after a failed attempt. Shorter than `interval`.
    pub cooldown: Duration,
}

impl Default for RetrySchedulerConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_RETRY_INTERVAL,
            cooldown: DEFAULT_RETRY_COOLDOWN,
        }
    }
}

/// Runs [`FlushCoordinator::flush`] forever on its own task.
///
/// The coordinator handed in must own its own store and remote handles;
/// the scheduler talks to the ingestion path only through the outbox file.
///
/// # Lifecycle
///
/// 1. Create with [`RetryScheduler::new()`]
/// 2. Call [`RetryScheduler::start()`] to spawn the loop
/// 3. The loop runs until the runtime shuts down or the handle is aborted
pub struct RetryScheduler {
    coordinator: FlushCoordinator,
    config: RetrySchedulerConfig,
}

impl RetryScheduler {
    pub fn new(coordinator: FlushCoordinator, config: RetrySchedulerConfig) -> Self {
        Self {
            coordinator,
            config,
        }
    }

    /// Spawn the loop on the current Tokio runtime.
    pub fn start(self) -> JoinHandle<()> {
        info!(
            interval_secs = self.config.interval.as_secs_f64(),
            cooldown_secs = self.config.cooldown.as_secs_f64(),
            "Starting retry scheduler"
        );
        tokio::spawn(self.run())
    }

    /// The loop itself. Never returns; flush errors are logged and followed
    /// by the cooldown.
    pub async fn run(self) {
        loop {
            tokio::time::sleep(self.config.interval).await;
            debug!("Retrying unsent logs");

            match self.coordinator.flush().await {
                Ok(report) if report.is_empty() => {}
                Ok(report) => {
                    info!(
                        attempted = report.attempted,
                        delivered = report.delivered,
                        unconfirmed = report.unconfirmed,
                        "Scheduled flush complete"
                    );
                }
                Err(e) => {
                    warn!(
                        error = %e,
                        retryable = e.is_retryable(),
                        "Retry loop flush failed"
                    );
                    tokio::time::sleep(self.config.cooldown).await;
                }
            }
        }
    }
}
