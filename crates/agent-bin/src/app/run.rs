//! Agent lifecycle: two execution contexts sharing only the outbox file.

use super::components::{build_coordinator, scheduler_config, tailer_config};
use agent_config_and_utils::AgentConfig;
use log_outbox::RetryScheduler;
use log_tailer::Tailer;
use tracing::{error, info};

/// Run until Ctrl-C or until the tailer stops on a fatal outbox error.
pub async fn run_agent(config: AgentConfig) -> anyhow::Result<()> {
    // Each context owns its store handle and remote client.
    let retry_coordinator = build_coordinator(&config).await?;
    let ingest_coordinator = build_coordinator(&config).await?;

    let pending = ingest_coordinator.store().count_unsent().await?;
    info!(
        outbox = %config.outbox_path.display(),
        pending,
        "Outbox ready"
    );

    let scheduler = RetryScheduler::new(retry_coordinator, scheduler_config(&config)).start();
    let tailer = Tailer::new(tailer_config(&config)?, ingest_coordinator);

    let ctrl_c = tokio::signal::ctrl_c();

    let result = tokio::select! {
        result = tailer.run() => {
            if let Err(e) = &result {
                error!(error = %e, "Tailer exited with error");
            }
            result.map_err(anyhow::Error::from)
        }
        _ = ctrl_c => {
            info!("Received shutdown signal, exiting...");
            Ok(())
        }
    };

    scheduler.abort();
    result
}
