//! Builds library components from [`AgentConfig`].

use agent_config_and_utils::AgentConfig;
use log_outbox::{
    DeliveryClient, FlushCoordinator, RestRemoteStore, RestStoreConfig, RetrySchedulerConfig,
};
use log_tailer::{LineFilter, StartPosition, TailerConfig};
use outbox_database::OutboxStore;
use std::sync::Arc;
use std::time::Duration;

/// Upper bound on one remote request, on top of the connect timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub fn rest_store_config(config: &AgentConfig) -> RestStoreConfig {
    RestStoreConfig {
        base_url: config.remote_uri.clone(),
        schema: config.db_name.clone(),
        collection: config.collection_name.clone(),
        api_key: config.remote_api_key.clone(),
        connect_timeout: config.connect_timeout(),
        request_timeout: REQUEST_TIMEOUT.max(config.connect_timeout()),
    }
}

pub fn scheduler_config(config: &AgentConfig) -> RetrySchedulerConfig {
    RetrySchedulerConfig {
        interval: config.retry_interval(),
        cooldown: config.retry_cooldown(),
    }
}

pub fn tailer_config(config: &AgentConfig) -> anyhow::Result<TailerConfig> {
    let filter = match &config.match_regex {
        Some(pattern) => LineFilter::new(pattern)?,
        None => LineFilter::match_all(),
    };

    Ok(TailerConfig {
        path: config.log_file.clone(),
        start: if config.start_at_beginning {
            StartPosition::Beginning
        } else {
            StartPosition::End
        },
        poll_interval: config.poll_interval(),
        filter,
    })
}

/// Open a store handle and a remote client owned by one execution context.
pub async fn build_coordinator(config: &AgentConfig) -> anyhow::Result<FlushCoordinator> {
    let store = OutboxStore::open(&config.outbox_path).await?;
    let remote = RestRemoteStore::new(rest_store_config(config))?;
    let delivery = DeliveryClient::new(Arc::new(remote));
    Ok(FlushCoordinator::new(store, delivery, config.batch_size))
}
