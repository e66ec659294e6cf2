//! Log outbox agent entry point.
//!
//! Usage: log-outbox-agent [OPTIONS] <PATH>
//!
//! Tails PATH, persists matching lines to a local SQLite outbox and ships
//! them to the remote log store. Every option can also come from the
//! environment variable named in `--help`.

mod app;

use agent_config_and_utils::{
    AgentConfig, Paths, DEFAULT_BATCH_SIZE, DEFAULT_COLLECTION_NAME, DEFAULT_CONNECT_TIMEOUT_SECS,
    DEFAULT_DB_NAME, DEFAULT_LOG_LEVEL, DEFAULT_MATCH_REGEX, DEFAULT_POLL_INTERVAL_MS,
    DEFAULT_REMOTE_URI, DEFAULT_RETRY_COOLDOWN_SECS, DEFAULT_RETRY_INTERVAL_SECS,
};
use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

/// Durable log shipping agent.
#[derive(Parser, Debug)]
#[command(name = "log-outbox-agent")]
#[command(about = "Tail a log file and deliver matching lines to a remote store, at least once")]
#[command(version)]
struct Args {
    /// Log file to watch.
    #[arg(env = "LOG_FILE")]
    path: PathBuf,

    /// Remote store base URL.
    #[arg(long, env = "REMOTE_URI", default_value = DEFAULT_REMOTE_URI)]
    remote_uri: String,

    /// Remote schema.
    #[arg(long, env = "DB_NAME", default_value = DEFAULT_DB_NAME)]
    db_name: String,

    /// Remote table.
    #[arg(long, env = "COLLECTION_NAME", default_value = DEFAULT_COLLECTION_NAME)]
    collection_name: String,

    /// API key for the remote store.
    #[arg(long, env = "REMOTE_API_KEY", hide_env_values = true)]
    remote_api_key: Option<String>,

    /// Local outbox database. Defaults to ~/.log-outbox/outbox.db
    #[arg(long, env = "OUTBOX_PATH")]
    outbox_path: Option<PathBuf>,

    /// Max events per flush.
    #[arg(long, env = "BATCH_SIZE", default_value_t = DEFAULT_BATCH_SIZE)]
    batch_size: usize,

    /// Seconds between scheduled flushes.
    #[arg(long, env = "RETRY_INTERVAL", default_value_t = DEFAULT_RETRY_INTERVAL_SECS)]
    retry_interval: u64,

    /// Extra seconds to wait after a failed scheduled flush.
    #[arg(long, env = "RETRY_COOLDOWN", default_value_t = DEFAULT_RETRY_COOLDOWN_SECS)]
    retry_cooldown: u64,

    /// Seconds allowed to establish a remote connection.
    #[arg(long, env = "CONNECT_TIMEOUT", default_value_t = DEFAULT_CONNECT_TIMEOUT_SECS)]
    connect_timeout: u64,

    /// Milliseconds between polls of an idle or missing file.
    #[arg(long, env = "POLL_INTERVAL_MS", default_value_t = DEFAULT_POLL_INTERVAL_MS)]
    poll_interval_ms: u64,

    /// Only lines matching this case-insensitive pattern are shipped.
    #[arg(long, env = "MATCH_REGEX", default_value = DEFAULT_MATCH_REGEX)]
    regex: String,

    /// Ship every non-blank line, ignoring --regex.
    #[arg(long)]
    all_lines: bool,

    /// Read the file from the beginning.
    #[arg(long, conflicts_with = "start_at_end")]
    start_at_begin: bool,

    /// Only read lines written after startup (default).
    #[arg(long)]
    start_at_end: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "AGENT_LOG_LEVEL", default_value = DEFAULT_LOG_LEVEL)]
    log_level: String,

    /// Write the agent's own logs as JSONL to this file.
    #[arg(long, env = "AGENT_LOG_PATH")]
    log_file: Option<PathBuf>,

    /// Print the remote table definition and exit.
    #[arg(long)]
    print_remote_ddl: bool,

    /// Print the effective configuration (without secrets) and exit.
    #[arg(long)]
    print_config: bool,
}

impl Args {
    fn into_config(self, paths: &Paths) -> AgentConfig {
        let mut config = AgentConfig::new(self.path, paths);
        config.remote_uri = self.remote_uri;
        config.db_name = self.db_name;
        config.collection_name = self.collection_name;
        config.remote_api_key = self.remote_api_key;
        if let Some(outbox_path) = self.outbox_path {
            config.outbox_path = outbox_path;
        }
        config.batch_size = self.batch_size;
        config.retry_interval_secs = self.retry_interval;
        config.retry_cooldown_secs = self.retry_cooldown;
        config.connect_timeout_secs = self.connect_timeout;
        config.poll_interval_ms = self.poll_interval_ms;
        config.match_regex = if self.all_lines {
            None
        } else {
            Some(self.regex)
        };
        config.start_at_beginning = self.start_at_begin;
        config.log_level = self.log_level;
        config.agent_log_path = self.log_file;
        config
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let print_remote_ddl = args.print_remote_ddl;
    let print_config = args.print_config;

    let paths = Paths::new()?;
    let config = args.into_config(&paths);
    config.validate()?;

    if print_remote_ddl {
        println!(
            "{}",
            log_outbox::remote_table_ddl(&config.db_name, &config.collection_name)
        );
        return Ok(());
    }
    if print_config {
        println!("{}", config.to_json_pretty()?);
        return Ok(());
    }

    observability::init_with_config(observability::LogConfig {
        service_name: "log-outbox-agent".into(),
        default_level: config.log_level.clone(),
        log_path: config.agent_log_path.clone(),
        also_stderr: true,
    })
    .context("failed to initialise logging")?;

    info!(
        path = %config.log_file.display(),
        remote_uri = %config.remote_uri,
        db_name = %config.db_name,
        collection = %config.collection_name,
        batch_size = config.batch_size,
        retry_interval_secs = config.retry_interval_secs,
        "Log outbox agent starting"
    );

    app::run_agent(config).await
}
