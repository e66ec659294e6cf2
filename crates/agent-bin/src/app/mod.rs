//! Application wiring and lifecycle.

mod components;
mod run;

pub use components::{build_coordinator, rest_store_config, scheduler_config, tailer_config};
pub use run::run_agent;
