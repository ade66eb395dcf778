//! Tracing setup for the record-keeper binaries
//!
//!   record-keeper --debug ...             # Debug logging to stderr
//!   RUST_LOG=record_keeper=trace ...      # Fine-grained log control

use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

/// Build the filter: RUST_LOG wins, then `--debug`, then the configured level
pub fn env_filter(debug: bool, level: &str) -> EnvFilter {
    let fallback = if debug { "debug" } else { level };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback))
}

/// Install a compact stderr subscriber. Stdout stays free for command output.
pub fn init(debug: bool, level: &str) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(debug, level))
        .with_target(debug)
        .with_writer(std::io::stderr)
        .compact()
        .try_init()
        .map_err(|err| anyhow!(err))
}
