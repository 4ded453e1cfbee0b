// Logging setup
//
// Logs go to stderr so they never interleave with the shell's own output on
// stdout. RUST_LOG wins over the configured level.

use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

pub fn init(default_level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow!("Failed to initialize logging: {}", e))
}
