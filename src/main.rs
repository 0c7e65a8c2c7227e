//! # gridwire - command-line entry point
//!
//! ## Initialization Sequence
//!
//! 1. **Tracing** - `RUST_LOG`-style filter, `info` by default
//! 2. **Configuration** - `--config` file or `GRIDWIRE_*` environment
//! 3. **Command** - `get` or `view`, printing JSON to stdout
//!
//! ## Error Handling
//!
//! Every step returns `anyhow::Result` with context. A failure exits with a
//! non-zero status and the error chain on stderr.

#![forbid(unsafe_code)]
#![forbid(clippy::unwrap_used)]
#![forbid(clippy::panic)]
#![deny(clippy::expect_used)]

use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::debug;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use gridwire::cli::Cli;
use gridwire::commands::execute_command;
use gridwire::config::AppConfig;

#[tokio::main]
async fn main() -> Result<()> {
    let start_time = Instant::now();
    init_tracing();

    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref()).context(
        "Configuration failed to load. Check the --config file and GRIDWIRE_* variables",
    )?;

    execute_command(cli.command, config).await?;

    debug!("Finished in {:?}", start_time.elapsed());
    Ok(())
}

/// Initialize tracing subscriber with environment filter.
fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
