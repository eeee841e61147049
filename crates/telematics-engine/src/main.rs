//! Telematics Engine Binary
//!
//! Hybrid driver risk scoring and usage-based premium pricing from the
//! command line.

mod cli;
mod config;
mod input;

use anyhow::Result;
use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::Cli;
use crate::config::EngineConfig;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing; stdout is reserved for command output
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    info!("Starting Telematics Engine v{}", telematics_common::VERSION);

    // Load configuration
    let config = EngineConfig::load()?;
    debug!("Loaded configuration: {:?}", config);

    cli::run(cli, config).await
}
