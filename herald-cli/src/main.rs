//! ## herald-cli
//! **Command line access to the event codec and an in-process broker**
//!
//! `encode` and `decode` work on raw payloads. `loopback` runs a publisher
//! and a subscriber against one broker using the loaded configuration.

use anyhow::{anyhow, Context};
use clap::Parser;
use herald_config::HeraldConfig;
use herald_telemetry::EventLogger;

mod commands;
mod error;

use commands::Cli;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => HeraldConfig::load_from_path(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => HeraldConfig::load().context("loading configuration")?,
    };
    EventLogger::init(&config.telemetry.log_filter).map_err(|err| anyhow!(err))?;

    commands::run_command(cli.command, &config)
}
