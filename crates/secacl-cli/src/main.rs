//! secacl CLI
//!
//! Command-line inspector for encoded access-control objects.

#![warn(clippy::all)]
#![forbid(unsafe_code)]

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use secacl_cli::cli::Cli;
use secacl_cli::commands;
use secacl_cli::config::SecaclConfig;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = SecaclConfig::load(cli.config.as_deref()).context("failed to load config")?;

    let default_filter = if cli.verbose {
        "debug"
    } else {
        config.log_level.as_str()
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut stdout = std::io::stdout().lock();
    commands::run(&cli, &config, &mut stdout)?;
    Ok(())
}
