//! Pdfsift CLI
//!
//! Heading-aware PDF chunking and persona-driven section ranking.

use anyhow::Result;
use clap::Parser;
use pdfsift_core::error::exit_codes;
use pdfsift_core::{Config, SiftError};

mod app;
mod commands;

use app::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = if cli.verbose {
        tracing::Level::INFO
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .init();

    let result = match load_config(&cli) {
        Ok(config) => match cli.command {
            Commands::Run(args) => commands::run::run(args, config).await,
            Commands::Manifest(args) => commands::manifest::run(args).await,
            Commands::Outline(args) => commands::outline::run(args, cli.format).await,
            Commands::Chunk(args) => commands::chunk::run(args, &config, cli.format).await,
        },
        Err(e) => Err(e),
    };

    if let Err(err) = result {
        eprintln!("Error: {:#}", err);
        let code = err
            .downcast_ref::<SiftError>()
            .map(SiftError::exit_code)
            .unwrap_or(exit_codes::GENERAL_ERROR);
        std::process::exit(code);
    }
    Ok(())
}

fn load_config(cli: &Cli) -> Result<Config> {
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    Ok(config)
}
