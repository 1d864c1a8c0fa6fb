// file: src/main.rs
// version: 2.0.0
// guid: h8i9j0k1-l2m3-4567-8901-234567hijklm

//! Metal Provision Jobs - Main entry point

use anyhow::Context;
use clap::Parser;
use metal_provision_jobs::{
    cli::{args::Cli, args::Commands, commands::*},
    logging,
};
use tokio::signal;
use tracing::warn;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.json_logs {
        logging::init_json_logger()?;
    } else {
        logging::init_logger(cli.verbose, cli.quiet)?;
    }

    let config = load_config(cli.config.as_deref()).context("Failed to load jobs configuration")?;

    let command_future = async {
        match cli.command {
            Commands::PrepareInstall {
                options,
                target,
                task_id,
            } => prepare_install_command(&config, &options, &target, task_id)
                .await
                .with_context(|| format!("Failed to prepare install options for {}", target)),
            Commands::FetchBootConfig { repo } => fetch_boot_config_command(&config, &repo)
                .await
                .with_context(|| format!("Failed to fetch boot metadata from {}", repo)),
            Commands::HashPassword { sha256 } => {
                hash_password_command(sha256).context("Failed to hash password")
            }
        }
    };

    // Run command with signal handling
    tokio::select! {
        result = command_future => result,
        _ = signal::ctrl_c() => {
            warn!("Application interrupted by user");
            std::process::exit(130); // Standard exit code for Ctrl+C
        }
    }
}
