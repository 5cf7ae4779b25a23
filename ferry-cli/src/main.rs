//! Ferry CLI
//!
//! Command-line interface for waiting on SharePoint copy jobs.

mod commands;
mod config;
mod input;

use clap::Parser;
use colored::*;
use commands::{Commands, handle_command};
use config::Config;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "ferry")]
#[command(about = "Wait for SharePoint copy jobs to finish", long_about = None)]
struct Cli {
    /// Bearer token for the site (acquired elsewhere)
    #[arg(long, env = "FERRY_ACCESS_TOKEN", hide_env_values = true, global = true)]
    access_token: Option<String>,

    /// Show progress details and dump every status response
    #[arg(long, global = true)]
    verbose: bool,

    /// Like --verbose, with debug logging of every state transition
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = Config {
        access_token: cli.access_token,
        verbose: cli.verbose,
        debug: cli.debug,
    };

    // Logs go to stderr so stdout only carries progress
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_filter().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match handle_command(cli.command, &config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}
