//! Medalert CLI - Command-line interface for clinical alert feeds
//!
//! Replays alert records through the feed manager and shows what a user
//! would see and which local notifications would be scheduled.

mod cli;
mod commands;
mod error;

#[cfg(test)]
mod tests;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};
use crate::commands::common::{load_config, resolve_config_path};
use crate::commands::config::run_config;
use crate::commands::feed::run_feed;
use crate::commands::validate::run_validate_alert;
use crate::error::CliError;

const DEFAULT_LOG_FILTER: &str = "medalert=info,medalert_core=info";

/// Filter from `RUST_LOG`, or the medalert crates at info when unset or invalid
fn log_filter(rust_log: Option<&str>) -> EnvFilter {
    if let Some(directives) = rust_log {
        match EnvFilter::try_new(directives) {
            Ok(filter) => return filter,
            Err(error) => eprintln!("Ignoring invalid {}: {error}", EnvFilter::DEFAULT_ENV),
        }
    }
    EnvFilter::new(DEFAULT_LOG_FILTER)
}

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(rust_log.as_deref()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config_path = resolve_config_path(cli.config);

    match cli.command {
        Commands::Feed {
            fixture,
            user,
            json,
            no_notifications,
        } => {
            let config = load_config(&config_path);
            run_feed(&fixture, &user, json, !no_notifications, config).await?;
        }
        Commands::ValidateAlert { title, date, time } => {
            run_validate_alert(&title, &date, &time)?;
        }
        Commands::Config { command } => run_config(command, &config_path)?,
    }

    Ok(())
}
