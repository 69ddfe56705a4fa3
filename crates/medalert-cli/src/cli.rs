use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "medalert")]
#[command(about = "Inspect clinical alert feeds and their notification schedule")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to the feed configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load alert records and show one user's feed
    Feed {
        /// JSON file holding an array of alert records
        #[arg(long, value_name = "PATH")]
        fixture: PathBuf,
        /// User whose assigned alerts are shown
        #[arg(long, value_name = "ID")]
        user: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
        /// Skip local notification scheduling
        #[arg(long)]
        no_notifications: bool,
    },
    /// Check alert form input
    ValidateAlert {
        /// Alert title
        #[arg(long, default_value = "")]
        title: String,
        /// Scheduled date (YYYY-MM-DD)
        #[arg(long, default_value = "")]
        date: String,
        /// Scheduled time (HH:MM)
        #[arg(long, default_value = "")]
        time: String,
    },
    /// Inspect or write the feed configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the effective configuration
    Show,
    /// Write a configuration file, keeping existing values
    Init {
        /// Store collection holding alert records
        #[arg(long, value_name = "NAME")]
        collection: Option<String>,
        /// Maximum notifications scheduled at once
        #[arg(long, value_name = "COUNT")]
        max_scheduled: Option<usize>,
        /// Body used for alerts without a description
        #[arg(long, value_name = "TEXT")]
        default_body: Option<String>,
    },
}
