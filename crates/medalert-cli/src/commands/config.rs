use std::path::Path;

use medalert_core::util::normalize_text_option;
use medalert_core::FeedConfig;

use crate::cli::ConfigCommands;
use crate::commands::common::load_config;
use crate::error::CliError;

pub fn run_config(command: ConfigCommands, config_path: &Path) -> Result<(), CliError> {
    match command {
        ConfigCommands::Show => {
            let config = load_config(config_path);
            println!("# {}", config_path.display());
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
        ConfigCommands::Init {
            collection,
            max_scheduled,
            default_body,
        } => run_config_init(config_path, collection, max_scheduled, default_body),
    }
}

#[allow(clippy::needless_pass_by_value)]
pub fn run_config_init(
    config_path: &Path,
    collection: Option<String>,
    max_scheduled: Option<usize>,
    default_body: Option<String>,
) -> Result<(), CliError> {
    let config = init_config(
        FeedConfig::load_from_path(config_path),
        collection,
        max_scheduled,
        default_body,
    );
    config.save_to_path(config_path)?;

    println!("Saved feed config to {}", config_path.display());
    Ok(())
}

/// Apply explicit values on top of `existing`; blank text keeps the old value
pub fn init_config(
    existing: FeedConfig,
    collection: Option<String>,
    max_scheduled: Option<usize>,
    default_body: Option<String>,
) -> FeedConfig {
    FeedConfig {
        collection: normalize_text_option(collection).unwrap_or(existing.collection),
        max_scheduled: max_scheduled.unwrap_or(existing.max_scheduled),
        default_body: normalize_text_option(default_body).unwrap_or(existing.default_body),
        presentation: existing.presentation,
    }
}
