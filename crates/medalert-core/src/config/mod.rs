//! Feed configuration.
//!
//! Values come from an optional JSON file, then environment overrides.
//! A broken file never stops the feed: it is logged and defaults apply.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::notifications::PresentationOptions;
use crate::util::normalize_text_option;
use crate::{Error, Result};

pub const DEFAULT_COLLECTION: &str = "alerts";
pub const DEFAULT_MAX_SCHEDULED: usize = 5;
pub const DEFAULT_NOTIFICATION_BODY: &str = "You have a pending alert";

const ENV_COLLECTION: &str = "MEDALERT_COLLECTION";
const ENV_MAX_SCHEDULED: &str = "MEDALERT_MAX_SCHEDULED";
const ENV_DEFAULT_BODY: &str = "MEDALERT_DEFAULT_BODY";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct FeedConfig {
    /// Store collection holding alert records
    pub collection: String,
    /// Local notifications scheduled per pass, within `1..=DEFAULT_MAX_SCHEDULED`
    pub max_scheduled: usize,
    /// Body used when an alert has no description
    pub default_body: String,
    pub presentation: PresentationOptions,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            collection: DEFAULT_COLLECTION.to_string(),
            max_scheduled: DEFAULT_MAX_SCHEDULED,
            default_body: DEFAULT_NOTIFICATION_BODY.to_string(),
            presentation: PresentationOptions::default(),
        }
    }
}

impl FeedConfig {
    /// Load from a JSON file. Missing, unreadable or invalid files yield defaults.
    pub fn load_from_path(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => match Self::parse(&content) {
                Ok(config) => config,
                Err(error) => {
                    tracing::warn!(
                        "Failed to parse feed config at {}: {}",
                        path.display(),
                        error
                    );
                    Self::default()
                }
            },
            Err(error) => {
                tracing::warn!(
                    "Failed to read feed config at {}: {}",
                    path.display(),
                    error
                );
                Self::default()
            }
        }
    }

    /// Parse and validate a JSON payload
    pub fn parse(payload: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(payload)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        self.validate()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Apply `MEDALERT_*` environment overrides
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(
            std::env::var(ENV_COLLECTION).ok(),
            std::env::var(ENV_MAX_SCHEDULED).ok(),
            std::env::var(ENV_DEFAULT_BODY).ok(),
        )
    }

    fn with_overrides(
        mut self,
        collection: Option<String>,
        max_scheduled: Option<String>,
        default_body: Option<String>,
    ) -> Self {
        if let Some(collection) = normalize_text_option(collection) {
            self.collection = collection;
        }
        if let Some(raw) = normalize_text_option(max_scheduled) {
            match raw.parse::<usize>() {
                Ok(limit) if is_valid_limit(limit) => self.max_scheduled = limit,
                Ok(limit) => tracing::warn!(
                    "Ignoring {ENV_MAX_SCHEDULED}={limit}: must be between 1 and {DEFAULT_MAX_SCHEDULED}"
                ),
                Err(error) => tracing::warn!("Ignoring {ENV_MAX_SCHEDULED}={raw}: {error}"),
            }
        }
        if let Some(body) = normalize_text_option(default_body) {
            self.default_body = body;
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.collection.trim().is_empty() {
            return Err(Error::Config("collection must not be empty".to_string()));
        }
        if !is_valid_limit(self.max_scheduled) {
            return Err(Error::Config(format!(
                "max_scheduled must be between 1 and {DEFAULT_MAX_SCHEDULED}, got {}",
                self.max_scheduled
            )));
        }
        if self.default_body.trim().is_empty() {
            return Err(Error::Config("default_body must not be empty".to_string()));
        }
        Ok(())
    }
}

fn is_valid_limit(limit: usize) -> bool {
    (1..=DEFAULT_MAX_SCHEDULED).contains(&limit)
}
