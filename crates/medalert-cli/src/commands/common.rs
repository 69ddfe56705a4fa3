use std::env;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use medalert_core::dates::format_date_time;
use medalert_core::models::NotificationScheduleEntry;
use medalert_core::store::MemoryDocumentStore;
use medalert_core::util::normalize_text_option;
use medalert_core::models::AlertLink;
use medalert_core::{Alert, FeedConfig};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::CliError;

const ID_FIELD: &str = "id";

/// Fixture record: optional explicit id plus the remaining fields
pub type FixtureRecord = (Option<String>, Map<String, Value>);

#[derive(Debug, Serialize)]
pub struct AlertListItem {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub alert_type: String,
    pub priority: String,
    pub status: String,
    pub scheduled_date: String,
    pub completed: bool,
    /// Record or patient the alert opens
    pub link: Option<AlertLink>,
}

pub fn alert_to_list_item(alert: &Alert, now: DateTime<Utc>) -> AlertListItem {
    AlertListItem {
        id: alert.id.to_string(),
        title: alert.title.clone(),
        alert_type: alert.alert_type.as_str().to_string(),
        priority: alert.priority.as_str().to_string(),
        status: alert.status_at(now).label().to_string(),
        scheduled_date: alert.scheduled_date.to_rfc3339(),
        completed: alert.completed,
        link: alert.link(),
    }
}

pub fn format_alert_lines(alerts: &[Alert], now: DateTime<Utc>) -> Vec<String> {
    alerts
        .iter()
        .map(|alert| {
            let line = format!(
                "{}  {:<9} {} [{} / {}]",
                format_date_time(Some(&alert.scheduled_date)),
                alert.status_at(now).label(),
                display_title(&alert.title),
                alert.alert_type.label(),
                alert.priority.label()
            );
            match alert.link() {
                Some(link) => format!("{line} -> {link}"),
                None => line,
            }
        })
        .collect()
}

pub fn format_schedule_lines(entries: &[NotificationScheduleEntry]) -> Vec<String> {
    entries
        .iter()
        .map(|entry| {
            format!(
                "{}  {}: {}",
                format_date_time(Some(&entry.firing_time)),
                display_title(&entry.title),
                entry.body
            )
        })
        .collect()
}

fn display_title(title: &str) -> &str {
    if title.trim().is_empty() {
        "(untitled)"
    } else {
        title
    }
}

/// Read a JSON array of records; each may carry its own `id`
pub fn load_fixture(path: &Path) -> Result<Vec<FixtureRecord>, CliError> {
    let content = std::fs::read_to_string(path)?;
    let Value::Array(records) = serde_json::from_str::<Value>(&content)? else {
        return Err(CliError::Fixture(format!(
            "{} must contain a JSON array of records",
            path.display()
        )));
    };

    records
        .into_iter()
        .enumerate()
        .map(|(index, record)| {
            let Value::Object(mut fields) = record else {
                return Err(CliError::Fixture(format!(
                    "record {index} in {} is not an object",
                    path.display()
                )));
            };
            let id = fields
                .remove(ID_FIELD)
                .and_then(|id| id.as_str().map(str::to_string));
            Ok((normalize_text_option(id), fields))
        })
        .collect()
}

/// Put fixture records into `collection`, returning how many were stored
pub fn seed_store(
    store: &MemoryDocumentStore,
    collection: &str,
    records: Vec<FixtureRecord>,
) -> usize {
    let count = records.len();
    for (id, fields) in records {
        match id {
            Some(id) => store.set(collection, &id, fields),
            None => {
                store.insert(collection, fields);
            }
        }
    }
    count
}

pub fn resolve_config_path(cli_config_path: Option<PathBuf>) -> PathBuf {
    cli_config_path
        .or_else(|| env::var_os("MEDALERT_CONFIG").map(PathBuf::from))
        .unwrap_or_else(default_config_path)
}

pub fn default_config_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("medalert")
        .join("feed-config.json")
}

pub fn load_config(path: &Path) -> FeedConfig {
    FeedConfig::load_from_path(path).with_env_overrides()
}
