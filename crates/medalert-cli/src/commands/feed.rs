use std::path::Path;

use chrono::Utc;
use medalert_core::models::NotificationScheduleEntry;
use medalert_core::notifications::MemoryNotificationScheduler;
use medalert_core::store::MemoryDocumentStore;
use medalert_core::util::normalize_text_option;
use medalert_core::{AlertFeedManager, AlertFeedState, FeedConfig, UserId};
use serde::Serialize;

use crate::commands::common::{
    alert_to_list_item, format_alert_lines, format_schedule_lines, load_fixture, seed_store,
    AlertListItem,
};
use crate::error::CliError;

#[derive(Debug, Serialize)]
struct FeedReport {
    user: String,
    alerts: Vec<AlertListItem>,
    scheduled: Vec<NotificationScheduleEntry>,
}

/// Seed an in-memory store from `fixture` and run one feed session for `user`
pub async fn load_feed(
    fixture: &Path,
    user: &str,
    notifications: bool,
    config: FeedConfig,
) -> Result<AlertFeedState, CliError> {
    let user = normalize_text_option(Some(user.to_string())).ok_or(CliError::EmptyUserId)?;

    let store = MemoryDocumentStore::new();
    let seeded = seed_store(&store, &config.collection, load_fixture(fixture)?);
    tracing::debug!(count = seeded, "Seeded alert records from fixture");

    let manager = AlertFeedManager::new(store, MemoryNotificationScheduler::new(), config);
    if !notifications {
        manager.disable_notifications().await;
    }
    manager.initialize(Some(UserId::new(user))).await;

    let state = manager.state();
    manager.teardown();
    Ok(state)
}

pub async fn run_feed(
    fixture: &Path,
    user: &str,
    as_json: bool,
    notifications: bool,
    config: FeedConfig,
) -> Result<(), CliError> {
    let state = load_feed(fixture, user, notifications, config).await?;
    let now = Utc::now();

    if as_json {
        let report = FeedReport {
            user: user.trim().to_string(),
            alerts: state
                .alerts
                .iter()
                .map(|alert| alert_to_list_item(alert, now))
                .collect(),
            scheduled: state.scheduled,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if state.alerts.is_empty() {
        println!("No alerts for {}", user.trim());
        return Ok(());
    }

    for line in format_alert_lines(&state.alerts, now) {
        println!("{line}");
    }

    if !state.notifications_enabled {
        println!("\nNotifications disabled");
    } else if state.scheduled.is_empty() {
        println!("\nNo upcoming notifications");
    } else {
        println!("\nScheduled notifications ({}):", state.scheduled.len());
        for line in format_schedule_lines(&state.scheduled) {
            println!("  {line}");
        }
    }

    Ok(())
}
