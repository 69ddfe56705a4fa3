use std::path::Path;

use chrono::{Duration, TimeZone, Utc};
use medalert_core::{FeedConfig, FeedPhase};
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::commands::common::{
    alert_to_list_item, format_alert_lines, format_schedule_lines, load_fixture, resolve_config_path,
};
use crate::commands::config::{init_config, run_config_init};
use crate::commands::feed::load_feed;
use crate::commands::validate::check_alert;
use crate::error::CliError;
use crate::log_filter;

fn write_fixture(dir: &Path, records: &serde_json::Value) -> std::path::PathBuf {
    let path = dir.join("alerts.json");
    std::fs::write(&path, serde_json::to_string(records).unwrap()).unwrap();
    path
}

#[test]
fn load_fixture_extracts_ids() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(
        dir.path(),
        &json!([
            { "id": "a1", "title": "Insulin" },
            { "id": "  ", "title": "Blank id" },
            { "title": "No id" }
        ]),
    );

    let records = load_fixture(&path).unwrap();
    assert_eq!(records.len(), 3);
    assert_eq!(records[0].0.as_deref(), Some("a1"));
    assert!(!records[0].1.contains_key("id"));
    assert_eq!(records[1].0, None);
    assert_eq!(records[2].0, None);
}

#[test]
fn load_fixture_rejects_non_array() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(dir.path(), &json!({ "id": "a1" }));
    assert!(matches!(load_fixture(&path), Err(CliError::Fixture(_))));

    let path = write_fixture(dir.path(), &json!([1, 2]));
    assert!(matches!(load_fixture(&path), Err(CliError::Fixture(_))));
}

#[tokio::test]
async fn load_feed_shows_only_assigned_alerts_and_schedules_pending() {
    let dir = tempfile::tempdir().unwrap();
    let now = Utc::now();
    let path = write_fixture(
        dir.path(),
        &json!([
            {
                "id": "later",
                "title": "Lab review",
                "scheduledDate": (now + Duration::days(2)).to_rfc3339(),
                "assignedTo": ["u1"]
            },
            {
                "id": "sooner",
                "title": "Insulin",
                "description": "10 units",
                "scheduledDate": { "seconds": (now + Duration::hours(1)).timestamp(), "nanoseconds": 0 },
                "assignedTo": ["u1", "u2"]
            },
            {
                "id": "past",
                "title": "Missed call",
                "scheduledDate": (now - Duration::hours(3)).timestamp_millis(),
                "assignedTo": ["u1"]
            },
            {
                "id": "other",
                "title": "Someone else",
                "scheduledDate": (now + Duration::hours(2)).to_rfc3339(),
                "assignedTo": ["u2"]
            }
        ]),
    );

    let state = load_feed(&path, "u1", true, FeedConfig::default())
        .await
        .unwrap();

    assert_eq!(state.phase, FeedPhase::Ready);
    let ids: Vec<String> = state.alerts.iter().map(|a| a.id.to_string()).collect();
    assert_eq!(ids, vec!["past", "sooner", "later"]);

    let scheduled: Vec<String> = state
        .scheduled
        .iter()
        .map(|entry| entry.alert_id.to_string())
        .collect();
    assert_eq!(scheduled, vec!["sooner", "later"]);
    assert_eq!(state.scheduled[0].body, "10 units");
}

#[tokio::test]
async fn load_feed_without_notifications_schedules_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(
        dir.path(),
        &json!([{
            "id": "a1",
            "scheduledDate": (Utc::now() + Duration::hours(1)).to_rfc3339(),
            "assignedTo": ["u1"]
        }]),
    );

    let state = load_feed(&path, "u1", false, FeedConfig::default())
        .await
        .unwrap();
    assert_eq!(state.alerts.len(), 1);
    assert!(!state.notifications_enabled);
    assert!(state.scheduled.is_empty());
}

#[tokio::test]
async fn load_feed_rejects_blank_user() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(dir.path(), &json!([]));
    let error = load_feed(&path, "  ", true, FeedConfig::default())
        .await
        .unwrap_err();
    assert!(matches!(error, CliError::EmptyUserId));
}

#[test]
fn format_lines_include_status_and_body() {
    let now = Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(
        dir.path(),
        &json!([{ "id": "a1", "title": "", "scheduledDate": "2025-03-02T09:30:00Z" }]),
    );
    let records = load_fixture(&path).unwrap();
    let document = medalert_core::record::Document::new("a1", records[0].1.clone());
    let alert = medalert_core::record::decode_alert(&document).unwrap();

    let lines = format_alert_lines(std::slice::from_ref(&alert), now);
    assert_eq!(lines, vec!["Mar 2, 2025, 09:30  Upcoming  (untitled) [Other / None]"]);

    let entries = medalert_core::notifications::plan_notifications(
        &[alert],
        now,
        &FeedConfig::default(),
    );
    assert_eq!(
        format_schedule_lines(&entries),
        vec!["Mar 2, 2025, 09:30  (untitled): You have a pending alert"]
    );
}

#[test]
fn alert_lines_and_items_show_link() {
    let now = Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap();
    let document = medalert_core::record::Document::new(
        "a1",
        json!({
            "title": "Review labs",
            "type": "lab_results",
            "priority": "high",
            "scheduledDate": "2025-03-20T10:00:00Z",
            "relatedPatientId": "p9"
        })
        .as_object()
        .unwrap()
        .clone(),
    );
    let alert = medalert_core::record::decode_alert(&document).unwrap();

    let lines = format_alert_lines(std::slice::from_ref(&alert), now);
    assert_eq!(
        lines,
        vec!["Mar 20, 2025, 10:00  Pending   Review labs [Lab results / High] -> patient p9"]
    );

    let item = alert_to_list_item(&alert, now);
    assert_eq!(
        serde_json::to_value(&item).unwrap()["link"],
        json!({ "kind": "patient", "id": "p9" })
    );
}

#[test]
fn check_alert_reports_field_errors() {
    let error = check_alert("", "2025-02-30", "9:00").unwrap_err();
    let CliError::InvalidAlert(message) = error else {
        panic!("expected invalid alert error");
    };
    assert!(message.contains("scheduledDate: Invalid format. Use YYYY-MM-DD"));
    assert!(message.contains("scheduledTime: Invalid format. Use HH:MM"));
    assert!(message.contains("title: Title is required"));
}

#[test]
fn check_alert_returns_utc_instant() {
    assert_eq!(
        check_alert("Insulin", "2025-03-05", "08:30").unwrap(),
        Utc.with_ymd_and_hms(2025, 3, 5, 8, 30, 0).unwrap()
    );
}

#[test]
fn init_config_keeps_existing_values_for_blank_input() {
    let existing = FeedConfig {
        collection: "reminders".to_string(),
        ..FeedConfig::default()
    };
    let config = init_config(existing, Some("  ".to_string()), Some(3), None);
    assert_eq!(config.collection, "reminders");
    assert_eq!(config.max_scheduled, 3);
    assert_eq!(config.default_body, "You have a pending alert");
}

#[test]
fn config_init_refuses_limit_above_five() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("feed-config.json");

    let error = run_config_init(&path, None, Some(50), None).unwrap_err();
    assert!(matches!(
        error,
        CliError::Core(medalert_core::Error::Config(_))
    ));
    assert!(!path.exists());

    run_config_init(&path, None, Some(4), None).unwrap();
    assert_eq!(FeedConfig::load_from_path(&path).max_scheduled, 4);
}

#[test]
fn explicit_config_path_wins() {
    let path = resolve_config_path(Some("custom.json".into()));
    assert_eq!(path, Path::new("custom.json"));
}

#[test]
fn log_filter_defaults_to_medalert_info() {
    let filter = log_filter(None).to_string();
    assert!(filter.contains("medalert=info"), "{filter}");
    assert!(filter.contains("medalert_core=info"), "{filter}");

    let filter = log_filter(Some("medalert_core=debug")).to_string();
    assert!(filter.contains("medalert_core=debug"), "{filter}");
    assert!(!filter.contains("medalert=info"), "{filter}");
}
