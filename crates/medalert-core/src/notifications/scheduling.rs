//! Derivation of the bounded local notification schedule

use chrono::{DateTime, Utc};

use super::{NotificationRequest, NotificationResult, NotificationScheduler};
use crate::config::{FeedConfig, DEFAULT_MAX_SCHEDULED};
use crate::models::{Alert, AlertId, NotificationScheduleEntry};
use crate::util::non_blank_or;

/// Outcome of one clear-then-re-add pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScheduleReport {
    pub scheduled: Vec<NotificationScheduleEntry>,
    /// Entries the scheduler refused, with the reason
    pub failed: Vec<(AlertId, String)>,
}

/// Pick the soonest pending alerts and build their notification entries.
///
/// `alerts` must already be sorted ascending by scheduled date. At most
/// `config.max_scheduled` entries are returned, never more than
/// [`DEFAULT_MAX_SCHEDULED`].
pub fn plan_notifications(
    alerts: &[Alert],
    now: DateTime<Utc>,
    config: &FeedConfig,
) -> Vec<NotificationScheduleEntry> {
    alerts
        .iter()
        .filter(|alert| alert.is_pending_at(now))
        .take(config.max_scheduled.min(DEFAULT_MAX_SCHEDULED))
        .map(|alert| NotificationScheduleEntry {
            alert_id: alert.id.clone(),
            title: alert.title.clone(),
            body: non_blank_or(&alert.description, &config.default_body).to_string(),
            firing_time: alert.scheduled_date,
        })
        .collect()
}

/// Replace everything on the device scheduler with the plan for `alerts`.
///
/// A failing `cancel_all` aborts the pass so stale and new entries never
/// coexist. Individual schedule failures are logged and skipped.
pub async fn schedule_notifications<N: NotificationScheduler>(
    scheduler: &mut N,
    alerts: &[Alert],
    now: DateTime<Utc>,
    config: &FeedConfig,
) -> NotificationResult<ScheduleReport> {
    scheduler.cancel_all().await?;

    let plan = plan_notifications(alerts, now, config);
    tracing::info!(
        count = plan.len(),
        total = alerts.len(),
        "Scheduling local notifications"
    );

    let mut report = ScheduleReport::default();
    for entry in plan {
        match scheduler.schedule(NotificationRequest::from(&entry)).await {
            Ok(notification_id) => {
                tracing::debug!(
                    alert_id = %entry.alert_id,
                    %notification_id,
                    firing_time = %entry.firing_time,
                    "Scheduled notification"
                );
                report.scheduled.push(entry);
            }
            Err(error) => {
                tracing::error!(alert_id = %entry.alert_id, "Failed to schedule notification: {error}");
                report.failed.push((entry.alert_id, error.to_string()));
            }
        }
    }

    Ok(report)
}
