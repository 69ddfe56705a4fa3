//! Notification schedule entries derived from alerts

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::AlertId;

/// One local notification planned for an alert
///
/// Entries are ephemeral: every scheduling pass recomputes the full set
/// and replaces whatever was scheduled before.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationScheduleEntry {
    pub alert_id: AlertId,
    pub title: String,
    pub body: String,
    pub firing_time: DateTime<Utc>,
}
