//! Alert (reminder) model

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{AlertId, UserId};

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;
const UPCOMING_WINDOW_DAYS: i64 = 3;

/// Kind of reminder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    Appointment,
    Medication,
    FollowUp,
    LabResults,
    Task,
    /// Anything the client does not recognize
    #[default]
    #[serde(other)]
    Other,
}

impl AlertType {
    /// Wire name as stored in the document store
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Appointment => "appointment",
            Self::Medication => "medication",
            Self::FollowUp => "follow_up",
            Self::LabResults => "lab_results",
            Self::Task => "task",
            Self::Other => "other",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Appointment => "Appointment",
            Self::Medication => "Medication",
            Self::FollowUp => "Follow-up",
            Self::LabResults => "Lab results",
            Self::Task => "Task",
            Self::Other => "Other",
        }
    }
}

/// Reminder priority; records without one decode as `Unset`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AlertPriority {
    High,
    Medium,
    Low,
    #[default]
    #[serde(other)]
    Unset,
}

impl AlertPriority {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
            Self::Unset => "unset",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
            Self::Unset => "None",
        }
    }
}

/// Due state of an alert relative to a point in time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertStatus {
    Completed,
    /// Scheduled time has passed and the alert is still open
    Overdue,
    /// Due within the next three days
    Upcoming,
    Pending,
}

impl AlertStatus {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Completed => "Completed",
            Self::Overdue => "Overdue",
            Self::Upcoming => "Upcoming",
            Self::Pending => "Pending",
        }
    }
}

/// Domain entity an alert points back to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum AlertLink {
    Record(String),
    Patient(String),
}

impl fmt::Display for AlertLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Record(id) => write!(f, "record {id}"),
            Self::Patient(id) => write!(f, "patient {id}"),
        }
    }
}

/// A scheduled reminder visible to the users in `assigned_to`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    /// Store-assigned identifier
    pub id: AlertId,
    #[serde(rename = "type")]
    pub alert_type: AlertType,
    pub priority: AlertPriority,
    pub title: String,
    pub description: String,
    /// Normalized firing time
    pub scheduled_date: DateTime<Utc>,
    pub completed: bool,
    /// Users who should see this alert
    pub assigned_to: BTreeSet<UserId>,
    pub related_record_id: Option<String>,
    pub related_patient_id: Option<String>,
}

impl Alert {
    /// Whether `user` is one of the assignees
    #[must_use]
    pub fn is_visible_to(&self, user: &UserId) -> bool {
        self.assigned_to.contains(user)
    }

    /// Open and strictly in the future; the only alerts eligible for local notifications
    #[must_use]
    pub fn is_pending_at(&self, now: DateTime<Utc>) -> bool {
        !self.completed && self.scheduled_date > now
    }

    #[must_use]
    pub fn status_at(&self, now: DateTime<Utc>) -> AlertStatus {
        if self.completed {
            return AlertStatus::Completed;
        }
        if self.scheduled_date < now {
            return AlertStatus::Overdue;
        }

        let remaining_ms = (self.scheduled_date - now).num_milliseconds();
        let remaining_days = (remaining_ms + MILLIS_PER_DAY - 1).div_euclid(MILLIS_PER_DAY);
        if (1..=UPCOMING_WINDOW_DAYS).contains(&remaining_days) {
            AlertStatus::Upcoming
        } else {
            AlertStatus::Pending
        }
    }

    /// Related entity to open from this alert; a clinical record wins over a patient
    #[must_use]
    pub fn link(&self) -> Option<AlertLink> {
        self.related_record_id
            .clone()
            .map(AlertLink::Record)
            .or_else(|| self.related_patient_id.clone().map(AlertLink::Patient))
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// Minimal open alert assigned to `user`
    pub fn alert(id: &str, user: &str, scheduled_date: DateTime<Utc>) -> Alert {
        Alert {
            id: AlertId::from(id),
            alert_type: AlertType::Task,
            priority: AlertPriority::Unset,
            title: format!("Alert {id}"),
            description: String::new(),
            scheduled_date,
            completed: false,
            assigned_to: BTreeSet::from([UserId::from(user)]),
            related_record_id: None,
            related_patient_id: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::alert;
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_visibility_follows_assignees() {
        let alert = alert("a1", "u1", Utc::now());
        assert!(alert.is_visible_to(&UserId::from("u1")));
        assert!(!alert.is_visible_to(&UserId::from("u2")));
    }

    #[test]
    fn test_pending_requires_future_and_open() {
        let now = Utc::now();
        let mut future = alert("a1", "u1", now + Duration::minutes(1));
        assert!(future.is_pending_at(now));

        future.completed = true;
        assert!(!future.is_pending_at(now));

        let exactly_now = alert("a2", "u1", now);
        assert!(!exactly_now.is_pending_at(now));
    }

    #[test]
    fn test_status_at() {
        let now = Utc::now();

        let mut done = alert("a1", "u1", now - Duration::days(2));
        done.completed = true;
        assert_eq!(done.status_at(now), AlertStatus::Completed);

        let overdue = alert("a2", "u1", now - Duration::minutes(5));
        assert_eq!(overdue.status_at(now), AlertStatus::Overdue);

        let soon = alert("a3", "u1", now + Duration::hours(2));
        assert_eq!(soon.status_at(now), AlertStatus::Upcoming);

        let three_days = alert("a4", "u1", now + Duration::days(3));
        assert_eq!(three_days.status_at(now), AlertStatus::Upcoming);

        let later = alert("a5", "u1", now + Duration::days(3) + Duration::minutes(1));
        assert_eq!(later.status_at(now), AlertStatus::Pending);
    }

    #[test]
    fn test_link_prefers_record() {
        let mut alert = alert("a1", "u1", Utc::now());
        assert_eq!(alert.link(), None);

        alert.related_patient_id = Some("p1".to_string());
        assert_eq!(alert.link(), Some(AlertLink::Patient("p1".to_string())));

        alert.related_record_id = Some("r1".to_string());
        let link = alert.link().unwrap();
        assert_eq!(link, AlertLink::Record("r1".to_string()));
        assert_eq!(link.to_string(), "record r1");
        assert_eq!(
            serde_json::to_value(&link).unwrap(),
            serde_json::json!({ "kind": "record", "id": "r1" })
        );
    }

    #[test]
    fn test_unknown_wire_values_fall_back() {
        let kind: AlertType = serde_json::from_str("\"vaccination\"").unwrap();
        assert_eq!(kind, AlertType::Other);

        let priority: AlertPriority = serde_json::from_str("\"urgent\"").unwrap();
        assert_eq!(priority, AlertPriority::Unset);

        let kind: AlertType = serde_json::from_str("\"lab_results\"").unwrap();
        assert_eq!(kind.as_str(), "lab_results");
    }
}
