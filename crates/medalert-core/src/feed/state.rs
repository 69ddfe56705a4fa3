//! Observable feed state

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{Alert, NotificationScheduleEntry, UserId};
use crate::notifications::PermissionStatus;

/// Lifecycle phase of a feed manager
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FeedPhase {
    #[default]
    Uninitialized,
    /// Initial fetch in flight
    Loading,
    Ready,
    /// No signed-in user
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlertFeedState {
    pub phase: FeedPhase,
    pub user: Option<UserId>,
    /// Alerts assigned to `user`, ascending by scheduled date
    pub alerts: Vec<Alert>,
    pub loading: bool,
    pub notifications_enabled: bool,
    /// Entries placed on the device scheduler by the last pass
    pub scheduled: Vec<NotificationScheduleEntry>,
    pub permission: PermissionStatus,
}

impl Default for AlertFeedState {
    fn default() -> Self {
        Self {
            phase: FeedPhase::Uninitialized,
            user: None,
            alerts: Vec::new(),
            loading: false,
            notifications_enabled: true,
            scheduled: Vec::new(),
            permission: PermissionStatus::Undetermined,
        }
    }
}

impl AlertFeedState {
    pub fn is_ready(&self) -> bool {
        self.phase == FeedPhase::Ready
    }

    /// Open alerts still ahead of `now`
    pub fn pending_count(&self, now: DateTime<Utc>) -> usize {
        self.alerts
            .iter()
            .filter(|alert| alert.is_pending_at(now))
            .count()
    }
}
