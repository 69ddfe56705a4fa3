//! Local notification scheduler seam.
//!
//! The device scheduler is a single global resource. [`NotificationOwner`]
//! is the one writer allowed to touch it; every scheduling pass clears
//! everything and re-adds, so a second writer would lose its entries.

mod memory;
mod scheduling;

use std::fmt;
use std::future::Future;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{Mutex, MutexGuard};

use crate::models::{AlertId, NotificationScheduleEntry};

pub use memory::{MemoryNotificationScheduler, ScheduledNotification};
pub use scheduling::{plan_notifications, schedule_notifications, ScheduleReport};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotificationError {
    #[error("Notification permission denied")]
    PermissionDenied,
    #[error("Notification rejected: {0}")]
    Rejected(String),
    #[error("Notification scheduler unavailable: {0}")]
    Unavailable(String),
}

pub type NotificationResult<T> = Result<T, NotificationError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PermissionStatus {
    Granted,
    Denied,
    #[default]
    Undetermined,
}

impl PermissionStatus {
    pub const fn is_granted(self) -> bool {
        matches!(self, Self::Granted)
    }
}

/// How a notification is presented while the app is in the foreground
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
#[allow(clippy::struct_excessive_bools)]
pub struct PresentationOptions {
    pub show_alert: bool,
    pub play_sound: bool,
    pub set_badge: bool,
}

impl Default for PresentationOptions {
    fn default() -> Self {
        Self {
            show_alert: true,
            play_sound: true,
            set_badge: true,
        }
    }
}

/// Identifier the device scheduler returns for a scheduled notification
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationId(String);

impl NotificationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque data routed back to the app when a notification is opened
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPayload {
    pub alert_id: AlertId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationContent {
    pub title: String,
    pub body: String,
    pub data: NotificationPayload,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationRequest {
    pub content: NotificationContent,
    pub firing_time: DateTime<Utc>,
}

impl From<&NotificationScheduleEntry> for NotificationRequest {
    fn from(entry: &NotificationScheduleEntry) -> Self {
        Self {
            content: NotificationContent {
                title: entry.title.clone(),
                body: entry.body.clone(),
                data: NotificationPayload {
                    alert_id: entry.alert_id.clone(),
                },
            },
            firing_time: entry.firing_time,
        }
    }
}

/// OS-level facility that fires notifications at a future time
pub trait NotificationScheduler: Send + Sync + 'static {
    fn permission_status(
        &self,
    ) -> impl Future<Output = NotificationResult<PermissionStatus>> + Send;

    /// Prompt for permission; returns the resulting status
    fn request_permission(
        &mut self,
    ) -> impl Future<Output = NotificationResult<PermissionStatus>> + Send;

    /// Install the foreground presentation handler
    fn register_handler(&mut self, options: PresentationOptions);

    /// Cancel every scheduled local notification
    fn cancel_all(&mut self) -> impl Future<Output = NotificationResult<()>> + Send;

    fn schedule(
        &mut self,
        request: NotificationRequest,
    ) -> impl Future<Output = NotificationResult<NotificationId>> + Send;
}

/// Exclusive owner of the device notification scheduler.
///
/// Holding the guard returned by [`NotificationOwner::lock`] is the only way
/// to reach the scheduler, which serializes clear-then-re-add passes.
pub struct NotificationOwner<N> {
    scheduler: Mutex<N>,
}

impl<N: NotificationScheduler> NotificationOwner<N> {
    pub fn new(scheduler: N) -> Self {
        Self {
            scheduler: Mutex::new(scheduler),
        }
    }

    pub async fn lock(&self) -> MutexGuard<'_, N> {
        self.scheduler.lock().await
    }
}
