//! In-process notification scheduler

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::{
    NotificationError, NotificationId, NotificationRequest, NotificationResult,
    NotificationScheduler, PermissionStatus, PresentationOptions,
};
use crate::models::AlertId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledNotification {
    pub id: NotificationId,
    pub request: NotificationRequest,
}

#[derive(Debug)]
struct SchedulerState {
    permission: PermissionStatus,
    /// Status the user "answers" when prompted
    prompt_answer: PermissionStatus,
    permission_requests: usize,
    handler: Option<PresentationOptions>,
    scheduled: Vec<ScheduledNotification>,
    next_id: u64,
    failing_alerts: HashSet<AlertId>,
    cancel_failure: Option<NotificationError>,
}

/// Clonable in-memory [`NotificationScheduler`]; clones share state
#[derive(Debug, Clone)]
pub struct MemoryNotificationScheduler {
    state: Arc<Mutex<SchedulerState>>,
}

impl MemoryNotificationScheduler {
    /// Scheduler with permission already granted
    pub fn new() -> Self {
        Self::with_permission(PermissionStatus::Granted, PermissionStatus::Granted)
    }

    /// Scheduler with an initial permission and the answer given when prompted
    pub fn with_permission(current: PermissionStatus, prompt_answer: PermissionStatus) -> Self {
        Self {
            state: Arc::new(Mutex::new(SchedulerState {
                permission: current,
                prompt_answer,
                permission_requests: 0,
                handler: None,
                scheduled: Vec::new(),
                next_id: 1,
                failing_alerts: HashSet::new(),
                cancel_failure: None,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SchedulerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make every schedule request for `alert_id` fail
    pub fn fail_alert(&self, alert_id: impl Into<AlertId>) {
        self.lock().failing_alerts.insert(alert_id.into());
    }

    /// Make `cancel_all` fail with `error` until cleared with `None`
    pub fn fail_cancel_all(&self, error: Option<NotificationError>) {
        self.lock().cancel_failure = error;
    }

    pub fn scheduled(&self) -> Vec<ScheduledNotification> {
        self.lock().scheduled.clone()
    }

    /// Alert ids of scheduled notifications, in scheduling order
    pub fn scheduled_alert_ids(&self) -> Vec<AlertId> {
        self.lock()
            .scheduled
            .iter()
            .map(|notification| notification.request.content.data.alert_id.clone())
            .collect()
    }

    pub fn handler(&self) -> Option<PresentationOptions> {
        self.lock().handler
    }

    pub fn permission_requests(&self) -> usize {
        self.lock().permission_requests
    }
}

impl Default for MemoryNotificationScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationScheduler for MemoryNotificationScheduler {
    async fn permission_status(&self) -> NotificationResult<PermissionStatus> {
        Ok(self.lock().permission)
    }

    async fn request_permission(&mut self) -> NotificationResult<PermissionStatus> {
        let mut state = self.lock();
        state.permission_requests += 1;
        state.permission = state.prompt_answer;
        Ok(state.permission)
    }

    fn register_handler(&mut self, options: PresentationOptions) {
        self.lock().handler = Some(options);
    }

    async fn cancel_all(&mut self) -> NotificationResult<()> {
        let mut state = self.lock();
        if let Some(error) = state.cancel_failure.clone() {
            return Err(error);
        }
        state.scheduled.clear();
        Ok(())
    }

    async fn schedule(&mut self, request: NotificationRequest) -> NotificationResult<NotificationId> {
        let mut state = self.lock();
        if state
            .failing_alerts
            .contains(&request.content.data.alert_id)
        {
            return Err(NotificationError::Rejected(format!(
                "scheduler refused alert {}",
                request.content.data.alert_id
            )));
        }

        let id = NotificationId::new(format!("local-{}", state.next_id));
        state.next_id += 1;
        state.scheduled.push(ScheduledNotification {
            id: id.clone(),
            request,
        });
        Ok(id)
    }
}
