//! Alert feed manager service

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use tokio::sync::{watch, OnceCell};
use tokio::task::JoinHandle;

use super::state::{AlertFeedState, FeedPhase};
use crate::config::FeedConfig;
use crate::identity::IdentityProvider;
use crate::models::UserId;
use crate::notifications::{
    schedule_notifications, NotificationOwner, NotificationScheduler, PermissionStatus,
};
use crate::record::decode_alerts;
use crate::store::{DocumentStore, Query, Snapshot, SubscriptionHandle};

struct ActiveSubscription {
    handle: SubscriptionHandle,
    task: JoinHandle<()>,
}

impl ActiveSubscription {
    fn cancel(mut self) {
        self.handle.unsubscribe();
        self.task.abort();
    }
}

/// Bookkeeping for the current user session.
///
/// `epoch` changes on every initialize/teardown; work started under an older
/// epoch must not touch state. `last_version` is the store version of the
/// last applied snapshot.
#[derive(Default)]
struct Session {
    epoch: u64,
    user: Option<UserId>,
    last_version: Option<u64>,
    subscription: Option<ActiveSubscription>,
}

impl Session {
    /// End the current session and start a new epoch. Returns whether a
    /// subscription was cancelled.
    fn restart(&mut self, user: Option<UserId>) -> bool {
        self.epoch += 1;
        self.user = user;
        self.last_version = None;
        let cancelled = self.subscription.take().map(ActiveSubscription::cancel);
        cancelled.is_some()
    }
}

struct Inner<S, N> {
    store: S,
    notifications: NotificationOwner<N>,
    config: FeedConfig,
    state: watch::Sender<AlertFeedState>,
    session: Mutex<Session>,
    permission: OnceCell<PermissionStatus>,
}

/// Keeps a user's alert list in sync with the document store and owns the
/// device notification schedule derived from it.
///
/// Failures never escape the lifecycle methods: they are logged and the
/// last good state is kept.
pub struct AlertFeedManager<S, N> {
    inner: Arc<Inner<S, N>>,
}

impl<S, N> Clone for AlertFeedManager<S, N> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: DocumentStore, N: NotificationScheduler> AlertFeedManager<S, N> {
    pub fn new(store: S, scheduler: N, config: FeedConfig) -> Self {
        let (state, _) = watch::channel(AlertFeedState::default());
        Self {
            inner: Arc::new(Inner {
                store,
                notifications: NotificationOwner::new(scheduler),
                config,
                state,
                session: Mutex::new(Session::default()),
                permission: OnceCell::new(),
            }),
        }
    }

    pub fn config(&self) -> &FeedConfig {
        &self.inner.config
    }

    /// Current state snapshot
    pub fn state(&self) -> AlertFeedState {
        self.inner.state.borrow().clone()
    }

    /// Receiver notified on every state change
    pub fn subscribe(&self) -> watch::Receiver<AlertFeedState> {
        self.inner.state.subscribe()
    }

    /// Start following `user`'s alerts, replacing any previous session.
    ///
    /// With no user the feed becomes empty. Otherwise a standing
    /// subscription is opened and one fetch is awaited.
    pub async fn initialize(&self, user: Option<UserId>) {
        self.inner.ensure_permissions().await;

        let Some(user) = user else {
            {
                let mut session = self.inner.session();
                session.restart(None);
                self.inner.state.send_modify(|state| {
                    state.phase = FeedPhase::Empty;
                    state.user = None;
                    state.alerts.clear();
                    state.loading = false;
                });
            }
            tracing::info!("No signed-in user; alert feed is empty");
            return;
        };

        let epoch = {
            let mut session = self.inner.session();
            let previous = session.user.clone();
            if session.restart(Some(user.clone())) {
                tracing::debug!("Replaced previous alert subscription");
            }
            self.inner.state.send_modify(|state| {
                if previous.as_ref() != Some(&user) {
                    state.alerts.clear();
                }
                state.phase = FeedPhase::Loading;
                state.user = Some(user.clone());
                state.loading = true;
            });
            session.epoch
        };

        tracing::info!(user_id = %user, "Loading alerts");
        self.spawn_subscription(epoch, &user);
        self.inner.load(epoch, &user).await;
    }

    /// Cancel the standing subscription and return to the uninitialized state.
    ///
    /// Takes effect immediately: deliveries or fetches that complete later
    /// are discarded.
    pub fn teardown(&self) {
        let cancelled = {
            let mut session = self.inner.session();
            let cancelled = session.restart(None);
            self.inner.state.send_modify(|state| {
                *state = AlertFeedState {
                    notifications_enabled: state.notifications_enabled,
                    permission: state.permission,
                    scheduled: std::mem::take(&mut state.scheduled),
                    ..AlertFeedState::default()
                };
            });
            cancelled
        };
        if cancelled {
            tracing::info!("Alert feed torn down");
        }
    }

    /// Re-run the one-time fetch; no-op without a user
    pub async fn refresh(&self) {
        let Some((epoch, user)) = self.inner.current_user() else {
            tracing::debug!("Refresh skipped: no signed-in user");
            return;
        };
        self.inner.state.send_modify(|state| state.loading = true);
        self.inner.load(epoch, &user).await;
    }

    /// Turn local notifications back on and schedule from the current alerts
    pub async fn enable_notifications(&self) {
        tracing::info!("Enabling notifications");
        self.inner
            .state
            .send_modify(|state| state.notifications_enabled = true);
        let epoch = self.inner.session().epoch;
        self.inner.reschedule(epoch).await;
    }

    /// Turn local notifications off and cancel everything scheduled
    pub async fn disable_notifications(&self) {
        tracing::info!("Disabling notifications");
        self.inner
            .state
            .send_modify(|state| state.notifications_enabled = false);

        let mut scheduler = self.inner.notifications.lock().await;
        match scheduler.cancel_all().await {
            Ok(()) => self
                .inner
                .state
                .send_modify(|state| state.scheduled.clear()),
            Err(error) => tracing::error!("Failed to cancel notifications: {error}"),
        }
    }

    /// Re-initialize whenever the signed-in user changes.
    ///
    /// The returned task ends when the identity provider goes away.
    pub fn follow<I: IdentityProvider + ?Sized>(&self, identity: &I) -> JoinHandle<()> {
        let mut receiver = identity.watch_user();
        let manager = self.clone();
        tokio::spawn(async move {
            loop {
                let user = receiver
                    .borrow_and_update()
                    .as_ref()
                    .map(|user| user.id.clone());
                manager.initialize(user).await;
                if receiver.changed().await.is_err() {
                    break;
                }
            }
        })
    }

    fn spawn_subscription(&self, epoch: u64, user: &UserId) {
        let query = self.inner.query(user);
        let subscription = match self.inner.store.subscribe(&query) {
            Ok(subscription) => subscription,
            Err(error) => {
                tracing::error!(user_id = %user, "Failed to subscribe to alerts: {error}");
                return;
            }
        };

        let (mut handle, mut feed) = subscription.into_parts();
        let inner = Arc::clone(&self.inner);
        let task = tokio::spawn(async move {
            while let Some(delivery) = feed.next().await {
                match delivery {
                    Ok(snapshot) => inner.apply_snapshot(epoch, snapshot).await,
                    Err(error) => tracing::error!("Alert subscription delivery failed: {error}"),
                }
                if !inner.is_current(epoch) {
                    break;
                }
            }
            tracing::debug!("Alert subscription closed");
        });

        let mut session = self.inner.session();
        if session.epoch == epoch {
            session.subscription = Some(ActiveSubscription { handle, task });
        } else {
            handle.unsubscribe();
            task.abort();
        }
    }
}

impl<S: DocumentStore, N: NotificationScheduler> Inner<S, N> {
    fn session(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_current(&self, epoch: u64) -> bool {
        self.session().epoch == epoch
    }

    fn current_user(&self) -> Option<(u64, UserId)> {
        let session = self.session();
        session.user.clone().map(|user| (session.epoch, user))
    }

    fn query(&self, user: &UserId) -> Query {
        Query::assigned_to(&self.config.collection, user)
    }

    async fn load(&self, epoch: u64, user: &UserId) {
        match self.store.fetch(&self.query(user)).await {
            Ok(snapshot) => {
                tracing::info!(
                    user_id = %user,
                    count = snapshot.documents.len(),
                    version = snapshot.version,
                    "Fetched alerts"
                );
                self.apply_snapshot(epoch, snapshot).await;
            }
            Err(error) => tracing::error!(user_id = %user, "Failed to load alerts: {error}"),
        }

        let session = self.session();
        if session.epoch == epoch {
            self.state.send_modify(|state| {
                state.loading = false;
                if state.phase == FeedPhase::Loading {
                    state.phase = FeedPhase::Ready;
                }
            });
        }
        drop(session);
    }

    /// Replace the alert list with `snapshot` unless it is stale, then
    /// reschedule notifications.
    async fn apply_snapshot(&self, epoch: u64, snapshot: Snapshot) {
        let mut alerts = decode_alerts(&snapshot.documents);
        {
            let mut session = self.session();
            if session.epoch != epoch {
                tracing::debug!("Discarding alerts for an ended session");
                return;
            }
            if session
                .last_version
                .is_some_and(|applied| snapshot.version < applied)
            {
                tracing::debug!(version = snapshot.version, "Discarding stale alert snapshot");
                return;
            }
            session.last_version = Some(snapshot.version);
            if let Some(user) = &session.user {
                alerts.retain(|alert| alert.is_visible_to(user));
            }
            self.state.send_modify(|state| state.alerts = alerts);
        }

        let enabled = self.state.borrow().notifications_enabled;
        if enabled {
            self.reschedule(epoch).await;
        }
    }

    /// Clear and re-add the device schedule from the current alert list
    async fn reschedule(&self, epoch: u64) {
        let mut scheduler = self.notifications.lock().await;

        // Re-read under the writer lock; an older pass may have been queued
        // behind a disable or a newer snapshot.
        let (alerts, enabled) = {
            let state = self.state.borrow();
            (state.alerts.clone(), state.notifications_enabled)
        };
        if !enabled || !self.is_current(epoch) {
            return;
        }

        match schedule_notifications(&mut *scheduler, &alerts, Utc::now(), &self.config).await {
            Ok(report) => self
                .state
                .send_modify(|state| state.scheduled = report.scheduled),
            Err(error) => tracing::error!("Failed to reschedule notifications: {error}"),
        }
    }

    async fn ensure_permissions(&self) {
        let status = *self
            .permission
            .get_or_init(|| self.configure_permissions())
            .await;
        self.state.send_if_modified(|state| {
            let changed = state.permission != status;
            state.permission = status;
            changed
        });
    }

    async fn configure_permissions(&self) -> PermissionStatus {
        let mut scheduler = self.notifications.lock().await;

        let existing = match scheduler.permission_status().await {
            Ok(status) => status,
            Err(error) => {
                tracing::warn!("Failed to read notification permission: {error}");
                PermissionStatus::Undetermined
            }
        };

        let status = if existing.is_granted() {
            existing
        } else {
            match scheduler.request_permission().await {
                Ok(status) => status,
                Err(error) => {
                    tracing::warn!("Notification permission request failed: {error}");
                    PermissionStatus::Denied
                }
            }
        };

        if status.is_granted() {
            scheduler.register_handler(self.config.presentation);
        } else {
            tracing::warn!("Notification permission not granted; local notifications unavailable");
        }
        status
    }
}
