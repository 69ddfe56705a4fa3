//! Identity provider seam.
//!
//! Sign-in itself is owned by an external provider; the feed only needs a
//! stable user identifier and a signal when it changes.

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::models::UserId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: UserId,
    pub email: Option<String>,
}

impl AuthUser {
    pub fn new(id: impl Into<UserId>) -> Self {
        Self {
            id: id.into(),
            email: None,
        }
    }

    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}

pub trait IdentityProvider: Send + Sync {
    /// The signed-in user, if any
    fn current_user(&self) -> Option<AuthUser>;

    /// Receiver that observes every sign-in, sign-out and account switch
    fn watch_user(&self) -> watch::Receiver<Option<AuthUser>>;
}

/// In-process identity provider driven by explicit sign-in/out calls
#[derive(Debug, Clone)]
pub struct SessionIdentity {
    sender: watch::Sender<Option<AuthUser>>,
}

impl SessionIdentity {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(None);
        Self { sender }
    }

    pub fn sign_in(&self, user: AuthUser) {
        tracing::info!(user_id = %user.id, "User signed in");
        self.sender.send_replace(Some(user));
    }

    pub fn sign_out(&self) {
        if self.sender.send_replace(None).is_some() {
            tracing::info!("User signed out");
        }
    }
}

impl Default for SessionIdentity {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityProvider for SessionIdentity {
    fn current_user(&self) -> Option<AuthUser> {
        self.sender.borrow().clone()
    }

    fn watch_user(&self) -> watch::Receiver<Option<AuthUser>> {
        self.sender.subscribe()
    }
}
