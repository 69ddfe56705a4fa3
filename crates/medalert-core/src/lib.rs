//! medalert-core - Core library for Medalert
//!
//! This crate contains the alert models, record decoding, the live alert
//! feed manager, and local notification scheduling shared by every Medalert
//! interface.

pub mod config;
pub mod dates;
pub mod error;
pub mod feed;
pub mod identity;
pub mod models;
pub mod notifications;
pub mod record;
pub mod store;
pub mod util;
pub mod validation;

pub use config::FeedConfig;
pub use error::{Error, Result};
pub use feed::{AlertFeedManager, AlertFeedState, FeedPhase};
pub use identity::{AuthUser, IdentityProvider, SessionIdentity};
pub use models::{Alert, AlertId, AlertPriority, AlertStatus, AlertType, UserId};
pub use notifications::{NotificationScheduler, PermissionStatus};
pub use store::{DocumentStore, Query, Snapshot};
