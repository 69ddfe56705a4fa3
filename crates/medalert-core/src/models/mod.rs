//! Data models for Medalert

mod alert;
mod ids;
mod schedule;

pub use alert::{Alert, AlertLink, AlertPriority, AlertStatus, AlertType};
pub use ids::{AlertId, UserId};
pub use schedule::NotificationScheduleEntry;

#[cfg(test)]
pub(crate) use alert::fixtures;
