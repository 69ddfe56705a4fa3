//! Alert Feed Manager: a live, per-user view of reminder records and the
//! bounded local notification schedule derived from it.

mod manager;
mod state;

pub use manager::AlertFeedManager;
pub use state::{AlertFeedState, FeedPhase};
