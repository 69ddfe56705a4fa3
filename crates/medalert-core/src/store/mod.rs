//! Document store with change feed.
//!
//! The store is an external collaborator: it answers one-time queries and
//! pushes a fresh snapshot of a query's result set on every change. The
//! feed manager only ever reads through this interface.

mod memory;

use std::future::Future;

use serde_json::Value;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::models::UserId;
use crate::record::{Document, FIELD_ASSIGNED_TO};

pub use memory::MemoryDocumentStore;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),
    #[error("Permission denied: {0}")]
    PermissionDenied(String),
    #[error("Invalid query: {0}")]
    InvalidQuery(String),
    #[error("Document not found: {0}")]
    NotFound(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Record filter applied by the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    All,
    /// `field` is an array containing `value`
    ArrayContains { field: String, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub collection: String,
    pub filter: Filter,
}

impl Query {
    pub fn collection(name: impl Into<String>) -> Self {
        Self {
            collection: name.into(),
            filter: Filter::All,
        }
    }

    #[must_use]
    pub fn array_contains(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.filter = Filter::ArrayContains {
            field: field.into(),
            value: value.into(),
        };
        self
    }

    /// Alerts in `collection` whose assignees include `user`
    pub fn assigned_to(collection: &str, user: &UserId) -> Self {
        Self::collection(collection).array_contains(FIELD_ASSIGNED_TO, user.as_str())
    }

    pub fn matches(&self, document: &Document) -> bool {
        match &self.filter {
            Filter::All => true,
            Filter::ArrayContains { field, value } => document
                .get(field)
                .and_then(Value::as_array)
                .is_some_and(|items| items.iter().any(|item| item.as_str() == Some(value))),
        }
    }
}

/// Result set of a query at a given store version
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// Monotonic change counter of the store at read time
    pub version: u64,
    pub documents: Vec<Document>,
}

/// Cancels a standing subscription. Dropping the handle also cancels it.
pub struct SubscriptionHandle {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl SubscriptionHandle {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Stop further deliveries. Safe to call more than once.
    pub fn unsubscribe(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }

    pub const fn is_active(&self) -> bool {
        self.cancel.is_some()
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl std::fmt::Debug for SubscriptionHandle {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("SubscriptionHandle")
            .field("active", &self.is_active())
            .finish()
    }
}

/// Receiving side of a subscription
#[derive(Debug)]
pub struct ChangeFeed {
    receiver: mpsc::UnboundedReceiver<StoreResult<Snapshot>>,
}

impl ChangeFeed {
    /// Create a connected sender/feed pair
    pub fn channel() -> (mpsc::UnboundedSender<StoreResult<Snapshot>>, Self) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (sender, Self { receiver })
    }

    /// Next delivery; `None` once the store has closed the subscription
    pub async fn next(&mut self) -> Option<StoreResult<Snapshot>> {
        self.receiver.recv().await
    }
}

#[derive(Debug)]
pub struct Subscription {
    pub handle: SubscriptionHandle,
    pub feed: ChangeFeed,
}

impl Subscription {
    pub const fn new(handle: SubscriptionHandle, feed: ChangeFeed) -> Self {
        Self { handle, feed }
    }

    pub fn into_parts(self) -> (SubscriptionHandle, ChangeFeed) {
        (self.handle, self.feed)
    }
}

/// Point queries plus push-based change subscriptions
pub trait DocumentStore: Send + Sync + 'static {
    /// One-time query returning the current matching records
    fn fetch(&self, query: &Query) -> impl Future<Output = StoreResult<Snapshot>> + Send;

    /// Open a standing subscription; every change to the result set is
    /// delivered as a full snapshot on the returned feed
    fn subscribe(&self, query: &Query) -> StoreResult<Subscription>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn assigned_to_matches_array_membership() {
        let query = Query::assigned_to("alerts", &UserId::from("u1"));
        let Value::Object(fields) = json!({ "assignedTo": ["u0", "u1"] }) else {
            unreachable!()
        };
        assert!(query.matches(&Document::new("a", fields)));

        let Value::Object(fields) = json!({ "assignedTo": "u1" }) else {
            unreachable!()
        };
        assert!(!query.matches(&Document::new("b", fields)));
    }

    #[test]
    fn handle_cancels_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let mut handle = SubscriptionHandle::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        handle.unsubscribe();
        handle.unsubscribe();
        drop(handle);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
