//! In-process document store with a change feed

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::{Map, Value};
use tokio::sync::mpsc;
use uuid::Uuid;

use super::{
    ChangeFeed, DocumentStore, Query, Snapshot, StoreError, StoreResult, Subscription,
    SubscriptionHandle,
};
use crate::record::Document;

type Fields = Map<String, Value>;

struct Listener {
    query: Query,
    sender: mpsc::UnboundedSender<StoreResult<Snapshot>>,
}

#[derive(Default)]
struct StoreState {
    collections: HashMap<String, BTreeMap<String, Fields>>,
    version: u64,
    next_listener_id: u64,
    listeners: HashMap<u64, Listener>,
}

impl StoreState {
    fn snapshot(&self, query: &Query) -> Snapshot {
        let documents = self
            .collections
            .get(&query.collection)
            .into_iter()
            .flat_map(|records| records.iter())
            .map(|(id, fields)| Document::new(id.clone(), fields.clone()))
            .filter(|document| query.matches(document))
            .collect();
        Snapshot {
            version: self.version,
            documents,
        }
    }

    fn commit(&mut self, collection: &str) {
        self.version += 1;
        let mut closed = Vec::new();
        for (id, listener) in &self.listeners {
            if listener.query.collection != collection {
                continue;
            }
            if listener.sender.send(Ok(self.snapshot(&listener.query))).is_err() {
                closed.push(*id);
            }
        }
        for id in closed {
            self.listeners.remove(&id);
        }
    }
}

/// Shared, clonable in-memory implementation of [`DocumentStore`]
///
/// Subscriptions receive the current result set immediately and a fresh
/// snapshot after every write to the subscribed collection.
#[derive(Clone, Default)]
pub struct MemoryDocumentStore {
    state: Arc<Mutex<StoreState>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a record under a new store-assigned id
    pub fn insert(&self, collection: &str, fields: Fields) -> String {
        let id = Uuid::now_v7().to_string();
        self.set(collection, &id, fields);
        id
    }

    /// Create or replace the record `id`
    pub fn set(&self, collection: &str, id: &str, fields: Fields) {
        let mut state = self.lock();
        state
            .collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), fields);
        state.commit(collection);
    }

    /// Merge `fields` into an existing record
    pub fn update(&self, collection: &str, id: &str, fields: Fields) -> StoreResult<()> {
        let mut state = self.lock();
        let record = state
            .collections
            .get_mut(collection)
            .and_then(|records| records.get_mut(id))
            .ok_or_else(|| StoreError::NotFound(format!("{collection}/{id}")))?;
        record.extend(fields);
        state.commit(collection);
        Ok(())
    }

    /// Remove a record, returning whether it existed
    pub fn delete(&self, collection: &str, id: &str) -> bool {
        let mut state = self.lock();
        let removed = state
            .collections
            .get_mut(collection)
            .and_then(|records| records.remove(id))
            .is_some();
        if removed {
            state.commit(collection);
        }
        removed
    }

    /// Deliver `error` to every open subscription
    pub fn publish_error(&self, error: &StoreError) {
        let state = self.lock();
        for listener in state.listeners.values() {
            // A closed receiver is pruned on the next commit.
            let _ = listener.sender.send(Err(error.clone()));
        }
    }

    /// Number of open subscriptions
    pub fn listener_count(&self) -> usize {
        self.lock().listeners.len()
    }

    /// Current change counter
    pub fn version(&self) -> u64 {
        self.lock().version
    }
}

fn validate(query: &Query) -> StoreResult<()> {
    if query.collection.trim().is_empty() {
        return Err(StoreError::InvalidQuery(
            "collection name must not be empty".to_string(),
        ));
    }
    Ok(())
}

impl DocumentStore for MemoryDocumentStore {
    async fn fetch(&self, query: &Query) -> StoreResult<Snapshot> {
        validate(query)?;
        Ok(self.lock().snapshot(query))
    }

    fn subscribe(&self, query: &Query) -> StoreResult<Subscription> {
        validate(query)?;
        let (sender, feed) = ChangeFeed::channel();

        let mut state = self.lock();
        let id = state.next_listener_id;
        state.next_listener_id += 1;
        // Receiver is alive here, the initial delivery cannot fail.
        let _ = sender.send(Ok(state.snapshot(query)));
        state.listeners.insert(
            id,
            Listener {
                query: query.clone(),
                sender,
            },
        );
        drop(state);

        let shared = Arc::clone(&self.state);
        let handle = SubscriptionHandle::new(move || {
            shared
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .listeners
                .remove(&id);
        });
        Ok(Subscription::new(handle, feed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserId;
    use serde_json::json;

    fn fields(value: Value) -> Fields {
        let Value::Object(map) = value else {
            panic!("fixture fields must be an object");
        };
        map
    }

    #[tokio::test]
    async fn fetch_filters_by_assignee() {
        let store = MemoryDocumentStore::new();
        store.set("alerts", "a1", fields(json!({ "assignedTo": ["u1"] })));
        store.set("alerts", "a2", fields(json!({ "assignedTo": ["u2"] })));
        store.set("other", "a3", fields(json!({ "assignedTo": ["u1"] })));

        let snapshot = store
            .fetch(&Query::assigned_to("alerts", &UserId::from("u1")))
            .await
            .unwrap();
        assert_eq!(snapshot.version, 3);
        assert_eq!(snapshot.documents.len(), 1);
        assert_eq!(snapshot.documents[0].id, "a1");
    }

    #[tokio::test]
    async fn fetch_rejects_empty_collection() {
        let store = MemoryDocumentStore::new();
        let error = store.fetch(&Query::collection(" ")).await.unwrap_err();
        assert!(matches!(error, StoreError::InvalidQuery(_)));
    }

    #[tokio::test]
    async fn subscription_delivers_initial_and_change_snapshots() {
        let store = MemoryDocumentStore::new();
        let query = Query::assigned_to("alerts", &UserId::from("u1"));
        let (_handle, mut feed) = store.subscribe(&query).unwrap().into_parts();

        let initial = feed.next().await.unwrap().unwrap();
        assert!(initial.documents.is_empty());

        let id = store.insert("alerts", fields(json!({ "assignedTo": ["u1"] })));
        let changed = feed.next().await.unwrap().unwrap();
        assert_eq!(changed.documents[0].id, id);
        assert!(changed.version > initial.version);

        store
            .update("alerts", &id, fields(json!({ "completed": true })))
            .unwrap();
        let updated = feed.next().await.unwrap().unwrap();
        assert_eq!(updated.documents[0].get("completed"), Some(&json!(true)));

        assert!(store.delete("alerts", &id));
        let deleted = feed.next().await.unwrap().unwrap();
        assert!(deleted.documents.is_empty());
    }

    #[tokio::test]
    async fn unsubscribe_removes_listener() {
        let store = MemoryDocumentStore::new();
        let subscription = store.subscribe(&Query::collection("alerts")).unwrap();
        assert_eq!(store.listener_count(), 1);

        let (mut handle, mut feed) = subscription.into_parts();
        handle.unsubscribe();
        assert_eq!(store.listener_count(), 0);

        // Initial snapshot was already queued, then the channel closes.
        assert!(feed.next().await.is_some());
        assert!(feed.next().await.is_none());
    }

    #[tokio::test]
    async fn publish_error_reaches_subscribers() {
        let store = MemoryDocumentStore::new();
        let (_handle, mut feed) = store
            .subscribe(&Query::collection("alerts"))
            .unwrap()
            .into_parts();
        let _initial = feed.next().await;

        store.publish_error(&StoreError::Unavailable("offline".to_string()));
        let delivery = feed.next().await.unwrap();
        assert_eq!(
            delivery,
            Err(StoreError::Unavailable("offline".to_string()))
        );
    }

    #[test]
    fn update_missing_record_is_not_found() {
        let store = MemoryDocumentStore::new();
        let error = store
            .update("alerts", "missing", fields(json!({})))
            .unwrap_err();
        assert!(matches!(error, StoreError::NotFound(_)));
    }
}
