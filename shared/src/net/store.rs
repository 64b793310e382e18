//! The shared state store: a last-write-wins key-value tree with per-collection
//! change notifications.
//!
//! The real transport is an external collaborator behind [`SharedStore`].
//! [`MemoryStore`] is the in-process implementation; clones share one tree so
//! several managers can play against each other without a network.

use crate::error::StoreError;
use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::fmt;
use std::sync::Arc;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    Players,
    Objects,
    Chat,
    Ping,
}

impl Collection {
    pub fn name(&self) -> &'static str {
        match self {
            Collection::Players => "players",
            Collection::Objects => "objects",
            Collection::Chat => "chat",
            Collection::Ping => "ping",
        }
    }
}

/// `collection/key`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct StorePath {
    pub collection: Collection,
    pub key: String,
}

impl StorePath {
    pub fn new(collection: Collection, key: impl Into<String>) -> Self {
        Self {
            collection,
            key: key.into(),
        }
    }
}

impl fmt::Display for StorePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection.name(), self.key)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventKind {
    Added,
    Changed,
    Removed,
}

/// One child-level notification. `value` is the record after the change
/// (before it, for removals).
#[derive(Clone, Debug, PartialEq)]
pub struct StoreEvent {
    pub kind: EventKind,
    pub collection: Collection,
    pub key: String,
    pub value: Value,
}

impl StoreEvent {
    pub fn path(&self) -> StorePath {
        StorePath::new(self.collection, self.key.clone())
    }

    pub fn decode<T: serde::de::DeserializeOwned>(&self) -> Result<T, StoreError> {
        serde_json::from_value(self.value.clone()).map_err(|source| StoreError::Decode {
            path: self.path().to_string(),
            source,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

pub trait SharedStore: Send + Sync {
    /// Replace the record at `path`.
    fn set(&self, path: &StorePath, value: Value) -> Result<(), StoreError>;

    /// Merge `fields` into the record at `path`, creating it if missing.
    fn update(&self, path: &StorePath, fields: Map<String, Value>) -> Result<(), StoreError>;

    fn remove(&self, path: &StorePath) -> Result<(), StoreError>;

    /// Append under a store-generated, chronologically ordered key.
    fn push(&self, collection: Collection, value: Value) -> Result<String, StoreError>;

    /// Whether the collection has at least one child.
    fn any(&self, collection: Collection) -> Result<bool, StoreError>;

    /// Start receiving child events. Existing children arrive first as `Added`.
    fn subscribe(&self, collection: Collection) -> Result<SubscriptionId, StoreError>;

    /// Take every event queued for `subscription` since the last drain.
    fn drain(&self, subscription: SubscriptionId) -> Result<Vec<StoreEvent>, StoreError>;
}

/// Encode a record for a write.
pub fn encode<T: serde::Serialize>(path: &StorePath, record: &T) -> Result<Value, StoreError> {
    serde_json::to_value(record).map_err(|source| StoreError::Encode {
        path: path.to_string(),
        source,
    })
}

/// Encode a partial record as a field map for [`SharedStore::update`].
pub fn encode_fields<T: serde::Serialize>(
    path: &StorePath,
    fields: &T,
) -> Result<Map<String, Value>, StoreError> {
    match encode(path, fields)? {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::Encode {
            path: path.to_string(),
            source: serde::ser::Error::custom(format!("expected an object, got {other}")),
        }),
    }
}

#[derive(Debug)]
struct Subscriber {
    collection: Collection,
    inbox: VecDeque<StoreEvent>,
}

#[derive(Debug, Default)]
struct Inner {
    tree: BTreeMap<Collection, BTreeMap<String, Value>>,
    subscribers: HashMap<u64, Subscriber>,
    next_subscription: u64,
    next_push: u64,
}

impl Inner {
    fn notify(&mut self, kind: EventKind, collection: Collection, key: &str, value: &Value) {
        for sub in self
            .subscribers
            .values_mut()
            .filter(|s| s.collection == collection)
        {
            sub.inbox.push_back(StoreEvent {
                kind,
                collection,
                key: key.to_string(),
                value: value.clone(),
            });
        }
    }

    fn write(&mut self, path: &StorePath, value: Value) {
        let children = self.tree.entry(path.collection).or_default();
        let kind = match children.insert(path.key.clone(), value.clone()) {
            None => EventKind::Added,
            Some(previous) if previous == value => return,
            Some(_) => EventKind::Changed,
        };
        self.notify(kind, path.collection, &path.key, &value);
    }
}

/// In-process [`SharedStore`]. Cloning shares the same tree.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current record at `path`, if any.
    pub fn get(&self, path: &StorePath) -> Option<Value> {
        let inner = self.inner.lock();
        inner
            .tree
            .get(&path.collection)
            .and_then(|c| c.get(&path.key))
            .cloned()
    }

    pub fn len(&self, collection: Collection) -> usize {
        let inner = self.inner.lock();
        inner.tree.get(&collection).map_or(0, BTreeMap::len)
    }
}

impl SharedStore for MemoryStore {
    fn set(&self, path: &StorePath, value: Value) -> Result<(), StoreError> {
        self.inner.lock().write(path, value);
        Ok(())
    }

    fn update(&self, path: &StorePath, fields: Map<String, Value>) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        let mut merged = inner
            .tree
            .get(&path.collection)
            .and_then(|c| c.get(&path.key))
            .and_then(|v| v.as_object().cloned())
            .unwrap_or_default();
        merged.extend(fields);
        inner.write(path, Value::Object(merged));
        Ok(())
    }

    fn remove(&self, path: &StorePath) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        let removed = inner
            .tree
            .get_mut(&path.collection)
            .and_then(|c| c.remove(&path.key));
        if let Some(value) = removed {
            inner.notify(EventKind::Removed, path.collection, &path.key, &value);
        }
        Ok(())
    }

    fn push(&self, collection: Collection, value: Value) -> Result<String, StoreError> {
        let mut inner = self.inner.lock();
        inner.next_push += 1;
        let key = format!("-{:012}", inner.next_push);
        inner.write(&StorePath::new(collection, key.clone()), value);
        Ok(key)
    }

    fn any(&self, collection: Collection) -> Result<bool, StoreError> {
        let inner = self.inner.lock();
        Ok(inner.tree.get(&collection).is_some_and(|c| !c.is_empty()))
    }

    fn subscribe(&self, collection: Collection) -> Result<SubscriptionId, StoreError> {
        let mut inner = self.inner.lock();
        inner.next_subscription += 1;
        let id = inner.next_subscription;
        let inbox = inner
            .tree
            .get(&collection)
            .into_iter()
            .flatten()
            .map(|(key, value)| StoreEvent {
                kind: EventKind::Added,
                collection,
                key: key.clone(),
                value: value.clone(),
            })
            .collect();
        inner
            .subscribers
            .insert(id, Subscriber { collection, inbox });
        Ok(SubscriptionId(id))
    }

    fn drain(&self, subscription: SubscriptionId) -> Result<Vec<StoreEvent>, StoreError> {
        let mut inner = self.inner.lock();
        let sub = inner
            .subscribers
            .get_mut(&subscription.0)
            .ok_or(StoreError::UnknownSubscription(subscription.0))?;
        Ok(sub.inbox.drain(..).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn subscribers_see_existing_children_then_changes() {
        let store = MemoryStore::new();
        let path = StorePath::new(Collection::Objects, "a");
        store.set(&path, json!({ "x": 1 })).unwrap();

        let sub = store.subscribe(Collection::Objects).unwrap();
        let events = store.drain(sub).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, EventKind::Added);

        store.update(&path, fields(json!({ "owner": "b" }))).unwrap();
        let events = store.drain(sub).unwrap();
        assert_eq!(events[0].kind, EventKind::Changed);
        assert_eq!(events[0].value, json!({ "x": 1, "owner": "b" }));

        store.remove(&path).unwrap();
        assert_eq!(store.drain(sub).unwrap()[0].kind, EventKind::Removed);
        assert!(store.drain(sub).unwrap().is_empty());
    }

    #[test]
    fn identical_writes_do_not_notify() {
        let store = MemoryStore::new();
        let sub = store.subscribe(Collection::Players).unwrap();
        let path = StorePath::new(Collection::Players, "p");
        store.set(&path, json!({ "x": 1 })).unwrap();
        store.set(&path, json!({ "x": 1 })).unwrap();
        assert_eq!(store.drain(sub).unwrap().len(), 1);
    }

    #[test]
    fn subscriptions_are_scoped_to_their_collection() {
        let store = MemoryStore::new();
        let chat = store.subscribe(Collection::Chat).unwrap();
        store
            .set(&StorePath::new(Collection::Players, "p"), json!({}))
            .unwrap();
        assert!(store.drain(chat).unwrap().is_empty());
    }

    #[test]
    fn push_keys_sort_in_insertion_order() {
        let store = MemoryStore::new();
        assert!(!store.any(Collection::Chat).unwrap());
        let a = store.push(Collection::Chat, json!({ "text": "a" })).unwrap();
        let b = store.push(Collection::Chat, json!({ "text": "b" })).unwrap();
        assert!(a < b);
        assert!(store.any(Collection::Chat).unwrap());
        assert_eq!(store.len(Collection::Chat), 2);
    }

    #[test]
    fn removing_a_missing_record_is_silent() {
        let store = MemoryStore::new();
        let sub = store.subscribe(Collection::Players).unwrap();
        store
            .remove(&StorePath::new(Collection::Players, "ghost"))
            .unwrap();
        assert!(store.drain(sub).unwrap().is_empty());
    }

    #[test]
    fn clones_share_state() {
        let a = MemoryStore::new();
        let b = a.clone();
        let path = StorePath::new(Collection::Ping, "p");
        a.set(&path, json!(5)).unwrap();
        assert_eq!(b.get(&path), Some(json!(5)));
    }

    #[test]
    fn unknown_subscription_is_an_error() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.drain(SubscriptionId(99)),
            Err(StoreError::UnknownSubscription(99))
        ));
    }
}
