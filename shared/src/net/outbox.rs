use super::store::{Collection, SharedStore, StorePath, encode, encode_fields};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::VecDeque;

/// A queued write.
#[derive(Clone, Debug, PartialEq)]
pub enum StoreOp {
    Set(StorePath, Value),
    Update(StorePath, Map<String, Value>),
    Remove(StorePath),
    Push(Collection, Value),
}

/// Outbound writes, queued during the frame and flushed once per update.
///
/// Writes are fire-and-forget: a failure is logged and dropped, the next tick
/// supersedes it.
#[derive(Debug, Default)]
pub struct Outbox {
    ops: VecDeque<StoreOp>,
}

impl Outbox {
    pub fn set<T: Serialize>(&mut self, path: StorePath, record: &T) {
        match encode(&path, record) {
            Ok(value) => self.ops.push_back(StoreOp::Set(path, value)),
            Err(e) => log::debug!("dropping write: {e}"),
        }
    }

    pub fn update<T: Serialize>(&mut self, path: StorePath, fields: &T) {
        match encode_fields(&path, fields) {
            Ok(map) => self.ops.push_back(StoreOp::Update(path, map)),
            Err(e) => log::debug!("dropping write: {e}"),
        }
    }

    pub fn remove(&mut self, path: StorePath) {
        self.ops.push_back(StoreOp::Remove(path));
    }

    pub fn push<T: Serialize>(&mut self, collection: Collection, record: &T) {
        let path = StorePath::new(collection, "<new>");
        match encode(&path, record) {
            Ok(value) => self.ops.push_back(StoreOp::Push(collection, value)),
            Err(e) => log::debug!("dropping write: {e}"),
        }
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Send everything queued. Returns how many writes the store accepted.
    pub fn flush(&mut self, store: &dyn SharedStore) -> usize {
        let mut sent = 0;
        for op in self.ops.drain(..) {
            let result = match op {
                StoreOp::Set(path, value) => store.set(&path, value),
                StoreOp::Update(path, fields) => store.update(&path, fields),
                StoreOp::Remove(path) => store.remove(&path),
                StoreOp::Push(collection, value) => store.push(collection, value).map(|_| ()),
            };
            match result {
                Ok(()) => sent += 1,
                Err(e) => log::debug!("store write failed: {e}"),
            }
        }
        sent
    }

    /// Forget everything queued without sending.
    pub fn clear(&mut self) {
        self.ops.clear();
    }
}
