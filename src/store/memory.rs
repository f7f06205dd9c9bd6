use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::debug;

use super::client::{RealtimeStore, Subscription};
use super::tree;
use crate::error::StoreError;

/// In-process [`RealtimeStore`] over a single JSON tree.
///
/// Live subscriptions are notified synchronously on every write that
/// touches their path. Used by tests and the `--demo` mode of the binary.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    root: Value,
    watchers: Vec<Watcher>,
    reject_writes: bool,
    writes: usize,
}

#[derive(Debug)]
struct Watcher {
    path: String,
    tx: mpsc::UnboundedSender<Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with `root` as the whole database.
    pub fn with_data(root: Value) -> Self {
        let store = Self::default();
        store.lock().root = root;
        store
    }

    /// Writes `value` at `path` and notifies subscribers, bypassing
    /// [`MemoryStore::reject_writes`]. Stands in for other clients of the database.
    pub fn insert(&self, path: &str, value: Value) {
        let mut inner = self.lock();
        tree::set_at(&mut inner.root, &tree::segments(path), value);
        inner.notify(path);
    }

    pub fn snapshot(&self, path: &str) -> Option<Value> {
        let inner = self.lock();
        tree::get_at(&inner.root, &tree::segments(path)).cloned()
    }

    /// Makes every subsequent [`RealtimeStore::set`] fail, as a denied rule would.
    pub fn reject_writes(&self, reject: bool) {
        self.lock().reject_writes = reject;
    }

    /// Number of writes accepted through [`RealtimeStore::set`].
    pub fn write_count(&self) -> usize {
        self.lock().writes
    }

    /// Number of live subscriptions whose receiver is still open.
    pub fn watcher_count(&self) -> usize {
        let mut inner = self.lock();
        inner.watchers.retain(|w| !w.tx.is_closed());
        inner.watchers.len()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Inner {
    fn value_at(&self, path: &str) -> Value {
        tree::get_at(&self.root, &tree::segments(path))
            .cloned()
            .unwrap_or(Value::Null)
    }

    fn notify(&mut self, written: &str) {
        let written = tree::segments(written);
        let mut live = Vec::with_capacity(self.watchers.len());

        for watcher in std::mem::take(&mut self.watchers) {
            if tree::overlaps(&written, &tree::segments(&watcher.path)) {
                let snapshot = self.value_at(&watcher.path);
                if watcher.tx.send(snapshot).is_err() {
                    debug!(path = %watcher.path, "Dropping closed watcher");
                    continue;
                }
            }
            live.push(watcher);
        }

        self.watchers = live;
    }
}

#[async_trait]
impl RealtimeStore for MemoryStore {
    async fn get(&self, path: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.snapshot(path))
    }

    async fn set(&self, path: &str, value: Value) -> Result<(), StoreError> {
        let mut inner = self.lock();
        if inner.reject_writes {
            return Err(StoreError::Rejected(path.to_string()));
        }
        tree::set_at(&mut inner.root, &tree::segments(path), value);
        inner.writes += 1;
        inner.notify(path);
        Ok(())
    }

    async fn subscribe(&self, path: &str) -> Result<Subscription, StoreError> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut inner = self.lock();
        // Receiver is alive, so the initial send cannot fail.
        let _ = tx.send(inner.value_at(path));
        inner.watchers.push(Watcher {
            path: path.to_string(),
            tx,
        });
        Ok(Subscription::new(path, rx, None))
    }
}
