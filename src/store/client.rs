use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tracing::debug;

use crate::error::StoreError;

/// Abstraction over the realtime database backing the app.
///
/// Paths are slash-separated (`Parents/p1`, `Announcements`). Values are raw
/// JSON; decoding into records happens in [`super::fetch_record`] and
/// [`super::decode_collection`].
#[async_trait]
pub trait RealtimeStore: Send + Sync {
    /// Reads the value at `path`. `None` when nothing is stored there.
    async fn get(&self, path: &str) -> Result<Option<Value>, StoreError>;

    /// Replaces the value at `path`.
    async fn set(&self, path: &str, value: Value) -> Result<(), StoreError>;

    /// Opens a live feed of `path`. The current value is delivered first,
    /// then the full value again after every change.
    async fn subscribe(&self, path: &str) -> Result<Subscription, StoreError>;
}

/// Handle to a live feed opened with [`RealtimeStore::subscribe`].
///
/// Each item is the complete value at the subscribed path (`Null` when the
/// path is empty). The feed is released by [`Subscription::unsubscribe`] or
/// when the handle is dropped.
#[derive(Debug)]
pub struct Subscription {
    path: String,
    updates: mpsc::UnboundedReceiver<Value>,
    task: Option<AbortHandle>,
}

impl Subscription {
    /// `task` is the background reader feeding `updates`, if the store runs one.
    pub fn new(
        path: impl Into<String>,
        updates: mpsc::UnboundedReceiver<Value>,
        task: Option<AbortHandle>,
    ) -> Self {
        Self {
            path: path.into(),
            updates,
            task,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Waits for the next snapshot. `None` once the feed has ended.
    pub async fn next(&mut self) -> Option<Value> {
        self.updates.recv().await
    }

    pub fn unsubscribe(self) {
        debug!(path = %self.path, "Unsubscribing");
    }

    fn release(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.updates.close();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_next_yields_in_order_then_ends() {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut sub = Subscription::new("Announcements", rx, None);

        tx.send(json!({ "a": 1 })).unwrap();
        tx.send(Value::Null).unwrap();
        drop(tx);

        assert_eq!(sub.next().await, Some(json!({ "a": 1 })));
        assert_eq!(sub.next().await, Some(Value::Null));
        assert_eq!(sub.next().await, None);
    }

    #[tokio::test]
    async fn test_unsubscribe_closes_channel() {
        let (tx, rx) = mpsc::unbounded_channel();
        let sub = Subscription::new("Announcements", rx, None);
        assert_eq!(sub.path(), "Announcements");

        sub.unsubscribe();
        assert!(tx.send(json!(1)).is_err());
    }

    #[tokio::test]
    async fn test_drop_aborts_reader_task() {
        let (_tx, rx) = mpsc::unbounded_channel::<Value>();
        let reader = tokio::spawn(std::future::pending::<()>());
        let sub = Subscription::new("Announcements", rx, Some(reader.abort_handle()));

        drop(sub);
        let err = reader.await.unwrap_err();
        assert!(err.is_cancelled());
    }
}
