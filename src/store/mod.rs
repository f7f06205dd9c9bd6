//! Access to the realtime database.
//!
//! [`RealtimeStore`] is the seam the dashboard is written against.
//! [`FirebaseStore`] talks to a Firebase Realtime Database over REST and
//! [`MemoryStore`] keeps everything in process. The helpers in this module
//! decode raw JSON into the typed records of [`crate::records`].

mod client;
pub mod firebase;
mod http;
mod memory;
mod tree;

pub use client::{RealtimeStore, Subscription};
pub use firebase::FirebaseStore;
pub use http::{BasicClient, HttpClient};
pub use memory::MemoryStore;

use std::collections::BTreeMap;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

use crate::error::StoreError;

pub const PARENTS: &str = "Parents";
pub const STUDENTS: &str = "Students";
pub const CLASSES: &str = "Classes";
pub const TEACHERS: &str = "Teachers";
pub const ANNOUNCEMENTS: &str = "Announcements";

/// Path of record `id` in `collection`.
///
/// Rejects ids that are empty or contain characters the database does not
/// allow in keys, so an id can never address a different node.
pub fn record_path(collection: &str, id: &str) -> Result<String, StoreError> {
    let forbidden = ['/', '.', '#', '$', '[', ']'];
    if id.trim().is_empty() || id.contains(forbidden) {
        return Err(StoreError::InvalidPath(format!("{collection}/{id}")));
    }
    Ok(format!("{collection}/{id}"))
}

pub fn decode<T: DeserializeOwned>(path: &str, value: Value) -> Result<T, StoreError> {
    serde_json::from_value(value).map_err(|e| StoreError::invalid_record(path, e))
}

/// Decodes a collection snapshot (`id -> record`). An empty path yields an
/// empty map. Entries that do not decode are logged and left out, so one bad
/// record cannot hide the others; a snapshot that is not a collection at all
/// is an error.
pub fn decode_collection<T: DeserializeOwned>(
    path: &str,
    value: Value,
) -> Result<BTreeMap<String, T>, StoreError> {
    match value {
        Value::Null => Ok(BTreeMap::new()),
        Value::Object(entries) => Ok(entries
            .into_iter()
            .filter_map(|(id, entry)| match decode(&format!("{path}/{id}"), entry) {
                Ok(record) => Some((id, record)),
                Err(e) => {
                    warn!(error = %e, "Skipping malformed entry");
                    None
                }
            })
            .collect()),
        other => Err(StoreError::invalid_record(
            path,
            format!("expected a collection, found {other}"),
        )),
    }
}

pub async fn fetch_record<S, T>(store: &S, path: &str) -> Result<Option<T>, StoreError>
where
    S: RealtimeStore + ?Sized,
    T: DeserializeOwned,
{
    match store.get(path).await? {
        Some(value) => decode(path, value).map(Some),
        None => Ok(None),
    }
}

pub async fn fetch_collection<S, T>(store: &S, path: &str) -> Result<BTreeMap<String, T>, StoreError>
where
    S: RealtimeStore + ?Sized,
    T: DeserializeOwned,
{
    decode_collection(path, store.get(path).await?.unwrap_or(Value::Null))
}

/// Overwrites the record at `path` with `record`.
pub async fn write_record<S, T>(store: &S, path: &str, record: &T) -> Result<(), StoreError>
where
    S: RealtimeStore + ?Sized,
    T: Serialize,
{
    let value = serde_json::to_value(record).map_err(|e| StoreError::invalid_record(path, e))?;
    store.set(path, value).await
}
