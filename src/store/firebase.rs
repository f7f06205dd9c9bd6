//! Firebase Realtime Database over its REST API.
//!
//! Point reads and writes map to `GET`/`PUT {base}/{path}.json`. Live
//! subscriptions use the REST streaming endpoint: the server answers with
//! `text/event-stream` and sends `put`/`patch` events relative to the
//! subscribed path, which are folded into a local snapshot that is re-emitted
//! in full after each event.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderValue};
use reqwest::{Method, Request, Response, Url};
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{Instrument, debug, warn};

use super::client::{RealtimeStore, Subscription};
use super::http::{BasicClient, HttpClient};
use super::tree;
use crate::config::StoreConfig;
use crate::error::StoreError;

pub struct FirebaseStore<C = BasicClient> {
    client: C,
    base_url: String,
    auth_token: Option<String>,
    timeout: Duration,
}

impl FirebaseStore<BasicClient> {
    pub fn from_config(config: &StoreConfig) -> Self {
        Self::new(BasicClient::new(), config)
    }
}

impl<C: HttpClient> FirebaseStore<C> {
    pub fn new(client: C, config: &StoreConfig) -> Self {
        Self {
            client,
            base_url: config.database_url.trim_end_matches('/').to_string(),
            auth_token: config.auth_token.clone(),
            timeout: config.timeout,
        }
    }

    /// REST URL of `path`, with the `auth` query parameter when a token is configured.
    fn url(&self, path: &str) -> Result<Url, StoreError> {
        let raw = format!("{}/{}.json", self.base_url, tree::segments(path).join("/"));
        let mut url = Url::parse(&raw).map_err(|_| StoreError::InvalidPath(path.to_string()))?;
        if let Some(token) = &self.auth_token {
            url.query_pairs_mut().append_pair("auth", token);
        }
        Ok(url)
    }

    async fn send(&self, path: &str, req: Request) -> Result<Response, StoreError> {
        let resp = self
            .client
            .execute(req)
            .await
            .map_err(|source| StoreError::Transport {
                path: path.to_string(),
                source,
            })?;

        if resp.status().is_success() {
            return Ok(resp);
        }

        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        Err(StoreError::Status {
            path: path.to_string(),
            status,
            body,
        })
    }
}

#[async_trait]
impl<C: HttpClient> RealtimeStore for FirebaseStore<C> {
    #[tracing::instrument(skip(self))]
    async fn get(&self, path: &str) -> Result<Option<Value>, StoreError> {
        let mut req = Request::new(Method::GET, self.url(path)?);
        *req.timeout_mut() = Some(self.timeout);

        let value: Value = self
            .send(path, req)
            .await?
            .json()
            .await
            .map_err(|e| StoreError::invalid_record(path, e))?;

        Ok((!value.is_null()).then_some(value))
    }

    #[tracing::instrument(skip(self, value))]
    async fn set(&self, path: &str, value: Value) -> Result<(), StoreError> {
        let body = serde_json::to_vec(&value).map_err(|e| StoreError::invalid_record(path, e))?;

        let mut req = Request::new(Method::PUT, self.url(path)?);
        req.headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        *req.body_mut() = Some(body.into());
        *req.timeout_mut() = Some(self.timeout);

        self.send(path, req).await?;
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn subscribe(&self, path: &str) -> Result<Subscription, StoreError> {
        let mut req = Request::new(Method::GET, self.url(path)?);
        req.headers_mut()
            .insert(ACCEPT, HeaderValue::from_static("text/event-stream"));

        let resp = self.send(path, req).await?;
        let (tx, rx) = mpsc::unbounded_channel();

        let span = tracing::info_span!("firebase_stream", path = %path);
        let reader = tokio::spawn(read_stream(path.to_string(), resp, tx).instrument(span));

        Ok(Subscription::new(path, rx, Some(reader.abort_handle())))
    }
}

async fn read_stream(path: String, mut resp: Response, tx: mpsc::UnboundedSender<Value>) {
    let mut decoder = EventDecoder::default();
    let mut snapshot = Value::Null;

    loop {
        let chunk = match resp.chunk().await {
            Ok(Some(chunk)) => chunk,
            Ok(None) => {
                debug!("Stream ended by server");
                return;
            }
            Err(e) => {
                warn!(error = %e, "Stream read failed");
                return;
            }
        };

        let events = match decoder.push(&chunk) {
            Ok(events) => events,
            Err(e) => {
                warn!(error = %e, "Closing stream");
                return;
            }
        };

        for event in events {
            match apply_event(&path, &mut snapshot, &event) {
                Ok(EventOutcome::Changed) => {
                    if tx.send(snapshot.clone()).is_err() {
                        debug!("Subscriber gone, closing stream");
                        return;
                    }
                }
                Ok(EventOutcome::Ignored) => {}
                Ok(EventOutcome::Closed) => {
                    warn!(event = %event.name, "Server closed the stream");
                    return;
                }
                Err(e) => warn!(error = %e, "Discarding malformed stream event"),
            }
        }
    }
}

/// One server-sent event.
#[derive(Debug, Clone, PartialEq, Eq)]
struct StreamEvent {
    name: String,
    data: String,
}

/// Upper bound on an unterminated event. A `put` at the root carries the
/// whole collection, so this is sized for snapshots, not single records.
const MAX_PENDING_BYTES: usize = 16 * 1024 * 1024;

/// Splits a byte stream into server-sent events. Chunks may end anywhere,
/// including inside a UTF-8 sequence.
#[derive(Debug)]
struct EventDecoder {
    buffer: Vec<u8>,
    limit: usize,
}

impl Default for EventDecoder {
    fn default() -> Self {
        Self::with_limit(MAX_PENDING_BYTES)
    }
}

impl EventDecoder {
    fn with_limit(limit: usize) -> Self {
        Self {
            buffer: Vec::new(),
            limit,
        }
    }

    /// Appends `chunk` and returns every event it completes. Fails once more
    /// than `limit` bytes are pending without an event boundary; the pending
    /// bytes are dropped.
    fn push(&mut self, chunk: &[u8]) -> Result<Vec<StreamEvent>, StoreError> {
        self.buffer
            .extend(chunk.iter().copied().filter(|b| *b != b'\r'));

        let mut events = Vec::new();
        while let Some(end) = self.buffer.windows(2).position(|w| w == b"\n\n") {
            let block: Vec<u8> = self.buffer.drain(..end + 2).collect();
            if let Some(event) = parse_block(&String::from_utf8_lossy(&block)) {
                events.push(event);
            }
        }

        if self.buffer.len() > self.limit {
            self.buffer = Vec::new();
            return Err(StoreError::EventTooLarge { limit: self.limit });
        }
        Ok(events)
    }
}

fn parse_block(block: &str) -> Option<StreamEvent> {
    let mut name = None;
    let mut data: Vec<&str> = Vec::new();

    for line in block.lines() {
        if let Some(value) = line.strip_prefix("event:") {
            name = Some(value.trim().to_string());
        } else if let Some(value) = line.strip_prefix("data:") {
            data.push(value.trim_start());
        }
    }

    Some(StreamEvent {
        name: name?,
        data: data.join("\n"),
    })
}

#[derive(Debug, PartialEq, Eq)]
enum EventOutcome {
    Changed,
    Ignored,
    Closed,
}

#[derive(Deserialize)]
struct EventPayload {
    path: String,
    data: Value,
}

fn apply_event(
    stream_path: &str,
    snapshot: &mut Value,
    event: &StreamEvent,
) -> Result<EventOutcome, StoreError> {
    match event.name.as_str() {
        "put" | "patch" => {
            let payload: EventPayload = serde_json::from_str(&event.data)
                .map_err(|e| StoreError::invalid_record(stream_path, e))?;
            let target = tree::segments(&payload.path);

            if event.name == "put" {
                tree::set_at(snapshot, &target, payload.data);
            } else {
                let Value::Object(children) = payload.data else {
                    return Err(StoreError::invalid_record(
                        stream_path,
                        "patch event data is not an object",
                    ));
                };
                tree::merge_at(snapshot, &target, children);
            }
            Ok(EventOutcome::Changed)
        }
        "cancel" | "auth_revoked" => Ok(EventOutcome::Closed),
        _ => Ok(EventOutcome::Ignored),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Passes requests to a real client after noting method, URL and `Accept`.
    struct RecordingClient {
        inner: reqwest::Client,
        requests: Mutex<Vec<(Method, String, Option<String>)>>,
    }

    impl RecordingClient {
        fn new() -> Self {
            Self {
                inner: reqwest::Client::builder().no_proxy().build().unwrap(),
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl HttpClient for RecordingClient {
        async fn execute(&self, req: Request) -> reqwest::Result<Response> {
            let accept = req
                .headers()
                .get(ACCEPT)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            self.requests
                .lock()
                .unwrap()
                .push((req.method().clone(), req.url().to_string(), accept));
            self.inner.execute(req).await
        }
    }

    /// Answers one connection on a local port with `response`, then closes it.
    async fn serve_once(response: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
        });
        format!("http://{addr}")
    }

    fn local_store(base: String) -> FirebaseStore<RecordingClient> {
        FirebaseStore::new(
            RecordingClient::new(),
            &StoreConfig {
                database_url: base,
                auth_token: Some("tok".to_string()),
                timeout: Duration::from_secs(5),
            },
        )
    }

    async fn next_snapshot(subscription: &mut Subscription) -> Option<Value> {
        tokio::time::timeout(Duration::from_secs(5), subscription.next())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_subscribe_folds_stream_into_snapshots() {
        let base = serve_once(concat!(
            "HTTP/1.1 200 OK\r\nContent-Type: text/event-stream\r\nConnection: close\r\n\r\n",
            "event: put\ndata: {\"path\":\"/\",\"data\":{\"a1\":{\"title\":\"Hi\"}}}\n\n",
            "event: keep-alive\ndata: null\n\n",
            "event: patch\ndata: {\"path\":\"/a1\",\"data\":{\"message\":\"m1\"}}\n\n",
            "event: cancel\ndata: null\n\n",
        ))
        .await;
        let store = local_store(base.clone());

        let mut subscription = store.subscribe("Announcements").await.unwrap();
        assert_eq!(
            next_snapshot(&mut subscription).await,
            Some(json!({ "a1": { "title": "Hi" } }))
        );
        assert_eq!(
            next_snapshot(&mut subscription).await,
            Some(json!({ "a1": { "title": "Hi", "message": "m1" } }))
        );
        assert_eq!(next_snapshot(&mut subscription).await, None);

        let requests = store.client.requests.lock().unwrap();
        assert_eq!(
            *requests,
            vec![(
                Method::GET,
                format!("{base}/Announcements.json?auth=tok"),
                Some("text/event-stream".to_string()),
            )]
        );
    }

    #[tokio::test]
    async fn test_get_reports_error_status() {
        let base = serve_once(
            "HTTP/1.1 401 Unauthorized\r\nContent-Length: 6\r\nConnection: close\r\n\r\ndenied",
        )
        .await;

        let err = local_store(base).get("Parents/p1").await.unwrap_err();
        match err {
            StoreError::Status { path, status, body } => {
                assert_eq!(path, "Parents/p1");
                assert_eq!(status, 401);
                assert_eq!(body, "denied");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_get_null_is_absent() {
        let base = serve_once(
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 4\r\nConnection: close\r\n\r\nnull",
        )
        .await;

        assert_eq!(local_store(base).get("Parents/p1").await.unwrap(), None);
    }

    #[test]
    fn test_decoder_drops_oversized_event() {
        let mut decoder = EventDecoder::with_limit(16);
        let result = decoder.push(b"event: put\ndata: {\"path\":\"/\",\"data\":");
        assert!(matches!(result, Err(StoreError::EventTooLarge { limit: 16 })));

        let events = decoder.push(b"event: cancel\ndata: null\n\n").unwrap();
        assert_eq!(events, vec![event("cancel", "null")]);
    }

    fn event(name: &str, data: &str) -> StreamEvent {
        StreamEvent {
            name: name.to_string(),
            data: data.to_string(),
        }
    }

    fn store(token: Option<&str>) -> FirebaseStore {
        FirebaseStore::from_config(&StoreConfig {
            database_url: "https://tatag-default-rtdb.firebaseio.com/".to_string(),
            auth_token: token.map(str::to_string),
            timeout: Duration::from_secs(5),
        })
    }

    #[test]
    fn test_url_appends_json_suffix() {
        let url = store(None).url("Parents/p1").unwrap();
        assert_eq!(
            url.as_str(),
            "https://tatag-default-rtdb.firebaseio.com/Parents/p1.json"
        );
    }

    #[test]
    fn test_url_carries_auth_token() {
        let url = store(Some("secret")).url("/Teachers/").unwrap();
        assert_eq!(
            url.as_str(),
            "https://tatag-default-rtdb.firebaseio.com/Teachers.json?auth=secret"
        );
    }

    #[test]
    fn test_decoder_handles_split_chunks() {
        let mut decoder = EventDecoder::default();
        assert!(decoder.push(b"event: put\ndata: {\"path\":\"/\",").unwrap().is_empty());

        let events = decoder
            .push(b"\"data\":null}\n\nevent: keep-alive\ndata: null\n\n")
            .unwrap();
        assert_eq!(
            events,
            vec![
                event("put", "{\"path\":\"/\",\"data\":null}"),
                event("keep-alive", "null"),
            ]
        );
    }

    #[test]
    fn test_decoder_accepts_crlf() {
        let mut decoder = EventDecoder::default();
        let events = decoder.push(b"event: cancel\r\ndata: null\r\n\r\n").unwrap();
        assert_eq!(events, vec![event("cancel", "null")]);
    }

    #[test]
    fn test_put_at_root_replaces_snapshot() {
        let mut snapshot = json!({ "old": true });
        let outcome = apply_event(
            "Announcements",
            &mut snapshot,
            &event("put", r#"{"path":"/","data":{"a1":{"title":"Hi"}}}"#),
        )
        .unwrap();

        assert_eq!(outcome, EventOutcome::Changed);
        assert_eq!(snapshot, json!({ "a1": { "title": "Hi" } }));
    }

    #[test]
    fn test_put_at_child_and_delete() {
        let mut snapshot = json!({ "a1": { "title": "Hi" } });
        apply_event(
            "Announcements",
            &mut snapshot,
            &event("put", r#"{"path":"/a2","data":{"title":"Yo"}}"#),
        )
        .unwrap();
        apply_event(
            "Announcements",
            &mut snapshot,
            &event("put", r#"{"path":"/a1","data":null}"#),
        )
        .unwrap();

        assert_eq!(snapshot, json!({ "a2": { "title": "Yo" } }));
    }

    #[test]
    fn test_patch_merges_children() {
        let mut snapshot = json!({ "a1": { "title": "Hi", "message": "old" } });
        apply_event(
            "Announcements",
            &mut snapshot,
            &event("patch", r#"{"path":"/a1","data":{"message":"new"}}"#),
        )
        .unwrap();

        assert_eq!(snapshot, json!({ "a1": { "title": "Hi", "message": "new" } }));
    }

    #[test]
    fn test_control_events() {
        let mut snapshot = Value::Null;
        assert_eq!(
            apply_event("A", &mut snapshot, &event("keep-alive", "null")).unwrap(),
            EventOutcome::Ignored
        );
        assert_eq!(
            apply_event("A", &mut snapshot, &event("auth_revoked", "\"expired\"")).unwrap(),
            EventOutcome::Closed
        );
    }

    #[test]
    fn test_malformed_put_is_an_error() {
        let mut snapshot = Value::Null;
        let result = apply_event("A", &mut snapshot, &event("put", "not json"));
        assert!(matches!(result, Err(StoreError::InvalidRecord { .. })));
        assert_eq!(snapshot, Value::Null);
    }
}
