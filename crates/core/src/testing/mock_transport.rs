//! Mock transport for testing.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use crate::transport::{Transport, TransportError};

/// A recorded call for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    /// `GET`, `POST` or `RAW`.
    pub method: &'static str,
    /// Path for JSON calls, absolute URL for raw calls.
    pub target: String,
    /// Body of a POST.
    pub body: Option<Value>,
    /// When the call was made.
    pub timestamp: Instant,
}

/// Builds a POST response from the request body.
type PostHandler = Box<dyn Fn(&Value) -> Value + Send + Sync>;

/// Mock implementation of the Transport trait.
///
/// Provides controllable behavior for testing:
/// - Canned responses per GET/POST path and per raw URL
/// - Dynamic POST responses computed from the request body
/// - Injected failures (next call, or every call to a target)
/// - Recorded calls for assertions
///
/// Targets without a canned response fail with `NotFound`. Calls are
/// recorded before any injected failure is applied.
///
/// # Example
///
/// ```rust,ignore
/// use mpcfill_core::testing::{MockTransport, fixtures};
///
/// let transport = MockTransport::new();
/// transport.set_get("/2/DFCPairs", fixtures::dfc_pairs_response()).await;
///
/// let body = transport.get_json("/2/DFCPairs", &[]).await?;
/// assert_eq!(transport.calls_to("/2/DFCPairs").await, 1);
/// ```
pub struct MockTransport {
    gets: Arc<RwLock<HashMap<String, Value>>>,
    posts: Arc<RwLock<HashMap<String, Value>>>,
    post_handlers: Arc<RwLock<HashMap<String, PostHandler>>>,
    raw: Arc<RwLock<HashMap<String, Vec<u8>>>>,
    calls: Arc<RwLock<Vec<RecordedCall>>>,
    next_error: Arc<RwLock<Option<TransportError>>>,
    failing: Arc<RwLock<HashMap<String, u16>>>,
    delay: Arc<RwLock<Option<Duration>>>,
}

impl std::fmt::Debug for MockTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockTransport")
            .field("gets", &"<gets>")
            .field("posts", &"<posts>")
            .field("post_handlers", &"<handlers>")
            .field("raw", &"<raw>")
            .field("calls", &"<calls>")
            .finish()
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTransport {
    /// Create a mock transport with no canned responses.
    pub fn new() -> Self {
        Self {
            gets: Arc::new(RwLock::new(HashMap::new())),
            posts: Arc::new(RwLock::new(HashMap::new())),
            post_handlers: Arc::new(RwLock::new(HashMap::new())),
            raw: Arc::new(RwLock::new(HashMap::new())),
            calls: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
            failing: Arc::new(RwLock::new(HashMap::new())),
            delay: Arc::new(RwLock::new(None)),
        }
    }

    /// Set the JSON returned for GETs of `path`.
    pub async fn set_get(&self, path: &str, response: Value) {
        self.gets.write().await.insert(path.to_string(), response);
    }

    /// Set the JSON returned for POSTs to `path`.
    pub async fn set_post(&self, path: &str, response: Value) {
        self.posts.write().await.insert(path.to_string(), response);
    }

    /// Compute POST responses for `path` from the request body.
    ///
    /// Takes precedence over a canned response set with `set_post`.
    pub async fn set_post_handler<F>(&self, path: &str, handler: F)
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        self.post_handlers
            .write()
            .await
            .insert(path.to_string(), Box::new(handler));
    }

    /// Set the bytes returned for raw GETs of `url`.
    pub async fn set_raw(&self, url: &str, bytes: Vec<u8>) {
        self.raw.write().await.insert(url.to_string(), bytes);
    }

    /// Fail the next call, whatever it is.
    pub async fn fail_next(&self, error: TransportError) {
        *self.next_error.write().await = Some(error);
    }

    /// Fail every call to `target` with the given HTTP status.
    pub async fn fail_with_status(&self, target: &str, status: u16) {
        self.failing.write().await.insert(target.to_string(), status);
    }

    /// Stop failing calls to `target`.
    pub async fn clear_failure(&self, target: &str) {
        self.failing.write().await.remove(target);
    }

    /// Delay every raw GET by `delay`.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = Some(delay);
    }

    /// All recorded calls, oldest first.
    pub async fn recorded_calls(&self) -> Vec<RecordedCall> {
        self.calls.read().await.clone()
    }

    /// Number of calls made to a path or URL.
    pub async fn calls_to(&self, target: &str) -> usize {
        self.calls
            .read()
            .await
            .iter()
            .filter(|call| call.target == target)
            .count()
    }

    /// Bodies of the POSTs made to `path`, oldest first.
    pub async fn posted_bodies(&self, path: &str) -> Vec<Value> {
        self.calls
            .read()
            .await
            .iter()
            .filter(|call| call.method == "POST" && call.target == path)
            .filter_map(|call| call.body.clone())
            .collect()
    }

    /// Clear recorded calls.
    pub async fn clear_recorded(&self) {
        self.calls.write().await.clear();
    }

    async fn record(
        &self,
        method: &'static str,
        target: &str,
        body: Option<Value>,
    ) -> Result<(), TransportError> {
        self.calls.write().await.push(RecordedCall {
            method,
            target: target.to_string(),
            body,
            timestamp: Instant::now(),
        });

        if let Some(err) = self.next_error.write().await.take() {
            return Err(err);
        }
        if let Some(&status) = self.failing.read().await.get(target) {
            return Err(TransportError::from_status(
                method,
                target,
                status,
                "injected failure",
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn get_json(
        &self,
        path: &str,
        _params: &[(&str, &str)],
    ) -> Result<Value, TransportError> {
        self.record("GET", path, None).await?;
        self.gets
            .read()
            .await
            .get(path)
            .cloned()
            .ok_or_else(|| TransportError::NotFound {
                method: "GET",
                url: path.to_string(),
            })
    }

    async fn post_json(&self, path: &str, body: &Value) -> Result<Value, TransportError> {
        self.record("POST", path, Some(body.clone())).await?;

        if let Some(handler) = self.post_handlers.read().await.get(path) {
            return Ok(handler(body));
        }
        self.posts
            .read()
            .await
            .get(path)
            .cloned()
            .ok_or_else(|| TransportError::NotFound {
                method: "POST",
                url: path.to_string(),
            })
    }

    async fn get_raw(&self, url: &str) -> Result<Vec<u8>, TransportError> {
        self.record("RAW", url, None).await?;

        let delay = *self.delay.read().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.raw
            .read()
            .await
            .get(url)
            .cloned()
            .ok_or_else(|| TransportError::NotFound {
                method: "GET",
                url: url.to_string(),
            })
    }
}
