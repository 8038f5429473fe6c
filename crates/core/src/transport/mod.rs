//! HTTP transport abstraction.
//!
//! This module provides a `Transport` trait covering the three kinds of
//! calls the client makes against the service (JSON GET, JSON POST, raw
//! byte GET), plus a `reqwest` implementation that is rate limited and
//! timeout bounded.

mod client;
mod error;
mod rate_limiter;

pub use client::HttpTransport;
pub use error::TransportError;
pub use rate_limiter::{RateLimitStatus, RateLimiter};

use async_trait::async_trait;
use serde_json::Value;

/// Boundary to the remote service.
///
/// Paths are relative to the service base URL; `get_raw` takes an absolute
/// URL because download links point at arbitrary hosts.
#[async_trait]
pub trait Transport: Send + Sync {
    /// GET a JSON document.
    async fn get_json(&self, path: &str, params: &[(&str, &str)])
        -> Result<Value, TransportError>;

    /// POST a JSON body and decode the JSON answer.
    async fn post_json(&self, path: &str, body: &Value) -> Result<Value, TransportError>;

    /// GET raw bytes from an absolute URL.
    async fn get_raw(&self, url: &str) -> Result<Vec<u8>, TransportError>;
}
