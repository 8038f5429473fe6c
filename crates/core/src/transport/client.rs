//! `reqwest`-backed transport.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::config::ClientConfig;

use super::rate_limiter::RateLimiter;
use super::{Transport, TransportError};

/// HTTP transport against the MPCFill service.
///
/// Holds a single `reqwest::Client` with the configured timeout and a
/// limiter shared by all three call kinds.
pub struct HttpTransport {
    client: Client,
    base_url: String,
    rate_limiter: Arc<RateLimiter>,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self, TransportError> {
        let limiter = Arc::new(RateLimiter::new(config.rate_limit_per_second));
        Self::with_rate_limiter(config, limiter)
    }

    /// Build a transport that shares an existing limiter.
    pub fn with_rate_limiter(
        config: &ClientConfig,
        rate_limiter: Arc<RateLimiter>,
    ) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("mpcfill-rs/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TransportError::Network {
                method: "INIT",
                url: config.base_url.clone(),
                message: e.to_string(),
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            rate_limiter,
        })
    }

    pub fn rate_limiter(&self) -> &Arc<RateLimiter> {
        &self.rate_limiter
    }

    fn make_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    async fn send(
        &self,
        method: &'static str,
        url: &str,
        request: RequestBuilder,
    ) -> Result<reqwest::Response, TransportError> {
        self.rate_limiter.acquire().await;
        debug!(method = method, url = %url, "Sending request");

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                TransportError::Timeout {
                    method,
                    url: url.to_string(),
                }
            } else {
                TransportError::Network {
                    method,
                    url: url.to_string(),
                    message: e.to_string(),
                }
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::from_status(
                method,
                url,
                status.as_u16(),
                &body,
            ));
        }

        Ok(response)
    }

    async fn decode_json(
        method: &'static str,
        url: &str,
        response: reqwest::Response,
    ) -> Result<Value, TransportError> {
        response.json().await.map_err(|e| TransportError::Decode {
            method,
            url: url.to_string(),
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get_json(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<Value, TransportError> {
        let url = self.make_url(path);
        let request = self.client.get(&url).query(params);
        let response = self.send("GET", &url, request).await?;
        Self::decode_json("GET", &url, response).await
    }

    async fn post_json(&self, path: &str, body: &Value) -> Result<Value, TransportError> {
        let url = self.make_url(path);
        let request = self.client.post(&url).json(body);
        let response = self.send("POST", &url, request).await?;
        Self::decode_json("POST", &url, response).await
    }

    async fn get_raw(&self, url: &str) -> Result<Vec<u8>, TransportError> {
        let request = self.client.get(url);
        let response = self.send("GET", url, request).await?;
        let bytes = response.bytes().await.map_err(|e| TransportError::Network {
            method: "GET",
            url: url.to_string(),
            message: e.to_string(),
        })?;
        debug!(url = %url, bytes = bytes.len(), "Fetched raw body");
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(base_url: &str) -> ClientConfig {
        ClientConfig {
            base_url: base_url.to_string(),
            ..ClientConfig::default()
        }
    }

    #[test]
    fn test_make_url_joins_slashes() {
        let transport = HttpTransport::new(&config("https://mpcfill.com/")).unwrap();
        assert_eq!(
            transport.make_url("/2/editorSearch/"),
            "https://mpcfill.com/2/editorSearch/"
        );
        assert_eq!(
            transport.make_url("2/DFCPairs"),
            "https://mpcfill.com/2/DFCPairs"
        );
    }

    #[test]
    fn test_make_url_without_trailing_slash() {
        let transport = HttpTransport::new(&config("http://localhost:8000")).unwrap();
        assert_eq!(transport.make_url("/2/tags/"), "http://localhost:8000/2/tags/");
    }

    #[tokio::test]
    async fn test_shared_limiter() {
        let limiter = Arc::new(RateLimiter::new(10.0));
        let a = HttpTransport::with_rate_limiter(&config("http://a"), Arc::clone(&limiter)).unwrap();
        let b = HttpTransport::with_rate_limiter(&config("http://b"), Arc::clone(&limiter)).unwrap();
        assert!(Arc::ptr_eq(a.rate_limiter(), b.rate_limiter()));
    }
}
