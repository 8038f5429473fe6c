//! Error types for the transport layer.

use thiserror::Error;

/// Errors raised by a [`Transport`](super::Transport) call.
///
/// Every variant carries enough request context (method and URL) to be
/// useful in a log line on its own. Nothing in this crate retries on these.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection could not be established or was dropped.
    #[error("{method} {url} failed: {message}")]
    Network {
        method: &'static str,
        url: String,
        message: String,
    },

    /// The per-call timeout elapsed.
    #[error("{method} {url} timed out")]
    Timeout { method: &'static str, url: String },

    /// HTTP 404.
    #[error("{method} {url} returned 404 Not Found")]
    NotFound { method: &'static str, url: String },

    /// HTTP 5xx.
    #[error("{method} {url} returned server error {status}: {message}")]
    Server {
        method: &'static str,
        url: String,
        status: u16,
        message: String,
    },

    /// Any other non-2xx status.
    #[error("{method} {url} returned client error {status}: {message}")]
    Client {
        method: &'static str,
        url: String,
        status: u16,
        message: String,
    },

    /// The body could not be decoded as JSON.
    #[error("{method} {url} returned an undecodable body: {message}")]
    Decode {
        method: &'static str,
        url: String,
        message: String,
    },
}

impl TransportError {
    /// Classify a non-success HTTP status.
    pub fn from_status(method: &'static str, url: impl Into<String>, status: u16, body: &str) -> Self {
        let url = url.into();
        let message: String = body.chars().take(200).collect();
        match status {
            404 => Self::NotFound { method, url },
            500..=599 => Self::Server {
                method,
                url,
                status,
                message,
            },
            _ => Self::Client {
                method,
                url,
                status,
                message,
            },
        }
    }

    /// HTTP status, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::NotFound { .. } => Some(404),
            Self::Server { status, .. } | Self::Client { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::Server { .. })
    }

    /// 4xx other than 404.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Client { .. })
    }
}
