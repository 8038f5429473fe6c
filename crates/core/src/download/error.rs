//! Error types for the download module.

use std::path::PathBuf;
use thiserror::Error;

use crate::transport::TransportError;

/// Errors that can occur while downloading card images.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The candidate carries no download link.
    #[error("Card {identifier} has no download link")]
    NoDownloadLink { identifier: String },

    /// Fetching the image bytes failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Creating, writing, linking or copying a file failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A pooled download task panicked or was cancelled.
    #[error("Download worker failed: {0}")]
    WorkerFailed(String),
}

impl DownloadError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| DownloadError::Io { path, source }
    }
}
