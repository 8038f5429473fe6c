//! Card image downloader with a per-session path cache.

use futures::stream::{self, StreamExt};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::search::Candidate;
use crate::transport::Transport;

use super::error::DownloadError;

type PathSlot = Arc<Mutex<Option<PathBuf>>>;

/// One entry of a batch download.
#[derive(Debug, Clone)]
pub struct DownloadJob {
    pub index: usize,
    pub candidate: Candidate,
    pub dest_dir: PathBuf,
    /// `None` uses `{identifier}.{extension}`.
    pub filename: Option<String>,
}

/// Result of one batch entry.
#[derive(Debug)]
pub struct DownloadOutcome {
    pub index: usize,
    pub identifier: String,
    pub result: Result<PathBuf, DownloadError>,
}

/// Downloads card images, fetching each identifier at most once.
///
/// After the first download of an identifier, later requests for it are
/// served by hard-linking (or copying) the earlier file while it still
/// exists. The cache lives as long as the downloader.
pub struct CardDownloader {
    transport: Arc<dyn Transport>,
    slots: Mutex<HashMap<String, PathSlot>>,
}

impl CardDownloader {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            slots: Mutex::new(HashMap::new()),
        }
    }

    async fn slot(&self, identifier: &str) -> PathSlot {
        let mut slots = self.slots.lock().await;
        Arc::clone(slots.entry(identifier.to_string()).or_default())
    }

    /// Path this session last wrote for `identifier`, if any.
    pub async fn cached_path(&self, identifier: &str) -> Option<PathBuf> {
        let slot = self.slots.lock().await.get(identifier).cloned()?;
        let cached = slot.lock().await;
        cached.clone()
    }

    /// Download `candidate` into `dest_dir` and return the written path.
    ///
    /// `dest_dir` is created if missing. A destination that already exists
    /// is left untouched when the image is served from the cache.
    pub async fn download(
        &self,
        candidate: &Candidate,
        dest_dir: impl AsRef<Path>,
        filename: Option<&str>,
    ) -> Result<PathBuf, DownloadError> {
        let link = candidate
            .download_link
            .as_deref()
            .filter(|link| !link.is_empty())
            .ok_or_else(|| DownloadError::NoDownloadLink {
                identifier: candidate.identifier.clone(),
            })?;

        let dest_dir = dest_dir.as_ref();
        fs::create_dir_all(dest_dir)
            .await
            .map_err(DownloadError::io(dest_dir))?;

        let dest = match filename {
            Some(name) => dest_dir.join(name),
            None => dest_dir.join(candidate.default_filename()),
        };

        // Held across the fetch so concurrent requests for one identifier
        // wait for the first instead of fetching again.
        let slot = self.slot(&candidate.identifier).await;
        let mut cached = slot.lock().await;

        if let Some(source) = cached.as_ref() {
            if fs::try_exists(source).await.unwrap_or(false) {
                link_or_copy(source, &dest).await?;
                debug!(
                    identifier = %candidate.identifier,
                    source = %source.display(),
                    dest = %dest.display(),
                    "Reused cached download"
                );
                return Ok(dest);
            }
            debug!(identifier = %candidate.identifier, "Cached file is gone, fetching again");
        }

        let bytes = self.transport.get_raw(link).await?;
        fs::write(&dest, &bytes)
            .await
            .map_err(DownloadError::io(&dest))?;

        info!(
            identifier = %candidate.identifier,
            dest = %dest.display(),
            bytes = bytes.len(),
            "Downloaded card image"
        );
        *cached = Some(dest.clone());
        Ok(dest)
    }

    /// Run `jobs` with at most `threads` downloads in flight.
    ///
    /// Outcomes are returned in completion order.
    pub async fn download_all(
        self: &Arc<Self>,
        jobs: Vec<DownloadJob>,
        threads: usize,
    ) -> Vec<DownloadOutcome> {
        let threads = threads.max(1);
        debug!(jobs = jobs.len(), threads, "Starting download batch");

        stream::iter(jobs)
            .map(|job| {
                let downloader = Arc::clone(self);
                async move {
                    let index = job.index;
                    let identifier = job.candidate.identifier.clone();
                    let handle = tokio::spawn(async move {
                        downloader
                            .download(&job.candidate, &job.dest_dir, job.filename.as_deref())
                            .await
                    });
                    let result = match handle.await {
                        Ok(result) => result,
                        Err(e) => Err(DownloadError::WorkerFailed(e.to_string())),
                    };
                    DownloadOutcome {
                        index,
                        identifier,
                        result,
                    }
                }
            })
            .buffer_unordered(threads)
            .collect()
            .await
    }
}

/// Hard-link `source` to `dest`, falling back to a copy. An existing `dest`
/// is kept as is.
async fn link_or_copy(source: &Path, dest: &Path) -> Result<(), DownloadError> {
    if fs::try_exists(dest).await.unwrap_or(false) {
        return Ok(());
    }
    if let Err(e) = fs::hard_link(source, dest).await {
        warn!(
            source = %source.display(),
            dest = %dest.display(),
            error = %e,
            "Hard link failed, copying instead"
        );
        fs::copy(source, dest)
            .await
            .map_err(DownloadError::io(dest))?;
    }
    Ok(())
}
