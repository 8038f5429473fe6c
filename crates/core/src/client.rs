//! Session facade over transport, catalog, search and downloads.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use crate::catalog::{
    CatalogError, CatalogService, DfcPairs, LanguageCatalog, SourceCollection,
};
use crate::config::{validate_config, Config, ConfigError};
use crate::download::{
    CardDownloader, DownloadError, DownloadJob, DownloadOutcome, FilenameFormat,
};
use crate::search::{Candidate, CandidateGroup, CardSearcher, Query, SearchError};
use crate::settings::{FrozenSettings, SearchSettings, SearchSettingsOptions, SettingsError};
use crate::tags::TagHierarchy;
use crate::transport::{HttpTransport, Transport, TransportError};

/// Errors surfaced by [`MpcFillClient`].
#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Search(#[from] SearchError),

    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error(transparent)]
    Download(#[from] DownloadError),
}

/// Options for [`MpcFillClient::search_and_download_best`].
#[derive(Debug, Clone)]
pub struct BestDownloadOptions {
    pub filename_format: FilenameFormat,
    pub include_tokens: bool,
    pub include_backs: bool,
    pub threads: usize,
}

impl BestDownloadOptions {
    /// Options taken from the `[download]` config section, backs included,
    /// tokens excluded.
    pub fn from_config(config: &Config) -> Self {
        Self {
            filename_format: FilenameFormat::new(config.download.filename_format.clone()),
            include_tokens: false,
            include_backs: true,
            threads: config.download.threads,
        }
    }
}

/// One session against the service.
///
/// Owns the catalog caches and the download path cache; dropping the
/// client forgets both.
pub struct MpcFillClient {
    config: Config,
    catalog: Arc<CatalogService>,
    searcher: CardSearcher,
    downloader: Arc<CardDownloader>,
}

impl MpcFillClient {
    /// Validate `config` and connect over HTTP.
    pub fn new(config: Config) -> Result<Self, ClientError> {
        validate_config(&config)?;
        let transport = Arc::new(HttpTransport::new(&config.client)?);
        Ok(Self::with_transport(transport, config))
    }

    /// Build a session over any transport.
    pub fn with_transport(transport: Arc<dyn Transport>, config: Config) -> Self {
        let catalog = Arc::new(CatalogService::new(Arc::clone(&transport)));
        Self {
            searcher: CardSearcher::new(Arc::clone(&transport), Arc::clone(&catalog)),
            downloader: Arc::new(CardDownloader::new(transport)),
            catalog,
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn catalog(&self) -> &CatalogService {
        &self.catalog
    }

    pub fn downloader(&self) -> &Arc<CardDownloader> {
        &self.downloader
    }

    /// New settings over the catalog's sources, using the `[search]`
    /// config defaults.
    pub async fn settings(&self) -> Result<SearchSettings, ClientError> {
        self.settings_with(SearchSettingsOptions::from(&self.config.search))
            .await
    }

    /// New settings over the catalog's sources.
    pub async fn settings_with(
        &self,
        options: SearchSettingsOptions,
    ) -> Result<SearchSettings, ClientError> {
        let sources = self.catalog.sources().await?;
        Ok(SearchSettings::new(&sources, options))
    }

    /// Snapshot `settings` into a wire payload. The tag tree is fetched
    /// only when a tag list is non-empty.
    pub async fn freeze(&self, settings: &SearchSettings) -> Result<FrozenSettings, ClientError> {
        if settings.includes_tags().is_empty() && settings.excludes_tags().is_empty() {
            return Ok(settings.freeze(&TagHierarchy::default()));
        }
        let tags = self.catalog.tags().await?;
        Ok(settings.freeze(&tags))
    }

    /// Search and group candidates. See [`CardSearcher::search`].
    pub async fn search(
        &self,
        queries: Vec<Query>,
        settings: &SearchSettings,
        fetch_backs: bool,
    ) -> Result<Vec<CandidateGroup>, ClientError> {
        let frozen = self.freeze(settings).await?;
        self.search_frozen(queries, &frozen, fetch_backs).await
    }

    pub async fn search_frozen(
        &self,
        queries: Vec<Query>,
        settings: &FrozenSettings,
        fetch_backs: bool,
    ) -> Result<Vec<CandidateGroup>, ClientError> {
        Ok(self.searcher.search(queries, settings, fetch_backs).await?)
    }

    /// Full metadata for card identifiers, in input order.
    pub async fn card_metadata(&self, ids: &[String]) -> Result<Vec<Candidate>, ClientError> {
        Ok(self.searcher.card_metadata(ids).await?)
    }

    /// Best candidate per matched query.
    ///
    /// Every name is searched as a CARD, and also as a TOKEN when
    /// `include_tokens` is set.
    pub async fn search_best<S: AsRef<str>>(
        &self,
        names: &[S],
        settings: &SearchSettings,
        include_tokens: bool,
        include_backs: bool,
    ) -> Result<Vec<Candidate>, ClientError> {
        let mut queries: Vec<Query> = names.iter().map(|n| Query::card(n.as_ref())).collect();
        if include_tokens {
            queries.extend(names.iter().map(|n| Query::token(n.as_ref())));
        }

        let groups = self.search(queries, settings, include_backs).await?;
        Ok(groups.iter().map(|g| g.best().clone()).collect())
    }

    /// Search `names` and download the best image of each into `dest`.
    ///
    /// Outcomes come back in completion order; each carries its index in
    /// the best-candidate list.
    pub async fn search_and_download_best<S: AsRef<str>>(
        &self,
        names: &[S],
        dest: impl AsRef<Path>,
        settings: &SearchSettings,
        options: &BestDownloadOptions,
    ) -> Result<Vec<DownloadOutcome>, ClientError> {
        let best = self
            .search_best(names, settings, options.include_tokens, options.include_backs)
            .await?;
        Ok(self
            .download_candidates(best, dest, &options.filename_format, options.threads)
            .await)
    }

    /// Download `candidates` into `dest`, naming files with `format`.
    pub async fn download_candidates(
        &self,
        candidates: Vec<Candidate>,
        dest: impl AsRef<Path>,
        format: &FilenameFormat,
        threads: usize,
    ) -> Vec<DownloadOutcome> {
        let dest = dest.as_ref();
        let jobs: Vec<DownloadJob> = candidates
            .into_iter()
            .enumerate()
            .map(|(index, candidate)| DownloadJob {
                index,
                filename: Some(format.render(index, &candidate)),
                candidate,
                dest_dir: dest.to_path_buf(),
            })
            .collect();
        debug!(count = jobs.len(), dest = %dest.display(), "Queueing downloads");
        self.downloader.download_all(jobs, threads).await
    }

    /// Download one candidate. See [`CardDownloader::download`].
    pub async fn download(
        &self,
        candidate: &Candidate,
        dest_dir: impl AsRef<Path>,
        filename: Option<&str>,
    ) -> Result<PathBuf, ClientError> {
        Ok(self.downloader.download(candidate, dest_dir, filename).await?)
    }

    pub async fn list_sources(&self) -> Result<Arc<SourceCollection>, ClientError> {
        Ok(self.catalog.sources().await?)
    }

    pub async fn list_languages(&self) -> Result<Arc<LanguageCatalog>, ClientError> {
        Ok(self.catalog.languages().await?)
    }

    pub async fn list_tags(&self) -> Result<Arc<TagHierarchy>, ClientError> {
        Ok(self.catalog.tags().await?)
    }

    pub async fn list_dfcs(&self) -> Result<Arc<DfcPairs>, ClientError> {
        Ok(self.catalog.dfcs().await?)
    }
}
