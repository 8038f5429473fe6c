//! Catalog data published by the service: sources, languages, tags and
//! dual-faced card pairs.
//!
//! Each listing is fetched on first use and kept for the life of the
//! [`CatalogService`] that owns it.

mod cache;
mod types;

pub use cache::FetchCache;
pub use types::*;

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

use crate::tags::{TagHierarchy, TagNode};
use crate::transport::{Transport, TransportError};

const SOURCES_PATH: &str = "/2/sources/";
const LANGUAGES_PATH: &str = "/2/languages/";
const TAGS_PATH: &str = "/2/tags/";
const DFC_PAIRS_PATH: &str = "/2/DFCPairs";

/// Errors from catalog lookups.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Malformed catalog response: {0}")]
    MalformedResponse(String),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Session-scoped, memoized access to the catalog endpoints.
pub struct CatalogService {
    transport: Arc<dyn Transport>,
    sources: FetchCache<SourceCollection>,
    languages: FetchCache<LanguageCatalog>,
    tags: FetchCache<TagHierarchy>,
    dfcs: FetchCache<DfcPairs>,
}

impl std::fmt::Debug for CatalogService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogService")
            .field("sources_cached", &self.sources.is_cached())
            .field("languages_cached", &self.languages.is_cached())
            .field("tags_cached", &self.tags.is_cached())
            .field("dfcs_cached", &self.dfcs.is_cached())
            .finish()
    }
}

impl CatalogService {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            sources: FetchCache::new("sources"),
            languages: FetchCache::new("languages"),
            tags: FetchCache::new("tags"),
            dfcs: FetchCache::new("dfcs"),
        }
    }

    /// All sources, keyed from the `results` map of `/2/sources/`.
    pub async fn sources(&self) -> Result<Arc<SourceCollection>, CatalogError> {
        self.sources
            .get_or_fetch(|| async {
                let results = self.fetch_field(SOURCES_PATH, "results").await?;
                SourceCollection::from_json(results)
            })
            .await
    }

    pub async fn languages(&self) -> Result<Arc<LanguageCatalog>, CatalogError> {
        self.languages
            .get_or_fetch(|| async {
                let languages: Vec<Language> =
                    self.fetch_typed(LANGUAGES_PATH, "languages").await?;
                Ok(LanguageCatalog::new(languages))
            })
            .await
    }

    pub async fn tags(&self) -> Result<Arc<TagHierarchy>, CatalogError> {
        self.tags
            .get_or_fetch(|| async {
                let roots: Vec<TagNode> = self.fetch_typed(TAGS_PATH, "tags").await?;
                Ok(TagHierarchy::new(roots))
            })
            .await
    }

    pub async fn dfcs(&self) -> Result<Arc<DfcPairs>, CatalogError> {
        self.dfcs
            .get_or_fetch(|| async {
                let pairs: serde_json::Map<String, Value> =
                    self.fetch_typed(DFC_PAIRS_PATH, "dfcPairs").await?;
                pairs
                    .into_iter()
                    .map(|(front, back)| match back {
                        Value::String(back) => Ok((front, back)),
                        other => Err(CatalogError::MalformedResponse(format!(
                            "dfcPairs[{}] should be a string, got {}",
                            front,
                            json_kind(&other)
                        ))),
                    })
                    .collect::<Result<DfcPairs, _>>()
            })
            .await
    }

    async fn fetch_field(&self, path: &str, field: &str) -> Result<Value, CatalogError> {
        let mut body = self.transport.get_json(path, &[]).await?;
        match body.get_mut(field) {
            Some(value) => Ok(value.take()),
            None => Err(CatalogError::MalformedResponse(format!(
                "{} response is missing '{}'",
                path, field
            ))),
        }
    }

    async fn fetch_typed<T: DeserializeOwned>(
        &self,
        path: &str,
        field: &str,
    ) -> Result<T, CatalogError> {
        let value = self.fetch_field(path, field).await?;
        serde_json::from_value(value).map_err(|e| {
            CatalogError::MalformedResponse(format!("{} '{}': {}", path, field, e))
        })
    }
}
