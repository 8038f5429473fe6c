pub mod catalog;
pub mod client;
pub mod config;
pub mod download;
pub mod search;
pub mod settings;
pub mod tags;
pub mod testing;
pub mod transport;

pub use catalog::{
    CatalogError, CatalogService, DfcPairs, FetchCache, Language, LanguageCatalog, Source,
    SourceCollection,
};
pub use client::{BestDownloadOptions, ClientError, MpcFillClient};
pub use config::{
    load_config, load_config_from_str, load_config_or_default, validate_config, Config,
    ConfigError,
};
pub use download::{
    make_safe_path, CardDownloader, DownloadError, DownloadJob, DownloadOutcome, FilenameFormat,
};
pub use search::{
    normalize, Candidate, CandidateGroup, CardSearcher, CardType, Query, SearchError,
};
pub use settings::{
    FrozenSettings, SearchSettings, SearchSettingsOptions, SettingsError, SourceFilter, SourceKey,
};
pub use tags::{constant_name, TagHierarchy, TagNode};
pub use transport::{HttpTransport, RateLimiter, Transport, TransportError};
