//! Search settings builder.
//!
//! [`SearchSettings`] is the mutable builder a caller tweaks before a
//! search. [`SearchSettings::freeze`] turns it into the wire payload,
//! wrapped in a cheaply clonable [`FrozenSettings`] for batches.

mod payload;
mod source_filter;

pub use payload::{
    FilterSettings, SearchSettingsBody, SearchSettingsPayload, SearchTypeSettings, SourceSettings,
};
pub use source_filter::{SourceFilter, SourceKey};

use std::sync::Arc;
use thiserror::Error;

use crate::catalog::{LanguageCatalog, SourceCollection};
use crate::config::SearchDefaults;
use crate::tags::{TagHierarchy, NSFW};

pub const MINIMUM_DPI: i32 = 0;
pub const MAXIMUM_DPI: i32 = 1500;
/// Megabytes.
pub const MAXIMUM_SIZE: i32 = 30;

/// Rejected settings input.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Unknown source: {0}")]
    UnknownSource(String),

    #[error("Unknown tag: {0}")]
    UnknownTag(String),

    #[error("Unknown language: {0}")]
    UnknownLanguage(String),
}

/// Constructor options for [`SearchSettings`].
#[derive(Debug, Clone, PartialEq)]
pub struct SearchSettingsOptions {
    pub minimum_dpi: i32,
    pub maximum_dpi: i32,
    pub maximum_size: i32,
    pub fuzzy_search: bool,
    pub filter_cardbacks: bool,
    pub languages: Vec<String>,
    pub includes_tags: Vec<String>,
    /// `None` excludes NSFW.
    pub excludes_tags: Option<Vec<String>>,
}

impl Default for SearchSettingsOptions {
    fn default() -> Self {
        Self {
            minimum_dpi: MINIMUM_DPI,
            maximum_dpi: MAXIMUM_DPI,
            maximum_size: MAXIMUM_SIZE,
            fuzzy_search: false,
            filter_cardbacks: false,
            languages: Vec::new(),
            includes_tags: Vec::new(),
            excludes_tags: None,
        }
    }
}

impl From<&SearchDefaults> for SearchSettingsOptions {
    fn from(defaults: &SearchDefaults) -> Self {
        Self {
            minimum_dpi: defaults.minimum_dpi,
            maximum_dpi: defaults.maximum_dpi,
            maximum_size: defaults.maximum_size,
            fuzzy_search: defaults.fuzzy_search,
            filter_cardbacks: defaults.filter_cardbacks,
            ..Self::default()
        }
    }
}

/// Mutable search settings.
#[derive(Debug, Clone)]
pub struct SearchSettings {
    fuzzy_search: bool,
    filter_cardbacks: bool,
    minimum_dpi: i32,
    maximum_dpi: i32,
    maximum_size: i32,
    languages: Vec<String>,
    includes_tags: Vec<String>,
    excludes_tags: Vec<String>,
    sources: SourceFilter,
}

impl SearchSettings {
    pub fn new(sources: &SourceCollection, options: SearchSettingsOptions) -> Self {
        Self {
            fuzzy_search: options.fuzzy_search,
            filter_cardbacks: options.filter_cardbacks,
            minimum_dpi: options.minimum_dpi.max(MINIMUM_DPI),
            maximum_dpi: options.maximum_dpi.min(MAXIMUM_DPI),
            maximum_size: options.maximum_size.min(MAXIMUM_SIZE),
            languages: options.languages,
            includes_tags: options.includes_tags,
            excludes_tags: options
                .excludes_tags
                .unwrap_or_else(|| vec![NSFW.to_string()]),
            sources: SourceFilter::new(sources),
        }
    }

    pub fn with_defaults(sources: &SourceCollection) -> Self {
        Self::new(sources, SearchSettingsOptions::default())
    }

    pub fn minimum_dpi(&self) -> i32 {
        self.minimum_dpi
    }

    pub fn maximum_dpi(&self) -> i32 {
        self.maximum_dpi
    }

    pub fn maximum_size(&self) -> i32 {
        self.maximum_size
    }

    pub fn fuzzy_search(&self) -> bool {
        self.fuzzy_search
    }

    pub fn filter_cardbacks(&self) -> bool {
        self.filter_cardbacks
    }

    pub fn languages(&self) -> &[String] {
        &self.languages
    }

    pub fn includes_tags(&self) -> &[String] {
        &self.includes_tags
    }

    pub fn excludes_tags(&self) -> &[String] {
        &self.excludes_tags
    }

    pub fn sources(&self) -> &SourceFilter {
        &self.sources
    }

    pub fn set_minimum_dpi(&mut self, dpi: i32) {
        self.minimum_dpi = dpi.max(MINIMUM_DPI);
    }

    pub fn set_maximum_dpi(&mut self, dpi: i32) {
        self.maximum_dpi = dpi.min(MAXIMUM_DPI);
    }

    pub fn set_maximum_size(&mut self, size: i32) {
        self.maximum_size = size.min(MAXIMUM_SIZE);
    }

    pub fn set_fuzzy_search(&mut self, enabled: bool) {
        self.fuzzy_search = enabled;
    }

    pub fn set_filter_cardbacks(&mut self, enabled: bool) {
        self.filter_cardbacks = enabled;
    }

    pub fn set_languages(&mut self, languages: Vec<String>) {
        self.languages = languages;
    }

    pub fn add_include_tag(&mut self, tag: impl Into<String>) {
        self.includes_tags.push(tag.into());
    }

    /// Remove the first matching include tag, if present.
    pub fn remove_include_tag(&mut self, tag: &str) {
        if let Some(pos) = self.includes_tags.iter().position(|t| t == tag) {
            self.includes_tags.remove(pos);
        }
    }

    /// Add an exclude tag unless it is already listed.
    pub fn add_exclude_tag(&mut self, tag: impl Into<String>) {
        let tag = tag.into();
        if !self.excludes_tags.contains(&tag) {
            self.excludes_tags.push(tag);
        }
    }

    pub fn remove_exclude_tag(&mut self, tag: &str) {
        if let Some(pos) = self.excludes_tags.iter().position(|t| t == tag) {
            self.excludes_tags.remove(pos);
        }
    }

    pub fn enable_source(&mut self, key: impl Into<SourceKey>) -> Result<(), SettingsError> {
        self.sources.enable(key)
    }

    pub fn disable_source(&mut self, key: impl Into<SourceKey>) -> Result<(), SettingsError> {
        self.sources.disable(key)
    }

    pub fn enable_all_sources(&mut self) {
        self.sources.enable_all();
    }

    pub fn disable_all_sources(&mut self) {
        self.sources.disable_all();
    }

    pub fn set_source_priority_highest(
        &mut self,
        key: impl Into<SourceKey>,
    ) -> Result<(), SettingsError> {
        self.sources.set_priority_highest(key)
    }

    pub fn set_source_priority_lowest(
        &mut self,
        key: impl Into<SourceKey>,
    ) -> Result<(), SettingsError> {
        self.sources.set_priority_lowest(key)
    }

    pub fn set_source_priority(
        &mut self,
        key: impl Into<SourceKey>,
        index: isize,
    ) -> Result<(), SettingsError> {
        self.sources.set_priority(key, index)
    }

    /// Replace language names or codes with catalog codes.
    pub fn resolve_languages(&mut self, catalog: &LanguageCatalog) -> Result<(), SettingsError> {
        let resolved = self
            .languages
            .iter()
            .map(|key| {
                catalog
                    .resolve(key)
                    .map(str::to_string)
                    .ok_or_else(|| SettingsError::UnknownLanguage(key.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        self.languages = resolved;
        Ok(())
    }

    /// Fail on the first include or exclude tag the hierarchy does not know.
    ///
    /// Payload building itself keeps unknown tags verbatim.
    pub fn check_tags(&self, tags: &TagHierarchy) -> Result<(), SettingsError> {
        match self
            .includes_tags
            .iter()
            .chain(&self.excludes_tags)
            .find(|tag| tags.resolve(tag).is_none())
        {
            Some(unknown) => Err(SettingsError::UnknownTag(unknown.clone())),
            None => Ok(()),
        }
    }

    /// Wire payload, with both tag lists collapsed to their top-most
    /// selected ancestors.
    pub fn to_payload(&self, tags: &TagHierarchy) -> SearchSettingsPayload {
        SearchSettingsPayload {
            search_settings: SearchSettingsBody {
                search_type_settings: SearchTypeSettings {
                    fuzzy_search: self.fuzzy_search,
                    filter_cardbacks: self.filter_cardbacks,
                },
                source_settings: SourceSettings {
                    sources: self.sources.to_wire(),
                },
                filter_settings: FilterSettings {
                    minimum_dpi: self.minimum_dpi,
                    maximum_dpi: self.maximum_dpi,
                    maximum_size: self.maximum_size,
                    languages: self.languages.clone(),
                    includes_tags: tags.collapse_to_parents(&self.includes_tags),
                    excludes_tags: tags.collapse_to_parents(&self.excludes_tags),
                },
            },
        }
    }

    /// Immutable snapshot of the current payload.
    pub fn freeze(&self, tags: &TagHierarchy) -> FrozenSettings {
        FrozenSettings(Arc::new(self.to_payload(tags)))
    }
}

/// Immutable, shareable settings payload.
#[derive(Debug, Clone, PartialEq)]
pub struct FrozenSettings(Arc<SearchSettingsPayload>);

impl FrozenSettings {
    pub fn payload(&self) -> &SearchSettingsPayload {
        &self.0
    }
}

impl From<SearchSettingsPayload> for FrozenSettings {
    fn from(payload: SearchSettingsPayload) -> Self {
        Self(Arc::new(payload))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Language, Source};
    use crate::tags::TagNode;
    use serde_json::json;

    fn sources() -> SourceCollection {
        SourceCollection::new(vec![Source::new(1, "Alpha"), Source::new(2, "Beta")])
    }

    fn tags() -> TagHierarchy {
        TagHierarchy::new(vec![
            TagNode::new("Full-Art").with_children(vec![
                TagNode::new("Extended Art"),
                TagNode::new("Borderless"),
            ]),
            TagNode::new("NSFW"),
        ])
    }

    #[test]
    fn test_bounds_are_clamped() {
        let settings = SearchSettings::new(
            &sources(),
            SearchSettingsOptions {
                minimum_dpi: -5,
                maximum_dpi: 2000,
                maximum_size: 50,
                ..SearchSettingsOptions::default()
            },
        );
        assert_eq!(settings.minimum_dpi(), 0);
        assert_eq!(settings.maximum_dpi(), 1500);
        assert_eq!(settings.maximum_size(), 30);
    }

    #[test]
    fn test_clamps_are_one_sided() {
        let mut settings = SearchSettings::with_defaults(&sources());
        settings.set_minimum_dpi(5000);
        settings.set_maximum_dpi(-1);
        settings.set_maximum_size(-3);
        assert_eq!(settings.minimum_dpi(), 5000);
        assert_eq!(settings.maximum_dpi(), -1);
        assert_eq!(settings.maximum_size(), -3);
    }

    #[test]
    fn test_default_excludes_nsfw() {
        let settings = SearchSettings::with_defaults(&sources());
        assert_eq!(settings.excludes_tags(), &["NSFW".to_string()]);

        let settings = SearchSettings::new(
            &sources(),
            SearchSettingsOptions {
                excludes_tags: Some(Vec::new()),
                ..SearchSettingsOptions::default()
            },
        );
        assert!(settings.excludes_tags().is_empty());
    }

    #[test]
    fn test_exclude_add_is_idempotent() {
        let mut settings = SearchSettings::with_defaults(&sources());
        settings.add_exclude_tag("NSFW");
        settings.add_exclude_tag("Borderless");
        settings.add_exclude_tag("Borderless");
        assert_eq!(settings.excludes_tags(), &["NSFW", "Borderless"]);

        settings.remove_exclude_tag("NSFW");
        assert_eq!(settings.excludes_tags(), &["Borderless"]);
    }

    #[test]
    fn test_include_tags_add_and_remove() {
        let mut settings = SearchSettings::with_defaults(&sources());
        settings.add_include_tag("Full-Art");
        settings.add_include_tag("Full-Art");
        settings.remove_include_tag("Full-Art");
        assert_eq!(settings.includes_tags(), &["Full-Art"]);
        settings.remove_include_tag("Missing");
        assert_eq!(settings.includes_tags().len(), 1);
    }

    #[test]
    fn test_payload_wire_shape() {
        let mut settings = SearchSettings::new(
            &sources(),
            SearchSettingsOptions {
                minimum_dpi: 600,
                fuzzy_search: true,
                languages: vec!["EN".to_string()],
                includes_tags: vec!["Full-Art".to_string(), "Extended Art".to_string()],
                ..SearchSettingsOptions::default()
            },
        );
        settings.disable_source("beta").unwrap();
        settings.set_source_priority_highest(2_i64).unwrap();

        let value = serde_json::to_value(settings.to_payload(&tags())).unwrap();
        assert_eq!(
            value,
            json!({"searchSettings": {
                "searchTypeSettings": {"fuzzySearch": true, "filterCardbacks": false},
                "sourceSettings": {"sources": [[2, false], [1, true]]},
                "filterSettings": {
                    "minimumDPI": 600,
                    "maximumDPI": 1500,
                    "maximumSize": 30,
                    "languages": ["EN"],
                    "includesTags": ["Full-Art"],
                    "excludesTags": ["NSFW"]
                }
            }})
        );
    }

    #[test]
    fn test_freeze_is_a_snapshot() {
        let mut settings = SearchSettings::with_defaults(&sources());
        let frozen = settings.freeze(&tags());
        settings.set_fuzzy_search(true);
        settings.disable_all_sources();

        assert!(!frozen.payload().search_settings.search_type_settings.fuzzy_search);
        assert_eq!(
            frozen.payload().search_settings.source_settings.sources,
            vec![(1, true), (2, true)]
        );
        let copy = frozen.clone();
        assert_eq!(copy, frozen);
    }

    #[test]
    fn test_resolve_languages() {
        let catalog = LanguageCatalog::new(vec![Language {
            code: "ES".to_string(),
            name: "Spanish".to_string(),
        }]);
        let mut settings = SearchSettings::with_defaults(&sources());
        settings.set_languages(vec!["SPANISH".to_string(), "es".to_string()]);
        settings.resolve_languages(&catalog).unwrap();
        assert_eq!(settings.languages(), &["ES", "ES"]);

        settings.set_languages(vec!["KLINGON".to_string()]);
        let err = settings.resolve_languages(&catalog).unwrap_err();
        assert!(matches!(err, SettingsError::UnknownLanguage(ref l) if l == "KLINGON"));
    }

    #[test]
    fn test_check_tags() {
        let mut settings = SearchSettings::with_defaults(&sources());
        settings.add_include_tag("FULL_ART");
        assert!(settings.check_tags(&tags()).is_ok());

        settings.add_exclude_tag("Sparkly");
        let err = settings.check_tags(&tags()).unwrap_err();
        assert!(matches!(err, SettingsError::UnknownTag(ref t) if t == "Sparkly"));
    }

    #[test]
    fn test_options_from_config_defaults() {
        let options = SearchSettingsOptions::from(&SearchDefaults::default());
        assert_eq!(options.minimum_dpi, 600);
        assert_eq!(options.maximum_dpi, 1500);
        assert!(options.excludes_tags.is_none());
    }
}
