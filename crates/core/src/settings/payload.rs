//! Wire shape of the `searchSettings` block.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchSettingsPayload {
    pub search_settings: SearchSettingsBody,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchSettingsBody {
    pub search_type_settings: SearchTypeSettings,
    pub source_settings: SourceSettings,
    pub filter_settings: FilterSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchTypeSettings {
    pub fuzzy_search: bool,
    pub filter_cardbacks: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceSettings {
    /// `[id, enabled]` pairs in priority order.
    pub sources: Vec<(i64, bool)>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterSettings {
    #[serde(rename = "minimumDPI")]
    pub minimum_dpi: i32,
    #[serde(rename = "maximumDPI")]
    pub maximum_dpi: i32,
    pub maximum_size: i32,
    pub languages: Vec<String>,
    pub includes_tags: Vec<String>,
    pub excludes_tags: Vec<String>,
}
