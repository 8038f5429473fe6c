use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::Path;

use super::CatalogError;

/// An image source (a contributor's drive) as listed by the catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Source {
    #[serde(alias = "id")]
    pub pk: i64,
    #[serde(default)]
    pub key: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_type: Option<String>,
    #[serde(default, alias = "url", skip_serializing_if = "Option::is_none")]
    pub external_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Source {
    pub fn new(pk: i64, name: impl Into<String>) -> Self {
        Self {
            pk,
            key: String::new(),
            name: name.into(),
            source_type: None,
            external_link: None,
            description: None,
            extra: Map::new(),
        }
    }
}

/// All known sources, ordered by pk, with lookup by id or name.
#[derive(Debug, Clone, Default)]
pub struct SourceCollection {
    sources: Vec<Source>,
    by_id: HashMap<i64, usize>,
    by_name: HashMap<String, usize>,
}

impl SourceCollection {
    pub fn new(mut sources: Vec<Source>) -> Self {
        sources.sort_by_key(|s| s.pk);
        sources.dedup_by_key(|s| s.pk);

        let mut by_id = HashMap::with_capacity(sources.len());
        let mut by_name = HashMap::with_capacity(sources.len());
        for (i, source) in sources.iter().enumerate() {
            by_id.insert(source.pk, i);
            by_name.entry(source.name.to_lowercase()).or_insert(i);
        }

        Self {
            sources,
            by_id,
            by_name,
        }
    }

    /// Load sources from a JSON file holding either a list of sources or an
    /// object keyed by pk (the catalog's own shape).
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| CatalogError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        let value: Value = serde_json::from_str(&content).map_err(|e| {
            CatalogError::MalformedResponse(format!("{}: {}", path.display(), e))
        })?;
        Self::from_json(value)
    }

    /// Build from the `results` value of `/2/sources/` or a plain list.
    pub fn from_json(value: Value) -> Result<Self, CatalogError> {
        let entries: Vec<Value> = match value {
            Value::Array(items) => items,
            Value::Object(map) => map.into_iter().map(|(_, v)| v).collect(),
            other => {
                return Err(CatalogError::MalformedResponse(format!(
                    "expected sources list or map, got {}",
                    json_kind(&other)
                )))
            }
        };

        let sources = entries
            .into_iter()
            .map(serde_json::from_value::<Source>)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| CatalogError::MalformedResponse(format!("invalid source: {}", e)))?;

        Ok(Self::new(sources))
    }

    pub fn get_by_id(&self, id: i64) -> Option<&Source> {
        self.by_id.get(&id).map(|&i| &self.sources[i])
    }

    /// Case-insensitive name lookup.
    pub fn get_by_name(&self, name: &str) -> Option<&Source> {
        self.by_name
            .get(&name.to_lowercase())
            .map(|&i| &self.sources[i])
    }

    pub fn all_ids(&self) -> Vec<i64> {
        self.sources.iter().map(|s| s.pk).collect()
    }

    pub fn all_names(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Source> {
        self.sources.iter()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

/// A search language.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Language {
    pub code: String,
    pub name: String,
}

/// Languages offered by the catalog, in service order.
#[derive(Debug, Clone, Default)]
pub struct LanguageCatalog {
    languages: Vec<Language>,
}

impl LanguageCatalog {
    pub fn new(languages: Vec<Language>) -> Self {
        Self { languages }
    }

    /// Map a language code (`ES`) or upper-cased name (`SPANISH`) to its
    /// code. Matching is case-insensitive.
    pub fn resolve(&self, key: &str) -> Option<&str> {
        let key = key.trim();
        self.languages
            .iter()
            .find(|l| l.code.eq_ignore_ascii_case(key))
            .or_else(|| {
                self.languages
                    .iter()
                    .find(|l| l.name.to_uppercase() == key.to_uppercase())
            })
            .map(|l| l.code.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Language> {
        self.languages.iter()
    }

    pub fn len(&self) -> usize {
        self.languages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.languages.is_empty()
    }
}

/// Dual-faced card pairs: front name → back name, in service order.
#[derive(Debug, Clone, Default)]
pub struct DfcPairs {
    pairs: Vec<(String, String)>,
    by_front: HashMap<String, usize>,
}

impl DfcPairs {
    pub fn new(pairs: Vec<(String, String)>) -> Self {
        let mut by_front = HashMap::with_capacity(pairs.len());
        for (i, (front, _)) in pairs.iter().enumerate() {
            by_front.entry(front.clone()).or_insert(i);
        }
        Self { pairs, by_front }
    }

    /// Back-face name for an exact front-face name.
    pub fn back_for(&self, front: &str) -> Option<&str> {
        self.by_front
            .get(front)
            .map(|&i| self.pairs[i].1.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(f, b)| (f.as_str(), b.as_str()))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl FromIterator<(String, String)> for DfcPairs {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
