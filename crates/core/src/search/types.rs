use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

use crate::catalog::CatalogError;
use crate::transport::TransportError;

/// Kind of printable entity a query targets.
///
/// Declaration order is the output order of grouped results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CardType {
    Card,
    Token,
}

impl CardType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CardType::Card => "CARD",
            CardType::Token => "TOKEN",
        }
    }
}

impl fmt::Display for CardType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single search query as sent to the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Query {
    pub query: String,
    pub card_type: CardType,
}

impl Query {
    pub fn new(query: impl Into<String>, card_type: CardType) -> Self {
        Self {
            query: query.into(),
            card_type,
        }
    }

    pub fn card(query: impl Into<String>) -> Self {
        Self::new(query, CardType::Card)
    }

    pub fn token(query: impl Into<String>) -> Self {
        Self::new(query, CardType::Token)
    }
}

/// One matching image with its metadata.
///
/// Fields the client does not model are preserved in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub identifier: String,
    pub name: String,
    pub card_type: CardType,
    /// Normalized query key this image matched under.
    pub searchq: String,
    /// Lower wins.
    #[serde(default)]
    pub priority: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dpi: Option<i64>,
    /// Size in bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub download_link: Option<String>,
    #[serde(default)]
    pub extension: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub small_thumbnail_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medium_thumbnail_url: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Candidate {
    /// Default file name: `{identifier}.{extension}`.
    pub fn default_filename(&self) -> String {
        format!("{}.{}", self.identifier, self.extension)
    }
}

/// Candidates sharing a card type and normalized query key, best first.
///
/// Never empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateGroup {
    pub card_type: CardType,
    pub searchq: String,
    candidates: Vec<Candidate>,
}

impl CandidateGroup {
    /// Build a group, stable-sorting by priority. `None` if `candidates` is
    /// empty.
    pub fn new(card_type: CardType, searchq: String, mut candidates: Vec<Candidate>) -> Option<Self> {
        if candidates.is_empty() {
            return None;
        }
        candidates.sort_by_key(|c| c.priority);
        Some(Self {
            card_type,
            searchq,
            candidates,
        })
    }

    /// The lowest-priority-value candidate.
    pub fn best(&self) -> &Candidate {
        &self.candidates[0]
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn into_candidates(self) -> Vec<Candidate> {
        self.candidates
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Candidate> {
        self.candidates.iter()
    }
}

impl<'a> IntoIterator for &'a CandidateGroup {
    type Item = &'a Candidate;
    type IntoIter = std::slice::Iter<'a, Candidate>;

    fn into_iter(self) -> Self::IntoIter {
        self.candidates.iter()
    }
}

/// Errors from search and metadata lookups.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("Malformed search response: {0}")]
    MalformedResponse(String),

    #[error("Failed to encode search request: {0}")]
    Encode(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_card_type_wire_spelling_and_order() {
        assert_eq!(serde_json::to_value(CardType::Card).unwrap(), json!("CARD"));
        assert_eq!(
            serde_json::from_value::<CardType>(json!("TOKEN")).unwrap(),
            CardType::Token
        );
        assert!(CardType::Card < CardType::Token);
    }

    #[test]
    fn test_query_serializes_camel_case() {
        let q = Query::token("Treasure");
        assert_eq!(
            serde_json::to_value(&q).unwrap(),
            json!({"query": "Treasure", "cardType": "TOKEN"})
        );
    }

    #[test]
    fn test_candidate_keeps_unknown_fields() {
        let c: Candidate = serde_json::from_value(json!({
            "identifier": "abc",
            "name": "Bayou",
            "cardType": "CARD",
            "searchq": "bayou",
            "priority": 3,
            "sourceName": "Chilli_Axe",
            "dpi": 800,
            "downloadLink": "https://img/abc",
            "extension": "png",
            "dateCreated": "1st January, 2024"
        }))
        .unwrap();

        assert_eq!(c.source_name.as_deref(), Some("Chilli_Axe"));
        assert_eq!(c.dpi, Some(800));
        assert_eq!(c.extra.get("dateCreated"), Some(&json!("1st January, 2024")));
        assert_eq!(c.default_filename(), "abc.png");
    }

    #[test]
    fn test_candidate_null_download_link() {
        let c: Candidate = serde_json::from_value(json!({
            "identifier": "abc",
            "name": "Bayou",
            "cardType": "CARD",
            "searchq": "bayou",
            "downloadLink": null
        }))
        .unwrap();
        assert!(c.download_link.is_none());
        assert_eq!(c.priority, 0);
    }

    #[test]
    fn test_group_rejects_empty() {
        assert!(CandidateGroup::new(CardType::Card, "x".to_string(), Vec::new()).is_none());
    }
}
