//! Search pipeline: back-face expansion, remote search, metadata lookup and
//! grouping.

use serde::Serialize;
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::catalog::{json_kind, CatalogService, DfcPairs};
use crate::settings::{FrozenSettings, SearchSettingsPayload};
use crate::transport::Transport;

use super::normalize::normalize;
use super::types::{Candidate, CandidateGroup, CardType, Query, SearchError};

const EDITOR_SEARCH_PATH: &str = "/2/editorSearch/";
const CARDS_PATH: &str = "/2/cards/";

#[derive(Serialize)]
struct SearchRequest<'a> {
    #[serde(flatten)]
    settings: &'a SearchSettingsPayload,
    queries: &'a [Query],
}

/// Runs searches against the service and assembles ranked groups.
pub struct CardSearcher {
    transport: Arc<dyn Transport>,
    catalog: Arc<CatalogService>,
}

impl CardSearcher {
    pub fn new(transport: Arc<dyn Transport>, catalog: Arc<CatalogService>) -> Self {
        Self { transport, catalog }
    }

    /// Search `queries` and return candidate groups, best candidate first in
    /// each group. All CARD groups come before all TOKEN groups; within a
    /// type, groups are ordered by normalized key.
    ///
    /// With `fetch_backs`, each distinct query text that has a dual-faced
    /// back adds one CARD query for the back face.
    pub async fn search(
        &self,
        mut queries: Vec<Query>,
        settings: &FrozenSettings,
        fetch_backs: bool,
    ) -> Result<Vec<CandidateGroup>, SearchError> {
        if fetch_backs {
            let dfcs = self.catalog.dfcs().await?;
            let backs = back_face_queries(&queries, &dfcs);
            debug!(count = backs.len(), "Appending back-face queries");
            queries.extend(backs);
        }

        for query in &mut queries {
            query.query = normalize(&query.query);
        }

        let request = SearchRequest {
            settings: settings.payload(),
            queries: &queries,
        };
        let body = serde_json::to_value(&request)?;

        debug!(queries = queries.len(), "Submitting search");
        let response = self.transport.post_json(EDITOR_SEARCH_PATH, &body).await?;
        let ids = flatten_search_results(&response)?;
        debug!(ids = ids.len(), "Search returned identifiers");

        let candidates = self.card_metadata(&ids).await?;
        let groups = group_candidates(candidates);
        debug!(groups = groups.len(), "Grouped candidates");
        Ok(groups)
    }

    /// Fetch full metadata for `ids`.
    ///
    /// Candidates come back in the order of `ids`, with duplicates collapsed
    /// to their first occurrence. Identifiers the service does not return
    /// are skipped. An empty list makes no remote call.
    pub async fn card_metadata(&self, ids: &[String]) -> Result<Vec<Candidate>, SearchError> {
        let mut seen = HashSet::new();
        let unique: Vec<&String> = ids.iter().filter(|id| seen.insert(id.as_str())).collect();
        if unique.is_empty() {
            return Ok(Vec::new());
        }

        let body = json!({ "cardIdentifiers": &unique });
        let mut response = self.transport.post_json(CARDS_PATH, &body).await?;

        let mut by_id: Map<String, Value> = match response.get_mut("results").map(Value::take) {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(map)) => map,
            Some(other) => {
                return Err(SearchError::MalformedResponse(format!(
                    "card metadata results should be an object, got {}",
                    json_kind(&other)
                )))
            }
        };

        let mut candidates = Vec::with_capacity(unique.len());
        for id in unique {
            let Some(data) = by_id.remove(id.as_str()) else {
                warn!(identifier = %id, "No metadata returned for card; skipping");
                continue;
            };
            let candidate: Candidate = serde_json::from_value(data).map_err(|e| {
                SearchError::MalformedResponse(format!("card {}: {}", id, e))
            })?;
            candidates.push(candidate);
        }

        Ok(candidates)
    }
}

/// One CARD query per distinct raw query text that has a back face.
///
/// Lookup is exact on the raw text and ignores the query's card type.
/// Texts are visited in first-occurrence order.
pub fn back_face_queries(queries: &[Query], dfcs: &DfcPairs) -> Vec<Query> {
    let mut seen = HashSet::new();
    queries
        .iter()
        .filter(|q| seen.insert(q.query.as_str()))
        .filter_map(|q| dfcs.back_for(&q.query))
        .map(Query::card)
        .collect()
}

/// Flatten `{results: {cardType: {key: [id, ...]}}}` into identifiers in
/// response order. A missing `results` means no matches.
pub fn flatten_search_results(response: &Value) -> Result<Vec<String>, SearchError> {
    let results = match response.get("results") {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Object(map)) => map,
        Some(other) => {
            return Err(SearchError::MalformedResponse(format!(
                "search results should be an object, got {}",
                json_kind(other)
            )))
        }
    };

    let mut ids = Vec::new();
    for (card_type, by_key) in results {
        let by_key = by_key.as_object().ok_or_else(|| {
            SearchError::MalformedResponse(format!(
                "results[{}] should be an object, got {}",
                card_type,
                json_kind(by_key)
            ))
        })?;
        for (key, list) in by_key {
            let list = list.as_array().ok_or_else(|| {
                SearchError::MalformedResponse(format!(
                    "results[{}][{}] should be a list, got {}",
                    card_type,
                    key,
                    json_kind(list)
                ))
            })?;
            for id in list {
                match id {
                    Value::String(id) => ids.push(id.clone()),
                    other => {
                        return Err(SearchError::MalformedResponse(format!(
                            "card identifier should be a string, got {}",
                            json_kind(other)
                        )))
                    }
                }
            }
        }
    }

    Ok(ids)
}

/// Bucket candidates by `(card type, searchq)` and order the buckets.
///
/// Within a group candidates are stable-sorted by priority, so ties keep
/// their input order.
pub fn group_candidates(candidates: Vec<Candidate>) -> Vec<CandidateGroup> {
    let mut buckets: BTreeMap<CardType, BTreeMap<String, Vec<Candidate>>> = BTreeMap::new();
    for candidate in candidates {
        buckets
            .entry(candidate.card_type)
            .or_default()
            .entry(candidate.searchq.clone())
            .or_default()
            .push(candidate);
    }

    buckets
        .into_iter()
        .flat_map(|(card_type, by_key)| {
            by_key
                .into_iter()
                .filter_map(move |(key, list)| CandidateGroup::new(card_type, key, list))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;

    #[test]
    fn test_grouping_orders_card_before_token() {
        let candidates = vec![
            fixtures::candidate("id1", "Bayou", CardType::Card, "bayou", 2),
            fixtures::candidate("id2", "Bayou", CardType::Card, "bayou", 1),
            fixtures::candidate("id3", "Bayou", CardType::Token, "bayou", 0),
        ];

        let groups = group_candidates(candidates);
        assert_eq!(groups.len(), 2);

        assert_eq!(groups[0].card_type, CardType::Card);
        assert_eq!(groups[0].searchq, "bayou");
        let ids: Vec<_> = groups[0].iter().map(|c| c.identifier.as_str()).collect();
        assert_eq!(ids, vec!["id2", "id1"]);

        assert_eq!(groups[1].card_type, CardType::Token);
        assert_eq!(groups[1].best().identifier, "id3");
    }

    #[test]
    fn test_grouping_is_two_phase_not_global() {
        let candidates = vec![
            fixtures::candidate("t", "Angel", CardType::Token, "angel", 0),
            fixtures::candidate("c2", "Zombie", CardType::Card, "zombie", 0),
            fixtures::candidate("c1", "Bayou", CardType::Card, "bayou", 0),
        ];

        let keys: Vec<_> = group_candidates(candidates)
            .iter()
            .map(|g| (g.card_type, g.searchq.clone()))
            .collect();
        assert_eq!(
            keys,
            vec![
                (CardType::Card, "bayou".to_string()),
                (CardType::Card, "zombie".to_string()),
                (CardType::Token, "angel".to_string()),
            ]
        );
    }

    #[test]
    fn test_priority_ties_keep_input_order() {
        let candidates = vec![
            fixtures::candidate("a", "X", CardType::Card, "x", 1),
            fixtures::candidate("b", "X", CardType::Card, "x", 0),
            fixtures::candidate("c", "X", CardType::Card, "x", 1),
            fixtures::candidate("d", "X", CardType::Card, "x", 0),
        ];
        let groups = group_candidates(candidates);
        let ids: Vec<_> = groups[0].iter().map(|c| c.identifier.as_str()).collect();
        assert_eq!(ids, vec!["b", "d", "a", "c"]);
    }

    #[test]
    fn test_group_empty_input() {
        assert!(group_candidates(Vec::new()).is_empty());
    }

    #[test]
    fn test_back_face_queries_once_per_text() {
        let dfcs: DfcPairs = vec![("Bayou".to_string(), "Bayou (back)".to_string())]
            .into_iter()
            .collect();
        let queries = vec![
            Query::card("Bayou"),
            Query::token("Bayou"),
            Query::card("Bayou"),
            Query::card("Plains"),
        ];

        assert_eq!(
            back_face_queries(&queries, &dfcs),
            vec![Query::card("Bayou (back)")]
        );
    }

    #[test]
    fn test_back_face_lookup_is_exact() {
        let dfcs: DfcPairs = vec![("Bayou".to_string(), "Bayou (back)".to_string())]
            .into_iter()
            .collect();
        assert!(back_face_queries(&[Query::card("bayou")], &dfcs).is_empty());
    }

    #[test]
    fn test_flatten_preserves_response_order() {
        let response = json!({"results": {
            "CARD": {"zeta": ["z1", "z2"], "alpha": ["a1"]},
            "TOKEN": {"beta": ["b1"]}
        }});
        assert_eq!(
            flatten_search_results(&response).unwrap(),
            vec!["z1", "z2", "a1", "b1"]
        );
    }

    #[test]
    fn test_flatten_missing_results_is_empty() {
        assert!(flatten_search_results(&json!({})).unwrap().is_empty());
        assert!(flatten_search_results(&json!({"results": null}))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_flatten_wrong_shape_is_malformed() {
        let err = flatten_search_results(&json!({"results": []})).unwrap_err();
        assert!(matches!(err, SearchError::MalformedResponse(_)));

        let err = flatten_search_results(&json!({"results": {"CARD": {"x": "id"}}})).unwrap_err();
        assert!(matches!(err, SearchError::MalformedResponse(_)));
    }
}
