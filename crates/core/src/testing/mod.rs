//! Testing utilities and a mock transport.
//!
//! Nothing in here touches the network: the mock serves canned JSON and
//! bytes, and the fixtures build service-shaped responses.
//!
//! # Example
//!
//! ```rust,ignore
//! use mpcfill_core::testing::{fixtures, MockTransport};
//!
//! let transport = Arc::new(MockTransport::new());
//! transport.set_get("/2/sources/", fixtures::sources_response()).await;
//! transport.set_post("/2/cards/", fixtures::cards_response(&[
//!     fixtures::card_json("id1", "Bayou", CardType::Card, "bayou", 0),
//! ])).await;
//!
//! let client = MpcFillClient::with_transport(transport.clone(), Config::default());
//! ```

mod mock_transport;

pub use mock_transport::{MockTransport, RecordedCall};

/// Test fixtures and helper functions.
pub mod fixtures {
    use serde_json::{json, Map, Value};

    use crate::search::{Candidate, CardType};

    /// Download link used by [`candidate`] and [`card_json`].
    pub fn download_link(identifier: &str) -> String {
        format!("https://img.example/{}", identifier)
    }

    /// Create a test candidate with reasonable defaults.
    pub fn candidate(
        identifier: &str,
        name: &str,
        card_type: CardType,
        searchq: &str,
        priority: i64,
    ) -> Candidate {
        Candidate {
            identifier: identifier.to_string(),
            name: name.to_string(),
            card_type,
            searchq: searchq.to_string(),
            priority,
            source_name: Some("Chilli_Axe".to_string()),
            source_id: Some(1),
            dpi: Some(800),
            size: Some(2_500_000),
            language: Some("EN".to_string()),
            tags: Vec::new(),
            download_link: Some(download_link(identifier)),
            extension: "png".to_string(),
            small_thumbnail_url: None,
            medium_thumbnail_url: None,
            extra: Map::new(),
        }
    }

    /// Card metadata as returned by `/2/cards/`.
    pub fn card_json(
        identifier: &str,
        name: &str,
        card_type: CardType,
        searchq: &str,
        priority: i64,
    ) -> Value {
        json!({
            "identifier": identifier,
            "cardType": card_type,
            "name": name,
            "priority": priority,
            "sourceName": "Chilli_Axe",
            "sourceId": 1,
            "dpi": 800,
            "searchq": searchq,
            "extension": "png",
            "size": 2_500_000,
            "downloadLink": download_link(identifier),
            "language": "EN",
            "tags": [],
            "dateCreated": "1st January, 2024"
        })
    }

    /// `/2/cards/` response holding `cards`, keyed by identifier.
    pub fn cards_response(cards: &[Value]) -> Value {
        let results: Map<String, Value> = cards
            .iter()
            .filter_map(|card| {
                card.get("identifier")
                    .and_then(Value::as_str)
                    .map(|id| (id.to_string(), card.clone()))
            })
            .collect();
        json!({ "results": results })
    }

    /// `/2/editorSearch/` response from `(card type, key, ids)` entries, in
    /// the given order.
    pub fn editor_search_response(entries: &[(CardType, &str, &[&str])]) -> Value {
        let mut results = Map::new();
        for (card_type, key, ids) in entries {
            let by_key = results
                .entry(card_type.as_str().to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if let Value::Object(by_key) = by_key {
                by_key.insert(key.to_string(), json!(ids));
            }
        }
        json!({ "results": results })
    }

    /// `/2/sources/` response with three sources.
    pub fn sources_response() -> Value {
        json!({"results": {
            "1": {"pk": 1, "key": "chilli_axe", "name": "Chilli_Axe",
                  "sourceType": "Google Drive", "externalLink": null, "description": ""},
            "2": {"pk": 2, "key": "ilikeit", "name": "ILikeIt",
                  "sourceType": "Google Drive", "externalLink": null, "description": ""},
            "3": {"pk": 3, "key": "hathwellcrisping", "name": "Hathwellcrisping",
                  "sourceType": "Google Drive", "externalLink": null, "description": ""}
        }})
    }

    /// `/2/languages/` response.
    pub fn languages_response() -> Value {
        json!({"languages": [
            {"code": "EN", "name": "English"},
            {"code": "ES", "name": "Spanish"},
            {"code": "JA", "name": "Japanese"}
        ]})
    }

    /// `/2/tags/` response: Full-Art with two children, plus NSFW.
    pub fn tags_response() -> Value {
        json!({"tags": [
            {"name": "Full-Art", "parent": null, "aliases": [], "children": [
                {"name": "Extended Art", "parent": "Full-Art", "aliases": [], "children": []},
                {"name": "Borderless", "parent": "Full-Art", "aliases": [], "children": []}
            ]},
            {"name": "NSFW", "parent": null, "aliases": [], "children": []}
        ]})
    }

    /// `/2/DFCPairs` response.
    pub fn dfc_pairs_response() -> Value {
        json!({"dfcPairs": {
            "Bayou": "Bayou (back)",
            "Delver of Secrets": "Insectile Aberration"
        }})
    }
}
