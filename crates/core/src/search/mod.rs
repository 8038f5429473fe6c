//! Card search.
//!
//! Queries are normalized and sent to the service in one request; the
//! returned identifiers are resolved to full metadata and grouped per
//! `(card type, normalized query)`, best candidate first.

mod aggregator;
mod normalize;
mod types;

pub use aggregator::{back_face_queries, flatten_search_results, group_candidates, CardSearcher};
pub use normalize::normalize;
pub use types::*;
