//! Tag hierarchy and tag-list collapsing.
//!
//! The catalog publishes tags as a nested tree. Search filters accept flat
//! tag lists; before a list goes on the wire, any tag whose ancestor is
//! also selected is dropped (see [`TagHierarchy::collapse_to_parents`]).

mod collapse;
mod hierarchy;

pub use hierarchy::{constant_name, TagHierarchy, TagNode};

/// Name of the tag excluded by default in new search settings.
pub const NSFW: &str = "NSFW";
