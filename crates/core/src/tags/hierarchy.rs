//! Tag tree types and lookup index.

use once_cell::sync::Lazy;
use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};

/// A tag record as published by the catalog, with its subtree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TagNode {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Name of the parent tag, when the service reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub children: Vec<TagNode>,
    /// Fields this client does not model.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TagNode {
    /// Leaf tag with no extra fields.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: None,
            parent: None,
            aliases: Vec::new(),
            children: Vec::new(),
            extra: Map::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<TagNode>) -> Self {
        self.children = children;
        self
    }

    /// Depth-first, pre-order traversal of this node and its descendants.
    pub fn walk(&self) -> Vec<&TagNode> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(node.children.iter().rev());
        }
        out
    }

    /// Find a tag in this subtree (self included) by case-insensitive name.
    pub fn find(&self, name: &str) -> Option<&TagNode> {
        let needle = name.to_lowercase();
        self.walk()
            .into_iter()
            .find(|node| node.name.to_lowercase() == needle)
    }
}

#[derive(Debug, Clone)]
struct IndexedTag {
    name: String,
    /// Lowercased names of all strict ancestors, root first.
    ancestors: Vec<String>,
    /// Child indices from the roots down to this node.
    path: Vec<usize>,
}

/// Immutable tag tree with case-insensitive lookup by name, alias or
/// constant identifier.
#[derive(Debug, Clone, Default)]
pub struct TagHierarchy {
    roots: Vec<TagNode>,
    by_name: HashMap<String, IndexedTag>,
    by_alias: HashMap<String, String>,
    by_constant: HashMap<String, String>,
}

impl TagHierarchy {
    pub fn new(roots: Vec<TagNode>) -> Self {
        let mut hierarchy = Self {
            roots,
            ..Self::default()
        };
        hierarchy.rebuild_index();
        hierarchy
    }

    fn rebuild_index(&mut self) {
        let mut by_name = HashMap::new();
        let mut by_alias = HashMap::new();
        let mut by_constant = HashMap::new();

        // (node, ancestors, path)
        let mut stack: Vec<(&TagNode, Vec<String>, Vec<usize>)> = self
            .roots
            .iter()
            .enumerate()
            .map(|(i, node)| (node, Vec::new(), vec![i]))
            .collect();

        while let Some((node, ancestors, path)) = stack.pop() {
            let key = node.name.to_lowercase();

            let mut child_ancestors = ancestors.clone();
            child_ancestors.push(key.clone());
            for (i, child) in node.children.iter().enumerate() {
                let mut child_path = path.clone();
                child_path.push(i);
                stack.push((child, child_ancestors.clone(), child_path));
            }

            for alias in &node.aliases {
                by_alias.entry(alias.to_lowercase()).or_insert_with(|| key.clone());
            }
            by_constant
                .entry(constant_name(&node.name))
                .or_insert_with(|| key.clone());
            // First occurrence wins on duplicate names
            by_name.entry(key).or_insert(IndexedTag {
                name: node.name.clone(),
                ancestors,
                path,
            });
        }

        self.by_name = by_name;
        self.by_alias = by_alias;
        self.by_constant = by_constant;
    }

    pub fn roots(&self) -> &[TagNode] {
        &self.roots
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Number of distinct tag names in the tree.
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    /// All nodes, depth-first across the roots.
    pub fn walk(&self) -> Vec<&TagNode> {
        self.roots.iter().flat_map(|root| root.walk()).collect()
    }

    fn lookup(&self, key: &str) -> Option<&IndexedTag> {
        let lowered = key.trim().to_lowercase();
        self.by_name
            .get(&lowered)
            .or_else(|| self.by_alias.get(&lowered).and_then(|n| self.by_name.get(n)))
            .or_else(|| {
                self.by_constant
                    .get(&constant_name(key))
                    .and_then(|n| self.by_name.get(n))
            })
    }

    /// Canonical name for a tag given its name, an alias, or its constant
    /// identifier (`FULL_ART`).
    pub fn resolve(&self, key: &str) -> Option<&str> {
        self.lookup(key).map(|tag| tag.name.as_str())
    }

    /// Find the node for a tag key.
    pub fn find(&self, key: &str) -> Option<&TagNode> {
        let tag = self.lookup(key)?;
        let (first, rest) = tag.path.split_first()?;
        let mut node = self.roots.get(*first)?;
        for &i in rest {
            node = node.children.get(i)?;
        }
        Some(node)
    }

    /// Whether `ancestor` is a strict ancestor of `descendant`, at any depth.
    ///
    /// Unknown keys are never ancestors nor descendants.
    pub fn is_ancestor(&self, ancestor: &str, descendant: &str) -> bool {
        match (self.lookup(ancestor), self.lookup(descendant)) {
            (Some(a), Some(d)) => {
                let a_key = a.name.to_lowercase();
                d.ancestors.iter().any(|name| *name == a_key)
            }
            _ => false,
        }
    }

    /// Constant identifier → tag name, for every tag in the tree.
    pub fn constants(&self) -> BTreeMap<String, String> {
        self.walk()
            .into_iter()
            .map(|node| (constant_name(&node.name), node.name.clone()))
            .collect()
    }

    /// ASCII rendering of the tree, one tag per line.
    pub fn render_tree(&self) -> String {
        let mut out = String::new();
        render_nodes(&self.roots, "", &mut out);
        out
    }
}

fn render_nodes(nodes: &[TagNode], prefix: &str, out: &mut String) {
    for (i, node) in nodes.iter().enumerate() {
        let is_last = i + 1 == nodes.len();
        let connector = if is_last { "└── " } else { "├── " };
        out.push_str(prefix);
        out.push_str(connector);
        out.push_str(&node.name);
        out.push('\n');
        if !node.children.is_empty() {
            let extension = if is_last { "    " } else { "│   " };
            render_nodes(&node.children, &format!("{}{}", prefix, extension), out);
        }
    }
}

static NON_IDENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Z0-9_]").unwrap());
static UNDERSCORES: Lazy<Regex> = Lazy::new(|| Regex::new(r"_+").unwrap());

/// UPPER_SNAKE identifier for a tag name.
///
/// `"Full-Art"` → `FULL_ART`, `"Landscape / Wide"` → `LANDSCAPE_WIDE`.
pub fn constant_name(name: &str) -> String {
    let upper = name.to_uppercase();
    let replaced = NON_IDENT.replace_all(&upper, "_");
    let collapsed = UNDERSCORES.replace_all(&replaced, "_");
    collapsed.trim_matches('_').to_string()
}
