use std::collections::HashSet;

use super::TagHierarchy;

impl TagHierarchy {
    /// Drop every tag whose strict ancestor is also present in `tags`.
    ///
    /// Known tags come back with their canonical spelling. Unknown tags are
    /// kept verbatim. Case-insensitive duplicates collapse to their first
    /// occurrence, and the output keeps first-occurrence order.
    pub fn collapse_to_parents<S: AsRef<str>>(&self, tags: &[S]) -> Vec<String> {
        let mut seen = HashSet::new();
        // (canonical name if known, emitted name)
        let mut entries: Vec<(Option<String>, String)> = Vec::new();

        for tag in tags {
            let raw = tag.as_ref().trim();
            if raw.is_empty() {
                continue;
            }
            match self.resolve(raw) {
                Some(canonical) => {
                    if seen.insert(canonical.to_lowercase()) {
                        entries.push((Some(canonical.to_string()), canonical.to_string()));
                    }
                }
                None => {
                    if seen.insert(raw.to_lowercase()) {
                        entries.push((None, raw.to_string()));
                    }
                }
            }
        }

        let known: Vec<&str> = entries
            .iter()
            .filter_map(|(canonical, _)| canonical.as_deref())
            .collect();

        entries
            .iter()
            .filter(|(canonical, _)| match canonical {
                Some(name) => !known.iter().any(|other| self.is_ancestor(other, name)),
                None => true,
            })
            .map(|(_, emitted)| emitted.clone())
            .collect()
    }
}
