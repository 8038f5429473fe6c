use std::collections::HashMap;
use std::fmt;

use crate::catalog::SourceCollection;

use super::SettingsError;

/// Reference to a source by numeric id or case-insensitive name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceKey {
    Id(i64),
    Name(String),
}

impl From<i64> for SourceKey {
    fn from(id: i64) -> Self {
        SourceKey::Id(id)
    }
}

impl From<&str> for SourceKey {
    fn from(name: &str) -> Self {
        SourceKey::Name(name.to_string())
    }
}

impl From<String> for SourceKey {
    fn from(name: String) -> Self {
        SourceKey::Name(name)
    }
}

impl fmt::Display for SourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKey::Id(id) => write!(f, "{}", id),
            SourceKey::Name(name) => f.write_str(name),
        }
    }
}

/// Enabled flags and priority order for the known sources.
///
/// Starts with every source enabled, in catalog (pk) order.
#[derive(Debug, Clone, Default)]
pub struct SourceFilter {
    by_name: HashMap<String, i64>,
    enabled: HashMap<i64, bool>,
    priority: Vec<i64>,
}

impl SourceFilter {
    pub fn new(sources: &SourceCollection) -> Self {
        let mut by_name = HashMap::with_capacity(sources.len());
        let mut enabled = HashMap::with_capacity(sources.len());
        let mut priority = Vec::with_capacity(sources.len());
        for source in sources.iter() {
            by_name
                .entry(source.name.to_lowercase())
                .or_insert(source.pk);
            enabled.insert(source.pk, true);
            priority.push(source.pk);
        }
        Self {
            by_name,
            enabled,
            priority,
        }
    }

    fn resolve(&self, key: &SourceKey) -> Result<i64, SettingsError> {
        let id = match key {
            SourceKey::Id(id) => Some(*id).filter(|id| self.enabled.contains_key(id)),
            SourceKey::Name(name) => self.by_name.get(&name.to_lowercase()).copied(),
        };
        id.ok_or_else(|| SettingsError::UnknownSource(key.to_string()))
    }

    pub fn enable(&mut self, key: impl Into<SourceKey>) -> Result<(), SettingsError> {
        let id = self.resolve(&key.into())?;
        self.enabled.insert(id, true);
        Ok(())
    }

    pub fn disable(&mut self, key: impl Into<SourceKey>) -> Result<(), SettingsError> {
        let id = self.resolve(&key.into())?;
        self.enabled.insert(id, false);
        Ok(())
    }

    pub fn enable_all(&mut self) {
        self.enabled.values_mut().for_each(|flag| *flag = true);
    }

    pub fn disable_all(&mut self) {
        self.enabled.values_mut().for_each(|flag| *flag = false);
    }

    /// Move a source to `position` in the priority list.
    ///
    /// Negative positions count from the end after the source is removed:
    /// `-1` is last, `-2` second to last. Out-of-range positions clamp.
    pub fn set_priority(
        &mut self,
        key: impl Into<SourceKey>,
        position: isize,
    ) -> Result<(), SettingsError> {
        let id = self.resolve(&key.into())?;
        self.priority.retain(|&p| p != id);

        let len = self.priority.len() as isize;
        let index = if position < 0 { len + 1 + position } else { position };
        let index = index.clamp(0, len) as usize;
        self.priority.insert(index, id);
        Ok(())
    }

    pub fn set_priority_highest(&mut self, key: impl Into<SourceKey>) -> Result<(), SettingsError> {
        self.set_priority(key, 0)
    }

    pub fn set_priority_lowest(&mut self, key: impl Into<SourceKey>) -> Result<(), SettingsError> {
        self.set_priority(key, -1)
    }

    pub fn is_enabled(&self, id: i64) -> bool {
        self.enabled.get(&id).copied().unwrap_or(false)
    }

    pub fn priority_order(&self) -> &[i64] {
        &self.priority
    }

    /// `(id, enabled)` pairs in priority order.
    pub fn to_wire(&self) -> Vec<(i64, bool)> {
        self.priority
            .iter()
            .map(|&id| (id, self.is_enabled(id)))
            .collect()
    }
}
