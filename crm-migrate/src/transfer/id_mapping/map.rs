//! Bundle ID to live ID mapping

use std::collections::BTreeMap;

use serde::Serialize;

/// Per entity type mapping from bundle IDs to live IDs
///
/// Entries never chain: a live ID is never also a bundle ID of the same
/// type, and a bundle ID is never also a live ID. Rewriting a value with
/// this map is therefore stable under repetition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct IdMap {
    map: BTreeMap<String, BTreeMap<String, String>>,
}

impl IdMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `old -> new` for an entity type
    ///
    /// Returns false (and records nothing) when the IDs are equal, when `old`
    /// is already mapped, or when the entry would chain with an existing one.
    pub fn add(&mut self, entity_type: &str, old: &str, new: &str) -> bool {
        if old.is_empty() || new.is_empty() || old == new {
            return false;
        }

        let entries = self.map.entry(entity_type.to_string()).or_default();
        if entries.contains_key(old) || entries.contains_key(new) {
            return false;
        }
        if entries.values().any(|v| v == old) {
            return false;
        }

        entries.insert(old.to_string(), new.to_string());
        log::debug!("ID mapping {}: {} -> {}", entity_type, old, new);
        true
    }

    pub fn get(&self, entity_type: &str, old: &str) -> Option<&str> {
        self.map.get(entity_type)?.get(old).map(String::as_str)
    }

    /// Mappings of one entity type
    pub fn for_type(&self, entity_type: &str) -> Option<&BTreeMap<String, String>> {
        self.map.get(entity_type).filter(|m| !m.is_empty())
    }

    /// Entity types with at least one mapping
    pub fn entity_types(&self) -> impl Iterator<Item = &str> {
        self.map
            .iter()
            .filter(|(_, m)| !m.is_empty())
            .map(|(t, _)| t.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.map.values().all(BTreeMap::is_empty)
    }

    /// Total number of mappings
    pub fn len(&self) -> usize {
        self.map.values().map(BTreeMap::len).sum()
    }
}
