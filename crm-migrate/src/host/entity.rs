//! Live entity records

use serde_json::Value;

use crate::transfer::{Row, id_to_string};

/// A record loaded from (or about to be written to) the host
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub entity_type: String,
    values: Row,
    deleted: bool,
    is_new: bool,
}

impl Entity {
    /// Create an empty, not yet persisted entity
    pub fn new(entity_type: impl Into<String>) -> Self {
        Entity {
            entity_type: entity_type.into(),
            values: Row::new(),
            deleted: false,
            is_new: true,
        }
    }

    /// Wrap values loaded from storage
    pub fn from_stored(entity_type: impl Into<String>, values: Row) -> Self {
        let deleted = values.get("deleted").and_then(Value::as_bool).unwrap_or(false);
        Entity {
            entity_type: entity_type.into(),
            values,
            deleted,
            is_new: false,
        }
    }

    /// ID as a string; autoincrement IDs are stored as numbers
    pub fn id(&self) -> Option<String> {
        self.values.get("id").and_then(id_to_string)
    }

    pub fn get(&self, attribute: &str) -> Option<&Value> {
        self.values.get(attribute)
    }

    pub fn get_str(&self, attribute: &str) -> Option<&str> {
        self.get(attribute).and_then(Value::as_str)
    }

    pub fn has(&self, attribute: &str) -> bool {
        self.values.contains_key(attribute)
    }

    pub fn set(&mut self, attribute: impl Into<String>, value: Value) {
        let attribute = attribute.into();
        if attribute == "deleted" {
            self.deleted = value.as_bool().unwrap_or(false);
        }
        self.values.insert(attribute, value);
    }

    /// Apply every attribute of a row onto this entity
    pub fn set_multiple(&mut self, row: &Row) {
        for (attribute, value) in row {
            self.set(attribute.clone(), value.clone());
        }
    }

    pub fn values(&self) -> &Row {
        &self.values
    }

    pub fn into_values(self) -> Row {
        self.values
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    pub fn is_new(&self) -> bool {
        self.is_new
    }

    /// Mark as persisted; called by entity managers after a successful save
    pub fn mark_saved(&mut self) {
        self.is_new = false;
    }
}
