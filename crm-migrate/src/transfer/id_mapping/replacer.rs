//! Rewrites bundle IDs embedded in row values to live IDs

use std::collections::{BTreeMap, HashMap};

use regex::{Captures, Regex};
use serde_json::Value;

use super::{IdMap, Relation};
use crate::error::{MigrateError, Result};
use crate::host::Metadata;
use crate::transfer::Row;

/// Quote characters an embedded ID must be wrapped in to be rewritten
pub const DEFAULT_DELIMITERS: [&str; 3] = ["'", "\"", "\\\""];

/// Delimiter-bounded pattern for one entity type's mapped IDs
struct DelimitedPattern {
    delimiter: String,
    regex: Regex,
}

/// ID rewriter over an [`IdMap`]
///
/// A value is rewritten when it equals a mapped ID, or when a mapped ID
/// appears in it wrapped in one of the delimiters. Only attributes related
/// to the mapped entity type are touched.
pub struct IdReplacer {
    id_map: IdMap,
    delimiters: Vec<String>,
    patterns: HashMap<String, Vec<DelimitedPattern>>,
}

impl IdReplacer {
    pub fn new(id_map: IdMap, delimiters: Vec<String>) -> Result<Self> {
        let mut replacer = IdReplacer {
            id_map,
            delimiters,
            patterns: HashMap::new(),
        };
        let entity_types: Vec<String> = replacer.id_map.entity_types().map(str::to_string).collect();
        for entity_type in entity_types {
            replacer.compile(&entity_type)?;
        }
        Ok(replacer)
    }

    /// Replacer with the default delimiter set
    pub fn with_default_delimiters(id_map: IdMap) -> Result<Self> {
        Self::new(id_map, DEFAULT_DELIMITERS.iter().map(|d| d.to_string()).collect())
    }

    pub fn id_map(&self) -> &IdMap {
        &self.id_map
    }

    /// Register a mapping discovered mid-run
    pub fn add_mapping(&mut self, entity_type: &str, old: &str, new: &str) -> Result<bool> {
        if !self.id_map.add(entity_type, old, new) {
            return Ok(false);
        }
        self.compile(entity_type)?;
        Ok(true)
    }

    /// Rewrite every related attribute of a row; returns whether anything changed
    pub fn replace_row(&self, metadata: &dyn Metadata, entity_type: &str, row: &mut Row) -> bool {
        if self.id_map.is_empty() {
            return false;
        }
        let Some(defs) = metadata.entity_defs(entity_type) else {
            return false;
        };

        // A parent key only holds IDs of the type its `<link>Type` names
        let parent_types: HashMap<String, Option<String>> = row
            .keys()
            .filter_map(|attribute| {
                let type_attribute = Relation::parent_type_attribute(metadata, entity_type, attribute)?;
                let parent_type = row.get(&type_attribute).and_then(Value::as_str).map(str::to_string);
                Some((attribute.clone(), parent_type))
            })
            .collect();

        let mut changed = false;
        for (attribute, value) in row.iter_mut() {
            let string_like = defs
                .attribute(attribute)
                .is_some_and(|a| a.attribute_type.is_string_like());
            if !string_like {
                continue;
            }
            let parent_type = parent_types.get(attribute);

            // First type that rewrites the value wins; its output is never rewritten again
            for foreign_type in self.id_map.entity_types() {
                if parent_type.is_some_and(|t| t.as_deref() != Some(foreign_type)) {
                    continue;
                }
                if !Relation::is_attribute_related_to(metadata, entity_type, attribute, foreign_type) {
                    continue;
                }
                if self.replace_json(foreign_type, value) {
                    log::trace!("Rewrote {}.{} for {} IDs", entity_type, attribute, foreign_type);
                    changed = true;
                    break;
                }
            }
        }
        changed
    }

    /// Rewrite one string value holding IDs of `foreign_type`
    ///
    /// Returns the new value only if something was replaced.
    pub fn replace_value(&self, foreign_type: &str, value: &str) -> Option<String> {
        let mappings = self.id_map.for_type(foreign_type)?;
        if let Some(new) = mappings.get(value) {
            return Some(new.clone());
        }

        let patterns = self.patterns.get(foreign_type)?;
        let mut current = value.to_string();
        let mut changed = false;

        for pattern in patterns {
            let replaced = pattern.regex.replace_all(&current, |caps: &Captures| {
                match mappings.get(&caps[1]) {
                    Some(new) => {
                        changed = true;
                        format!("{}{}{}", pattern.delimiter, new, pattern.delimiter)
                    }
                    None => caps[0].to_string(),
                }
            });
            current = replaced.into_owned();
        }

        changed.then_some(current)
    }

    fn replace_json(&self, foreign_type: &str, value: &mut Value) -> bool {
        match value {
            Value::String(s) => match self.replace_value(foreign_type, s) {
                Some(new) => {
                    *s = new;
                    true
                }
                None => false,
            },
            Value::Array(items) => {
                let mut changed = false;
                for item in items.iter_mut() {
                    changed |= self.replace_json(foreign_type, item);
                }
                changed
            }
            Value::Object(map) => {
                let mut changed = false;
                let rebuilt: Row = std::mem::take(map)
                    .into_iter()
                    .map(|(key, mut item)| {
                        changed |= self.replace_json(foreign_type, &mut item);
                        match self.id_map.get(foreign_type, &key) {
                            Some(new) => {
                                changed = true;
                                (new.to_string(), item)
                            }
                            None => (key, item),
                        }
                    })
                    .collect();
                *map = rebuilt;
                changed
            }
            _ => false,
        }
    }

    fn compile(&mut self, entity_type: &str) -> Result<()> {
        let Some(mappings) = self.id_map.for_type(entity_type) else {
            return Ok(());
        };
        let patterns = build_patterns(mappings, &self.delimiters)?;
        self.patterns.insert(entity_type.to_string(), patterns);
        Ok(())
    }
}

fn build_patterns(
    mappings: &BTreeMap<String, String>,
    delimiters: &[String],
) -> Result<Vec<DelimitedPattern>> {
    // Longest IDs first so a prefix never wins the alternation
    let mut ids: Vec<&str> = mappings.keys().map(String::as_str).collect();
    ids.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
    let alternation = ids
        .iter()
        .map(|id| regex::escape(id))
        .collect::<Vec<_>>()
        .join("|");

    // Longer delimiters first: an escaped quote contains a plain one
    let mut delimiters: Vec<&String> = delimiters.iter().filter(|d| !d.is_empty()).collect();
    delimiters.sort_by(|a, b| b.len().cmp(&a.len()));

    delimiters
        .into_iter()
        .map(|delimiter| {
            let escaped = regex::escape(delimiter);
            let regex = Regex::new(&format!("{}({}){}", escaped, alternation, escaped))
                .map_err(|e| MigrateError::Config(format!("invalid ID pattern: {}", e)))?;
            Ok(DelimitedPattern {
                delimiter: delimiter.clone(),
                regex,
            })
        })
        .collect()
}
