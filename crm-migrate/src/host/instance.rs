//! Reference host: an application instance kept in memory
//!
//! An instance directory looks like:
//!
//! ```text
//! <dir>/
//!   metadata.json            {"entityDefs": [...], ...}
//!   records/<EntityType>.json
//!   config.json
//!   config-internal.json
//!   acl.json                 {"<EntityType>": {"<action>": [attributes]}}
//! ```
//!
//! The CLI operates on such directories; tests build instances directly.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use sha2::{Digest, Sha512};
use uuid::Uuid;

use super::query::compare;
use super::{
    Acl, Entity, EntityDefs, EntityIter, EntityManager, HostConfig, HostContext, Metadata, Order,
    Query, SaveOptions,
};
use crate::error::{MigrateError, Result};
use crate::transfer::{Row, id_to_string, now_string};

const METADATA_FILE: &str = "metadata.json";
const RECORDS_DIR: &str = "records";
const CONFIG_FILE: &str = "config.json";
const CONFIG_INTERNAL_FILE: &str = "config-internal.json";
const ACL_FILE: &str = "acl.json";

/// Metadata registry of an instance
#[derive(Debug, Clone, Default)]
pub struct InstanceMetadata {
    raw: Value,
    defs: Vec<EntityDefs>,
    index: HashMap<String, usize>,
}

impl InstanceMetadata {
    /// Build from entity defs only
    pub fn from_defs(defs: Vec<EntityDefs>) -> Self {
        let raw = serde_json::json!({
            "entityDefs": serde_json::to_value(&defs).unwrap_or(Value::Null),
        });
        Self::build(raw, defs)
    }

    /// Build from a raw metadata tree with an `entityDefs` array
    pub fn from_value(raw: Value) -> Result<Self> {
        let defs: Vec<EntityDefs> = match raw.get("entityDefs") {
            Some(list) => serde_json::from_value(list.clone())?,
            None => Vec::new(),
        };
        Ok(Self::build(raw, defs))
    }

    fn build(raw: Value, defs: Vec<EntityDefs>) -> Self {
        let index = defs
            .iter()
            .enumerate()
            .map(|(i, d)| (d.name.clone(), i))
            .collect();
        InstanceMetadata { raw, defs, index }
    }
}

impl Metadata for InstanceMetadata {
    fn entity_type_list(&self) -> Vec<String> {
        self.defs.iter().map(|d| d.name.clone()).collect()
    }

    fn entity_defs(&self, entity_type: &str) -> Option<&EntityDefs> {
        self.index.get(entity_type).map(|&i| &self.defs[i])
    }

    fn get(&self, path: &[&str]) -> Option<&Value> {
        let mut current = &self.raw;
        for key in path {
            current = current.get(key)?;
        }
        Some(current)
    }
}

/// Record storage of an instance
#[derive(Debug, Clone, Default)]
pub struct InstanceStore {
    records: HashMap<String, Vec<Row>>,
    autoincrement: HashSet<String>,
}

impl InstanceStore {
    pub fn new(metadata: &InstanceMetadata) -> Self {
        InstanceStore {
            records: HashMap::new(),
            autoincrement: metadata
                .defs
                .iter()
                .filter(|d| d.id_autoincrement)
                .map(|d| d.name.clone())
                .collect(),
        }
    }

    /// Insert a stored record as-is (fixtures, loading)
    pub fn insert(&mut self, entity_type: &str, row: Row) {
        self.records.entry(entity_type.to_string()).or_default().push(row);
    }

    /// All stored rows of a type, soft-deleted included
    pub fn rows(&self, entity_type: &str) -> &[Row] {
        self.records.get(entity_type).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn entity_types(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }

    fn position(&self, entity_type: &str, id: &str) -> Option<usize> {
        self.records
            .get(entity_type)?
            .iter()
            .position(|r| id_matches(r.get("id"), id))
    }

    fn next_id(&self, entity_type: &str) -> Value {
        if self.autoincrement.contains(entity_type) {
            let max = self
                .rows(entity_type)
                .iter()
                .filter_map(|r| match r.get("id")? {
                    Value::Number(n) => n.as_i64(),
                    Value::String(s) => s.parse::<i64>().ok(),
                    _ => None,
                })
                .max()
                .unwrap_or(0);
            return Value::from(max + 1);
        }
        let mut id = Uuid::new_v4().simple().to_string();
        id.truncate(17);
        Value::String(id)
    }
}

/// IDs are strings, or integers for autoincrement types
fn id_matches(stored: Option<&Value>, id: &str) -> bool {
    stored.and_then(id_to_string).is_some_and(|stored| stored == id)
}

impl EntityManager for InstanceStore {
    fn find<'a>(&'a self, query: &Query) -> Result<EntityIter<'a>> {
        let rows = self.rows(&query.entity_type);
        let entity_type = query.entity_type.clone();
        let limit = query.limit.unwrap_or(usize::MAX);

        match &query.order_by {
            None => {
                let query = query.clone();
                Ok(Box::new(
                    rows.iter()
                        .filter(move |r| query.matches(r))
                        .take(limit)
                        .map(move |r| Ok(Entity::from_stored(entity_type.clone(), r.clone()))),
                ))
            }
            Some((attribute, order)) => {
                let mut matched: Vec<&Row> = rows.iter().filter(|r| query.matches(r)).collect();
                matched.sort_by(|a, b| {
                    let ordering = compare(
                        a.get(attribute).unwrap_or(&Value::Null),
                        b.get(attribute).unwrap_or(&Value::Null),
                    )
                    .unwrap_or(std::cmp::Ordering::Equal);
                    match order {
                        Order::Asc => ordering,
                        Order::Desc => ordering.reverse(),
                    }
                });
                matched.truncate(limit);
                Ok(Box::new(matched.into_iter().map(move |r| {
                    Ok(Entity::from_stored(entity_type.clone(), r.clone()))
                })))
            }
        }
    }

    fn get_by_id(&self, entity_type: &str, id: &str, with_deleted: bool) -> Result<Option<Entity>> {
        let Some(position) = self.position(entity_type, id) else {
            return Ok(None);
        };
        let entity = Entity::from_stored(entity_type, self.rows(entity_type)[position].clone());
        if entity.is_deleted() && !with_deleted {
            return Ok(None);
        }
        Ok(Some(entity))
    }

    fn save(&mut self, entity: &mut Entity, options: SaveOptions) -> Result<()> {
        let entity_type = entity.entity_type.clone();
        let now = Value::String(now_string());

        if entity.is_new() {
            match entity.id() {
                Some(id) => {
                    if self.position(&entity_type, &id).is_some() {
                        return Err(MigrateError::host(format!(
                            "duplicate ID '{}' for entity type '{}'",
                            id, entity_type
                        )));
                    }
                }
                None => {
                    let id = self.next_id(&entity_type);
                    entity.set("id", id);
                }
            }
            if entity.get("createdAt").map_or(true, Value::is_null) {
                entity.set("createdAt", now.clone());
            }
        }
        if !options.import || entity.get("modifiedAt").map_or(true, Value::is_null) {
            entity.set("modifiedAt", now);
        }
        if !entity.has("deleted") {
            entity.set("deleted", Value::Bool(false));
        }

        let id = entity
            .id()
            .ok_or_else(|| MigrateError::host("entity has no ID after save"))?;

        match self.position(&entity_type, &id) {
            Some(position) => {
                let rows = self.records.entry(entity_type).or_default();
                rows[position] = entity.values().clone();
            }
            None => self.insert(&entity_type, entity.values().clone()),
        }

        entity.mark_saved();
        log::trace!("Saved {} '{}'", entity.entity_type, id);
        Ok(())
    }

    fn remove(&mut self, entity: &mut Entity, options: SaveOptions) -> Result<()> {
        entity.set("deleted", Value::Bool(true));
        self.save(entity, options)
    }

    fn delete_from_db(&mut self, entity_type: &str, id: &str) -> Result<()> {
        if let Some(position) = self.position(entity_type, id) {
            if let Some(rows) = self.records.get_mut(entity_type) {
                rows.remove(position);
            }
        }
        Ok(())
    }
}

/// Forbidden attribute lists per entity type and action
#[derive(Debug, Clone, Default)]
pub struct InstanceAcl {
    forbidden: HashMap<String, HashMap<String, Vec<String>>>,
}

impl InstanceAcl {
    pub fn forbid(&mut self, entity_type: &str, action: &str, attribute: &str) {
        self.forbidden
            .entry(entity_type.to_string())
            .or_default()
            .entry(action.to_string())
            .or_default()
            .push(attribute.to_string());
    }
}

impl Acl for InstanceAcl {
    fn scope_forbidden_attribute_list(&self, entity_type: &str, action: &str) -> Vec<String> {
        self.forbidden
            .get(entity_type)
            .and_then(|actions| actions.get(action))
            .cloned()
            .unwrap_or_default()
    }
}

/// Instance configuration (public and internal parts)
#[derive(Debug, Clone, Default)]
pub struct InstanceConfig {
    values: Row,
    internal: Row,
}

impl InstanceConfig {
    pub fn new(values: Row, internal: Row) -> Self {
        InstanceConfig { values, internal }
    }
}

impl HostConfig for InstanceConfig {
    fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key).or_else(|| self.internal.get(key))
    }

    fn set(&mut self, key: &str, value: Value) {
        self.values.insert(key.to_string(), value);
    }

    fn set_internal(&mut self, key: &str, value: Value) {
        self.internal.insert(key.to_string(), value);
    }

    fn snapshot(&self) -> Row {
        self.values.clone()
    }

    fn internal_snapshot(&self) -> Row {
        self.internal.clone()
    }

    fn hash_password(&self, plain: &str) -> String {
        let salt = self
            .internal
            .get("passwordSalt")
            .and_then(Value::as_str)
            .unwrap_or_default();
        format!("{:x}", Sha512::digest(format!("{}{}", salt, plain).as_bytes()))
    }
}

/// A complete application instance
#[derive(Debug, Clone, Default)]
pub struct Instance {
    pub store: InstanceStore,
    pub metadata: InstanceMetadata,
    pub acl: InstanceAcl,
    pub config: InstanceConfig,
    root: Option<PathBuf>,
}

impl Instance {
    /// Create an empty instance for the given entity defs
    pub fn new(defs: Vec<EntityDefs>) -> Self {
        let metadata = InstanceMetadata::from_defs(defs);
        Instance {
            store: InstanceStore::new(&metadata),
            metadata,
            acl: InstanceAcl::default(),
            config: InstanceConfig::default(),
            root: None,
        }
    }

    /// Load an instance directory
    pub fn load(root: &Path) -> Result<Self> {
        if !root.is_dir() {
            return Err(MigrateError::PathNotFound(root.to_path_buf()));
        }

        let metadata_raw: Value = read_json(&root.join(METADATA_FILE))?;
        let metadata = InstanceMetadata::from_value(metadata_raw)?;
        let mut store = InstanceStore::new(&metadata);

        let records_dir = root.join(RECORDS_DIR);
        if records_dir.is_dir() {
            for entity_type in metadata.entity_type_list() {
                let path = records_dir.join(format!("{}.json", entity_type));
                if !path.exists() {
                    continue;
                }
                let rows: Vec<Row> = read_json(&path)?;
                log::debug!("Loaded {} {} records", rows.len(), entity_type);
                for row in rows {
                    store.insert(&entity_type, row);
                }
            }
        }

        let config = InstanceConfig::new(
            read_json_or_default(&root.join(CONFIG_FILE))?,
            read_json_or_default(&root.join(CONFIG_INTERNAL_FILE))?,
        );
        let acl = InstanceAcl {
            forbidden: read_json_or_default(&root.join(ACL_FILE))?,
        };

        Ok(Instance {
            store,
            metadata,
            acl,
            config,
            root: Some(root.to_path_buf()),
        })
    }

    /// Write records and configuration back to the directory it was loaded from
    pub fn save(&self) -> Result<()> {
        let root = self
            .root
            .as_ref()
            .ok_or_else(|| MigrateError::Config("instance was not loaded from a directory".into()))?;
        self.save_to(root)
    }

    pub fn save_to(&self, root: &Path) -> Result<()> {
        let records_dir = root.join(RECORDS_DIR);
        fs::create_dir_all(&records_dir)?;

        fs::write(
            root.join(METADATA_FILE),
            serde_json::to_string_pretty(&self.metadata.raw)?,
        )?;
        for entity_type in self.store.entity_types() {
            let path = records_dir.join(format!("{}.json", entity_type));
            fs::write(path, serde_json::to_string_pretty(self.store.rows(entity_type))?)?;
        }
        fs::write(
            root.join(CONFIG_FILE),
            serde_json::to_string_pretty(&self.config.values)?,
        )?;
        fs::write(
            root.join(CONFIG_INTERNAL_FILE),
            serde_json::to_string_pretty(&self.config.internal)?,
        )?;
        fs::write(root.join(ACL_FILE), serde_json::to_string_pretty(&self.acl.forbidden)?)?;
        Ok(())
    }

    /// Borrow the instance as a host context
    pub fn context(&mut self) -> HostContext<'_> {
        HostContext::new(&mut self.store, &self.metadata, &self.acl, &mut self.config)
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    if !path.exists() {
        return Err(MigrateError::PathNotFound(path.to_path_buf()));
    }
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

fn read_json_or_default<T: serde::de::DeserializeOwned + Default>(path: &Path) -> Result<T> {
    if !path.exists() {
        return Ok(T::default());
    }
    read_json(path)
}
