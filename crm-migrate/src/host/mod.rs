//! Host application contracts
//!
//! The migration pipeline rides on the host CRM's ORM, ACL, metadata and
//! configuration. This module describes the narrow surface it consumes, plus
//! a reference [`Instance`] that keeps everything in memory and persists to
//! an instance directory.

pub mod entity;
pub mod instance;
pub mod metadata;
pub mod query;

pub use entity::Entity;
pub use instance::{Instance, InstanceAcl, InstanceConfig, InstanceStore};
pub use metadata::{
    AttributeDefs, AttributeType, EntityDefs, FieldDefs, ForeignRef, Metadata, RelationDefs,
    RelationType,
};
pub use query::{Filter, Order, Query};

use serde_json::Value;

use crate::error::Result;
use crate::transfer::Row;

/// Flags passed along with every write made by the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveOptions {
    /// Suppress notifications and side-effect hooks
    pub silent: bool,
    /// Do not create stream/audit notes
    pub no_stream: bool,
    /// Mark the write as part of an import (keeps modifiedAt/createdAt as given)
    pub import: bool,
}

impl SaveOptions {
    /// Options used for every import write
    pub fn import() -> Self {
        SaveOptions {
            silent: true,
            no_stream: true,
            import: true,
        }
    }
}

impl Default for SaveOptions {
    fn default() -> Self {
        SaveOptions {
            silent: false,
            no_stream: false,
            import: false,
        }
    }
}

/// Streaming result of a find
pub type EntityIter<'a> = Box<dyn Iterator<Item = Result<Entity>> + 'a>;

/// Query and persistence access to live records
pub trait EntityManager {
    /// Stream every record matching the query, in query order
    fn find<'a>(&'a self, query: &Query) -> Result<EntityIter<'a>>;

    fn find_one(&self, query: &Query) -> Result<Option<Entity>> {
        let limited = query.clone().limit(1);
        self.find(&limited)?.next().transpose()
    }

    fn get_by_id(&self, entity_type: &str, id: &str, with_deleted: bool) -> Result<Option<Entity>>;

    fn new_entity(&self, entity_type: &str) -> Entity {
        Entity::new(entity_type)
    }

    fn save(&mut self, entity: &mut Entity, options: SaveOptions) -> Result<()>;

    /// Soft-delete
    fn remove(&mut self, entity: &mut Entity, options: SaveOptions) -> Result<()>;

    /// Physically remove a record, soft-deleted or not
    fn delete_from_db(&mut self, entity_type: &str, id: &str) -> Result<()>;
}

/// Access control lookups
pub trait Acl {
    /// Attributes the current user may not access for the given action
    fn scope_forbidden_attribute_list(&self, entity_type: &str, action: &str) -> Vec<String>;
}

/// Instance configuration and environment services
pub trait HostConfig {
    fn get(&self, key: &str) -> Option<&Value>;

    fn set(&mut self, key: &str, value: Value);

    fn set_internal(&mut self, key: &str, value: Value);

    /// Non-internal configuration
    fn snapshot(&self) -> Row;

    /// Internal/system configuration
    fn internal_snapshot(&self) -> Row;

    fn default_currency(&self) -> String {
        self.get("defaultCurrency")
            .and_then(Value::as_str)
            .unwrap_or("USD")
            .to_string()
    }

    /// IANA time zone name of the instance
    fn time_zone(&self) -> String {
        self.get("timeZone")
            .and_then(Value::as_str)
            .unwrap_or("UTC")
            .to_string()
    }

    fn application_name(&self) -> String {
        self.get("applicationName")
            .and_then(Value::as_str)
            .unwrap_or("CRM")
            .to_string()
    }

    fn version(&self) -> String {
        self.get("version")
            .and_then(Value::as_str)
            .unwrap_or("0.0.0")
            .to_string()
    }

    fn hash_password(&self, plain: &str) -> String;
}

/// Everything the pipeline needs from the host for one run
pub struct HostContext<'a> {
    pub entity_manager: &'a mut dyn EntityManager,
    pub metadata: &'a dyn Metadata,
    pub acl: &'a dyn Acl,
    pub config: &'a mut dyn HostConfig,
}

impl<'a> HostContext<'a> {
    pub fn new(
        entity_manager: &'a mut dyn EntityManager,
        metadata: &'a dyn Metadata,
        acl: &'a dyn Acl,
        config: &'a mut dyn HostConfig,
    ) -> Self {
        HostContext {
            entity_manager,
            metadata,
            acl,
            config,
        }
    }

    /// Entity defs or an `UnknownEntityType` error
    pub fn entity_defs(&self, entity_type: &str) -> Result<&'a EntityDefs> {
        self.metadata
            .entity_defs(entity_type)
            .ok_or_else(|| crate::error::MigrateError::UnknownEntityType(entity_type.to_string()))
    }
}
