//! Entity metadata models
//!
//! Read-only description of entity types as provided by the host
//! application. The migration pipeline never mutates metadata.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::transfer::PlaceholderAction;

/// Storage type of an attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AttributeType {
    Id,
    Bool,
    Int,
    Float,
    Varchar,
    Text,
    Date,
    Datetime,
    ForeignId,
    ForeignType,
    Foreign,
    JsonArray,
    JsonObject,
    Password,
    #[serde(other)]
    Other,
}

impl AttributeType {
    /// Type tag used for processor lookups
    pub fn tag(&self) -> &'static str {
        match self {
            AttributeType::Id => "id",
            AttributeType::Bool => "bool",
            AttributeType::Int => "int",
            AttributeType::Float => "float",
            AttributeType::Varchar => "varchar",
            AttributeType::Text => "text",
            AttributeType::Date => "date",
            AttributeType::Datetime => "datetime",
            AttributeType::ForeignId => "foreignId",
            AttributeType::ForeignType => "foreignType",
            AttributeType::Foreign => "foreign",
            AttributeType::JsonArray => "jsonArray",
            AttributeType::JsonObject => "jsonObject",
            AttributeType::Password => "password",
            AttributeType::Other => "other",
        }
    }

    /// Whether values of this type are free-form strings that may embed IDs
    pub fn is_string_like(&self) -> bool {
        matches!(
            self,
            AttributeType::Id
                | AttributeType::Varchar
                | AttributeType::Text
                | AttributeType::ForeignId
                | AttributeType::JsonArray
                | AttributeType::JsonObject
        )
    }

    /// Types whose null values are left out of exported rows
    pub fn is_compactable(&self) -> bool {
        matches!(
            self,
            AttributeType::Bool | AttributeType::Text | AttributeType::Varchar | AttributeType::ForeignId
        )
    }
}

/// Pointer from a `foreign` attribute to the attribute it mirrors
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignRef {
    /// Relation (link) name on the owning entity
    pub relation: String,
    /// Attribute name on the related entity
    pub attribute: String,
}

/// Attribute metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeDefs {
    pub name: String,
    #[serde(rename = "type")]
    pub attribute_type: AttributeType,
    /// Field this attribute belongs to (e.g. "amount" for "amountCurrency")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default)]
    pub not_storable: bool,
    #[serde(default)]
    pub is_link_multiple_id_list: bool,
    #[serde(default)]
    pub is_link_multiple_name_map: bool,
    #[serde(default)]
    pub is_link_stub: bool,
    #[serde(default)]
    pub not_exportable: bool,
    /// Set for `foreign` attributes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreign: Option<ForeignRef>,
}

impl AttributeDefs {
    pub fn new(name: impl Into<String>, attribute_type: AttributeType) -> Self {
        AttributeDefs {
            name: name.into(),
            attribute_type,
            field: None,
            not_storable: false,
            is_link_multiple_id_list: false,
            is_link_multiple_name_map: false,
            is_link_stub: false,
            not_exportable: false,
            foreign: None,
        }
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn not_storable(mut self) -> Self {
        self.not_storable = true;
        self
    }

    /// Whether this attribute is a link-multiple projection (ID list or name map)
    pub fn is_link_multiple(&self) -> bool {
        self.is_link_multiple_id_list || self.is_link_multiple_name_map
    }
}

/// Field metadata (a field groups one or more attributes)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDefs {
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(default)]
    pub export_disabled: bool,
    #[serde(default)]
    pub import_disabled: bool,
}

impl FieldDefs {
    pub fn new(field_type: impl Into<String>) -> Self {
        FieldDefs {
            field_type: field_type.into(),
            export_disabled: false,
            import_disabled: false,
        }
    }
}

/// Relation types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RelationType {
    BelongsTo,
    BelongsToParent,
    HasMany,
    ManyMany,
    HasChildren,
    HasOne,
}

/// Relation metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationDefs {
    pub name: String,
    #[serde(rename = "type")]
    pub relation_type: RelationType,
    /// Related entity type (absent for belongsToParent)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity: Option<String>,
    /// Attribute on this entity holding the foreign ID (belongsTo)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    /// Attribute on the related entity pointing back here (hasMany)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreign_key: Option<String>,
}

/// Complete entity metadata
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityDefs {
    pub name: String,
    /// Attributes in storage order
    #[serde(default)]
    pub attributes: Vec<AttributeDefs>,
    #[serde(default)]
    pub fields: HashMap<String, FieldDefs>,
    #[serde(default)]
    pub relations: Vec<RelationDefs>,
    /// IDs are database sequences rather than globally unique strings
    #[serde(default)]
    pub id_autoincrement: bool,
    /// Entity type created through customization (not part of the core app)
    #[serde(default)]
    pub is_custom: bool,
    /// First-class record type; join/relation records are not scopes
    #[serde(default = "default_true")]
    pub is_scope: bool,
    /// Placeholder actions applied on import, keyed by attribute
    #[serde(default)]
    pub placeholders: HashMap<String, PlaceholderAction>,
    /// Attributes declared to hold IDs of other entity types ("*" = any type)
    #[serde(default)]
    pub id_reference_attributes: HashMap<String, Vec<String>>,
}

fn default_true() -> bool {
    true
}

impl EntityDefs {
    pub fn new(name: impl Into<String>) -> Self {
        EntityDefs {
            name: name.into(),
            is_scope: true,
            ..Default::default()
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeDefs> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub fn relation(&self, name: &str) -> Option<&RelationDefs> {
        self.relations.iter().find(|r| r.name == name)
    }

    /// Field definition owning an attribute, if any
    pub fn field_of(&self, attribute: &AttributeDefs) -> Option<&FieldDefs> {
        let field_name = attribute.field.as_deref().unwrap_or(&attribute.name);
        self.fields.get(field_name)
    }

    /// Field type owning an attribute, if declared
    pub fn field_type_of(&self, attribute: &AttributeDefs) -> Option<&str> {
        self.field_of(attribute).map(|f| f.field_type.as_str())
    }
}

/// Read-only metadata registry
pub trait Metadata {
    /// All entity types known to the host, in a stable order
    fn entity_type_list(&self) -> Vec<String>;

    fn entity_defs(&self, entity_type: &str) -> Option<&EntityDefs>;

    /// Generic lookup into the raw metadata tree
    fn get(&self, path: &[&str]) -> Option<&serde_json::Value>;

    fn is_scope_entity(&self, entity_type: &str) -> bool {
        self.entity_defs(entity_type).map(|d| d.is_scope).unwrap_or(false)
    }
}
