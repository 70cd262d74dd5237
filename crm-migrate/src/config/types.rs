//! Options file layout

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::transfer::compare::DEFAULT_SYSTEM_NOTE_TYPES;
use crate::transfer::id_mapping::DEFAULT_DELIMITERS;
use crate::transfer::import::ImportType;

/// All options, one section per tool
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MigrateConfig {
    pub export: ExportConfig,
    pub import: ImportConfig,
    pub compare: CompareConfig,
    pub id_mapping: IdMappingConfig,
    pub config_snapshot: ConfigSnapshotConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub format: String,
    pub pretty_print: bool,
    pub export_all_fields: bool,
    pub clear_password: bool,
    /// Entity types to export; empty means every type from metadata
    pub entity_types: Vec<String>,
    pub skip_entity_types: Vec<String>,
    /// Per entity type record exclusions
    pub skip_lists: HashMap<String, SkipList>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            format: "json".to_string(),
            pretty_print: false,
            export_all_fields: false,
            clear_password: false,
            entity_types: Vec::new(),
            skip_entity_types: Vec::new(),
            skip_lists: HashMap::new(),
        }
    }
}

/// Records of one entity type left out of an export
///
/// ```toml
/// [export.skip_lists.User]
/// type = ["system", "api"]
/// require_null = ["deletedById"]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkipList {
    /// Attributes that must be empty for a record to be exported
    #[serde(default)]
    pub require_null: Vec<String>,
    /// Attribute to excluded values
    #[serde(flatten)]
    pub not_in: BTreeMap<String, Vec<Value>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    pub import_type: ImportType,
    pub update_currency: bool,
    pub currency: Option<String>,
    pub update_created_at: bool,
    pub apply_placeholders: bool,
    /// The bundle's customization is installed; silences custom entity warnings
    pub customization: bool,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            import_type: ImportType::CreateAndUpdate,
            update_currency: false,
            currency: None,
            update_created_at: false,
            apply_placeholders: true,
            customization: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompareConfig {
    pub skip_modified_at: bool,
    pub skip_stream: bool,
    pub skip_action_history: bool,
    pub skip_workflow_log: bool,
    pub check_created: bool,
    pub check_modified: bool,
    pub check_deleted: bool,
    /// Also write both-modified records to the skipped output
    pub verbose: bool,
    /// Note types that do not count as live edits
    pub system_note_types: Vec<String>,
}

impl Default for CompareConfig {
    fn default() -> Self {
        Self {
            skip_modified_at: false,
            skip_stream: false,
            skip_action_history: false,
            skip_workflow_log: false,
            check_created: true,
            check_modified: true,
            check_deleted: true,
            verbose: false,
            system_note_types: DEFAULT_SYSTEM_NOTE_TYPES.iter().map(|t| t.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdMappingConfig {
    /// Strings an ID must be wrapped in to be replaced inside a larger value
    pub delimiters: Vec<String>,
}

impl Default for IdMappingConfig {
    fn default() -> Self {
        Self {
            delimiters: DEFAULT_DELIMITERS.iter().map(|d| d.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigSnapshotConfig {
    /// Keys never written into the live configuration on import
    pub ignore_keys: Vec<String>,
}

impl Default for ConfigSnapshotConfig {
    fn default() -> Self {
        Self {
            ignore_keys: [
                "siteUrl",
                "database",
                "cryptKey",
                "passwordSalt",
                "hashSecretKey",
                "version",
            ]
            .iter()
            .map(|k| k.to_string())
            .collect(),
        }
    }
}
