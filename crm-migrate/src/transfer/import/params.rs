//! Import options

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::MigrateError;
use crate::transfer::attribute::AttributeParams;

/// Which rows an import may write
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ImportType {
    /// Only create missing records
    Create,
    /// Only update existing records
    Update,
    #[default]
    CreateAndUpdate,
}

impl ImportType {
    pub fn allows_create(&self) -> bool {
        !matches!(self, ImportType::Update)
    }

    pub fn allows_update(&self) -> bool {
        !matches!(self, ImportType::Create)
    }
}

impl fmt::Display for ImportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportType::Create => write!(f, "create"),
            ImportType::Update => write!(f, "update"),
            ImportType::CreateAndUpdate => write!(f, "create-and-update"),
        }
    }
}

impl FromStr for ImportType {
    type Err = MigrateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "create" => Ok(ImportType::Create),
            "update" => Ok(ImportType::Update),
            "create-and-update" | "createAndUpdate" => Ok(ImportType::CreateAndUpdate),
            other => Err(MigrateError::Config(format!("unknown import type '{}'", other))),
        }
    }
}

/// Options for importing one entity type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportParams {
    entity_type: String,
    import_type: ImportType,
    update_currency: bool,
    currency: Option<String>,
    update_created_at: bool,
    apply_placeholders: bool,
    customization: bool,
}

impl ImportParams {
    pub fn new(entity_type: impl Into<String>) -> Self {
        ImportParams {
            entity_type: entity_type.into(),
            import_type: ImportType::default(),
            update_currency: false,
            currency: None,
            update_created_at: false,
            apply_placeholders: true,
            customization: false,
        }
    }

    /// Same options for another entity type
    pub fn for_entity_type(&self, entity_type: impl Into<String>) -> Self {
        ImportParams {
            entity_type: entity_type.into(),
            ..self.clone()
        }
    }

    pub fn with_import_type(mut self, import_type: ImportType) -> Self {
        self.import_type = import_type;
        self
    }

    pub fn with_update_currency(mut self, value: bool) -> Self {
        self.update_currency = value;
        self
    }

    pub fn with_currency(mut self, currency: Option<String>) -> Self {
        self.currency = currency;
        self
    }

    pub fn with_update_created_at(mut self, value: bool) -> Self {
        self.update_created_at = value;
        self
    }

    pub fn with_apply_placeholders(mut self, value: bool) -> Self {
        self.apply_placeholders = value;
        self
    }

    /// Customization files are imported along with the data
    pub fn with_customization(mut self, value: bool) -> Self {
        self.customization = value;
        self
    }

    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    pub fn import_type(&self) -> ImportType {
        self.import_type
    }

    pub fn apply_placeholders(&self) -> bool {
        self.apply_placeholders
    }

    pub fn customization(&self) -> bool {
        self.customization
    }

    pub fn attribute_params(&self) -> AttributeParams {
        AttributeParams {
            entity_type: self.entity_type.clone(),
            update_currency: self.update_currency,
            currency: self.currency.clone(),
            update_created_at: self.update_created_at,
        }
    }
}
