//! Options file loading and validation
//!
//! Lookup order: an explicit `--config` path, then `$CRM_MIGRATE_CONFIG`
//! (a `.env` file is honoured), then `<config dir>/crm-migrate/config.toml`.
//! Without any file the built-in defaults apply.

mod types;

pub use types::*;

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{MigrateError, Result};
use crate::host::Filter;
use crate::transfer::bundle::is_valid_entity_type;
use crate::transfer::compare::CompareParams;
use crate::transfer::export::ExportParams;
use crate::transfer::format::format_for;
use crate::transfer::import::ImportParams;

pub const CONFIG_ENV_VAR: &str = "CRM_MIGRATE_CONFIG";
const CONFIG_FILE: &str = "config.toml";

/// Default options file location for the current user
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("crm-migrate").join(CONFIG_FILE))
}

impl MigrateConfig {
    /// Load options from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(MigrateError::PathNotFound(path.to_path_buf()));
        }
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse options from a TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: MigrateConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Options from the first file found in lookup order, with its path
    ///
    /// An explicit or environment path must exist; the per-user default may not.
    pub fn resolve(explicit: Option<&Path>) -> Result<(Self, Option<PathBuf>)> {
        dotenvy::dotenv().ok();

        let path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => std::env::var_os(CONFIG_ENV_VAR)
                .map(PathBuf::from)
                .or_else(|| default_config_path().filter(|p| p.exists())),
        };

        match path {
            Some(path) => {
                log::debug!("Loading options from {}", path.display());
                Ok((Self::load(&path)?, Some(path)))
            }
            None => Ok((Self::default(), None)),
        }
    }

    /// Check values the type system cannot
    pub fn validate(&self) -> Result<()> {
        format_for(&self.export.format)?;

        let listed = self
            .export
            .entity_types
            .iter()
            .chain(&self.export.skip_entity_types)
            .chain(self.export.skip_lists.keys());
        for entity_type in listed {
            if !is_valid_entity_type(entity_type) {
                return Err(MigrateError::Config(format!(
                    "invalid entity type name '{}'",
                    entity_type
                )));
            }
        }

        if self.id_mapping.delimiters.iter().any(String::is_empty) {
            return Err(MigrateError::Config("ID delimiters must not be empty".into()));
        }
        if let Some(currency) = &self.import.currency {
            if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_uppercase()) {
                return Err(MigrateError::Config(format!("invalid currency code '{}'", currency)));
            }
        }
        Ok(())
    }
}

impl ExportConfig {
    /// Query filters excluding the skip-listed records of an entity type
    pub fn filters_for(&self, entity_type: &str) -> Vec<Filter> {
        let Some(skip_list) = self.skip_lists.get(entity_type) else {
            return Vec::new();
        };

        let mut filters: Vec<Filter> = skip_list
            .not_in
            .iter()
            .map(|(attribute, values)| Filter::NotIn(attribute.clone(), values.clone()))
            .collect();
        filters.extend(skip_list.require_null.iter().map(|a| Filter::IsNull(a.clone())));
        filters
    }

    /// Whether an entity type is left out of a full export
    pub fn is_skipped(&self, entity_type: &str) -> bool {
        self.skip_entity_types.iter().any(|t| t == entity_type)
    }

    pub fn params(&self, entity_type: &str) -> ExportParams {
        ExportParams::new(entity_type)
            .with_format(Some(self.format.clone()))
            .with_export_all_fields(self.export_all_fields)
            .with_clear_password(self.clear_password)
            .with_pretty_print(self.pretty_print)
            .with_filters(self.filters_for(entity_type))
    }
}

impl ImportConfig {
    pub fn params(&self, entity_type: &str) -> ImportParams {
        ImportParams::new(entity_type)
            .with_import_type(self.import_type)
            .with_update_currency(self.update_currency)
            .with_currency(self.currency.clone())
            .with_update_created_at(self.update_created_at)
            .with_apply_placeholders(self.apply_placeholders)
            .with_customization(self.customization)
    }
}

impl CompareConfig {
    pub fn params(&self, entity_type: &str) -> CompareParams {
        CompareParams::new(entity_type)
            .with_check_created(self.check_created)
            .with_check_modified(self.check_modified)
            .with_check_deleted(self.check_deleted)
            .with_skip_modified_at(self.skip_modified_at)
            .with_skip_stream(self.skip_stream)
            .with_skip_action_history(self.skip_action_history)
            .with_skip_workflow_log(self.skip_workflow_log)
            .with_verbose(self.verbose)
            .with_system_note_types(self.system_note_types.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transfer::import::ImportType;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let config = MigrateConfig::from_toml("").unwrap();
        assert_eq!(config, MigrateConfig::default());
        assert_eq!(config.export.format, "json");
        assert!(config.import.apply_placeholders);
        assert_eq!(config.import.import_type, ImportType::CreateAndUpdate);
        assert!(config.compare.check_created);
        assert_eq!(config.compare.system_note_types.len(), 9);
        assert_eq!(config.id_mapping.delimiters, vec!["'", "\"", "\\\""]);
        assert!(config.config_snapshot.ignore_keys.contains(&"passwordSalt".to_string()));
    }

    #[test]
    fn test_parse_sections() {
        let config = MigrateConfig::from_toml(
            r#"
            [export]
            pretty_print = true
            skip_entity_types = ["Job"]

            [export.skip_lists.User]
            type = ["system", "api"]
            require_null = ["deletedById"]

            [import]
            import_type = "create"
            currency = "EUR"

            [compare]
            check_deleted = false

            [id_mapping]
            delimiters = ["|"]
            "#,
        )
        .unwrap();

        assert!(config.export.pretty_print);
        assert!(config.export.is_skipped("Job"));
        assert_eq!(config.import.import_type, ImportType::Create);
        assert_eq!(config.import.currency.as_deref(), Some("EUR"));
        assert!(!config.compare.check_deleted);
        assert!(config.compare.check_modified);
        assert_eq!(config.id_mapping.delimiters, vec!["|"]);

        assert_eq!(
            config.export.filters_for("User"),
            vec![
                Filter::NotIn("type".into(), vec![json!("system"), json!("api")]),
                Filter::IsNull("deletedById".into()),
            ]
        );
        assert!(config.export.filters_for("Account").is_empty());
    }

    #[test]
    fn test_params_from_sections() {
        let mut config = MigrateConfig::default();
        config.import.update_currency = true;
        config.compare.skip_stream = true;
        config.export.clear_password = true;

        let import = config.import.params("Opportunity");
        assert_eq!(import.entity_type(), "Opportunity");
        assert!(import.attribute_params().update_currency);

        let compare = config.compare.params("Account");
        assert!(compare.skip_stream());
        assert!(compare.check_created());

        let export = config.export.params("User");
        assert!(export.clear_password());
        assert_eq!(export.format(), Some("json"));
    }

    #[test]
    fn test_validation() {
        let err = MigrateConfig::from_toml("[export]\nformat = \"xml\"").unwrap_err();
        assert!(matches!(err, MigrateError::UnknownFormat(_)));

        let err = MigrateConfig::from_toml("[export]\nentity_types = [\"../etc\"]").unwrap_err();
        assert!(matches!(err, MigrateError::Config(_)));

        let err = MigrateConfig::from_toml("[id_mapping]\ndelimiters = [\"\"]").unwrap_err();
        assert!(matches!(err, MigrateError::Config(_)));

        let err = MigrateConfig::from_toml("[import]\ncurrency = \"euro\"").unwrap_err();
        assert!(matches!(err, MigrateError::Config(_)));

        let err = MigrateConfig::from_toml("[import]\nimport_type = \"merge\"").unwrap_err();
        assert!(matches!(err, MigrateError::Toml(_)));
    }

    #[test]
    fn test_load_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("options.toml");
        fs::write(&path, "[compare]\nverbose = true\n").unwrap();

        let (config, found) = MigrateConfig::resolve(Some(&path)).unwrap();
        assert!(config.compare.verbose);
        assert_eq!(found, Some(path));

        let missing = dir.path().join("missing.toml");
        assert!(matches!(
            MigrateConfig::resolve(Some(&missing)),
            Err(MigrateError::PathNotFound(_))
        ));
    }
}
