//! Bundle directory layout
//!
//! ```text
//! <root>/
//!   manifest.json
//!   Entities/<EntityType>.<ext>
//!   Files/<EntityType>/<id>
//!   Config/config.json
//!   Config/config-internal.json
//!   Customization/...
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;

use super::format::Format;
use super::{Manifest, Row, RowStream};
use crate::error::{MigrateError, Result};

pub const MANIFEST_FILE: &str = "manifest.json";
pub const ENTITIES_DIR: &str = "Entities";
pub const FILES_DIR: &str = "Files";
pub const CONFIG_DIR: &str = "Config";
pub const CUSTOMIZATION_DIR: &str = "Customization";

const CONFIG_FILE: &str = "config.json";
const CONFIG_INTERNAL_FILE: &str = "config-internal.json";

static ENTITY_TYPE_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_]*$").expect("valid entity type regex"));

/// Whether `name` can be used as an entity type, and so as a file name
pub fn is_valid_entity_type(name: &str) -> bool {
    ENTITY_TYPE_NAME.is_match(name)
}

/// A bundle rooted at a directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bundle {
    root: PathBuf,
}

impl Bundle {
    /// Bundle at `root`; the directory may not exist yet
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Bundle { root: root.into() }
    }

    /// Existing bundle at `root`
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(MigrateError::PathNotFound(root));
        }
        Ok(Bundle { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.root.join(MANIFEST_FILE)
    }

    pub fn entities_dir(&self) -> PathBuf {
        self.root.join(ENTITIES_DIR)
    }

    pub fn entity_file(&self, entity_type: &str, format: &dyn Format) -> PathBuf {
        self.entities_dir()
            .join(format!("{}.{}", entity_type, format.extension()))
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.join(CONFIG_DIR).join(CONFIG_FILE)
    }

    pub fn config_internal_path(&self) -> PathBuf {
        self.root.join(CONFIG_DIR).join(CONFIG_INTERNAL_FILE)
    }

    pub fn has_customization(&self) -> bool {
        self.root.join(CUSTOMIZATION_DIR).is_dir()
    }

    pub fn load_manifest(&self) -> Result<Manifest> {
        Manifest::load(&self.manifest_path())
    }

    /// Entity types that have a file in this bundle, sorted by name
    pub fn entity_types(&self, format: &dyn Format) -> Result<Vec<String>> {
        let dir = self.entities_dir();
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut entity_types = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(format.extension()) {
                continue;
            }
            match path.file_stem().and_then(|s| s.to_str()) {
                Some(stem) if is_valid_entity_type(stem) => entity_types.push(stem.to_string()),
                _ => log::warn!("Ignoring bundle file {}", path.display()),
            }
        }
        entity_types.sort();
        Ok(entity_types)
    }

    /// Rows of one entity type, or `None` when the bundle has no file for it
    pub fn read_entity(&self, entity_type: &str, format: &dyn Format) -> Result<Option<RowStream>> {
        let path = self.entity_file(entity_type, format);
        if !path.exists() {
            return Ok(None);
        }
        format.read_file(&path).map(Some)
    }

    /// Write both configuration snapshots
    pub fn store_config(&self, config: &Row, internal: &Row) -> Result<()> {
        fs::create_dir_all(self.root.join(CONFIG_DIR))?;
        fs::write(self.config_path(), serde_json::to_string_pretty(config)?)?;
        fs::write(self.config_internal_path(), serde_json::to_string_pretty(internal)?)?;
        Ok(())
    }

    /// Non-internal configuration snapshot, if present
    pub fn load_config(&self) -> Result<Option<Row>> {
        read_optional(&self.config_path())
    }

    /// Internal configuration snapshot, if present
    pub fn load_config_internal(&self) -> Result<Option<Row>> {
        read_optional(&self.config_internal_path())
    }
}

fn read_optional(path: &Path) -> Result<Option<Row>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    Ok(Some(serde_json::from_str(&content)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transfer::format::JsonFormat;
    use serde_json::json;

    #[test]
    fn test_layout() {
        let bundle = Bundle::new("/tmp/bundle");
        assert_eq!(
            bundle.entity_file("Account", &JsonFormat),
            PathBuf::from("/tmp/bundle/Entities/Account.json")
        );
        assert_eq!(bundle.manifest_path(), PathBuf::from("/tmp/bundle/manifest.json"));
        assert_eq!(
            bundle.config_internal_path(),
            PathBuf::from("/tmp/bundle/Config/config-internal.json")
        );
    }

    #[test]
    fn test_entity_type_names() {
        assert!(is_valid_entity_type("Account"));
        assert!(is_valid_entity_type("CAccount_2"));
        assert!(!is_valid_entity_type("../Account"));
        assert!(!is_valid_entity_type(""));
        assert!(!is_valid_entity_type("2Account"));
    }

    #[test]
    fn test_open_missing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            Bundle::open(dir.path().join("missing")),
            Err(MigrateError::PathNotFound(_))
        ));
    }

    #[test]
    fn test_entity_types_and_read() {
        let dir = tempfile::tempdir().unwrap();
        let bundle = Bundle::new(dir.path());
        fs::create_dir_all(bundle.entities_dir()).unwrap();
        fs::write(bundle.entity_file("Contact", &JsonFormat), "[\n{\"id\":\"c\"}\n]\n").unwrap();
        fs::write(bundle.entity_file("Account", &JsonFormat), "[\n{\"id\":\"a\"}\n]\n").unwrap();
        fs::write(bundle.entities_dir().join("notes.txt"), "ignored").unwrap();
        fs::write(bundle.entities_dir().join("bad name.json"), "[\n]\n").unwrap();

        assert_eq!(bundle.entity_types(&JsonFormat).unwrap(), vec!["Account", "Contact"]);

        let mut stream = bundle.read_entity("Account", &JsonFormat).unwrap().unwrap();
        stream.rewind().unwrap();
        assert_eq!(stream.read().unwrap().unwrap()["id"], json!("a"));
        assert!(bundle.read_entity("Lead", &JsonFormat).unwrap().is_none());
    }

    #[test]
    fn test_config_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let bundle = Bundle::new(dir.path());
        assert!(bundle.load_config().unwrap().is_none());

        let mut config = Row::new();
        config.insert("defaultCurrency".into(), json!("EUR"));
        bundle.store_config(&config, &Row::new()).unwrap();

        assert_eq!(bundle.load_config().unwrap(), Some(config));
        assert_eq!(bundle.load_config_internal().unwrap(), Some(Row::new()));
    }
}
