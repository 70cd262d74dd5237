//! Bundle manifest

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::now_string;
use crate::error::{MigrateError, Result};

/// Provenance record written once alongside a bundle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub id: String,
    pub application_name: String,
    pub version: String,
    /// UTC, storage datetime format
    pub export_time: String,
}

impl Manifest {
    /// Create a manifest stamped with a fresh ID and the current time
    pub fn new(application_name: impl Into<String>, version: impl Into<String>) -> Self {
        Manifest {
            id: Uuid::new_v4().to_string(),
            application_name: application_name.into(),
            version: version.into(),
            export_time: now_string(),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(MigrateError::PathNotFound(path.to_path_buf()));
        }
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Persist the manifest; an existing manifest is never overwritten
    pub fn store(&self, path: &Path) -> Result<()> {
        if path.exists() {
            return Err(MigrateError::Config(format!(
                "manifest already exists: {}",
                path.display()
            )));
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Whether the bundle comes from a newer application version than `version`
    ///
    /// Versions that do not parse as semver are never considered newer.
    pub fn is_newer_than(&self, version: &str) -> bool {
        match (
            semver::Version::parse(&self.version),
            semver::Version::parse(version),
        ) {
            (Ok(bundle), Ok(instance)) => bundle > instance,
            _ => false,
        }
    }
}
