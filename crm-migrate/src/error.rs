//! Error types for export, import and compare runs

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the migration library
///
/// Only configuration problems and collaborator failures are errors. A row
/// that is voluntarily excluded is reported through
/// [`RowOutcome::Skipped`](crate::transfer::RowOutcome) instead.
#[derive(Debug, Error)]
pub enum MigrateError {
    /// A required option was not provided (e.g. format, path)
    #[error("missing required option '{0}'")]
    MissingOption(&'static str),

    /// A path given on input does not exist
    #[error("path does not exist: {}", .0.display())]
    PathNotFound(PathBuf),

    /// No wire format registered under this name
    #[error("unknown format '{0}'")]
    UnknownFormat(String),

    /// Entity type is not known to the host metadata
    #[error("unknown entity type '{0}'")]
    UnknownEntityType(String),

    /// Invalid configuration or params
    #[error("configuration error: {0}")]
    Config(String),

    /// The host (ORM, persistence, ACL) reported a failure
    #[error("host error: {0}")]
    Host(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl MigrateError {
    /// Build a host error from anything displayable
    pub fn host(message: impl std::fmt::Display) -> Self {
        MigrateError::Host(message.to_string())
    }

    /// Whether this error must abort the whole run before any work starts
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            MigrateError::MissingOption(_)
                | MigrateError::PathNotFound(_)
                | MigrateError::UnknownFormat(_)
                | MigrateError::Config(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, MigrateError>;
