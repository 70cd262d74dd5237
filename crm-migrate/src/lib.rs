//! CRM data migration toolkit
//!
//! Moves records between instances of a metadata-driven CRM through a bundle
//! directory: export writes one JSON array per entity type, import writes
//! them back with identity collisions remapped, and compare reconciles a
//! bundle with the live data it was taken from.

pub mod cli;
pub mod config;
pub mod error;
pub mod host;
pub mod output;
pub mod transfer;

pub use config::MigrateConfig;
pub use error::{MigrateError, Result};
