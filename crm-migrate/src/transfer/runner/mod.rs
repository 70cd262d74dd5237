//! Whole-instance tools driving the per entity type processors
//!
//! Each tool validates its inputs before touching any stream, then runs one
//! entity type at a time. A failing entity type is reported as a warning and
//! the run moves on to the next one.

mod comparer;
mod exporter;
mod importer;

pub use comparer::{CompareRun, Comparer};
pub use exporter::Exporter;
pub use importer::Importer;

use crate::error::{MigrateError, Result};
use crate::output::Reporter;
use crate::transfer::format::Format;
use crate::transfer::{Bundle, RowStream};

/// Entity types imported before all others
pub const PRIORITY_ENTITY_TYPES: [&str; 2] = ["User", "Preferences"];

/// Summary of a multi entity type run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Entity type and a one-line summary, in processing order
    pub entries: Vec<(String, String)>,
    pub warnings: Vec<String>,
}

impl RunReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn summary(&self, entity_type: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(t, _)| t == entity_type)
            .map(|(_, s)| s.as_str())
    }

    fn finish(&mut self, reporter: &dyn Reporter, entity_type: &str, summary: String) {
        reporter.entity_finished(entity_type, &summary);
        self.entries.push((entity_type.to_string(), summary));
    }

    fn warn(&mut self, reporter: &dyn Reporter, message: String) {
        reporter.warning(&message);
        self.warnings.push(message);
    }

    /// Record a per entity type failure, or pass it on when it is fatal
    fn entity_failed(&mut self, reporter: &dyn Reporter, entity_type: &str, error: MigrateError) -> Result<()> {
        if error.is_fatal() {
            return Err(error);
        }
        self.warn(reporter, format!("{} failed: {}", entity_type, error));
        Ok(())
    }
}

/// Rows of an entity type the bundle lists
fn read_rows(bundle: &Bundle, entity_type: &str, format: &dyn Format) -> Result<RowStream> {
    bundle
        .read_entity(entity_type, format)?
        .ok_or_else(|| MigrateError::PathNotFound(bundle.entity_file(entity_type, format)))
}

/// Restrict `available` to `selected` (when given) and move priority types first
pub fn order_entity_types(available: Vec<String>, selected: &[String]) -> Vec<String> {
    let mut entity_types: Vec<String> = available
        .into_iter()
        .filter(|t| selected.is_empty() || selected.contains(t))
        .collect();
    entity_types.sort_by_key(|t| {
        PRIORITY_ENTITY_TYPES
            .iter()
            .position(|p| p == t)
            .unwrap_or(PRIORITY_ENTITY_TYPES.len())
    });
    entity_types
}
