//! Compare counts per entity type

use serde::Serialize;

/// Counts of one entity type's comparison
///
/// Built once at the end of a run; the `with_*` methods return modified
/// copies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompareResult {
    total: usize,
    created: usize,
    modified: usize,
    both_modified: usize,
    deleted: usize,
    skipped: usize,
    /// Watermark the run used, storage datetime format
    from_date: Option<String>,
}

impl CompareResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_total(mut self, total: usize) -> Self {
        self.total = total;
        self
    }

    pub fn with_created(mut self, created: usize) -> Self {
        self.created = created;
        self
    }

    pub fn with_modified(mut self, modified: usize) -> Self {
        self.modified = modified;
        self
    }

    pub fn with_both_modified(mut self, both_modified: usize) -> Self {
        self.both_modified = both_modified;
        self
    }

    pub fn with_deleted(mut self, deleted: usize) -> Self {
        self.deleted = deleted;
        self
    }

    pub fn with_skipped(mut self, skipped: usize) -> Self {
        self.skipped = skipped;
        self
    }

    pub fn with_from_date(mut self, from_date: Option<String>) -> Self {
        self.from_date = from_date;
        self
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn created(&self) -> usize {
        self.created
    }

    pub fn modified(&self) -> usize {
        self.modified
    }

    pub fn both_modified(&self) -> usize {
        self.both_modified
    }

    pub fn deleted(&self) -> usize {
        self.deleted
    }

    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn from_date(&self) -> Option<&str> {
        self.from_date.as_deref()
    }

    /// Whether anything would be written to the changed output
    pub fn has_changes(&self) -> bool {
        self.created + self.modified + self.deleted > 0
    }
}

impl std::fmt::Display for CompareResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} total, {} created, {} modified, {} deleted, {} both modified, {} skipped",
            self.total, self.created, self.modified, self.deleted, self.both_modified, self.skipped
        )
    }
}
