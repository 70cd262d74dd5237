//! Per-row outcomes

use crate::error::MigrateError;

/// What a hook or placeholder decided about a row
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// Keep processing the row
    Continue,
    /// Exclude the row; not an error
    Skip(String),
}

impl ProcessOutcome {
    pub fn skip(reason: impl Into<String>) -> Self {
        ProcessOutcome::Skip(reason.into())
    }

    pub fn is_skip(&self) -> bool {
        matches!(self, ProcessOutcome::Skip(_))
    }
}

/// Terminal state of one imported row
#[derive(Debug)]
pub enum RowOutcome {
    Persisted,
    Skipped(String),
    Failed(MigrateError),
}
