//! User-visible progress reporting
//!
//! Reporters are passed explicitly to the pipeline. Every call is mirrored to
//! the `log` facade so a run can be followed with `RUST_LOG` alone.

use std::cell::RefCell;

use colored::*;
use is_terminal::IsTerminal;

/// Sink for per entity type progress and per row problems
pub trait Reporter {
    fn entity_started(&self, entity_type: &str);

    fn entity_finished(&self, entity_type: &str, summary: &str);

    fn row_error(&self, entity_type: &str, id: &str, message: &str);

    fn row_skipped(&self, entity_type: &str, id: &str, reason: &str);

    fn warning(&self, message: &str);
}

/// Prints to stdout/stderr
pub struct ConsoleReporter {
    /// Print skipped rows, not only errors
    verbose: bool,
}

impl ConsoleReporter {
    pub fn new(verbose: bool) -> Self {
        if !std::io::stdout().is_terminal() {
            colored::control::set_override(false);
        }
        ConsoleReporter { verbose }
    }
}

impl Reporter for ConsoleReporter {
    fn entity_started(&self, entity_type: &str) {
        log::info!("Processing {}", entity_type);
        print!("{} ... ", entity_type.cyan());
    }

    fn entity_finished(&self, entity_type: &str, summary: &str) {
        log::info!("Finished {}: {}", entity_type, summary);
        println!("{}", summary.green());
    }

    fn row_error(&self, entity_type: &str, id: &str, message: &str) {
        log::error!("{} '{}': {}", entity_type, id, message);
        eprintln!();
        eprintln!("  {} {} '{}': {}", "error".red().bold(), entity_type, id, message);
    }

    fn row_skipped(&self, entity_type: &str, id: &str, reason: &str) {
        log::debug!("Skipped {} '{}': {}", entity_type, id, reason);
        if self.verbose {
            println!();
            println!("  {} {} '{}': {}", "skip".yellow(), entity_type, id, reason.dimmed());
        }
    }

    fn warning(&self, message: &str) {
        log::warn!("{}", message);
        eprintln!("{} {}", "warning:".yellow().bold(), message);
    }
}

/// Discards everything but the log mirror
pub struct NullReporter;

impl Reporter for NullReporter {
    fn entity_started(&self, entity_type: &str) {
        log::info!("Processing {}", entity_type);
    }

    fn entity_finished(&self, entity_type: &str, summary: &str) {
        log::info!("Finished {}: {}", entity_type, summary);
    }

    fn row_error(&self, entity_type: &str, id: &str, message: &str) {
        log::error!("{} '{}': {}", entity_type, id, message);
    }

    fn row_skipped(&self, entity_type: &str, id: &str, reason: &str) {
        log::debug!("Skipped {} '{}': {}", entity_type, id, reason);
    }

    fn warning(&self, message: &str) {
        log::warn!("{}", message);
    }
}

/// One captured reporter call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportEvent {
    Started(String),
    Finished(String, String),
    RowError(String, String, String),
    RowSkipped(String, String, String),
    Warning(String),
}

/// Records calls for inspection
#[derive(Debug, Default)]
pub struct MemoryReporter {
    events: RefCell<Vec<ReportEvent>>,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ReportEvent> {
        self.events.borrow().clone()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.events
            .borrow()
            .iter()
            .filter_map(|e| match e {
                ReportEvent::Warning(message) => Some(message.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn row_errors(&self) -> usize {
        self.events
            .borrow()
            .iter()
            .filter(|e| matches!(e, ReportEvent::RowError(..)))
            .count()
    }
}

impl Reporter for MemoryReporter {
    fn entity_started(&self, entity_type: &str) {
        NullReporter.entity_started(entity_type);
        self.events
            .borrow_mut()
            .push(ReportEvent::Started(entity_type.to_string()));
    }

    fn entity_finished(&self, entity_type: &str, summary: &str) {
        NullReporter.entity_finished(entity_type, summary);
        self.events
            .borrow_mut()
            .push(ReportEvent::Finished(entity_type.to_string(), summary.to_string()));
    }

    fn row_error(&self, entity_type: &str, id: &str, message: &str) {
        NullReporter.row_error(entity_type, id, message);
        self.events.borrow_mut().push(ReportEvent::RowError(
            entity_type.to_string(),
            id.to_string(),
            message.to_string(),
        ));
    }

    fn row_skipped(&self, entity_type: &str, id: &str, reason: &str) {
        NullReporter.row_skipped(entity_type, id, reason);
        self.events.borrow_mut().push(ReportEvent::RowSkipped(
            entity_type.to_string(),
            id.to_string(),
            reason.to_string(),
        ));
    }

    fn warning(&self, message: &str) {
        NullReporter.warning(message);
        self.events
            .borrow_mut()
            .push(ReportEvent::Warning(message.to_string()));
    }
}
