//! Subcommand arguments and handlers

mod compare;
mod export;
mod import;

use std::path::PathBuf;

use clap::Args;

pub use compare::handle_compare_command;
pub use export::handle_export_command;
pub use import::handle_import_command;

use crate::transfer::import::ImportType;

#[derive(Args, Debug)]
pub struct ExportCommands {
    /// Instance directory to read from
    #[arg(long)]
    pub instance: PathBuf,

    /// Bundle directory to create
    #[arg(long)]
    pub path: PathBuf,

    /// Entity types to export (repeatable); all when omitted
    #[arg(long = "entity-type")]
    pub entity_type: Vec<String>,

    /// Export non-storable fields too
    #[arg(long)]
    pub all_fields: bool,

    /// Pretty-print rows
    #[arg(long)]
    pub pretty: bool,

    /// Leave password hashes out
    #[arg(long)]
    pub clear_password: bool,

    /// Bundle format
    #[arg(long)]
    pub format: Option<String>,
}

#[derive(Args, Debug)]
pub struct ImportCommands {
    /// Instance directory to write into
    #[arg(long)]
    pub instance: PathBuf,

    /// Bundle directory to read
    #[arg(long)]
    pub path: PathBuf,

    /// Entity types to import (repeatable); all when omitted
    #[arg(long = "entity-type")]
    pub entity_type: Vec<String>,

    /// create, update or create-and-update
    #[arg(long)]
    pub import_type: Option<ImportType>,

    /// Set the currency of currency amounts
    #[arg(long)]
    pub update_currency: bool,

    /// Currency code for --update-currency; the instance default when omitted
    #[arg(long)]
    pub currency: Option<String>,

    /// Stamp createdAt with the import time
    #[arg(long)]
    pub update_created_at: bool,

    /// The bundle's customization is already installed
    #[arg(long)]
    pub customization: bool,

    /// Keep bundle values for placeholder attributes
    #[arg(long)]
    pub no_placeholders: bool,
}

#[derive(Args, Debug)]
pub struct CompareCommands {
    /// Instance directory to compare against
    #[arg(long)]
    pub instance: PathBuf,

    /// Bundle directory to read
    #[arg(long)]
    pub path: PathBuf,

    /// Directory for the changed/ and skipped/ trees
    #[arg(long)]
    pub result: PathBuf,

    /// Entity types to compare (repeatable); all when omitted
    #[arg(long = "entity-type")]
    pub entity_type: Vec<String>,

    /// Watermark date; derived from the bundle when omitted
    #[arg(long)]
    pub from_date: Option<String>,

    /// Do not treat a newer modifiedAt as a live edit
    #[arg(long)]
    pub skip_modified_at: bool,

    /// Do not treat stream notes as live edits
    #[arg(long)]
    pub skip_stream: bool,

    /// Do not treat action history as live edits
    #[arg(long)]
    pub skip_action_history: bool,

    /// Do not treat workflow log entries as live edits
    #[arg(long)]
    pub skip_workflow_log: bool,

    #[arg(long)]
    pub no_created: bool,

    #[arg(long)]
    pub no_deleted: bool,

    #[arg(long)]
    pub no_modified: bool,

    /// Write records modified on both sides to skipped/
    #[arg(long)]
    pub verbose_skipped: bool,
}
