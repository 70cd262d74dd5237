//! Command line interface

pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{CompareCommands, ExportCommands, ImportCommands};

#[derive(Parser, Debug)]
#[command(name = "crm-migrate")]
#[command(about = "Export, import and compare CRM instance data bundles")]
#[command(version)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Options file (TOML); defaults to $CRM_MIGRATE_CONFIG or the user config directory
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Export instance records into a bundle
    Export(ExportCommands),
    /// Import a bundle into an instance
    Import(ImportCommands),
    /// Compare a bundle against the current instance data
    Compare(CompareCommands),
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_compare() {
        let cli = Cli::try_parse_from([
            "crm-migrate",
            "-v",
            "compare",
            "--instance",
            "inst",
            "--path",
            "bundle",
            "--result",
            "out",
            "--entity-type",
            "Account",
            "--entity-type",
            "Contact",
            "--from-date",
            "2024-01-01",
            "--no-created",
        ])
        .unwrap();

        assert!(cli.verbose);
        let Commands::Compare(args) = cli.command else {
            panic!("expected compare");
        };
        assert_eq!(args.entity_type, vec!["Account", "Contact"]);
        assert_eq!(args.from_date.as_deref(), Some("2024-01-01"));
        assert!(args.no_created);
        assert!(!args.no_deleted);
    }

    #[test]
    fn test_parse_import_type() {
        let cli = Cli::try_parse_from([
            "crm-migrate",
            "import",
            "--instance",
            "inst",
            "--path",
            "bundle",
            "--import-type",
            "update",
        ])
        .unwrap();
        let Commands::Import(args) = cli.command else {
            panic!("expected import");
        };
        assert_eq!(args.import_type, Some(crate::transfer::import::ImportType::Update));

        assert!(
            Cli::try_parse_from(["crm-migrate", "import", "--instance", "i", "--path", "b", "--import-type", "merge"])
                .is_err()
        );
    }
}
