//! Import command handler

use anyhow::{Context, Result};
use colored::*;

use super::ImportCommands;
use crate::config::MigrateConfig;
use crate::host::Instance;
use crate::output::ConsoleReporter;
use crate::transfer::runner::Importer;

pub fn handle_import_command(args: ImportCommands, mut config: MigrateConfig, verbose: bool) -> Result<()> {
    if !args.path.is_dir() {
        anyhow::bail!("Bundle does not exist: {}", args.path.display());
    }

    if let Some(import_type) = args.import_type {
        config.import.import_type = import_type;
    }
    if args.currency.is_some() {
        config.import.currency = args.currency;
    }
    config.import.update_currency |= args.update_currency;
    config.import.update_created_at |= args.update_created_at;
    config.import.customization |= args.customization;
    if args.no_placeholders {
        config.import.apply_placeholders = false;
    }
    config.validate().context("Invalid import options")?;

    let mut instance = Instance::load(&args.instance)
        .with_context(|| format!("Failed to load instance: {}", args.instance.display()))?;

    let reporter = ConsoleReporter::new(verbose);
    let report = {
        let mut ctx = instance.context();
        Importer::new(&config, &reporter)
            .run(&mut ctx, &args.path, &args.entity_type)
            .context("Import failed")?
    };

    instance
        .save()
        .with_context(|| format!("Failed to save instance: {}", args.instance.display()))?;

    println!();
    println!(
        "Imported {} entity types into {}",
        report.entries.len().to_string().bright_green().bold(),
        args.instance.display().to_string().cyan()
    );
    if !report.warnings.is_empty() {
        println!("{} warnings", report.warnings.len().to_string().yellow());
    }
    Ok(())
}
