//! Export command handler

use anyhow::{Context, Result};
use colored::*;

use super::ExportCommands;
use crate::config::MigrateConfig;
use crate::host::Instance;
use crate::output::ConsoleReporter;
use crate::transfer::Bundle;
use crate::transfer::runner::Exporter;

pub fn handle_export_command(args: ExportCommands, mut config: MigrateConfig, verbose: bool) -> Result<()> {
    if args.path.join(crate::transfer::bundle::MANIFEST_FILE).exists() {
        anyhow::bail!("Bundle already exists: {}", args.path.display());
    }

    if let Some(format) = args.format {
        config.export.format = format;
    }
    config.export.export_all_fields |= args.all_fields;
    config.export.pretty_print |= args.pretty;
    config.export.clear_password |= args.clear_password;
    config.validate().context("Invalid export options")?;

    let mut instance = Instance::load(&args.instance)
        .with_context(|| format!("Failed to load instance: {}", args.instance.display()))?;
    let ctx = instance.context();

    let reporter = ConsoleReporter::new(verbose);
    let bundle = Bundle::new(&args.path);
    let report = Exporter::new(&config, &reporter)
        .run(&ctx, &bundle, &args.entity_type)
        .context("Export failed")?;

    println!();
    println!(
        "Exported {} entity types to {}",
        report.entries.len().to_string().bright_green().bold(),
        args.path.display().to_string().cyan()
    );
    if !report.warnings.is_empty() {
        println!("{} warnings", report.warnings.len().to_string().yellow());
    }
    Ok(())
}
