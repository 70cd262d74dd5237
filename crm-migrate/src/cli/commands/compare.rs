//! Compare command handler

use anyhow::{Context, Result};
use colored::*;

use super::CompareCommands;
use crate::config::MigrateConfig;
use crate::host::Instance;
use crate::output::ConsoleReporter;
use crate::transfer::runner::Comparer;

pub fn handle_compare_command(args: CompareCommands, mut config: MigrateConfig, verbose: bool) -> Result<()> {
    if !args.path.is_dir() {
        anyhow::bail!("Bundle does not exist: {}", args.path.display());
    }
    if args.no_created && args.no_deleted && args.no_modified {
        anyhow::bail!("Nothing to compare: --no-created, --no-deleted and --no-modified are all set");
    }

    let compare = &mut config.compare;
    compare.skip_modified_at |= args.skip_modified_at;
    compare.skip_stream |= args.skip_stream;
    compare.skip_action_history |= args.skip_action_history;
    compare.skip_workflow_log |= args.skip_workflow_log;
    compare.check_created &= !args.no_created;
    compare.check_deleted &= !args.no_deleted;
    compare.check_modified &= !args.no_modified;
    compare.verbose |= args.verbose_skipped;
    config.validate().context("Invalid compare options")?;

    let mut instance = Instance::load(&args.instance)
        .with_context(|| format!("Failed to load instance: {}", args.instance.display()))?;
    let ctx = instance.context();

    let reporter = ConsoleReporter::new(verbose);
    let run = Comparer::new(&config, &reporter)
        .run(&ctx, &args.path, &args.result, &args.entity_type, args.from_date.as_deref())
        .context("Compare failed")?;

    let changed: usize = run
        .results
        .values()
        .map(|r| r.created() + r.modified() + r.deleted())
        .sum();
    let conflicts: usize = run.results.values().map(|r| r.both_modified()).sum();

    println!();
    println!(
        "{} changed, {} modified on both sides, results in {}",
        changed.to_string().bright_green().bold(),
        conflicts.to_string().yellow(),
        args.result.display().to_string().cyan()
    );
    Ok(())
}
