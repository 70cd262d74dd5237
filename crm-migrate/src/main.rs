use anyhow::{Context, Result};
use clap::Parser;
use colored::*;

use crm_migrate::MigrateConfig;
use crm_migrate::cli::commands::{handle_compare_command, handle_export_command, handle_import_command};
use crm_migrate::cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    if let Err(e) = run(cli) {
        eprintln!("{} {:#}", "error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let (config, path) = MigrateConfig::resolve(cli.config.as_deref()).context("Failed to load options")?;
    match path {
        Some(path) => log::info!("Using options from {}", path.display()),
        None => log::debug!("Using default options"),
    }

    match cli.command {
        Commands::Export(args) => handle_export_command(args, config, cli.verbose),
        Commands::Import(args) => handle_import_command(args, config, cli.verbose),
        Commands::Compare(args) => handle_compare_command(args, config, cli.verbose),
    }
}
