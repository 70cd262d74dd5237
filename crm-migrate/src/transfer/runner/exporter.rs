//! Export of a whole instance into a bundle

use crate::config::MigrateConfig;
use crate::error::Result;
use crate::host::HostContext;
use crate::output::Reporter;
use crate::transfer::export::{EntityExport, ExportHooks};
use crate::transfer::format::format_for;
use crate::transfer::{Bundle, Manifest};

use super::RunReport;

pub struct Exporter<'r> {
    config: &'r MigrateConfig,
    hooks: ExportHooks,
    reporter: &'r dyn Reporter,
}

impl<'r> Exporter<'r> {
    pub fn new(config: &'r MigrateConfig, reporter: &'r dyn Reporter) -> Self {
        Exporter {
            config,
            hooks: ExportHooks::export_defaults(),
            reporter,
        }
    }

    /// Entity types a run exports: `selected`, else the configured list, else all
    pub fn entity_types(&self, ctx: &HostContext<'_>, selected: &[String]) -> Vec<String> {
        let export = &self.config.export;
        if !selected.is_empty() {
            return selected.to_vec();
        }
        if !export.entity_types.is_empty() {
            return export.entity_types.clone();
        }
        let mut entity_types: Vec<String> = ctx
            .metadata
            .entity_type_list()
            .into_iter()
            .filter(|t| !export.is_skipped(t))
            .collect();
        entity_types.sort();
        entity_types
    }

    /// Write the manifest, one file per non-empty entity type and the config snapshots
    pub fn run(&self, ctx: &HostContext<'_>, bundle: &Bundle, selected: &[String]) -> Result<RunReport> {
        let export = &self.config.export;
        let format = format_for(&export.format)?;
        let entity_types = self.entity_types(ctx, selected);

        let manifest = Manifest::new(ctx.config.application_name(), ctx.config.version());
        manifest.store(&bundle.manifest_path())?;
        log::info!("Exporting {} entity types to {}", entity_types.len(), bundle.root().display());

        let mut report = RunReport::new();
        for entity_type in &entity_types {
            self.reporter.entity_started(entity_type);

            let params = export.params(entity_type);
            let exported = EntityExport::run(ctx, &params, &self.hooks).and_then(|mut result| {
                let path = bundle.entity_file(entity_type, format.as_ref());
                result.write_to(&path, format.as_ref(), params.pretty_print())?;
                Ok(result)
            });

            match exported {
                Ok(result) => {
                    for warning in result.warnings {
                        report.warn(self.reporter, warning);
                    }
                    let summary = format!("{} exported, {} skipped", result.success_count, result.skip_count);
                    report.finish(self.reporter, entity_type, summary);
                }
                Err(e) => report.entity_failed(self.reporter, entity_type, e)?,
            }
        }

        bundle.store_config(&ctx.config.snapshot(), &ctx.config.internal_snapshot())?;
        Ok(report)
    }
}
