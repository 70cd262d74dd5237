//! Import of a bundle into a live instance

use std::path::Path;

use crate::config::MigrateConfig;
use crate::error::{MigrateError, Result};
use crate::host::HostContext;
use crate::output::Reporter;
use crate::transfer::attribute::AttributeProcessorRegistry;
use crate::transfer::format::format_for;
use crate::transfer::id_mapping::{IdMappingTool, IdReplacer};
use crate::transfer::import::{EntityImport, ImportHooks};
use crate::transfer::{Bundle, Row};

use super::{RunReport, order_entity_types, read_rows};

pub struct Importer<'r> {
    config: &'r MigrateConfig,
    processors: AttributeProcessorRegistry,
    hooks: ImportHooks,
    reporter: &'r dyn Reporter,
}

impl<'r> Importer<'r> {
    pub fn new(config: &'r MigrateConfig, reporter: &'r dyn Reporter) -> Self {
        Importer {
            config,
            processors: AttributeProcessorRegistry::import_defaults(),
            hooks: ImportHooks::import_defaults(),
            reporter,
        }
    }

    /// Import the bundle at `path`, restricted to `selected` entity types when given
    ///
    /// The configuration snapshot is only imported by a full run.
    pub fn run(&self, ctx: &mut HostContext<'_>, path: &Path, selected: &[String]) -> Result<RunReport> {
        let bundle = Bundle::open(path)?;
        let format = format_for(&self.config.export.format)?;
        let mut report = RunReport::new();

        match bundle.load_manifest() {
            Ok(manifest) => {
                let version = ctx.config.version();
                if manifest.is_newer_than(&version) {
                    report.warn(
                        self.reporter,
                        format!(
                            "Bundle was exported from version {}, newer than this instance ({})",
                            manifest.version, version
                        ),
                    );
                }
            }
            Err(MigrateError::PathNotFound(_)) => {
                report.warn(self.reporter, "Bundle has no manifest".to_string());
            }
            Err(e) => return Err(e),
        }

        if bundle.has_customization() && !self.config.import.customization {
            report.warn(
                self.reporter,
                "Bundle carries customization files; they are not imported without --customization".to_string(),
            );
        }

        let id_map = IdMappingTool::default().build(ctx, &bundle, format.as_ref())?;
        let mut ids = IdReplacer::new(id_map, self.config.id_mapping.delimiters.clone())?;

        let entity_types = order_entity_types(bundle.entity_types(format.as_ref())?, selected);
        log::info!("Importing {} entity types from {}", entity_types.len(), bundle.root().display());

        let importer = EntityImport::new(&self.processors, &self.hooks, self.reporter);
        for entity_type in &entity_types {
            self.reporter.entity_started(entity_type);

            let params = self.config.import.params(entity_type);
            let imported = read_rows(&bundle, entity_type, format.as_ref())
                .and_then(|mut data| importer.run(ctx, &params, &mut data, &mut ids));

            match imported {
                Ok(result) => {
                    for warning in result.warnings {
                        report.warn(self.reporter, warning);
                    }
                    let summary = format!(
                        "{} imported, {} failed, {} skipped",
                        result.success_count, result.fail_count, result.skip_count
                    );
                    report.finish(self.reporter, entity_type, summary);
                }
                Err(e) => report.entity_failed(self.reporter, entity_type, e)?,
            }
        }

        if selected.is_empty() {
            self.import_config(ctx, &bundle)?;
        }
        Ok(report)
    }

    /// Copy the bundle's configuration snapshots into the live configuration
    fn import_config(&self, ctx: &mut HostContext<'_>, bundle: &Bundle) -> Result<()> {
        let ignored = &self.config.config_snapshot.ignore_keys;
        let keep = |row: Row| {
            row.into_iter()
                .filter(|(key, _)| !ignored.contains(key))
                .collect::<Vec<_>>()
        };

        if let Some(config) = bundle.load_config()? {
            for (key, value) in keep(config) {
                ctx.config.set(&key, value);
            }
        }
        if let Some(internal) = bundle.load_config_internal()? {
            for (key, value) in keep(internal) {
                ctx.config.set_internal(&key, value);
            }
        }
        Ok(())
    }
}
