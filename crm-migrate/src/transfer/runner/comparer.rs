//! Compare of a bundle against a live instance

use std::collections::BTreeMap;
use std::path::Path;

use crate::config::MigrateConfig;
use crate::error::{MigrateError, Result};
use crate::host::HostContext;
use crate::output::Reporter;
use crate::transfer::Bundle;
use crate::transfer::attribute::AttributeProcessorRegistry;
use crate::transfer::compare::{CompareHooks, CompareResult, EntityCompare, normalize_date};
use crate::transfer::format::format_for;
use crate::transfer::id_mapping::{IdMappingTool, IdReplacer};

use super::{RunReport, order_entity_types, read_rows};

/// Per entity type compare results of a run
#[derive(Debug, Clone, Default)]
pub struct CompareRun {
    pub report: RunReport,
    pub results: BTreeMap<String, CompareResult>,
}

pub struct Comparer<'r> {
    config: &'r MigrateConfig,
    processors: AttributeProcessorRegistry,
    hooks: CompareHooks,
    reporter: &'r dyn Reporter,
}

impl<'r> Comparer<'r> {
    pub fn new(config: &'r MigrateConfig, reporter: &'r dyn Reporter) -> Self {
        Comparer {
            config,
            processors: AttributeProcessorRegistry::compare_defaults(),
            hooks: CompareHooks::compare_defaults(),
            reporter,
        }
    }

    /// Compare the bundle at `path` and write the result trees under `result_root`
    pub fn run(
        &self,
        ctx: &HostContext<'_>,
        path: &Path,
        result_root: &Path,
        selected: &[String],
        from_date: Option<&str>,
    ) -> Result<CompareRun> {
        let from_date = from_date.map(normalize_date).transpose()?;
        let bundle = Bundle::open(path)?;
        let format = format_for(&self.config.export.format)?;
        let pretty = self.config.export.pretty_print;

        let export_time = match bundle.load_manifest() {
            Ok(manifest) => Some(manifest.export_time),
            Err(MigrateError::PathNotFound(_)) => None,
            Err(e) => return Err(e),
        };

        let id_map = IdMappingTool::default().build(ctx, &bundle, format.as_ref())?;
        let mut ids = IdReplacer::new(id_map, self.config.id_mapping.delimiters.clone())?;
        let comparer = EntityCompare::new(&self.processors, &self.hooks);

        let mut run = CompareRun::default();
        for entity_type in order_entity_types(bundle.entity_types(format.as_ref())?, selected) {
            self.reporter.entity_started(&entity_type);

            let params = self
                .config
                .compare
                .params(&entity_type)
                .with_from_date(from_date.clone())
                .with_fallback_from_date(export_time.clone());

            let compared = read_rows(&bundle, &entity_type, format.as_ref())
                .and_then(|mut data| comparer.run(ctx, &params, &mut data, &mut ids))
                .and_then(|mut output| {
                    output.write_to(result_root, format.as_ref(), pretty)?;
                    Ok(output.result)
                });

            match compared {
                Ok(result) => {
                    run.report.finish(self.reporter, &entity_type, result.to_string());
                    run.results.insert(entity_type, result);
                }
                Err(e) => run.report.entity_failed(self.reporter, &entity_type, e)?,
            }
        }
        Ok(run)
    }
}
