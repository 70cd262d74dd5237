//! Compare of a bundle snapshot against live data
//!
//! A bundle row is matched to its live record and classified:
//!
//! - deleted: the live record is soft-deleted
//! - unchanged: no attribute differs (counted as skipped)
//! - both modified: it differs, and the live record was also edited after the
//!   watermark; left out of the changed output
//! - modified: it differs and nothing touched it live
//!
//! Live records created after the watermark that the bundle does not know
//! are reported as created. The watermark is the explicit `from_date`, else
//! the newest `modifiedAt` in the bundle, else the bundle export time.

mod diff;
mod hooks;
mod params;
mod result;

use std::collections::HashSet;
use std::path::{Path, PathBuf};

pub use diff::{get_diff_data, pick};
pub use hooks::{CompareHook, CompareHooks, UserCompareHook};
pub use params::{CompareParams, DEFAULT_SYSTEM_NOTE_TYPES};
pub use result::CompareResult;

use serde_json::Value;

use super::attribute::{AttributeParams, AttributeProcessorRegistry};
use super::bundle::ENTITIES_DIR;
use super::export::{ExportParams, export_row, extract_value, select_attributes};
use super::format::Format;
use super::id_mapping::IdReplacer;
use super::{ProcessOutcome, Row, RowStream, format_datetime, parse_datetime, row_id};
use crate::error::{MigrateError, Result};
use crate::host::{Entity, Filter, HostContext, Query};

pub const CHANGED_DIR: &str = "changed";
pub const SKIPPED_DIR: &str = "skipped";
pub const PREV_DIR: &str = "prev";
pub const ACTUAL_DIR: &str = "actual";

/// Result of comparing one entity type, with the rows to write out
#[derive(Debug)]
pub struct CompareOutput {
    pub entity_type: String,
    pub result: CompareResult,
    /// Bundle side of modified and deleted records
    pub changed_prev: RowStream,
    /// Live side of modified, deleted and created records
    pub changed_actual: RowStream,
    /// Bundle side of both-modified records (verbose only)
    pub skipped_prev: RowStream,
    /// Live side of both-modified records (verbose only)
    pub skipped_actual: RowStream,
}

impl CompareOutput {
    fn new(entity_type: &str) -> Result<Self> {
        Ok(CompareOutput {
            entity_type: entity_type.to_string(),
            result: CompareResult::new(),
            changed_prev: RowStream::new()?,
            changed_actual: RowStream::new()?,
            skipped_prev: RowStream::new()?,
            skipped_actual: RowStream::new()?,
        })
    }

    /// Write the non-empty streams under `root`; returns the number of files written
    pub fn write_to(&mut self, root: &Path, format: &dyn Format, pretty: bool) -> Result<usize> {
        let entity_type = &self.entity_type;
        let targets = [
            (result_file(root, CHANGED_DIR, PREV_DIR, entity_type, format), &mut self.changed_prev),
            (result_file(root, CHANGED_DIR, ACTUAL_DIR, entity_type, format), &mut self.changed_actual),
            (result_file(root, SKIPPED_DIR, PREV_DIR, entity_type, format), &mut self.skipped_prev),
            (result_file(root, SKIPPED_DIR, ACTUAL_DIR, entity_type, format), &mut self.skipped_actual),
        ];

        let mut written = 0;
        for (path, stream) in targets {
            if format.write_file(stream, &path, pretty)? {
                log::debug!("Wrote {}", path.display());
                written += 1;
            }
        }
        Ok(written)
    }
}

/// File of an entity type in one of the four result trees
pub fn result_file(root: &Path, group: &str, side: &str, entity_type: &str, format: &dyn Format) -> PathBuf {
    root.join(group)
        .join(side)
        .join(ENTITIES_DIR)
        .join(format!("{}.{}", entity_type, format.extension()))
}

#[derive(Default)]
struct Counts {
    total: usize,
    modified: usize,
    both_modified: usize,
    deleted: usize,
    skipped: usize,
}

/// Row comparer with its processor and hook tables
pub struct EntityCompare<'r> {
    processors: &'r AttributeProcessorRegistry,
    hooks: &'r CompareHooks,
}

impl<'r> EntityCompare<'r> {
    pub fn new(processors: &'r AttributeProcessorRegistry, hooks: &'r CompareHooks) -> Self {
        EntityCompare { processors, hooks }
    }

    /// Compare every bundle row of the stream against the live instance
    pub fn run(
        &self,
        ctx: &HostContext<'_>,
        params: &CompareParams,
        data: &mut RowStream,
        ids: &mut IdReplacer,
    ) -> Result<CompareOutput> {
        let entity_type = params.entity_type();
        ctx.entity_defs(entity_type)?;

        let mut output = CompareOutput::new(entity_type)?;
        let mut counts = Counts::default();

        let (bundle_watermark, live_ids) = self.scan(data, entity_type, ids)?;
        let watermark = match params.from_date() {
            Some(from_date) => Some(normalize_date(from_date)?),
            None => bundle_watermark.or(params.fallback_from_date().and_then(|d| normalize_date(d).ok())),
        };
        log::debug!(
            "Comparing {} since {}",
            entity_type,
            watermark.as_deref().unwrap_or("the beginning")
        );

        if params.needs_row_scan() {
            data.rewind()?;
            while let Some(row) = data.read()? {
                counts.total += 1;
                let id = row_id(&row).unwrap_or_default();
                let compared =
                    self.compare_row(ctx, params, watermark.as_deref(), ids, row, &mut output, &mut counts);
                if let Err(e) = compared {
                    log::error!("{} '{}': {}", entity_type, id, e);
                    counts.skipped += 1;
                }
            }
        } else {
            counts.total = data.len();
        }

        let created = match (&watermark, params.check_created()) {
            (Some(watermark), true) => {
                self.collect_created(ctx, entity_type, watermark, &live_ids, &mut output.changed_actual)?
            }
            _ => 0,
        };

        output.result = CompareResult::new()
            .with_total(counts.total)
            .with_created(created)
            .with_modified(counts.modified)
            .with_both_modified(counts.both_modified)
            .with_deleted(counts.deleted)
            .with_skipped(counts.skipped)
            .with_from_date(watermark);
        Ok(output)
    }

    /// First pass: newest bundle `modifiedAt` and the live IDs the bundle covers
    fn scan(
        &self,
        data: &mut RowStream,
        entity_type: &str,
        ids: &IdReplacer,
    ) -> Result<(Option<String>, HashSet<String>)> {
        let mut newest = None;
        let mut live_ids = HashSet::new();

        data.rewind()?;
        while let Some(row) = data.read()? {
            if let Some(id) = row_id(&row) {
                live_ids.insert(live_id(ids, entity_type, &id));
            }
            let modified_at = row
                .get("modifiedAt")
                .and_then(Value::as_str)
                .and_then(parse_datetime);
            if let Some(modified_at) = modified_at {
                if newest.is_none_or(|n| modified_at > n) {
                    newest = Some(modified_at);
                }
            }
        }

        Ok((newest.as_ref().map(format_datetime), live_ids))
    }

    #[allow(clippy::too_many_arguments)]
    fn compare_row(
        &self,
        ctx: &HostContext<'_>,
        params: &CompareParams,
        watermark: Option<&str>,
        ids: &mut IdReplacer,
        row: Row,
        output: &mut CompareOutput,
        counts: &mut Counts,
    ) -> Result<()> {
        let entity_type = params.entity_type();
        let defs = ctx.entity_defs(entity_type)?;

        let Some(bundle_id) = row_id(&row) else {
            counts.skipped += 1;
            return Ok(());
        };
        let id = live_id(ids, entity_type, &bundle_id);

        let Some(entity) = ctx.entity_manager.get_by_id(entity_type, &id, true)? else {
            log::debug!("{} '{}' not found, skipping", entity_type, id);
            counts.skipped += 1;
            return Ok(());
        };

        if let Some(hook) = self.hooks.get(entity_type) {
            if let ProcessOutcome::Skip(reason) = hook.process(ctx, &entity, &row)? {
                log::debug!("Skipped {} '{}': {}", entity_type, id, reason);
                counts.skipped += 1;
                return Ok(());
            }
        }

        let mut prepared = row;
        self.processors
            .process_row(ctx, &AttributeParams::new(entity_type), ids, &mut prepared)?;
        ids.replace_row(ctx.metadata, entity_type, &mut prepared);

        let mut actual = Row::new();
        for name in prepared.keys() {
            if let Some(attribute) = defs.attribute(name) {
                actual.insert(name.clone(), extract_value(ctx, defs, attribute, &entity, false)?);
            }
        }
        let diff = get_diff_data(&prepared, &actual);

        if entity.is_deleted() {
            if !params.check_deleted() {
                counts.skipped += 1;
                return Ok(());
            }
            let mut prev = identified(&id);
            prev.insert("deleted".into(), Value::Bool(false));
            merge_without_identity(&mut prev, diff);
            let mut live = identified(&id);
            live.insert("deleted".into(), Value::Bool(true));
            merge_without_identity(&mut live, actual);

            output.changed_prev.write(&prev)?;
            output.changed_actual.write(&live)?;
            counts.deleted += 1;
            return Ok(());
        }

        if !params.check_modified() || diff.is_empty() {
            counts.skipped += 1;
            return Ok(());
        }

        let mut prev = identified(&id);
        let mut live = identified(&id);
        let changed_actual = pick(&actual, &diff);
        merge_without_identity(&mut prev, diff);
        merge_without_identity(&mut live, changed_actual);

        let signal = match watermark {
            Some(watermark) => live_edit_signal(ctx, params, &entity, &id, watermark)?,
            None => None,
        };
        if let Some(signal) = signal {
            counts.both_modified += 1;
            log::info!("{} '{}' modified on both sides ({}), skipping", entity_type, id, signal);
            if params.verbose() {
                output.skipped_prev.write(&prev)?;
                output.skipped_actual.write(&live)?;
            }
            return Ok(());
        }

        output.changed_prev.write(&prev)?;
        output.changed_actual.write(&live)?;
        counts.modified += 1;
        Ok(())
    }

    /// Live records created since the watermark that the bundle does not cover
    fn collect_created(
        &self,
        ctx: &HostContext<'_>,
        entity_type: &str,
        watermark: &str,
        live_ids: &HashSet<String>,
        out: &mut RowStream,
    ) -> Result<usize> {
        let defs = ctx.entity_defs(entity_type)?;
        let attributes = select_attributes(ctx, defs, &ExportParams::new(entity_type));
        let query = Query::new(entity_type).filter(Filter::gte("createdAt", watermark));

        let mut created = 0;
        for entity in ctx.entity_manager.find(&query)? {
            let entity = entity?;
            if entity.id().is_some_and(|id| live_ids.contains(&id)) {
                continue;
            }
            out.write(&export_row(ctx, defs, &attributes, &entity, false)?)?;
            created += 1;
        }
        Ok(created)
    }
}

/// Live ID of a bundle ID, through the ID map when the type was remapped
fn live_id(ids: &IdReplacer, entity_type: &str, id: &str) -> String {
    ids.id_map()
        .get(entity_type, id)
        .unwrap_or(id)
        .to_string()
}

fn identified(id: &str) -> Row {
    let mut row = Row::new();
    row.insert("id".into(), Value::String(id.to_string()));
    row
}

fn merge_without_identity(target: &mut Row, values: Row) {
    for (key, value) in values {
        if key != "id" && key != "deleted" {
            target.insert(key, value);
        }
    }
}

/// First live-side edit found after the watermark, as a short label
fn live_edit_signal(
    ctx: &HostContext<'_>,
    params: &CompareParams,
    entity: &Entity,
    id: &str,
    watermark: &str,
) -> Result<Option<&'static str>> {
    let entity_type = params.entity_type();

    if !params.skip_modified_at() {
        let modified_at = entity.get_str("modifiedAt").and_then(parse_datetime);
        if modified_at.is_some_and(|m| parse_datetime(watermark).is_some_and(|w| m >= w)) {
            return Ok(Some("modifiedAt"));
        }
    }

    if !params.skip_stream() && ctx.metadata.entity_defs("Note").is_some() {
        let system_types = params
            .system_note_types()
            .iter()
            .map(|t| Value::String(t.clone()))
            .collect();
        let query = Query::new("Note").filters([
            Filter::eq("parentType", entity_type),
            Filter::eq("parentId", id),
            Filter::gte("createdAt", watermark),
            Filter::NotIn("type".into(), system_types),
        ]);
        if ctx.entity_manager.find_one(&query)?.is_some() {
            return Ok(Some("stream"));
        }
    }

    let records = [
        (params.skip_action_history(), "ActionHistoryRecord", "action history"),
        (params.skip_workflow_log(), "WorkflowLogRecord", "workflow log"),
    ];
    for (skip, record_type, label) in records {
        if skip || ctx.metadata.entity_defs(record_type).is_none() {
            continue;
        }
        let query = Query::new(record_type).filters([
            Filter::eq("targetType", entity_type),
            Filter::eq("targetId", id),
            Filter::gte("createdAt", watermark),
        ]);
        if ctx.entity_manager.find_one(&query)?.is_some() {
            return Ok(Some(label));
        }
    }

    Ok(None)
}

/// A date or datetime in storage datetime format
pub fn normalize_date(value: &str) -> Result<String> {
    parse_datetime(value)
        .map(|d| format_datetime(&d))
        .ok_or_else(|| MigrateError::Config(format!("invalid date '{}'", value)))
}
