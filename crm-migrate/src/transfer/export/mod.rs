//! Export of one entity type into a row stream
//!
//! The query is streamed from the host; every entity goes through attribute
//! selection, value extraction and the entity type's hook before it is
//! appended to the result stream.

mod hooks;
mod value;

use std::path::Path;

pub use hooks::{ExportHook, ExportHooks, UserExportHook};
pub use value::{effective_type, export_row, extract_value, select_attributes};

use super::format::{Format, format_for};
use super::{ProcessOutcome, RowStream};
use crate::error::{MigrateError, Result};
use crate::host::{Filter, HostContext, Query};

/// Options for exporting one entity type
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportParams {
    entity_type: String,
    format: Option<String>,
    attribute_list: Option<Vec<String>>,
    field_list: Option<Vec<String>>,
    export_all_fields: bool,
    access_control: bool,
    clear_password: bool,
    pretty_print: bool,
    filters: Vec<Filter>,
}

impl ExportParams {
    pub fn new(entity_type: impl Into<String>) -> Self {
        ExportParams {
            entity_type: entity_type.into(),
            format: Some("json".into()),
            ..Default::default()
        }
    }

    pub fn with_format(mut self, format: Option<String>) -> Self {
        self.format = format;
        self
    }

    pub fn with_attribute_list(mut self, attributes: Vec<String>) -> Self {
        self.attribute_list = Some(attributes);
        self
    }

    pub fn with_field_list(mut self, fields: Vec<String>) -> Self {
        self.field_list = Some(fields);
        self
    }

    pub fn with_export_all_fields(mut self, value: bool) -> Self {
        self.export_all_fields = value;
        self
    }

    /// Drop attributes the ACL forbids reading
    pub fn with_access_control(mut self, value: bool) -> Self {
        self.access_control = value;
        self
    }

    pub fn with_clear_password(mut self, value: bool) -> Self {
        self.clear_password = value;
        self
    }

    pub fn with_pretty_print(mut self, value: bool) -> Self {
        self.pretty_print = value;
        self
    }

    /// Additional where-clause (search filter, skip list)
    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn with_filters(mut self, filters: impl IntoIterator<Item = Filter>) -> Self {
        self.filters.extend(filters);
        self
    }

    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    pub fn format(&self) -> Option<&str> {
        self.format.as_deref()
    }

    pub fn attribute_list(&self) -> Option<&[String]> {
        self.attribute_list.as_deref()
    }

    pub fn field_list(&self) -> Option<&[String]> {
        self.field_list.as_deref()
    }

    pub fn export_all_fields(&self) -> bool {
        self.export_all_fields
    }

    pub fn access_control(&self) -> bool {
        self.access_control
    }

    pub fn clear_password(&self) -> bool {
        self.clear_password
    }

    pub fn pretty_print(&self) -> bool {
        self.pretty_print
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }
}

/// Outcome of exporting one entity type
#[derive(Debug)]
pub struct ExportResult {
    pub entity_type: String,
    pub success_count: usize,
    pub skip_count: usize,
    pub warnings: Vec<String>,
    pub data: RowStream,
}

impl ExportResult {
    /// Serialize the rows to `path`; nothing is written when there are none
    pub fn write_to(&mut self, path: &Path, format: &dyn Format, pretty: bool) -> Result<bool> {
        format.write_file(&mut self.data, path, pretty)
    }
}

pub struct EntityExport;

impl EntityExport {
    pub fn run(ctx: &HostContext<'_>, params: &ExportParams, hooks: &ExportHooks) -> Result<ExportResult> {
        let format = params.format().ok_or(MigrateError::MissingOption("format"))?;
        format_for(format)?;

        let entity_type = params.entity_type();
        let defs = ctx.entity_defs(entity_type)?;
        let attributes = select_attributes(ctx, defs, params);
        let hook = hooks.get(entity_type);

        let query = Query::new(entity_type).filters(params.filters().iter().cloned());

        let mut result = ExportResult {
            entity_type: entity_type.to_string(),
            success_count: 0,
            skip_count: 0,
            warnings: Vec::new(),
            data: RowStream::new()?,
        };

        for entity in ctx.entity_manager.find(&query)? {
            let mut entity = entity?;
            if let Some(hook) = hook {
                hook.load_additional_fields(ctx, &mut entity)?;
            }

            let mut row = export_row(ctx, defs, &attributes, &entity, params.clear_password())?;

            if let Some(hook) = hook {
                if let ProcessOutcome::Skip(reason) = hook.process(ctx, &entity, &mut row)? {
                    log::debug!(
                        "Skipped {} '{}': {}",
                        entity_type,
                        entity.id().unwrap_or_default(),
                        reason
                    );
                    result.skip_count += 1;
                    continue;
                }
            }

            result.data.write(&row)?;
            result.success_count += 1;
        }

        log::debug!(
            "Exported {} {} rows ({} skipped)",
            result.success_count,
            entity_type,
            result.skip_count
        );
        Ok(result)
    }
}
