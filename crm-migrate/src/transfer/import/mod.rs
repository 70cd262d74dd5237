//! Import of one entity type from a row stream
//!
//! Every row goes through the same steps:
//!
//! 1. Resolve the target ID (row ID, or a foreign key match for join records)
//! 2. Decide whether the import type allows writing it
//! 3. Transform: attribute processors, placeholders, metadata filtering
//! 4. Persist, after the entity type's hook had a say
//!
//! A failing row is reported and counted; the loop always continues.

mod hooks;
mod params;

pub use hooks::{ImportHook, ImportHooks, UserImportHook};
pub use params::{ImportParams, ImportType};

use serde_json::Value;

use super::attribute::AttributeProcessorRegistry;
use super::id_mapping::IdReplacer;
use super::placeholder::PlaceholderHandler;
use super::{ProcessOutcome, Row, RowOutcome, RowStream, row_id};
use crate::error::Result;
use crate::host::{AttributeType, EntityDefs, Filter, HostContext, Query, SaveOptions};
use crate::output::Reporter;

/// Outcome of importing one entity type
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportResult {
    pub entity_type: String,
    pub success_count: usize,
    pub fail_count: usize,
    pub skip_count: usize,
    pub warnings: Vec<String>,
}

/// Row importer with its processor and hook tables
pub struct EntityImport<'r> {
    processors: &'r AttributeProcessorRegistry,
    hooks: &'r ImportHooks,
    reporter: &'r dyn Reporter,
}

impl<'r> EntityImport<'r> {
    pub fn new(
        processors: &'r AttributeProcessorRegistry,
        hooks: &'r ImportHooks,
        reporter: &'r dyn Reporter,
    ) -> Self {
        EntityImport {
            processors,
            hooks,
            reporter,
        }
    }

    /// Import every row of the stream
    pub fn run(
        &self,
        ctx: &mut HostContext<'_>,
        params: &ImportParams,
        data: &mut RowStream,
        ids: &mut IdReplacer,
    ) -> Result<ImportResult> {
        let entity_type = params.entity_type();
        let defs = ctx.entity_defs(entity_type)?;

        let mut result = ImportResult {
            entity_type: entity_type.to_string(),
            ..Default::default()
        };
        if defs.is_custom && !params.customization() {
            result.warnings.push(format!(
                "Custom entity type {} imported without customization",
                entity_type
            ));
        }

        data.rewind()?;
        while let Some(row) = data.read()? {
            let id = row_id(&row).unwrap_or_default();
            match self.import_row(ctx, params, ids, row) {
                RowOutcome::Persisted => result.success_count += 1,
                RowOutcome::Skipped(reason) => {
                    result.skip_count += 1;
                    self.reporter.row_skipped(entity_type, &id, &reason);
                }
                RowOutcome::Failed(e) => {
                    result.fail_count += 1;
                    self.reporter.row_error(entity_type, &id, &e.to_string());
                }
            }
        }

        Ok(result)
    }

    /// Import a single row
    pub fn import_row(
        &self,
        ctx: &mut HostContext<'_>,
        params: &ImportParams,
        ids: &mut IdReplacer,
        row: Row,
    ) -> RowOutcome {
        match self.try_import_row(ctx, params, ids, row) {
            Ok(outcome) => outcome,
            Err(e) => RowOutcome::Failed(e),
        }
    }

    fn try_import_row(
        &self,
        ctx: &mut HostContext<'_>,
        params: &ImportParams,
        ids: &mut IdReplacer,
        mut row: Row,
    ) -> Result<RowOutcome> {
        let entity_type = params.entity_type();
        let defs = ctx.entity_defs(entity_type)?;

        ids.replace_row(ctx.metadata, entity_type, &mut row);

        // Resolve
        let resolved_by_keys = if ctx.metadata.is_scope_entity(entity_type) {
            None
        } else {
            resolve_by_foreign_keys(ctx, defs, &row)?
        };
        let target_id = resolved_by_keys.clone().or_else(|| row_id(&row));

        // Decide
        let row_deleted = row.get("deleted").and_then(Value::as_bool).unwrap_or(false);
        let found = match &target_id {
            Some(id) => ctx.entity_manager.get_by_id(entity_type, id, true)?,
            None => None,
        };
        // A soft-deleted record is recreated; it is only purged right before the save
        let (existing, purge) = match found {
            Some(existing) if existing.is_deleted() && !row_deleted => (None, target_id.clone()),
            other => (other, None),
        };

        match &existing {
            Some(_) if !params.import_type().allows_update() => {
                return Ok(RowOutcome::Skipped("record already exists".into()));
            }
            None if !params.import_type().allows_create() => {
                return Ok(RowOutcome::Skipped("record does not exist".into()));
            }
            _ => {}
        }
        let mut entity = existing.unwrap_or_else(|| ctx.entity_manager.new_entity(entity_type));

        // Transform
        if let Some(id) = resolved_by_keys {
            row.insert("id".into(), Value::String(id));
        }
        self.processors
            .process_row(ctx, &params.attribute_params(), ids, &mut row)?;

        if params.apply_placeholders() {
            if let ProcessOutcome::Skip(reason) = PlaceholderHandler::apply(ctx, entity_type, &mut row)? {
                return Ok(RowOutcome::Skipped(reason));
            }
        }

        prepare_for_storage(defs, &mut row);
        entity.set_multiple(&row);

        // Persist
        if let Some(hook) = self.hooks.get(entity_type) {
            if let ProcessOutcome::Skip(reason) = hook.process(ctx, &mut entity, ids)? {
                return Ok(RowOutcome::Skipped(reason));
            }
        }

        if let Some(id) = purge {
            log::debug!("Purging soft-deleted {} '{}' before re-creating", entity_type, id);
            ctx.entity_manager.delete_from_db(entity_type, &id)?;
        }
        ctx.entity_manager.save(&mut entity, SaveOptions::import())?;
        Ok(RowOutcome::Persisted)
    }
}

/// ID of the live join record matching every foreign key of the row
fn resolve_by_foreign_keys(ctx: &HostContext<'_>, defs: &EntityDefs, row: &Row) -> Result<Option<String>> {
    let filters: Vec<Filter> = defs
        .attributes
        .iter()
        .filter(|a| a.attribute_type == AttributeType::ForeignId)
        .filter_map(|a| {
            row.get(&a.name)
                .filter(|v| !v.is_null())
                .map(|v| Filter::Eq(a.name.clone(), v.clone()))
        })
        .collect();
    if filters.is_empty() {
        return Ok(None);
    }

    let query = Query::new(&defs.name).filters(filters).with_deleted();
    Ok(ctx.entity_manager.find_one(&query)?.and_then(|e| e.id()))
}

/// Restrict the row to importable attributes and decode JSON attributes
///
/// Exported JSON attributes are strings; they are stored decoded.
fn prepare_for_storage(defs: &EntityDefs, row: &mut Row) {
    row.retain(|name, _| {
        defs.attribute(name)
            .is_some_and(|a| !defs.field_of(a).is_some_and(|f| f.import_disabled))
    });

    for (name, value) in row.iter_mut() {
        let Some(attribute) = defs.attribute(name) else {
            continue;
        };
        if !matches!(
            attribute.attribute_type,
            AttributeType::JsonArray | AttributeType::JsonObject
        ) {
            continue;
        }
        if let Value::String(encoded) = value {
            if let Ok(decoded) = serde_json::from_str::<Value>(encoded) {
                *value = decoded;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{AttributeDefs, EntityManager, FieldDefs, Instance};
    use crate::output::MemoryReporter;
    use crate::transfer::id_mapping::IdMap;
    use serde_json::json;

    fn account_defs() -> EntityDefs {
        let mut defs = EntityDefs::new("Account");
        defs.attributes = vec![
            AttributeDefs::new("id", AttributeType::Id),
            AttributeDefs::new("name", AttributeType::Varchar),
            AttributeDefs::new("assignedUserId", AttributeType::ForeignId),
            AttributeDefs::new("data", AttributeType::JsonObject),
            AttributeDefs::new("locked", AttributeType::Varchar),
            AttributeDefs::new("deleted", AttributeType::Bool),
        ];
        defs.fields.insert("locked".into(), {
            let mut field = FieldDefs::new("varchar");
            field.import_disabled = true;
            field
        });
        defs
    }

    fn join_defs() -> EntityDefs {
        let mut defs = EntityDefs::new("AccountContact");
        defs.is_scope = false;
        defs.attributes = vec![
            AttributeDefs::new("id", AttributeType::Id),
            AttributeDefs::new("accountId", AttributeType::ForeignId),
            AttributeDefs::new("contactId", AttributeType::ForeignId),
            AttributeDefs::new("role", AttributeType::Varchar),
        ];
        defs
    }

    fn row(value: Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    fn stream(rows: &[Value]) -> RowStream {
        let mut stream = RowStream::new().unwrap();
        for r in rows {
            stream.write(&row(r.clone())).unwrap();
        }
        stream
    }

    fn import(
        instance: &mut Instance,
        params: &ImportParams,
        rows: &[Value],
        reporter: &MemoryReporter,
    ) -> ImportResult {
        let processors = AttributeProcessorRegistry::import_defaults();
        let hooks = ImportHooks::import_defaults();
        let mut ids = IdReplacer::with_default_delimiters(IdMap::new()).unwrap();
        let mut ctx = instance.context();
        EntityImport::new(&processors, &hooks, reporter)
            .run(&mut ctx, params, &mut stream(rows), &mut ids)
            .unwrap()
    }

    #[test]
    fn test_import_creates_and_updates() {
        let mut instance = Instance::new(vec![account_defs()]);
        instance
            .store
            .insert("Account", row(json!({"id": "1", "name": "Old", "deleted": false})));
        let reporter = MemoryReporter::new();

        let result = import(
            &mut instance,
            &ImportParams::new("Account"),
            &[
                json!({"id": "1", "name": "Acme", "unknown": 1, "locked": "x"}),
                json!({"id": "2", "name": "Beta", "data": "{\"k\":[1]}"}),
            ],
            &reporter,
        );

        assert_eq!(result.success_count, 2);
        assert_eq!(result.fail_count, 0);
        let stored = instance.store.get_by_id("Account", "1", false).unwrap().unwrap();
        assert_eq!(stored.get_str("name"), Some("Acme"));
        assert!(!stored.has("unknown"));
        assert!(!stored.has("locked"));
        let created = instance.store.get_by_id("Account", "2", false).unwrap().unwrap();
        assert_eq!(created.get("data"), Some(&json!({"k": [1]})));
    }

    #[test]
    fn test_import_type_create_skips_existing() {
        let mut instance = Instance::new(vec![account_defs()]);
        instance
            .store
            .insert("Account", row(json!({"id": "1", "name": "Old", "deleted": false})));
        let reporter = MemoryReporter::new();
        let params = ImportParams::new("Account").with_import_type(ImportType::Create);

        let result = import(
            &mut instance,
            &params,
            &[json!({"id": "1", "name": "New"}), json!({"id": "2", "name": "Beta"})],
            &reporter,
        );

        assert_eq!(result.success_count, 1);
        assert_eq!(result.skip_count, 1);
        let stored = instance.store.get_by_id("Account", "1", false).unwrap().unwrap();
        assert_eq!(stored.get_str("name"), Some("Old"));
    }

    #[test]
    fn test_import_type_update_skips_missing() {
        let mut instance = Instance::new(vec![account_defs()]);
        instance
            .store
            .insert("Account", row(json!({"id": "1", "name": "Old", "deleted": false})));
        let reporter = MemoryReporter::new();
        let params = ImportParams::new("Account").with_import_type(ImportType::Update);

        let result = import(
            &mut instance,
            &params,
            &[json!({"id": "1", "name": "New"}), json!({"id": "2", "name": "Beta"})],
            &reporter,
        );

        assert_eq!(result.success_count, 1);
        assert_eq!(result.skip_count, 1);
        assert!(instance.store.get_by_id("Account", "2", true).unwrap().is_none());
    }

    #[test]
    fn test_soft_deleted_record_is_recreated() {
        let mut instance = Instance::new(vec![account_defs()]);
        instance.store.insert(
            "Account",
            row(json!({"id": "1", "name": "Gone", "extra": "stale", "deleted": true})),
        );
        let reporter = MemoryReporter::new();

        let result = import(
            &mut instance,
            &ImportParams::new("Account").with_import_type(ImportType::Create),
            &[json!({"id": "1", "name": "Back"})],
            &reporter,
        );

        assert_eq!(result.success_count, 1);
        let stored = instance.store.get_by_id("Account", "1", false).unwrap().unwrap();
        assert_eq!(stored.get_str("name"), Some("Back"));
        assert!(!stored.has("extra"));
    }

    #[test]
    fn test_update_only_import_keeps_soft_deleted_record() {
        let mut instance = Instance::new(vec![account_defs()]);
        instance
            .store
            .insert("Account", row(json!({"id": "1", "name": "Gone", "deleted": true})));
        let reporter = MemoryReporter::new();

        let result = import(
            &mut instance,
            &ImportParams::new("Account").with_import_type(ImportType::Update),
            &[json!({"id": "1", "name": "Back"})],
            &reporter,
        );

        assert_eq!(result.success_count, 0);
        assert_eq!(result.skip_count, 1);
        let stored = instance.store.get_by_id("Account", "1", true).unwrap().unwrap();
        assert!(stored.is_deleted());
        assert_eq!(stored.get_str("name"), Some("Gone"));
    }

    fn log_defs() -> EntityDefs {
        let mut defs = EntityDefs::new("Log");
        defs.id_autoincrement = true;
        defs.attributes = vec![
            AttributeDefs::new("id", AttributeType::Id),
            AttributeDefs::new("message", AttributeType::Varchar),
        ];
        defs
    }

    #[test]
    fn test_autoincrement_ids_keep_their_type() {
        let mut instance = Instance::new(vec![log_defs()]);
        let reporter = MemoryReporter::new();

        let result = import(
            &mut instance,
            &ImportParams::new("Log"),
            &[json!({"id": 5, "message": "x"})],
            &reporter,
        );
        assert_eq!(result.success_count, 1);
        assert_eq!(instance.store.rows("Log")[0]["id"], json!(5));

        let mut ctx = instance.context();
        let mut entity = ctx.entity_manager.new_entity("Log");
        entity.set("message", json!("new"));
        ctx.entity_manager.save(&mut entity, SaveOptions::default()).unwrap();
        assert_eq!(entity.get("id"), Some(&json!(6)));
    }

    fn user_defs() -> EntityDefs {
        let mut defs = EntityDefs::new("User");
        defs.attributes = vec![
            AttributeDefs::new("id", AttributeType::Id),
            AttributeDefs::new("userName", AttributeType::Varchar),
        ];
        defs
    }

    #[test]
    fn test_failures_do_not_stop_the_loop() {
        let mut instance = Instance::new(vec![user_defs()]);
        instance
            .store
            .insert("User", row(json!({"id": "live", "userName": "admin", "deleted": false})));

        // Without the user hook the second row collides with the live user's ID
        let processors = AttributeProcessorRegistry::import_defaults();
        let hooks = ImportHooks::new();
        let reporter = MemoryReporter::new();
        let mut ids = IdReplacer::with_default_delimiters(IdMap::new()).unwrap();
        let mut ctx = instance.context();

        let result = EntityImport::new(&processors, &hooks, &reporter)
            .run(
                &mut ctx,
                &ImportParams::new("User"),
                &mut stream(&[
                    json!({"id": "a", "userName": "first"}),
                    json!({"id": "b", "userName": "admin"}),
                    json!({"id": "c", "userName": "second"}),
                ]),
                &mut ids,
            )
            .unwrap();

        assert_eq!(result.success_count, 2);
        assert_eq!(result.fail_count, 1);
        assert_eq!(reporter.row_errors(), 1);
    }

    #[test]
    fn test_import_row_unknown_entity_type_fails() {
        let mut instance = Instance::new(vec![account_defs()]);
        let processors = AttributeProcessorRegistry::import_defaults();
        let hooks = ImportHooks::new();
        let reporter = MemoryReporter::new();
        let mut ids = IdReplacer::with_default_delimiters(IdMap::new()).unwrap();
        let mut ctx = instance.context();

        let importer = EntityImport::new(&processors, &hooks, &reporter);
        let outcome = importer.import_row(&mut ctx, &ImportParams::new("Nope"), &mut ids, Row::new());
        assert!(matches!(outcome, RowOutcome::Failed(_)));
    }

    #[test]
    fn test_join_records_resolve_by_foreign_keys() {
        let mut instance = Instance::new(vec![join_defs()]);
        instance.store.insert(
            "AccountContact",
            row(json!({"id": "live", "accountId": "a", "contactId": "c", "role": "old", "deleted": false})),
        );
        let reporter = MemoryReporter::new();

        let result = import(
            &mut instance,
            &ImportParams::new("AccountContact"),
            &[json!({"id": "bundle", "accountId": "a", "contactId": "c", "role": "new"})],
            &reporter,
        );

        assert_eq!(result.success_count, 1);
        assert_eq!(instance.store.rows("AccountContact").len(), 1);
        let stored = instance.store.get_by_id("AccountContact", "live", false).unwrap().unwrap();
        assert_eq!(stored.get_str("role"), Some("new"));
    }

    #[test]
    fn test_duplicate_user_name_is_skipped_and_mapped() {
        let mut instance = Instance::new(vec![user_defs()]);
        instance
            .store
            .insert("User", row(json!({"id": "live", "userName": "admin", "deleted": false})));

        let processors = AttributeProcessorRegistry::new();
        let hooks = ImportHooks::import_defaults();
        let reporter = MemoryReporter::new();
        let mut ids = IdReplacer::with_default_delimiters(IdMap::new()).unwrap();
        let mut ctx = instance.context();

        let result = EntityImport::new(&processors, &hooks, &reporter)
            .run(
                &mut ctx,
                &ImportParams::new("User"),
                &mut stream(&[json!({"id": "bundle", "userName": "admin"})]),
                &mut ids,
            )
            .unwrap();

        assert_eq!(result.skip_count, 1);
        assert_eq!(ids.id_map().get("User", "bundle"), Some("live"));
        assert_eq!(instance.store.rows("User").len(), 1);
    }

    #[test]
    fn test_custom_entity_warning() {
        let mut defs = account_defs();
        defs.is_custom = true;
        let mut instance = Instance::new(vec![defs]);
        let reporter = MemoryReporter::new();

        let result = import(&mut instance, &ImportParams::new("Account"), &[], &reporter);
        assert_eq!(result.warnings.len(), 1);

        let result = import(
            &mut instance,
            &ImportParams::new("Account").with_customization(true),
            &[],
            &reporter,
        );
        assert!(result.warnings.is_empty());
    }
}
