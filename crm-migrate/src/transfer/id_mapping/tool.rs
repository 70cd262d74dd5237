//! Natural-key probing that builds the [`IdMap`] for a bundle
//!
//! A handful of identity-bearing entity types are matched against the live
//! instance by a natural key instead of by ID. When the live record has a
//! different ID, the bundle ID is mapped to it.

use super::IdMap;
use crate::error::Result;
use crate::host::{Filter, HostContext, Query};
use crate::transfer::format::Format;
use crate::transfer::{Bundle, Row, row_id};

/// Resolves bundle rows of one entity type to live IDs
pub trait CollectionProcessor {
    fn entity_type(&self) -> &'static str;

    /// Live ID the row corresponds to, if exactly one live record matches
    fn resolve(&self, ctx: &HostContext<'_>, id_map: &IdMap, row: &Row) -> Result<Option<String>>;
}

/// Match on a set of attributes that together identify a record
pub struct NaturalKeyProcessor {
    entity_type: &'static str,
    keys: &'static [&'static str],
}

impl NaturalKeyProcessor {
    pub const fn new(entity_type: &'static str, keys: &'static [&'static str]) -> Self {
        NaturalKeyProcessor { entity_type, keys }
    }
}

impl CollectionProcessor for NaturalKeyProcessor {
    fn entity_type(&self) -> &'static str {
        self.entity_type
    }

    fn resolve(&self, ctx: &HostContext<'_>, _id_map: &IdMap, row: &Row) -> Result<Option<String>> {
        let mut query = Query::new(self.entity_type);
        for key in self.keys {
            match row.get(*key) {
                Some(value) if !value.is_null() => {
                    query = query.filter(Filter::Eq(key.to_string(), value.clone()));
                }
                _ => return Ok(None),
            }
        }
        unique_match(ctx, query)
    }
}

/// Preferences share the ID of their user
pub struct PreferencesProcessor;

impl CollectionProcessor for PreferencesProcessor {
    fn entity_type(&self) -> &'static str {
        "Preferences"
    }

    fn resolve(&self, _ctx: &HostContext<'_>, id_map: &IdMap, row: &Row) -> Result<Option<String>> {
        Ok(row_id(row)
            .and_then(|id| id_map.get("User", &id))
            .map(str::to_string))
    }
}

/// ID of the only live record matching a query
fn unique_match(ctx: &HostContext<'_>, query: Query) -> Result<Option<String>> {
    let mut matches = ctx.entity_manager.find(&query.limit(2))?;
    let first = matches.next().transpose()?;
    let second = matches.next().transpose()?;
    match (first, second) {
        (Some(entity), None) => Ok(entity.id()),
        _ => Ok(None),
    }
}

/// Ordered set of collection processors
pub struct IdMappingTool {
    processors: Vec<Box<dyn CollectionProcessor>>,
}

impl Default for IdMappingTool {
    fn default() -> Self {
        IdMappingTool {
            processors: vec![
                Box::new(NaturalKeyProcessor::new("User", &["userName"])),
                Box::new(PreferencesProcessor),
                Box::new(NaturalKeyProcessor::new("ScheduledJob", &["job", "status"])),
                Box::new(NaturalKeyProcessor::new("CurrencyRecord", &["code", "status"])),
            ],
        }
    }
}

impl IdMappingTool {
    /// Probe every identity-bearing entity file of the bundle
    pub fn build(&self, ctx: &HostContext<'_>, bundle: &Bundle, format: &dyn Format) -> Result<IdMap> {
        let mut id_map = IdMap::new();

        for processor in &self.processors {
            let entity_type = processor.entity_type();
            if ctx.metadata.entity_defs(entity_type).is_none() {
                continue;
            }
            let Some(mut stream) = bundle.read_entity(entity_type, format)? else {
                continue;
            };

            stream.rewind()?;
            while let Some(row) = stream.read()? {
                let Some(bundle_id) = row_id(&row) else {
                    continue;
                };
                match processor.resolve(ctx, &id_map, &row) {
                    Ok(Some(live_id)) => {
                        id_map.add(entity_type, &bundle_id, &live_id);
                    }
                    Ok(None) => {}
                    Err(e) => {
                        log::warn!("Could not resolve {} '{}': {}", entity_type, bundle_id, e);
                    }
                }
            }
        }

        if !id_map.is_empty() {
            log::info!("Built ID mapping with {} entries", id_map.len());
        }
        Ok(id_map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{AttributeDefs, AttributeType, EntityDefs, EntityManager, Instance};
    use crate::transfer::RowStream;
    use crate::transfer::format::JsonFormat;
    use serde_json::{Value, json};

    fn defs(name: &str, attributes: &[(&str, AttributeType)]) -> EntityDefs {
        let mut defs = EntityDefs::new(name);
        defs.attributes = attributes
            .iter()
            .map(|(n, t)| AttributeDefs::new(*n, *t))
            .collect();
        defs
    }

    fn row(value: Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    fn write_bundle_file(bundle: &Bundle, entity_type: &str, rows: &[Value]) {
        let mut stream = RowStream::new().unwrap();
        for r in rows {
            stream.write(&row(r.clone())).unwrap();
        }
        JsonFormat
            .write_file(&mut stream, &bundle.entity_file(entity_type, &JsonFormat), false)
            .unwrap();
    }

    fn instance() -> Instance {
        let mut instance = Instance::new(vec![
            defs("User", &[("id", AttributeType::Id), ("userName", AttributeType::Varchar)]),
            defs("Preferences", &[("id", AttributeType::Id)]),
            defs(
                "ScheduledJob",
                &[
                    ("id", AttributeType::Id),
                    ("job", AttributeType::Varchar),
                    ("status", AttributeType::Varchar),
                ],
            ),
        ]);
        instance
            .store
            .insert("User", row(json!({"id": "live-admin", "userName": "admin", "deleted": false})));
        instance
            .store
            .insert("User", row(json!({"id": "same", "userName": "same", "deleted": false})));
        instance.store.insert(
            "ScheduledJob",
            row(json!({"id": "live-job", "job": "Cleanup", "status": "Active", "deleted": false})),
        );
        instance.store.insert(
            "ScheduledJob",
            row(json!({"id": "dup-1", "job": "Dup", "status": "Active", "deleted": false})),
        );
        instance.store.insert(
            "ScheduledJob",
            row(json!({"id": "dup-2", "job": "Dup", "status": "Active", "deleted": false})),
        );
        instance
    }

    #[test]
    fn test_build_maps_natural_keys() {
        let dir = tempfile::tempdir().unwrap();
        let bundle = Bundle::new(dir.path());
        write_bundle_file(
            &bundle,
            "User",
            &[
                json!({"id": "b-admin", "userName": "admin"}),
                json!({"id": "same", "userName": "same"}),
                json!({"id": "b-new", "userName": "newcomer"}),
            ],
        );
        write_bundle_file(&bundle, "Preferences", &[json!({"id": "b-admin"}), json!({"id": "b-new"})]);
        write_bundle_file(
            &bundle,
            "ScheduledJob",
            &[
                json!({"id": "b-job", "job": "Cleanup", "status": "Active"}),
                json!({"id": "b-dup", "job": "Dup", "status": "Active"}),
                json!({"id": "b-inactive", "job": "Cleanup", "status": "Inactive"}),
            ],
        );

        let mut instance = instance();
        let ctx = instance.context();
        let id_map = IdMappingTool::default().build(&ctx, &bundle, &JsonFormat).unwrap();

        assert_eq!(id_map.get("User", "b-admin"), Some("live-admin"));
        assert_eq!(id_map.get("User", "same"), None);
        assert_eq!(id_map.get("User", "b-new"), None);
        assert_eq!(id_map.get("Preferences", "b-admin"), Some("live-admin"));
        assert_eq!(id_map.get("Preferences", "b-new"), None);
        assert_eq!(id_map.get("ScheduledJob", "b-job"), Some("live-job"));
        assert_eq!(id_map.get("ScheduledJob", "b-dup"), None);
        assert_eq!(id_map.get("ScheduledJob", "b-inactive"), None);
        assert_eq!(id_map.len(), 3);
    }

    #[test]
    fn test_build_without_files() {
        let dir = tempfile::tempdir().unwrap();
        let bundle = Bundle::new(dir.path());
        let mut instance = instance();
        let ctx = instance.context();
        let id_map = IdMappingTool::default().build(&ctx, &bundle, &JsonFormat).unwrap();
        assert!(id_map.is_empty());
    }

    #[test]
    fn test_deleted_users_do_not_match() {
        let mut instance = instance();
        let mut admin = instance
            .store
            .get_by_id("User", "live-admin", false)
            .unwrap()
            .unwrap();
        instance
            .store
            .remove(&mut admin, crate::host::SaveOptions::default())
            .unwrap();

        let ctx = instance.context();
        let processor = NaturalKeyProcessor::new("User", &["userName"]);
        let resolved = processor
            .resolve(&ctx, &IdMap::new(), &row(json!({"id": "b", "userName": "admin"})))
            .unwrap();
        assert_eq!(resolved, None);
    }
}
