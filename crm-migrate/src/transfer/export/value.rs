//! Attribute selection and type-aware value extraction

use serde_json::Value;

use super::ExportParams;
use crate::error::Result;
use crate::host::{
    AttributeDefs, AttributeType, Entity, EntityDefs, HostContext, Metadata, RelationType,
};
use crate::transfer::Row;

/// Field types whose non-storable attributes are projections in all-fields mode
const PROJECTION_FIELD_TYPES: [&str; 3] = ["jsonArray", "jsonObject", "linkParent"];

const MAX_FOREIGN_DEPTH: usize = 5;

/// Attributes to export, in metadata order
pub fn select_attributes<'d>(
    ctx: &HostContext<'_>,
    defs: &'d EntityDefs,
    params: &ExportParams,
) -> Vec<&'d AttributeDefs> {
    let forbidden = if params.access_control() {
        ctx.acl.scope_forbidden_attribute_list(&defs.name, "read")
    } else {
        Vec::new()
    };

    defs.attributes
        .iter()
        .filter(|a| !forbidden.contains(&a.name))
        .filter(|a| match (params.attribute_list(), params.field_list()) {
            (Some(list), _) => list.contains(&a.name),
            (None, Some(fields)) => {
                a.name == "id" || fields.contains(a.field.as_ref().unwrap_or(&a.name))
            }
            (None, None) => is_exportable(defs, a, params.export_all_fields()),
        })
        .collect()
}

fn is_exportable(defs: &EntityDefs, attribute: &AttributeDefs, all_fields: bool) -> bool {
    if attribute.not_exportable || defs.field_of(attribute).is_some_and(|f| f.export_disabled) {
        return false;
    }
    if attribute.is_link_multiple()
        || attribute.is_link_stub
        || attribute.attribute_type == AttributeType::Foreign
    {
        return false;
    }
    if !attribute.not_storable {
        return true;
    }
    all_fields
        && !defs
            .field_type_of(attribute)
            .is_some_and(|t| PROJECTION_FIELD_TYPES.contains(&t))
}

/// Storage type of an attribute, following `foreign` attributes to their source
pub fn effective_type(metadata: &dyn Metadata, defs: &EntityDefs, attribute: &AttributeDefs) -> AttributeType {
    let mut defs = defs;
    let mut attribute = attribute;

    for _ in 0..MAX_FOREIGN_DEPTH {
        if attribute.attribute_type != AttributeType::Foreign {
            return attribute.attribute_type;
        }
        let Some((foreign_defs, foreign_attribute)) = follow_foreign(metadata, defs, attribute) else {
            break;
        };
        defs = foreign_defs;
        attribute = foreign_attribute;
    }
    AttributeType::Foreign
}

fn follow_foreign<'m>(
    metadata: &'m dyn Metadata,
    defs: &EntityDefs,
    attribute: &AttributeDefs,
) -> Option<(&'m EntityDefs, &'m AttributeDefs)> {
    let foreign = attribute.foreign.as_ref()?;
    let entity_type = defs.relation(&foreign.relation)?.entity.as_deref()?;
    let foreign_defs = metadata.entity_defs(entity_type)?;
    let foreign_attribute = foreign_defs.attribute(&foreign.attribute)?;
    Some((foreign_defs, foreign_attribute))
}

/// Exported value of one attribute
pub fn extract_value(
    ctx: &HostContext<'_>,
    defs: &EntityDefs,
    attribute: &AttributeDefs,
    entity: &Entity,
    clear_password: bool,
) -> Result<Value> {
    let value = match entity.get(&attribute.name) {
        Some(value) => value.clone(),
        None if attribute.attribute_type == AttributeType::Foreign => {
            load_foreign_value(ctx, defs, attribute, entity)?.unwrap_or(Value::Null)
        }
        None => Value::Null,
    };

    let value = match effective_type(ctx.metadata, defs, attribute) {
        AttributeType::JsonArray | AttributeType::JsonObject
            if !attribute.is_link_multiple() && !value.is_null() && !value.is_string() =>
        {
            Value::String(serde_json::to_string(&value)?)
        }
        AttributeType::Password if clear_password => Value::Null,
        _ => value,
    };
    Ok(value)
}

/// Exported row of one entity
///
/// Null values of compactable types are left out.
pub fn export_row(
    ctx: &HostContext<'_>,
    defs: &EntityDefs,
    attributes: &[&AttributeDefs],
    entity: &Entity,
    clear_password: bool,
) -> Result<Row> {
    let mut row = Row::new();
    for attribute in attributes {
        let value = extract_value(ctx, defs, attribute, entity, clear_password)?;
        if value.is_null() && effective_type(ctx.metadata, defs, attribute).is_compactable() {
            continue;
        }
        row.insert(attribute.name.clone(), value);
    }
    Ok(row)
}

/// Value of a `foreign` attribute read through its belongsTo relation
fn load_foreign_value(
    ctx: &HostContext<'_>,
    defs: &EntityDefs,
    attribute: &AttributeDefs,
    entity: &Entity,
) -> Result<Option<Value>> {
    let Some(foreign) = attribute.foreign.as_ref() else {
        return Ok(None);
    };
    let Some(relation) = defs.relation(&foreign.relation) else {
        return Ok(None);
    };
    if relation.relation_type != RelationType::BelongsTo {
        return Ok(None);
    }
    let (Some(entity_type), Some(key)) = (
        relation.entity.as_deref(),
        relation.key.clone().or_else(|| Some(format!("{}Id", relation.name))),
    ) else {
        return Ok(None);
    };
    let Some(foreign_id) = entity.get_str(&key) else {
        return Ok(None);
    };

    Ok(ctx
        .entity_manager
        .get_by_id(entity_type, foreign_id, false)?
        .and_then(|e| e.get(&foreign.attribute).cloned()))
}
