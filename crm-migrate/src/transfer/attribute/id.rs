//! ID processors

use serde_json::Value;

use super::{AttributeParams, AttributeProcessor};
use crate::error::Result;
use crate::host::{Filter, HostContext, Query};
use crate::transfer::id_mapping::IdReplacer;
use crate::transfer::{Row, row_id};

/// Import: users are matched by user name
///
/// When a live user with the same user name has another ID, the row takes
/// the live ID and the mapping is recorded for later rows.
pub struct ImportIdProcessor;

impl AttributeProcessor for ImportIdProcessor {
    fn process(
        &self,
        ctx: &HostContext<'_>,
        params: &AttributeParams,
        ids: &mut IdReplacer,
        row: &mut Row,
        attribute: &str,
    ) -> Result<()> {
        if params.entity_type != "User" || attribute != "id" {
            return Ok(());
        }
        let (Some(bundle_id), Some(user_name)) = (row_id(row), row.get("userName").cloned()) else {
            return Ok(());
        };
        if user_name.is_null() {
            return Ok(());
        }

        let query = Query::new("User").filter(Filter::Eq("userName".into(), user_name));
        let Some(live_id) = ctx.entity_manager.find_one(&query)?.and_then(|e| e.id()) else {
            return Ok(());
        };

        if live_id != bundle_id {
            row.insert("id".into(), Value::String(live_id.clone()));
            ids.add_mapping("User", &bundle_id, &live_id)?;
        }
        Ok(())
    }
}

/// Compare: IDs go through the mapping; autoincrement IDs are not compared
pub struct CompareIdProcessor;

impl AttributeProcessor for CompareIdProcessor {
    fn process(
        &self,
        ctx: &HostContext<'_>,
        params: &AttributeParams,
        ids: &mut IdReplacer,
        row: &mut Row,
        attribute: &str,
    ) -> Result<()> {
        if attribute != "id" {
            return Ok(());
        }

        if ctx.entity_defs(&params.entity_type)?.id_autoincrement {
            row.remove("id");
            return Ok(());
        }

        if let Some(Value::String(id)) = row.get_mut("id") {
            if let Some(live_id) = ids.replace_value(&params.entity_type, id) {
                *id = live_id;
            }
        }
        Ok(())
    }
}
