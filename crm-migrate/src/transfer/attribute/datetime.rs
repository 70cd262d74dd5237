use serde_json::Value;

use super::{AttributeParams, AttributeProcessor};
use crate::error::Result;
use crate::host::HostContext;
use crate::transfer::id_mapping::IdReplacer;
use crate::transfer::{Row, now_string};

/// Datetimes: optionally make imported records look freshly created
pub struct DatetimeProcessor;

impl AttributeProcessor for DatetimeProcessor {
    fn process(
        &self,
        _ctx: &HostContext<'_>,
        params: &AttributeParams,
        _ids: &mut IdReplacer,
        row: &mut Row,
        attribute: &str,
    ) -> Result<()> {
        if params.update_created_at && attribute == "createdAt" {
            row.insert(attribute.to_string(), Value::String(now_string()));
        }
        Ok(())
    }
}
