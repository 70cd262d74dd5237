use serde_json::Value;

use super::{AttributeParams, AttributeProcessor};
use crate::error::Result;
use crate::host::{AttributeType, HostContext};
use crate::transfer::Row;
use crate::transfer::id_mapping::IdReplacer;

/// Currency amounts: optionally force the currency code
pub struct CurrencyProcessor;

impl AttributeProcessor for CurrencyProcessor {
    fn process(
        &self,
        ctx: &HostContext<'_>,
        params: &AttributeParams,
        _ids: &mut IdReplacer,
        row: &mut Row,
        attribute: &str,
    ) -> Result<()> {
        if !params.update_currency {
            return Ok(());
        }
        let defs = ctx.entity_defs(&params.entity_type)?;
        let is_amount = defs
            .attribute(attribute)
            .is_some_and(|a| a.attribute_type == AttributeType::Float);
        if !is_amount {
            return Ok(());
        }

        let currency = params
            .currency
            .clone()
            .unwrap_or_else(|| ctx.config.default_currency());
        row.insert(format!("{}Currency", attribute), Value::String(currency));
        Ok(())
    }
}
