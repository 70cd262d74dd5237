//! Attribute processors
//!
//! Per-type transforms run on every row during import and compare. The
//! registry is keyed by a type tag: the attribute's field type is tried
//! first, then the attribute type. Types without a processor are left alone.

mod currency;
mod datetime;
mod id;

use std::collections::HashMap;

pub use currency::CurrencyProcessor;
pub use datetime::DatetimeProcessor;
pub use id::{CompareIdProcessor, ImportIdProcessor};

use super::Row;
use super::id_mapping::IdReplacer;
use crate::error::Result;
use crate::host::HostContext;

/// Options every attribute processor can read
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeParams {
    pub entity_type: String,
    /// Set `<attribute>Currency` on currency amounts
    pub update_currency: bool,
    /// Currency code to set; the instance default when absent
    pub currency: Option<String>,
    /// Overwrite `createdAt` with the current time
    pub update_created_at: bool,
}

impl AttributeParams {
    pub fn new(entity_type: impl Into<String>) -> Self {
        AttributeParams {
            entity_type: entity_type.into(),
            ..Default::default()
        }
    }
}

/// A transform for one attribute type
pub trait AttributeProcessor {
    /// Mutate `row` for `attribute`; `ids` may learn new mappings
    fn process(
        &self,
        ctx: &HostContext<'_>,
        params: &AttributeParams,
        ids: &mut IdReplacer,
        row: &mut Row,
        attribute: &str,
    ) -> Result<()>;
}

/// Type tag to processor table
#[derive(Default)]
pub struct AttributeProcessorRegistry {
    processors: HashMap<String, Box<dyn AttributeProcessor>>,
}

impl AttributeProcessorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Processors run on import
    pub fn import_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("id", ImportIdProcessor);
        registry.register("currency", CurrencyProcessor);
        registry.register("datetime", DatetimeProcessor);
        registry
    }

    /// Processors run on compare
    pub fn compare_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("id", CompareIdProcessor);
        registry
    }

    pub fn register(&mut self, tag: impl Into<String>, processor: impl AttributeProcessor + 'static) {
        self.processors.insert(tag.into(), Box::new(processor));
    }

    pub fn get(&self, tag: &str) -> Option<&dyn AttributeProcessor> {
        self.processors.get(tag).map(|p| p.as_ref())
    }

    /// Run the matching processor for every attribute present in the row
    pub fn process_row(
        &self,
        ctx: &HostContext<'_>,
        params: &AttributeParams,
        ids: &mut IdReplacer,
        row: &mut Row,
    ) -> Result<()> {
        let defs = ctx.entity_defs(&params.entity_type)?;
        let attributes: Vec<String> = row.keys().cloned().collect();

        for attribute in attributes {
            let Some(attribute_defs) = defs.attribute(&attribute) else {
                continue;
            };
            let processor = defs
                .field_type_of(attribute_defs)
                .and_then(|tag| self.get(tag))
                .or_else(|| self.get(attribute_defs.attribute_type.tag()));

            if let Some(processor) = processor {
                processor.process(ctx, params, ids, row, &attribute)?;
            }
        }
        Ok(())
    }
}
