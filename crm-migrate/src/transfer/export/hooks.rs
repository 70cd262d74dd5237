//! Export hooks

use crate::error::Result;
use crate::host::{Entity, HostContext};
use crate::transfer::{HookRegistry, ProcessOutcome, Row};

/// Per entity type customization of exported rows
pub trait ExportHook {
    /// Load values needed by computed attributes before extraction
    fn load_additional_fields(&self, _ctx: &HostContext<'_>, _entity: &mut Entity) -> Result<()> {
        Ok(())
    }

    /// Inspect or alter the row; `Skip` leaves it out of the export
    fn process(&self, ctx: &HostContext<'_>, entity: &Entity, row: &mut Row) -> Result<ProcessOutcome>;
}

pub type ExportHooks = HookRegistry<dyn ExportHook>;

impl HookRegistry<dyn ExportHook> {
    /// Hooks used by the exporter
    pub fn export_defaults() -> Self {
        let mut hooks = Self::new();
        hooks.register("User", Box::new(UserExportHook));
        hooks
    }
}

/// System users belong to the instance and are never exported
pub struct UserExportHook;

impl ExportHook for UserExportHook {
    fn process(&self, _ctx: &HostContext<'_>, entity: &Entity, _row: &mut Row) -> Result<ProcessOutcome> {
        if entity.get_str("type") == Some("system") {
            return Ok(ProcessOutcome::skip("system user"));
        }
        Ok(ProcessOutcome::Continue)
    }
}
