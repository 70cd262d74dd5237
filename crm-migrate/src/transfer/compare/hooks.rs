//! Compare hooks

use crate::error::Result;
use crate::host::{Entity, HostContext};
use crate::transfer::{HookRegistry, ProcessOutcome, Row};

/// Per entity type filter applied before a row is compared
pub trait CompareHook {
    fn process(&self, ctx: &HostContext<'_>, entity: &Entity, row: &Row) -> Result<ProcessOutcome>;
}

pub type CompareHooks = HookRegistry<dyn CompareHook>;

impl HookRegistry<dyn CompareHook> {
    /// Hooks used by the comparer
    pub fn compare_defaults() -> Self {
        let mut hooks = Self::new();
        hooks.register("User", Box::new(UserCompareHook));
        hooks
    }
}

/// System users differ per instance and are never compared
pub struct UserCompareHook;

impl CompareHook for UserCompareHook {
    fn process(&self, _ctx: &HostContext<'_>, entity: &Entity, _row: &Row) -> Result<ProcessOutcome> {
        if entity.get_str("type") == Some("system") {
            return Ok(ProcessOutcome::skip("system user"));
        }
        Ok(ProcessOutcome::Continue)
    }
}
