//! Import hooks

use crate::error::Result;
use crate::host::{Entity, Filter, HostContext, Query};
use crate::transfer::id_mapping::IdReplacer;
use crate::transfer::{HookRegistry, ProcessOutcome};

/// Last look at an entity before it is saved
pub trait ImportHook {
    fn process(
        &self,
        ctx: &HostContext<'_>,
        entity: &mut Entity,
        ids: &mut IdReplacer,
    ) -> Result<ProcessOutcome>;
}

pub type ImportHooks = HookRegistry<dyn ImportHook>;

impl HookRegistry<dyn ImportHook> {
    /// Hooks used by the importer
    pub fn import_defaults() -> Self {
        let mut hooks = Self::new();
        hooks.register("User", Box::new(UserImportHook));
        hooks
    }
}

/// A new user whose user name is taken is not created again
///
/// The bundle ID is mapped to the existing user so references still resolve.
pub struct UserImportHook;

impl ImportHook for UserImportHook {
    fn process(
        &self,
        ctx: &HostContext<'_>,
        entity: &mut Entity,
        ids: &mut IdReplacer,
    ) -> Result<ProcessOutcome> {
        if !entity.is_new() {
            return Ok(ProcessOutcome::Continue);
        }
        let Some(user_name) = entity.get("userName").filter(|v| !v.is_null()).cloned() else {
            return Ok(ProcessOutcome::Continue);
        };

        let query = Query::new("User").filter(Filter::Eq("userName".into(), user_name.clone()));
        let Some(existing) = ctx.entity_manager.find_one(&query)? else {
            return Ok(ProcessOutcome::Continue);
        };

        if let (Some(bundle_id), Some(live_id)) = (entity.id(), existing.id()) {
            ids.add_mapping("User", &bundle_id, &live_id)?;
        }
        Ok(ProcessOutcome::skip(format!(
            "user name {} already exists",
            user_name
        )))
    }
}
