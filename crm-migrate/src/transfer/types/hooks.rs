//! Per entity type hook tables

use std::collections::HashMap;

/// Hooks keyed by entity type
///
/// `H` is a hook trait object, e.g. `dyn ExportHook`.
pub struct HookRegistry<H: ?Sized> {
    hooks: HashMap<String, Box<H>>,
}

impl<H: ?Sized> Default for HookRegistry<H> {
    fn default() -> Self {
        HookRegistry {
            hooks: HashMap::new(),
        }
    }
}

impl<H: ?Sized> HookRegistry<H> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, entity_type: impl Into<String>, hook: Box<H>) {
        self.hooks.insert(entity_type.into(), hook);
    }

    pub fn get(&self, entity_type: &str) -> Option<&H> {
        self.hooks.get(entity_type).map(|h| h.as_ref())
    }

    pub fn contains(&self, entity_type: &str) -> bool {
        self.hooks.contains_key(entity_type)
    }
}

impl<H: ?Sized> std::fmt::Debug for HookRegistry<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut entity_types: Vec<&String> = self.hooks.keys().collect();
        entity_types.sort();
        f.debug_struct("HookRegistry")
            .field("entity_types", &entity_types)
            .finish()
    }
}
