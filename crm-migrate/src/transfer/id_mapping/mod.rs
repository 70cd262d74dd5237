//! ID mapping between a bundle and a live instance

mod map;
mod relation;
mod replacer;
mod tool;

pub use map::IdMap;
pub use relation::Relation;
pub use replacer::{DEFAULT_DELIMITERS, IdReplacer};
pub use tool::{CollectionProcessor, IdMappingTool, NaturalKeyProcessor, PreferencesProcessor};
