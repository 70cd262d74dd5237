//! Record-level export, import and compare pipeline

pub mod attribute;
pub mod bundle;
pub mod compare;
pub mod export;
pub mod format;
pub mod id_mapping;
pub mod import;
pub mod placeholder;
pub mod runner;
pub mod types;

pub use bundle::Bundle;
pub use placeholder::PlaceholderAction;
pub use types::*;
