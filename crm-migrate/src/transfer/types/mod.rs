//! Core types for data transfer

mod hooks;
mod manifest;
mod outcome;
mod row;
mod stream;

pub use hooks::*;
pub use manifest::*;
pub use outcome::*;
pub use row::*;
pub use stream::*;
