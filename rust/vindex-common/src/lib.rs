//! Core definitions (error type, result alias and validation macros), relied upon
//! by all vindex-* crates.

pub mod error;
pub mod result;

pub use result::Result;
