//! Test utilities for the vindex crates.
//!
//! This crate provides stand-ins for the collaborators of a lookup vindex:
//! - [`MemoryLookupTable`]: an in-memory lookup delegate
//! - [`RecordingCursor`]: an execution cursor that records statements and replays
//!   canned results
//!
//! It is intended for use in tests only.

pub mod cursor;
pub mod memory_table;

pub use cursor::{RecordingCursor, Statement};
pub use memory_table::{InitArgs, MemoryLookupTable};
