//! Core vindex infrastructure for the sharded query router.
//!
//! A vindex maps application column values to keyspace ids, the opaque keys the
//! router uses to pick shards. This crate provides the traits every vindex
//! implements, the value and keyspace-id types flowing through them, the
//! execution-context contract, and an explicit registry of vindex factories.
//!
//! # Overview
//!
//! The capabilities of a vindex are split across several traits:
//!
//! - [`Vindex`]: identity, planner cost, verification and introspection
//! - [`Unique`]: maps every input to at most one keyspace id
//! - [`NonUnique`]: maps every input to any number of keyspace ids, or to a
//!   keyspace range when the mapping cannot be resolved
//! - [`Lookup`]: keeps a backing lookup table in sync with base-table writes
//!
//! A concrete vindex is either [`Unique`] or [`NonUnique`], never both, so the
//! shape returned by `map` is fixed by the type. Vindexes created through the
//! [`registry`] are returned as a [`VindexHandle`] that preserves this distinction.

use std::fmt;
use std::sync::Arc;

use vindex_common::Result;

pub mod config;
pub mod cursor;
pub mod keyspace_id;
pub mod registry;
pub mod value;

pub use config::VindexConfig;
pub use cursor::{BindVars, CommitOrder, QueryResult, VCursor};
pub use keyspace_id::{KeyRange, Ksid, Ksids};
pub use registry::Registry;
pub use value::{Value, ValueType};

/// Functionality shared by all vindexes.
///
/// # Thread Safety
///
/// Vindexes are shared across concurrent router requests via `Arc` and must be
/// `Send + Sync`. All operations take `&self`.
pub trait Vindex: Send + Sync + 'static {
    /// Returns the configured name of this vindex instance.
    fn name(&self) -> &str;

    /// Returns the relative cost of using this vindex.
    ///
    /// The planner prefers the cheapest usable vindex. The value is a per-type
    /// constant.
    fn cost(&self) -> u32;

    /// Checks whether each `ids[i]` currently maps to `ksids[i]`.
    ///
    /// The result is positionally aligned with `ids`.
    fn verify(&self, cursor: &dyn VCursor, ids: &[Value], ksids: &[Ksid]) -> Result<Vec<bool>>;

    /// Returns a structural snapshot of the vindex configuration.
    fn to_json(&self) -> Result<serde_json::Value>;
}

/// A vindex that maps every input value to at most one keyspace id.
pub trait Unique: Vindex {
    /// Maps each input to its keyspace id, or `None` if the value is unknown.
    fn map(&self, cursor: &dyn VCursor, ids: &[Value]) -> Result<Vec<Option<Ksid>>>;
}

/// A vindex that maps an input value to zero or more keyspace ids.
pub trait NonUnique: Vindex {
    /// Maps each input to the keyspace ids it lives at.
    fn map(&self, cursor: &dyn VCursor, ids: &[Value]) -> Result<Vec<Ksids>>;
}

/// A vindex backed by a lookup table that must be kept consistent with the
/// base table on every write.
pub trait Lookup: Vindex {
    /// Inserts lookup entries for newly written base-table rows.
    ///
    /// `rows[i]` holds the "from" column values of the i-th row and `ksids[i]` its
    /// keyspace id. With `ignore_mode`, conflicting entries are skipped instead of
    /// failing the statement.
    fn create(
        &self,
        cursor: &dyn VCursor,
        rows: &[Vec<Value>],
        ksids: &[Ksid],
        ignore_mode: bool,
    ) -> Result<()>;

    /// Re-points the entry for `old_values` at `ksid` to `new_values`.
    fn update(
        &self,
        cursor: &dyn VCursor,
        old_values: &[Value],
        ksid: &[u8],
        new_values: &[Value],
    ) -> Result<()>;

    /// Removes the lookup entries of a deleted base-table row.
    fn delete(&self, cursor: &dyn VCursor, rows: &[Vec<Value>], ksid: &[u8]) -> Result<()>;
}

/// A unique vindex maintained through a lookup table.
pub trait UniqueLookup: Unique + Lookup {}

impl<T: Unique + Lookup> UniqueLookup for T {}

/// A non-unique vindex maintained through a lookup table.
pub trait NonUniqueLookup: NonUnique + Lookup {}

impl<T: NonUnique + Lookup> NonUniqueLookup for T {}

/// A vindex instance produced by a registered factory.
#[derive(Clone)]
pub enum VindexHandle {
    Unique(Arc<dyn UniqueLookup>),
    NonUnique(Arc<dyn NonUniqueLookup>),
}

impl VindexHandle {
    pub fn as_vindex(&self) -> &dyn Vindex {
        match self {
            VindexHandle::Unique(v) => &**v,
            VindexHandle::NonUnique(v) => &**v,
        }
    }

    pub fn as_lookup(&self) -> &dyn Lookup {
        match self {
            VindexHandle::Unique(v) => &**v,
            VindexHandle::NonUnique(v) => &**v,
        }
    }

    pub fn name(&self) -> &str {
        self.as_vindex().name()
    }

    pub fn cost(&self) -> u32 {
        self.as_vindex().cost()
    }

    pub fn is_unique(&self) -> bool {
        matches!(self, VindexHandle::Unique(_))
    }

    pub fn as_unique(&self) -> Option<&Arc<dyn UniqueLookup>> {
        match self {
            VindexHandle::Unique(v) => Some(v),
            VindexHandle::NonUnique(_) => None,
        }
    }

    pub fn as_non_unique(&self) -> Option<&Arc<dyn NonUniqueLookup>> {
        match self {
            VindexHandle::Unique(_) => None,
            VindexHandle::NonUnique(v) => Some(v),
        }
    }
}

impl fmt::Debug for VindexHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.is_unique() {
            "Unique"
        } else {
            "NonUnique"
        };
        f.debug_struct("VindexHandle")
            .field("kind", &kind)
            .field("name", &self.name())
            .field("cost", &self.cost())
            .finish()
    }
}
