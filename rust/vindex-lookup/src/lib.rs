//! Lookup vindexes.
//!
//! A lookup vindex resolves application column values to keyspace ids through an
//! auxiliary lookup table, for columns whose placement cannot be computed from the
//! value itself. Two variants are provided:
//!
//! - [`LookupNonUnique`] (type name `"lookup"`, cost 20): a value may live at any
//!   number of keyspace ids
//! - [`LookupUnique`] (type name `"lookup_unique"`, cost 10): a value lives at
//!   most at one keyspace id
//!
//! Both delegate the actual table access to a [`LookupDelegate`], by default the
//! SQL-issuing [`LookupInternal`].
//!
//! # Configuration
//!
//! | option | required | meaning |
//! |---|---|---|
//! | `table` | yes | lookup table, optionally keyspace-qualified |
//! | `from` | yes | comma-separated input columns |
//! | `to` | yes | keyspace id column |
//! | `autocommit` | no | `"true"`: writes commit on their own and deletes are ignored |
//! | `write_only` | no | `"true"`: non-unique only, scatter instead of reading the table |

use std::sync::Arc;

use vindex_common::{Result, error::Error};
use vindex_core::keyspace_id::value_to_ksid;
use vindex_core::{Ksid, Registry, Value, VindexHandle};

mod delegate;
mod lookup_internal;
mod non_unique;
mod unique;

pub use delegate::LookupDelegate;
pub use lookup_internal::LookupInternal;
pub use non_unique::LookupNonUnique;
pub use unique::LookupUnique;

/// Type name of [`LookupNonUnique`].
pub const LOOKUP: &str = "lookup";

/// Type name of [`LookupUnique`].
pub const LOOKUP_UNIQUE: &str = "lookup_unique";

pub(crate) const AUTOCOMMIT: &str = "autocommit";
pub(crate) const WRITE_ONLY: &str = "write_only";

/// Reads the keyspace id from the first column of a lookup row returned for
/// `vindex`. A row without columns is malformed delegate output.
pub(crate) fn row_ksid(vindex: &str, row: &[Value]) -> Result<Ksid> {
    row.first()
        .map(value_to_ksid)
        .ok_or_else(|| Error::invalid_format(vindex, "lookup row has no columns"))
}

/// Registers both lookup vindex types, backed by [`LookupInternal`].
pub fn register(registry: &mut Registry) -> Result<()> {
    register_with(registry, LookupInternal::new)
}

/// Registers both lookup vindex types, backed by delegates produced by
/// `make_delegate`. Every created vindex gets a fresh delegate.
pub fn register_with<D, F>(registry: &mut Registry, make_delegate: F) -> Result<()>
where
    D: LookupDelegate,
    F: Fn() -> D + Send + Sync + 'static,
{
    let make_delegate = Arc::new(make_delegate);

    let make = Arc::clone(&make_delegate);
    registry.add(LOOKUP, move |name, config| {
        let vindex = LookupNonUnique::with_delegate(name, config, make())?;
        Ok(VindexHandle::NonUnique(Arc::new(vindex)))
    })?;

    let make = make_delegate;
    registry.add(LOOKUP_UNIQUE, move |name, config| {
        let vindex = LookupUnique::with_delegate(name, config, make())?;
        Ok(VindexHandle::Unique(Arc::new(vindex)))
    })
}
