use std::fmt;

use vindex_common::{Result, error::Error, verify_data};
use vindex_core::keyspace_id::{ksid_to_value, ksids_to_values};
use vindex_core::{Ksid, Lookup, Unique, VCursor, Value, Vindex, VindexConfig};

use crate::{AUTOCOMMIT, LookupDelegate, LookupInternal, WRITE_ONLY, row_ksid};

/// A lookup vindex where a value maps to at most one keyspace id.
///
/// The lookup table is expected to declare the "from" columns unique. More than
/// one lookup row for a value is reported as an error from [`Unique::map`].
///
/// `autocommit` makes lookup writes commit on their own and deletes a no-op, but
/// never enables upserts: an existing mapping is not silently overwritten.
/// `write_only` is rejected.
pub struct LookupUnique<D = LookupInternal> {
    name: String,
    lkp: D,
}

impl LookupUnique<LookupInternal> {
    /// Creates a vindex backed by the SQL lookup delegate.
    pub fn new(name: impl Into<String>, config: &VindexConfig) -> Result<Self> {
        Self::with_delegate(name, config, LookupInternal::new())
    }
}

impl<D: LookupDelegate> LookupUnique<D> {
    /// Cost reported to the planner.
    pub const COST: u32 = 10;

    /// Creates a vindex on top of the supplied (uninitialized) delegate.
    ///
    /// # Errors
    ///
    /// Returns an invalid argument error if `autocommit` or `write_only` is not a
    /// boolean literal or `write_only` is `"true"`. In those cases the delegate is
    /// never initialized. Errors from the delegate's `init` are returned as is.
    pub fn with_delegate(
        name: impl Into<String>,
        config: &VindexConfig,
        mut delegate: D,
    ) -> Result<Self> {
        let name = name.into();
        let autocommit = config.get_bool(AUTOCOMMIT)?;
        if config.get_bool(WRITE_ONLY)? {
            return Err(Error::invalid_arg(
                WRITE_ONLY,
                "write_only cannot be true for a unique lookup vindex",
            ));
        }

        delegate.init(config, autocommit, false)?;
        log::debug!("created unique lookup vindex '{name}' (autocommit: {autocommit})");
        Ok(LookupUnique {
            name,
            lkp: delegate,
        })
    }

    pub fn delegate(&self) -> &D {
        &self.lkp
    }
}

impl<D: LookupDelegate> Vindex for LookupUnique<D> {
    fn name(&self) -> &str {
        &self.name
    }

    fn cost(&self) -> u32 {
        Self::COST
    }

    fn verify(&self, cursor: &dyn VCursor, ids: &[Value], ksids: &[Ksid]) -> Result<Vec<bool>> {
        let verified = self.lkp.verify(cursor, ids, &ksids_to_values(ksids))?;
        verify_data!(verified, verified.len() == ids.len());
        Ok(verified)
    }

    fn to_json(&self) -> Result<serde_json::Value> {
        self.lkp.to_json()
    }
}

impl<D: LookupDelegate> Unique for LookupUnique<D> {
    fn map(&self, cursor: &dyn VCursor, ids: &[Value]) -> Result<Vec<Option<Ksid>>> {
        let results = self.lkp.lookup(cursor, ids)?;
        verify_data!(results, results.len() == ids.len());
        results
            .iter()
            .zip(ids)
            .map(|(result, id)| match result.rows.as_slice() {
                [] => Ok(None),
                [row] => row_ksid(&self.name, row).map(Some),
                _ => Err(Error::multiple_results(&self.name, id.to_string())),
            })
            .collect()
    }
}

impl<D: LookupDelegate> Lookup for LookupUnique<D> {
    fn create(
        &self,
        cursor: &dyn VCursor,
        rows: &[Vec<Value>],
        ksids: &[Ksid],
        ignore_mode: bool,
    ) -> Result<()> {
        self.lkp
            .create(cursor, rows, &ksids_to_values(ksids), ignore_mode)
    }

    fn update(
        &self,
        cursor: &dyn VCursor,
        old_values: &[Value],
        ksid: &[u8],
        new_values: &[Value],
    ) -> Result<()> {
        self.lkp
            .update(cursor, old_values, &ksid_to_value(ksid), new_values)
    }

    fn delete(&self, cursor: &dyn VCursor, rows: &[Vec<Value>], ksid: &[u8]) -> Result<()> {
        self.lkp.delete(cursor, rows, &ksid_to_value(ksid))
    }
}

impl<D> fmt::Display for LookupUnique<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
