use std::fmt;

use vindex_common::{Result, verify_data};
use vindex_core::keyspace_id::{ksid_to_value, ksids_to_values};
use vindex_core::{Ksid, Ksids, Lookup, NonUnique, VCursor, Value, Vindex, VindexConfig};

use crate::{AUTOCOMMIT, LookupDelegate, LookupInternal, WRITE_ONLY, row_ksid};

/// A lookup vindex where a value may map to any number of keyspace ids.
///
/// Typically used for secondary, non-unique columns such as an email address
/// shared by several accounts.
///
/// Options, besides the `table`/`from`/`to` consumed by the delegate:
/// - `autocommit`: lookup writes commit on their own, creates become upserts and
///   deletes are ignored.
/// - `write_only`: the lookup table is being backfilled and cannot be trusted yet;
///   `map` scatters to the full keyrange and `verify` accepts every pairing, both
///   without touching the table.
pub struct LookupNonUnique<D = LookupInternal> {
    name: String,
    write_only: bool,
    lkp: D,
}

impl LookupNonUnique<LookupInternal> {
    /// Creates a vindex backed by the SQL lookup delegate.
    pub fn new(name: impl Into<String>, config: &VindexConfig) -> Result<Self> {
        Self::with_delegate(name, config, LookupInternal::new())
    }
}

impl<D: LookupDelegate> LookupNonUnique<D> {
    /// Cost reported to the planner.
    pub const COST: u32 = 20;

    /// Creates a vindex on top of the supplied (uninitialized) delegate.
    ///
    /// # Errors
    ///
    /// Returns an invalid argument error if `autocommit` or `write_only` is not a
    /// boolean literal, or whatever error the delegate reports from `init`.
    pub fn with_delegate(
        name: impl Into<String>,
        config: &VindexConfig,
        mut delegate: D,
    ) -> Result<Self> {
        let name = name.into();
        let autocommit = config.get_bool(AUTOCOMMIT)?;
        let write_only = config.get_bool(WRITE_ONLY)?;

        // Autocommitted non-unique entries must be idempotent, so they upsert.
        delegate.init(config, autocommit, autocommit)?;
        log::debug!(
            "created lookup vindex '{name}' (autocommit: {autocommit}, write_only: {write_only})"
        );
        Ok(LookupNonUnique {
            name,
            write_only,
            lkp: delegate,
        })
    }

    pub fn is_write_only(&self) -> bool {
        self.write_only
    }

    pub fn delegate(&self) -> &D {
        &self.lkp
    }
}

impl<D: LookupDelegate> Vindex for LookupNonUnique<D> {
    fn name(&self) -> &str {
        &self.name
    }

    fn cost(&self) -> u32 {
        Self::COST
    }

    fn verify(&self, cursor: &dyn VCursor, ids: &[Value], ksids: &[Ksid]) -> Result<Vec<bool>> {
        if self.write_only {
            return Ok(vec![true; ids.len()]);
        }
        let verified = self.lkp.verify(cursor, ids, &ksids_to_values(ksids))?;
        verify_data!(verified, verified.len() == ids.len());
        Ok(verified)
    }

    fn to_json(&self) -> Result<serde_json::Value> {
        self.lkp.to_json()
    }
}

impl<D: LookupDelegate> NonUnique for LookupNonUnique<D> {
    fn map(&self, cursor: &dyn VCursor, ids: &[Value]) -> Result<Vec<Ksids>> {
        if self.write_only {
            return Ok(ids.iter().map(|_| Ksids::full_range()).collect());
        }
        let results = self.lkp.lookup(cursor, ids)?;
        verify_data!(results, results.len() == ids.len());
        results
            .iter()
            .map(|result| {
                result
                    .rows
                    .iter()
                    .map(|row| row_ksid(&self.name, row))
                    .collect::<Result<Vec<_>>>()
                    .map(Ksids::Ids)
            })
            .collect()
    }
}

impl<D: LookupDelegate> Lookup for LookupNonUnique<D> {
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

impl<D> fmt::Display for LookupNonUnique<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
