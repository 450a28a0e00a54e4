//! The contract between a lookup vindex and the component that reads and writes
//! its lookup table.

use vindex_common::Result;
use vindex_core::{QueryResult, VCursor, Value, VindexConfig};

/// Executes lookup-table reads and writes on behalf of a lookup vindex.
///
/// Each vindex owns one delegate, initialized once at construction with the
/// vindex configuration and the write policy derived from it. The vindex adapts
/// keyspace ids to [`Value`]s and passes everything else through unchanged; any
/// error returned here reaches the router as is.
///
/// The default implementation is [`LookupInternal`](crate::LookupInternal), which
/// issues SQL through the caller's [`VCursor`]. Tests substitute an in-memory table.
pub trait LookupDelegate: Send + Sync + 'static {
    /// Validates and stores the lookup-table description (`table`, `from`, `to`)
    /// and the write policy.
    ///
    /// # Arguments
    ///
    /// * `config` - The vindex options
    /// * `autocommit` - Writes commit independently of the caller's transaction and
    ///   deletes become no-ops
    /// * `upsert` - Creates overwrite existing entries instead of failing
    fn init(&mut self, config: &VindexConfig, autocommit: bool, upsert: bool) -> Result<()>;

    /// Returns, for each id in order, the matching lookup rows. The first column of
    /// every row is the "to" value.
    fn lookup(&self, cursor: &dyn VCursor, ids: &[Value]) -> Result<Vec<QueryResult>>;

    /// Returns whether each `(ids[i], values[i])` pair exists in the lookup table.
    fn verify(&self, cursor: &dyn VCursor, ids: &[Value], values: &[Value]) -> Result<Vec<bool>>;

    /// Inserts one lookup row per input row, with `to_values[i]` as the "to" column.
    ///
    /// `ignore_mode` asks for conflicting rows to be skipped. It is independent of
    /// the upsert policy given to [`init`](Self::init).
    fn create(
        &self,
        cursor: &dyn VCursor,
        rows: &[Vec<Value>],
        to_values: &[Value],
        ignore_mode: bool,
    ) -> Result<()>;

    /// Re-keys the entry identified by `old_values` and `to_value` to `new_values`.
    fn update(
        &self,
        cursor: &dyn VCursor,
        old_values: &[Value],
        to_value: &Value,
        new_values: &[Value],
    ) -> Result<()>;

    /// Removes the lookup rows matching each input row and `to_value`.
    fn delete(&self, cursor: &dyn VCursor, rows: &[Vec<Value>], to_value: &Value) -> Result<()>;

    /// Returns a field-by-field snapshot of the delegate configuration.
    fn to_json(&self) -> Result<serde_json::Value>;
}
