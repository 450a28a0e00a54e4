//! The execution context through which lookup statements reach the lookup table.
//!
//! The router hands a [`VCursor`] to every vindex operation. Vindexes never look
//! inside it; they forward it to their lookup delegate, which uses it to run
//! statements in the caller's session and transaction.

use std::any::Any;
use std::collections::BTreeMap;

use vindex_common::Result;

use crate::value::Value;

/// Named bind variables of a statement.
pub type BindVars = BTreeMap<String, Value>;

/// How a statement participates in the caller's transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommitOrder {
    /// The statement runs inside the caller's session/transaction.
    Normal,
    /// The statement runs and commits on its own, outside the caller's transaction.
    Autocommit,
}

/// Rows produced by a statement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryResult {
    pub rows: Vec<Vec<Value>>,
}

impl QueryResult {
    pub fn from_rows(rows: Vec<Vec<Value>>) -> QueryResult {
        QueryResult { rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Caller-supplied execution context.
///
/// Implementations must be thread-safe: the same cursor may be used by several
/// vindex calls at once.
pub trait VCursor: Send + Sync {
    /// Executes `query` with `bind_vars`.
    ///
    /// # Arguments
    ///
    /// * `method` - A short tag identifying the caller, used for diagnostics
    /// * `query` - The statement text with `:name` placeholders
    /// * `bind_vars` - Values for the placeholders
    /// * `is_dml` - `true` for statements that modify data
    /// * `commit_order` - Whether the statement joins the caller's transaction
    fn execute(
        &self,
        method: &str,
        query: &str,
        bind_vars: &BindVars,
        is_dml: bool,
        commit_order: CommitOrder,
    ) -> Result<QueryResult>;

    /// Enables delegates that know the concrete context type to downcast to it.
    fn as_any(&self) -> &dyn Any;
}
