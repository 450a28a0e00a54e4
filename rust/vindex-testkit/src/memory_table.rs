use std::sync::{Arc, Mutex};

use vindex_common::{Result, error::Error};
use vindex_core::{QueryResult, VCursor, Value, VindexConfig};
use vindex_lookup::LookupDelegate;

/// The arguments a [`MemoryLookupTable`] was initialized with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitArgs {
    pub table: Option<String>,
    pub autocommit: bool,
    pub upsert: bool,
}

#[derive(Default)]
struct TableState {
    rows: Vec<(Vec<Value>, Value)>,
    init: Option<InitArgs>,
    failure: Option<String>,
    lookup_calls: usize,
    verify_calls: usize,
    create_calls: usize,
    update_calls: usize,
    delete_calls: usize,
}

/// An in-memory lookup table usable as a [`LookupDelegate`].
///
/// Rows are `(from values, to value)` pairs. Lookups match on the first "from"
/// value, deletes on all of them. A row identical to an existing one is a
/// duplicate key: it fails the create unless the table upserts or the create
/// runs in ignore mode.
///
/// Clones share the same table, so a test can keep a handle after moving one
/// into a vindex.
#[derive(Clone, Default)]
pub struct MemoryLookupTable {
    state: Arc<Mutex<TableState>>,
}

impl MemoryLookupTable {
    pub fn new() -> MemoryLookupTable {
        MemoryLookupTable::default()
    }

    /// Adds a lookup row directly, bypassing the write policy.
    pub fn insert_row(&self, from: Vec<Value>, to: impl Into<Vec<u8>>) {
        self.state
            .lock()
            .unwrap()
            .rows
            .push((from, Value::varbinary(to)));
    }

    pub fn rows(&self) -> Vec<(Vec<Value>, Value)> {
        self.state.lock().unwrap().rows.clone()
    }

    /// Makes every subsequent operation fail with `message`.
    pub fn fail_with(&self, message: impl Into<String>) {
        self.state.lock().unwrap().failure = Some(message.into());
    }

    pub fn init_args(&self) -> Option<InitArgs> {
        self.state.lock().unwrap().init.clone()
    }

    pub fn lookup_calls(&self) -> usize {
        self.state.lock().unwrap().lookup_calls
    }

    pub fn verify_calls(&self) -> usize {
        self.state.lock().unwrap().verify_calls
    }

    pub fn create_calls(&self) -> usize {
        self.state.lock().unwrap().create_calls
    }

    pub fn update_calls(&self) -> usize {
        self.state.lock().unwrap().update_calls
    }

    pub fn delete_calls(&self) -> usize {
        self.state.lock().unwrap().delete_calls
    }

    fn check_failure(state: &TableState, operation: &str) -> Result<()> {
        match &state.failure {
            Some(message) => Err(Error::delegate(operation, message.clone())),
            None => Ok(()),
        }
    }

    fn policy(state: &TableState) -> (bool, bool) {
        state
            .init
            .as_ref()
            .map(|args| (args.autocommit, args.upsert))
            .unwrap_or_default()
    }

    fn insert(
        state: &mut TableState,
        rows: &[Vec<Value>],
        to_values: &[Value],
        ignore_mode: bool,
    ) -> Result<()> {
        let (_, upsert) = Self::policy(state);
        for (from, to) in rows.iter().zip(to_values) {
            let exists = state.rows.iter().any(|(f, t)| f == from && t == to);
            if exists {
                if upsert || ignore_mode {
                    continue;
                }
                return Err(Error::delegate(
                    "lookup.Create",
                    format!("duplicate entry for {from:?}"),
                ));
            }
            state.rows.push((from.clone(), to.clone()));
        }
        Ok(())
    }

    fn remove(state: &mut TableState, rows: &[Vec<Value>], to_value: &Value) {
        for from in rows {
            state.rows.retain(|(f, t)| !(f == from && t == to_value));
        }
    }
}

impl LookupDelegate for MemoryLookupTable {
    fn init(&mut self, config: &VindexConfig, autocommit: bool, upsert: bool) -> Result<()> {
        self.state.lock().unwrap().init = Some(InitArgs {
            table: config.get_str("table").map(str::to_string),
            autocommit,
            upsert,
        });
        Ok(())
    }

    fn lookup(&self, _cursor: &dyn VCursor, ids: &[Value]) -> Result<Vec<QueryResult>> {
        let mut state = self.state.lock().unwrap();
        state.lookup_calls += 1;
        Self::check_failure(&state, "lookup.Map")?;
        Ok(ids
            .iter()
            .map(|id| {
                QueryResult::from_rows(
                    state
                        .rows
                        .iter()
                        .filter(|(from, _)| from.first() == Some(id))
                        .map(|(_, to)| vec![to.clone()])
                        .collect(),
                )
            })
            .collect())
    }

    fn verify(&self, _cursor: &dyn VCursor, ids: &[Value], values: &[Value]) -> Result<Vec<bool>> {
        let mut state = self.state.lock().unwrap();
        state.verify_calls += 1;
        Self::check_failure(&state, "lookup.Verify")?;
        Ok(ids
            .iter()
            .zip(values)
            .map(|(id, value)| {
                state
                    .rows
                    .iter()
                    .any(|(from, to)| from.first() == Some(id) && to == value)
            })
            .collect())
    }

    fn create(
        &self,
        _cursor: &dyn VCursor,
        rows: &[Vec<Value>],
        to_values: &[Value],
        ignore_mode: bool,
    ) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.create_calls += 1;
        Self::check_failure(&state, "lookup.Create")?;
        Self::insert(&mut state, rows, to_values, ignore_mode)
    }

    fn update(
        &self,
        _cursor: &dyn VCursor,
        old_values: &[Value],
        to_value: &Value,
        new_values: &[Value],
    ) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.update_calls += 1;
        Self::check_failure(&state, "lookup.Update")?;
        Self::remove(&mut state, &[old_values.to_vec()], to_value);
        Self::insert(
            &mut state,
            &[new_values.to_vec()],
            std::slice::from_ref(to_value),
            false,
        )
    }

    fn delete(&self, _cursor: &dyn VCursor, rows: &[Vec<Value>], to_value: &Value) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.delete_calls += 1;
        Self::check_failure(&state, "lookup.Delete")?;
        let (autocommit, _) = Self::policy(&state);
        if !autocommit {
            Self::remove(&mut state, rows, to_value);
        }
        Ok(())
    }

    fn to_json(&self) -> Result<serde_json::Value> {
        let state = self.state.lock().unwrap();
        Ok(serde_json::json!({
            "table": state.init.as_ref().and_then(|args| args.table.clone()),
            "rows": state.rows.len(),
        }))
    }
}
