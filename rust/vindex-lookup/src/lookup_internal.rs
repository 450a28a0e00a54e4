//! SQL-backed lookup delegate.
//!
//! [`LookupInternal`] turns lookup vindex operations into statements against the
//! lookup table and runs them through the caller's [`VCursor`]. The statement
//! shapes are fixed at [`init`](LookupDelegate::init) time:
//!
//! ```text
//! select <to> from <table> where <from0> = :<from0>
//! select <from0> from <table> where <from0> = :<from0> and <to> = :<to>
//! insert [ignore ]into <table>(<from0>, ..., <to>) values(:<from0>0, ..., :<to>0), ...
//! delete from <table> where <from0> = :<from0> and ... and <to> = :<to>
//! ```

use itertools::Itertools;
use serde::Serialize;

use vindex_common::{Result, error::Error, verify_arg};
use vindex_core::{BindVars, CommitOrder, QueryResult, VCursor, Value, VindexConfig};

use crate::LookupDelegate;

const TABLE: &str = "table";
const FROM: &str = "from";
const TO: &str = "to";

/// Tags a lookup statement for the cursor and for error reporting.
struct StatementKind {
    operation: &'static str,
    method: &'static str,
    is_dml: bool,
}

const SELECT: StatementKind = StatementKind {
    operation: "lookup.Map",
    method: "VindexLookup",
    is_dml: false,
};

const VERIFY: StatementKind = StatementKind {
    operation: "lookup.Verify",
    method: "VindexVerify",
    is_dml: false,
};

const INSERT: StatementKind = StatementKind {
    operation: "lookup.Create",
    method: "VindexCreate",
    is_dml: true,
};

const DELETE: StatementKind = StatementKind {
    operation: "lookup.Delete",
    method: "VindexDelete",
    is_dml: true,
};

/// Lookup delegate that reads and writes the lookup table with SQL statements.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LookupInternal {
    table: String,
    from_columns: Vec<String>,
    to: String,
    #[serde(skip_serializing_if = "is_false")]
    autocommit: bool,
    #[serde(skip_serializing_if = "is_false")]
    upsert: bool,
    #[serde(skip)]
    sel: String,
    #[serde(skip)]
    ver: String,
    #[serde(skip)]
    del: String,
}

fn is_false(v: &bool) -> bool {
    !*v
}

impl LookupInternal {
    pub fn new() -> LookupInternal {
        LookupInternal::default()
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn from_columns(&self) -> &[String] {
        &self.from_columns
    }

    pub fn to(&self) -> &str {
        &self.to
    }

    pub fn autocommit(&self) -> bool {
        self.autocommit
    }

    pub fn upsert(&self) -> bool {
        self.upsert
    }

    fn commit_order(&self) -> CommitOrder {
        if self.autocommit {
            CommitOrder::Autocommit
        } else {
            CommitOrder::Normal
        }
    }

    /// Returns the first "from" column, which every statement binds.
    ///
    /// Fails if [`init`](LookupDelegate::init) has not succeeded yet.
    fn from0(&self) -> Result<&str> {
        self.from_columns
            .first()
            .map(String::as_str)
            .ok_or_else(|| Error::invalid_operation("lookup delegate used before init"))
    }

    fn execute(
        &self,
        cursor: &dyn VCursor,
        kind: &StatementKind,
        query: &str,
        bind_vars: &BindVars,
    ) -> Result<QueryResult> {
        log::trace!("{} on {}: {query} {bind_vars:?}", kind.method, self.table);
        cursor
            .execute(
                kind.method,
                query,
                bind_vars,
                kind.is_dml,
                self.commit_order(),
            )
            .map_err(|e| Error::delegate(kind.operation, e))
    }

    fn check_row_width(&self, row: &[Value]) -> Result<()> {
        if row.len() != self.from_columns.len() {
            return Err(Error::invalid_arg(
                "rows",
                format!(
                    "expected {} column values for lookup table {}, got {}",
                    self.from_columns.len(),
                    self.table,
                    row.len()
                ),
            ));
        }
        Ok(())
    }

    fn build_insert(
        &self,
        rows: &[Vec<Value>],
        to_values: &[Value],
        ignore_mode: bool,
    ) -> (String, BindVars) {
        let mut query = format!(
            "insert {}into {}({}, {}) values",
            if ignore_mode { "ignore " } else { "" },
            self.table,
            self.from_columns.iter().join(", "),
            self.to
        );
        let mut bind_vars = BindVars::new();
        for (row_idx, (row, to_value)) in rows.iter().zip(to_values).enumerate() {
            if row_idx != 0 {
                query.push_str(", ");
            }
            query.push('(');
            for (column, value) in self.from_columns.iter().zip(row) {
                let name = format!("{column}{row_idx}");
                query.push_str(&format!(":{name}, "));
                bind_vars.insert(name, value.clone());
            }
            let name = format!("{}{row_idx}", self.to);
            query.push_str(&format!(":{name})"));
            bind_vars.insert(name, to_value.clone());
        }
        if self.upsert {
            query.push_str(" on duplicate key update ");
            for column in &self.from_columns {
                query.push_str(&format!("{column}=values({column}), "));
            }
            query.push_str(&format!("{0}=values({0})", self.to));
        }
        (query, bind_vars)
    }
}

impl LookupDelegate for LookupInternal {
    fn init(&mut self, config: &VindexConfig, autocommit: bool, upsert: bool) -> Result<()> {
        let table = config.get_str(TABLE).unwrap_or_default().trim();
        if table.is_empty() {
            return Err(Error::invalid_arg(TABLE, "lookup table name must be specified"));
        }
        let to = config.get_str(TO).unwrap_or_default().trim();
        if to.is_empty() {
            return Err(Error::invalid_arg(TO, "'to' column must be specified"));
        }
        let from_columns = config.get_list(FROM).unwrap_or_default();
        if from_columns.is_empty() || from_columns.iter().any(String::is_empty) {
            return Err(Error::invalid_arg(
                FROM,
                format!(
                    "'from' must be a comma-separated list of column names: '{}'",
                    config.get_str(FROM).unwrap_or_default()
                ),
            ));
        }

        let from0 = &from_columns[0];
        self.sel = format!("select {to} from {table} where {from0} = :{from0}");
        self.ver = format!(
            "select {from0} from {table} where {from0} = :{from0} and {to} = :{to}"
        );
        self.del = format!(
            "delete from {table} where {} and {to} = :{to}",
            from_columns
                .iter()
                .map(|column| format!("{column} = :{column}"))
                .join(" and ")
        );
        self.table = table.to_string();
        self.to = to.to_string();
        self.from_columns = from_columns;
        self.autocommit = autocommit;
        self.upsert = upsert;
        Ok(())
    }

    fn lookup(&self, cursor: &dyn VCursor, ids: &[Value]) -> Result<Vec<QueryResult>> {
        let from0 = self.from0()?;
        ids.iter()
            .map(|id| {
                let bind_vars = BindVars::from([(from0.to_string(), id.clone())]);
                self.execute(cursor, &SELECT, &self.sel, &bind_vars)
            })
            .collect()
    }

    fn verify(&self, cursor: &dyn VCursor, ids: &[Value], values: &[Value]) -> Result<Vec<bool>> {
        let from0 = self.from0()?;
        verify_arg!(values, ids.len() == values.len());
        ids.iter()
            .zip(values)
            .map(|(id, value)| {
                let bind_vars = BindVars::from([
                    (from0.to_string(), id.clone()),
                    (self.to.clone(), value.clone()),
                ]);
                let result = self.execute(cursor, &VERIFY, &self.ver, &bind_vars)?;
                Ok(!result.is_empty())
            })
            .collect()
    }

    fn create(
        &self,
        cursor: &dyn VCursor,
        rows: &[Vec<Value>],
        to_values: &[Value],
        ignore_mode: bool,
    ) -> Result<()> {
        self.from0()?;
        verify_arg!(to_values, rows.len() == to_values.len());
        if rows.is_empty() {
            return Ok(());
        }
        for row in rows {
            self.check_row_width(row)?;
        }
        let (query, bind_vars) = self.build_insert(rows, to_values, ignore_mode);
        self.execute(cursor, &INSERT, &query, &bind_vars)?;
        Ok(())
    }

    fn update(
        &self,
        cursor: &dyn VCursor,
        old_values: &[Value],
        to_value: &Value,
        new_values: &[Value],
    ) -> Result<()> {
        self.delete(cursor, &[old_values.to_vec()], to_value)?;
        self.create(cursor, &[new_values.to_vec()], &[to_value.clone()], false)
    }

    fn delete(&self, cursor: &dyn VCursor, rows: &[Vec<Value>], to_value: &Value) -> Result<()> {
        self.from0()?;
        // Autocommitted lookup rows outlive the base rows' transaction, so they
        // are left for a separate cleanup.
        if self.autocommit {
            return Ok(());
        }
        for row in rows {
            self.check_row_width(row)?;
            let mut bind_vars = self
                .from_columns
                .iter()
                .cloned()
                .zip(row.iter().cloned())
                .collect::<BindVars>();
            bind_vars.insert(self.to.clone(), to_value.clone());
            self.execute(cursor, &DELETE, &self.del, &bind_vars)?;
        }
        Ok(())
    }

    fn to_json(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}

#[cfg(test)]
mod tests {
    use std::any::Any;
    use std::sync::Mutex;

    use vindex_common::error::ErrorKind;

    use super::*;

    #[derive(Default)]
    struct StatementLog(Mutex<Vec<(String, String, BindVars, bool, CommitOrder)>>);

    impl VCursor for StatementLog {
        fn execute(
            &self,
            method: &str,
            query: &str,
            bind_vars: &BindVars,
            is_dml: bool,
            commit_order: CommitOrder,
        ) -> Result<QueryResult> {
            self.0.lock().unwrap().push((
                method.to_string(),
                query.to_string(),
                bind_vars.clone(),
                is_dml,
                commit_order,
            ));
            Ok(QueryResult::default())
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    fn init(pairs: &[(&str, &str)], autocommit: bool, upsert: bool) -> Result<LookupInternal> {
        let config = pairs.iter().copied().collect::<VindexConfig>();
        let mut lkp = LookupInternal::new();
        lkp.init(&config, autocommit, upsert)?;
        Ok(lkp)
    }

    #[test]
    fn test_init_statements() {
        let lkp = init(
            &[("table", "t"), ("from", "fromc1, fromc2"), ("to", "toc")],
            false,
            false,
        )
        .unwrap();
        assert_eq!(
            lkp.from_columns(),
            &["fromc1".to_string(), "fromc2".to_string()]
        );
        assert_eq!(lkp.sel, "select toc from t where fromc1 = :fromc1");
        assert_eq!(
            lkp.ver,
            "select fromc1 from t where fromc1 = :fromc1 and toc = :toc"
        );
        assert_eq!(
            lkp.del,
            "delete from t where fromc1 = :fromc1 and fromc2 = :fromc2 and toc = :toc"
        );
    }

    #[test]
    fn test_init_requires_table_from_to() {
        let cases: &[&[(&str, &str)]] = &[
            &[("from", "c"), ("to", "k")],
            &[("table", "t"), ("to", "k")],
            &[("table", "t"), ("from", "c")],
            &[("table", "t"), ("from", "c,,d"), ("to", "k")],
        ];
        for pairs in cases {
            let err = init(pairs, false, false).unwrap_err();
            assert!(matches!(err.kind(), ErrorKind::InvalidArgument { .. }), "{pairs:?}");
        }
    }

    #[test]
    fn test_create_statement_with_upsert() {
        let lkp = init(&[("table", "t"), ("from", "a,b"), ("to", "k")], true, true).unwrap();
        let cursor = StatementLog::default();
        lkp.create(
            &cursor,
            &[
                vec![Value::from(1i64), Value::from("x")],
                vec![Value::from(2i64), Value::from("y")],
            ],
            &[Value::varbinary(b"k1".to_vec()), Value::varbinary(b"k2".to_vec())],
            false,
        )
        .unwrap();

        let log = cursor.0.lock().unwrap();
        assert_eq!(log.len(), 1);
        let (method, query, bind_vars, is_dml, commit_order) = &log[0];
        assert_eq!(method, "VindexCreate");
        assert_eq!(
            query,
            "insert into t(a, b, k) values(:a0, :b0, :k0), (:a1, :b1, :k1) \
             on duplicate key update a=values(a), b=values(b), k=values(k)"
        );
        assert_eq!(bind_vars.len(), 6);
        assert_eq!(bind_vars["b1"], Value::from("y"));
        assert_eq!(bind_vars["k0"], Value::varbinary(b"k1".to_vec()));
        assert!(*is_dml);
        assert_eq!(*commit_order, CommitOrder::Autocommit);
    }

    #[test]
    fn test_create_ignore_mode() {
        let lkp = init(&[("table", "t"), ("from", "a"), ("to", "k")], false, false).unwrap();
        let cursor = StatementLog::default();
        lkp.create(
            &cursor,
            &[vec![Value::from(1i64)]],
            &[Value::varbinary(b"k".to_vec())],
            true,
        )
        .unwrap();
        let log = cursor.0.lock().unwrap();
        assert_eq!(log[0].1, "insert ignore into t(a, k) values(:a0, :k0)");
        assert_eq!(log[0].4, CommitOrder::Normal);
    }

    #[test]
    fn test_create_rejects_misaligned_rows() {
        let lkp = init(&[("table", "t"), ("from", "a,b"), ("to", "k")], false, false).unwrap();
        let cursor = StatementLog::default();
        let ksid = Value::varbinary(b"k".to_vec());
        assert!(
            lkp.create(&cursor, &[vec![Value::from(1i64)]], &[ksid.clone()], false)
                .unwrap_err()
                .is_invalid_arg()
        );
        assert!(
            lkp.create(&cursor, &[], &[ksid], false)
                .unwrap_err()
                .is_invalid_arg()
        );
        assert!(cursor.0.lock().unwrap().is_empty());
    }

    #[test]
    fn test_delete_skipped_with_autocommit() {
        let lkp = init(&[("table", "t"), ("from", "a"), ("to", "k")], true, false).unwrap();
        let cursor = StatementLog::default();
        lkp.delete(
            &cursor,
            &[vec![Value::from(1i64)]],
            &Value::varbinary(b"k".to_vec()),
        )
        .unwrap();
        assert!(cursor.0.lock().unwrap().is_empty());
    }

    #[test]
    fn test_update_is_delete_then_insert() {
        let lkp = init(&[("table", "t"), ("from", "a"), ("to", "k")], false, false).unwrap();
        let cursor = StatementLog::default();
        lkp.update(
            &cursor,
            &[Value::from(1i64)],
            &Value::varbinary(b"k".to_vec()),
            &[Value::from(2i64)],
        )
        .unwrap();
        let log = cursor.0.lock().unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].0, "VindexDelete");
        assert_eq!(log[0].1, "delete from t where a = :a and k = :k");
        assert_eq!(log[0].2["a"], Value::from(1i64));
        assert_eq!(log[1].0, "VindexCreate");
        assert_eq!(log[1].2["a0"], Value::from(2i64));
    }

    #[test]
    fn test_operations_before_init_fail() {
        let lkp = LookupInternal::new();
        let cursor = StatementLog::default();
        let id = Value::from(1i64);
        let ksid = Value::varbinary(b"k".to_vec());

        let errors = [
            lkp.lookup(&cursor, std::slice::from_ref(&id)).unwrap_err(),
            lkp.verify(&cursor, std::slice::from_ref(&id), std::slice::from_ref(&ksid))
                .unwrap_err(),
            lkp.create(&cursor, &[vec![id.clone()]], std::slice::from_ref(&ksid), false)
                .unwrap_err(),
            lkp.update(&cursor, std::slice::from_ref(&id), &ksid, std::slice::from_ref(&id))
                .unwrap_err(),
            lkp.delete(&cursor, &[vec![id.clone()]], &ksid).unwrap_err(),
        ];
        for err in &errors {
            assert!(matches!(err.kind(), ErrorKind::InvalidOperation { .. }), "{err}");
        }
        assert!(cursor.0.lock().unwrap().is_empty());
    }

    #[test]
    fn test_delete_runs_in_caller_transaction() {
        let lkp = init(&[("table", "t"), ("from", "a"), ("to", "k")], false, false).unwrap();
        let cursor = StatementLog::default();
        lkp.delete(
            &cursor,
            &[vec![Value::from(1i64)], vec![Value::from(2i64)]],
            &Value::varbinary(b"k".to_vec()),
        )
        .unwrap();
        let log = cursor.0.lock().unwrap();
        assert_eq!(log.len(), 2);
        assert!(log.iter().all(|(method, _, _, is_dml, commit_order)| {
            method == "VindexDelete" && *is_dml && *commit_order == CommitOrder::Normal
        }));
    }

    #[test]
    fn test_snapshot_omits_false_flags() {
        let lkp = init(&[("table", "ks.t"), ("from", "a"), ("to", "k")], false, false).unwrap();
        assert_eq!(
            lkp.to_json().unwrap(),
            serde_json::json!({"table": "ks.t", "from_columns": ["a"], "to": "k"})
        );
        let lkp = init(&[("table", "t"), ("from", "a"), ("to", "k")], true, true).unwrap();
        let snapshot = lkp.to_json().unwrap();
        assert_eq!(snapshot["autocommit"], serde_json::json!(true));
        assert_eq!(snapshot["upsert"], serde_json::json!(true));
    }
}
