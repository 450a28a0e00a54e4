use vindex_core::{
    CommitOrder, Ksids, Lookup, NonUnique, QueryResult, Unique, VCursor, Value, Vindex,
    VindexConfig,
};
use vindex_lookup::{LookupNonUnique, LookupUnique};
use vindex_testkit::{RecordingCursor, Statement};

fn config() -> VindexConfig {
    [("table", "ks.email_lookup"), ("from", "email"), ("to", "user_id")]
        .into_iter()
        .collect()
}

fn ksid_rows(ksids: &[&[u8]]) -> QueryResult {
    QueryResult::from_rows(
        ksids
            .iter()
            .map(|ksid| vec![Value::varbinary(ksid.to_vec())])
            .collect(),
    )
}

#[test]
fn test_non_unique_map_issues_one_select_per_id() {
    let vindex = LookupNonUnique::new("email_idx", &config()).unwrap();
    let cursor = RecordingCursor::new();
    cursor.push_result(ksid_rows(&[b"ksidA", b"ksidB"]));
    cursor.push_result(ksid_rows(&[]));

    let mapped = vindex
        .map(&cursor, &[Value::from("a@x.com"), Value::from("z@x.com")])
        .unwrap();
    assert_eq!(
        mapped,
        vec![
            Ksids::Ids(vec![b"ksidA".to_vec(), b"ksidB".to_vec()]),
            Ksids::Ids(vec![]),
        ]
    );

    let statements = cursor.statements();
    assert_eq!(statements.len(), 2);
    assert_eq!(
        statements[0],
        Statement {
            method: "VindexLookup".to_string(),
            query: "select user_id from ks.email_lookup where email = :email".to_string(),
            bind_vars: [("email".to_string(), Value::from("a@x.com"))].into(),
            is_dml: false,
            commit_order: CommitOrder::Normal,
        }
    );
    assert_eq!(statements[1].bind_vars["email"], Value::from("z@x.com"));
}

#[test]
fn test_write_only_issues_no_statements() {
    let vindex = LookupNonUnique::new("email_idx", &config().with("write_only", "true")).unwrap();
    let cursor = RecordingCursor::new();
    let mapped = vindex.map(&cursor, &[Value::from("a@x.com")]).unwrap();
    assert_eq!(mapped, vec![Ksids::full_range()]);
    let verified = vindex
        .verify(&cursor, &[Value::from("a@x.com")], &[b"k".to_vec()])
        .unwrap();
    assert_eq!(verified, vec![true]);
    assert_eq!(cursor.statement_count(), 0);
}

#[test]
fn test_unique_verify_binds_ksid_as_binary() {
    let vindex = LookupUnique::new("user_idx", &config()).unwrap();
    let cursor = RecordingCursor::new();
    cursor.push_result(ksid_rows(&[b"x"]));
    cursor.push_result(ksid_rows(&[]));

    let verified = vindex
        .verify(
            &cursor,
            &[Value::from(42i64), Value::from(42i64)],
            &[vec![0x01, 0x02], vec![0xff]],
        )
        .unwrap();
    assert_eq!(verified, vec![true, false]);

    let statements = cursor.statements();
    assert_eq!(statements[0].method, "VindexVerify");
    assert_eq!(
        statements[0].query,
        "select email from ks.email_lookup where email = :email and user_id = :user_id"
    );
    assert_eq!(
        statements[0].bind_vars["user_id"],
        Value::varbinary(vec![0x01, 0x02])
    );
}

#[test]
fn test_unique_map_multiple_rows_from_sql() {
    let vindex = LookupUnique::new("user_idx", &config()).unwrap();
    let cursor = RecordingCursor::new();
    cursor.push_result(ksid_rows(&[b"a", b"b"]));
    let err = vindex.map(&cursor, &[Value::from("a@x.com")]).unwrap_err();
    assert_eq!(
        err.to_string(),
        "lookup.Map: unexpected multiple results from vindex user_idx: 'a@x.com'"
    );
}

#[test]
fn test_autocommit_policies() {
    let non_unique =
        LookupNonUnique::new("email_idx", &config().with("autocommit", "true")).unwrap();
    let unique = LookupUnique::new("user_idx", &config().with("autocommit", "true")).unwrap();
    assert!(non_unique.delegate().upsert());
    assert!(!unique.delegate().upsert());
    assert!(unique.delegate().autocommit());

    let cursor = RecordingCursor::new();
    let rows = [vec![Value::from("a@x.com")]];
    non_unique.create(&cursor, &rows, &[b"k".to_vec()], false).unwrap();
    unique.create(&cursor, &rows, &[b"k".to_vec()], false).unwrap();
    non_unique.delete(&cursor, &rows, b"k").unwrap();
    unique.delete(&cursor, &rows, b"k").unwrap();

    let statements = cursor.statements();
    assert_eq!(statements.len(), 2);
    assert!(statements[0].query.ends_with(
        " on duplicate key update email=values(email), user_id=values(user_id)"
    ));
    assert_eq!(statements[0].commit_order, CommitOrder::Autocommit);
    assert_eq!(
        statements[1].query,
        "insert into ks.email_lookup(email, user_id) values(:email0, :user_id0)"
    );
}

#[test]
fn test_cursor_failure_names_operation() {
    let vindex = LookupNonUnique::new("email_idx", &config()).unwrap();
    let cursor = RecordingCursor::new();
    cursor.fail_with("connection reset");

    let err = vindex
        .delete(&cursor, &[vec![Value::from("a@x.com")]], b"k")
        .unwrap_err();
    assert!(err.to_string().starts_with("lookup.Delete: "));
    assert!(err.to_string().contains("connection reset"));

    let err = vindex.map(&cursor, &[Value::from("a@x.com")]).unwrap_err();
    assert!(err.to_string().starts_with("lookup.Map: "));
}

#[test]
fn test_snapshot() {
    let vindex = LookupNonUnique::new(
        "email_idx",
        &config().with("from", "email, tenant").with("autocommit", "true"),
    )
    .unwrap();
    assert_eq!(
        vindex.to_json().unwrap(),
        serde_json::json!({
            "table": "ks.email_lookup",
            "from_columns": ["email", "tenant"],
            "to": "user_id",
            "autocommit": true,
            "upsert": true,
        })
    );
}

#[test]
fn test_cursor_downcast() {
    let cursor = RecordingCursor::new();
    let dyn_cursor: &dyn VCursor = &cursor;
    assert!(dyn_cursor.as_any().downcast_ref::<RecordingCursor>().is_some());
}
