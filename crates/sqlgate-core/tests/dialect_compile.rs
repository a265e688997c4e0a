//! Write statements compiled for every dialect.

mod common;

use std::collections::BTreeMap;
use std::sync::LazyLock;

use common::{all_drivers, driver, driver_with, top_level};
use regex::Regex;
use sqlgate_core::error::DbError;
use sqlgate_core::{Compiler, Direction, QueryBuilder, Record, SqlValue};

static CASE_ASSIGNMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\S+) = CASE (\S+)((?: WHEN \S+ THEN \S+)*) ELSE (\S+) END").unwrap());
static WHEN_THEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r" WHEN (\S+) THEN (\S+)").unwrap());
static IN_LIST: LazyLock<Regex> = LazyLock::new(|| Regex::new(r" WHERE (\S+) IN \(([^)]*)\)").unwrap());

fn rows() -> Vec<Record> {
    vec![
        Record::new().with("id", 1).with("score", 10).with("rank", 3),
        Record::new().with("id", 2).with("score", 20),
        Record::new().with("id", 3).with("rank", 1),
    ]
}

/// Reads `column -> [(key, value)]` and the IN list back out of a batch
/// update.
fn parse_batch(sql: &str) -> (BTreeMap<String, Vec<(String, String)>>, Vec<String>) {
    let mut cases = BTreeMap::new();
    for caps in CASE_ASSIGNMENT.captures_iter(sql) {
        assert_eq!(&caps[1], &caps[4], "ELSE keeps the column: {sql}");
        let pairs = WHEN_THEN
            .captures_iter(&caps[3])
            .map(|w| (w[1].to_string(), w[2].to_string()))
            .collect();
        cases.insert(caps[1].to_string(), pairs);
    }
    let keys = IN_LIST
        .captures(sql)
        .map(|c| c[2].split(',').map(str::to_string).collect())
        .unwrap_or_default();
    (cases, keys)
}

fn bare(name: &str) -> String {
    name.trim_matches(|c| matches!(c, '"' | '`' | '[' | ']')).to_string()
}

#[test]
fn test_batch_update_case_matches_rows() {
    for (label, driver) in all_drivers() {
        let compiler = Compiler::new(&driver);
        let statements = compiler
            .compile_update_batch(&QueryBuilder::new(), Some("scores"), &rows(), "id", 100)
            .unwrap();
        assert_eq!(statements.len(), 1, "{label}");
        let (cases, keys) = parse_batch(&statements[0]);
        assert_eq!(keys, ["1", "2", "3"], "{label}: {}", statements[0]);

        let cases: BTreeMap<String, Vec<(String, String)>> =
            cases.into_iter().map(|(column, pairs)| (bare(&column), pairs)).collect();
        assert_eq!(cases.len(), 2, "{label}");
        let pairs = |column: &str| {
            cases[column]
                .iter()
                .map(|(k, v)| (k.as_str(), v.as_str()))
                .collect::<Vec<_>>()
        };
        assert_eq!(pairs("score"), [("1", "10"), ("2", "20")], "{label}");
        assert_eq!(pairs("rank"), [("1", "3"), ("3", "1")], "{label}");
    }
}

#[test]
fn test_batch_update_chunks_and_keeps_where() {
    let driver = driver("postgre");
    let mut qb = QueryBuilder::new();
    qb.where_("tenant", 7);
    let statements = Compiler::new(&driver)
        .compile_update_batch(&qb, Some("scores"), &rows(), "id", 2)
        .unwrap();
    assert_eq!(statements.len(), 2);
    assert!(statements[0].ends_with("WHERE \"id\" IN (1,2) AND (\"tenant\" = 7)"), "{}", statements[0]);
    assert!(statements[1].ends_with("WHERE \"id\" IN (3) AND (\"tenant\" = 7)"), "{}", statements[1]);
}

#[test]
fn test_batch_update_needs_index_values() {
    let driver = driver("mysqli");
    let rows = vec![Record::new().with("score", 1)];
    let err = Compiler::new(&driver)
        .compile_update_batch(&QueryBuilder::new(), Some("scores"), &rows, "id", 10)
        .unwrap_err();
    assert!(matches!(err, DbError::Compile { .. }));
}

#[test]
fn test_update_limit_never_leaks() {
    for (label, driver) in all_drivers() {
        let mut qb = QueryBuilder::new();
        qb.set("score", 0)
            .where_("id >", 10)
            .order_by("id", Direction::Desc)
            .limit(5);
        let sql = Compiler::new(&driver).compile_update(&qb, Some("scores")).unwrap();
        if driver.dialect().spec().update_limit {
            assert!(sql.ends_with("DESC LIMIT 5"), "{label}: {sql}");
        } else {
            assert!(!sql.contains("LIMIT"), "{label}: {sql}");
            assert!(!sql.contains("ORDER BY"), "{label}: {sql}");
        }
    }
}

#[test]
fn test_delete_limit_is_rewritten_or_dropped() {
    for (label, driver) in all_drivers() {
        let mut qb = QueryBuilder::new();
        qb.where_("level", 3).limit(50);
        let sql = Compiler::new(&driver).compile_delete(&qb, Some("logs")).unwrap();
        assert!(sql.contains("DELETE FROM"), "{label}: {sql}");
        if driver.dialect().spec().delete_limit {
            assert!(sql.ends_with(" LIMIT 50"), "{label}: {sql}");
        } else {
            assert!(!top_level(&sql).contains("LIMIT"), "{label}: {sql}");
        }
    }
}

#[test]
fn test_delete_limit_rewrites() {
    let cases = [
        (
            "postgre",
            "DELETE FROM \"logs\" WHERE ctid IN (SELECT ctid FROM \"logs\" WHERE \"level\" = 3 LIMIT 50)",
        ),
        (
            "sqlite3",
            "DELETE FROM \"logs\" WHERE rowid IN (SELECT rowid FROM \"logs\" WHERE \"level\" = 3 LIMIT 50)",
        ),
        ("oci8", "DELETE FROM \"logs\" WHERE (\"level\" = 3) AND rownum <= 50"),
        ("ibase", "DELETE FROM \"logs\" WHERE \"level\" = 3 ROWS 50"),
        (
            "odbc/ibm",
            "DELETE FROM (SELECT * FROM \"logs\" WHERE \"level\" = 3 FETCH FIRST 50 ROWS ONLY)",
        ),
        ("pdo/4d", "DELETE FROM [logs] WHERE [level] = 3"),
    ];
    for (key, expected) in cases {
        let driver = driver(key);
        let mut qb = QueryBuilder::new();
        qb.where_("level", 3).limit(50);
        assert_eq!(Compiler::new(&driver).compile_delete(&qb, Some("logs")).unwrap(), expected, "{key}");
    }
}

#[test]
fn test_unfiltered_writes_are_refused() {
    for (label, driver) in all_drivers() {
        let compiler = Compiler::new(&driver);
        let err = compiler.compile_delete(&QueryBuilder::new(), Some("logs")).unwrap_err();
        assert!(matches!(err, DbError::Compile { .. }), "{label}");
        let err = compiler.compile_update(&QueryBuilder::new(), Some("logs")).unwrap_err();
        assert!(matches!(err, DbError::Compile { .. }), "{label}");
        let err = compiler.compile_insert(&QueryBuilder::new(), Some("logs")).unwrap_err();
        assert!(matches!(err, DbError::Compile { .. }), "{label}");
    }
}

#[test]
fn test_insert_batch_forms() {
    let rows = vec![
        Record::new().with("id", 1).with("score", 10),
        Record::new().with("id", 2).with("score", 20),
    ];
    let cases = [
        ("mysqli", "INSERT INTO `scores` (`id`, `score`) VALUES (1, 10), (2, 20)"),
        (
            "oci8",
            "INSERT ALL INTO \"scores\" (\"id\", \"score\") VALUES (1, 10) INTO \"scores\" (\"id\", \"score\") VALUES (2, 20) SELECT * FROM dual",
        ),
        (
            "ibase",
            "INSERT INTO \"scores\" (\"id\", \"score\") SELECT 1, 10 FROM RDB$DATABASE UNION ALL SELECT 2, 20 FROM RDB$DATABASE",
        ),
    ];
    for (key, expected) in cases {
        let driver = driver(key);
        let statements = Compiler::new(&driver).compile_insert_batch("scores", &rows, 100).unwrap();
        assert_eq!(statements, [expected], "{key}");
    }

    let legacy = driver_with("sqlsrv", |c| c.version = Some(String::from("9.00.5000")));
    let err = Compiler::new(&legacy).compile_insert_batch("scores", &rows, 100).unwrap_err();
    assert!(err.is_unsupported());
}

#[test]
fn test_insert_batch_rows_must_match_first_row() {
    let driver = driver("postgre");
    let rows = vec![
        Record::new().with("id", 1).with("score", 10),
        Record::new().with("id", 2),
    ];
    let err = Compiler::new(&driver).compile_insert_batch("scores", &rows, 100).unwrap_err();
    assert!(matches!(err, DbError::Compile { .. }));
}

#[test]
fn test_truncate_fallbacks() {
    let cases = [
        ("mysqli", "TRUNCATE `logs`"),
        ("sqlite3", "DELETE FROM \"logs\""),
        ("sqlsrv", "TRUNCATE TABLE [logs]"),
        ("oci8", "TRUNCATE TABLE \"logs\""),
        ("ibase", "DELETE FROM \"logs\""),
        ("odbc/ibm", "TRUNCATE TABLE \"logs\" IMMEDIATE"),
    ];
    for (key, expected) in cases {
        let driver = driver(key);
        assert_eq!(Compiler::new(&driver).compile_truncate("logs"), expected, "{key}");
    }
}

#[test]
fn test_text_needs_quoting_primitive() {
    let driver = driver("odbc");
    let mut qb = QueryBuilder::new();
    qb.where_("name", "x");
    let err = Compiler::new(&driver).compile_select(&qb, Some("users")).unwrap_err();
    assert!(err.is_unsupported());

    let mut qb = QueryBuilder::new();
    qb.where_("name", SqlValue::Null);
    let sql = Compiler::new(&driver).compile_select(&qb, Some("users")).unwrap();
    assert_eq!(sql, "SELECT * FROM \"users\" WHERE \"name\" IS NULL");
}
