//! Schema statements across dialects.

mod common;

use common::{driver, driver_with};
use sqlgate_core::dialect::AlterKind;
use sqlgate_core::forge::DefaultValue;
use sqlgate_core::{ColumnDefinition, Forge};

fn items(forge: &mut Forge) -> &mut Forge {
    forge
        .add_field(ColumnDefinition::new("id", "INT").unsigned().auto_increment())
        .add_field(ColumnDefinition::new("name", "VARCHAR").constraint("100"))
        .add_field(ColumnDefinition::new("price", "DOUBLE").nullable(true))
        .add_primary_key(["id"])
}

#[test]
fn test_create_table_sqlsrv_remaps_unsigned() {
    let mut forge = Forge::new();
    let sql = items(&mut forge).create_table(&driver("sqlsrv"), "items", true, &[]).unwrap();
    assert_eq!(
        sql,
        vec![
            "CREATE TABLE [items] (\n    [id] BIGINT NOT NULL IDENTITY(1,1),\n    [name] VARCHAR(100) NOT NULL,\n    [price] DOUBLE NULL,\n    CONSTRAINT [pk_items] PRIMARY KEY([id])\n)"
        ]
    );
}

#[test]
fn test_create_table_oracle_identity_depends_on_version() {
    let mut forge = Forge::new();
    let modern = items(&mut forge).create_table(&driver("oci8"), "items", false, &[]).unwrap();
    assert_eq!(
        modern,
        vec![
            "CREATE TABLE \"items\" (\n    \"id\" NUMBER(10) GENERATED BY DEFAULT AS IDENTITY NOT NULL,\n    \"name\" VARCHAR2(100) NOT NULL,\n    \"price\" BINARY_DOUBLE NULL,\n    CONSTRAINT \"pk_items\" PRIMARY KEY(\"id\")\n)"
        ]
    );

    let legacy = driver_with("oci8", |c| c.version = Some(String::from("11.2.0.4")));
    let sql = items(&mut forge).create_table(&legacy, "items", false, &[]).unwrap();
    assert!(sql[0].contains("\"id\" NUMBER(10) NOT NULL,"), "{}", sql[0]);
}

#[test]
fn test_create_table_applies_prefix_once() {
    let prefixed = driver_with("postgre", |c| c.prefix = String::from("app_"));
    let mut forge = Forge::new();
    forge.add_field(ColumnDefinition::new("id", "INT"));
    let sql = forge.create_table(&prefixed, "app_users", false, &[]).unwrap();
    assert!(sql[0].starts_with("CREATE TABLE \"app_users\" ("), "{}", sql[0]);
    forge.add_field(ColumnDefinition::new("id", "INT"));
    let sql = forge.create_table(&prefixed, "users", false, &[]).unwrap();
    assert!(sql[0].starts_with("CREATE TABLE \"app_users\" ("), "{}", sql[0]);
}

#[test]
fn test_column_defaults() {
    let mut forge = Forge::new();
    forge
        .add_field(ColumnDefinition::new("active", "BOOLEAN").default_value(DefaultValue::Boolean(true)))
        .add_field(ColumnDefinition::new("title", "VARCHAR").constraint("20").default_value(DefaultValue::String(String::from("it's"))));
    let sql = forge.create_table(&driver("postgre"), "flags", false, &[]).unwrap();
    assert_eq!(
        sql[0],
        "CREATE TABLE \"flags\" (\n    \"active\" BOOLEAN NOT NULL DEFAULT TRUE,\n    \"title\" VARCHAR(20) NOT NULL DEFAULT 'it''s'\n)"
    );
}

#[test]
fn test_drop_table_forms() {
    let forge = Forge::new();
    assert_eq!(
        forge.drop_table(&driver("mysqli"), "logs", true, false).unwrap(),
        vec!["DROP TABLE IF EXISTS `logs`"]
    );
    assert_eq!(
        forge.drop_table(&driver("postgre"), "logs", true, true).unwrap(),
        vec!["DROP TABLE IF EXISTS \"logs\" CASCADE"]
    );
    assert_eq!(
        forge.drop_table(&driver("oci8"), "logs", false, true).unwrap(),
        vec!["DROP TABLE \"logs\" CASCADE CONSTRAINTS"]
    );
    assert_eq!(
        forge.drop_table(&driver("sqlsrv"), "logs", true, false).unwrap(),
        vec!["IF EXISTS (SELECT * FROM sysobjects WHERE ID = object_id(N'[logs]') AND OBJECTPROPERTY(id, N'IsUserTable') = 1) DROP TABLE [logs]"]
    );
}

#[test]
fn test_rename_table_forms() {
    let forge = Forge::new();
    assert_eq!(
        forge.rename_table(&driver("mysqli"), "old", "new").unwrap(),
        vec!["ALTER TABLE `old` RENAME TO `new`"]
    );
    assert_eq!(
        forge.rename_table(&driver("sqlsrv"), "old", "new").unwrap(),
        vec!["EXEC sp_rename 'old', 'new'"]
    );
    assert_eq!(
        forge.rename_table(&driver("odbc/ibm"), "old", "new").unwrap(),
        vec!["RENAME TABLE \"old\" TO \"new\""]
    );
    for key in ["ibase", "pdo/4d"] {
        let err = forge.rename_table(&driver(key), "old", "new").unwrap_err();
        assert!(err.is_unsupported(), "{key}");
    }
}

#[test]
fn test_alter_table_per_dialect() {
    let mut forge = Forge::new();
    let note = || ColumnDefinition::new("note", "VARCHAR").constraint("20").nullable(true);

    assert_eq!(
        forge.add_column(&driver("sqlsrv"), "t", vec![note()]).unwrap(),
        vec!["ALTER TABLE [t] ADD [note] VARCHAR(20) NULL"]
    );
    assert_eq!(
        forge.add_column(&driver("ibase"), "t", vec![note()]).unwrap(),
        vec!["ALTER TABLE \"t\" ADD \"note\" VARCHAR(20)"]
    );
    assert_eq!(
        forge.drop_column(&driver("oci8"), "t", ["a", "b"]).unwrap(),
        vec!["ALTER TABLE \"t\" DROP (\"a\", \"b\")"]
    );
    assert_eq!(
        forge
            .modify_column(&driver("ibase"), "t", vec![ColumnDefinition::new("note", "VARCHAR").constraint("40").rename_to("memo")])
            .unwrap(),
        vec![
            "ALTER TABLE \"t\" ALTER COLUMN \"note\" TYPE VARCHAR(40)",
            "ALTER TABLE \"t\" ALTER COLUMN \"note\" TO \"memo\"",
        ]
    );

    forge.add_field(ColumnDefinition::new("a", "").rename_to("b"));
    assert_eq!(
        forge.alter_table(&driver("postgre"), AlterKind::Rename, "t").unwrap(),
        vec!["ALTER TABLE \"t\" RENAME COLUMN \"a\" TO \"b\""]
    );
    forge.add_field(ColumnDefinition::new("a", ""));
    assert!(forge.alter_table(&driver("postgre"), AlterKind::Rename, "t").is_err());
}

#[test]
fn test_database_statements_per_dialect() {
    let forge = Forge::new();
    assert_eq!(
        forge.create_database(&driver("postgre"), "shop").unwrap(),
        vec!["CREATE DATABASE \"shop\""]
    );
    assert_eq!(
        forge.drop_database(&driver("sqlsrv"), "shop").unwrap(),
        vec!["DROP DATABASE [shop]"]
    );
    for key in ["odbc/ibm", "ibase", "oci8"] {
        assert!(forge.create_database(&driver(key), "shop").unwrap_err().is_unsupported(), "{key}");
        assert!(forge.drop_database(&driver(key), "shop").unwrap_err().is_unsupported(), "{key}");
    }
}
