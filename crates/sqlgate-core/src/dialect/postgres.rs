//! PostgreSQL.

use super::generic::{keyed_dsn, port_text};
use super::{
    standard_alter, AlterKind, DeleteParts, Dialect, DialectSpec, RandomOrder, SeedStyle,
    TxnCommand, Unsigned,
};
use crate::config::ConnectionConfig;
use crate::error::Result;
use crate::escape::Escaper;
use crate::forge::FieldClauses;

const UNSIGNED: &[(&str, &str)] = &[
    ("INT2", "INTEGER"),
    ("SMALLINT", "INTEGER"),
    ("INT", "BIGINT"),
    ("INT4", "BIGINT"),
    ("INTEGER", "BIGINT"),
    ("INT8", "NUMERIC"),
    ("BIGINT", "NUMERIC"),
    ("REAL", "DOUBLE PRECISION"),
    ("FLOAT", "DOUBLE PRECISION"),
];

/// PostgreSQL dialect (`postgre`, `pdo/pgsql`).
#[derive(Debug, Clone)]
pub struct PostgresDialect {
    spec: DialectSpec,
    schema: String,
}

impl PostgresDialect {
    /// Creates the dialect for `config`.
    #[must_use]
    pub fn new(config: &ConnectionConfig) -> Self {
        let mut spec = DialectSpec::standard("postgre");
        spec.random = RandomOrder {
            keyword: "RANDOM()",
            seeded: SeedStyle::Session("SET SEED TO 0.{seed}"),
        };
        spec.bool_literals = ("TRUE", "FALSE");
        spec.unsigned = Unsigned::Remap(UNSIGNED);
        Self {
            spec,
            schema: if config.schema.is_empty() {
                String::from("public")
            } else {
                config.schema.clone()
            },
        }
    }

    /// libpq connection string: `host='...' port='...' dbname='...'`.
    #[must_use]
    pub fn native_dsn(config: &ConnectionConfig) -> String {
        let mut pairs = vec![
            ("host", config.hostname.clone()),
            ("port", port_text(config)),
            ("dbname", config.database.clone()),
            ("user", config.username.clone()),
            ("password", config.password.clone()),
        ];
        for key in ["sslmode", "connect_timeout", "application_name"] {
            if let Some(value) = config.extra_str(key) {
                pairs.push((key, value));
            }
        }
        pairs
            .into_iter()
            .filter(|(_, value)| !value.is_empty())
            .map(|(key, value)| format!("{key}='{}'", value.replace('\\', "\\\\").replace('\'', "\\'")))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// `pgsql:host=...;port=...;dbname=...`.
    #[must_use]
    pub fn pdo_dsn(config: &ConnectionConfig) -> String {
        keyed_dsn(
            "pgsql",
            &[
                ("host", config.hostname.clone()),
                ("port", port_text(config)),
                ("dbname", config.database.clone()),
            ],
        )
    }
}

impl Dialect for PostgresDialect {
    fn spec(&self) -> &DialectSpec {
        &self.spec
    }

    fn blob_literal(&self, bytes: &[u8]) -> String {
        let hex: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
        format!("'\\x{hex}'")
    }

    /// PostgreSQL has no DELETE ... LIMIT; rows are picked by `ctid`.
    fn delete(&self, parts: &DeleteParts) -> String {
        let mut sql = format!("DELETE FROM {}", parts.table);
        match (parts.limit, &parts.where_clause) {
            (Some(limit), predicate) => {
                let filter = predicate
                    .as_ref()
                    .map(|p| format!(" WHERE {p}"))
                    .unwrap_or_default();
                sql.push_str(&format!(
                    " WHERE ctid IN (SELECT ctid FROM {}{filter} LIMIT {limit})",
                    parts.table
                ));
            }
            (None, Some(predicate)) => {
                sql.push_str(" WHERE ");
                sql.push_str(predicate);
            }
            (None, None) => {}
        }
        sql
    }

    fn list_tables(&self, esc: &Escaper<'_>, prefix: Option<&str>) -> Result<String> {
        let mut sql = format!(
            "SELECT \"table_name\" FROM \"information_schema\".\"tables\" WHERE \"table_schema\" = {}",
            esc.quote(&self.schema)?
        );
        if let Some(prefix) = prefix {
            sql.push_str(&format!(
                " AND \"table_name\" LIKE {} ESCAPE '{}'",
                esc.quote(&format!("{}%", esc.escape_like(prefix)))?,
                self.spec.like_escape
            ));
        }
        Ok(sql)
    }

    fn list_columns(&self, esc: &Escaper<'_>, table: &str) -> Result<String> {
        Ok(format!(
            "SELECT \"column_name\" FROM \"information_schema\".\"columns\" WHERE LOWER(\"table_name\") = {}",
            esc.quote(&table.to_lowercase())?
        ))
    }

    fn insert_id_query(&self, esc: &Escaper<'_>, sequence: Option<&str>) -> Result<Option<String>> {
        Ok(Some(match sequence {
            Some(sequence) => format!("SELECT CURRVAL({}) AS ins_id", esc.quote(sequence)?),
            None => String::from("SELECT LASTVAL() AS ins_id"),
        }))
    }

    fn session_statements(&self, config: &ConnectionConfig) -> Vec<String> {
        let mut statements = Vec::new();
        if !config.charset.is_empty() {
            statements.push(format!("SET client_encoding TO '{}'", config.charset.replace('\'', "")));
        }
        if !config.schema.is_empty() {
            statements.push(format!("SET search_path TO {},public", config.schema));
        }
        statements
    }

    fn transaction_sql(&self, command: TxnCommand) -> Option<&'static str> {
        Some(match command {
            TxnCommand::Begin => "BEGIN",
            TxnCommand::Commit => "COMMIT",
            TxnCommand::Rollback => "ROLLBACK",
        })
    }

    fn attr_type(&self, field: &mut FieldClauses) {
        match field.data_type.as_str() {
            "TINYINT" => {
                field.data_type = String::from("SMALLINT");
                field.unsigned = false;
            }
            "MEDIUMINT" => {
                field.data_type = String::from("INTEGER");
                field.unsigned = false;
            }
            "DATETIME" => field.data_type = String::from("TIMESTAMP"),
            "DOUBLE" => field.data_type = String::from("DOUBLE PRECISION"),
            "TINYTEXT" | "MEDIUMTEXT" | "LONGTEXT" => field.data_type = String::from("TEXT"),
            "BLOB" | "TINYBLOB" | "MEDIUMBLOB" | "LONGBLOB" => field.data_type = String::from("BYTEA"),
            _ => {}
        }
        if field.is_integer() {
            field.length.clear();
        }
    }

    fn attr_auto_increment(&self, field: &mut FieldClauses, _primary_keys: &mut Vec<String>) {
        if !field.auto_increment {
            return;
        }
        let serial = match field.data_type.as_str() {
            "BIGINT" | "INT8" | "NUMERIC" => "BIGSERIAL",
            _ if field.is_integer() => "SERIAL",
            _ => return,
        };
        field.data_type = serial.to_string();
        field.length.clear();
        field.auto_increment_clause.clear();
    }

    fn alter_table(
        &self,
        _esc: &Escaper<'_>,
        kind: AlterKind,
        table: &str,
        fields: &[FieldClauses],
    ) -> Result<Vec<String>> {
        if kind != AlterKind::Change {
            return standard_alter(self, kind, table, fields);
        }
        let mut statements = Vec::new();
        for field in fields {
            if let Some(literal) = &field.literal {
                statements.push(format!("ALTER TABLE {table} ALTER COLUMN {} TYPE {literal}", field.name));
            } else if !field.data_type.is_empty() {
                statements.push(format!(
                    "ALTER TABLE {table} ALTER COLUMN {} TYPE {}{}",
                    field.name, field.data_type, field.length
                ));
            }
            if let Some(default) = &field.default_value {
                statements.push(format!(
                    "ALTER TABLE {table} ALTER COLUMN {} SET DEFAULT {default}",
                    field.name
                ));
            }
            match field.nullable {
                Some(true) => statements.push(format!(
                    "ALTER TABLE {table} ALTER COLUMN {} DROP NOT NULL",
                    field.name
                )),
                Some(false) => statements.push(format!(
                    "ALTER TABLE {table} ALTER COLUMN {} SET NOT NULL",
                    field.name
                )),
                None => {}
            }
            if let Some(new_name) = &field.new_name {
                statements.push(format!(
                    "ALTER TABLE {table} RENAME COLUMN {} TO {new_name}",
                    field.name
                ));
            }
        }
        Ok(statements)
    }
}
