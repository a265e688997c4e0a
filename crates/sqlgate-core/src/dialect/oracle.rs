//! Oracle through OCI8.

use super::{
    version_at_least, AlterKind, DeleteParts, Dialect, DialectSpec, LimitStrategy, RandomOrder,
    SeedStyle, TxnCommand, Unsigned,
};
use crate::config::ConnectionConfig;
use crate::error::{DbError, Operation, Result};
use crate::escape::Escaper;
use crate::forge::FieldClauses;

/// Default precision of integer types mapped to NUMBER.
const NUMBER_PRECISION: &[(&str, u8)] = &[
    ("TINYINT", 3),
    ("SMALLINT", 5),
    ("MEDIUMINT", 7),
    ("INT", 10),
    ("INTEGER", 10),
    ("BIGINT", 19),
    ("NUMERIC", 19),
];

/// Oracle dialect (`oci8`, `pdo/oci`).
#[derive(Debug, Clone)]
pub struct OracleDialect {
    spec: DialectSpec,
    owner: String,
}

impl OracleDialect {
    /// Creates the dialect for `config`. Servers from 12.1 on get
    /// `OFFSET ... FETCH` pagination and identity columns.
    #[must_use]
    pub fn new(config: &ConnectionConfig) -> Self {
        let modern = version_at_least(config.version.as_deref(), 12, 1);
        let mut spec = DialectSpec::standard("oci8");
        spec.reserved = &["*", "rownum"];
        spec.random = RandomOrder {
            keyword: "DBMS_RANDOM.VALUE",
            seeded: SeedStyle::Session("BEGIN DBMS_RANDOM.SEED({seed}); END;"),
        };
        spec.truncate = Some("TRUNCATE TABLE");
        spec.null_keyword = "NULL";
        spec.unsigned = Unsigned::Ignored;
        spec.table_alias_as = false;
        spec.create_if_not_exists = false;
        spec.drop_if_exists = false;
        if modern {
            spec.limit = LimitStrategy::OffsetFetch { requires_order: false };
            spec.auto_increment = Some(" GENERATED BY DEFAULT AS IDENTITY");
        } else {
            spec.limit = LimitStrategy::RownumWrap;
            spec.auto_increment = None;
        }
        Self {
            spec,
            owner: config.username.to_ascii_uppercase(),
        }
    }

    /// Easy Connect string `//host:port/service`, or the bare TNS name.
    #[must_use]
    pub fn native_dsn(config: &ConnectionConfig) -> String {
        if config.hostname.is_empty() {
            return config.database.clone();
        }
        let mut dsn = format!("//{}", config.hostname);
        if let Some(port) = config.port {
            dsn.push_str(&format!(":{port}"));
        }
        if !config.database.is_empty() {
            dsn.push('/');
            dsn.push_str(&config.database);
        }
        dsn
    }

    /// `oci:dbname=//host:port/service;charset=...`.
    #[must_use]
    pub fn pdo_dsn(config: &ConnectionConfig) -> String {
        super::generic::keyed_dsn(
            "oci",
            &[
                ("dbname", Self::native_dsn(config)),
                ("charset", config.charset.clone()),
            ],
        )
    }
}

impl Dialect for OracleDialect {
    fn spec(&self) -> &DialectSpec {
        &self.spec
    }

    fn insert_batch(&self, table: &str, columns: &[String], rows: &[Vec<String>]) -> Result<String> {
        let columns = columns.join(", ");
        let mut sql = String::from("INSERT ALL");
        for row in rows {
            sql.push_str(&format!(" INTO {table} ({columns}) VALUES ({})", row.join(", ")));
        }
        sql.push_str(" SELECT * FROM dual");
        Ok(sql)
    }

    fn delete(&self, parts: &DeleteParts) -> String {
        let mut sql = format!("DELETE FROM {}", parts.table);
        match (&parts.where_clause, parts.limit) {
            (Some(predicate), Some(limit)) => {
                sql.push_str(&format!(" WHERE ({predicate}) AND rownum <= {limit}"));
            }
            (None, Some(limit)) => sql.push_str(&format!(" WHERE rownum <= {limit}")),
            (Some(predicate), None) => {
                sql.push_str(" WHERE ");
                sql.push_str(predicate);
            }
            (None, None) => {}
        }
        sql
    }

    fn list_tables(&self, esc: &Escaper<'_>, prefix: Option<&str>) -> Result<String> {
        let mut conditions = Vec::new();
        if !self.owner.is_empty() {
            conditions.push(format!("\"OWNER\" = {}", esc.quote(&self.owner)?));
        }
        if let Some(prefix) = prefix {
            conditions.push(format!(
                "\"TABLE_NAME\" LIKE {} ESCAPE '{}'",
                esc.quote(&format!("{}%", esc.escape_like(prefix)))?,
                self.spec.like_escape
            ));
        }
        let mut sql = String::from("SELECT \"TABLE_NAME\" FROM \"ALL_TABLES\"");
        if !conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }
        Ok(sql)
    }

    fn list_columns(&self, esc: &Escaper<'_>, table: &str) -> Result<String> {
        let (owner, table) = match table.split_once('.') {
            Some((owner, table)) => (owner.to_ascii_uppercase(), table),
            None => (self.owner.clone(), table),
        };
        Ok(format!(
            "SELECT \"COLUMN_NAME\" FROM \"ALL_TAB_COLUMNS\" WHERE UPPER(\"OWNER\") = {} AND UPPER(\"TABLE_NAME\") = {}",
            esc.quote(&owner)?,
            esc.quote(&table.to_ascii_uppercase())?
        ))
    }

    fn insert_id_query(&self, esc: &Escaper<'_>, sequence: Option<&str>) -> Result<Option<String>> {
        Ok(sequence.map(|sequence| {
            format!("SELECT {}.CURRVAL FROM dual", esc.escape_identifier(sequence))
        }))
    }

    /// Transactions begin implicitly; the transport leaves auto-commit.
    fn transaction_sql(&self, command: TxnCommand) -> Option<&'static str> {
        match command {
            TxnCommand::Begin => None,
            TxnCommand::Commit => Some("COMMIT"),
            TxnCommand::Rollback => Some("ROLLBACK"),
        }
    }

    fn attr_type(&self, field: &mut FieldClauses) {
        if let Some((_, precision)) = NUMBER_PRECISION
            .iter()
            .find(|(name, _)| *name == field.data_type)
        {
            field.data_type = String::from("NUMBER");
            if field.length.is_empty() {
                field.length = format!("({precision})");
            }
            return;
        }
        match field.data_type.as_str() {
            "VARCHAR" => field.data_type = String::from("VARCHAR2"),
            "TEXT" | "MEDIUMTEXT" | "LONGTEXT" => field.data_type = String::from("CLOB"),
            "DATETIME" => field.data_type = String::from("TIMESTAMP"),
            "DOUBLE" => field.data_type = String::from("BINARY_DOUBLE"),
            "BOOLEAN" => {
                field.data_type = String::from("NUMBER");
                field.length = String::from("(1)");
            }
            _ => {}
        }
    }

    fn attr_auto_increment(&self, field: &mut FieldClauses, _primary_keys: &mut Vec<String>) {
        if !field.auto_increment || !(field.is_integer() || field.data_type == "NUMBER") {
            return;
        }
        match self.spec.auto_increment {
            Some(clause) => field.auto_increment_clause = clause.to_string(),
            None => tracing::debug!(column = %field.name, "identity columns need Oracle 12.1"),
        }
    }

    fn process_column(&self, field: &FieldClauses) -> String {
        format!(
            "{} {}{}{}{}{}{}",
            field.name,
            field.data_type,
            field.length,
            field.default,
            field.auto_increment_clause,
            field.null,
            field.unique
        )
    }

    fn alter_table(
        &self,
        _esc: &Escaper<'_>,
        kind: AlterKind,
        table: &str,
        fields: &[FieldClauses],
    ) -> Result<Vec<String>> {
        match kind {
            AlterKind::Add => Ok(vec![format!(
                "ALTER TABLE {table} ADD ({})",
                fields
                    .iter()
                    .map(|f| self.column_text(f))
                    .collect::<Vec<_>>()
                    .join(", ")
            )]),
            AlterKind::Drop => Ok(vec![format!(
                "ALTER TABLE {table} DROP ({})",
                fields.iter().map(|f| f.name.as_str()).collect::<Vec<_>>().join(", ")
            )]),
            AlterKind::Rename => super::rename_columns(self.name(), fields, |from, to| {
                format!("ALTER TABLE {table} RENAME COLUMN {from} TO {to}")
            }),
            AlterKind::Change => {
                let mut statements = vec![format!(
                    "ALTER TABLE {table} MODIFY ({})",
                    fields
                        .iter()
                        .map(|f| self.column_text(f))
                        .collect::<Vec<_>>()
                        .join(", ")
                )];
                for field in fields {
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
    }

    fn drop_table(&self, table: &str, _if_exists: bool, cascade: bool) -> Result<String> {
        Ok(if cascade {
            format!("DROP TABLE {table} CASCADE CONSTRAINTS")
        } else {
            format!("DROP TABLE {table}")
        })
    }

    fn create_database(&self, _name: &str, _config: &ConnectionConfig) -> Result<Option<String>> {
        Err(DbError::unsupported(Operation::CreateDatabase, self.name()))
    }

    fn drop_database(&self, _name: &str) -> Result<Option<String>> {
        Err(DbError::unsupported(Operation::DropDatabase, self.name()))
    }
}
