//! Firebird and InterBase.

use super::{
    rename_columns, AlterKind, DeleteParts, Dialect, DialectSpec, LimitStrategy, RandomOrder,
    SeedStyle, TxnCommand, Unsigned,
};
use crate::config::ConnectionConfig;
use crate::error::{DbError, Operation, Result};
use crate::escape::Escaper;
use crate::forge::FieldClauses;

const UNSIGNED: &[(&str, &str)] = &[
    ("SMALLINT", "INTEGER"),
    ("INTEGER", "BIGINT"),
    ("INT", "BIGINT"),
    ("FLOAT", "DOUBLE PRECISION"),
];

/// Firebird dialect (`ibase`, `firebird`, `pdo/firebird`).
///
/// InterBase servers are recognized by their version banner or the
/// `interbase` option and paginate with `ROWS m TO n` instead of
/// `FIRST n SKIP m`.
#[derive(Debug, Clone)]
pub struct FirebirdDialect {
    spec: DialectSpec,
    interbase: bool,
}

impl FirebirdDialect {
    /// Creates the dialect for `config`.
    #[must_use]
    pub fn new(config: &ConnectionConfig) -> Self {
        let interbase = config.extra_flag("interbase")
            || config
                .version
                .as_deref()
                .is_some_and(|v| v.to_ascii_lowercase().contains("interbase"));
        let mut spec = DialectSpec::standard(if interbase { "interbase" } else { "firebird" });
        spec.random = RandomOrder {
            keyword: "RAND()",
            seeded: SeedStyle::None,
        };
        spec.truncate = None;
        spec.limit = if interbase {
            LimitStrategy::RowsTo
        } else {
            LimitStrategy::FirstSkip
        };
        spec.unsigned = Unsigned::Remap(UNSIGNED);
        spec.auto_increment = None;
        spec.create_if_not_exists = false;
        spec.drop_if_exists = false;
        Self { spec, interbase }
    }

    /// Returns true when talking to InterBase.
    #[must_use]
    pub const fn is_interbase(&self) -> bool {
        self.interbase
    }

    /// `host[/port]:database`, or the bare database path.
    #[must_use]
    pub fn native_dsn(config: &ConnectionConfig) -> String {
        if config.hostname.is_empty() {
            return config.database.clone();
        }
        match config.port {
            Some(port) => format!("{}/{port}:{}", config.hostname, config.database),
            None => format!("{}:{}", config.hostname, config.database),
        }
    }

    /// `firebird:dbname=...;charset=...;role=...`.
    #[must_use]
    pub fn pdo_dsn(config: &ConnectionConfig) -> String {
        super::generic::keyed_dsn(
            "firebird",
            &[
                ("dbname", Self::native_dsn(config)),
                ("charset", config.charset.clone()),
                ("role", config.extra_str("role").unwrap_or_default()),
            ],
        )
    }
}

impl Dialect for FirebirdDialect {
    fn spec(&self) -> &DialectSpec {
        &self.spec
    }

    fn insert_batch(&self, table: &str, columns: &[String], rows: &[Vec<String>]) -> Result<String> {
        let selects: Vec<String> = rows
            .iter()
            .map(|row| format!("SELECT {} FROM RDB$DATABASE", row.join(", ")))
            .collect();
        Ok(format!(
            "INSERT INTO {table} ({}) {}",
            columns.join(", "),
            selects.join(" UNION ALL ")
        ))
    }

    fn delete(&self, parts: &DeleteParts) -> String {
        let mut sql = format!("DELETE FROM {}", parts.table);
        if let Some(predicate) = &parts.where_clause {
            sql.push_str(" WHERE ");
            sql.push_str(predicate);
        }
        if let Some(limit) = parts.limit {
            sql.push_str(&format!(" ROWS {limit}"));
        }
        sql
    }

    fn list_tables(&self, esc: &Escaper<'_>, prefix: Option<&str>) -> Result<String> {
        let mut sql = String::from(
            "SELECT TRIM(RDB$RELATION_NAME) AS TABLE_NAME FROM RDB$RELATIONS WHERE COALESCE(RDB$SYSTEM_FLAG, 0) = 0",
        );
        if let Some(prefix) = prefix {
            sql.push_str(&format!(
                " AND RDB$RELATION_NAME LIKE {} ESCAPE '{}'",
                esc.quote(&format!("{}%", esc.escape_like(prefix)))?,
                self.spec.like_escape
            ));
        }
        Ok(sql)
    }

    fn list_columns(&self, esc: &Escaper<'_>, table: &str) -> Result<String> {
        Ok(format!(
            "SELECT TRIM(RDB$FIELD_NAME) AS COLUMN_NAME FROM RDB$RELATION_FIELDS WHERE RDB$RELATION_NAME = {} ORDER BY RDB$FIELD_POSITION",
            esc.quote(table)?
        ))
    }

    fn insert_id_query(&self, _esc: &Escaper<'_>, sequence: Option<&str>) -> Result<Option<String>> {
        Ok(sequence.map(|generator| format!("SELECT GEN_ID({generator}, 0) AS ID FROM RDB$DATABASE")))
    }

    fn transaction_sql(&self, command: TxnCommand) -> Option<&'static str> {
        Some(match command {
            TxnCommand::Begin => "SET TRANSACTION",
            TxnCommand::Commit => "COMMIT",
            TxnCommand::Rollback => "ROLLBACK",
        })
    }

    fn process_column(&self, field: &FieldClauses) -> String {
        format!(
            "{} {}{}{}{}{}",
            field.name, field.data_type, field.length, field.default, field.null, field.unique
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
            AlterKind::Add => Ok(fields
                .iter()
                .map(|f| format!("ALTER TABLE {table} ADD {}", self.column_text(f)))
                .collect()),
            AlterKind::Drop => Ok(fields
                .iter()
                .map(|f| format!("ALTER TABLE {table} DROP {}", f.name))
                .collect()),
            AlterKind::Rename => rename_columns(self.name(), fields, |from, to| {
                format!("ALTER TABLE {table} ALTER COLUMN {from} TO {to}")
            }),
            AlterKind::Change => {
                let mut statements = Vec::new();
                for field in fields {
                    let column = format!("ALTER TABLE {table} ALTER COLUMN {}", field.name);
                    if let Some(literal) = &field.literal {
                        statements.push(format!("{column} TYPE {literal}"));
                    } else if !field.data_type.is_empty() {
                        statements.push(format!("{column} TYPE {}{}", field.data_type, field.length));
                    }
                    if let Some(default) = &field.default_value {
                        statements.push(format!("{column} SET DEFAULT {default}"));
                    }
                    if let Some(new_name) = &field.new_name {
                        statements.push(format!("{column} TO {new_name}"));
                    }
                }
                Ok(statements)
            }
        }
    }

    fn rename_table(&self, _esc: &Escaper<'_>, _from: &str, _to: &str) -> Result<String> {
        Err(DbError::unsupported(Operation::RenameTable, self.name()))
    }

    fn create_database(&self, _name: &str, _config: &ConnectionConfig) -> Result<Option<String>> {
        Err(DbError::unsupported(Operation::CreateDatabase, self.name()))
    }

    fn drop_database(&self, _name: &str) -> Result<Option<String>> {
        Err(DbError::unsupported(Operation::DropDatabase, self.name()))
    }
}
