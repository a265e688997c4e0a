//! Microsoft SQL Server, through `sqlsrv` or FreeTDS `dblib`.

use super::generic::{keyed_dsn, port_text};
use super::{
    rename_columns, version_at_least, AlterKind, DeleteParts, Dialect, DialectSpec,
    LimitStrategy, RandomOrder, SeedStyle, TxnCommand, Unsigned,
};
use crate::config::ConnectionConfig;
use crate::driver::SessionState;
use crate::error::{DbError, Operation, Result};
use crate::escape::{EscapeChar, Escaper};
use crate::forge::FieldClauses;
use crate::value::SqlValue;

const UNSIGNED: &[(&str, &str)] = &[
    ("TINYINT", "SMALLINT"),
    ("SMALLINT", "INT"),
    ("INT", "BIGINT"),
    ("INTEGER", "BIGINT"),
    ("REAL", "FLOAT"),
];

/// SQL Server dialect.
///
/// Identifiers are bracketed unless the session runs with
/// `QUOTED_IDENTIFIER ON`, which is checked once after connecting.
#[derive(Debug, Clone)]
pub struct SqlsrvDialect {
    spec: DialectSpec,
    batch_insert: bool,
}

impl SqlsrvDialect {
    /// Creates the dialect for `config`; pagination and batch inserts depend
    /// on the server version.
    #[must_use]
    pub fn new(config: &ConnectionConfig) -> Self {
        let version = config.version.as_deref();
        let mut spec = DialectSpec::standard("sqlsrv");
        spec.escape_char = EscapeChar::Pair('[', ']');
        spec.random = RandomOrder {
            keyword: "NEWID()",
            seeded: SeedStyle::None,
        };
        spec.truncate = Some("TRUNCATE TABLE");
        spec.limit = if version_at_least(version, 11, 0) {
            LimitStrategy::OffsetFetch { requires_order: true }
        } else {
            LimitStrategy::Top
        };
        spec.unsigned = Unsigned::Remap(UNSIGNED);
        spec.auto_increment = Some(" IDENTITY(1,1)");
        spec.null_keyword = "NULL";
        spec.create_if_not_exists = false;
        spec.drop_if_exists = false;
        Self {
            spec,
            batch_insert: version_at_least(version, 10, 0),
        }
    }

    /// `Server=host,port;Database=...;APP=...`.
    #[must_use]
    pub fn native_dsn(config: &ConnectionConfig) -> String {
        let server = match config.port {
            Some(port) => format!("{},{port}", config.hostname),
            None => config.hostname.clone(),
        };
        keyed_dsn(
            "",
            &[
                ("Server", server),
                ("Database", config.database.clone()),
                ("APP", config.extra_str("appname").unwrap_or_default()),
            ],
        )
    }

    /// `sqlsrv:Server=host,port;Database=...`.
    #[must_use]
    pub fn pdo_dsn(config: &ConnectionConfig) -> String {
        format!("sqlsrv:{}", Self::native_dsn(config))
    }

    /// `dblib:host=host:port;dbname=...;charset=...;appname=...`.
    #[must_use]
    pub fn dblib_dsn(config: &ConnectionConfig) -> String {
        let host = if config.port.is_some() {
            format!("{}:{}", config.hostname, port_text(config))
        } else {
            config.hostname.clone()
        };
        keyed_dsn(
            "dblib",
            &[
                ("host", host),
                ("dbname", config.database.clone()),
                ("charset", config.charset.clone()),
                ("appname", config.extra_str("appname").unwrap_or_default()),
            ],
        )
    }
}

impl Dialect for SqlsrvDialect {
    fn spec(&self) -> &DialectSpec {
        &self.spec
    }

    fn escape_char(&self, session: &SessionState) -> EscapeChar {
        if session.quoted_identifier == Some(true) {
            EscapeChar::Single('"')
        } else {
            self.spec.escape_char
        }
    }

    fn insert_batch(&self, table: &str, columns: &[String], rows: &[Vec<String>]) -> Result<String> {
        if !self.batch_insert {
            return Err(DbError::unsupported(Operation::InsertBatch, self.name()));
        }
        let values: Vec<String> = rows.iter().map(|row| format!("({})", row.join(", "))).collect();
        Ok(format!(
            "INSERT INTO {table} ({}) VALUES {}",
            columns.join(", "),
            values.join(", ")
        ))
    }

    fn delete(&self, parts: &DeleteParts) -> String {
        let filter = parts
            .where_clause
            .as_ref()
            .map(|p| format!(" WHERE {p}"))
            .unwrap_or_default();
        match parts.limit {
            Some(limit) => format!(
                "WITH delete_cte AS (SELECT TOP {limit} * FROM {}{filter}) DELETE FROM delete_cte",
                parts.table
            ),
            None => format!("DELETE FROM {}{filter}", parts.table),
        }
    }

    fn list_tables(&self, esc: &Escaper<'_>, prefix: Option<&str>) -> Result<String> {
        let mut sql = String::from("SELECT name FROM sysobjects WHERE type = 'U'");
        if let Some(prefix) = prefix {
            sql.push_str(&format!(
                " AND name LIKE {} ESCAPE '{}'",
                esc.quote(&format!("{}%", esc.escape_like(prefix)))?,
                self.spec.like_escape
            ));
        }
        sql.push_str(" ORDER BY name");
        Ok(sql)
    }

    fn insert_id_query(&self, _esc: &Escaper<'_>, _sequence: Option<&str>) -> Result<Option<String>> {
        Ok(Some(String::from("SELECT SCOPE_IDENTITY() AS insert_id")))
    }

    fn session_check(&self) -> Option<&'static str> {
        Some("SELECT CASE WHEN (@@OPTIONS | 256) = @@OPTIONS THEN 1 ELSE 0 END AS qi")
    }

    fn apply_session_check(&self, session: &mut SessionState, value: &SqlValue) {
        session.quoted_identifier = value.as_bool().or_else(|| value.as_i64().map(|v| v == 1));
    }

    fn transaction_sql(&self, command: TxnCommand) -> Option<&'static str> {
        Some(match command {
            TxnCommand::Begin => "BEGIN TRANSACTION",
            TxnCommand::Commit => "COMMIT TRANSACTION",
            TxnCommand::Rollback => "ROLLBACK TRANSACTION",
        })
    }

    fn alter_table(
        &self,
        esc: &Escaper<'_>,
        kind: AlterKind,
        table: &str,
        fields: &[FieldClauses],
    ) -> Result<Vec<String>> {
        let bare_table = esc.unescape_identifier(table);
        let sp_rename = |from: &str, to: &str| {
            format!(
                "EXEC sp_rename '{}', '{}', 'COLUMN'",
                format!("{bare_table}.{}", esc.unescape_identifier(from)).replace('\'', "''"),
                esc.unescape_identifier(to).replace('\'', "''")
            )
        };
        match kind {
            AlterKind::Add => Ok(vec![format!(
                "ALTER TABLE {table} ADD {}",
                fields
                    .iter()
                    .map(|f| self.column_text(f))
                    .collect::<Vec<_>>()
                    .join(", ")
            )]),
            AlterKind::Drop => Ok(vec![format!(
                "ALTER TABLE {table} DROP COLUMN {}",
                fields.iter().map(|f| f.name.as_str()).collect::<Vec<_>>().join(", ")
            )]),
            AlterKind::Rename => rename_columns(self.name(), fields, sp_rename),
            AlterKind::Change => {
                let mut statements = Vec::new();
                for field in fields {
                    let definition = match &field.literal {
                        Some(literal) => literal.clone(),
                        None => format!("{}{}{}", field.data_type, field.length, field.null),
                    };
                    statements.push(format!("ALTER TABLE {table} ALTER COLUMN {} {definition}", field.name));
                    if let Some(default) = &field.default_value {
                        statements.push(format!("ALTER TABLE {table} ADD DEFAULT {default} FOR {}", field.name));
                    }
                    if let Some(new_name) = &field.new_name {
                        statements.push(sp_rename(&field.name, new_name));
                    }
                }
                Ok(statements)
            }
        }
    }

    fn drop_table(&self, table: &str, if_exists: bool, _cascade: bool) -> Result<String> {
        if if_exists {
            Ok(format!(
                "IF EXISTS (SELECT * FROM sysobjects WHERE ID = object_id(N'{}') AND OBJECTPROPERTY(id, N'IsUserTable') = 1) DROP TABLE {table}",
                table.replace('\'', "''")
            ))
        } else {
            Ok(format!("DROP TABLE {table}"))
        }
    }

    fn rename_table(&self, esc: &Escaper<'_>, from: &str, to: &str) -> Result<String> {
        Ok(format!(
            "EXEC sp_rename '{}', '{}'",
            esc.unescape_identifier(from).replace('\'', "''"),
            esc.unescape_identifier(to).replace('\'', "''")
        ))
    }
}
