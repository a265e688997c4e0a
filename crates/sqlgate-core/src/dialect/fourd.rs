//! 4D SQL server.

use super::generic::{keyed_dsn, port_text};
use super::{standard_alter, AlterKind, Dialect, DialectSpec, TxnCommand, Unsigned};
use crate::config::ConnectionConfig;
use crate::error::{DbError, Operation, Result};
use crate::escape::{EscapeChar, Escaper};
use crate::forge::FieldClauses;

/// 4D dialect (`pdo/4d`).
#[derive(Debug, Clone)]
pub struct FourDDialect {
    spec: DialectSpec,
}

impl FourDDialect {
    /// Creates the dialect.
    #[must_use]
    pub fn new(_config: &ConnectionConfig) -> Self {
        let mut spec = DialectSpec::standard("4d");
        spec.escape_char = EscapeChar::Pair('[', ']');
        spec.truncate = Some("TRUNCATE TABLE");
        spec.unsigned = Unsigned::Ignored;
        spec.create_if_not_exists = false;
        spec.drop_if_exists = false;
        Self { spec }
    }

    /// `4D:host=...;port=...;dbname=...;charset=...`.
    #[must_use]
    pub fn pdo_dsn(config: &ConnectionConfig) -> String {
        keyed_dsn(
            "4D",
            &[
                ("host", config.hostname.clone()),
                ("port", port_text(config)),
                ("dbname", config.database.clone()),
                ("charset", config.charset.clone()),
            ],
        )
    }
}

impl Dialect for FourDDialect {
    fn spec(&self) -> &DialectSpec {
        &self.spec
    }

    fn list_tables(&self, esc: &Escaper<'_>, prefix: Option<&str>) -> Result<String> {
        let mut sql = String::from("SELECT TABLE_NAME FROM _USER_TABLES");
        if let Some(prefix) = prefix {
            sql.push_str(&format!(
                " WHERE TABLE_NAME LIKE {}",
                esc.quote(&format!("{}%", esc.escape_like(prefix)))?
            ));
        }
        Ok(sql)
    }

    fn list_columns(&self, esc: &Escaper<'_>, table: &str) -> Result<String> {
        Ok(format!(
            "SELECT COLUMN_NAME FROM _USER_COLUMNS WHERE TABLE_NAME = {}",
            esc.quote(table)?
        ))
    }

    fn transaction_sql(&self, command: TxnCommand) -> Option<&'static str> {
        Some(match command {
            TxnCommand::Begin => "START TRANSACTION",
            TxnCommand::Commit => "COMMIT",
            TxnCommand::Rollback => "ROLLBACK",
        })
    }

    fn alter_table(
        &self,
        _esc: &Escaper<'_>,
        kind: AlterKind,
        table: &str,
        fields: &[FieldClauses],
    ) -> Result<Vec<String>> {
        match kind {
            AlterKind::Change | AlterKind::Rename => {
                Err(DbError::unsupported(Operation::AlterTable, self.name()))
            }
            _ => standard_alter(self, kind, table, fields),
        }
    }

    fn rename_table(&self, _esc: &Escaper<'_>, _from: &str, _to: &str) -> Result<String> {
        Err(DbError::unsupported(Operation::RenameTable, self.name()))
    }
}
