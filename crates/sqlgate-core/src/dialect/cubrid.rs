//! CUBRID, a MySQL-flavoured server.

use super::generic::{keyed_dsn, port_text};
use super::mysql::{mysql_change, replace_into};
use super::{standard_alter, AlterKind, Dialect, DialectSpec, LimitStrategy, TxnCommand, Unsigned};
use crate::config::ConnectionConfig;
use crate::error::Result;
use crate::escape::{EscapeChar, Escaper};
use crate::forge::FieldClauses;

/// CUBRID dialect (`cubrid`, `pdo/cubrid`).
#[derive(Debug, Clone)]
pub struct CubridDialect {
    spec: DialectSpec,
}

impl CubridDialect {
    /// Creates the dialect.
    #[must_use]
    pub fn new(_config: &ConnectionConfig) -> Self {
        let mut spec = DialectSpec::standard("cubrid");
        spec.escape_char = EscapeChar::Single('`');
        spec.limit = LimitStrategy::LimitComma;
        spec.update_limit = true;
        spec.delete_limit = true;
        spec.unsigned = Unsigned::Ignored;
        spec.null_keyword = "NULL";
        Self { spec }
    }

    /// `CUBRID:host:port:database:::`.
    #[must_use]
    pub fn native_dsn(config: &ConnectionConfig) -> String {
        format!(
            "CUBRID:{}:{}:{}:::",
            config.hostname,
            port_text(config),
            config.database
        )
    }

    /// `cubrid:host=...;port=...;dbname=...`.
    #[must_use]
    pub fn pdo_dsn(config: &ConnectionConfig) -> String {
        keyed_dsn(
            "cubrid",
            &[
                ("host", config.hostname.clone()),
                ("port", port_text(config)),
                ("dbname", config.database.clone()),
            ],
        )
    }
}

impl Dialect for CubridDialect {
    fn spec(&self) -> &DialectSpec {
        &self.spec
    }

    fn replace(&self, table: &str, columns: &[String], values: &[String]) -> Result<String> {
        Ok(replace_into(table, columns, values))
    }

    fn list_tables(&self, esc: &Escaper<'_>, prefix: Option<&str>) -> Result<String> {
        let mut sql = String::from("SELECT class_name FROM db_class WHERE is_system_class = 'NO'");
        if let Some(prefix) = prefix {
            sql.push_str(&format!(
                " AND class_name LIKE {} ESCAPE '{}'",
                esc.quote(&format!("{}%", esc.escape_like(prefix)))?,
                self.spec.like_escape
            ));
        }
        Ok(sql)
    }

    fn list_columns(&self, esc: &Escaper<'_>, table: &str) -> Result<String> {
        Ok(format!("SHOW COLUMNS FROM {}", esc.protect_identifier(table, true, &[])))
    }

    /// Transactions run through the client's auto-commit switch.
    fn transaction_sql(&self, _command: TxnCommand) -> Option<&'static str> {
        None
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
            "LONGTEXT" => field.data_type = String::from("STRING"),
            _ => {}
        }
    }

    fn alter_table(
        &self,
        _esc: &Escaper<'_>,
        kind: AlterKind,
        table: &str,
        fields: &[FieldClauses],
    ) -> Result<Vec<String>> {
        match kind {
            AlterKind::Change => Ok(mysql_change(self, table, fields)),
            _ => standard_alter(self, kind, table, fields),
        }
    }
}
