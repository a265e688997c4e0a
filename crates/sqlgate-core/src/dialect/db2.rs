//! IBM DB2.

use super::{
    rename_columns, standard_alter, AlterKind, DeleteParts, Dialect, DialectSpec, LimitStrategy,
    TxnCommand, Unsigned,
};
use crate::config::ConnectionConfig;
use crate::error::{DbError, Operation, Result};
use crate::escape::Escaper;
use crate::forge::FieldClauses;

/// ODBC driver name used when connecting by host.
const ODBC_DRIVER: &str = "{IBM DB2 ODBC DRIVER}";

/// DB2 dialect (`ibm_db2`, `pdo/ibm`, `odbc/ibm`).
#[derive(Debug, Clone)]
pub struct Db2Dialect {
    spec: DialectSpec,
}

impl Db2Dialect {
    /// Creates the dialect.
    #[must_use]
    pub fn new(_config: &ConnectionConfig) -> Self {
        let mut spec = DialectSpec::standard("ibm");
        spec.truncate = Some("TRUNCATE TABLE");
        spec.limit = LimitStrategy::FetchFirst;
        spec.unsigned = Unsigned::Ignored;
        spec.auto_increment = Some(" GENERATED BY DEFAULT AS IDENTITY");
        spec.create_if_not_exists = false;
        spec.drop_if_exists = false;
        Self { spec }
    }

    /// A catalogued `DSN=` name, or a full TCP/IP connection string.
    #[must_use]
    pub fn native_dsn(config: &ConnectionConfig) -> String {
        if config.hostname.is_empty() && config.port.is_none() {
            return format!("DSN={}", config.database);
        }
        super::generic::keyed_dsn(
            "",
            &[
                ("DRIVER", ODBC_DRIVER.to_string()),
                ("DATABASE", config.database.clone()),
                ("HOSTNAME", config.hostname.clone()),
                ("PORT", super::generic::port_text(config)),
                ("PROTOCOL", String::from("TCPIP")),
            ],
        )
    }

    /// `ibm:` plus the native string.
    #[must_use]
    pub fn pdo_dsn(config: &ConnectionConfig) -> String {
        format!("ibm:{}", Self::native_dsn(config))
    }
}

impl Dialect for Db2Dialect {
    fn spec(&self) -> &DialectSpec {
        &self.spec
    }

    fn delete(&self, parts: &DeleteParts) -> String {
        let filter = parts
            .where_clause
            .as_ref()
            .map(|p| format!(" WHERE {p}"))
            .unwrap_or_default();
        match parts.limit {
            Some(limit) => format!(
                "DELETE FROM (SELECT * FROM {}{filter} FETCH FIRST {limit} ROWS ONLY)",
                parts.table
            ),
            None => format!("DELETE FROM {}{filter}", parts.table),
        }
    }

    fn truncate(&self, table: &str) -> String {
        format!("TRUNCATE TABLE {table} IMMEDIATE")
    }

    fn list_tables(&self, esc: &Escaper<'_>, prefix: Option<&str>) -> Result<String> {
        let mut sql =
            String::from("SELECT TABNAME FROM SYSCAT.TABLES WHERE TYPE = 'T' AND TABSCHEMA = CURRENT SCHEMA");
        if let Some(prefix) = prefix {
            sql.push_str(&format!(
                " AND TABNAME LIKE {} ESCAPE '{}'",
                esc.quote(&format!("{}%", esc.escape_like(prefix)))?,
                self.spec.like_escape
            ));
        }
        Ok(sql)
    }

    fn list_columns(&self, esc: &Escaper<'_>, table: &str) -> Result<String> {
        Ok(format!(
            "SELECT COLNAME FROM SYSCAT.COLUMNS WHERE TABNAME = {} ORDER BY COLNO",
            esc.quote(table)?
        ))
    }

    fn insert_id_query(&self, _esc: &Escaper<'_>, _sequence: Option<&str>) -> Result<Option<String>> {
        Ok(Some(String::from(
            "SELECT IDENTITY_VAL_LOCAL() AS ins_id FROM SYSIBM.SYSDUMMY1",
        )))
    }

    /// The native client drives transactions through its auto-commit switch.
    fn transaction_sql(&self, _command: TxnCommand) -> Option<&'static str> {
        None
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
            let column = format!("ALTER TABLE {table} ALTER COLUMN {}", field.name);
            if let Some(literal) = &field.literal {
                statements.push(format!("{column} SET DATA TYPE {literal}"));
            } else if !field.data_type.is_empty() {
                statements.push(format!("{column} SET DATA TYPE {}{}", field.data_type, field.length));
            }
            match field.nullable {
                Some(true) => statements.push(format!("{column} DROP NOT NULL")),
                Some(false) => statements.push(format!("{column} SET NOT NULL")),
                None => {}
            }
            if let Some(default) = &field.default_value {
                statements.push(format!("{column} SET DEFAULT {default}"));
            }
        }
        let renamed: Vec<FieldClauses> = fields.iter().filter(|f| f.new_name.is_some()).cloned().collect();
        statements.extend(rename_columns(self.name(), &renamed, |from, to| {
            format!("ALTER TABLE {table} RENAME COLUMN {from} TO {to}")
        })?);
        Ok(statements)
    }

    fn drop_table(&self, table: &str, _if_exists: bool, _cascade: bool) -> Result<String> {
        Ok(format!("DROP TABLE {table}"))
    }

    fn rename_table(&self, _esc: &Escaper<'_>, from: &str, to: &str) -> Result<String> {
        Ok(format!("RENAME TABLE {from} TO {to}"))
    }

    fn create_database(&self, _name: &str, _config: &ConnectionConfig) -> Result<Option<String>> {
        Err(DbError::unsupported(Operation::CreateDatabase, self.name()))
    }

    fn drop_database(&self, _name: &str) -> Result<Option<String>> {
        Err(DbError::unsupported(Operation::DropDatabase, self.name()))
    }
}
