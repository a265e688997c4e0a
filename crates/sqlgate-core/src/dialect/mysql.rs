//! MySQL / MariaDB.

use super::generic::{keyed_dsn, port_text};
use super::{standard_alter, AlterKind, Dialect, DialectSpec, LimitStrategy, TxnCommand};
use crate::config::ConnectionConfig;
use crate::error::Result;
use crate::escape::{EscapeChar, Escaper};
use crate::forge::FieldClauses;

/// MySQL dialect, shared by `mysqli` and `pdo/mysql`.
#[derive(Debug, Clone)]
pub struct MysqlDialect {
    spec: DialectSpec,
    database: String,
}

impl MysqlDialect {
    /// Creates the dialect for `config`.
    #[must_use]
    pub fn new(config: &ConnectionConfig) -> Self {
        let mut spec = DialectSpec::standard("mysql");
        spec.escape_char = EscapeChar::Single('`');
        spec.limit = LimitStrategy::LimitComma;
        spec.update_limit = true;
        spec.delete_limit = true;
        spec.null_keyword = "NULL";
        spec.inline_keys = true;
        Self {
            spec,
            database: config.database.clone(),
        }
    }

    /// `host=...;port=...;dbname=...;charset=...` for the native client.
    #[must_use]
    pub fn native_dsn(config: &ConnectionConfig) -> String {
        keyed_dsn("", &Self::dsn_pairs(config))
    }

    /// `mysql:host=...;port=...;dbname=...;charset=...`.
    #[must_use]
    pub fn pdo_dsn(config: &ConnectionConfig) -> String {
        keyed_dsn("mysql", &Self::dsn_pairs(config))
    }

    fn dsn_pairs(config: &ConnectionConfig) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("host", config.hostname.clone())];
        match config.extra_str("socket") {
            Some(socket) => pairs.push(("unix_socket", socket)),
            None => pairs.push(("port", port_text(config))),
        }
        pairs.push(("dbname", config.database.clone()));
        pairs.push(("charset", config.charset.clone()));
        pairs
    }
}

impl Dialect for MysqlDialect {
    fn spec(&self) -> &DialectSpec {
        &self.spec
    }

    fn replace(&self, table: &str, columns: &[String], values: &[String]) -> Result<String> {
        Ok(replace_into(table, columns, values))
    }

    fn list_tables(&self, esc: &Escaper<'_>, prefix: Option<&str>) -> Result<String> {
        let mut sql = format!("SHOW TABLES FROM {}", esc.escape_identifier(&self.database));
        if let Some(prefix) = prefix {
            sql.push_str(&format!(" LIKE {}", esc.quote(&format!("{}%", like_backslash(prefix)))?));
        }
        Ok(sql)
    }

    fn list_columns(&self, esc: &Escaper<'_>, table: &str) -> Result<String> {
        Ok(format!("SHOW COLUMNS FROM {}", esc.protect_identifier(table, true, &[])))
    }

    fn session_statements(&self, config: &ConnectionConfig) -> Vec<String> {
        let mut statements = Vec::new();
        if !config.charset.is_empty() {
            let mut names = format!("SET NAMES {}", config.charset);
            if !config.collate.is_empty() {
                names.push_str(&format!(" COLLATE {}", config.collate));
            }
            statements.push(names);
        }
        match config.extra("stricton").and_then(crate::SqlValue::as_bool) {
            Some(true) => statements.push(String::from(
                "SET SESSION sql_mode = CONCAT(@@sql_mode, ',', 'STRICT_ALL_TABLES')",
            )),
            Some(false) => statements.push(String::from(
                "SET SESSION sql_mode = REPLACE(REPLACE(REPLACE(@@sql_mode, 'STRICT_ALL_TABLES', ''), 'STRICT_TRANS_TABLES', ''), ',,', ',')",
            )),
            None => {}
        }
        statements
    }

    fn transaction_sql(&self, command: TxnCommand) -> Option<&'static str> {
        Some(match command {
            TxnCommand::Begin => "START TRANSACTION",
            TxnCommand::Commit => "COMMIT",
            TxnCommand::Rollback => "ROLLBACK",
        })
    }

    fn process_column(&self, field: &FieldClauses) -> String {
        mysql_column(field)
    }

    fn create_table_attributes(&self, attributes: &[(String, String)], config: &ConnectionConfig) -> String {
        mysql_table_attributes(attributes, config)
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

    fn create_database(&self, name: &str, config: &ConnectionConfig) -> Result<Option<String>> {
        let mut sql = format!("CREATE DATABASE {name}");
        if !config.charset.is_empty() {
            sql.push_str(&format!(" CHARACTER SET {}", config.charset));
        }
        if !config.collate.is_empty() {
            sql.push_str(&format!(" COLLATE {}", config.collate));
        }
        Ok(Some(sql))
    }
}

/// `REPLACE INTO`.
pub(crate) fn replace_into(table: &str, columns: &[String], values: &[String]) -> String {
    format!(
        "REPLACE INTO {table} ({}) VALUES ({})",
        columns.join(", "),
        values.join(", ")
    )
}

/// MySQL LIKE patterns escape with a backslash.
fn like_backslash(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Column clause with COMMENT and FIRST/AFTER.
pub(crate) fn mysql_column(field: &FieldClauses) -> String {
    let mut sql = format!(
        "{} {}{}{}{}{}{}{}",
        field.name,
        field.data_type,
        field.length,
        field.unsigned_clause,
        field.null,
        field.unique,
        field.default,
        field.auto_increment_clause
    );
    if let Some(comment) = &field.comment {
        sql.push_str(&format!(" COMMENT {comment}"));
    }
    sql.push_str(&field.position);
    sql
}

/// `KEY = value` attributes plus the connection charset and collation.
pub(crate) fn mysql_table_attributes(attributes: &[(String, String)], config: &ConnectionConfig) -> String {
    let mut sql: String = attributes
        .iter()
        .map(|(key, value)| format!(" {} = {value}", key.to_ascii_uppercase()))
        .collect();
    let upper = sql.to_ascii_uppercase();
    if !config.charset.is_empty() && !upper.contains("CHARACTER SET") && !upper.contains("CHARSET") {
        sql.push_str(&format!(" DEFAULT CHARACTER SET = {}", config.charset));
    }
    if !config.collate.is_empty() && !upper.contains("COLLATE") {
        sql.push_str(&format!(" COLLATE = {}", config.collate));
    }
    sql
}

/// `CHANGE COLUMN old new ...` when renaming, `MODIFY COLUMN` otherwise.
pub(crate) fn mysql_change(dialect: &dyn Dialect, table: &str, fields: &[FieldClauses]) -> Vec<String> {
    fields
        .iter()
        .map(|field| match &field.new_name {
            Some(new_name) => {
                let renamed = FieldClauses {
                    name: new_name.clone(),
                    ..field.clone()
                };
                format!(
                    "ALTER TABLE {table} CHANGE COLUMN {} {}",
                    field.name,
                    dialect.column_text(&renamed)
                )
            }
            None => format!("ALTER TABLE {table} MODIFY COLUMN {}", dialect.column_text(field)),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::escape::Quoting;
    use crate::forge::ColumnDefinition;
    use crate::value::SqlValue;

    fn config() -> ConnectionConfig {
        let mut config = ConnectionConfig::new("mysqli");
        config.hostname = String::from("localhost");
        config.port = Some(3306);
        config.database = String::from("app");
        config.charset = String::from("utf8mb4");
        config
    }

    #[test]
    fn test_pdo_dsn() {
        assert_eq!(
            MysqlDialect::pdo_dsn(&config()),
            "mysql:host=localhost;port=3306;dbname=app;charset=utf8mb4"
        );
        let mut with_socket = config();
        with_socket.set("socket", SqlValue::Text("/tmp/mysql.sock".into())).unwrap();
        assert_eq!(
            MysqlDialect::pdo_dsn(&with_socket),
            "mysql:host=localhost;unix_socket=/tmp/mysql.sock;dbname=app;charset=utf8mb4"
        );
    }

    #[test]
    fn test_session_statements() {
        let mut config = config();
        config.collate = String::from("utf8mb4_unicode_ci");
        config.set("stricton", SqlValue::Bool(true)).unwrap();
        let statements = MysqlDialect::new(&config).session_statements(&config);
        assert_eq!(statements[0], "SET NAMES utf8mb4 COLLATE utf8mb4_unicode_ci");
        assert!(statements[1].contains("STRICT_ALL_TABLES"));
    }

    #[test]
    fn test_list_tables_with_prefix() {
        let dialect = MysqlDialect::new(&config());
        let esc = Escaper::new(&dialect, dialect.spec().escape_char, Quoting::Backslash, "", true);
        assert_eq!(
            dialect.list_tables(&esc, Some("app_")).unwrap(),
            "SHOW TABLES FROM `app` LIKE 'app\\\\_%'"
        );
    }

    #[test]
    fn test_change_column_renames() {
        let dialect = MysqlDialect::new(&config());
        let esc = Escaper::new(&dialect, dialect.spec().escape_char, Quoting::Backslash, "", true);
        let column = ColumnDefinition::new("name", "VARCHAR")
            .constraint("64")
            .rename_to("full_name");
        let field = FieldClauses::from_definition(&column, &esc, false).unwrap();
        let sql = dialect.alter_table(&esc, AlterKind::Change, "`users`", &[field]).unwrap();
        assert_eq!(sql, vec!["ALTER TABLE `users` CHANGE COLUMN `name` `full_name` VARCHAR(64)"]);
    }
}
