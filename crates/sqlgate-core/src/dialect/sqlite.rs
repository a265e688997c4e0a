//! SQLite 3.

use super::{
    limit, standard_alter, AlterKind, DeleteParts, Dialect, DialectSpec, Page, RandomOrder,
    SeedStyle, SelectParts, Unsigned,
};
use crate::config::ConnectionConfig;
use crate::error::{DbError, Operation, Result};
use crate::escape::Escaper;
use crate::forge::FieldClauses;

/// SQLite dialect (`sqlite3`, `pdo/sqlite`).
#[derive(Debug, Clone)]
pub struct SqliteDialect {
    spec: DialectSpec,
}

impl SqliteDialect {
    /// Creates the dialect.
    #[must_use]
    pub fn new(_config: &ConnectionConfig) -> Self {
        let mut spec = DialectSpec::standard("sqlite3");
        spec.random = RandomOrder {
            keyword: "RANDOM()",
            seeded: SeedStyle::None,
        };
        spec.truncate = None;
        spec.unsigned = Unsigned::Ignored;
        spec.auto_increment = Some(" AUTOINCREMENT");
        Self { spec }
    }

    /// The database file path, or `:memory:`.
    #[must_use]
    pub fn native_dsn(config: &ConnectionConfig) -> String {
        if config.database.is_empty() {
            String::from(":memory:")
        } else {
            config.database.clone()
        }
    }

    /// `sqlite:<path>`.
    #[must_use]
    pub fn pdo_dsn(config: &ConnectionConfig) -> String {
        format!("sqlite:{}", Self::native_dsn(config))
    }
}

impl Dialect for SqliteDialect {
    fn spec(&self) -> &DialectSpec {
        &self.spec
    }

    /// OFFSET needs a LIMIT; `-1` means no limit.
    fn apply_limit(&self, parts: &SelectParts, page: Page, esc: &Escaper<'_>) -> String {
        let page = Page::new(page.limit, page.offset);
        match (page.limit, page.offset) {
            (None, Some(offset)) => format!("{} LIMIT -1 OFFSET {offset}", parts.to_sql()),
            _ => limit::apply(self.spec.limit, parts, page, esc),
        }
    }

    fn replace(&self, table: &str, columns: &[String], values: &[String]) -> Result<String> {
        Ok(format!(
            "INSERT OR REPLACE INTO {table} ({}) VALUES ({})",
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
                "DELETE FROM {table} WHERE rowid IN (SELECT rowid FROM {table}{filter} LIMIT {limit})",
                table = parts.table
            ),
            None => format!("DELETE FROM {}{filter}", parts.table),
        }
    }

    fn list_tables(&self, esc: &Escaper<'_>, prefix: Option<&str>) -> Result<String> {
        let mut sql = String::from(
            "SELECT \"NAME\" FROM \"SQLITE_MASTER\" WHERE \"TYPE\" = 'table' AND \"NAME\" NOT LIKE 'sqlite!_%' ESCAPE '!'",
        );
        if let Some(prefix) = prefix {
            sql.push_str(&format!(
                " AND \"NAME\" LIKE {} ESCAPE '{}'",
                esc.quote(&format!("{}%", esc.escape_like(prefix)))?,
                self.spec.like_escape
            ));
        }
        Ok(sql)
    }

    fn list_columns(&self, esc: &Escaper<'_>, table: &str) -> Result<String> {
        Ok(format!("PRAGMA TABLE_INFO({})", esc.protect_identifier(table, true, &[])))
    }

    fn column_name_field(&self) -> Option<&'static str> {
        Some("name")
    }

    fn session_statements(&self, config: &ConnectionConfig) -> Vec<String> {
        match config.extra("foreign_keys").and_then(crate::SqlValue::as_bool) {
            Some(true) => vec![String::from("PRAGMA foreign_keys = ON")],
            Some(false) => vec![String::from("PRAGMA foreign_keys = OFF")],
            None => Vec::new(),
        }
    }

    fn attr_type(&self, field: &mut FieldClauses) {
        if matches!(field.data_type.as_str(), "ENUM" | "SET") {
            field.data_type = String::from("TEXT");
            field.length.clear();
        }
    }

    /// `INTEGER PRIMARY KEY AUTOINCREMENT` is the whole column definition;
    /// the table-level primary key is dropped.
    fn attr_auto_increment(&self, field: &mut FieldClauses, primary_keys: &mut Vec<String>) {
        if !field.auto_increment || !field.is_integer() {
            return;
        }
        field.data_type = String::from("INTEGER PRIMARY KEY");
        field.auto_increment_clause = String::from(" AUTOINCREMENT");
        field.length.clear();
        field.unsigned_clause.clear();
        field.null.clear();
        field.unique.clear();
        field.default.clear();
        field.default_value = None;
        primary_keys.clear();
    }

    fn alter_table(
        &self,
        _esc: &Escaper<'_>,
        kind: AlterKind,
        table: &str,
        fields: &[FieldClauses],
    ) -> Result<Vec<String>> {
        match kind {
            AlterKind::Drop | AlterKind::Change => {
                Err(DbError::unsupported(Operation::AlterTable, self.name()))
            }
            _ => standard_alter(self, kind, table, fields),
        }
    }

    fn drop_table(&self, table: &str, if_exists: bool, _cascade: bool) -> Result<String> {
        Ok(if if_exists {
            format!("DROP TABLE IF EXISTS {table}")
        } else {
            format!("DROP TABLE {table}")
        })
    }

    /// The database file is created on connect.
    fn create_database(&self, _name: &str, _config: &ConnectionConfig) -> Result<Option<String>> {
        Ok(None)
    }

    fn drop_database(&self, _name: &str) -> Result<Option<String>> {
        Err(DbError::unsupported(Operation::DropDatabase, self.name()))
    }
}
