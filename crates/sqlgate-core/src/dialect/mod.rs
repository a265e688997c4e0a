//! SQL dialects.
//!
//! A dialect is a [`DialectSpec`] (constant data: escape characters,
//! reserved words, LIMIT strategy, type remaps) plus a [`Dialect`]
//! implementation that overrides only the compile hooks where the backend
//! diverges from the defaults defined here.

mod cubrid;
mod db2;
mod firebird;
mod fourd;
mod generic;
pub mod limit;
mod mysql;
mod oracle;
mod postgres;
mod sqlite;
mod sqlsrv;

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

pub use cubrid::CubridDialect;
pub use db2::Db2Dialect;
pub use firebird::FirebirdDialect;
pub use fourd::FourDDialect;
pub use generic::GenericDialect;
pub use limit::{LimitStrategy, Page, SelectParts};
pub use mysql::MysqlDialect;
pub use oracle::OracleDialect;
pub use postgres::PostgresDialect;
pub use sqlite::SqliteDialect;
pub use sqlsrv::SqlsrvDialect;

use crate::config::ConnectionConfig;
use crate::driver::SessionState;
use crate::error::{DbError, Operation, Result};
use crate::escape::{EscapeChar, Escaper};
use crate::forge::FieldClauses;
use crate::value::SqlValue;

static VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)(?:\.(\d+))?").expect("valid version regex"));

/// How UNSIGNED is expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unsigned {
    /// Append the `UNSIGNED` keyword.
    Keyword,
    /// Widen the type through a `(from, to)` table.
    Remap(&'static [(&'static str, &'static str)]),
    /// Drop the flag.
    Ignored,
}

/// How a random-ordering seed reaches the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedStyle {
    /// No seeding; the seed is ignored.
    None,
    /// Seed inlined into the ORDER BY expression; `{seed}` is replaced.
    Inline(&'static str),
    /// Seed set by a separate session statement; `{seed}` is replaced.
    Session(&'static str),
}

/// Random-ordering keyword and seed handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RandomOrder {
    /// Expression used in ORDER BY.
    pub keyword: &'static str,
    /// Seed handling.
    pub seeded: SeedStyle,
}

/// Compiled random ordering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RandomOrdering {
    /// ORDER BY expression.
    pub expression: String,
    /// Statement that must run on the session first, if any.
    pub session_statement: Option<String>,
}

/// Constant description of a dialect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialectSpec {
    /// Dialect name used in errors and logs.
    pub name: &'static str,
    /// Identifier escape character(s).
    pub escape_char: EscapeChar,
    /// Identifiers never escaped (compared case-insensitively).
    pub reserved: &'static [&'static str],
    /// Random ordering.
    pub random: RandomOrder,
    /// Native TRUNCATE keyword; `None` falls back to `DELETE FROM`.
    pub truncate: Option<&'static str>,
    /// LIMIT/OFFSET strategy.
    pub limit: LimitStrategy,
    /// Whether UPDATE accepts ORDER BY and LIMIT.
    pub update_limit: bool,
    /// Whether DELETE accepts LIMIT.
    pub delete_limit: bool,
    /// UNSIGNED handling.
    pub unsigned: Unsigned,
    /// Auto-increment clause for integer columns.
    pub auto_increment: Option<&'static str>,
    /// Boolean literals `(true, false)`.
    pub bool_literals: (&'static str, &'static str),
    /// Keyword for nullable columns; empty means implicit.
    pub null_keyword: &'static str,
    /// LIKE escape character.
    pub like_escape: char,
    /// Parenthesise multiple FROM tables when joins are present.
    pub wrap_from_with_joins: bool,
    /// Whether table aliases take `AS`.
    pub table_alias_as: bool,
    /// Native `CREATE TABLE IF NOT EXISTS`.
    pub create_if_not_exists: bool,
    /// Native `DROP TABLE IF EXISTS`.
    pub drop_if_exists: bool,
    /// Secondary keys declared inside CREATE TABLE.
    pub inline_keys: bool,
}

impl DialectSpec {
    /// Standard-SQL defaults, named `name`.
    #[must_use]
    pub const fn standard(name: &'static str) -> Self {
        Self {
            name,
            escape_char: EscapeChar::Single('"'),
            reserved: &["*"],
            random: RandomOrder {
                keyword: "RAND()",
                seeded: SeedStyle::Inline("RAND({seed})"),
            },
            truncate: Some("TRUNCATE"),
            limit: LimitStrategy::LimitOffset,
            update_limit: false,
            delete_limit: false,
            unsigned: Unsigned::Keyword,
            auto_increment: Some(" AUTO_INCREMENT"),
            bool_literals: ("1", "0"),
            null_keyword: "",
            like_escape: '!',
            wrap_from_with_joins: true,
            table_alias_as: true,
            create_if_not_exists: true,
            drop_if_exists: true,
            inline_keys: false,
        }
    }
}

/// Transaction control commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxnCommand {
    /// Start a transaction.
    Begin,
    /// Commit.
    Commit,
    /// Roll back.
    Rollback,
}

/// ALTER TABLE kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlterKind {
    /// Add columns.
    Add,
    /// Drop columns.
    Drop,
    /// Change type/attributes (and possibly name) of columns.
    Change,
    /// Rename columns.
    Rename,
}

/// Escaped pieces of an UPDATE.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateParts {
    /// Escaped table.
    pub table: String,
    /// `col = value` assignments.
    pub assignments: Vec<String>,
    /// WHERE predicate without the keyword.
    pub where_clause: Option<String>,
    /// `ORDER BY ...` clause.
    pub order_by: Option<String>,
    /// Row limit.
    pub limit: Option<u64>,
}

/// Escaped pieces of a DELETE.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteParts {
    /// Escaped table.
    pub table: String,
    /// WHERE predicate without the keyword.
    pub where_clause: Option<String>,
    /// Row limit.
    pub limit: Option<u64>,
}

/// One column of a batch update: `(key, value)` pairs in row order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchColumn {
    /// Escaped column name.
    pub name: String,
    /// Escaped `(key, value)` pairs.
    pub cases: Vec<(String, String)>,
}

/// Escaped pieces of a CASE-based batch UPDATE.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchUpdate {
    /// Escaped table.
    pub table: String,
    /// Escaped index column.
    pub index: String,
    /// Changed columns, in first-seen order.
    pub columns: Vec<BatchColumn>,
    /// Escaped key values, in row order.
    pub keys: Vec<String>,
    /// Caller's WHERE predicate without the keyword.
    pub where_clause: Option<String>,
}

/// Returns true when `version` is at least `major.minor`.
///
/// An unknown version counts as current.
#[must_use]
pub fn version_at_least(version: Option<&str>, major: u32, minor: u32) -> bool {
    let Some(caps) = version.and_then(|v| VERSION.captures(v)) else {
        return true;
    };
    let found_major: u32 = caps[1].parse().unwrap_or(u32::MAX);
    let found_minor: u32 = caps.get(2).and_then(|m| m.as_str().parse().ok()).unwrap_or(0);
    (found_major, found_minor) >= (major, minor)
}

fn hex(bytes: &[u8]) -> String {
    use fmt::Write;
    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut out, b| {
        let _ = write!(out, "{b:02X}");
        out
    })
}

/// Dialect-specific SQL generation.
///
/// Every hook has a default; a dialect overrides only where it diverges.
/// Hooks receive already escaped identifiers and literals.
pub trait Dialect: fmt::Debug + Send + Sync {
    /// Constant description of the dialect.
    fn spec(&self) -> &DialectSpec;

    /// Dialect name.
    fn name(&self) -> &'static str {
        self.spec().name
    }

    // -- escaping ----------------------------------------------------------

    /// Escape characters for the current session.
    fn escape_char(&self, _session: &SessionState) -> EscapeChar {
        self.spec().escape_char
    }

    /// Returns true for identifiers that are never escaped.
    fn is_reserved(&self, identifier: &str) -> bool {
        self.spec()
            .reserved
            .iter()
            .any(|r| r.eq_ignore_ascii_case(identifier))
    }

    /// Boolean literal.
    fn bool_literal(&self, value: bool) -> &'static str {
        let (yes, no) = self.spec().bool_literals;
        if value {
            yes
        } else {
            no
        }
    }

    /// Binary literal.
    fn blob_literal(&self, bytes: &[u8]) -> String {
        format!("X'{}'", hex(bytes))
    }

    // -- SELECT ------------------------------------------------------------

    /// Joins the FROM tables.
    fn from_tables(&self, tables: &[String], has_joins: bool) -> String {
        let list = tables.join(", ");
        if has_joins && tables.len() > 1 && self.spec().wrap_from_with_joins {
            format!("({list})")
        } else {
            list
        }
    }

    /// Applies LIMIT/OFFSET to a SELECT.
    fn apply_limit(&self, parts: &SelectParts, page: Page, esc: &Escaper<'_>) -> String {
        limit::apply(self.spec().limit, parts, page, esc)
    }

    /// Random ordering, optionally seeded.
    fn random_order(&self, seed: Option<u64>) -> RandomOrdering {
        let random = self.spec().random;
        let keyword = RandomOrdering {
            expression: random.keyword.to_string(),
            session_statement: None,
        };
        match (seed, random.seeded) {
            (Some(seed), SeedStyle::Inline(template)) => RandomOrdering {
                expression: template.replace("{seed}", &seed.to_string()),
                session_statement: None,
            },
            (Some(seed), SeedStyle::Session(template)) => RandomOrdering {
                session_statement: Some(template.replace("{seed}", &seed.to_string())),
                ..keyword
            },
            (Some(_), SeedStyle::None) => {
                debug!(dialect = self.name(), "random seed ignored");
                keyword
            }
            (None, _) => keyword,
        }
    }

    // -- writes ------------------------------------------------------------

    /// Single-row INSERT.
    fn insert(&self, table: &str, columns: &[String], values: &[String]) -> String {
        format!(
            "INSERT INTO {table} ({}) VALUES ({})",
            columns.join(", "),
            values.join(", ")
        )
    }

    /// Multi-row INSERT.
    ///
    /// # Errors
    ///
    /// Dialects without a batch form return [`DbError::Unsupported`].
    fn insert_batch(&self, table: &str, columns: &[String], rows: &[Vec<String>]) -> Result<String> {
        let values: Vec<String> = rows.iter().map(|row| format!("({})", row.join(", "))).collect();
        Ok(format!(
            "INSERT INTO {table} ({}) VALUES {}",
            columns.join(", "),
            values.join(", ")
        ))
    }

    /// REPLACE.
    ///
    /// # Errors
    ///
    /// Unsupported unless the dialect has a replace form.
    fn replace(&self, _table: &str, _columns: &[String], _values: &[String]) -> Result<String> {
        Err(DbError::unsupported(Operation::Replace, self.name()))
    }

    /// UPDATE. LIMIT/ORDER BY have already been cleared when unsupported.
    fn update(&self, parts: &UpdateParts) -> String {
        let mut sql = format!("UPDATE {} SET {}", parts.table, parts.assignments.join(", "));
        if let Some(predicate) = &parts.where_clause {
            sql.push_str(" WHERE ");
            sql.push_str(predicate);
        }
        if let Some(order_by) = &parts.order_by {
            sql.push(' ');
            sql.push_str(order_by);
        }
        if let Some(limit) = parts.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }
        sql
    }

    /// CASE-based batch UPDATE.
    fn update_batch(&self, batch: &BatchUpdate) -> String {
        let assignments: Vec<String> = batch
            .columns
            .iter()
            .map(|column| {
                let whens: String = column
                    .cases
                    .iter()
                    .map(|(key, value)| format!(" WHEN {key} THEN {value}"))
                    .collect();
                format!(
                    "{name} = CASE {index}{whens} ELSE {name} END",
                    name = column.name,
                    index = batch.index
                )
            })
            .collect();
        let mut sql = format!(
            "UPDATE {} SET {} WHERE {} IN ({})",
            batch.table,
            assignments.join(", "),
            batch.index,
            batch.keys.join(",")
        );
        if let Some(predicate) = &batch.where_clause {
            sql.push_str(&format!(" AND ({predicate})"));
        }
        sql
    }

    /// DELETE. The default drops a LIMIT the dialect cannot express.
    fn delete(&self, parts: &DeleteParts) -> String {
        let mut sql = format!("DELETE FROM {}", parts.table);
        if let Some(predicate) = &parts.where_clause {
            sql.push_str(" WHERE ");
            sql.push_str(predicate);
        }
        match parts.limit {
            Some(limit) if self.spec().delete_limit => sql.push_str(&format!(" LIMIT {limit}")),
            Some(_) => tracing::warn!(dialect = self.name(), "LIMIT dropped from DELETE"),
            None => {}
        }
        sql
    }

    /// TRUNCATE, or `DELETE FROM` without native support.
    fn truncate(&self, table: &str) -> String {
        match self.spec().truncate {
            Some(keyword) => format!("{keyword} {table}"),
            None => format!("DELETE FROM {table}"),
        }
    }

    // -- catalog -----------------------------------------------------------

    /// Query listing table names, optionally restricted to a prefix.
    ///
    /// # Errors
    ///
    /// Propagates quoting failures for the prefix literal.
    fn list_tables(&self, esc: &Escaper<'_>, prefix: Option<&str>) -> Result<String> {
        let mut sql = String::from("SELECT TABLE_NAME FROM INFORMATION_SCHEMA.TABLES");
        if let Some(prefix) = prefix {
            let pattern = format!("{}%", esc.escape_like(prefix));
            sql.push_str(&format!(
                " WHERE TABLE_NAME LIKE {} ESCAPE '{}'",
                esc.quote(&pattern)?,
                self.spec().like_escape
            ));
        }
        Ok(sql)
    }

    /// Query listing a table's columns.
    ///
    /// # Errors
    ///
    /// Propagates quoting failures for the table literal.
    fn list_columns(&self, esc: &Escaper<'_>, table: &str) -> Result<String> {
        Ok(format!(
            "SELECT COLUMN_NAME FROM INFORMATION_SCHEMA.COLUMNS WHERE TABLE_NAME = {}",
            esc.quote(table)?
        ))
    }

    /// Column of the [`Dialect::list_columns`] result holding the name;
    /// `None` means the first column.
    fn column_name_field(&self) -> Option<&'static str> {
        None
    }

    /// Query returning the last generated id, when the transport cannot.
    ///
    /// # Errors
    ///
    /// Propagates quoting failures for sequence names.
    fn insert_id_query(&self, _esc: &Escaper<'_>, _sequence: Option<&str>) -> Result<Option<String>> {
        Ok(None)
    }

    // -- session -----------------------------------------------------------

    /// Statements run once after connecting.
    fn session_statements(&self, _config: &ConnectionConfig) -> Vec<String> {
        Vec::new()
    }

    /// Query run once after connecting whose first value feeds
    /// [`Dialect::apply_session_check`].
    fn session_check(&self) -> Option<&'static str> {
        None
    }

    /// Records the check result in the session.
    fn apply_session_check(&self, _session: &mut SessionState, _value: &SqlValue) {}

    /// SQL for a transaction command; `None` delegates to the transport.
    fn transaction_sql(&self, command: TxnCommand) -> Option<&'static str> {
        Some(match command {
            TxnCommand::Begin => "BEGIN TRANSACTION",
            TxnCommand::Commit => "COMMIT",
            TxnCommand::Rollback => "ROLLBACK",
        })
    }

    // -- forge -------------------------------------------------------------

    /// Rewrites abstract types into dialect types.
    fn attr_type(&self, _field: &mut FieldClauses) {}

    /// Applies a pending UNSIGNED flag.
    fn attr_unsigned(&self, field: &mut FieldClauses) {
        if !field.unsigned {
            return;
        }
        field.unsigned = false;
        match self.spec().unsigned {
            Unsigned::Keyword => field.unsigned_clause = String::from(" UNSIGNED"),
            Unsigned::Remap(table) => {
                for (from, to) in table {
                    if field.remap_type(from, to) {
                        break;
                    }
                }
            }
            Unsigned::Ignored => {}
        }
    }

    /// Applies auto-increment to an integer column.
    fn attr_auto_increment(&self, field: &mut FieldClauses, _primary_keys: &mut Vec<String>) {
        if !field.auto_increment || !field.is_integer() {
            return;
        }
        match self.spec().auto_increment {
            Some(clause) => field.auto_increment_clause = clause.to_string(),
            None => debug!(dialect = self.name(), column = %field.name, "auto-increment ignored"),
        }
    }

    /// Assembles a column clause.
    fn process_column(&self, field: &FieldClauses) -> String {
        format!(
            "{} {}{}{}{}{}{}{}",
            field.name,
            field.data_type,
            field.length,
            field.unsigned_clause,
            field.null,
            field.unique,
            field.default,
            field.auto_increment_clause
        )
    }

    /// Trailing table attributes for CREATE TABLE.
    fn create_table_attributes(&self, attributes: &[(String, String)], _config: &ConnectionConfig) -> String {
        attributes
            .iter()
            .map(|(key, value)| format!(" {} {value}", key.to_ascii_uppercase()))
            .collect()
    }

    /// ALTER TABLE statements.
    ///
    /// # Errors
    ///
    /// CHANGE is unsupported by default.
    fn alter_table(
        &self,
        _esc: &Escaper<'_>,
        kind: AlterKind,
        table: &str,
        fields: &[FieldClauses],
    ) -> Result<Vec<String>> {
        standard_alter(self, kind, table, fields)
    }

    /// Column text honoring a literal override.
    fn column_text(&self, field: &FieldClauses) -> String {
        match &field.literal {
            Some(literal) => format!("{} {literal}", field.name),
            None => self.process_column(field),
        }
    }

    /// DROP TABLE.
    ///
    /// # Errors
    ///
    /// Dialects that cannot drop tables return [`DbError::Unsupported`].
    fn drop_table(&self, table: &str, if_exists: bool, cascade: bool) -> Result<String> {
        let mut sql = String::from("DROP TABLE ");
        if if_exists && self.spec().drop_if_exists {
            sql.push_str("IF EXISTS ");
        }
        sql.push_str(table);
        if cascade {
            sql.push_str(" CASCADE");
        }
        Ok(sql)
    }

    /// RENAME TABLE.
    ///
    /// # Errors
    ///
    /// Dialects that cannot rename tables return [`DbError::Unsupported`].
    fn rename_table(&self, _esc: &Escaper<'_>, from: &str, to: &str) -> Result<String> {
        Ok(format!("ALTER TABLE {from} RENAME TO {to}"))
    }

    /// CREATE DATABASE; `Ok(None)` is a no-op.
    ///
    /// # Errors
    ///
    /// Dialects without databases return [`DbError::Unsupported`].
    fn create_database(&self, name: &str, _config: &ConnectionConfig) -> Result<Option<String>> {
        Ok(Some(format!("CREATE DATABASE {name}")))
    }

    /// DROP DATABASE; `Ok(None)` is a no-op.
    ///
    /// # Errors
    ///
    /// Dialects without databases return [`DbError::Unsupported`].
    fn drop_database(&self, name: &str) -> Result<Option<String>> {
        Ok(Some(format!("DROP DATABASE {name}")))
    }
}

/// ADD / DROP COLUMN / RENAME COLUMN in standard syntax; CHANGE is unsupported.
pub(crate) fn standard_alter<D: Dialect + ?Sized>(
    dialect: &D,
    kind: AlterKind,
    table: &str,
    fields: &[FieldClauses],
) -> Result<Vec<String>> {
    match kind {
        AlterKind::Add => Ok(fields
            .iter()
            .map(|f| format!("ALTER TABLE {table} ADD {}", dialect.column_text(f)))
            .collect()),
        AlterKind::Drop => Ok(fields
            .iter()
            .map(|f| format!("ALTER TABLE {table} DROP COLUMN {}", f.name))
            .collect()),
        AlterKind::Rename => rename_columns(dialect.name(), fields, |from, to| {
            format!("ALTER TABLE {table} RENAME COLUMN {from} TO {to}")
        }),
        AlterKind::Change => Err(DbError::unsupported(Operation::AlterTable, dialect.name())),
    }
}

/// Builds one RENAME statement per field; every field needs a new name.
pub(crate) fn rename_columns(
    dialect: &'static str,
    fields: &[FieldClauses],
    statement: impl Fn(&str, &str) -> String,
) -> Result<Vec<String>> {
    fields
        .iter()
        .map(|field| {
            field
                .new_name
                .as_deref()
                .map(|to| statement(&field.name, to))
                .ok_or_else(|| {
                    DbError::compile(
                        Operation::AlterTable,
                        dialect,
                        format!("column {} has no new name", field.name),
                    )
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_at_least() {
        assert!(version_at_least(None, 12, 1));
        assert!(version_at_least(Some("12.2.0.1"), 12, 1));
        assert!(!version_at_least(Some("11.2.0.4"), 12, 1));
        assert!(version_at_least(Some("Microsoft SQL Server 11.0.2100"), 11, 0));
        assert!(!version_at_least(Some("9.00.5000"), 10, 0));
    }

    #[test]
    fn test_hex() {
        assert_eq!(hex(&[0x00, 0xab, 0x10]), "00AB10");
    }

    #[test]
    fn test_default_hooks() {
        let dialect = GenericDialect::new(&ConnectionConfig::new("pdo"));
        assert_eq!(dialect.truncate("\"t\""), "TRUNCATE \"t\"");
        assert_eq!(
            dialect.from_tables(&["a".into(), "b".into()], true),
            "(a, b)"
        );
        assert_eq!(dialect.from_tables(&["a".into(), "b".into()], false), "a, b");
        assert_eq!(dialect.transaction_sql(TxnCommand::Begin), None);
    }
}
