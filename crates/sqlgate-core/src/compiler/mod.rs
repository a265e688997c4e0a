//! Statement compiler.
//!
//! Turns a [`QueryBuilder`] plus an operation into SQL for one driver,
//! asking the dialect at every point where backends diverge: FROM
//! wrapping, pagination, batch forms, UPDATE/DELETE limits and TRUNCATE.
//! Every compiled statement is logged at debug level.

mod clause;

use tracing::{debug, warn};

use crate::builder::{Operand, QueryBuilder, Record, SelectItem};
use crate::config::ConnectionConfig;
use crate::dialect::{BatchColumn, BatchUpdate, DeleteParts, Dialect, Page, SelectParts, UpdateParts};
use crate::driver::Driver;
use crate::error::{DbError, Operation, Result};
use crate::escape::{Escaper, Quoter};
use clause::ClauseWriter;

/// Rows per INSERT/UPDATE batch statement.
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Alias of the row count returned by [`Compiler::compile_count`].
pub const COUNT_ALIAS: &str = "numrows";

/// Alias of the subquery wrapped by [`Compiler::compile_count`].
const COUNT_SUBQUERY: &str = "sg_count_all_results";

/// Compiles builder state for one driver.
#[derive(Debug, Clone, Copy)]
pub struct Compiler<'a> {
    esc: Escaper<'a>,
    config: &'a ConnectionConfig,
}

impl<'a> Compiler<'a> {
    /// Creates a compiler bound to `driver`'s dialect, session and config.
    #[must_use]
    pub fn new(driver: &'a Driver) -> Self {
        Self {
            esc: driver.escaper(),
            config: driver.config(),
        }
    }

    /// Quotes string literals through `quoter`, normally the connected
    /// transport.
    #[must_use]
    pub fn with_quoter(mut self, quoter: &'a dyn Quoter) -> Self {
        self.esc = self.esc.with_quoter(quoter);
        self
    }

    /// The escaper in use.
    #[must_use]
    pub const fn escaper(&self) -> &Escaper<'a> {
        &self.esc
    }

    /// The driver's configuration.
    #[must_use]
    pub const fn config(&self) -> &'a ConnectionConfig {
        self.config
    }

    /// The dialect compiled for.
    #[must_use]
    pub fn dialect(&self) -> &'a dyn Dialect {
        self.esc.dialect()
    }

    fn writer<'e>(&'e self, qb: &'e QueryBuilder) -> ClauseWriter<'e, 'a> {
        ClauseWriter {
            esc: &self.esc,
            aliases: &qb.aliases,
        }
    }

    fn error(&self, operation: Operation, message: impl Into<String>) -> DbError {
        DbError::compile(operation, self.dialect().name(), message)
    }

    fn log(&self, operation: Operation, sql: &str) {
        debug!(dialect = self.dialect().name(), %operation, sql, "compiled statement");
    }

    /// The target table: `table` if given, otherwise the first FROM table.
    fn target(&self, qb: &QueryBuilder, table: Option<&str>, operation: Operation) -> Result<String> {
        table
            .or_else(|| qb.from.first().map(String::as_str))
            .filter(|t| !t.trim().is_empty())
            .map(|t| self.table(t))
            .ok_or_else(|| self.error(operation, "no table given"))
    }

    fn table(&self, table: &str) -> String {
        self.esc.protect_identifier(table, true, &[])
    }

    // -- SELECT ------------------------------------------------------------

    fn select_parts(&self, qb: &QueryBuilder, table: Option<&str>) -> Result<SelectParts> {
        let writer = self.writer(qb);
        let columns = qb
            .select
            .iter()
            .map(|item| match item {
                SelectItem::Column(column) => writer.column(column),
                SelectItem::Raw(sql) => sql.clone(),
                SelectItem::Aggregate {
                    function,
                    column,
                    alias,
                } => format!(
                    "{}({}) AS {}",
                    function.as_str(),
                    writer.column(column),
                    self.esc.protect_name(alias)
                ),
            })
            .collect();

        let mut body = String::new();
        let mut tables: Vec<String> = table.map(|t| self.table(t)).into_iter().collect();
        if tables.is_empty() {
            tables = qb.from.iter().map(|t| self.table(t)).collect();
        }
        if !tables.is_empty() {
            body.push_str(" FROM ");
            body.push_str(&self.dialect().from_tables(&tables, !qb.joins.is_empty()));
        }
        for join in &qb.joins {
            body.push(' ');
            body.push_str(join.kind.keyword());
            body.push(' ');
            body.push_str(&self.table(&join.table));
            if let Some(condition) = &join.condition {
                body.push_str(" ON ");
                if join.escape {
                    body.push_str(&writer.join_condition(condition));
                } else {
                    body.push_str(condition);
                }
            }
        }
        if let Some(predicate) = writer.predicates(&qb.wheres, Operation::Select)? {
            body.push_str(" WHERE ");
            body.push_str(&predicate);
        }
        if !qb.group_by.is_empty() {
            let columns: Vec<String> = qb.group_by.iter().map(|c| writer.column(c)).collect();
            body.push_str(" GROUP BY ");
            body.push_str(&columns.join(", "));
        }
        if let Some(predicate) = writer.predicates(&qb.havings, Operation::Select)? {
            body.push_str(" HAVING ");
            body.push_str(&predicate);
        }

        Ok(SelectParts {
            distinct: qb.distinct,
            columns,
            body,
            order_by: writer.order_by(&qb.order_by),
        })
    }

    /// SELECT with the dialect's pagination applied last.
    ///
    /// `table` overrides the builder's FROM list.
    ///
    /// # Errors
    ///
    /// Fails on malformed predicate groups, empty IN lists and quoting
    /// failures.
    pub fn compile_select(&self, qb: &QueryBuilder, table: Option<&str>) -> Result<String> {
        let parts = self.select_parts(qb, table)?;
        let sql = self
            .dialect()
            .apply_limit(&parts, Page::new(qb.limit, qb.offset), &self.esc);
        self.log(Operation::Select, &sql);
        Ok(sql)
    }

    /// `SELECT COUNT(*)` over the builder's FROM/JOIN/WHERE, ignoring
    /// ORDER BY and pagination. DISTINCT and GROUP BY queries are counted
    /// through a subquery.
    ///
    /// # Errors
    ///
    /// See [`Compiler::compile_select`].
    pub fn compile_count(&self, qb: &QueryBuilder, table: Option<&str>) -> Result<String> {
        let mut parts = self.select_parts(qb, table)?;
        parts.order_by = None;
        let alias = self.esc.protect_name(COUNT_ALIAS);
        let sql = if qb.distinct || !qb.group_by.is_empty() {
            format!(
                "SELECT COUNT(*) AS {alias} FROM ({}) {}",
                parts.to_sql(),
                self.esc.protect_name(COUNT_SUBQUERY)
            )
        } else {
            format!("SELECT COUNT(*) AS {alias}{}", parts.body)
        };
        self.log(Operation::Select, &sql);
        Ok(sql)
    }

    // -- INSERT / REPLACE ----------------------------------------------------

    fn set_pairs(&self, qb: &QueryBuilder, operation: Operation) -> Result<(Vec<String>, Vec<String>)> {
        if qb.set.is_empty() {
            return Err(self.error(operation, "no values to write"));
        }
        let mut columns = Vec::with_capacity(qb.set.len());
        let mut values = Vec::with_capacity(qb.set.len());
        for (column, operand) in &qb.set {
            columns.push(self.esc.protect_name(column));
            values.push(self.operand(operand)?);
        }
        Ok((columns, values))
    }

    fn operand(&self, operand: &Operand) -> Result<String> {
        match operand {
            Operand::Value(value) => self.esc.escape_value(value),
            Operand::Raw(sql) => Ok(sql.clone()),
        }
    }

    /// Single-row INSERT from the builder's SET values.
    ///
    /// # Errors
    ///
    /// Fails without SET values or a table.
    pub fn compile_insert(&self, qb: &QueryBuilder, table: Option<&str>) -> Result<String> {
        let table = self.target(qb, table, Operation::Insert)?;
        let (columns, values) = self.set_pairs(qb, Operation::Insert)?;
        let sql = self.dialect().insert(&table, &columns, &values);
        self.log(Operation::Insert, &sql);
        Ok(sql)
    }

    /// REPLACE from the builder's SET values.
    ///
    /// # Errors
    ///
    /// [`DbError::Unsupported`] where the dialect has no replace form.
    pub fn compile_replace(&self, qb: &QueryBuilder, table: Option<&str>) -> Result<String> {
        let table = self.target(qb, table, Operation::Replace)?;
        let (columns, values) = self.set_pairs(qb, Operation::Replace)?;
        let sql = self.dialect().replace(&table, &columns, &values)?;
        self.log(Operation::Replace, &sql);
        Ok(sql)
    }

    /// Multi-row INSERT, one statement per `batch_size` rows.
    ///
    /// Columns come from the first row; every row must carry them all.
    ///
    /// # Errors
    ///
    /// Fails without rows, on rows missing a column, and where the dialect
    /// has no batch form.
    pub fn compile_insert_batch(&self, table: &str, rows: &[Record], batch_size: usize) -> Result<Vec<String>> {
        let operation = Operation::InsertBatch;
        let Some(first) = rows.first().filter(|r| !r.is_empty()) else {
            return Err(self.error(operation, "no rows to insert"));
        };
        let table = self.table(table);
        let names: Vec<&str> = first.columns().collect();
        let columns: Vec<String> = names.iter().map(|c| self.esc.protect_name(c)).collect();

        let mut statements = Vec::new();
        for (chunk_index, chunk) in rows.chunks(batch_size.max(1)).enumerate() {
            let mut values = Vec::with_capacity(chunk.len());
            for (offset, row) in chunk.iter().enumerate() {
                let number = chunk_index * batch_size.max(1) + offset;
                let rendered = names
                    .iter()
                    .map(|name| {
                        row.get(name)
                            .ok_or_else(|| self.error(operation, format!("row {number} has no value for {name}")))
                            .and_then(|value| self.esc.escape_value(value))
                    })
                    .collect::<Result<Vec<_>>>()?;
                values.push(rendered);
            }
            let sql = self.dialect().insert_batch(&table, &columns, &values)?;
            self.log(operation, &sql);
            statements.push(sql);
        }
        Ok(statements)
    }

    // -- UPDATE ------------------------------------------------------------

    /// UPDATE from the builder's SET values and WHERE.
    ///
    /// ORDER BY and LIMIT are dropped for dialects that cannot apply them
    /// to an UPDATE.
    ///
    /// # Errors
    ///
    /// Fails with zero SET values or without a table.
    pub fn compile_update(&self, qb: &QueryBuilder, table: Option<&str>) -> Result<String> {
        let operation = Operation::Update;
        let table = self.target(qb, table, operation)?;
        if qb.set.is_empty() {
            return Err(self.error(operation, "no values to set"));
        }
        let writer = self.writer(qb);
        let assignments = qb
            .set
            .iter()
            .map(|(column, operand)| Ok(format!("{} = {}", writer.column(column), self.operand(operand)?)))
            .collect::<Result<Vec<_>>>()?;

        let mut parts = UpdateParts {
            table,
            assignments,
            where_clause: writer.predicates(&qb.wheres, operation)?,
            order_by: writer.order_by(&qb.order_by),
            limit: qb.limit,
        };
        if !self.dialect().spec().update_limit && (parts.limit.is_some() || parts.order_by.is_some()) {
            warn!(dialect = self.dialect().name(), "ORDER BY/LIMIT dropped from UPDATE");
            parts.order_by = None;
            parts.limit = None;
        }
        let sql = self.dialect().update(&parts);
        self.log(operation, &sql);
        Ok(sql)
    }

    /// CASE-based batch UPDATE keyed on `index`, one statement per
    /// `batch_size` rows. The builder's WHERE is ANDed onto each statement.
    ///
    /// # Errors
    ///
    /// Fails without rows, on rows missing the index value, or when no row
    /// changes any column besides the index.
    pub fn compile_update_batch(
        &self,
        qb: &QueryBuilder,
        table: Option<&str>,
        rows: &[Record],
        index: &str,
        batch_size: usize,
    ) -> Result<Vec<String>> {
        let operation = Operation::UpdateBatch;
        let table = self.target(qb, table, operation)?;
        if rows.is_empty() {
            return Err(self.error(operation, "no rows to update"));
        }
        let writer = self.writer(qb);
        let where_clause = writer.predicates(&qb.wheres, operation)?;
        let index_column = self.esc.protect_name(index);

        let mut statements = Vec::new();
        for (chunk_index, chunk) in rows.chunks(batch_size.max(1)).enumerate() {
            let mut names: Vec<&str> = Vec::new();
            for row in chunk {
                for name in row.columns() {
                    if name != index && !names.contains(&name) {
                        names.push(name);
                    }
                }
            }
            if names.is_empty() {
                return Err(self.error(operation, format!("no columns to update besides {index}")));
            }

            let mut keys = Vec::with_capacity(chunk.len());
            let mut columns: Vec<BatchColumn> = names
                .iter()
                .map(|name| BatchColumn {
                    name: self.esc.protect_name(name),
                    cases: Vec::new(),
                })
                .collect();
            for (offset, row) in chunk.iter().enumerate() {
                let number = chunk_index * batch_size.max(1) + offset;
                let key = row
                    .get(index)
                    .ok_or_else(|| self.error(operation, format!("row {number} has no value for index {index}")))?;
                let key = self.esc.escape_value(key)?;
                for (name, column) in names.iter().zip(columns.iter_mut()) {
                    if let Some(value) = row.get(name) {
                        column.cases.push((key.clone(), self.esc.escape_value(value)?));
                    }
                }
                keys.push(key);
            }

            let batch = BatchUpdate {
                table: table.clone(),
                index: index_column.clone(),
                columns,
                keys,
                where_clause: where_clause.clone(),
            };
            let sql = self.dialect().update_batch(&batch);
            self.log(operation, &sql);
            statements.push(sql);
        }
        Ok(statements)
    }

    // -- DELETE / TRUNCATE -------------------------------------------------

    /// DELETE with the builder's WHERE and LIMIT.
    ///
    /// A LIMIT is rewritten or dropped per dialect. A DELETE without a WHERE
    /// clause is refused; use [`Compiler::compile_empty_table`] or
    /// [`Compiler::compile_truncate`] to clear a table.
    ///
    /// # Errors
    ///
    /// Fails without a table or without WHERE predicates.
    pub fn compile_delete(&self, qb: &QueryBuilder, table: Option<&str>) -> Result<String> {
        let operation = Operation::Delete;
        let table = self.target(qb, table, operation)?;
        let Some(where_clause) = self.writer(qb).predicates(&qb.wheres, operation)? else {
            return Err(self.error(operation, "DELETE requires a WHERE clause"));
        };
        let parts = DeleteParts {
            table,
            where_clause: Some(where_clause),
            limit: qb.limit,
        };
        let sql = self.dialect().delete(&parts);
        self.log(operation, &sql);
        Ok(sql)
    }

    /// TRUNCATE, or `DELETE FROM` where the dialect has none.
    #[must_use]
    pub fn compile_truncate(&self, table: &str) -> String {
        let sql = self.dialect().truncate(&self.table(table));
        self.log(Operation::Truncate, &sql);
        sql
    }

    /// Unconditional `DELETE FROM`.
    #[must_use]
    pub fn compile_empty_table(&self, table: &str) -> String {
        let sql = format!("DELETE FROM {}", self.table(table));
        self.log(Operation::Delete, &sql);
        sql
    }

    // -- catalog -------------------------------------------------------------

    /// Query listing tables, restricted to the table prefix when
    /// `prefix_only` is set and a prefix is configured.
    ///
    /// # Errors
    ///
    /// Propagates quoting failures.
    pub fn list_tables(&self, prefix_only: bool) -> Result<String> {
        let prefix = Some(self.esc.prefix()).filter(|p| prefix_only && !p.is_empty());
        self.dialect().list_tables(&self.esc, prefix)
    }

    /// Query listing the columns of `table` (prefix applied).
    ///
    /// # Errors
    ///
    /// Propagates quoting failures.
    pub fn list_columns(&self, table: &str) -> Result<String> {
        self.dialect().list_columns(&self.esc, &self.prefixed(table))
    }

    /// Query returning the last generated id, if the dialect needs one.
    ///
    /// # Errors
    ///
    /// Propagates quoting failures.
    pub fn insert_id_query(&self, sequence: Option<&str>) -> Result<Option<String>> {
        self.dialect().insert_id_query(&self.esc, sequence)
    }

    /// Unescaped table name with the prefix applied once.
    #[must_use]
    pub fn prefixed(&self, table: &str) -> String {
        let bare = self.esc.unescape_identifier(table);
        let prefix = self.esc.prefix();
        if bare.starts_with(prefix) {
            bare
        } else {
            format!("{prefix}{bare}")
        }
    }
}

impl<'a> From<&'a Driver> for Compiler<'a> {
    fn from(driver: &'a Driver) -> Self {
        Self::new(driver)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{Direction, JoinKind, LikeSide};
    use crate::registry::Registry;
    use crate::ConnectionConfig;

    fn driver(name: &str) -> Driver {
        let mut config = ConnectionConfig::new(name);
        config.hostname = String::from("localhost");
        config.database = String::from("app");
        Registry::builtin().resolve(&config).unwrap()
    }

    #[test]
    fn test_select_with_everything() {
        let driver = driver("postgre");
        let mut qb = QueryBuilder::new();
        qb.select(["u.id", "u.name"])
            .select_count("p.id", Some("posts"))
            .from("users u")
            .join("posts p", "p.user_id = u.id", JoinKind::Left)
            .where_("u.active", true)
            .where_in("u.role", ["admin", "editor"])
            .group_by(["u.id", "u.name"])
            .having("posts >", 2)
            .order_by("u.name", Direction::Desc)
            .limit(10);
        assert_eq!(
            Compiler::new(&driver).compile_select(&qb, None).unwrap(),
            "SELECT \"u\".\"id\", \"u\".\"name\", COUNT(\"p\".\"id\") AS \"posts\" FROM \"users\" AS \"u\" \
             LEFT JOIN \"posts\" AS \"p\" ON \"p\".\"user_id\" = \"u\".\"id\" \
             WHERE \"u\".\"active\" = TRUE AND \"u\".\"role\" IN ('admin', 'editor') \
             GROUP BY \"u\".\"id\", \"u\".\"name\" HAVING \"posts\" > 2 ORDER BY \"u\".\"name\" DESC LIMIT 10"
        );
    }

    #[test]
    fn test_select_defaults_to_star_and_wraps_from() {
        let driver = driver("mysqli");
        let mut qb = QueryBuilder::new();
        qb.from("a").from("b").join("c", "c.a_id = a.id", JoinKind::Inner);
        assert_eq!(
            Compiler::new(&driver).compile_select(&qb, None).unwrap(),
            "SELECT * FROM (`a`, `b`) JOIN `c` ON `c`.`a_id` = `a`.`id`"
        );
    }

    #[test]
    fn test_random_order_inline_seed() {
        let driver = driver("mysqli");
        let mut qb = QueryBuilder::new();
        qb.from("t").order_random(Some(7));
        assert_eq!(
            Compiler::new(&driver).compile_select(&qb, None).unwrap(),
            "SELECT * FROM `t` ORDER BY RAND(7)"
        );
        assert!(qb.session_statements(&driver).is_empty());
    }

    #[test]
    fn test_count_wraps_grouped_queries() {
        let driver = driver("sqlite3");
        let mut qb = QueryBuilder::new();
        qb.from("t").where_("a", 1).order_by("a", Direction::Asc).limit(5);
        let compiler = Compiler::new(&driver);
        assert_eq!(
            compiler.compile_count(&qb, None).unwrap(),
            "SELECT COUNT(*) AS \"numrows\" FROM \"t\" WHERE \"a\" = 1"
        );
        qb.group_by(["a"]);
        assert_eq!(
            compiler.compile_count(&qb, None).unwrap(),
            "SELECT COUNT(*) AS \"numrows\" FROM (SELECT * FROM \"t\" WHERE \"a\" = 1 GROUP BY \"a\") \"sg_count_all_results\""
        );
    }

    #[test]
    fn test_insert_and_replace() {
        let sqlite = driver("sqlite3");
        let mut qb = QueryBuilder::new();
        qb.set("name", "O'Neil").set("age", 40).set_raw("created", "CURRENT_TIMESTAMP");
        let compiler = Compiler::new(&sqlite);
        assert_eq!(
            compiler.compile_insert(&qb, Some("people")).unwrap(),
            "INSERT INTO \"people\" (\"name\", \"age\", \"created\") VALUES ('O''Neil', 40, CURRENT_TIMESTAMP)"
        );
        assert_eq!(
            compiler.compile_replace(&qb, Some("people")).unwrap(),
            "INSERT OR REPLACE INTO \"people\" (\"name\", \"age\", \"created\") VALUES ('O''Neil', 40, CURRENT_TIMESTAMP)"
        );
        let postgres = driver("postgre");
        assert!(Compiler::new(&postgres)
            .compile_replace(&qb, Some("people"))
            .unwrap_err()
            .is_unsupported());
    }

    #[test]
    fn test_insert_batch_chunks() {
        let driver = driver("mysqli");
        let rows: Vec<Record> = (1..=5)
            .map(|i| Record::new().with("id", i).with("name", format!("n{i}")))
            .collect();
        let sql = Compiler::new(&driver).compile_insert_batch("t", &rows, 2).unwrap();
        assert_eq!(sql.len(), 3);
        assert_eq!(sql[0], "INSERT INTO `t` (`id`, `name`) VALUES (1, 'n1'), (2, 'n2')");
        assert_eq!(sql[2], "INSERT INTO `t` (`id`, `name`) VALUES (5, 'n5')");
    }

    #[test]
    fn test_insert_batch_rejects_ragged_rows() {
        let driver = driver("mysqli");
        let rows = vec![Record::new().with("a", 1).with("b", 2), Record::new().with("a", 3)];
        let err = Compiler::new(&driver).compile_insert_batch("t", &rows, 100).unwrap_err();
        assert!(matches!(err, DbError::Compile { operation: Operation::InsertBatch, .. }));
    }

    #[test]
    fn test_update_requires_values() {
        let driver = driver("postgre");
        let mut qb = QueryBuilder::new();
        qb.from("t").where_("id", 1);
        let err = Compiler::new(&driver).compile_update(&qb, None).unwrap_err();
        assert_eq!(err.to_string(), "cannot compile UPDATE for postgre: no values to set");
    }

    #[test]
    fn test_update_keeps_limit_where_supported() {
        let driver = driver("mysqli");
        let mut qb = QueryBuilder::new();
        qb.set("hits", 0).where_("hits >", 100).order_by("id", Direction::Asc).limit(3);
        assert_eq!(
            Compiler::new(&driver).compile_update(&qb, Some("pages")).unwrap(),
            "UPDATE `pages` SET `hits` = 0 WHERE `hits` > 100 ORDER BY `id` ASC LIMIT 3"
        );
    }

    #[test]
    fn test_update_batch_case_form() {
        let driver = driver("mysqli");
        let rows = vec![
            Record::new().with("id", 1).with("name", "a"),
            Record::new().with("id", 2).with("name", "b"),
        ];
        let sql = Compiler::new(&driver)
            .compile_update_batch(&QueryBuilder::new(), Some("t"), &rows, "id", DEFAULT_BATCH_SIZE)
            .unwrap();
        assert_eq!(
            sql,
            vec!["UPDATE `t` SET `name` = CASE `id` WHEN 1 THEN 'a' WHEN 2 THEN 'b' ELSE `name` END WHERE `id` IN (1,2)"]
        );
    }

    #[test]
    fn test_update_batch_missing_values_fall_back() {
        let driver = driver("postgre");
        let rows = vec![
            Record::new().with("id", 1).with("name", "a").with("age", 3),
            Record::new().with("id", 2).with("age", 4),
        ];
        let mut qb = QueryBuilder::new();
        qb.where_("active", true);
        let sql = Compiler::new(&driver)
            .compile_update_batch(&qb, Some("t"), &rows, "id", 100)
            .unwrap();
        assert_eq!(
            sql[0],
            "UPDATE \"t\" SET \"name\" = CASE \"id\" WHEN 1 THEN 'a' ELSE \"name\" END, \
             \"age\" = CASE \"id\" WHEN 1 THEN 3 WHEN 2 THEN 4 ELSE \"age\" END \
             WHERE \"id\" IN (1,2) AND (\"active\" = TRUE)"
        );
    }

    #[test]
    fn test_update_batch_requires_index() {
        let driver = driver("postgre");
        let rows = vec![Record::new().with("name", "a")];
        let err = Compiler::new(&driver)
            .compile_update_batch(&QueryBuilder::new(), Some("t"), &rows, "id", 100)
            .unwrap_err();
        assert!(matches!(err, DbError::Compile { operation: Operation::UpdateBatch, .. }));
    }

    #[test]
    fn test_delete_requires_where() {
        let driver = driver("postgre");
        let qb = QueryBuilder::new();
        assert!(Compiler::new(&driver).compile_delete(&qb, Some("t")).is_err());
    }

    #[test]
    fn test_delete_limit_per_dialect() {
        let mut qb = QueryBuilder::new();
        qb.from("logs").where_("level", "debug").limit(50);
        let mysql = driver("mysqli");
        assert_eq!(
            Compiler::new(&mysql).compile_delete(&qb, None).unwrap(),
            "DELETE FROM `logs` WHERE `level` = 'debug' LIMIT 50"
        );
        let sqlsrv = driver("sqlsrv");
        assert_eq!(
            Compiler::new(&sqlsrv).compile_delete(&qb, None).unwrap(),
            "WITH delete_cte AS (SELECT TOP 50 * FROM [logs] WHERE [level] = 'debug') DELETE FROM delete_cte"
        );
        let oracle = driver("oci8");
        assert_eq!(
            Compiler::new(&oracle).compile_delete(&qb, None).unwrap(),
            "DELETE FROM \"logs\" WHERE (\"level\" = 'debug') AND rownum <= 50"
        );
    }

    #[test]
    fn test_truncate_fallback() {
        assert_eq!(Compiler::new(&driver("sqlite3")).compile_truncate("t"), "DELETE FROM \"t\"");
        assert_eq!(Compiler::new(&driver("mysqli")).compile_truncate("t"), "TRUNCATE `t`");
        assert_eq!(Compiler::new(&driver("postgre")).compile_empty_table("t"), "DELETE FROM \"t\"");
    }

    #[test]
    fn test_like_and_prefix() {
        let mut config = ConnectionConfig::new("postgre");
        config.hostname = String::from("localhost");
        config.prefix = String::from("app_");
        let driver = Registry::builtin().resolve(&config).unwrap();
        let mut qb = QueryBuilder::new();
        qb.from("users").like("users.name", "al", LikeSide::After);
        let compiler = Compiler::new(&driver);
        assert_eq!(
            compiler.compile_select(&qb, None).unwrap(),
            "SELECT * FROM \"app_users\" WHERE \"app_users\".\"name\" LIKE 'al%' ESCAPE '!'"
        );
        assert_eq!(compiler.prefixed("users"), "app_users");
        assert_eq!(compiler.prefixed("\"app_users\""), "app_users");
    }
}
