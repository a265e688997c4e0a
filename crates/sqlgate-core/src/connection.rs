//! Connections: a resolved driver on top of a native transport.
//!
//! The core never talks to a database itself. A [`Transport`] wraps the
//! native client and executes SQL text; [`Connection`] compiles builder and
//! forge state for its driver, runs it through the transport and keeps the
//! per-connection session and transaction state.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::builder::{QueryBuilder, Record};
use crate::compiler::{Compiler, COUNT_ALIAS, DEFAULT_BATCH_SIZE};
use crate::config::ConnectionConfig;
use crate::dialect::{AlterKind, TxnCommand};
use crate::driver::Driver;
use crate::error::{DbError, Result, TransportError};
use crate::escape::Quoter;
use crate::forge::{ColumnDefinition, Forge};
use crate::registry::Registry;
use crate::transaction::TransactionState;
use crate::value::SqlValue;

/// Sequential access to the rows of one executed statement.
pub trait RowCursor {
    /// Column names, in select-list order.
    fn columns(&self) -> Vec<String>;

    /// Next row, or `None` once exhausted.
    ///
    /// # Errors
    ///
    /// Returns the native fetch error.
    fn fetch(&mut self) -> std::result::Result<Option<Vec<SqlValue>>, TransportError>;

    /// Rewinds to the first row; false when the native cursor cannot.
    fn reset(&mut self) -> bool {
        false
    }

    /// Releases native resources. Called exactly once.
    fn free(&mut self) {}
}

/// Native client underneath a [`Connection`].
///
/// Implementations are synchronous; one connection runs one statement at
/// a time.
pub trait Transport {
    /// Opens the native connection.
    ///
    /// # Errors
    ///
    /// Returns the native connect error.
    fn connect(&mut self, dsn: &str, config: &ConnectionConfig) -> std::result::Result<(), TransportError>;

    /// Executes one statement.
    ///
    /// # Errors
    ///
    /// Returns the native execution error.
    fn execute(&mut self, sql: &str) -> std::result::Result<Box<dyn RowCursor>, TransportError>;

    /// Rows changed by the last write.
    fn affected_rows(&self) -> u64;

    /// Id generated by the last insert, when the client tracks it.
    fn last_insert_id(&self) -> Option<i64> {
        None
    }

    /// Quotes `text` as a string literal with the native client's own
    /// escaping routine. `None` means the client has none, and compiling
    /// text literals fails.
    fn quote(&self, _text: &str) -> Option<String> {
        None
    }

    /// Server version string reported after connecting.
    fn server_version(&mut self) -> Option<String> {
        None
    }

    /// Native transaction control for dialects without SQL verbs.
    ///
    /// # Errors
    ///
    /// The default refuses; transports for such dialects override it.
    fn transaction(&mut self, command: TxnCommand) -> std::result::Result<(), TransportError> {
        Err(TransportError::new(format!(
            "transport has no native {command:?} support"
        )))
    }

    /// Closes the native connection.
    fn close(&mut self) {}
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn connect(&mut self, dsn: &str, config: &ConnectionConfig) -> std::result::Result<(), TransportError> {
        (**self).connect(dsn, config)
    }

    fn execute(&mut self, sql: &str) -> std::result::Result<Box<dyn RowCursor>, TransportError> {
        (**self).execute(sql)
    }

    fn affected_rows(&self) -> u64 {
        (**self).affected_rows()
    }

    fn last_insert_id(&self) -> Option<i64> {
        (**self).last_insert_id()
    }

    fn quote(&self, text: &str) -> Option<String> {
        (**self).quote(text)
    }

    fn server_version(&mut self) -> Option<String> {
        (**self).server_version()
    }

    fn transaction(&mut self, command: TxnCommand) -> std::result::Result<(), TransportError> {
        (**self).transaction(command)
    }

    fn close(&mut self) {
        (**self).close();
    }
}

impl<T: Transport + ?Sized> Quoter for T {
    fn quote_literal(&self, text: &str) -> Option<String> {
        self.quote(text)
    }
}

/// One fetched row.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Arc<[String]>,
    values: Vec<SqlValue>,
}

impl Row {
    /// Creates a row.
    #[must_use]
    pub fn new(columns: Arc<[String]>, values: Vec<SqlValue>) -> Self {
        Self { columns, values }
    }

    /// Column names.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Values in column order.
    #[must_use]
    pub fn values(&self) -> &[SqlValue] {
        &self.values
    }

    /// Value of `column`; names are matched case-insensitively.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&SqlValue> {
        self.columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(column))
            .and_then(|i| self.values.get(i))
    }

    /// Value at `index`.
    #[must_use]
    pub fn get_index(&self, index: usize) -> Option<&SqlValue> {
        self.values.get(index)
    }

    /// Decodes `column` as JSON. NULL and missing columns give `None`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Decode`] when the value is not valid JSON for `T`.
    pub fn json<T: DeserializeOwned>(&self, column: &str) -> Result<Option<T>> {
        let decoded = match self.get(column) {
            None | Some(SqlValue::Null) => return Ok(None),
            Some(SqlValue::Text(text)) => serde_json::from_str(text),
            Some(other) => serde_json::to_value(other).and_then(serde_json::from_value),
        };
        decoded.map(Some).map_err(|source| DbError::Decode {
            column: column.to_string(),
            source,
        })
    }

    /// The row as an ordered record.
    #[must_use]
    pub fn to_record(&self) -> Record {
        self.columns
            .iter()
            .zip(self.values.iter().cloned().chain(std::iter::repeat(SqlValue::Null)))
            .map(|(column, value)| (column.clone(), value))
            .collect()
    }
}

/// Rows of one executed statement.
///
/// Owns the native cursor and frees it on drop or through [`QueryResult::free`].
pub struct QueryResult {
    cursor: Option<Box<dyn RowCursor>>,
    columns: Arc<[String]>,
}

impl std::fmt::Debug for QueryResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryResult")
            .field("columns", &self.columns)
            .field("freed", &self.cursor.is_none())
            .finish()
    }
}

impl QueryResult {
    /// Wraps a native cursor.
    #[must_use]
    pub fn new(cursor: Box<dyn RowCursor>) -> Self {
        let columns = cursor.columns().into();
        Self {
            cursor: Some(cursor),
            columns,
        }
    }

    /// Column names.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Next row; `None` once exhausted or freed.
    ///
    /// # Errors
    ///
    /// Returns the native fetch error.
    pub fn next_row(&mut self) -> Result<Option<Row>> {
        let Some(cursor) = self.cursor.as_mut() else {
            return Ok(None);
        };
        Ok(cursor.fetch()?.map(|values| Row::new(Arc::clone(&self.columns), values)))
    }

    /// All remaining rows.
    ///
    /// # Errors
    ///
    /// Returns the native fetch error.
    pub fn rows(&mut self) -> Result<Vec<Row>> {
        let mut rows = Vec::new();
        while let Some(row) = self.next_row()? {
            rows.push(row);
        }
        Ok(rows)
    }

    /// Rewinds to the first row where the native cursor supports it.
    pub fn reset(&mut self) -> bool {
        self.cursor.as_mut().is_some_and(|cursor| cursor.reset())
    }

    /// Releases the native cursor; later fetches return nothing.
    pub fn free(&mut self) {
        if let Some(mut cursor) = self.cursor.take() {
            cursor.free();
        }
    }

    /// Returns true once the cursor has been released.
    #[must_use]
    pub const fn is_freed(&self) -> bool {
        self.cursor.is_none()
    }
}

impl Iterator for QueryResult {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_row().transpose()
    }
}

impl Drop for QueryResult {
    fn drop(&mut self) {
        self.free();
    }
}

/// A driver, its transport and the state of one session.
pub struct Connection<T: Transport> {
    driver: Driver,
    transport: T,
    connected: bool,
    transaction: TransactionState,
    builder: QueryBuilder,
    batch_size: usize,
    last_query: Option<String>,
}

impl<T: Transport> std::fmt::Debug for Connection<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("driver", &self.driver)
            .field("connected", &self.connected)
            .field("transaction", &self.transaction)
            .finish_non_exhaustive()
    }
}

impl<T: Transport> Connection<T> {
    /// Wraps a resolved driver and its transport without connecting.
    pub fn new(driver: Driver, transport: T) -> Self {
        let transaction = TransactionState::new(driver.config().trans_enabled);
        Self {
            driver,
            transport,
            connected: false,
            transaction,
            builder: QueryBuilder::new(),
            batch_size: DEFAULT_BATCH_SIZE,
            last_query: None,
        }
    }

    /// Resolves `config` through `registry` and connects.
    ///
    /// # Errors
    ///
    /// Fails on unknown drivers and on connect or session setup errors.
    pub fn open(registry: &Registry, config: &ConnectionConfig, transport: T) -> Result<Self> {
        let mut connection = Self::new(registry.resolve(config)?, transport);
        connection.connect()?;
        Ok(connection)
    }

    /// Connects the transport, then runs the session check and setup
    /// statements. A no-op when already connected.
    ///
    /// # Errors
    ///
    /// Returns the native connect error, or the error of a setup statement.
    pub fn connect(&mut self) -> Result<()> {
        if self.connected {
            return Ok(());
        }
        self.transport.connect(self.driver.dsn(), self.driver.config())?;
        self.connected = true;
        if let Some(version) = self.transport.server_version() {
            self.driver.set_server_version(&version);
        }
        info!(dialect = self.driver.dialect().name(), "connected");

        if let Some(check) = self.driver.dialect().session_check() {
            if !self.driver.session().checked {
                let value = self
                    .query(check)?
                    .next_row()?
                    .and_then(|row| row.get_index(0).cloned())
                    .unwrap_or(SqlValue::Null);
                self.driver.apply_session_check(&value);
                debug!(session = ?self.driver.session(), "session checked");
            }
        }
        for statement in self.driver.dialect().session_statements(self.driver.config()) {
            self.simple_query(&statement)?;
        }
        Ok(())
    }

    /// Closes the transport; the next call to [`Connection::connect`]
    /// reconnects.
    pub fn close(&mut self) {
        if self.connected {
            self.transport.close();
            self.connected = false;
        }
    }

    /// Returns true between connect and close.
    #[must_use]
    pub const fn is_connected(&self) -> bool {
        self.connected
    }

    /// The resolved driver.
    #[must_use]
    pub const fn driver(&self) -> &Driver {
        &self.driver
    }

    /// The transport.
    #[must_use]
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// The transport, mutably.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Transaction state.
    #[must_use]
    pub const fn transaction(&self) -> &TransactionState {
        &self.transaction
    }

    /// The query builder consumed by the next builder verb.
    pub fn builder(&mut self) -> &mut QueryBuilder {
        &mut self.builder
    }

    /// Rows per batch statement.
    pub fn set_batch_size(&mut self, batch_size: usize) {
        self.batch_size = batch_size.max(1);
    }

    /// Last SQL text sent to the transport.
    #[must_use]
    pub fn last_query(&self) -> Option<&str> {
        self.last_query.as_deref()
    }

    /// A compiler for this connection's driver.
    #[must_use]
    pub fn compiler(&self) -> Compiler<'_> {
        Compiler::new(&self.driver).with_quoter(&self.transport)
    }

    // -- execution ---------------------------------------------------------

    /// Executes `sql` and returns its rows.
    ///
    /// A failure inside a transaction marks it failed.
    ///
    /// # Errors
    ///
    /// Returns the native error with the SQL attached.
    pub fn query(&mut self, sql: &str) -> Result<QueryResult> {
        self.last_query = Some(sql.to_string());
        match self.transport.execute(sql) {
            Ok(cursor) => Ok(QueryResult::new(cursor)),
            Err(err) => {
                warn!(dialect = self.driver.dialect().name(), error = %err, sql, "statement failed");
                self.transaction.fail();
                let err = if err.sql.is_some() { err } else { err.with_sql(sql) };
                Err(err.into())
            }
        }
    }

    /// Executes `sql` and releases the cursor without reading it.
    ///
    /// # Errors
    ///
    /// See [`Connection::query`].
    pub fn simple_query(&mut self, sql: &str) -> Result<()> {
        self.query(sql)?.free();
        Ok(())
    }

    fn execute_all(&mut self, statements: &[String]) -> Result<u64> {
        let mut affected = 0;
        for statement in statements {
            self.simple_query(statement)?;
            affected += self.transport.affected_rows();
        }
        Ok(affected)
    }

    /// Rows changed by the last write.
    #[must_use]
    pub fn affected_rows(&self) -> u64 {
        self.transport.affected_rows()
    }

    /// Id generated by the last insert, through the dialect's query when it
    /// has one (e.g. a sequence), otherwise from the transport.
    ///
    /// # Errors
    ///
    /// See [`Connection::query`].
    pub fn insert_id(&mut self, sequence: Option<&str>) -> Result<Option<i64>> {
        let query = self.compiler().insert_id_query(sequence)?;
        match query {
            Some(sql) => Ok(self
                .query(&sql)?
                .next_row()?
                .and_then(|row| row.get_index(0).and_then(SqlValue::as_i64))),
            None => Ok(self.transport.last_insert_id()),
        }
    }

    // -- transactions ------------------------------------------------------

    fn run_transaction(&mut self, command: Option<TxnCommand>) -> Result<()> {
        let Some(command) = command else {
            return Ok(());
        };
        match self.driver.dialect().transaction_sql(command) {
            Some(sql) => self.simple_query(sql),
            None => Ok(self.transport.transaction(command)?),
        }
    }

    /// Starts a transaction; nested calls only count depth. In test mode
    /// the outermost transaction rolls back instead of committing.
    ///
    /// # Errors
    ///
    /// Returns the error of the BEGIN statement; the depth is restored.
    pub fn begin(&mut self, test_mode: bool) -> Result<()> {
        let command = self.transaction.begin(test_mode);
        let result = self.run_transaction(command);
        if result.is_err() {
            self.transaction = TransactionState::new(self.transaction.enabled);
        }
        result
    }

    /// Commits the outermost transaction (or rolls back, see
    /// [`TransactionState::commit`]).
    ///
    /// # Errors
    ///
    /// Returns the error of the COMMIT/ROLLBACK statement.
    pub fn commit(&mut self) -> Result<()> {
        let command = self.transaction.commit();
        self.run_transaction(command)
    }

    /// Rolls back the outermost transaction.
    ///
    /// # Errors
    ///
    /// Returns the error of the ROLLBACK statement.
    pub fn rollback(&mut self) -> Result<()> {
        let command = self.transaction.rollback();
        self.run_transaction(command)
    }

    /// Commits, or rolls back if a statement failed since `begin`.
    ///
    /// # Errors
    ///
    /// Returns the error of the COMMIT/ROLLBACK statement.
    pub fn complete(&mut self) -> Result<()> {
        let command = self.transaction.complete();
        self.run_transaction(command)
    }

    /// False once a statement failed in the current transaction.
    #[must_use]
    pub const fn transaction_status(&self) -> bool {
        self.transaction.status()
    }

    // -- builder verbs -----------------------------------------------------

    fn take_builder(&mut self) -> QueryBuilder {
        std::mem::take(&mut self.builder)
    }

    /// Compiles and runs the builder's SELECT, then resets the builder.
    ///
    /// # Errors
    ///
    /// Compile and transport errors.
    pub fn get(&mut self, table: Option<&str>) -> Result<QueryResult> {
        let qb = self.take_builder();
        let sql = self.compiler().compile_select(&qb, table)?;
        for statement in qb.session_statements(&self.driver) {
            self.simple_query(&statement)?;
        }
        self.query(&sql)
    }

    /// Counts the rows the builder's SELECT would return, then resets the
    /// builder.
    ///
    /// # Errors
    ///
    /// Compile and transport errors.
    pub fn count_all_results(&mut self, table: Option<&str>) -> Result<u64> {
        let qb = self.take_builder();
        let sql = self.compiler().compile_count(&qb, table)?;
        let count = self
            .query(&sql)?
            .next_row()?
            .and_then(|row| row.get(COUNT_ALIAS).or_else(|| row.get_index(0)).and_then(SqlValue::as_i64))
            .unwrap_or(0);
        Ok(u64::try_from(count).unwrap_or(0))
    }

    /// Inserts the builder's SET values; returns affected rows.
    ///
    /// # Errors
    ///
    /// Compile and transport errors.
    pub fn insert(&mut self, table: Option<&str>) -> Result<u64> {
        let qb = self.take_builder();
        let sql = self.compiler().compile_insert(&qb, table)?;
        self.execute_all(&[sql])
    }

    /// Replaces a row from the builder's SET values.
    ///
    /// # Errors
    ///
    /// Compile, unsupported and transport errors.
    pub fn replace(&mut self, table: Option<&str>) -> Result<u64> {
        let qb = self.take_builder();
        let sql = self.compiler().compile_replace(&qb, table)?;
        self.execute_all(&[sql])
    }

    /// Inserts `rows` in batches; returns total affected rows.
    ///
    /// # Errors
    ///
    /// Compile and transport errors.
    pub fn insert_batch(&mut self, table: &str, rows: &[Record]) -> Result<u64> {
        let statements = self.compiler().compile_insert_batch(table, rows, self.batch_size)?;
        self.execute_all(&statements)
    }

    /// Updates with the builder's SET and WHERE; returns affected rows.
    ///
    /// # Errors
    ///
    /// Compile and transport errors.
    pub fn update(&mut self, table: Option<&str>) -> Result<u64> {
        let qb = self.take_builder();
        let sql = self.compiler().compile_update(&qb, table)?;
        self.execute_all(&[sql])
    }

    /// Batch update keyed on `index`; returns total affected rows.
    ///
    /// # Errors
    ///
    /// Compile and transport errors.
    pub fn update_batch(&mut self, table: Option<&str>, rows: &[Record], index: &str) -> Result<u64> {
        let qb = self.take_builder();
        let statements = self
            .compiler()
            .compile_update_batch(&qb, table, rows, index, self.batch_size)?;
        self.execute_all(&statements)
    }

    /// Deletes with the builder's WHERE; returns affected rows.
    ///
    /// # Errors
    ///
    /// Compile and transport errors.
    pub fn delete(&mut self, table: Option<&str>) -> Result<u64> {
        let qb = self.take_builder();
        let sql = self.compiler().compile_delete(&qb, table)?;
        self.execute_all(&[sql])
    }

    /// Deletes every row of `table`.
    ///
    /// # Errors
    ///
    /// Transport errors.
    pub fn empty_table(&mut self, table: &str) -> Result<u64> {
        let sql = self.compiler().compile_empty_table(table);
        self.execute_all(&[sql])
    }

    /// Truncates `table`.
    ///
    /// # Errors
    ///
    /// Transport errors.
    pub fn truncate(&mut self, table: &str) -> Result<()> {
        let sql = self.compiler().compile_truncate(table);
        self.simple_query(&sql)
    }

    // -- catalog -----------------------------------------------------------

    /// Table names, restricted to the prefix when `prefix_only` is set.
    ///
    /// # Errors
    ///
    /// Transport errors.
    pub fn list_tables(&mut self, prefix_only: bool) -> Result<Vec<String>> {
        let sql = self.compiler().list_tables(prefix_only)?;
        let rows = self.query(&sql)?.rows()?;
        Ok(rows
            .iter()
            .filter_map(|row| row.get_index(0).map(SqlValue::to_plain_string))
            .collect())
    }

    /// Returns true when `table` (prefix applied) exists.
    ///
    /// # Errors
    ///
    /// Transport errors.
    pub fn table_exists(&mut self, table: &str) -> Result<bool> {
        let wanted = self.compiler().prefixed(table);
        Ok(self
            .list_tables(false)?
            .iter()
            .any(|name| name.eq_ignore_ascii_case(&wanted)))
    }

    /// Column names of `table`.
    ///
    /// # Errors
    ///
    /// Transport errors.
    pub fn list_fields(&mut self, table: &str) -> Result<Vec<String>> {
        let sql = self.compiler().list_columns(table)?;
        let field = self.driver.dialect().column_name_field();
        let rows = self.query(&sql)?.rows()?;
        Ok(rows
            .iter()
            .filter_map(|row| {
                field
                    .and_then(|name| row.get(name))
                    .or_else(|| row.get_index(0))
                    .map(SqlValue::to_plain_string)
            })
            .collect())
    }

    // -- forge -------------------------------------------------------------

    /// Creates a table from the forge's queued fields and keys.
    ///
    /// `if_not_exists` is emulated through [`Connection::table_exists`]
    /// where the dialect has no native form. Returns false when the table
    /// already existed.
    ///
    /// # Errors
    ///
    /// Compile and transport errors.
    pub fn create_table(
        &mut self,
        forge: &mut Forge,
        table: &str,
        if_not_exists: bool,
        attributes: &[(String, String)],
    ) -> Result<bool> {
        if if_not_exists && !self.driver.dialect().spec().create_if_not_exists && self.table_exists(table)? {
            debug!(table, "table exists, CREATE TABLE skipped");
            forge.reset();
            return Ok(false);
        }
        let statements = forge.create_table(self.compiler(), table, if_not_exists, attributes)?;
        self.execute_all(&statements)?;
        Ok(true)
    }

    /// Drops a table. Returns false when `if_exists` is set and the table
    /// was missing on a dialect without native `IF EXISTS`.
    ///
    /// # Errors
    ///
    /// Compile and transport errors.
    pub fn drop_table(&mut self, table: &str, if_exists: bool, cascade: bool) -> Result<bool> {
        if if_exists && !self.driver.dialect().spec().drop_if_exists && !self.table_exists(table)? {
            debug!(table, "table missing, DROP TABLE skipped");
            return Ok(false);
        }
        let statements = Forge::new().drop_table(self.compiler(), table, if_exists, cascade)?;
        self.execute_all(&statements)?;
        Ok(true)
    }

    /// Renames a table.
    ///
    /// # Errors
    ///
    /// Compile, unsupported and transport errors.
    pub fn rename_table(&mut self, from: &str, to: &str) -> Result<()> {
        let statements = Forge::new().rename_table(self.compiler(), from, to)?;
        self.execute_all(&statements).map(|_| ())
    }

    /// Runs an ALTER TABLE of `kind` over the forge's queued fields.
    ///
    /// # Errors
    ///
    /// Compile, unsupported and transport errors.
    pub fn alter_table(&mut self, forge: &mut Forge, kind: AlterKind, table: &str) -> Result<()> {
        let statements = forge.alter_table(self.compiler(), kind, table)?;
        self.execute_all(&statements).map(|_| ())
    }

    /// Adds columns to `table`.
    ///
    /// # Errors
    ///
    /// Compile and transport errors.
    pub fn add_column(&mut self, table: &str, columns: Vec<ColumnDefinition>) -> Result<()> {
        let statements = Forge::new().add_column(self.compiler(), table, columns)?;
        self.execute_all(&statements).map(|_| ())
    }

    /// Drops a column from `table`.
    ///
    /// # Errors
    ///
    /// Compile and transport errors.
    pub fn drop_column(&mut self, table: &str, column: &str) -> Result<()> {
        let statements = Forge::new().drop_column(self.compiler(), table, [column])?;
        self.execute_all(&statements).map(|_| ())
    }

    /// Changes columns of `table`.
    ///
    /// # Errors
    ///
    /// Compile, unsupported and transport errors.
    pub fn modify_column(&mut self, table: &str, columns: Vec<ColumnDefinition>) -> Result<()> {
        let statements = Forge::new().modify_column(self.compiler(), table, columns)?;
        self.execute_all(&statements).map(|_| ())
    }

    /// Creates a database; a no-op where the dialect has none to create.
    ///
    /// # Errors
    ///
    /// Unsupported and transport errors.
    pub fn create_database(&mut self, name: &str) -> Result<()> {
        let statements = Forge::new().create_database(self.compiler(), name)?;
        self.execute_all(&statements).map(|_| ())
    }

    /// Drops a database.
    ///
    /// # Errors
    ///
    /// Unsupported and transport errors.
    pub fn drop_database(&mut self, name: &str) -> Result<()> {
        let statements = Forge::new().drop_database(self.compiler(), name)?;
        self.execute_all(&statements).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct VecCursor {
        columns: Vec<String>,
        rows: Vec<Vec<SqlValue>>,
        position: usize,
    }

    impl RowCursor for VecCursor {
        fn columns(&self) -> Vec<String> {
            self.columns.clone()
        }

        fn fetch(&mut self) -> std::result::Result<Option<Vec<SqlValue>>, TransportError> {
            let row = self.rows.get(self.position).cloned();
            self.position += 1;
            Ok(row)
        }

        fn reset(&mut self) -> bool {
            self.position = 0;
            true
        }
    }

    fn result(rows: Vec<Vec<SqlValue>>) -> QueryResult {
        QueryResult::new(Box::new(VecCursor {
            columns: vec![String::from("id"), String::from("Meta")],
            rows,
            position: 0,
        }))
    }

    #[test]
    fn test_result_reads_sequentially_and_resets() {
        let mut rows = result(vec![
            vec![SqlValue::Int(1), SqlValue::Null],
            vec![SqlValue::Int(2), SqlValue::Null],
        ]);
        assert_eq!(rows.next_row().unwrap().unwrap().get("id"), Some(&SqlValue::Int(1)));
        assert_eq!(rows.rows().unwrap().len(), 1);
        assert!(rows.reset());
        assert_eq!(rows.by_ref().count(), 2);
        rows.free();
        assert!(rows.is_freed());
        assert!(rows.next_row().unwrap().is_none());
    }

    #[test]
    fn test_row_json_is_opt_in() {
        let mut rows = result(vec![vec![SqlValue::Int(1), SqlValue::Text(String::from(r#"{"tags":["a"]}"#))]]);
        let row = rows.next_row().unwrap().unwrap();
        assert_eq!(row.get("meta"), Some(&SqlValue::Text(String::from(r#"{"tags":["a"]}"#))));
        let decoded: serde_json::Value = row.json("meta").unwrap().unwrap();
        assert_eq!(decoded["tags"][0], "a");
        assert!(row.json::<serde_json::Value>("missing").unwrap().is_none());
        assert_eq!(row.json::<i64>("id").unwrap(), Some(1));
    }

    #[test]
    fn test_row_json_reports_bad_input() {
        let mut rows = result(vec![vec![SqlValue::Int(1), SqlValue::Text(String::from("{oops"))]]);
        let row = rows.next_row().unwrap().unwrap();
        let err = row.json::<serde_json::Value>("Meta").unwrap_err();
        assert!(matches!(err, DbError::Decode { ref column, .. } if column == "Meta"));
    }

    #[test]
    fn test_row_to_record_pads_missing_values() {
        let row = Row::new(vec![String::from("a"), String::from("b")].into(), vec![SqlValue::Int(1)]);
        let record = row.to_record();
        assert_eq!(record.get("b"), Some(&SqlValue::Null));
    }
}
