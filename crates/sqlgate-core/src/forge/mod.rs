//! Schema forge: DDL compiled per dialect.
//!
//! A [`Forge`] accumulates column definitions and keys, then compiles them
//! through a [`Compiler`], or straight from a [`Driver`](crate::Driver),
//! into one or more statements. Columns go through the dialect hooks in a
//! fixed order: type remap, UNSIGNED, auto-increment, then assembly.

mod column;

use std::collections::BTreeMap;

use serde::Deserialize;
use tracing::debug;

pub use column::{ColumnDefinition, DefaultValue, FieldClauses};

use crate::compiler::Compiler;
use crate::dialect::AlterKind;
use crate::error::{DbError, Operation, Result};
use crate::escape::Escaper;

/// A secondary index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexKey {
    /// Indexed columns.
    pub columns: Vec<String>,
    /// Whether the index is unique.
    pub unique: bool,
}

/// A table described as data, e.g. loaded from JSON.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TableDefinition {
    /// Table name, without prefix.
    pub name: String,
    /// Columns in order.
    pub columns: Vec<ColumnDefinition>,
    /// Primary key columns.
    pub primary_key: Vec<String>,
    /// Secondary indexes, one column list each.
    pub keys: Vec<Vec<String>>,
    /// Unique indexes, one column list each.
    pub unique_keys: Vec<Vec<String>>,
    /// Table attributes such as `ENGINE`.
    pub attributes: BTreeMap<String, String>,
}

/// Accumulates fields and keys for the next schema statement.
#[derive(Debug, Clone, Default)]
pub struct Forge {
    fields: Vec<ColumnDefinition>,
    keys: Vec<IndexKey>,
    primary_keys: Vec<String>,
}

impl Forge {
    /// Creates an empty forge.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the columns and keys of `table`.
    #[must_use]
    pub fn from_definition(table: &TableDefinition) -> Self {
        let mut forge = Self::new();
        for column in &table.columns {
            forge.add_field(column.clone());
        }
        forge.add_primary_key(table.primary_key.iter().map(String::as_str));
        for key in &table.keys {
            forge.add_key(key.iter().map(String::as_str), false, false);
        }
        for key in &table.unique_keys {
            forge.add_key(key.iter().map(String::as_str), false, true);
        }
        forge
    }

    /// Queues a column.
    pub fn add_field(&mut self, column: ColumnDefinition) -> &mut Self {
        self.fields.push(column);
        self
    }

    /// Queues a key over `columns`; `primary` adds them to the primary key.
    pub fn add_key<'a>(
        &mut self,
        columns: impl IntoIterator<Item = &'a str>,
        primary: bool,
        unique: bool,
    ) -> &mut Self {
        let columns: Vec<String> = columns.into_iter().map(String::from).collect();
        if columns.is_empty() {
            return self;
        }
        if primary {
            for column in columns {
                if !self.primary_keys.contains(&column) {
                    self.primary_keys.push(column);
                }
            }
        } else {
            self.keys.push(IndexKey { columns, unique });
        }
        self
    }

    /// Queues primary key columns.
    pub fn add_primary_key<'a>(&mut self, columns: impl IntoIterator<Item = &'a str>) -> &mut Self {
        self.add_key(columns, true, false)
    }

    /// Queued columns.
    #[must_use]
    pub fn fields(&self) -> &[ColumnDefinition] {
        &self.fields
    }

    /// Clears everything queued.
    pub fn reset(&mut self) {
        self.fields.clear();
        self.keys.clear();
        self.primary_keys.clear();
    }

    /// CREATE TABLE plus any index statements, then resets the forge.
    ///
    /// `if_not_exists` is rendered only where the dialect supports it
    /// natively; the connection emulates it elsewhere.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Compile`] without fields, and propagates quoting
    /// failures.
    pub fn create_table<'d>(
        &mut self,
        target: impl Into<Compiler<'d>>,
        table: &str,
        if_not_exists: bool,
        attributes: &[(String, String)],
    ) -> Result<Vec<String>> {
        let compiler = target.into();
        let dialect = compiler.dialect();
        if self.fields.is_empty() {
            return Err(DbError::compile(
                Operation::CreateTable,
                dialect.name(),
                "a table needs at least one field",
            ));
        }
        let esc = *compiler.escaper();
        let spec = dialect.spec();
        let name = esc.protect_identifier(table, true, &[]);
        let bare = esc.unescape_identifier(&name);

        let mut primary_keys = self.primary_keys.clone();
        let fields = process_fields(&esc, &self.fields, true, &mut primary_keys)?;
        let mut lines: Vec<String> = fields.iter().map(|f| dialect.column_text(f)).collect();

        if !primary_keys.is_empty() {
            lines.push(format!(
                "CONSTRAINT {} PRIMARY KEY({})",
                esc.escape_identifier(&format!("pk_{bare}")),
                escape_list(&esc, &primary_keys)
            ));
        }
        let mut index_statements = Vec::new();
        for key in &self.keys {
            let index = esc.escape_identifier(&format!("{bare}_{}", key.columns.join("_")));
            let columns = escape_list(&esc, &key.columns);
            let unique = if key.unique { "UNIQUE " } else { "" };
            if spec.inline_keys {
                lines.push(format!("{unique}KEY {index} ({columns})"));
            } else {
                index_statements.push(format!("CREATE {unique}INDEX {index} ON {name} ({columns})"));
            }
        }

        let mut sql = String::from("CREATE TABLE ");
        if if_not_exists && spec.create_if_not_exists {
            sql.push_str("IF NOT EXISTS ");
        }
        sql.push_str(&name);
        sql.push_str(" (\n");
        sql.push_str(
            &lines
                .iter()
                .map(|line| format!("    {line}"))
                .collect::<Vec<_>>()
                .join(",\n"),
        );
        sql.push_str("\n)");
        sql.push_str(&dialect.create_table_attributes(attributes, compiler.config()));

        let mut statements = vec![sql];
        statements.extend(index_statements);
        log_statements(dialect.name(), &statements);
        self.reset();
        Ok(statements)
    }

    /// DROP TABLE.
    ///
    /// # Errors
    ///
    /// Propagates dialect refusals.
    pub fn drop_table<'d>(
        &self,
        target: impl Into<Compiler<'d>>,
        table: &str,
        if_exists: bool,
        cascade: bool,
    ) -> Result<Vec<String>> {
        let compiler = target.into();
        let name = compiler.escaper().protect_identifier(table, true, &[]);
        let statements = vec![compiler.dialect().drop_table(&name, if_exists, cascade)?];
        log_statements(compiler.dialect().name(), &statements);
        Ok(statements)
    }

    /// RENAME TABLE.
    ///
    /// # Errors
    ///
    /// Propagates dialect refusals.
    pub fn rename_table<'d>(&self, target: impl Into<Compiler<'d>>, from: &str, to: &str) -> Result<Vec<String>> {
        let compiler = target.into();
        let esc = compiler.escaper();
        let statements = vec![compiler.dialect().rename_table(
            esc,
            &esc.protect_identifier(from, true, &[]),
            &esc.protect_identifier(to, true, &[]),
        )?];
        log_statements(compiler.dialect().name(), &statements);
        Ok(statements)
    }

    /// ALTER TABLE with the queued fields, then resets the forge.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Compile`] without fields, and
    /// [`DbError::Unsupported`] when the dialect lacks `kind`.
    pub fn alter_table<'d>(
        &mut self,
        target: impl Into<Compiler<'d>>,
        kind: AlterKind,
        table: &str,
    ) -> Result<Vec<String>> {
        let compiler = target.into();
        let dialect = compiler.dialect();
        if self.fields.is_empty() {
            return Err(DbError::compile(
                Operation::AlterTable,
                dialect.name(),
                "no columns given",
            ));
        }
        let esc = *compiler.escaper();
        let name = esc.protect_identifier(table, true, &[]);
        let fields = process_fields(&esc, &self.fields, false, &mut Vec::new())?;
        let statements = dialect.alter_table(&esc, kind, &name, &fields)?;
        log_statements(dialect.name(), &statements);
        self.reset();
        Ok(statements)
    }

    /// Adds `columns` to `table`.
    ///
    /// # Errors
    ///
    /// See [`Forge::alter_table`].
    pub fn add_column<'d>(
        &mut self,
        target: impl Into<Compiler<'d>>,
        table: &str,
        columns: Vec<ColumnDefinition>,
    ) -> Result<Vec<String>> {
        self.fields = columns;
        self.alter_table(target, AlterKind::Add, table)
    }

    /// Drops the named columns from `table`.
    ///
    /// # Errors
    ///
    /// See [`Forge::alter_table`].
    pub fn drop_column<'a, 'd>(
        &mut self,
        target: impl Into<Compiler<'d>>,
        table: &str,
        columns: impl IntoIterator<Item = &'a str>,
    ) -> Result<Vec<String>> {
        self.fields = columns
            .into_iter()
            .map(|name| ColumnDefinition::new(name, ""))
            .collect();
        self.alter_table(target, AlterKind::Drop, table)
    }

    /// Changes (and optionally renames) `columns` of `table`.
    ///
    /// # Errors
    ///
    /// See [`Forge::alter_table`].
    pub fn modify_column<'d>(
        &mut self,
        target: impl Into<Compiler<'d>>,
        table: &str,
        columns: Vec<ColumnDefinition>,
    ) -> Result<Vec<String>> {
        self.fields = columns;
        self.alter_table(target, AlterKind::Change, table)
    }

    /// CREATE DATABASE; empty when the dialect treats it as a no-op.
    ///
    /// # Errors
    ///
    /// Propagates dialect refusals.
    pub fn create_database<'d>(&self, target: impl Into<Compiler<'d>>, name: &str) -> Result<Vec<String>> {
        let compiler = target.into();
        let statements: Vec<String> = compiler
            .dialect()
            .create_database(&compiler.escaper().escape_identifier(name), compiler.config())?
            .into_iter()
            .collect();
        log_statements(compiler.dialect().name(), &statements);
        Ok(statements)
    }

    /// DROP DATABASE; empty when the dialect treats it as a no-op.
    ///
    /// # Errors
    ///
    /// Propagates dialect refusals.
    pub fn drop_database<'d>(&self, target: impl Into<Compiler<'d>>, name: &str) -> Result<Vec<String>> {
        let compiler = target.into();
        let statements: Vec<String> = compiler
            .dialect()
            .drop_database(&compiler.escaper().escape_identifier(name))?
            .into_iter()
            .collect();
        log_statements(compiler.dialect().name(), &statements);
        Ok(statements)
    }
}

/// Runs every column through the dialect hooks.
fn process_fields(
    esc: &Escaper<'_>,
    columns: &[ColumnDefinition],
    create: bool,
    primary_keys: &mut Vec<String>,
) -> Result<Vec<FieldClauses>> {
    let dialect = esc.dialect();
    columns
        .iter()
        .map(|column| {
            let mut field = FieldClauses::from_definition(column, esc, create)?;
            if field.literal.is_none() && !field.data_type.is_empty() {
                dialect.attr_type(&mut field);
                dialect.attr_unsigned(&mut field);
                dialect.attr_auto_increment(&mut field, primary_keys);
            }
            Ok(field)
        })
        .collect()
}

fn escape_list(esc: &Escaper<'_>, columns: &[String]) -> String {
    columns
        .iter()
        .map(|c| esc.escape_identifier(c))
        .collect::<Vec<_>>()
        .join(", ")
}

fn log_statements(dialect: &str, statements: &[String]) {
    for sql in statements {
        debug!(dialect, sql = %sql, "compiled schema statement");
    }
}
