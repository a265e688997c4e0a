//! Error types for configuration, compilation and execution.

use std::fmt;

/// The statement or schema operation an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// SELECT (including COUNT wrappers).
    Select,
    /// Single-row INSERT.
    Insert,
    /// Multi-row INSERT.
    InsertBatch,
    /// Single UPDATE.
    Update,
    /// CASE-based batch UPDATE.
    UpdateBatch,
    /// DELETE.
    Delete,
    /// REPLACE / upsert-by-key.
    Replace,
    /// TRUNCATE.
    Truncate,
    /// CREATE TABLE.
    CreateTable,
    /// ALTER TABLE.
    AlterTable,
    /// DROP TABLE.
    DropTable,
    /// RENAME TABLE.
    RenameTable,
    /// CREATE DATABASE.
    CreateDatabase,
    /// DROP DATABASE.
    DropDatabase,
    /// Value escaping.
    Escape,
}

impl Operation {
    /// Returns the SQL-ish name of the operation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Select => "SELECT",
            Self::Insert => "INSERT",
            Self::InsertBatch => "INSERT BATCH",
            Self::Update => "UPDATE",
            Self::UpdateBatch => "UPDATE BATCH",
            Self::Delete => "DELETE",
            Self::Replace => "REPLACE",
            Self::Truncate => "TRUNCATE",
            Self::CreateTable => "CREATE TABLE",
            Self::AlterTable => "ALTER TABLE",
            Self::DropTable => "DROP TABLE",
            Self::RenameTable => "RENAME TABLE",
            Self::CreateDatabase => "CREATE DATABASE",
            Self::DropDatabase => "DROP DATABASE",
            Self::Escape => "ESCAPE",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An error reported by the native driver underneath a connection.
///
/// The core never retries these; it only keeps the original code and
/// message, plus the SQL that triggered them when known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportError {
    /// Native error code, e.g. a SQLSTATE.
    pub code: Option<String>,
    /// Native error message.
    pub message: String,
    /// Statement that failed.
    pub sql: Option<String>,
}

impl TransportError {
    /// Creates a transport error without a code.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
            sql: None,
        }
    }

    /// Attaches a native error code.
    #[must_use]
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Attaches the offending SQL text.
    #[must_use]
    pub fn with_sql(mut self, sql: impl Into<String>) -> Self {
        self.sql = Some(sql.into());
        self
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.code {
            Some(code) => write!(f, "SQLSTATE[{code}]: {}", self.message)?,
            None => f.write_str(&self.message)?,
        }
        if let Some(sql) = &self.sql {
            write!(f, " (SQL: {sql})")?;
        }
        Ok(())
    }
}

impl std::error::Error for TransportError {}

/// Errors produced by the database layer.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// Bad DSN, missing or unknown driver. Fatal to connection setup.
    #[error("configuration error: {0}")]
    Config(String),

    /// The accumulated fragments cannot form a valid statement.
    #[error("cannot compile {operation} for {dialect}: {message}")]
    Compile {
        /// Operation being compiled.
        operation: Operation,
        /// Dialect that rejected it.
        dialect: &'static str,
        /// What was wrong.
        message: String,
    },

    /// The dialect has no way to express the operation.
    #[error("{operation} is not supported by the {dialect} driver")]
    Unsupported {
        /// Operation being compiled.
        operation: Operation,
        /// Dialect that rejected it.
        dialect: &'static str,
    },

    /// The native driver failed.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// A column asked for as JSON did not hold valid JSON.
    #[error("cannot decode column {column} as JSON: {source}")]
    Decode {
        /// Column name.
        column: String,
        /// Parser error.
        #[source]
        source: serde_json::Error,
    },
}

impl DbError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates a compile error.
    pub fn compile(operation: Operation, dialect: &'static str, message: impl Into<String>) -> Self {
        Self::Compile {
            operation,
            dialect,
            message: message.into(),
        }
    }

    /// Creates an unsupported-operation error.
    #[must_use]
    pub const fn unsupported(operation: Operation, dialect: &'static str) -> Self {
        Self::Unsupported { operation, dialect }
    }

    /// Returns true for [`DbError::Unsupported`].
    #[must_use]
    pub const fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported { .. })
    }
}

/// Result type for database layer operations.
pub type Result<T> = std::result::Result<T, DbError>;
