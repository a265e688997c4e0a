//! Column definitions and their per-dialect clause breakdown.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::escape::Escaper;
use crate::value::SqlValue;

/// Default value for a column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefaultValue {
    /// NULL default.
    Null,
    /// Boolean default.
    Boolean(bool),
    /// Integer default.
    Integer(i64),
    /// Float default.
    Float(f64),
    /// String default.
    String(String),
    /// Raw SQL expression (e.g., `CURRENT_TIMESTAMP`).
    Expression(String),
}

impl DefaultValue {
    /// Renders the value as a literal for the given escaper.
    ///
    /// # Errors
    ///
    /// Propagates quoting failures for string defaults.
    pub fn render(&self, esc: &Escaper<'_>) -> Result<String> {
        match self {
            Self::Null => Ok(String::from("NULL")),
            Self::Boolean(b) => esc.escape_value(&SqlValue::Bool(*b)),
            Self::Integer(i) => Ok(i.to_string()),
            Self::Float(f) => esc.escape_value(&SqlValue::Float(*f)),
            Self::String(s) => esc.quote(s),
            Self::Expression(expr) => Ok(expr.clone()),
        }
    }
}

/// A column as the caller describes it, in abstract terms.
///
/// `data_type` is an abstract type name such as `INT` or `VARCHAR`; each
/// dialect rewrites it into its own type when the column is compiled.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnDefinition {
    /// Column name.
    pub name: String,
    /// Abstract type name.
    #[serde(rename = "type")]
    pub data_type: String,
    /// Length or precision, e.g. `255` or `10,2`.
    pub constraint: Option<String>,
    /// Allowed values for ENUM/SET types.
    pub values: Vec<String>,
    /// Whether the column is unsigned.
    pub unsigned: bool,
    /// Explicit NULL / NOT NULL; unset means NOT NULL on create.
    pub nullable: Option<bool>,
    /// Whether the column is unique.
    pub unique: bool,
    /// Default value.
    pub default: Option<DefaultValue>,
    /// Whether the column auto-increments.
    pub auto_increment: bool,
    /// New name, for CHANGE and RENAME.
    pub new_name: Option<String>,
    /// Literal column text used verbatim instead of the compiled clauses.
    pub raw: Option<String>,
    /// Column comment, where the dialect supports it.
    pub comment: Option<String>,
    /// Place the column after this one (MySQL family).
    pub after: Option<String>,
    /// Place the column first (MySQL family).
    pub first: bool,
}

impl ColumnDefinition {
    /// Creates a column of the given abstract type.
    #[must_use]
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            ..Self::default()
        }
    }

    /// Creates a column whose definition is the literal `sql`.
    #[must_use]
    pub fn raw(name: impl Into<String>, sql: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            raw: Some(sql.into()),
            ..Self::default()
        }
    }

    /// Sets the length or precision.
    #[must_use]
    pub fn constraint(mut self, constraint: impl Into<String>) -> Self {
        self.constraint = Some(constraint.into());
        self
    }

    /// Sets the allowed ENUM/SET values.
    #[must_use]
    pub fn values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.values = values.into_iter().map(Into::into).collect();
        self
    }

    /// Marks the column unsigned.
    #[must_use]
    pub const fn unsigned(mut self) -> Self {
        self.unsigned = true;
        self
    }

    /// Sets NULL / NOT NULL explicitly.
    #[must_use]
    pub const fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = Some(nullable);
        self
    }

    /// Marks the column unique.
    #[must_use]
    pub const fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Sets the default value.
    #[must_use]
    pub fn default_value(mut self, value: DefaultValue) -> Self {
        self.default = Some(value);
        self
    }

    /// Marks the column auto-incrementing.
    #[must_use]
    pub const fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    /// Sets the new name used by CHANGE and RENAME.
    #[must_use]
    pub fn rename_to(mut self, name: impl Into<String>) -> Self {
        self.new_name = Some(name.into());
        self
    }

    /// Sets the column comment.
    #[must_use]
    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Places the column after another one.
    #[must_use]
    pub fn after(mut self, column: impl Into<String>) -> Self {
        self.after = Some(column.into());
        self
    }
}

/// One column broken into rendered clauses.
///
/// Clauses carry their own leading space so that a dialect can drop one by
/// clearing it. Dialect hooks rewrite these in place before assembly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldClauses {
    /// Escaped column name.
    pub name: String,
    /// Escaped new name, for CHANGE and RENAME.
    pub new_name: Option<String>,
    /// Upper-cased type name.
    pub data_type: String,
    /// `(length)` or empty.
    pub length: String,
    /// Whether UNSIGNED was requested and is still pending.
    pub unsigned: bool,
    /// Rendered UNSIGNED keyword, if the dialect has one.
    pub unsigned_clause: String,
    /// ` NULL`, ` NOT NULL` or empty.
    pub null: String,
    /// Effective nullability, if stated.
    pub nullable: Option<bool>,
    /// ` UNIQUE` or empty.
    pub unique: String,
    /// ` DEFAULT x` or empty.
    pub default: String,
    /// Rendered default value without the keyword.
    pub default_value: Option<String>,
    /// Whether auto-increment was requested.
    pub auto_increment: bool,
    /// Rendered auto-increment clause.
    pub auto_increment_clause: String,
    /// Rendered comment literal.
    pub comment: Option<String>,
    /// ` FIRST`, ` AFTER x` or empty.
    pub position: String,
    /// Literal column text overriding everything after the name.
    pub literal: Option<String>,
}

impl FieldClauses {
    /// Renders the dialect-neutral clauses of `column`.
    ///
    /// `create` selects CREATE TABLE semantics, where an unstated
    /// nullability means NOT NULL.
    ///
    /// # Errors
    ///
    /// Propagates quoting failures for string defaults, ENUM values and
    /// comments.
    pub fn from_definition(column: &ColumnDefinition, esc: &Escaper<'_>, create: bool) -> Result<Self> {
        let dialect = esc.dialect();
        let mut field = Self {
            name: esc.escape_identifier(&column.name),
            new_name: column.new_name.as_deref().map(|n| esc.escape_identifier(n)),
            data_type: column.data_type.trim().to_ascii_uppercase(),
            unsigned: column.unsigned,
            nullable: column.nullable,
            auto_increment: column.auto_increment,
            literal: column.raw.clone(),
            ..Self::default()
        };

        if !column.values.is_empty() {
            let quoted = column
                .values
                .iter()
                .map(|v| esc.quote(v))
                .collect::<Result<Vec<_>>>()?;
            field.length = format!("({})", quoted.join(","));
        } else if let Some(constraint) = &column.constraint {
            field.length = format!("({constraint})");
        }

        let null_keyword = dialect.spec().null_keyword;
        field.null = match column.nullable {
            Some(true) if null_keyword.is_empty() => String::new(),
            Some(true) => format!(" {null_keyword}"),
            Some(false) => String::from(" NOT NULL"),
            None if create => String::from(" NOT NULL"),
            None => String::new(),
        };
        if create && column.nullable.is_none() {
            field.nullable = Some(false);
        }

        match &column.default {
            None => {}
            Some(DefaultValue::Null) => {
                field.nullable = Some(true);
                field.default_value = Some(String::from("NULL"));
                if null_keyword.is_empty() {
                    field.null = String::new();
                } else {
                    field.null = format!(" {null_keyword}");
                    field.default = format!(" DEFAULT {null_keyword}");
                }
            }
            Some(value) => {
                let rendered = value.render(esc)?;
                field.default = format!(" DEFAULT {rendered}");
                field.default_value = Some(rendered);
            }
        }

        if column.unique {
            field.unique = String::from(" UNIQUE");
            field.null = String::from(" NOT NULL");
            field.nullable = Some(false);
            if matches!(column.default, Some(DefaultValue::Null)) {
                field.default.clear();
                field.default_value = None;
            }
        }

        field.comment = column.comment.as_deref().map(|c| esc.quote(c)).transpose()?;
        if column.first {
            field.position = String::from(" FIRST");
        } else if let Some(after) = &column.after {
            field.position = format!(" AFTER {}", esc.escape_identifier(after));
        }
        Ok(field)
    }

    /// Returns true if the type is one of the integer types.
    #[must_use]
    pub fn is_integer(&self) -> bool {
        self.data_type.contains("INT")
    }

    /// Renames the type if it matches `from`.
    pub fn remap_type(&mut self, from: &str, to: &str) -> bool {
        if self.data_type == from {
            self.data_type = to.to_string();
            true
        } else {
            false
        }
    }
}
