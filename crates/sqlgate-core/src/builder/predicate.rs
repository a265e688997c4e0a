//! WHERE/HAVING predicate fragments.

use std::sync::LazyLock;

use regex::Regex;

use crate::value::SqlValue;

/// Comparison operator trailing a column key, e.g. `"age >"` or `"name IS NOT"`.
static OPERATOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(.*?)\s*(!=|<>|<=|>=|=|<|>|\s+IS\s+NOT|\s+IS|\s+NOT\s+LIKE|\s+LIKE)\s*$")
        .expect("valid operator regex")
});

/// How a predicate joins the one before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connector {
    /// `AND`.
    And,
    /// `OR`.
    Or,
}

impl Connector {
    /// SQL keyword.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
        }
    }
}

/// Where the wildcards of a LIKE go.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LikeSide {
    /// `%match`.
    Before,
    /// `match%`.
    After,
    /// `%match%`.
    #[default]
    Both,
    /// Exact match, no wildcards.
    None,
}

impl LikeSide {
    /// Wraps `escaped` in wildcards.
    #[must_use]
    pub fn pattern(self, escaped: &str) -> String {
        match self {
            Self::Before => format!("%{escaped}"),
            Self::After => format!("{escaped}%"),
            Self::Both => format!("%{escaped}%"),
            Self::None => escaped.to_string(),
        }
    }
}

/// Right-hand side of a comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// A value, escaped at compile time.
    Value(SqlValue),
    /// A SQL expression emitted verbatim.
    Raw(String),
}

/// One predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// `column op value`.
    Compare {
        /// Column or expression on the left.
        column: String,
        /// Normalized operator.
        operator: String,
        /// Right-hand side.
        value: Operand,
    },
    /// `column IS [NOT] NULL`.
    Null {
        /// Column.
        column: String,
        /// `IS NOT NULL` when set.
        negated: bool,
    },
    /// `column [NOT] IN (...)`.
    In {
        /// Column.
        column: String,
        /// Candidate values.
        values: Vec<SqlValue>,
        /// `NOT IN` when set.
        negated: bool,
    },
    /// `column [NOT] LIKE pattern`.
    Like {
        /// Column.
        column: String,
        /// Unescaped match text.
        text: String,
        /// Wildcard placement.
        side: LikeSide,
        /// `NOT LIKE` when set.
        negated: bool,
    },
    /// Verbatim SQL.
    Raw(String),
    /// Opens a parenthesised group.
    GroupStart {
        /// `NOT (` when set.
        negated: bool,
    },
    /// Closes the innermost group.
    GroupEnd,
}

/// A condition and its connector to the previous one.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    /// Connector; ignored for the first predicate of a group.
    pub connector: Connector,
    /// The condition.
    pub condition: Condition,
}

/// Splits `"age >="` into `("age", ">=")`; a bare key gets `=`.
#[must_use]
pub fn split_operator(key: &str) -> (String, String) {
    let key = key.trim();
    match OPERATOR.captures(key) {
        Some(caps) if !caps[1].trim().is_empty() => {
            let operator = caps[2]
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ")
                .to_ascii_uppercase();
            (caps[1].trim().to_string(), operator)
        }
        _ => (key.to_string(), String::from("=")),
    }
}

/// Builds the condition for `key = value`, turning NULL comparisons into
/// `IS [NOT] NULL`.
#[must_use]
pub fn compare(key: &str, value: SqlValue) -> Condition {
    let (column, operator) = split_operator(key);
    if value.is_null() {
        match operator.as_str() {
            "=" | "IS" => return Condition::Null { column, negated: false },
            "!=" | "<>" | "IS NOT" => return Condition::Null { column, negated: true },
            _ => {}
        }
    }
    Condition::Compare {
        column,
        operator,
        value: Operand::Value(value),
    }
}
