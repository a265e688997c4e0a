//! Query builder.
//!
//! [`QueryBuilder`] only accumulates structured fragments; nothing is
//! escaped or rendered until a [`Compiler`](crate::compiler::Compiler)
//! turns it into SQL for a specific driver. The same builder can therefore
//! be inspected, compiled for several dialects, or [`reset`](QueryBuilder::reset)
//! and reused.
//!
//! ```rust
//! use sqlgate_core::builder::{Direction, QueryBuilder};
//!
//! let mut qb = QueryBuilder::new();
//! qb.select(["id", "name"])
//!     .from("users")
//!     .where_("age >", 18)
//!     .order_by("name", Direction::Asc)
//!     .limit(10);
//! assert_eq!(qb.from_tables(), ["users"]);
//! ```

mod predicate;
mod record;

use std::str::FromStr;

pub use predicate::{compare, split_operator, Condition, Connector, LikeSide, Operand, Predicate};
pub use record::Record;

use crate::driver::Driver;
use crate::error::DbError;
use crate::value::ToSqlValue;

/// Aggregate functions for `select_max` and friends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregate {
    /// `MAX`.
    Max,
    /// `MIN`.
    Min,
    /// `AVG`.
    Avg,
    /// `SUM`.
    Sum,
    /// `COUNT`.
    Count,
}

impl Aggregate {
    /// SQL function name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Max => "MAX",
            Self::Min => "MIN",
            Self::Avg => "AVG",
            Self::Sum => "SUM",
            Self::Count => "COUNT",
        }
    }
}

/// One entry of the select list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectItem {
    /// Column reference, escaped at compile time.
    Column(String),
    /// Expression emitted verbatim.
    Raw(String),
    /// `FUNC(column) AS alias`.
    Aggregate {
        /// Function.
        function: Aggregate,
        /// Column.
        column: String,
        /// Alias.
        alias: String,
    },
}

/// JOIN kinds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum JoinKind {
    /// `JOIN`.
    #[default]
    Inner,
    /// `LEFT JOIN`.
    Left,
    /// `RIGHT JOIN`.
    Right,
    /// `OUTER JOIN`.
    Outer,
    /// `LEFT OUTER JOIN`.
    LeftOuter,
    /// `RIGHT OUTER JOIN`.
    RightOuter,
    /// `CROSS JOIN`.
    Cross,
}

impl JoinKind {
    /// Keyword placed before `JOIN`.
    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Inner => "JOIN",
            Self::Left => "LEFT JOIN",
            Self::Right => "RIGHT JOIN",
            Self::Outer => "OUTER JOIN",
            Self::LeftOuter => "LEFT OUTER JOIN",
            Self::RightOuter => "RIGHT OUTER JOIN",
            Self::Cross => "CROSS JOIN",
        }
    }
}

/// A JOIN clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Join {
    /// Kind.
    pub kind: JoinKind,
    /// Table, with optional alias.
    pub table: String,
    /// ON condition; absent for CROSS JOIN.
    pub condition: Option<String>,
    /// Whether identifiers in the condition are escaped.
    pub escape: bool,
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Ascending.
    Asc,
    /// Descending.
    Desc,
    /// Random order, optionally seeded.
    Random {
        /// Seed, where the dialect can use one.
        seed: Option<u64>,
    },
}

impl FromStr for Direction {
    type Err = DbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("asc") || s.is_empty() {
            return Ok(Self::Asc);
        }
        if s.eq_ignore_ascii_case("desc") {
            return Ok(Self::Desc);
        }
        if s.eq_ignore_ascii_case("random") {
            return Ok(Self::Random { seed: None });
        }
        s.parse::<u64>()
            .map(|seed| Self::Random { seed: Some(seed) })
            .map_err(|_| DbError::config(format!("unknown sort direction: {s}")))
    }
}

/// One ORDER BY entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderBy {
    /// Column, ascending unless `descending`.
    Column {
        /// Column.
        column: String,
        /// Sort descending.
        descending: bool,
    },
    /// Random ordering.
    Random {
        /// Seed.
        seed: Option<u64>,
    },
    /// Expression emitted verbatim.
    Raw(String),
}

/// Accumulated query fragments.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryBuilder {
    pub(crate) select: Vec<SelectItem>,
    pub(crate) distinct: bool,
    pub(crate) from: Vec<String>,
    pub(crate) joins: Vec<Join>,
    pub(crate) wheres: Vec<Predicate>,
    pub(crate) group_by: Vec<String>,
    pub(crate) havings: Vec<Predicate>,
    pub(crate) order_by: Vec<OrderBy>,
    pub(crate) limit: Option<u64>,
    pub(crate) offset: Option<u64>,
    pub(crate) set: Vec<(String, Operand)>,
    pub(crate) aliases: Vec<String>,
}

impl QueryBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restores the empty state.
    pub fn reset(&mut self) -> &mut Self {
        *self = Self::default();
        self
    }

    // -- SELECT ----------------------------------------------------------

    /// Adds columns to the select list.
    pub fn select<I, S>(&mut self, columns: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for column in columns {
            let column = column.as_ref().trim();
            if !column.is_empty() {
                self.select.push(SelectItem::Column(column.to_string()));
            }
        }
        self
    }

    /// Adds an expression to the select list without escaping it.
    pub fn select_raw(&mut self, expression: impl Into<String>) -> &mut Self {
        self.select.push(SelectItem::Raw(expression.into()));
        self
    }

    fn select_aggregate(&mut self, function: Aggregate, column: &str, alias: Option<&str>) -> &mut Self {
        let column = column.trim().to_string();
        let alias = alias.map_or_else(
            || column.rsplit('.').next().unwrap_or_default().to_string(),
            String::from,
        );
        self.select.push(SelectItem::Aggregate {
            function,
            column,
            alias,
        });
        self
    }

    /// `SELECT MAX(column) AS alias`; the alias defaults to the column name.
    pub fn select_max(&mut self, column: &str, alias: Option<&str>) -> &mut Self {
        self.select_aggregate(Aggregate::Max, column, alias)
    }

    /// `SELECT MIN(column) AS alias`.
    pub fn select_min(&mut self, column: &str, alias: Option<&str>) -> &mut Self {
        self.select_aggregate(Aggregate::Min, column, alias)
    }

    /// `SELECT AVG(column) AS alias`.
    pub fn select_avg(&mut self, column: &str, alias: Option<&str>) -> &mut Self {
        self.select_aggregate(Aggregate::Avg, column, alias)
    }

    /// `SELECT SUM(column) AS alias`.
    pub fn select_sum(&mut self, column: &str, alias: Option<&str>) -> &mut Self {
        self.select_aggregate(Aggregate::Sum, column, alias)
    }

    /// `SELECT COUNT(column) AS alias`.
    pub fn select_count(&mut self, column: &str, alias: Option<&str>) -> &mut Self {
        self.select_aggregate(Aggregate::Count, column, alias)
    }

    /// Sets `SELECT DISTINCT`.
    pub fn distinct(&mut self, distinct: bool) -> &mut Self {
        self.distinct = distinct;
        self
    }

    /// Adds a FROM table; `"users u"` registers `u` as an alias.
    pub fn from(&mut self, table: impl Into<String>) -> &mut Self {
        let table = table.into().trim().to_string();
        if table.is_empty() {
            return self;
        }
        self.track_alias(&table);
        self.from.push(table);
        self
    }

    /// Adds a JOIN with an escaped ON condition.
    pub fn join(&mut self, table: impl Into<String>, condition: impl Into<String>, kind: JoinKind) -> &mut Self {
        self.push_join(table.into(), Some(condition.into()), kind, true)
    }

    /// Adds a JOIN whose ON condition is emitted verbatim.
    pub fn join_raw(&mut self, table: impl Into<String>, condition: impl Into<String>, kind: JoinKind) -> &mut Self {
        self.push_join(table.into(), Some(condition.into()), kind, false)
    }

    /// Adds a CROSS JOIN.
    pub fn cross_join(&mut self, table: impl Into<String>) -> &mut Self {
        self.push_join(table.into(), None, JoinKind::Cross, true)
    }

    fn push_join(&mut self, table: String, condition: Option<String>, kind: JoinKind, escape: bool) -> &mut Self {
        let table = table.trim().to_string();
        self.track_alias(&table);
        let condition = if kind == JoinKind::Cross {
            None
        } else {
            condition.filter(|c| !c.trim().is_empty())
        };
        self.joins.push(Join {
            kind,
            table,
            condition,
            escape,
        });
        self
    }

    fn track_alias(&mut self, table: &str) {
        let words: Vec<&str> = table.split_whitespace().collect();
        let alias = match words.as_slice() {
            [_, alias] => Some(*alias),
            [_, keyword, alias] if keyword.eq_ignore_ascii_case("AS") => Some(*alias),
            _ => None,
        };
        if let Some(alias) = alias {
            if !self.aliases.iter().any(|a| a == alias) {
                self.aliases.push(alias.to_string());
            }
        }
    }

    // -- WHERE -----------------------------------------------------------

    fn push_where(&mut self, connector: Connector, condition: Condition) -> &mut Self {
        self.wheres.push(Predicate { connector, condition });
        self
    }

    /// `AND key value`; the key may end in an operator (`"age >"`). A NULL
    /// value compiles to `IS NULL`/`IS NOT NULL`.
    pub fn where_(&mut self, key: &str, value: impl ToSqlValue) -> &mut Self {
        self.push_where(Connector::And, compare(key, value.to_sql_value()))
    }

    /// `OR key value`.
    pub fn or_where(&mut self, key: &str, value: impl ToSqlValue) -> &mut Self {
        self.push_where(Connector::Or, compare(key, value.to_sql_value()))
    }

    /// `AND key expression` with the right-hand side emitted verbatim.
    pub fn where_expr(&mut self, key: &str, expression: impl Into<String>) -> &mut Self {
        let (column, operator) = split_operator(key);
        self.push_where(
            Connector::And,
            Condition::Compare {
                column,
                operator,
                value: Operand::Raw(expression.into()),
            },
        )
    }

    /// `AND (sql)` verbatim.
    pub fn where_raw(&mut self, sql: impl Into<String>) -> &mut Self {
        self.push_where(Connector::And, Condition::Raw(sql.into()))
    }

    /// `OR (sql)` verbatim.
    pub fn or_where_raw(&mut self, sql: impl Into<String>) -> &mut Self {
        self.push_where(Connector::Or, Condition::Raw(sql.into()))
    }

    fn push_in<I, V>(&mut self, connector: Connector, column: &str, values: I, negated: bool) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: ToSqlValue,
    {
        let condition = Condition::In {
            column: column.trim().to_string(),
            values: values.into_iter().map(ToSqlValue::to_sql_value).collect(),
            negated,
        };
        self.push_where(connector, condition)
    }

    /// `AND column IN (...)`.
    pub fn where_in<I, V>(&mut self, column: &str, values: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: ToSqlValue,
    {
        self.push_in(Connector::And, column, values, false)
    }

    /// `OR column IN (...)`.
    pub fn or_where_in<I, V>(&mut self, column: &str, values: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: ToSqlValue,
    {
        self.push_in(Connector::Or, column, values, false)
    }

    /// `AND column NOT IN (...)`.
    pub fn where_not_in<I, V>(&mut self, column: &str, values: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: ToSqlValue,
    {
        self.push_in(Connector::And, column, values, true)
    }

    /// `OR column NOT IN (...)`.
    pub fn or_where_not_in<I, V>(&mut self, column: &str, values: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: ToSqlValue,
    {
        self.push_in(Connector::Or, column, values, true)
    }

    /// `AND column IS NULL`.
    pub fn where_null(&mut self, column: &str) -> &mut Self {
        let column = column.trim().to_string();
        self.push_where(Connector::And, Condition::Null { column, negated: false })
    }

    /// `AND column IS NOT NULL`.
    pub fn where_not_null(&mut self, column: &str) -> &mut Self {
        let column = column.trim().to_string();
        self.push_where(Connector::And, Condition::Null { column, negated: true })
    }

    fn push_like(&mut self, connector: Connector, column: &str, text: &str, side: LikeSide, negated: bool) -> &mut Self {
        let condition = Condition::Like {
            column: column.trim().to_string(),
            text: text.to_string(),
            side,
            negated,
        };
        self.push_where(connector, condition)
    }

    /// `AND column LIKE '%text%'` with wildcards in `text` escaped.
    pub fn like(&mut self, column: &str, text: &str, side: LikeSide) -> &mut Self {
        self.push_like(Connector::And, column, text, side, false)
    }

    /// `OR column LIKE ...`.
    pub fn or_like(&mut self, column: &str, text: &str, side: LikeSide) -> &mut Self {
        self.push_like(Connector::Or, column, text, side, false)
    }

    /// `AND column NOT LIKE ...`.
    pub fn not_like(&mut self, column: &str, text: &str, side: LikeSide) -> &mut Self {
        self.push_like(Connector::And, column, text, side, true)
    }

    /// `OR column NOT LIKE ...`.
    pub fn or_not_like(&mut self, column: &str, text: &str, side: LikeSide) -> &mut Self {
        self.push_like(Connector::Or, column, text, side, true)
    }

    /// Opens an `AND (` group.
    pub fn group_start(&mut self) -> &mut Self {
        self.push_where(Connector::And, Condition::GroupStart { negated: false })
    }

    /// Opens an `OR (` group.
    pub fn or_group_start(&mut self) -> &mut Self {
        self.push_where(Connector::Or, Condition::GroupStart { negated: false })
    }

    /// Opens an `AND NOT (` group.
    pub fn not_group_start(&mut self) -> &mut Self {
        self.push_where(Connector::And, Condition::GroupStart { negated: true })
    }

    /// Opens an `OR NOT (` group.
    pub fn or_not_group_start(&mut self) -> &mut Self {
        self.push_where(Connector::Or, Condition::GroupStart { negated: true })
    }

    /// Closes the innermost group.
    pub fn group_end(&mut self) -> &mut Self {
        self.push_where(Connector::And, Condition::GroupEnd)
    }

    // -- GROUP / HAVING / ORDER / LIMIT -----------------------------------

    /// Adds GROUP BY columns.
    pub fn group_by<I, S>(&mut self, columns: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.group_by.extend(
            columns
                .into_iter()
                .map(|c| c.as_ref().trim().to_string())
                .filter(|c| !c.is_empty()),
        );
        self
    }

    /// `AND key value` in HAVING.
    pub fn having(&mut self, key: &str, value: impl ToSqlValue) -> &mut Self {
        let condition = compare(key, value.to_sql_value());
        self.havings.push(Predicate {
            connector: Connector::And,
            condition,
        });
        self
    }

    /// `OR key value` in HAVING.
    pub fn or_having(&mut self, key: &str, value: impl ToSqlValue) -> &mut Self {
        let condition = compare(key, value.to_sql_value());
        self.havings.push(Predicate {
            connector: Connector::Or,
            condition,
        });
        self
    }

    /// Verbatim HAVING condition.
    pub fn having_raw(&mut self, sql: impl Into<String>) -> &mut Self {
        self.havings.push(Predicate {
            connector: Connector::And,
            condition: Condition::Raw(sql.into()),
        });
        self
    }

    /// Adds an ORDER BY entry.
    pub fn order_by(&mut self, column: &str, direction: Direction) -> &mut Self {
        let entry = match direction {
            Direction::Random { seed } => OrderBy::Random { seed },
            Direction::Asc | Direction::Desc => OrderBy::Column {
                column: column.trim().to_string(),
                descending: direction == Direction::Desc,
            },
        };
        self.order_by.push(entry);
        self
    }

    /// Random ordering.
    ///
    /// Where the dialect sets its seed per session (PostgreSQL's
    /// `SET SEED`), a seeded random order also yields a statement from
    /// [`QueryBuilder::session_statements`] that changes the session's
    /// random generator, not just this query.
    pub fn order_random(&mut self, seed: Option<u64>) -> &mut Self {
        self.order_by.push(OrderBy::Random { seed });
        self
    }

    /// Verbatim ORDER BY expression.
    pub fn order_by_raw(&mut self, expression: impl Into<String>) -> &mut Self {
        self.order_by.push(OrderBy::Raw(expression.into()));
        self
    }

    /// Sets the row limit.
    pub fn limit(&mut self, limit: u64) -> &mut Self {
        self.limit = Some(limit);
        self
    }

    /// Sets the row offset.
    pub fn offset(&mut self, offset: u64) -> &mut Self {
        self.offset = Some(offset);
        self
    }

    // -- write values -----------------------------------------------------

    /// Sets a column value for INSERT/UPDATE.
    pub fn set(&mut self, column: &str, value: impl ToSqlValue) -> &mut Self {
        self.set_operand(column, Operand::Value(value.to_sql_value()))
    }

    /// Sets a column to a verbatim expression, e.g. `count + 1`.
    pub fn set_raw(&mut self, column: &str, expression: impl Into<String>) -> &mut Self {
        self.set_operand(column, Operand::Raw(expression.into()))
    }

    /// Sets every column of `record`.
    pub fn set_record(&mut self, record: &Record) -> &mut Self {
        for (column, value) in record.iter() {
            self.set_operand(column, Operand::Value(value.clone()));
        }
        self
    }

    fn set_operand(&mut self, column: &str, operand: Operand) -> &mut Self {
        let column = column.trim().to_string();
        match self.set.iter_mut().find(|(name, _)| *name == column) {
            Some(slot) => slot.1 = operand,
            None => self.set.push((column, operand)),
        }
        self
    }

    // -- inspection -------------------------------------------------------

    /// FROM tables as given.
    #[must_use]
    pub fn from_tables(&self) -> &[String] {
        &self.from
    }

    /// Pending SET values.
    #[must_use]
    pub fn set_values(&self) -> &[(String, Operand)] {
        &self.set
    }

    /// Row limit.
    #[must_use]
    pub const fn limit_value(&self) -> Option<u64> {
        self.limit
    }

    /// Row offset.
    #[must_use]
    pub const fn offset_value(&self) -> Option<u64> {
        self.offset
    }

    /// Returns true when WHERE predicates are queued.
    #[must_use]
    pub fn has_where(&self) -> bool {
        !self.wheres.is_empty()
    }

    /// Statements that must run on the session before the compiled query.
    ///
    /// These mutate session state (e.g. PostgreSQL's random seed) and stay
    /// in effect for later queries on the same connection.
    #[must_use]
    pub fn session_statements(&self, driver: &Driver) -> Vec<String> {
        self.order_by
            .iter()
            .filter_map(|entry| match entry {
                OrderBy::Random { seed } => driver.dialect().random_order(*seed).session_statement,
                _ => None,
            })
            .collect()
    }
}
