//! Rendering of predicates, join conditions and ORDER BY entries.

use std::sync::LazyLock;

use regex::Regex;

use crate::builder::{Condition, Operand, OrderBy, Predicate};
use crate::dialect::Dialect;
use crate::error::{DbError, Operation, Result};
use crate::escape::Escaper;

/// `AND` / `OR` between join conditions.
static CONJUNCTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s+(AND|OR)\s+").expect("valid conjunction regex"));

/// `left op right` inside a join condition.
static COMPARISON: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.+?)\s*(<=|>=|<>|!=|=|<|>)\s*(.+)$").expect("valid comparison regex")
});

/// Renders builder fragments with one escaper.
pub(crate) struct ClauseWriter<'e, 'a> {
    pub(crate) esc: &'e Escaper<'a>,
    pub(crate) aliases: &'e [String],
}

impl ClauseWriter<'_, '_> {
    fn dialect(&self) -> &dyn Dialect {
        self.esc.dialect()
    }

    /// Escapes a column reference, applying the prefix to unaliased tables.
    pub(crate) fn column(&self, column: &str) -> String {
        self.esc.protect_identifier(column, false, self.aliases)
    }

    /// Joins predicates by their connectors, honoring groups.
    ///
    /// Returns `None` for an empty list.
    pub(crate) fn predicates(&self, predicates: &[Predicate], operation: Operation) -> Result<Option<String>> {
        if predicates.is_empty() {
            return Ok(None);
        }
        let mut out = String::new();
        let mut depth = 0usize;
        let mut group_open = true;
        for predicate in predicates {
            if predicate.condition == Condition::GroupEnd {
                if depth == 0 {
                    return Err(self.error(operation, "group_end without a matching group_start"));
                }
                if group_open {
                    return Err(self.error(operation, "empty predicate group"));
                }
                out.push(')');
                depth -= 1;
                continue;
            }
            if !group_open {
                out.push(' ');
                out.push_str(predicate.connector.as_str());
                out.push(' ');
            }
            match &predicate.condition {
                Condition::GroupStart { negated } => {
                    out.push_str(if *negated { "NOT (" } else { "(" });
                    depth += 1;
                    group_open = true;
                }
                condition => {
                    out.push_str(&self.condition(condition, operation)?);
                    group_open = false;
                }
            }
        }
        if depth > 0 {
            return Err(self.error(operation, "unclosed predicate group"));
        }
        Ok(Some(out))
    }

    fn condition(&self, condition: &Condition, operation: Operation) -> Result<String> {
        match condition {
            Condition::Compare {
                column,
                operator,
                value,
            } => {
                let rhs = match value {
                    Operand::Value(value) => self.esc.escape_value(value)?,
                    Operand::Raw(sql) => sql.clone(),
                };
                Ok(format!("{} {operator} {rhs}", self.column(column)))
            }
            Condition::Null { column, negated } => Ok(format!(
                "{} IS {}NULL",
                self.column(column),
                if *negated { "NOT " } else { "" }
            )),
            Condition::In {
                column,
                values,
                negated,
            } => {
                if values.is_empty() {
                    return Err(self.error(operation, format!("empty IN list for {column}")));
                }
                let values = values
                    .iter()
                    .map(|v| self.esc.escape_value(v))
                    .collect::<Result<Vec<_>>>()?;
                Ok(format!(
                    "{} {}IN ({})",
                    self.column(column),
                    if *negated { "NOT " } else { "" },
                    values.join(", ")
                ))
            }
            Condition::Like {
                column,
                text,
                side,
                negated,
            } => {
                let pattern = side.pattern(&self.esc.escape_like(text));
                let escape = self.esc.quote(&self.dialect().spec().like_escape.to_string())?;
                Ok(format!(
                    "{} {}LIKE {} ESCAPE {escape}",
                    self.column(column),
                    if *negated { "NOT " } else { "" },
                    self.esc.quote(&pattern)?
                ))
            }
            Condition::Raw(sql) => Ok(sql.clone()),
            Condition::GroupStart { .. } | Condition::GroupEnd => {
                Err(self.error(operation, "misplaced predicate group"))
            }
        }
    }

    /// Escapes identifiers on both sides of each comparison in a join
    /// condition; anything that does not parse as a comparison is kept.
    pub(crate) fn join_condition(&self, condition: &str) -> String {
        let mut out = String::new();
        let mut last = 0;
        for separator in CONJUNCTION.find_iter(condition) {
            out.push_str(&self.comparison(&condition[last..separator.start()]));
            out.push(' ');
            out.push_str(&separator.as_str().trim().to_ascii_uppercase());
            out.push(' ');
            last = separator.end();
        }
        out.push_str(&self.comparison(&condition[last..]));
        out
    }

    fn comparison(&self, text: &str) -> String {
        let text = text.trim();
        let (open, inner, close) = strip_parens(text);
        match COMPARISON.captures(inner) {
            Some(caps) => format!(
                "{open}{} {} {}{close}",
                self.column(&caps[1]),
                &caps[2],
                self.column(&caps[3])
            ),
            None => text.to_string(),
        }
    }

    /// ORDER BY clause, or `None` without entries.
    pub(crate) fn order_by(&self, entries: &[OrderBy]) -> Option<String> {
        if entries.is_empty() {
            return None;
        }
        let rendered: Vec<String> = entries
            .iter()
            .map(|entry| match entry {
                OrderBy::Column { column, descending } => {
                    format!("{} {}", self.column(column), if *descending { "DESC" } else { "ASC" })
                }
                OrderBy::Random { seed } => self.dialect().random_order(*seed).expression,
                OrderBy::Raw(sql) => sql.clone(),
            })
            .collect();
        Some(format!("ORDER BY {}", rendered.join(", ")))
    }

    fn error(&self, operation: Operation, message: impl Into<String>) -> DbError {
        DbError::compile(operation, self.dialect().name(), message)
    }
}

/// Splits leading `(` and trailing `)` off a condition fragment.
fn strip_parens(text: &str) -> (&str, &str, &str) {
    let open_len = text.len() - text.trim_start_matches('(').len();
    let close_len = text.len() - text.trim_end_matches(')').len();
    let opens = open_len.min(close_len);
    if opens == 0 || opens * 2 > text.len() {
        return ("", text, "");
    }
    (
        &text[..opens],
        &text[opens..text.len() - opens],
        &text[text.len() - opens..],
    )
}
