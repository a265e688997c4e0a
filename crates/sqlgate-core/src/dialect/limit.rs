//! LIMIT/OFFSET strategies.
//!
//! Every strategy is total over `(limit, offset, order-by present)`: a page
//! with only an offset still skips rows, and the window-based strategies
//! pick a neutral ordering when the query has none.

use crate::escape::Escaper;

/// Largest row count MySQL accepts, used for offset-only pages.
const MYSQL_MAX_ROWS: u64 = u64::MAX;

/// Alias of the synthetic row-number column.
const ROWNUM_ALIAS: &str = "sg_rownum";

/// Alias of the wrapping subquery.
const SUBQUERY_ALIAS: &str = "sg_subquery";

/// Alias of the derived table that deduplicates before rows are numbered.
const DISTINCT_ALIAS: &str = "sg_distinct";

/// Pagination syntax family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitStrategy {
    /// `LIMIT n OFFSET m`.
    LimitOffset,
    /// `LIMIT m, n`.
    LimitComma,
    /// `SELECT TOP n`, with a `ROW_NUMBER()` window for offsets.
    Top,
    /// `OFFSET m ROWS FETCH NEXT n ROWS ONLY`.
    OffsetFetch {
        /// ORDER BY is mandatory before OFFSET.
        requires_order: bool,
    },
    /// Nested `ROWNUM` filtering.
    RownumWrap,
    /// `SELECT FIRST n SKIP m`.
    FirstSkip,
    /// `ROWS m TO n`.
    RowsTo,
    /// `FETCH FIRST n ROWS ONLY`, with a row-number wrap for offsets.
    FetchFirst,
}

/// Requested page; an offset of zero is no offset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Page {
    /// Maximum rows.
    pub limit: Option<u64>,
    /// Rows to skip.
    pub offset: Option<u64>,
}

impl Page {
    /// Creates a page, normalizing a zero offset away.
    #[must_use]
    pub const fn new(limit: Option<u64>, offset: Option<u64>) -> Self {
        let offset = match offset {
            Some(0) => None,
            other => other,
        };
        Self { limit, offset }
    }

    /// Returns true when neither limit nor offset is set.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.limit.is_none() && self.offset.is_none()
    }
}

/// A compiled SELECT split where pagination needs to cut into it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectParts {
    /// `SELECT DISTINCT`.
    pub distinct: bool,
    /// Escaped select list; empty means `*`.
    pub columns: Vec<String>,
    /// Everything from FROM through HAVING, with a leading space.
    pub body: String,
    /// `ORDER BY ...` clause.
    pub order_by: Option<String>,
}

impl SelectParts {
    /// `SELECT ` or `SELECT DISTINCT `.
    #[must_use]
    pub const fn head(&self) -> &'static str {
        if self.distinct {
            "SELECT DISTINCT "
        } else {
            "SELECT "
        }
    }

    /// `DISTINCT ` or nothing.
    #[must_use]
    pub const fn quantifier(&self) -> &'static str {
        if self.distinct {
            "DISTINCT "
        } else {
            ""
        }
    }

    /// The select list.
    #[must_use]
    pub fn column_list(&self) -> String {
        if self.columns.is_empty() {
            String::from("*")
        } else {
            self.columns.join(", ")
        }
    }

    /// The query without ORDER BY.
    #[must_use]
    pub fn unordered(&self) -> String {
        format!("{}{}{}", self.head(), self.column_list(), self.body)
    }

    /// The full query.
    #[must_use]
    pub fn to_sql(&self) -> String {
        let mut sql = self.unordered();
        if let Some(order_by) = &self.order_by {
            sql.push(' ');
            sql.push_str(order_by);
        }
        sql
    }

    /// Names the outer query of a wrapped select can refer to.
    fn outer_columns(&self) -> String {
        if self.columns.is_empty() || self.columns.iter().any(|c| c.contains('*')) {
            return String::from("*");
        }
        self.columns
            .iter()
            .map(|column| {
                let column = column.trim();
                match column.rsplit_once(char::is_whitespace) {
                    Some((_, alias)) => alias.to_string(),
                    None => column
                        .rsplit_once('.')
                        .map_or(column, |(_, name)| name)
                        .to_string(),
                }
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Applies `strategy` to a select.
#[must_use]
pub fn apply(strategy: LimitStrategy, parts: &SelectParts, page: Page, esc: &Escaper<'_>) -> String {
    let page = Page::new(page.limit, page.offset);
    if page.is_empty() {
        return parts.to_sql();
    }
    match strategy {
        LimitStrategy::LimitOffset => limit_offset(parts, page),
        LimitStrategy::LimitComma => limit_comma(parts, page),
        LimitStrategy::Top => top(parts, page, esc),
        LimitStrategy::OffsetFetch { requires_order } => offset_fetch(parts, page, requires_order),
        LimitStrategy::RownumWrap => rownum_wrap(parts, page),
        LimitStrategy::FirstSkip => first_skip(parts, page),
        LimitStrategy::RowsTo => rows_to(parts, page),
        LimitStrategy::FetchFirst => fetch_first(parts, page, esc),
    }
}

fn limit_offset(parts: &SelectParts, page: Page) -> String {
    let mut sql = parts.to_sql();
    if let Some(limit) = page.limit {
        sql.push_str(&format!(" LIMIT {limit}"));
    }
    if let Some(offset) = page.offset {
        sql.push_str(&format!(" OFFSET {offset}"));
    }
    sql
}

fn limit_comma(parts: &SelectParts, page: Page) -> String {
    let mut sql = parts.to_sql();
    match (page.limit, page.offset) {
        (Some(limit), None) => sql.push_str(&format!(" LIMIT {limit}")),
        (limit, Some(offset)) => {
            let limit = limit.unwrap_or(MYSQL_MAX_ROWS);
            sql.push_str(&format!(" LIMIT {offset}, {limit}"));
        }
        (None, None) => {}
    }
    sql
}

fn top(parts: &SelectParts, page: Page, esc: &Escaper<'_>) -> String {
    match (page.limit, page.offset) {
        (Some(limit), None) => {
            let mut sql = format!("{}TOP {limit} {}{}", parts.head(), parts.column_list(), parts.body);
            if let Some(order_by) = &parts.order_by {
                sql.push(' ');
                sql.push_str(order_by);
            }
            sql
        }
        (limit, offset) => row_number_window(parts, limit, offset.unwrap_or(0), esc),
    }
}

/// Numbers rows inside a subquery; the ORDER BY moves into the window.
///
/// A DISTINCT select is deduplicated in a derived table first, since a
/// row number makes every row unique.
fn row_number_window(parts: &SelectParts, limit: Option<u64>, offset: u64, esc: &Escaper<'_>) -> String {
    let order_by = parts.order_by.as_deref().unwrap_or("ORDER BY (SELECT NULL)");
    let rownum = esc.escape_identifier(ROWNUM_ALIAS);
    let subquery = esc.escape_identifier(SUBQUERY_ALIAS);
    let numbered = if parts.distinct {
        let distinct = esc.escape_identifier(DISTINCT_ALIAS);
        format!(
            "SELECT ROW_NUMBER() OVER({order_by}) AS {rownum}, {distinct}.* FROM ({unordered}) {distinct}",
            unordered = parts.unordered(),
        )
    } else {
        format!(
            "SELECT ROW_NUMBER() OVER({order_by}) AS {rownum}, {columns}{body}",
            columns = parts.column_list(),
            body = parts.body,
        )
    };
    let filter = match limit {
        Some(limit) => format!(
            "{rownum} BETWEEN {} AND {}",
            offset.saturating_add(1),
            offset.saturating_add(limit)
        ),
        None => format!("{rownum} > {offset}"),
    };
    format!(
        "SELECT {outer} FROM ({numbered}) {subquery} WHERE {filter} ORDER BY {rownum}",
        outer = parts.outer_columns(),
    )
}

fn offset_fetch(parts: &SelectParts, page: Page, requires_order: bool) -> String {
    let mut sql = parts.to_sql();
    if requires_order && parts.order_by.is_none() {
        sql.push_str(" ORDER BY (SELECT NULL)");
    }
    sql.push_str(&format!(" OFFSET {} ROWS", page.offset.unwrap_or(0)));
    if let Some(limit) = page.limit {
        sql.push_str(&format!(" FETCH NEXT {limit} ROWS ONLY"));
    }
    sql
}

fn rownum_wrap(parts: &SelectParts, page: Page) -> String {
    let offset = page.offset.unwrap_or(0);
    let inner = parts.to_sql();
    let mut sql = format!("SELECT * FROM (SELECT inner_query.*, rownum rnum FROM ({inner}) inner_query");
    if let Some(limit) = page.limit {
        sql.push_str(&format!(
            " WHERE rownum < {}",
            offset.saturating_add(limit).saturating_add(1)
        ));
    }
    sql.push(')');
    if offset > 0 {
        sql.push_str(&format!(" WHERE rnum >= {}", offset.saturating_add(1)));
    }
    sql
}

fn first_skip(parts: &SelectParts, page: Page) -> String {
    let mut clause = String::new();
    if let Some(limit) = page.limit {
        clause.push_str(&format!("FIRST {limit} "));
    }
    if let Some(offset) = page.offset {
        clause.push_str(&format!("SKIP {offset} "));
    }
    let mut sql = format!(
        "SELECT {clause}{}{}{}",
        parts.quantifier(),
        parts.column_list(),
        parts.body
    );
    if let Some(order_by) = &parts.order_by {
        sql.push(' ');
        sql.push_str(order_by);
    }
    sql
}

fn rows_to(parts: &SelectParts, page: Page) -> String {
    let mut sql = parts.to_sql();
    match (page.limit, page.offset) {
        (Some(limit), None) => sql.push_str(&format!(" ROWS {limit}")),
        (limit, offset) => {
            let first = offset.unwrap_or(0).saturating_add(1);
            let last = limit.map_or(u64::from(u32::MAX), |limit| {
                offset.unwrap_or(0).saturating_add(limit)
            });
            sql.push_str(&format!(" ROWS {first} TO {last}"));
        }
    }
    sql
}

fn fetch_first(parts: &SelectParts, page: Page, esc: &Escaper<'_>) -> String {
    let Some(offset) = page.offset else {
        let limit = page.limit.unwrap_or(0);
        return format!("{} FETCH FIRST {limit} ROWS ONLY", parts.to_sql());
    };
    let mut inner = parts.to_sql();
    if let Some(limit) = page.limit {
        inner.push_str(&format!(
            " FETCH FIRST {} ROWS ONLY",
            offset.saturating_add(limit)
        ));
    }
    let rownum = esc.escape_identifier(ROWNUM_ALIAS);
    let subquery = esc.escape_identifier(SUBQUERY_ALIAS);
    format!(
        "SELECT * FROM (SELECT inner_query.*, ROW_NUMBER() OVER() AS {rownum} FROM ({inner}) inner_query) {subquery} WHERE {rownum} > {offset}"
    )
}
