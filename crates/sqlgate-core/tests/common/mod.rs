//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::LazyLock;

use regex::Regex;
use sqlgate_core::dialect::TxnCommand;
use sqlgate_core::{ConnectionConfig, Driver, Registry, RowCursor, SqlValue, Transport, TransportError};

/// Resolves `driver` (`"pdo/mysql"` style keys allowed) with enough config
/// for every DSN builder.
pub fn driver(key: &str) -> Driver {
    driver_with(key, |_| {})
}

/// Like [`driver`], letting the caller adjust the config first.
pub fn driver_with(key: &str, adjust: impl FnOnce(&mut ConnectionConfig)) -> Driver {
    let mut config = ConnectionConfig::new(key);
    config.hostname = String::from("localhost");
    config.database = String::from("app");
    config.username = String::from("app");
    adjust(&mut config);
    Registry::builtin().resolve(&config).unwrap()
}

/// Every dialect configuration worth exercising, labelled.
pub fn all_drivers() -> Vec<(&'static str, Driver)> {
    vec![
        ("mysqli", driver("mysqli")),
        ("postgre", driver("postgre")),
        ("sqlite3", driver("sqlite3")),
        ("sqlsrv 2012+", driver("sqlsrv")),
        ("sqlsrv 2008", driver_with("sqlsrv", |c| c.version = Some(String::from("10.50.1600")))),
        ("oci8 12c+", driver("oci8")),
        ("oci8 11g", driver_with("oci8", |c| c.version = Some(String::from("11.2.0")))),
        ("ibase", driver("ibase")),
        (
            "interbase",
            driver_with("ibase", |c| {
                c.extra.insert(String::from("interbase"), SqlValue::Bool(true));
            }),
        ),
        ("cubrid", driver("cubrid")),
        ("odbc/ibm", driver("odbc/ibm")),
        ("pdo/4d", driver("pdo/4d")),
        ("pdo", driver_with("pdo", |c| c.dsn = Some(String::from("informix:host=localhost")))),
    ]
}

// -- mock transport --------------------------------------------------------

/// Everything a [`MockTransport`] was asked to do.
#[derive(Debug, Default)]
pub struct MockLog {
    pub dsn: Option<String>,
    pub executed: Vec<String>,
    pub native_transactions: Vec<TxnCommand>,
    pub quoted: Vec<String>,
    pub freed: usize,
    pub closed: bool,
}

struct Reply {
    pattern: String,
    columns: Vec<String>,
    rows: Vec<Vec<SqlValue>>,
    affected: u64,
}

/// A scripted transport: statements containing a registered pattern get
/// that reply, everything else returns no rows.
#[derive(Clone, Default)]
pub struct MockTransport {
    pub log: Rc<RefCell<MockLog>>,
    replies: Rc<RefCell<Vec<Reply>>>,
    failures: Rc<RefCell<Vec<String>>>,
    affected: Rc<RefCell<u64>>,
    /// The native client has no quoting routine.
    pub no_quoting: bool,
    pub version: Option<String>,
    pub insert_id: Option<i64>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rows for statements containing `pattern`.
    pub fn reply(&self, pattern: &str, columns: &[&str], rows: Vec<Vec<SqlValue>>) -> &Self {
        self.replies.borrow_mut().push(Reply {
            pattern: pattern.to_string(),
            columns: columns.iter().map(|c| (*c).to_string()).collect(),
            rows,
            affected: 0,
        });
        self
    }

    /// Affected-row count for statements containing `pattern`.
    pub fn affects(&self, pattern: &str, affected: u64) -> &Self {
        self.replies.borrow_mut().push(Reply {
            pattern: pattern.to_string(),
            columns: Vec::new(),
            rows: Vec::new(),
            affected,
        });
        self
    }

    /// Statements containing `pattern` fail.
    pub fn fail_on(&self, pattern: &str) -> &Self {
        self.failures.borrow_mut().push(pattern.to_string());
        self
    }

    pub fn executed(&self) -> Vec<String> {
        self.log.borrow().executed.clone()
    }

    pub fn count(&self, sql: &str) -> usize {
        self.log.borrow().executed.iter().filter(|s| *s == sql).count()
    }
}

struct MockCursor {
    columns: Vec<String>,
    rows: Vec<Vec<SqlValue>>,
    position: usize,
    log: Rc<RefCell<MockLog>>,
}

impl RowCursor for MockCursor {
    fn columns(&self) -> Vec<String> {
        self.columns.clone()
    }

    fn fetch(&mut self) -> Result<Option<Vec<SqlValue>>, TransportError> {
        let row = self.rows.get(self.position).cloned();
        self.position += 1;
        Ok(row)
    }

    fn reset(&mut self) -> bool {
        self.position = 0;
        true
    }

    fn free(&mut self) {
        self.log.borrow_mut().freed += 1;
    }
}

impl Transport for MockTransport {
    fn connect(&mut self, dsn: &str, _config: &ConnectionConfig) -> Result<(), TransportError> {
        self.log.borrow_mut().dsn = Some(dsn.to_string());
        Ok(())
    }

    fn execute(&mut self, sql: &str) -> Result<Box<dyn RowCursor>, TransportError> {
        self.log.borrow_mut().executed.push(sql.to_string());
        if self.failures.borrow().iter().any(|p| sql.contains(p.as_str())) {
            return Err(TransportError::new("mock failure").with_code("HY000"));
        }
        let replies = self.replies.borrow();
        let reply = replies.iter().find(|r| sql.contains(r.pattern.as_str()));
        *self.affected.borrow_mut() = reply.map_or(0, |r| r.affected);
        Ok(Box::new(MockCursor {
            columns: reply.map(|r| r.columns.clone()).unwrap_or_default(),
            rows: reply.map(|r| r.rows.clone()).unwrap_or_default(),
            position: 0,
            log: Rc::clone(&self.log),
        }))
    }

    fn affected_rows(&self) -> u64 {
        *self.affected.borrow()
    }

    fn last_insert_id(&self) -> Option<i64> {
        self.insert_id
    }

    fn quote(&self, text: &str) -> Option<String> {
        if self.no_quoting {
            return None;
        }
        self.log.borrow_mut().quoted.push(text.to_string());
        Some(format!("'{}'", text.replace('\'', "''")))
    }

    fn server_version(&mut self) -> Option<String> {
        self.version.clone()
    }

    fn transaction(&mut self, command: TxnCommand) -> Result<(), TransportError> {
        self.log.borrow_mut().native_transactions.push(command);
        Ok(())
    }

    fn close(&mut self) {
        self.log.borrow_mut().closed = true;
    }
}

// -- reference pagination evaluator ---------------------------------------

fn re(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap()
}

static ROWNUM_LT: LazyLock<Regex> = LazyLock::new(|| re(r"WHERE rownum < (\d+)"));
static RNUM_GE: LazyLock<Regex> = LazyLock::new(|| re(r"WHERE rnum >= (\d+)"));
static WINDOW_BETWEEN: LazyLock<Regex> = LazyLock::new(|| re(r#"sg_rownum[\]"`]? BETWEEN (\d+) AND (\d+)"#));
static WINDOW_AFTER: LazyLock<Regex> = LazyLock::new(|| re(r#"sg_rownum[\]"`]? > (\d+)"#));
static FETCH_FIRST: LazyLock<Regex> = LazyLock::new(|| re(r"FETCH FIRST (\d+) ROWS ONLY"));
static OFFSET_FETCH: LazyLock<Regex> =
    LazyLock::new(|| re(r" OFFSET (\d+) ROWS(?: FETCH NEXT (\d+) ROWS ONLY)?$"));
static LIMIT_COMMA: LazyLock<Regex> = LazyLock::new(|| re(r" LIMIT (\d+), (\d+)$"));
static LIMIT_OFFSET: LazyLock<Regex> = LazyLock::new(|| re(r" LIMIT (-?\d+)(?: OFFSET (\d+))?$"));
static OFFSET_ONLY: LazyLock<Regex> = LazyLock::new(|| re(r" OFFSET (\d+)$"));
static TOP: LazyLock<Regex> = LazyLock::new(|| re(r"^SELECT (?:DISTINCT )?TOP (\d+) "));
static FIRST_SKIP: LazyLock<Regex> =
    LazyLock::new(|| re(r"^SELECT (?:FIRST (\d+) )?(?:SKIP (\d+) )?"));
static ROWS_TO: LazyLock<Regex> = LazyLock::new(|| re(r" ROWS (\d+) TO (\d+)$"));
static ROWS: LazyLock<Regex> = LazyLock::new(|| re(r" ROWS (\d+)$"));

fn num(caps: &regex::Captures<'_>, index: usize) -> Option<u64> {
    caps.get(index).map(|m| m.as_str().parse().unwrap())
}

/// Reads back `(rows skipped, rows taken)` from paginated SQL of any
/// supported strategy. `None` means unbounded.
pub fn page_window(sql: &str) -> (u64, Option<u64>) {
    if sql.contains("rownum rnum FROM") {
        let skip = RNUM_GE.captures(sql).and_then(|c| num(&c, 1)).map_or(0, |n| n - 1);
        let take = ROWNUM_LT.captures(sql).and_then(|c| num(&c, 1)).map(|n| n - 1 - skip);
        return (skip, take);
    }
    if let Some(caps) = WINDOW_BETWEEN.captures(sql) {
        let (first, last) = (num(&caps, 1).unwrap(), num(&caps, 2).unwrap());
        return (first - 1, Some(last - first + 1));
    }
    if let Some(caps) = WINDOW_AFTER.captures(sql) {
        let skip = num(&caps, 1).unwrap();
        let take = FETCH_FIRST.captures(sql).and_then(|c| num(&c, 1)).map(|n| n - skip);
        return (skip, take);
    }
    if let Some(caps) = OFFSET_FETCH.captures(sql) {
        return (num(&caps, 1).unwrap(), num(&caps, 2));
    }
    if let Some(caps) = LIMIT_COMMA.captures(sql) {
        let take = num(&caps, 2).filter(|n| *n != u64::MAX);
        return (num(&caps, 1).unwrap(), take);
    }
    if let Some(caps) = LIMIT_OFFSET.captures(sql) {
        let take = caps[1].parse::<i64>().unwrap();
        let take = u64::try_from(take).ok();
        return (num(&caps, 2).unwrap_or(0), take);
    }
    if let Some(caps) = OFFSET_ONLY.captures(sql) {
        return (num(&caps, 1).unwrap(), None);
    }
    if let Some(caps) = TOP.captures(sql) {
        return (0, num(&caps, 1));
    }
    if let Some(caps) = ROWS_TO.captures(sql) {
        let (first, last) = (num(&caps, 1).unwrap(), num(&caps, 2).unwrap());
        let take = (last != u64::from(u32::MAX)).then(|| last - first + 1);
        return (first - 1, take);
    }
    if let Some(caps) = ROWS.captures(sql) {
        return (0, num(&caps, 1));
    }
    if let Some(caps) = FETCH_FIRST.captures(sql) {
        return (0, num(&caps, 1));
    }
    if let Some(caps) = FIRST_SKIP.captures(sql) {
        return (num(&caps, 2).unwrap_or(0), num(&caps, 1));
    }
    (0, None)
}

/// `sql` with everything inside parentheses and string literals removed.
pub fn top_level(sql: &str) -> String {
    let mut out = String::new();
    let mut depth = 0usize;
    let mut quoted = false;
    for c in sql.chars() {
        match c {
            '\'' => quoted = !quoted,
            '(' if !quoted => depth += 1,
            ')' if !quoted => depth = depth.saturating_sub(1),
            _ if depth == 0 && !quoted => out.push(c),
            _ => {}
        }
    }
    out
}
