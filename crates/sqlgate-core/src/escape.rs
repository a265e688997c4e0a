//! Identifier and value escaping.
//!
//! Every identifier and literal that reaches compiled SQL passes through an
//! [`Escaper`]. Identifier rules come from the dialect. String literals are
//! quoted by the connected transport's [`Quoter`]; without one, the offline
//! [`Quoting`] rule of the driver family applies.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::dialect::Dialect;
use crate::error::{DbError, Operation, Result};
use crate::value::SqlValue;

/// `expr alias` or `expr AS alias`.
static ALIAS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(.+?)\s+(?:AS\s+)?([^\s.]+)$").expect("valid alias regex")
});

/// Characters that have special meaning inside a LIKE pattern.
const LIKE_SPECIAL: [char; 2] = ['%', '_'];

/// How a dialect wraps identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscapeChar {
    /// Identifiers are emitted as-is.
    None,
    /// Same character on both sides, e.g. `"name"` or `` `name` ``.
    Single(char),
    /// Open/close pair, e.g. `[name]`.
    Pair(char, char),
}

impl EscapeChar {
    /// Returns the opening character.
    #[must_use]
    pub const fn open(self) -> Option<char> {
        match self {
            Self::None => None,
            Self::Single(c) | Self::Pair(c, _) => Some(c),
        }
    }

    /// Returns the closing character.
    #[must_use]
    pub const fn close(self) -> Option<char> {
        match self {
            Self::None => None,
            Self::Single(c) | Self::Pair(_, c) => Some(c),
        }
    }
}

/// Native string-literal quoting.
///
/// Every [`Transport`](crate::Transport) is a quoter through its
/// [`quote`](crate::Transport::quote) method.
pub trait Quoter {
    /// `text` as a complete literal, quotes included, or `None` when the
    /// native client has no quoting primitive.
    fn quote_literal(&self, text: &str) -> Option<String>;
}

/// Offline string quoting rule of a driver family, used when compiling
/// without a connected transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Quoting {
    /// MySQL wire rules: backslash-escape quotes, backslashes and control bytes.
    Backslash,
    /// Standard SQL: double embedded single quotes.
    Doubling,
    /// The transport has no quoting primitive; escaping text fails.
    Unavailable,
}

/// Escapes identifiers and values for one driver.
#[derive(Clone, Copy)]
pub struct Escaper<'a> {
    dialect: &'a dyn Dialect,
    escape_char: EscapeChar,
    quoting: Quoting,
    quoter: Option<&'a dyn Quoter>,
    prefix: &'a str,
    protect: bool,
}

impl fmt::Debug for Escaper<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Escaper")
            .field("dialect", &self.dialect.name())
            .field("escape_char", &self.escape_char)
            .field("quoting", &self.quoting)
            .field("native_quoter", &self.quoter.is_some())
            .field("prefix", &self.prefix)
            .field("protect", &self.protect)
            .finish()
    }
}

impl<'a> Escaper<'a> {
    /// Creates an escaper.
    #[must_use]
    pub const fn new(
        dialect: &'a dyn Dialect,
        escape_char: EscapeChar,
        quoting: Quoting,
        prefix: &'a str,
        protect: bool,
    ) -> Self {
        Self {
            dialect,
            escape_char,
            quoting,
            quoter: None,
            prefix,
            protect,
        }
    }

    /// Hands string literals to `quoter` instead of the offline rule.
    #[must_use]
    pub fn with_quoter(mut self, quoter: &'a dyn Quoter) -> Self {
        self.quoter = Some(quoter);
        self
    }

    /// Returns the dialect this escaper renders for.
    #[must_use]
    pub fn dialect(&self) -> &'a dyn Dialect {
        self.dialect
    }

    /// Returns the table prefix.
    #[must_use]
    pub const fn prefix(&self) -> &'a str {
        self.prefix
    }

    /// Returns the offline quoting rule.
    #[must_use]
    pub const fn quoting(&self) -> Quoting {
        self.quoting
    }

    /// Returns true when literals go through a native quoter.
    #[must_use]
    pub const fn has_quoter(&self) -> bool {
        self.quoter.is_some()
    }

    /// Returns true when identifier protection is on.
    #[must_use]
    pub const fn protects(&self) -> bool {
        self.protect
    }

    /// Wraps each dot-separated segment of `name` in escape characters.
    ///
    /// Segments that are `*`, already wrapped, or reserved for the dialect
    /// are left alone, which makes this idempotent.
    #[must_use]
    pub fn escape_identifier(&self, name: &str) -> String {
        let (Some(open), Some(close)) = (self.escape_char.open(), self.escape_char.close()) else {
            return name.to_string();
        };
        let name = name.trim();
        if name.is_empty() || name == "*" {
            return name.to_string();
        }
        self.split_segments(name)
            .iter()
            .map(|segment| self.escape_segment(segment, open, close))
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Strips escape characters from each segment of `name`.
    #[must_use]
    pub fn unescape_identifier(&self, name: &str) -> String {
        let close = self.escape_char.close();
        self.split_segments(name.trim())
            .iter()
            .map(|segment| {
                let bare = self.unwrap_segment(segment.trim());
                match close {
                    Some(c) => bare.replace(&format!("{c}{c}"), &c.to_string()),
                    None => bare,
                }
            })
            .collect::<Vec<_>>()
            .join(".")
    }

    fn escape_segment(&self, segment: &str, open: char, close: char) -> String {
        let segment = segment.trim();
        if segment == "*" || self.dialect.is_reserved(segment) || self.is_wrapped(segment) {
            return segment.to_string();
        }
        let mut out = String::with_capacity(segment.len() + 2);
        out.push(open);
        for c in segment.chars() {
            if c == close {
                out.push(close);
            }
            out.push(c);
        }
        out.push(close);
        out
    }

    fn is_wrapped(&self, segment: &str) -> bool {
        match (self.escape_char.open(), self.escape_char.close()) {
            (Some(open), Some(close)) => {
                segment.chars().count() >= 2
                    && segment.starts_with(open)
                    && segment.ends_with(close)
            }
            _ => false,
        }
    }

    /// Splits on dots that are not inside an escaped segment.
    fn split_segments(&self, name: &str) -> Vec<String> {
        let (open, close) = match (self.escape_char.open(), self.escape_char.close()) {
            (Some(open), Some(close)) => (open, close),
            _ => return name.split('.').map(String::from).collect(),
        };
        let mut segments = Vec::new();
        let mut current = String::new();
        let mut quoted = false;
        let mut chars = name.chars().peekable();
        while let Some(c) = chars.next() {
            if quoted {
                current.push(c);
                if c == close {
                    if chars.peek() == Some(&close) {
                        current.push(close);
                        chars.next();
                    } else {
                        quoted = false;
                    }
                }
            } else if c == open && current.trim().is_empty() {
                quoted = true;
                current.push(c);
            } else if c == '.' {
                segments.push(std::mem::take(&mut current));
            } else {
                current.push(c);
            }
        }
        segments.push(current);
        segments
    }

    fn unwrap_segment(&self, segment: &str) -> String {
        if self.is_wrapped(segment) {
            let mut chars = segment.chars();
            chars.next();
            chars.next_back();
            chars.as_str().to_string()
        } else {
            segment.to_string()
        }
    }

    fn prefixed_segment(&self, segment: &str) -> String {
        if self.is_wrapped(segment) {
            let mut chars = segment.chars();
            let open = chars.next().map(String::from).unwrap_or_default();
            format!("{open}{}{}", self.prefix, chars.as_str())
        } else {
            format!("{}{segment}", self.prefix)
        }
    }

    /// Escapes a table or column reference the way the builder needs it.
    ///
    /// Handles `expr AS alias` and `expr alias`, leaves function calls,
    /// string literals and numbers untouched, and applies the table prefix:
    /// to the whole item when `table` is set, otherwise to the table segment
    /// of a qualified column unless that segment is one of `aliases`.
    #[must_use]
    pub fn protect_identifier(&self, item: &str, table: bool, aliases: &[String]) -> String {
        let item = item.trim();
        if item.is_empty() || item == "*" || item.contains(['(', ')', '\'']) {
            return item.to_string();
        }
        if is_number(item) {
            return item.to_string();
        }
        if let Some(caps) = ALIAS.captures(item) {
            let expr = self.protect_identifier(&caps[1], table, aliases);
            let alias = self.protect_name(&caps[2]);
            let separator = if table && !self.dialect.spec().table_alias_as {
                " "
            } else {
                " AS "
            };
            return format!("{expr}{separator}{alias}");
        }

        let mut segments = self.split_segments(item);
        if !self.prefix.is_empty() {
            let index = if table || segments.len() == 1 {
                segments.len() - 1
            } else {
                segments.len() - 2
            };
            let bare = self.unwrap_segment(&segments[index]);
            let applies = (table || segments.len() > 1)
                && !bare.starts_with(self.prefix)
                && !aliases.iter().any(|a| a == &bare);
            if applies {
                segments[index] = self.prefixed_segment(&segments[index]);
            }
        }
        let joined = segments.join(".");
        self.protect_name(&joined)
    }

    /// Escapes `name` only when identifier protection is on.
    #[must_use]
    pub fn protect_name(&self, name: &str) -> String {
        if self.protect {
            self.escape_identifier(name)
        } else {
            name.trim().to_string()
        }
    }

    /// Renders a value as a SQL literal.
    ///
    /// # Errors
    ///
    /// Fails with [`DbError::Unsupported`] for text when there is no
    /// quoting primitive.
    pub fn escape_value(&self, value: &SqlValue) -> Result<String> {
        match value {
            SqlValue::Null => Ok(String::from("NULL")),
            SqlValue::Bool(b) => Ok(self.dialect.bool_literal(*b).to_string()),
            SqlValue::Int(n) => Ok(n.to_string()),
            SqlValue::Float(f) if f.is_finite() => Ok(f.to_string()),
            SqlValue::Float(f) => self.quote(&f.to_string()),
            SqlValue::Text(s) => self.quote(s),
            SqlValue::Blob(bytes) => Ok(self.dialect.blob_literal(bytes)),
        }
    }

    /// Quotes text as a string literal, through the native quoter when one
    /// is attached.
    ///
    /// # Errors
    ///
    /// Fails with [`DbError::Unsupported`] when the native quoter declines,
    /// or without one under [`Quoting::Unavailable`].
    pub fn quote(&self, text: &str) -> Result<String> {
        if let Some(quoter) = self.quoter {
            return quoter
                .quote_literal(text)
                .ok_or_else(|| DbError::unsupported(Operation::Escape, self.dialect.name()));
        }
        match self.quoting {
            Quoting::Doubling => Ok(format!("'{}'", text.replace('\'', "''"))),
            Quoting::Backslash => {
                let mut out = String::with_capacity(text.len() + 2);
                out.push('\'');
                for c in text.chars() {
                    match c {
                        '\0' => out.push_str("\\0"),
                        '\n' => out.push_str("\\n"),
                        '\r' => out.push_str("\\r"),
                        '\\' => out.push_str("\\\\"),
                        '\'' => out.push_str("\\'"),
                        '"' => out.push_str("\\\""),
                        '\x1a' => out.push_str("\\Z"),
                        other => out.push(other),
                    }
                }
                out.push('\'');
                Ok(out)
            }
            Quoting::Unavailable => Err(DbError::unsupported(
                Operation::Escape,
                self.dialect.name(),
            )),
        }
    }

    /// Escapes LIKE wildcards (and the escape character itself) in `text`.
    ///
    /// The result is not quoted; the compiler adds wildcards and quotes it.
    #[must_use]
    pub fn escape_like(&self, text: &str) -> String {
        let escape = self.dialect.spec().like_escape;
        let mut out = String::with_capacity(text.len());
        for c in text.chars() {
            if c == escape || LIKE_SPECIAL.contains(&c) {
                out.push(escape);
            }
            out.push(c);
        }
        out
    }
}

/// A numeric literal such as `42`, `-3` or `1.5`.
fn is_number(item: &str) -> bool {
    let digits = item.strip_prefix(['-', '+']).unwrap_or(item);
    digits.chars().any(|c| c.is_ascii_digit())
        && digits.chars().all(|c| c.is_ascii_digit() || c == '.')
        && digits.matches('.').count() <= 1
}
