//! Ordered column/value rows for batch writes.

use std::fmt;

use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};

use crate::value::{SqlValue, ToSqlValue};

/// One row of column/value pairs, in insertion order.
///
/// Deserializes from a map, keeping the map's key order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<(String, SqlValue)>,
}

impl Record {
    /// Creates an empty record.
    #[must_use]
    pub const fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Sets `column`, replacing an earlier value for the same column.
    #[must_use]
    pub fn with(mut self, column: impl Into<String>, value: impl ToSqlValue) -> Self {
        self.set(column, value);
        self
    }

    /// Sets `column` in place.
    pub fn set(&mut self, column: impl Into<String>, value: impl ToSqlValue) {
        let column = column.into();
        let value = value.to_sql_value();
        match self.fields.iter_mut().find(|(name, _)| *name == column) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((column, value)),
        }
    }

    /// Value of `column`.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&SqlValue> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    /// Column names in order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    /// Column/value pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SqlValue)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Number of columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true without columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: ToSqlValue> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Self::new();
        for (column, value) in iter {
            record.set(column, value);
        }
        record
    }
}

struct RecordVisitor;

impl<'de> Visitor<'de> for RecordVisitor {
    type Value = Record;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of column names to scalar values")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Record, A::Error> {
        let mut record = Record::new();
        while let Some((column, value)) = access.next_entry::<String, SqlValue>()? {
            record.set(column, value);
        }
        Ok(record)
    }
}

impl<'de> Deserialize<'de> for Record {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(RecordVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_keeps_first_position() {
        let record = Record::new().with("id", 1).with("name", "a").with("id", 2);
        assert_eq!(record.columns().collect::<Vec<_>>(), vec!["id", "name"]);
        assert_eq!(record.get("id"), Some(&SqlValue::Int(2)));
        assert_eq!(record.len(), 2);
    }

    #[test]
    fn test_record_from_json_object() {
        let record: Record = serde_json::from_str(r#"{"name": "x", "id": 7, "gone": null}"#).unwrap();
        assert_eq!(record.columns().collect::<Vec<_>>(), vec!["name", "id", "gone"]);
        assert_eq!(record.get("id"), Some(&SqlValue::Int(7)));
        assert_eq!(record.get("gone"), Some(&SqlValue::Null));
    }
}
