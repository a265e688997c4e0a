//! Connection configuration and DSN URL resolution.
//!
//! A [`ConnectionConfig`] is built either from a URL of the form
//! `driver[/sub_driver]://[user[:pass]@]host[:port]/database[?key=value&...]`
//! or from a flat key/value map (for example a JSON file). The result is
//! canonical: placeholder values are cleared and query extras are typed.

use std::collections::BTreeMap;

use percent_encoding::percent_decode_str;
use serde::Serialize;
use url::Url;

use crate::error::{DbError, Result};
use crate::value::SqlValue;

/// Canonical connection descriptor.
///
/// Immutable once a [`Driver`](crate::Driver) has been resolved from it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConnectionConfig {
    /// Primary driver name, e.g. `mysqli` or `pdo`.
    pub driver: String,
    /// Secondary driver layered over the primary, e.g. `mysql` for `pdo`.
    pub sub_driver: Option<String>,
    /// Native DSN overriding the computed one.
    pub dsn: Option<String>,
    /// Server host name.
    pub hostname: String,
    /// Server port.
    pub port: Option<u16>,
    /// Database (or file path for SQLite).
    pub database: String,
    /// User name.
    pub username: String,
    /// Password.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub password: String,
    /// Connection character set.
    pub charset: String,
    /// Connection collation.
    pub collate: String,
    /// Table prefix applied to table names.
    pub prefix: String,
    /// Whether identifiers are escaped by the builder.
    pub protect_identifiers: bool,
    /// Whether transactions are issued at all.
    pub trans_enabled: bool,
    /// Server version hint used for version-gated syntax.
    pub version: Option<String>,
    /// Schema / search path.
    pub schema: String,
    /// Dialect-specific options passed through opaquely.
    pub extra: BTreeMap<String, SqlValue>,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            driver: String::new(),
            sub_driver: None,
            dsn: None,
            hostname: String::new(),
            port: None,
            database: String::new(),
            username: String::new(),
            password: String::new(),
            charset: String::new(),
            collate: String::new(),
            prefix: String::new(),
            protect_identifiers: true,
            trans_enabled: true,
            version: None,
            schema: String::new(),
            extra: BTreeMap::new(),
        }
    }
}

impl ConnectionConfig {
    /// Creates a config for the given driver with everything else unset.
    #[must_use]
    pub fn new(driver: impl Into<String>) -> Self {
        let mut config = Self::default();
        config.set_driver(&driver.into());
        config
    }

    /// Parses a DSN URL.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Config`] for a malformed URL or a missing driver.
    pub fn from_url(dsn: &str) -> Result<Self> {
        let (scheme, rest) = dsn
            .trim()
            .split_once("://")
            .ok_or_else(|| DbError::config("invalid connection string"))?;
        if scheme.is_empty() {
            return Err(DbError::config("no driver selected"));
        }

        // The scheme may contain a '/' which `Url` would reject, so the rest
        // is parsed under a neutral scheme.
        let url = Url::parse(&format!("dsn://{rest}"))
            .map_err(|_| DbError::config("invalid connection string"))?;

        let mut config = Self::new(decode(scheme));
        config.hostname = url.host_str().map(decode).unwrap_or_default();
        config.port = url.port();
        config.username = decode(url.username());
        config.password = url.password().map(decode).unwrap_or_default();
        // Without a host the path is a file path and keeps its root.
        let path = url.path();
        config.database = if url.host_str().unwrap_or_default().is_empty() {
            decode(path)
        } else {
            decode(path.strip_prefix('/').unwrap_or(path))
        };

        for (key, value) in url.query_pairs() {
            config.set(&key, coerce_extra(&value))?;
        }
        config.clear_placeholders();
        config.infer_sub_driver();
        Ok(config)
    }

    /// Builds a config from a key/value map.
    ///
    /// Unknown keys land in [`ConnectionConfig::extra`]. A `dsn` key that is
    /// itself a URL is parsed first and the remaining keys are merged over it.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Config`] when no driver can be determined or a
    /// recognized key has a value of the wrong shape.
    pub fn from_map(map: &BTreeMap<String, SqlValue>) -> Result<Self> {
        let url = map
            .get("dsn")
            .and_then(SqlValue::as_str)
            .filter(|dsn| dsn.contains("://"));
        let mut config = match url {
            Some(dsn) => Self::from_url(dsn)?,
            None => Self::default(),
        };
        for (key, value) in map {
            if key == "dsn" && url.is_some() {
                continue;
            }
            config.set(key, value.clone())?;
        }
        config.clear_placeholders();
        if config.driver.is_empty() {
            return Err(DbError::config("no driver selected"));
        }
        config.infer_sub_driver();
        Ok(config)
    }

    /// Sets a single key, routing recognized keys to their fields.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Config`] for a non-numeric or out-of-range port.
    pub fn set(&mut self, key: &str, value: SqlValue) -> Result<()> {
        let text = || value.to_plain_string();
        match key {
            "driver" => self.set_driver(&text()),
            "sub_driver" | "subdriver" => {
                self.sub_driver = Some(text()).filter(|s| !s.is_empty());
            }
            "dsn" => self.dsn = Some(text()).filter(|s| !s.is_empty()),
            "hostname" => self.hostname = text(),
            "port" => self.port = parse_port(&value)?,
            "database" => self.database = text(),
            "username" => self.username = text(),
            "password" => self.password = text(),
            "charset" => self.charset = text(),
            "collate" | "dbcollat" => self.collate = text(),
            "prefix" | "dbprefix" => self.prefix = text(),
            "protect_identifiers" => self.protect_identifiers = value.as_bool().unwrap_or(true),
            "trans_enabled" => self.trans_enabled = value.as_bool().unwrap_or(true),
            "version" => self.version = Some(text()).filter(|s| !s.is_empty()),
            "schema" => self.schema = text(),
            _ => {
                self.extra.insert(key.to_string(), value);
            }
        }
        Ok(())
    }

    /// Returns an extra option by key.
    #[must_use]
    pub fn extra(&self, key: &str) -> Option<&SqlValue> {
        self.extra.get(key)
    }

    /// Returns an extra option as text, treating empty values as unset.
    #[must_use]
    pub fn extra_str(&self, key: &str) -> Option<String> {
        self.extra
            .get(key)
            .filter(|v| !v.is_null())
            .map(SqlValue::to_plain_string)
            .filter(|s| !s.is_empty())
    }

    /// Returns an extra option as a boolean flag (unset is `false`).
    #[must_use]
    pub fn extra_flag(&self, key: &str) -> bool {
        self.extra
            .get(key)
            .and_then(SqlValue::as_bool)
            .unwrap_or(false)
    }

    /// Returns the `{driver}` or `{driver}/{sub_driver}` key.
    #[must_use]
    pub fn driver_key(&self) -> String {
        match &self.sub_driver {
            Some(sub) => format!("{}/{sub}", self.driver),
            None => self.driver.clone(),
        }
    }

    fn set_driver(&mut self, name: &str) {
        match name.split_once('/') {
            Some((driver, sub)) => {
                self.driver = driver.to_ascii_lowercase();
                self.sub_driver = Some(sub.to_ascii_lowercase()).filter(|s| !s.is_empty());
            }
            None => self.driver = name.to_ascii_lowercase(),
        }
    }

    /// A raw PDO DSN such as `mysql:host=...` names its own sub-driver.
    fn infer_sub_driver(&mut self) {
        if self.driver != "pdo" || self.sub_driver.is_some() {
            return;
        }
        if let Some((prefix, _)) = self.dsn.as_deref().and_then(|dsn| dsn.split_once(':')) {
            if !prefix.is_empty() && prefix.chars().all(|c| c.is_ascii_alphanumeric()) {
                self.sub_driver = Some(prefix.to_ascii_lowercase());
            }
        }
    }

    /// Example DSNs use the literal words as stand-ins for real values.
    fn clear_placeholders(&mut self) {
        for (slot, placeholder) in [
            (&mut self.username, "username"),
            (&mut self.password, "password"),
            (&mut self.hostname, "hostname"),
        ] {
            if *slot == placeholder {
                slot.clear();
            }
        }
    }
}

fn decode(raw: &str) -> String {
    percent_decode_str(raw).decode_utf8_lossy().into_owned()
}

/// Query-string values spelled TRUE/FALSE/NULL become typed literals.
fn coerce_extra(raw: &str) -> SqlValue {
    match raw.to_ascii_uppercase().as_str() {
        "TRUE" => SqlValue::Bool(true),
        "FALSE" => SqlValue::Bool(false),
        "NULL" => SqlValue::Null,
        _ => SqlValue::Text(raw.to_string()),
    }
}

fn parse_port(value: &SqlValue) -> Result<Option<u16>> {
    match value {
        SqlValue::Null => Ok(None),
        SqlValue::Text(s) if s.trim().is_empty() => Ok(None),
        other => other
            .as_i64()
            .and_then(|n| u16::try_from(n).ok())
            .map(Some)
            .ok_or_else(|| DbError::config(format!("invalid port: {}", other.to_plain_string()))),
    }
}
