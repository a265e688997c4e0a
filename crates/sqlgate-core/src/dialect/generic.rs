//! Generic dialect for PDO and ODBC connections without a specific backend.

use super::{Dialect, DialectSpec, RandomOrder, SeedStyle, TxnCommand};
use crate::config::ConnectionConfig;

/// Standard SQL with `LIMIT n OFFSET m`.
///
/// Used by the `pdo` and `odbc` primary drivers. Transactions are driven
/// through the transport API rather than SQL statements.
#[derive(Debug, Clone)]
pub struct GenericDialect {
    spec: DialectSpec,
}

impl GenericDialect {
    /// Creates the dialect for `config`.
    #[must_use]
    pub fn new(config: &ConnectionConfig) -> Self {
        let mut spec = DialectSpec::standard("pdo");
        if config.driver == "odbc" {
            spec.name = "odbc";
            spec.random = RandomOrder {
                keyword: "RND()",
                seeded: SeedStyle::Inline("RND({seed})"),
            };
        }
        Self { spec }
    }

    /// DSN for a bare `pdo` connection: the configured one, if any.
    #[must_use]
    pub fn pdo_dsn(config: &ConnectionConfig) -> String {
        config.dsn.clone().unwrap_or_default()
    }

    /// DSN for an ODBC data source.
    #[must_use]
    pub fn odbc_dsn(config: &ConnectionConfig) -> String {
        let source = config
            .extra_str("DSN")
            .unwrap_or_else(|| config.database.clone());
        format!("DSN={source}")
    }

    /// DSN for a PDO connection through ODBC.
    #[must_use]
    pub fn pdo_odbc_dsn(config: &ConnectionConfig) -> String {
        format!("odbc:{}", Self::odbc_dsn(config))
    }
}

impl Dialect for GenericDialect {
    fn spec(&self) -> &DialectSpec {
        &self.spec
    }

    fn transaction_sql(&self, _command: TxnCommand) -> Option<&'static str> {
        None
    }
}

/// Joins non-empty `key=value` pairs with `;` after a `scheme:` prefix.
pub(crate) fn keyed_dsn(scheme: &str, pairs: &[(&str, String)]) -> String {
    let body = pairs
        .iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join(";");
    if scheme.is_empty() {
        body
    } else {
        format!("{scheme}:{body}")
    }
}

/// The configured port as text, or empty.
pub(crate) fn port_text(config: &ConnectionConfig) -> String {
    config.port.map(|p| p.to_string()).unwrap_or_default()
}
