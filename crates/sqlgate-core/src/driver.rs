//! Resolved driver handle and per-connection session state.

use std::fmt;

use tracing::debug;

use crate::config::ConnectionConfig;
use crate::dialect::Dialect;
use crate::escape::{Escaper, Quoting};
use crate::registry::DialectFactory;
use crate::value::SqlValue;

/// What a connection learned about its session after connecting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    /// SQL Server `QUOTED_IDENTIFIER` setting, once checked.
    pub quoted_identifier: Option<bool>,
    /// Whether the session check has run.
    pub checked: bool,
}

/// A configured dialect plus everything needed to render SQL for it.
pub struct Driver {
    config: ConnectionConfig,
    dsn: String,
    factory: DialectFactory,
    dialect: Box<dyn Dialect>,
    quoting: Quoting,
    session: SessionState,
}

impl fmt::Debug for Driver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Driver")
            .field("driver", &self.config.driver_key())
            .field("dialect", &self.dialect.name())
            .field("dsn", &self.dsn)
            .field("quoting", &self.quoting)
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

impl Driver {
    /// Creates a driver handle.
    #[must_use]
    pub fn new(config: ConnectionConfig, dsn: String, factory: DialectFactory, quoting: Quoting) -> Self {
        let dialect = factory(&config);
        Self {
            config,
            dsn,
            factory,
            dialect,
            quoting,
            session: SessionState::default(),
        }
    }

    /// Configuration the driver was resolved from.
    #[must_use]
    pub const fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Native DSN string.
    #[must_use]
    pub fn dsn(&self) -> &str {
        &self.dsn
    }

    /// Active dialect.
    #[must_use]
    pub fn dialect(&self) -> &dyn Dialect {
        self.dialect.as_ref()
    }

    /// Offline string quoting rule, used when compiling without a
    /// connected transport.
    #[must_use]
    pub const fn quoting(&self) -> Quoting {
        self.quoting
    }

    /// Session state.
    #[must_use]
    pub const fn session(&self) -> &SessionState {
        &self.session
    }

    /// Mutable session state.
    pub fn session_mut(&mut self) -> &mut SessionState {
        &mut self.session
    }

    /// Feeds the session check's answer to the dialect and marks the
    /// session as checked.
    pub fn apply_session_check(&mut self, value: &SqlValue) {
        self.dialect.apply_session_check(&mut self.session, value);
        self.session.checked = true;
    }

    /// Records the server version and rebuilds the dialect for it.
    ///
    /// A version already present in the config wins.
    pub fn set_server_version(&mut self, version: &str) {
        if self.config.version.is_some() || version.trim().is_empty() {
            return;
        }
        debug!(dialect = self.dialect.name(), version, "server version detected");
        self.config.version = Some(version.trim().to_string());
        self.dialect = (self.factory)(&self.config);
    }

    /// Escaper bound to this driver's dialect, session and config.
    #[must_use]
    pub fn escaper(&self) -> Escaper<'_> {
        Escaper::new(
            self.dialect.as_ref(),
            self.dialect.escape_char(&self.session),
            self.quoting,
            &self.config.prefix,
            self.config.protect_identifiers,
        )
    }
}
