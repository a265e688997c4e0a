//! Compiled-in driver table.
//!
//! Each record names a `{driver}` or `{driver}/{sub_driver}` key and the
//! slots that key provides. A sub-driver record only fills the slots it
//! changes; the rest come from its primary driver's record.

use tracing::info;

use crate::config::ConnectionConfig;
use crate::dialect::{
    CubridDialect, Db2Dialect, Dialect, FirebirdDialect, FourDDialect, GenericDialect,
    MysqlDialect, OracleDialect, PostgresDialect, SqliteDialect, SqlsrvDialect,
};
use crate::driver::Driver;
use crate::error::{DbError, Result};
use crate::escape::Quoting;

/// Builds a dialect for a resolved config.
pub type DialectFactory = fn(&ConnectionConfig) -> Box<dyn Dialect>;

/// Computes the native DSN string for a resolved config.
pub type DsnBuilder = fn(&ConnectionConfig) -> String;

/// One row of the driver table.
#[derive(Debug, Clone, Copy)]
pub struct DriverRecord {
    /// Primary driver name.
    pub driver: &'static str,
    /// Sub-driver name, for records layered over a primary driver.
    pub sub_driver: Option<&'static str>,
    /// Dialect factory.
    pub dialect: Option<DialectFactory>,
    /// Native DSN builder.
    pub dsn: Option<DsnBuilder>,
    /// String quoting rule of the native client.
    pub quoting: Option<Quoting>,
}

impl DriverRecord {
    /// A primary driver record.
    #[must_use]
    pub const fn primary(
        driver: &'static str,
        dialect: DialectFactory,
        dsn: DsnBuilder,
        quoting: Quoting,
    ) -> Self {
        Self {
            driver,
            sub_driver: None,
            dialect: Some(dialect),
            dsn: Some(dsn),
            quoting: Some(quoting),
        }
    }

    /// A sub-driver record; unset slots fall back to the primary record.
    #[must_use]
    pub const fn sub(driver: &'static str, sub_driver: &'static str) -> Self {
        Self {
            driver,
            sub_driver: Some(sub_driver),
            dialect: None,
            dsn: None,
            quoting: None,
        }
    }

    /// Sets the dialect factory.
    #[must_use]
    pub const fn with_dialect(mut self, dialect: DialectFactory) -> Self {
        self.dialect = Some(dialect);
        self
    }

    /// Sets the DSN builder.
    #[must_use]
    pub const fn with_dsn(mut self, dsn: DsnBuilder) -> Self {
        self.dsn = Some(dsn);
        self
    }

    /// Sets the quoting rule.
    #[must_use]
    pub const fn with_quoting(mut self, quoting: Quoting) -> Self {
        self.quoting = Some(quoting);
        self
    }

    /// `driver` or `driver/sub_driver`.
    #[must_use]
    pub fn key(&self) -> String {
        match self.sub_driver {
            Some(sub) => format!("{}/{sub}", self.driver),
            None => self.driver.to_string(),
        }
    }

    fn matches(&self, driver: &str, sub_driver: Option<&str>) -> bool {
        self.driver == driver && self.sub_driver == sub_driver
    }
}

fn mysql(config: &ConnectionConfig) -> Box<dyn Dialect> {
    Box::new(MysqlDialect::new(config))
}

fn postgres(config: &ConnectionConfig) -> Box<dyn Dialect> {
    Box::new(PostgresDialect::new(config))
}

fn sqlite(config: &ConnectionConfig) -> Box<dyn Dialect> {
    Box::new(SqliteDialect::new(config))
}

fn sqlsrv(config: &ConnectionConfig) -> Box<dyn Dialect> {
    Box::new(SqlsrvDialect::new(config))
}

fn oracle(config: &ConnectionConfig) -> Box<dyn Dialect> {
    Box::new(OracleDialect::new(config))
}

fn firebird(config: &ConnectionConfig) -> Box<dyn Dialect> {
    Box::new(FirebirdDialect::new(config))
}

fn db2(config: &ConnectionConfig) -> Box<dyn Dialect> {
    Box::new(Db2Dialect::new(config))
}

fn fourd(config: &ConnectionConfig) -> Box<dyn Dialect> {
    Box::new(FourDDialect::new(config))
}

fn cubrid(config: &ConnectionConfig) -> Box<dyn Dialect> {
    Box::new(CubridDialect::new(config))
}

fn generic(config: &ConnectionConfig) -> Box<dyn Dialect> {
    Box::new(GenericDialect::new(config))
}

/// Every driver shipped with the crate.
const BUILTIN: &[DriverRecord] = &[
    DriverRecord::primary("mysqli", mysql, MysqlDialect::native_dsn, Quoting::Backslash),
    DriverRecord::primary("mysql", mysql, MysqlDialect::native_dsn, Quoting::Backslash),
    DriverRecord::primary("postgre", postgres, PostgresDialect::native_dsn, Quoting::Doubling),
    DriverRecord::primary("postgres", postgres, PostgresDialect::native_dsn, Quoting::Doubling),
    DriverRecord::primary("sqlite3", sqlite, SqliteDialect::native_dsn, Quoting::Doubling),
    DriverRecord::primary("sqlsrv", sqlsrv, SqlsrvDialect::native_dsn, Quoting::Doubling),
    DriverRecord::primary("oci8", oracle, OracleDialect::native_dsn, Quoting::Doubling),
    DriverRecord::primary("ibase", firebird, FirebirdDialect::native_dsn, Quoting::Doubling),
    DriverRecord::primary("cubrid", cubrid, CubridDialect::native_dsn, Quoting::Doubling),
    DriverRecord::primary("odbc", generic, GenericDialect::odbc_dsn, Quoting::Unavailable),
    DriverRecord::sub("odbc", "ibm")
        .with_dialect(db2)
        .with_dsn(Db2Dialect::native_dsn),
    DriverRecord::primary("pdo", generic, GenericDialect::pdo_dsn, Quoting::Doubling),
    DriverRecord::sub("pdo", "mysql")
        .with_dialect(mysql)
        .with_dsn(MysqlDialect::pdo_dsn)
        .with_quoting(Quoting::Backslash),
    DriverRecord::sub("pdo", "pgsql")
        .with_dialect(postgres)
        .with_dsn(PostgresDialect::pdo_dsn),
    DriverRecord::sub("pdo", "sqlite")
        .with_dialect(sqlite)
        .with_dsn(SqliteDialect::pdo_dsn),
    DriverRecord::sub("pdo", "sqlsrv")
        .with_dialect(sqlsrv)
        .with_dsn(SqlsrvDialect::pdo_dsn),
    DriverRecord::sub("pdo", "dblib")
        .with_dialect(sqlsrv)
        .with_dsn(SqlsrvDialect::dblib_dsn),
    DriverRecord::sub("pdo", "oci")
        .with_dialect(oracle)
        .with_dsn(OracleDialect::pdo_dsn),
    DriverRecord::sub("pdo", "firebird")
        .with_dialect(firebird)
        .with_dsn(FirebirdDialect::pdo_dsn),
    DriverRecord::sub("pdo", "ibm")
        .with_dialect(db2)
        .with_dsn(Db2Dialect::pdo_dsn),
    DriverRecord::sub("pdo", "4d")
        .with_dialect(fourd)
        .with_dsn(FourDDialect::pdo_dsn),
    DriverRecord::sub("pdo", "cubrid")
        .with_dialect(cubrid)
        .with_dsn(CubridDialect::pdo_dsn),
    DriverRecord::sub("pdo", "odbc")
        .with_dsn(GenericDialect::pdo_odbc_dsn)
        .with_quoting(Quoting::Unavailable),
];

/// Driver table used to resolve configs into [`Driver`] handles.
#[derive(Debug, Clone)]
pub struct Registry {
    records: Vec<DriverRecord>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Registry {
    /// An empty registry.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    /// The registry of every built-in driver.
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            records: BUILTIN.to_vec(),
        }
    }

    /// Adds a record, replacing any record with the same key.
    pub fn register(&mut self, record: DriverRecord) -> &mut Self {
        self.records
            .retain(|r| !r.matches(record.driver, record.sub_driver));
        self.records.push(record);
        self
    }

    /// Registered keys, in registration order.
    #[must_use]
    pub fn drivers(&self) -> Vec<String> {
        self.records.iter().map(DriverRecord::key).collect()
    }

    fn find(&self, driver: &str, sub_driver: Option<&str>) -> Option<&DriverRecord> {
        self.records.iter().find(|r| r.matches(driver, sub_driver))
    }

    /// Resolves `config` into a driver handle.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Config`] for an unknown driver or sub-driver, or
    /// when neither the config nor the driver provides a DSN.
    pub fn resolve(&self, config: &ConnectionConfig) -> Result<Driver> {
        if config.driver.is_empty() {
            return Err(DbError::config("no driver selected"));
        }
        let primary = self
            .find(&config.driver, None)
            .ok_or_else(|| DbError::config(format!("unsupported driver: {}", config.driver)))?;
        let record = match config.sub_driver.as_deref() {
            Some(sub) => self.find(&config.driver, Some(sub)).ok_or_else(|| {
                DbError::config(format!("unsupported sub-driver: {}", config.driver_key()))
            })?,
            None => primary,
        };

        let dialect = record.dialect.or(primary.dialect).ok_or_else(|| {
            DbError::config(format!("no dialect registered for {}", config.driver_key()))
        })?;
        let quoting = record
            .quoting
            .or(primary.quoting)
            .unwrap_or(Quoting::Doubling);
        let dsn = match &config.dsn {
            Some(dsn) => dsn.clone(),
            None => record
                .dsn
                .or(primary.dsn)
                .map(|build| build(config))
                .unwrap_or_default(),
        };
        if dsn.is_empty() {
            return Err(DbError::config(format!(
                "no DSN could be built for {}",
                config.driver_key()
            )));
        }

        let driver = Driver::new(config.clone(), dsn, dialect, quoting);
        info!(
            driver = %config.driver_key(),
            dialect = driver.dialect().name(),
            "driver resolved"
        );
        Ok(driver)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(url: &str) -> ConnectionConfig {
        ConnectionConfig::from_url(url).unwrap()
    }

    #[test]
    fn test_resolve_pdo_mysql() {
        let registry = Registry::builtin();
        let driver = registry
            .resolve(&config("pdo/mysql://root:secret@db:3306/app?charset=utf8"))
            .unwrap();
        assert_eq!(driver.dialect().name(), "mysql");
        assert_eq!(driver.dsn(), "mysql:host=db;port=3306;dbname=app;charset=utf8");
        assert_eq!(driver.quoting(), Quoting::Backslash);
    }

    #[test]
    fn test_sub_driver_falls_back_to_primary_slots() {
        let registry = Registry::builtin();
        let mut odbc_db2 = ConnectionConfig::new("odbc/ibm");
        odbc_db2.database = String::from("SAMPLE");
        let driver = registry.resolve(&odbc_db2).unwrap();
        assert_eq!(driver.dialect().name(), "ibm");
        assert_eq!(driver.quoting(), Quoting::Unavailable);

        let mut pdo_odbc = ConnectionConfig::new("pdo/odbc");
        pdo_odbc.database = String::from("warehouse");
        let driver = registry.resolve(&pdo_odbc).unwrap();
        assert_eq!(driver.dialect().name(), "pdo");
        assert_eq!(driver.dsn(), "odbc:DSN=warehouse");
    }

    #[test]
    fn test_config_dsn_overrides_computed() {
        let registry = Registry::builtin();
        let mut config = ConnectionConfig::new("pdo");
        config.dsn = Some(String::from("pgsql:host=elsewhere"));
        config.sub_driver = Some(String::from("pgsql"));
        let driver = registry.resolve(&config).unwrap();
        assert_eq!(driver.dsn(), "pgsql:host=elsewhere");
        assert_eq!(driver.dialect().name(), "postgre");
    }

    #[test]
    fn test_unknown_drivers() {
        let registry = Registry::builtin();
        let err = registry.resolve(&ConnectionConfig::new("nosql")).unwrap_err();
        assert!(err.to_string().contains("unsupported driver"));
        let err = registry.resolve(&ConnectionConfig::new("pdo/nosql")).unwrap_err();
        assert!(err.to_string().contains("unsupported sub-driver"));
        let err = registry.resolve(&ConnectionConfig::new("pdo")).unwrap_err();
        assert!(err.to_string().contains("no DSN"));
    }

    #[test]
    fn test_register_replaces_record() {
        let mut registry = Registry::new();
        registry.register(DriverRecord::primary("mysqli", mysql, MysqlDialect::native_dsn, Quoting::Backslash));
        registry.register(DriverRecord::primary("mysqli", sqlite, SqliteDialect::native_dsn, Quoting::Doubling));
        assert_eq!(registry.drivers(), vec!["mysqli"]);
        let driver = registry.resolve(&ConnectionConfig::new("mysqli")).unwrap();
        assert_eq!(driver.dialect().name(), "sqlite3");
    }

    #[test]
    fn test_builtin_lists_sub_drivers() {
        let drivers = Registry::builtin().drivers();
        for key in ["mysqli", "postgre", "sqlite3", "pdo/dblib", "pdo/4d", "odbc/ibm"] {
            assert!(drivers.iter().any(|d| d == key), "{key}");
        }
    }
}
