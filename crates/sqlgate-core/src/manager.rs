//! Named connections owned by the caller.

use std::collections::BTreeMap;

use tracing::debug;

use crate::config::ConnectionConfig;
use crate::connection::{Connection, Transport};
use crate::error::{DbError, Result};
use crate::registry::Registry;

/// Name used when none is given.
pub const DEFAULT_CONNECTION: &str = "default";

/// A map from connection name to open connection.
#[derive(Debug)]
pub struct ConnectionManager<T: Transport> {
    registry: Registry,
    connections: BTreeMap<String, Connection<T>>,
}

impl<T: Transport> Default for ConnectionManager<T> {
    fn default() -> Self {
        Self::new(Registry::builtin())
    }
}

impl<T: Transport> ConnectionManager<T> {
    /// Creates an empty manager resolving drivers through `registry`.
    #[must_use]
    pub const fn new(registry: Registry) -> Self {
        Self {
            registry,
            connections: BTreeMap::new(),
        }
    }

    /// The registry used by [`ConnectionManager::open`].
    #[must_use]
    pub const fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Resolves `config`, connects `transport` and stores the connection
    /// under `name` (default `"default"`), closing any connection it
    /// replaces.
    ///
    /// # Errors
    ///
    /// Resolution and connect errors; nothing is stored on failure.
    pub fn open(&mut self, name: Option<&str>, config: &ConnectionConfig, transport: T) -> Result<&mut Connection<T>> {
        let name = name.unwrap_or(DEFAULT_CONNECTION).to_string();
        let connection = Connection::open(&self.registry, config, transport)?;
        debug!(name, driver = %config.driver_key(), "connection opened");
        if let Some(mut previous) = self.connections.insert(name.clone(), connection) {
            previous.close();
        }
        self.get_mut(Some(&name))
    }

    /// Stores an already built connection under `name`.
    pub fn insert(&mut self, name: Option<&str>, connection: Connection<T>) -> Option<Connection<T>> {
        let name = name.unwrap_or(DEFAULT_CONNECTION).to_string();
        self.connections.insert(name, connection)
    }

    /// The connection named `name`.
    #[must_use]
    pub fn get(&self, name: Option<&str>) -> Option<&Connection<T>> {
        self.connections.get(name.unwrap_or(DEFAULT_CONNECTION))
    }

    /// The connection named `name`, mutably.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Config`] for an unknown name.
    pub fn get_mut(&mut self, name: Option<&str>) -> Result<&mut Connection<T>> {
        let name = name.unwrap_or(DEFAULT_CONNECTION);
        self.connections
            .get_mut(name)
            .ok_or_else(|| DbError::config(format!("no connection named {name}")))
    }

    /// Names of the stored connections.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.connections.keys().map(String::as_str)
    }

    /// Closes and removes the connection named `name`.
    pub fn close(&mut self, name: Option<&str>) -> bool {
        match self.connections.remove(name.unwrap_or(DEFAULT_CONNECTION)) {
            Some(mut connection) => {
                connection.close();
                true
            }
            None => false,
        }
    }

    /// Closes every connection.
    pub fn close_all(&mut self) {
        for (name, mut connection) in std::mem::take(&mut self.connections) {
            debug!(name, "closing connection");
            connection.close();
        }
    }
}
