//! Alias-keyed connection registry.

use std::collections::HashMap;

use tracing::{debug, info};

use crate::config::{ConnectionConfig, DEFAULT_ALIAS};
use crate::core::Connection;
use crate::drivers;
use crate::error::{DbAssertError, Result};

/// Open connections by alias, with one of them current.
///
/// Connecting makes the new alias current. Disconnecting the current alias
/// leaves no current connection until another one is activated.
#[derive(Default)]
pub struct ConnectionRegistry {
    connections: HashMap<String, Box<dyn Connection>>,
    current: Option<String>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a connection from `config` and register it under `alias`.
    pub fn connect(&mut self, alias: &str, config: &ConnectionConfig) -> Result<()> {
        let conn = drivers::open(config)?;
        self.register(alias, conn);
        Ok(())
    }

    /// Register an already open connection under `alias` and make it current.
    /// A connection previously registered under the same alias is dropped.
    pub fn register(&mut self, alias: &str, conn: Box<dyn Connection>) {
        info!("Registered {} connection as '{}'", conn.backend(), alias);
        if self.connections.insert(alias.to_string(), conn).is_some() {
            debug!("Replaced existing connection '{}'", alias);
        }
        self.current = Some(alias.to_string());
    }

    /// Make `alias` the current connection.
    pub fn activate(&mut self, alias: &str) -> Result<()> {
        if !self.connections.contains_key(alias) {
            return Err(DbAssertError::NoConnection(alias.to_string()));
        }
        self.current = Some(alias.to_string());
        Ok(())
    }

    /// Close and remove `alias`.
    pub fn disconnect(&mut self, alias: &str) -> Result<()> {
        if self.connections.remove(alias).is_none() {
            return Err(DbAssertError::NoConnection(alias.to_string()));
        }
        if self.current.as_deref() == Some(alias) {
            self.current = None;
        }
        info!("Disconnected '{}'", alias);
        Ok(())
    }

    /// Close every connection.
    pub fn disconnect_all(&mut self) {
        self.connections.clear();
        self.current = None;
    }

    /// Alias of the current connection.
    pub fn current_alias(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Whether `alias` is registered.
    pub fn contains(&self, alias: &str) -> bool {
        self.connections.contains_key(alias)
    }

    /// Registered aliases, sorted.
    pub fn aliases(&self) -> Vec<&str> {
        let mut aliases: Vec<&str> = self.connections.keys().map(String::as_str).collect();
        aliases.sort_unstable();
        aliases
    }

    /// The current connection.
    pub fn active(&mut self) -> Result<&mut dyn Connection> {
        let Some(alias) = self.current.as_deref() else {
            return Err(DbAssertError::NoConnection(DEFAULT_ALIAS.to_string()));
        };
        match self.connections.get_mut(alias) {
            Some(conn) => Ok(conn.as_mut()),
            None => Err(DbAssertError::NoConnection(alias.to_string())),
        }
    }
}

#[cfg(all(test, feature = "sqlite"))]
mod tests {
    use super::*;

    fn memory() -> ConnectionConfig {
        ConnectionConfig {
            driver: "sqlite".to_string(),
            url: ":memory:".to_string(),
            user: None,
            password: None,
        }
    }

    #[test]
    fn test_active_without_connection() {
        let mut registry = ConnectionRegistry::new();
        let err = registry.active().err().unwrap();
        assert!(matches!(err, DbAssertError::NoConnection(ref a) if a == DEFAULT_ALIAS));
    }

    #[test]
    fn test_connect_activate_disconnect() {
        let mut registry = ConnectionRegistry::new();
        registry.connect("first", &memory()).unwrap();
        registry.connect("second", &memory()).unwrap();
        assert_eq!(registry.current_alias(), Some("second"));
        assert_eq!(registry.aliases(), vec!["first", "second"]);

        registry
            .active()
            .unwrap()
            .execute("CREATE TABLE only_in_second (x INTEGER)")
            .unwrap();

        registry.activate("first").unwrap();
        assert!(!registry.active().unwrap().table_exists("only_in_second").unwrap());

        registry.disconnect("first").unwrap();
        assert_eq!(registry.current_alias(), None);
        assert!(registry.active().is_err());

        assert!(registry.activate("first").is_err());
        registry.activate("second").unwrap();
        assert!(registry.active().unwrap().table_exists("only_in_second").unwrap());
    }

    #[test]
    fn test_disconnect_unknown_alias() {
        let mut registry = ConnectionRegistry::new();
        assert!(matches!(
            registry.disconnect("ghost"),
            Err(DbAssertError::NoConnection(_))
        ));
    }
}
