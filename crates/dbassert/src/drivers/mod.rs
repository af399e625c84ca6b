//! Database driver implementations.
//!
//! This module provides backend-specific implementations of
//! [`Connection`](crate::core::Connection):
//!
//! - [`sqlite`]: SQLite via `rusqlite` (feature `sqlite`)
//! - [`postgres`]: PostgreSQL via the synchronous `postgres` client (feature `postgres`)
//!
//! # Adding New Databases
//!
//! 1. Create a new module under `drivers/`
//! 2. Implement `Connection` for its handle type
//! 3. Add a variant to [`Driver`] and an arm to [`open`]
//! 4. Gate the driver with a feature flag in `Cargo.toml`

#[cfg(feature = "postgres")]
pub mod postgres;
#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "postgres")]
pub use self::postgres::PostgresConnection;
#[cfg(feature = "sqlite")]
pub use self::sqlite::SqliteConnection;

use std::fmt;
use std::str::FromStr;

use tracing::info;

use crate::config::ConnectionConfig;
use crate::core::Connection;
use crate::error::{DbAssertError, Result};

/// Supported backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Driver {
    Sqlite,
    Postgres,
}

impl Driver {
    /// Identifier used in configuration files.
    pub fn name(&self) -> &'static str {
        match self {
            Driver::Sqlite => "sqlite",
            Driver::Postgres => "postgres",
        }
    }

    /// Whether support for this backend was compiled in.
    pub fn is_enabled(&self) -> bool {
        match self {
            Driver::Sqlite => cfg!(feature = "sqlite"),
            Driver::Postgres => cfg!(feature = "postgres"),
        }
    }
}

impl fmt::Display for Driver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Driver {
    type Err = DbAssertError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "sqlite" | "sqlite3" => Ok(Driver::Sqlite),
            "postgres" | "postgresql" | "pg" => Ok(Driver::Postgres),
            other => Err(DbAssertError::Config(format!(
                "Unknown driver '{}'. Valid values: sqlite, postgres",
                other
            ))),
        }
    }
}

/// Open a connection described by `config`.
pub fn open(config: &ConnectionConfig) -> Result<Box<dyn Connection>> {
    let driver: Driver = config.driver.parse()?;
    info!("Opening {} connection", driver);

    match driver {
        #[cfg(feature = "sqlite")]
        Driver::Sqlite => Ok(Box::new(SqliteConnection::open(&config.url)?)),
        #[cfg(feature = "postgres")]
        Driver::Postgres => Ok(Box::new(PostgresConnection::connect(
            &config.url,
            config.user.as_deref(),
            config.password.as_deref(),
        )?)),
        #[allow(unreachable_patterns)]
        other => Err(DbAssertError::Config(format!(
            "Driver '{}' is not enabled in this build",
            other
        ))),
    }
}
