//! Configuration validation.

use super::Config;
use crate::drivers::Driver;
use crate::error::{DbAssertError, Result};

/// Validate the configuration.
pub fn validate(config: &Config) -> Result<()> {
    for (alias, conn) in &config.connections {
        if alias.trim().is_empty() {
            return Err(DbAssertError::Config(
                "connection aliases must not be empty".into(),
            ));
        }
        let driver: Driver = conn.driver.parse().map_err(|_| {
            DbAssertError::Config(format!(
                "connections.{}.driver must be 'sqlite' or 'postgres', got '{}'",
                alias, conn.driver
            ))
        })?;
        if !driver.is_enabled() {
            return Err(DbAssertError::Config(format!(
                "connections.{}.driver '{}' is not enabled in this build",
                alias, driver
            )));
        }
        if conn.url.is_empty() {
            return Err(DbAssertError::Config(format!(
                "connections.{}.url is required",
                alias
            )));
        }
    }

    if config.verify.null_sentinel.is_empty() {
        return Err(DbAssertError::Config(
            "verify.null_sentinel must not be empty".into(),
        ));
    }
    if config.verify.value_separator.is_empty() {
        return Err(DbAssertError::Config(
            "verify.value_separator must not be empty".into(),
        ));
    }
    if config.verify.max_file_diffs == 0 {
        return Err(DbAssertError::Config(
            "verify.max_file_diffs must be at least 1".into(),
        ));
    }

    match config.logging.format.as_str() {
        "text" | "json" => {}
        other => {
            return Err(DbAssertError::Config(format!(
                "logging.format must be 'text' or 'json', got '{}'",
                other
            )))
        }
    }

    Ok(())
}
