//! Configuration type definitions.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Alias used when a caller does not name a connection.
pub const DEFAULT_ALIAS: &str = "default";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Connections opened by `Session::from_config`, keyed by alias.
    #[serde(default)]
    pub connections: BTreeMap<String, ConnectionConfig>,

    /// Comparison behavior.
    #[serde(default)]
    pub verify: VerifyConfig,

    /// Log output settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// A single database connection.
#[derive(Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Backend: "sqlite" or "postgres" (default: "sqlite").
    #[serde(default = "default_sqlite")]
    pub driver: String,

    /// SQLite file path (`:memory:` for a private in-memory database) or a
    /// PostgreSQL connection string.
    pub url: String,

    /// Username, overriding the one in `url`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    /// Password, overriding the one in `url`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("driver", &self.driver)
            .field("url", &self.url)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Comparison behavior shared by the content and file checks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyConfig {
    /// Expected-value token meaning "SQL NULL" (default: "(NULL)").
    #[serde(default = "default_null_sentinel")]
    pub null_sentinel: String,

    /// Separator between expected values (default: "|").
    #[serde(default = "default_value_separator")]
    pub value_separator: String,

    /// Maximum differences reported by a golden-file comparison (default: 10).
    #[serde(default = "default_max_file_diffs")]
    pub max_file_diffs: usize,
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            null_sentinel: default_null_sentinel(),
            value_separator: default_value_separator(),
            max_file_diffs: default_max_file_diffs(),
        }
    }
}

/// Log output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// debug, info, warn, error (default: info).
    #[serde(default = "default_verbosity")]
    pub verbosity: String,

    /// text or json (default: text).
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            verbosity: default_verbosity(),
            format: default_log_format(),
        }
    }
}

fn default_sqlite() -> String {
    "sqlite".to_string()
}

fn default_null_sentinel() -> String {
    "(NULL)".to_string()
}

fn default_value_separator() -> String {
    "|".to_string()
}

fn default_max_file_diffs() -> usize {
    10
}

fn default_verbosity() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}
