//! Configuration loading and validation.

mod types;
mod validation;

pub use types::*;

use crate::error::Result;
use std::path::Path;

impl Config {
    /// Load configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        validation::validate(self)
    }

    /// Configuration for `alias`, if present.
    pub fn connection(&self, alias: &str) -> Option<&ConnectionConfig> {
        self.connections.get(alias)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_yaml_applies_defaults() {
        let yaml = r#"
connections:
  default:
    url: ":memory:"
"#;
        let config = Config::from_yaml(yaml).unwrap();
        let conn = config.connection(DEFAULT_ALIAS).unwrap();
        assert_eq!(conn.driver, "sqlite");
        assert_eq!(config.verify.null_sentinel, "(NULL)");
        assert_eq!(config.verify.value_separator, "|");
        assert_eq!(config.verify.max_file_diffs, 10);
        assert_eq!(config.logging.verbosity, "info");
    }

    #[test]
    fn test_from_yaml_overrides() {
        let yaml = r#"
connections:
  reporting:
    driver: postgres
    url: "host=localhost dbname=reports"
    user: tester
    password: secret
verify:
  null_sentinel: "<null>"
  max_file_diffs: 3
logging:
  format: json
"#;
        let config = Config::from_yaml(yaml).unwrap();
        let conn = config.connection("reporting").unwrap();
        assert_eq!(conn.driver, "postgres");
        assert_eq!(conn.user.as_deref(), Some("tester"));
        assert_eq!(config.verify.null_sentinel, "<null>");
        assert_eq!(config.verify.max_file_diffs, 3);
        assert_eq!(config.logging.format, "json");
    }

    #[test]
    fn test_from_yaml_rejects_invalid() {
        let yaml = r#"
verify:
  max_file_diffs: 0
"#;
        assert!(Config::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let err = Config::load("/nonexistent/dbassert.yaml").unwrap_err();
        assert!(matches!(err, crate::error::DbAssertError::Io(_)));
    }
}
