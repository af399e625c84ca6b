//! String-argument entry points over a connection registry.
//!
//! [`Session`] is what a test-step dispatcher talks to: every operation takes
//! plain strings, parses numeric thresholds itself, and runs against the
//! currently active connection.

pub mod registry;

pub use registry::ConnectionRegistry;

use std::path::Path;

use tracing::info;

use crate::config::{Config, ConnectionConfig, VerifyConfig, DEFAULT_ALIAS};
use crate::core::{Connection, QueryResult};
use crate::error::{DbAssertError, Result};
use crate::golden;
use crate::script::{self, ScriptMode, ScriptReport};
use crate::verify::{self, ColumnSpec, ExpectedRow};

/// Parse a non-negative row count given as text.
pub fn parse_count(value: &str) -> Result<u64> {
    value
        .trim()
        .parse::<u64>()
        .map_err(|source| DbAssertError::InvalidNumber {
            value: value.to_string(),
            source,
        })
}

/// Verification session: a connection registry plus comparison settings.
#[derive(Default)]
pub struct Session {
    registry: ConnectionRegistry,
    verify: VerifyConfig,
}

impl Session {
    /// Empty session with default comparison settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty session with the given comparison settings.
    pub fn with_verify_config(verify: VerifyConfig) -> Self {
        Self {
            registry: ConnectionRegistry::new(),
            verify,
        }
    }

    /// Open every configured connection. The `default` alias, when present,
    /// ends up current.
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut session = Self::with_verify_config(config.verify.clone());
        for (alias, conn) in &config.connections {
            session.registry.connect(alias, conn)?;
        }
        if session.registry.contains(DEFAULT_ALIAS) {
            session.registry.activate(DEFAULT_ALIAS)?;
        }
        info!(
            "Session ready with {} connection(s)",
            config.connections.len()
        );
        Ok(session)
    }

    pub fn verify_config(&self) -> &VerifyConfig {
        &self.verify
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ConnectionRegistry {
        &mut self.registry
    }

    /// Open a connection and make it current.
    pub fn connect(&mut self, alias: &str, config: &ConnectionConfig) -> Result<()> {
        self.registry.connect(alias, config)
    }

    /// Register an already open connection and make it current.
    pub fn register(&mut self, alias: &str, conn: Box<dyn Connection>) {
        self.registry.register(alias, conn)
    }

    pub fn activate(&mut self, alias: &str) -> Result<()> {
        self.registry.activate(alias)
    }

    pub fn disconnect(&mut self, alias: &str) -> Result<()> {
        self.registry.disconnect(alias)
    }

    /// The current connection, or `NoConnection`.
    pub fn connection(&mut self) -> Result<&mut dyn Connection> {
        self.registry.active()
    }

    // Row counts

    /// Fails unless `table` holds exactly `expected` rows.
    pub fn row_count_is_equal_to(&mut self, table: &str, expected: &str) -> Result<()> {
        let expected = parse_count(expected)?;
        verify::assert_row_count(self.connection()?, table, expected)
    }

    /// Fails unless `table` holds more than `threshold` rows.
    pub fn row_count_is_greater_than(&mut self, table: &str, threshold: &str) -> Result<()> {
        let threshold = parse_count(threshold)?;
        verify::assert_more_rows_than(self.connection()?, table, threshold)
    }

    /// Fails unless `table` holds fewer than `threshold` rows.
    pub fn row_count_is_less_than(&mut self, table: &str, threshold: &str) -> Result<()> {
        let threshold = parse_count(threshold)?;
        verify::assert_fewer_rows_than(self.connection()?, table, threshold)
    }

    /// Fails unless exactly `expected` rows of `table` match `predicate`.
    pub fn row_count_matching_is_equal_to(
        &mut self,
        table: &str,
        predicate: &str,
        expected: &str,
    ) -> Result<()> {
        let expected = parse_count(expected)?;
        verify::assert_predicate_row_count(self.connection()?, table, Some(predicate), expected)
    }

    pub fn tables_have_same_row_count(&mut self, first: &str, second: &str) -> Result<()> {
        verify::assert_same_row_count(self.connection()?, first, second)
    }

    pub fn table_must_be_empty(&mut self, table: &str) -> Result<()> {
        verify::assert_table_empty(self.connection()?, table)
    }

    pub fn delete_all_rows(&mut self, table: &str) -> Result<u64> {
        verify::delete_all_rows(self.connection()?, table)
    }

    // Metadata

    pub fn table_must_exist(&mut self, table: &str) -> Result<()> {
        verify::assert_table_exists(self.connection()?, table)
    }

    /// Primary-key columns of `table`, comma-joined.
    pub fn primary_key_columns(&mut self, table: &str) -> Result<String> {
        verify::primary_key_column_list(self.connection()?, table)
    }

    pub fn check_primary_key_columns(&mut self, table: &str, expected: &str) -> Result<()> {
        verify::assert_primary_key_columns(self.connection()?, table, expected)
    }

    /// Current isolation level name, `""` when unknown.
    pub fn transaction_isolation_level(&mut self) -> Result<String> {
        verify::transaction_isolation_name(self.connection()?)
    }

    pub fn transaction_isolation_level_must_be(&mut self, expected: &str) -> Result<()> {
        verify::assert_transaction_isolation(self.connection()?, expected)
    }

    // Content

    /// Compare the pipe-separated `values` with `columns` of the
    /// `row_number`-th row of `table`.
    pub fn check_content_by_row_number(
        &mut self,
        columns: &str,
        values: &str,
        table: &str,
        row_number: &str,
    ) -> Result<()> {
        let row_number = parse_count(row_number)?;
        let columns = ColumnSpec::parse(columns)?;
        let expected = ExpectedRow::parse_with(values, &self.verify);
        verify::check_by_row_number(self.connection()?, &columns, &expected, table, row_number)
    }

    /// Compare the pipe-separated `values` with `columns` of the single row
    /// of `table` matching `predicate`.
    pub fn check_content_by_predicate(
        &mut self,
        columns: &str,
        values: &str,
        table: &str,
        predicate: &str,
    ) -> Result<()> {
        let columns = ColumnSpec::parse(columns)?;
        let expected = ExpectedRow::parse_with(values, &self.verify);
        verify::check_by_predicate(self.connection()?, &columns, &expected, table, predicate)
    }

    pub fn read_single_value(
        &mut self,
        table: &str,
        column: &str,
        predicate: &str,
    ) -> Result<String> {
        verify::read_single_value(self.connection()?, table, column, predicate)
    }

    pub fn row_must_not_exist(&mut self, table: &str, predicate: &str) -> Result<()> {
        verify::assert_row_not_exists(self.connection()?, table, predicate)
    }

    pub fn execute_sql(&mut self, sql: &str) -> Result<QueryResult> {
        verify::execute_sql(self.connection()?, sql)
    }

    // Scripts

    pub fn execute_script(&mut self, text: &str, mode: ScriptMode) -> Result<ScriptReport> {
        script::execute_script_text(self.connection()?, text, mode)
    }

    /// Run a script file, rolling back on the first error.
    pub fn execute_sql_from_file(&mut self, path: impl AsRef<Path>) -> Result<ScriptReport> {
        script::execute_script_file(self.connection()?, path, ScriptMode::FailFast)
    }

    /// Run a script file, logging errors and continuing.
    pub fn execute_sql_from_file_ignore_errors(
        &mut self,
        path: impl AsRef<Path>,
    ) -> Result<ScriptReport> {
        script::execute_script_file(self.connection()?, path, ScriptMode::BestEffort)
    }

    // Golden files

    pub fn store_query_result_to_file(&mut self, sql: &str, path: impl AsRef<Path>) -> Result<u64> {
        golden::store_query_result_to_file(self.connection()?, sql, path)
    }

    pub fn compare_query_result_to_file(
        &mut self,
        sql: &str,
        path: impl AsRef<Path>,
    ) -> Result<()> {
        let max_diffs = self.verify.max_file_diffs;
        golden::compare_query_result_to_file(self.connection()?, sql, path, max_diffs)
    }
}
