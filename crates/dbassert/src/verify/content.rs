//! Cell content checks and the single-row helpers around them.
//!
//! Expected values are compared positionally against the selected columns.
//! Rows are taken in whatever order the engine returns them; "row N" without
//! an `ORDER BY` is only stable if the engine's scan order is.

use std::ops::ControlFlow;

use tracing::debug;

use crate::config::VerifyConfig;
use crate::core::{Connection, QueryResult, Row};
use crate::error::{AssertionFailure, DbAssertError, Result};

/// Ordered column list, parsed from comma-separated input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    names: Vec<String>,
}

impl ColumnSpec {
    /// Split `input` on commas and trim each name.
    pub fn parse(input: &str) -> Result<Self> {
        if input.trim().is_empty() {
            return Err(DbAssertError::InvalidArgument(
                "column list must not be empty".into(),
            ));
        }
        Ok(Self {
            names: input.split(',').map(|c| c.trim().to_string()).collect(),
        })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// The select list as it goes into generated SQL.
    pub fn select_list(&self) -> String {
        self.names.join(",")
    }
}

/// Expected values for one row, one per column.
///
/// The NULL sentinel is stored as the empty string, so an expected NULL and
/// an expected empty string are indistinguishable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpectedRow {
    values: Vec<String>,
}

impl ExpectedRow {
    /// Split `input` on `separator`, replacing `null_sentinel` tokens with `""`.
    pub fn parse(input: &str, separator: &str, null_sentinel: &str) -> Self {
        let values = input
            .split(separator)
            .map(|v| {
                if v == null_sentinel {
                    String::new()
                } else {
                    v.to_string()
                }
            })
            .collect();
        Self { values }
    }

    /// Parse with the separator and sentinel from `config`.
    pub fn parse_with(input: &str, config: &VerifyConfig) -> Self {
        Self::parse(input, &config.value_separator, &config.null_sentinel)
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl From<Vec<String>> for ExpectedRow {
    fn from(values: Vec<String>) -> Self {
        Self { values }
    }
}

fn check_shape(columns: &ColumnSpec, expected: &ExpectedRow) -> Result<()> {
    if columns.len() != expected.len() {
        return Err(DbAssertError::InvalidArgument(format!(
            "{} column(s) given but {} expected value(s)",
            columns.len(),
            expected.len()
        )));
    }
    Ok(())
}

/// Compare `row` against `expected`, cell by cell. NULL compares as `""`.
fn compare_row(columns: &ColumnSpec, expected: &ExpectedRow, row: &Row) -> Result<()> {
    if row.len() < columns.len() {
        return Err(DbAssertError::InvalidArgument(format!(
            "query returned {} column(s), {} expected",
            row.len(),
            columns.len()
        )));
    }

    for (idx, (column, want)) in columns.names().iter().zip(expected.values()).enumerate() {
        let found = row.text(idx).unwrap_or("");
        debug!("{} -> {}", column, found);
        if found != want {
            return Err(AssertionFailure::ValueMismatch {
                column: column.clone(),
                expected: want.clone(),
                found: found.to_string(),
            }
            .into());
        }
    }
    Ok(())
}

/// Check the values of the `row_number`-th row (1-based) of `table`.
pub fn check_by_row_number(
    conn: &mut dyn Connection,
    columns: &ColumnSpec,
    expected: &ExpectedRow,
    table: &str,
    row_number: u64,
) -> Result<()> {
    check_shape(columns, expected)?;
    if row_number == 0 {
        return Err(DbAssertError::InvalidArgument(
            "row numbers start at 1".into(),
        ));
    }

    let sql = format!("SELECT {} FROM {}", columns.select_list(), table);
    debug!("Checking row {}: {}", row_number, sql);

    let mut count: u64 = 0;
    conn.query(&sql, &mut |row: &Row| {
        count += 1;
        if count == row_number {
            compare_row(columns, expected, row)?;
            return Ok(ControlFlow::Break(()));
        }
        Ok(ControlFlow::Continue(()))
    })?;

    if count < row_number {
        return Err(AssertionFailure::RowNotFound { sql }.into());
    }
    Ok(())
}

/// Check the values of the single row of `table` matching `predicate`.
///
/// Zero matches or more than one match fail before any value is compared.
pub fn check_by_predicate(
    conn: &mut dyn Connection,
    columns: &ColumnSpec,
    expected: &ExpectedRow,
    table: &str,
    predicate: &str,
) -> Result<()> {
    check_shape(columns, expected)?;

    let sql = format!(
        "SELECT {} FROM {} WHERE {}",
        columns.select_list(),
        table,
        predicate
    );
    debug!("Checking row by predicate: {}", sql);

    let mut matched: Option<Row> = None;
    conn.query(&sql, &mut |row: &Row| {
        if matched.is_some() {
            return Err(AssertionFailure::MoreThanOneRow { sql: sql.clone() }.into());
        }
        matched = Some(row.clone());
        Ok(ControlFlow::Continue(()))
    })?;

    match matched {
        Some(row) => compare_row(columns, expected, &row),
        None => Err(AssertionFailure::NoRowFetched { sql }.into()),
    }
}

/// Read `column` from the single row of `table` matching `predicate`.
/// NULL reads as `""`.
pub fn read_single_value(
    conn: &mut dyn Connection,
    table: &str,
    column: &str,
    predicate: &str,
) -> Result<String> {
    let sql = format!("SELECT {} FROM {} WHERE {}", column, table, predicate);
    debug!("Reading single value: {}", sql);

    let mut value: Option<String> = None;
    conn.query(&sql, &mut |row: &Row| {
        if value.is_some() {
            return Err(AssertionFailure::MoreThanOneValue { sql: sql.clone() }.into());
        }
        value = Some(row.text(0).unwrap_or("").to_string());
        Ok(ControlFlow::Continue(()))
    })?;

    value.ok_or_else(|| AssertionFailure::NoRowFetched { sql: sql.clone() }.into())
}

/// Fails if any row of `table` matches `predicate`.
pub fn assert_row_not_exists(
    conn: &mut dyn Connection,
    table: &str,
    predicate: &str,
) -> Result<()> {
    let sql = format!("SELECT * FROM {} WHERE {}", table, predicate);
    debug!("Checking row absence: {}", sql);

    let mut found = false;
    conn.query(&sql, &mut |_row: &Row| {
        found = true;
        Ok(ControlFlow::Break(()))
    })?;

    if found {
        return Err(AssertionFailure::RowExists {
            table: table.to_string(),
            predicate: predicate.to_string(),
        }
        .into());
    }
    Ok(())
}

/// Delete every row of `table`, returning the number deleted.
pub fn delete_all_rows(conn: &mut dyn Connection, table: &str) -> Result<u64> {
    let sql = format!("DELETE FROM {}", table);
    let deleted = conn.execute(&sql)?;
    debug!("Deleted {} rows from {}", deleted, table);
    Ok(deleted)
}

/// Run arbitrary SQL and collect its rows with column names.
pub fn execute_sql(conn: &mut dyn Connection, sql: &str) -> Result<QueryResult> {
    debug!("Executing: {}", sql);
    conn.query_all(sql)
}
