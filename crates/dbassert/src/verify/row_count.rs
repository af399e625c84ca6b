//! Row counting and the row-count assertions built on it.
//!
//! Counting first tries `SELECT COUNT(*)`. Engines that reject the aggregate
//! (or return something that is not a number) fall back to scanning
//! `SELECT *` and counting rows, stopping once the count reaches `limit`.
//! Only the fallback is bounded, so a capped count is always `<= limit` and
//! callers pick a limit that still decides their comparison.

use std::ops::ControlFlow;

use tracing::{debug, warn};

use crate::core::{Connection, Row};
use crate::error::{AssertionFailure, DbAssertError, Result};

fn with_predicate(base: String, predicate: Option<&str>) -> String {
    match predicate {
        Some(p) => format!("{} WHERE {}", base, p),
        None => base,
    }
}

/// Count rows of `table`, optionally restricted by `predicate`.
///
/// `limit` bounds the fallback scan; `None` scans to the end.
pub fn count_rows(
    conn: &mut dyn Connection,
    table: &str,
    predicate: Option<&str>,
    limit: Option<u64>,
) -> Result<u64> {
    let count_sql = with_predicate(format!("SELECT COUNT(*) FROM {}", table), predicate);
    debug!("Counting rows: {}", count_sql);

    match aggregate_count(conn, &count_sql) {
        Ok(count) => Ok(count),
        Err(err) if err.is_assertion() => Err(err),
        Err(err) => {
            warn!(
                "COUNT(*) failed for {}, falling back to row scan: {}",
                table, err
            );
            let scan_sql = with_predicate(format!("SELECT * FROM {}", table), predicate);
            scan_count(conn, &scan_sql, limit)
        }
    }
}

fn aggregate_count(conn: &mut dyn Connection, sql: &str) -> Result<u64> {
    let mut value: Option<String> = None;
    conn.query(sql, &mut |row: &Row| {
        value = row.text(0).map(str::to_string);
        Ok(ControlFlow::Break(()))
    })?;

    let text = value.unwrap_or_default();
    text.trim()
        .parse::<u64>()
        .map_err(|e| DbAssertError::database(sql, format!("non-numeric count '{}': {}", text, e)))
}

fn scan_count(conn: &mut dyn Connection, sql: &str, limit: Option<u64>) -> Result<u64> {
    debug!("Scanning rows: {} (limit {:?})", sql, limit);
    let mut count: u64 = 0;
    conn.query(sql, &mut |_row: &Row| {
        if limit.is_some_and(|l| count >= l) {
            return Ok(ControlFlow::Break(()));
        }
        count += 1;
        if limit.is_some_and(|l| count >= l) {
            Ok(ControlFlow::Break(()))
        } else {
            Ok(ControlFlow::Continue(()))
        }
    })?;
    Ok(count)
}

/// Fails unless `table` holds exactly `expected` rows.
pub fn assert_row_count(conn: &mut dyn Connection, table: &str, expected: u64) -> Result<()> {
    assert_predicate_row_count(conn, table, None, expected)
}

/// Fails unless the rows of `table` matching `predicate` number exactly `expected`.
pub fn assert_predicate_row_count(
    conn: &mut dyn Connection,
    table: &str,
    predicate: Option<&str>,
    expected: u64,
) -> Result<()> {
    let fetched = count_rows(conn, table, predicate, Some(expected.saturating_add(1)))?;
    if fetched != expected {
        return Err(AssertionFailure::RowCount { expected, fetched }.into());
    }
    Ok(())
}

/// Fails unless `table` holds more than `threshold` rows.
pub fn assert_more_rows_than(conn: &mut dyn Connection, table: &str, threshold: u64) -> Result<()> {
    let fetched = count_rows(conn, table, None, Some(threshold.saturating_add(1)))?;
    if fetched <= threshold {
        return Err(AssertionFailure::TooFewRows { threshold, fetched }.into());
    }
    Ok(())
}

/// Fails unless `table` holds fewer than `threshold` rows.
pub fn assert_fewer_rows_than(
    conn: &mut dyn Connection,
    table: &str,
    threshold: u64,
) -> Result<()> {
    let fetched = count_rows(conn, table, None, Some(threshold))?;
    if fetched >= threshold {
        return Err(AssertionFailure::TooManyRows { threshold, fetched }.into());
    }
    Ok(())
}

/// Fails unless both tables hold the same number of rows.
pub fn assert_same_row_count(conn: &mut dyn Connection, first: &str, second: &str) -> Result<()> {
    let first_count = count_rows(conn, first, None, None)?;
    let second_count = count_rows(conn, second, None, None)?;
    if first_count != second_count {
        return Err(AssertionFailure::RowCountsDiffer {
            first: first.to_string(),
            first_count,
            second: second.to_string(),
            second_count,
        }
        .into());
    }
    Ok(())
}

/// Fails unless `table` has no rows.
pub fn assert_table_empty(conn: &mut dyn Connection, table: &str) -> Result<()> {
    assert_row_count(conn, table, 0)
}
