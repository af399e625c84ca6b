//! Catalog checks: table existence, primary keys, transaction isolation.

use tracing::debug;

use crate::core::{Connection, IsolationLevel};
use crate::error::{AssertionFailure, Result};

/// True iff the backend's catalog lookup finds `table`.
pub fn table_exists(conn: &mut dyn Connection, table: &str) -> Result<bool> {
    conn.table_exists(table)
}

/// Fails unless `table` exists.
pub fn assert_table_exists(conn: &mut dyn Connection, table: &str) -> Result<()> {
    if !conn.table_exists(table)? {
        return Err(AssertionFailure::TableNotFound(table.to_string()).into());
    }
    Ok(())
}

/// Primary-key columns of `table` in key order.
pub fn primary_key_columns(conn: &mut dyn Connection, table: &str) -> Result<Vec<String>> {
    conn.primary_key_columns(table)
}

/// Primary-key columns rendered the way they are compared: comma-joined.
pub fn primary_key_column_list(conn: &mut dyn Connection, table: &str) -> Result<String> {
    Ok(conn.primary_key_columns(table)?.join(","))
}

/// Fails unless the primary key of `table` is exactly `expected`, a
/// comma-separated column list. Names compare case-insensitively after
/// trimming; order matters.
pub fn assert_primary_key_columns(
    conn: &mut dyn Connection,
    table: &str,
    expected: &str,
) -> Result<()> {
    let found = conn.primary_key_columns(table)?;
    let wanted: Vec<String> = expected
        .split(',')
        .map(|c| c.trim().to_lowercase())
        .collect();
    let actual: Vec<String> = found.iter().map(|c| c.trim().to_lowercase()).collect();
    debug!("Primary key of {}: {:?}, expected {:?}", table, actual, wanted);

    if wanted != actual {
        return Err(AssertionFailure::PrimaryKeyMismatch {
            expected: expected.to_string(),
            found: found.join(","),
        }
        .into());
    }
    Ok(())
}

/// Current isolation level; codes without a symbolic name yield `None`.
pub fn transaction_isolation_level(conn: &mut dyn Connection) -> Result<Option<IsolationLevel>> {
    let code = conn.transaction_isolation()?;
    Ok(IsolationLevel::from_code(code))
}

/// Name of the current isolation level, or `""` when the code is unknown.
pub fn transaction_isolation_name(conn: &mut dyn Connection) -> Result<String> {
    Ok(transaction_isolation_level(conn)?
        .map(|level| level.name().to_string())
        .unwrap_or_default())
}

/// Fails unless the current isolation level is `expected`, given with or
/// without the `TRANSACTION_` prefix.
pub fn assert_transaction_isolation(conn: &mut dyn Connection, expected: &str) -> Result<()> {
    let found = transaction_isolation_level(conn)?;
    let wanted = expected.parse::<IsolationLevel>().ok();

    if wanted.is_none() || wanted != found {
        return Err(AssertionFailure::IsolationLevelMismatch {
            expected: expected.to_string(),
            found: found.map(|l| l.name().to_string()).unwrap_or_default(),
        }
        .into());
    }
    Ok(())
}
