//! The connection abstraction every verification runs against.
//!
//! A [`Connection`] is supplied by a driver (see `crate::drivers`) or by a
//! caller with its own backend. The engine never opens or closes connections;
//! it only issues statements through this trait, sequentially, on the
//! caller's thread.
//!
//! # Streaming
//!
//! [`Connection::query`] hands rows to a visitor one at a time. The visitor
//! returns [`ControlFlow::Break`] to stop early, which is how bounded scans
//! (row counting fallback, "more than one row" detection) avoid draining the
//! cursor. The statement and its cursor live only for the duration of the
//! call.

use std::ops::ControlFlow;

use crate::error::Result;

use super::value::{QueryResult, Row};

/// Callback invoked once per result row.
pub type RowVisitor<'a> = dyn FnMut(&Row) -> Result<ControlFlow<()>> + 'a;

/// A live database connection.
pub trait Connection: Send {
    /// Backend identifier (e.g. "sqlite", "postgres").
    fn backend(&self) -> &str;

    /// Execute a statement, discarding any rows it produces.
    ///
    /// Returns the number of affected rows when the backend reports it.
    fn execute(&mut self, sql: &str) -> Result<u64>;

    /// Run a query and stream its rows to `visitor`.
    ///
    /// Returns the result-set column names. Errors returned by the visitor
    /// are propagated unchanged.
    fn query(&mut self, sql: &str, visitor: &mut RowVisitor<'_>) -> Result<Vec<String>>;

    /// True iff the catalog lookup for `table` returns at least one entry.
    fn table_exists(&mut self, table: &str) -> Result<bool>;

    /// Primary-key column names in the order the catalog reports them.
    fn primary_key_columns(&mut self, table: &str) -> Result<Vec<String>>;

    /// Numeric transaction isolation code (see `IsolationLevel::from_code`).
    fn transaction_isolation(&mut self) -> Result<i32>;

    /// Whether each statement commits on its own.
    fn auto_commit(&self) -> bool;

    /// Switch auto-commit. Disabling opens a transaction; re-enabling commits
    /// any open one.
    fn set_auto_commit(&mut self, enabled: bool) -> Result<()>;

    /// Commit the current transaction (no-op in auto-commit mode).
    fn commit(&mut self) -> Result<()>;

    /// Roll back the current transaction (no-op in auto-commit mode).
    fn rollback(&mut self) -> Result<()>;

    /// Run a query and collect every row.
    fn query_all(&mut self, sql: &str) -> Result<QueryResult> {
        let mut rows = Vec::new();
        let columns = self.query(sql, &mut |row: &Row| {
            rows.push(row.clone());
            Ok(ControlFlow::Continue(()))
        })?;
        Ok(QueryResult { columns, rows })
    }
}
