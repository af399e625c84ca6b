//! `rusqlite`-backed connection.

use std::ops::ControlFlow;

use rusqlite::types::ValueRef;
use tracing::debug;

use crate::core::{Connection, IsolationLevel, Row, RowVisitor};
use crate::error::{DbAssertError, Result};

/// SQLite connection.
///
/// Auto-commit is emulated on top of SQLite's implicit transactions: turning
/// it off issues `BEGIN`, and every commit or rollback immediately opens the
/// next transaction until auto-commit is switched back on.
pub struct SqliteConnection {
    conn: rusqlite::Connection,
    auto_commit: bool,
}

impl SqliteConnection {
    /// Open a database file, or an in-memory database for `""`/`":memory:"`.
    pub fn open(path: &str) -> Result<Self> {
        let conn = if path.is_empty() || path == ":memory:" {
            rusqlite::Connection::open_in_memory()
        } else {
            rusqlite::Connection::open(path)
        }
        .map_err(|e| DbAssertError::database(format!("open {}", path), e))?;

        debug!("Opened SQLite database {}", if path.is_empty() { ":memory:" } else { path });
        Ok(Self::from_rusqlite(conn))
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        Self::open(":memory:")
    }

    /// Wrap an existing `rusqlite` handle.
    pub fn from_rusqlite(conn: rusqlite::Connection) -> Self {
        Self {
            conn,
            auto_commit: true,
        }
    }

    /// The underlying handle.
    pub fn inner(&self) -> &rusqlite::Connection {
        &self.conn
    }

    fn batch(&self, sql: &str) -> Result<()> {
        self.conn
            .execute_batch(sql)
            .map_err(|e| DbAssertError::database(sql, e))
    }

    fn in_transaction(&self) -> bool {
        !self.conn.is_autocommit()
    }
}

fn cell_text(value: ValueRef<'_>) -> Option<String> {
    match value {
        ValueRef::Null => None,
        ValueRef::Integer(i) => Some(i.to_string()),
        ValueRef::Real(f) => Some(f.to_string()),
        ValueRef::Text(t) => Some(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Some(hex::encode(b)),
    }
}

/// Prepare the one statement in `sql`. Text holding a second statement is
/// rejected rather than having its tail silently ignored.
fn prepare_single<'c>(
    conn: &'c rusqlite::Connection,
    sql: &str,
) -> Result<Option<rusqlite::Statement<'c>>> {
    let mut batch = rusqlite::Batch::new(conn, sql);
    let Some(stmt) = batch.next().map_err(|e| DbAssertError::database(sql, e))? else {
        return Ok(None);
    };
    match batch.next() {
        Ok(None) => Ok(Some(stmt)),
        _ => Err(DbAssertError::database(
            sql,
            "more than one statement given; end each statement with ';' on its own line",
        )),
    }
}

/// Statements whose affected-row count `changes()` reports.
fn is_dml(sql: &str) -> bool {
    let keyword = sql
        .trim_start()
        .split(|c: char| !c.is_ascii_alphabetic())
        .next()
        .unwrap_or("")
        .to_ascii_uppercase();
    matches!(
        keyword.as_str(),
        "INSERT" | "UPDATE" | "DELETE" | "REPLACE" | "WITH"
    )
}

impl Connection for SqliteConnection {
    fn backend(&self) -> &str {
        "sqlite"
    }

    fn execute(&mut self, sql: &str) -> Result<u64> {
        // SQLite treats a statement with no tokens as a no-op.
        if sql.trim().is_empty() {
            return Ok(0);
        }

        let Some(mut stmt) = prepare_single(&self.conn, sql)? else {
            return Ok(0);
        };
        let counts_rows = !stmt.readonly() && is_dml(sql);
        let mut rows = stmt.query([]).map_err(|e| DbAssertError::database(sql, e))?;
        while rows
            .next()
            .map_err(|e| DbAssertError::database(sql, e))?
            .is_some()
        {}
        drop(rows);
        drop(stmt);

        if counts_rows {
            Ok(self.conn.changes() as u64)
        } else {
            Ok(0)
        }
    }

    fn query(&mut self, sql: &str, visitor: &mut RowVisitor<'_>) -> Result<Vec<String>> {
        if sql.trim().is_empty() {
            return Ok(Vec::new());
        }

        let Some(mut stmt) = prepare_single(&self.conn, sql)? else {
            return Ok(Vec::new());
        };
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

        let mut rows = stmt.query([]).map_err(|e| DbAssertError::database(sql, e))?;
        while let Some(row) = rows.next().map_err(|e| DbAssertError::database(sql, e))? {
            let mut values = Vec::with_capacity(columns.len());
            for idx in 0..columns.len() {
                let value = row
                    .get_ref(idx)
                    .map_err(|e| DbAssertError::database(sql, e))?;
                values.push(cell_text(value));
            }
            if visitor(&Row::new(values))?.is_break() {
                break;
            }
        }

        Ok(columns)
    }

    fn table_exists(&mut self, table: &str) -> Result<bool> {
        let sql = "SELECT COUNT(*) FROM sqlite_master \
                   WHERE type IN ('table', 'view') AND name LIKE ?1";
        let count: i64 = self
            .conn
            .query_row(sql, [table], |row| row.get(0))
            .map_err(|e| DbAssertError::database(sql, e))?;
        Ok(count > 0)
    }

    fn primary_key_columns(&mut self, table: &str) -> Result<Vec<String>> {
        let sql = "SELECT name FROM pragma_table_info(?1) WHERE pk > 0 ORDER BY pk";
        let mut stmt = self
            .conn
            .prepare(sql)
            .map_err(|e| DbAssertError::database(sql, e))?;
        let names = stmt
            .query_map([table], |row| row.get::<_, String>(0))
            .map_err(|e| DbAssertError::database(sql, e))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| DbAssertError::database(sql, e))?;
        Ok(names)
    }

    fn transaction_isolation(&mut self) -> Result<i32> {
        let sql = "PRAGMA read_uncommitted";
        let flag: i64 = self
            .conn
            .query_row(sql, [], |row| row.get(0))
            .map_err(|e| DbAssertError::database(sql, e))?;
        if flag != 0 {
            Ok(IsolationLevel::READ_UNCOMMITTED_CODE)
        } else {
            Ok(IsolationLevel::SERIALIZABLE_CODE)
        }
    }

    fn auto_commit(&self) -> bool {
        self.auto_commit
    }

    fn set_auto_commit(&mut self, enabled: bool) -> Result<()> {
        if enabled {
            if self.in_transaction() {
                self.batch("COMMIT")?;
            }
        } else if !self.in_transaction() {
            self.batch("BEGIN")?;
        }
        self.auto_commit = enabled;
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        if self.in_transaction() {
            self.batch("COMMIT")?;
        }
        if !self.auto_commit {
            self.batch("BEGIN")?;
        }
        Ok(())
    }

    fn rollback(&mut self) -> Result<()> {
        if self.in_transaction() {
            self.batch("ROLLBACK")?;
        }
        if !self.auto_commit {
            self.batch("BEGIN")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SqliteConnection {
        let mut conn = SqliteConnection::open_in_memory().unwrap();
        conn.execute("CREATE TABLE Sample (Id INTEGER PRIMARY KEY, Name TEXT, Postings INTEGER)")
            .unwrap();
        conn.execute("INSERT INTO Sample VALUES (1, 'Donny Darko', 1001), (2, 'Darth Vader', 123)")
            .unwrap();
        conn
    }

    #[test]
    fn test_execute_reports_changes() {
        let mut conn = sample();
        assert_eq!(conn.execute("UPDATE Sample SET Postings = 0").unwrap(), 2);
        assert_eq!(conn.execute("   ").unwrap(), 0);
    }

    #[test]
    fn test_execute_reports_zero_for_non_dml() {
        let mut conn = sample();
        assert_eq!(conn.execute("DELETE FROM Sample WHERE Id = 2").unwrap(), 1);
        assert_eq!(conn.execute("CREATE TABLE Other (x INTEGER)").unwrap(), 0);
        assert_eq!(conn.execute("SELECT * FROM Sample").unwrap(), 0);
        assert_eq!(conn.execute("insert into Other values (1), (2)").unwrap(), 2);
    }

    #[test]
    fn test_multiple_statements_are_rejected() {
        let mut conn = sample();
        let err = conn
            .execute("CREATE TABLE A (x INTEGER);INSERT INTO A VALUES (1)")
            .unwrap_err();
        assert!(matches!(err, DbAssertError::Database { .. }));
        assert!(!conn.table_exists("A").unwrap());

        assert!(conn.query_all("SELECT 1; SELECT 2").is_err());
        assert_eq!(conn.query_all("SELECT 1; -- trailing note").unwrap().rows.len(), 1);
    }

    #[test]
    fn test_query_streams_rows_and_columns() {
        let mut conn = sample();
        let result = conn.query_all("SELECT Id, Name FROM Sample ORDER BY Id").unwrap();
        assert_eq!(result.columns, vec!["Id", "Name"]);
        assert_eq!(result.rows.len(), 2);
        assert_eq!(result.rows[1].text(1), Some("Darth Vader"));
    }

    #[test]
    fn test_query_stops_on_break() {
        let mut conn = sample();
        let mut seen = 0;
        conn.query("SELECT * FROM Sample", &mut |_row: &Row| {
            seen += 1;
            Ok(ControlFlow::Break(()))
        })
        .unwrap();
        assert_eq!(seen, 1);
    }

    #[test]
    fn test_cell_rendering() {
        let mut conn = SqliteConnection::open_in_memory().unwrap();
        let result = conn
            .query_all("SELECT NULL, 42, 1.5, 'txt', x'0aff'")
            .unwrap();
        let row = &result.rows[0];
        assert_eq!(row.get(0), Some(None));
        assert_eq!(row.text(1), Some("42"));
        assert_eq!(row.text(2), Some("1.5"));
        assert_eq!(row.text(3), Some("txt"));
        assert_eq!(row.text(4), Some("0aff"));
    }

    #[test]
    fn test_bad_sql_is_database_error() {
        let mut conn = sample();
        let err = conn.execute("SELEC nonsense").unwrap_err();
        assert!(matches!(err, DbAssertError::Database { .. }));
        assert!(!err.is_assertion());
    }

    #[test]
    fn test_metadata() {
        let mut conn = sample();
        conn.execute("CREATE TABLE Pairs (b TEXT, a TEXT, PRIMARY KEY (a, b))")
            .unwrap();

        assert!(conn.table_exists("Sample").unwrap());
        assert!(conn.table_exists("SAMPLE").unwrap());
        assert!(!conn.table_exists("Missing").unwrap());

        assert_eq!(conn.primary_key_columns("Sample").unwrap(), vec!["Id"]);
        assert_eq!(conn.primary_key_columns("Pairs").unwrap(), vec!["a", "b"]);
        assert!(conn.primary_key_columns("Missing").unwrap().is_empty());

        assert_eq!(
            conn.transaction_isolation().unwrap(),
            IsolationLevel::SERIALIZABLE_CODE
        );
        conn.execute("PRAGMA read_uncommitted = 1").unwrap();
        assert_eq!(
            conn.transaction_isolation().unwrap(),
            IsolationLevel::READ_UNCOMMITTED_CODE
        );
    }

    #[test]
    fn test_manual_commit_and_rollback() {
        let mut conn = sample();
        conn.set_auto_commit(false).unwrap();
        assert!(!conn.auto_commit());

        conn.execute("DELETE FROM Sample WHERE Id = 1").unwrap();
        conn.rollback().unwrap();
        conn.execute("DELETE FROM Sample WHERE Id = 2").unwrap();
        conn.commit().unwrap();
        conn.set_auto_commit(true).unwrap();

        let result = conn.query_all("SELECT Id FROM Sample").unwrap();
        assert_eq!(result.rows.len(), 1);
        assert_eq!(result.rows[0].text(0), Some("1"));
        assert!(conn.inner().is_autocommit());
    }
}
