//! Assertions about table state.
//!
//! - [`row_count`]: row counting with the aggregate/scan strategies and the
//!   exact, more-than, less-than and same-amount assertions
//! - [`metadata`]: table existence, primary-key shape, transaction isolation
//! - [`content`]: cell content by row number or predicate, single values,
//!   row absence, bulk delete and ad-hoc SQL
//!
//! Every function takes the connection explicitly and returns
//! [`AssertionFailure`](crate::error::AssertionFailure) (wrapped in
//! `DbAssertError::Assertion`) when the check does not hold.

pub mod content;
pub mod metadata;
pub mod row_count;

pub use content::{
    assert_row_not_exists, check_by_predicate, check_by_row_number, delete_all_rows, execute_sql,
    read_single_value, ColumnSpec, ExpectedRow,
};
pub use metadata::{
    assert_primary_key_columns, assert_table_exists, assert_transaction_isolation,
    primary_key_column_list, primary_key_columns, table_exists, transaction_isolation_level,
    transaction_isolation_name,
};
pub use row_count::{
    assert_fewer_rows_than, assert_more_rows_than, assert_predicate_row_count, assert_row_count,
    assert_same_row_count, assert_table_empty, count_rows,
};

#[cfg(all(test, feature = "sqlite"))]
pub(crate) mod fixtures {
    use crate::core::{Connection, Row, RowVisitor};
    use crate::drivers::SqliteConnection;
    use crate::error::{DbAssertError, Result};

    /// In-memory database holding the two-row `Sample` table.
    pub fn sample() -> SqliteConnection {
        let mut conn = SqliteConnection::open_in_memory().unwrap();
        conn.execute("CREATE TABLE Sample (Id INTEGER PRIMARY KEY, Name TEXT, Postings INTEGER)")
            .unwrap();
        conn.execute("INSERT INTO Sample VALUES (1, 'Donny Darko', 1001), (2, 'Darth Vader', 123)")
            .unwrap();
        conn
    }

    /// Wraps a connection, rejecting aggregate queries and recording how many
    /// rows the last query handed out.
    pub struct AggregateRejecting {
        inner: SqliteConnection,
        rows_seen: u64,
        isolation: Option<i32>,
    }

    impl AggregateRejecting {
        pub fn new(inner: SqliteConnection) -> Self {
            Self {
                inner,
                rows_seen: 0,
                isolation: None,
            }
        }

        /// Report `code` as the isolation level instead of asking the database.
        pub fn with_isolation_code(mut self, code: i32) -> Self {
            self.isolation = Some(code);
            self
        }

        pub fn rows_seen(&self) -> u64 {
            self.rows_seen
        }
    }

    impl Connection for AggregateRejecting {
        fn backend(&self) -> &str {
            "sqlite-no-aggregates"
        }

        fn execute(&mut self, sql: &str) -> Result<u64> {
            self.inner.execute(sql)
        }

        fn query(&mut self, sql: &str, visitor: &mut RowVisitor<'_>) -> Result<Vec<String>> {
            if sql.to_uppercase().contains("COUNT(") {
                return Err(DbAssertError::database(sql, "aggregate functions are not supported"));
            }
            let mut seen = 0;
            let columns = self.inner.query(sql, &mut |row: &Row| {
                seen += 1;
                visitor(row)
            })?;
            self.rows_seen = seen;
            Ok(columns)
        }

        fn table_exists(&mut self, table: &str) -> Result<bool> {
            self.inner.table_exists(table)
        }

        fn primary_key_columns(&mut self, table: &str) -> Result<Vec<String>> {
            self.inner.primary_key_columns(table)
        }

        fn transaction_isolation(&mut self) -> Result<i32> {
            match self.isolation {
                Some(code) => Ok(code),
                None => self.inner.transaction_isolation(),
            }
        }

        fn auto_commit(&self) -> bool {
            self.inner.auto_commit()
        }

        fn set_auto_commit(&mut self, enabled: bool) -> Result<()> {
            self.inner.set_auto_commit(enabled)
        }

        fn commit(&mut self) -> Result<()> {
            self.inner.commit()
        }

        fn rollback(&mut self) -> Result<()> {
            self.inner.rollback()
        }
    }
}
