//! Synchronous PostgreSQL connection.

use postgres::fallible_iterator::FallibleIterator;
use postgres::types::ToSql;
use postgres::{Client, NoTls};
use tracing::debug;

use super::value::cell_text;
use crate::core::{Connection, IsolationLevel, Row, RowVisitor};
use crate::error::{DbAssertError, Result};

/// PostgreSQL connection.
///
/// In manual-commit mode a transaction is always open: commit and rollback
/// immediately start the next one.
pub struct PostgresConnection {
    client: Client,
    auto_commit: bool,
    in_transaction: bool,
}

impl PostgresConnection {
    /// Connect using a libpq-style connection string or URL. `user` and
    /// `password` override whatever the string specifies.
    pub fn connect(url: &str, user: Option<&str>, password: Option<&str>) -> Result<Self> {
        let mut config: postgres::Config = url.parse().map_err(|e| {
            DbAssertError::Config(format!("invalid PostgreSQL connection string: {}", e))
        })?;
        if let Some(user) = user {
            config.user(user);
        }
        if let Some(password) = password {
            config.password(password);
        }

        let client = config
            .connect(NoTls)
            .map_err(|e| DbAssertError::database("connect", e))?;

        debug!("Connected to PostgreSQL {:?}", config.get_hosts());
        Ok(Self::from_client(client))
    }

    /// Wrap an already connected client.
    pub fn from_client(client: Client) -> Self {
        Self {
            client,
            auto_commit: true,
            in_transaction: false,
        }
    }

    fn batch(&mut self, sql: &str) -> Result<()> {
        self.client
            .batch_execute(sql)
            .map_err(|e| DbAssertError::database(sql, e))
    }

    fn begin(&mut self) -> Result<()> {
        self.batch("BEGIN")?;
        self.in_transaction = true;
        Ok(())
    }

    fn finish(&mut self, sql: &str) -> Result<()> {
        if self.in_transaction {
            self.in_transaction = false;
            self.batch(sql)?;
        }
        if !self.auto_commit {
            self.begin()?;
        }
        Ok(())
    }
}

impl Connection for PostgresConnection {
    fn backend(&self) -> &str {
        "postgres"
    }

    fn execute(&mut self, sql: &str) -> Result<u64> {
        if sql.trim().is_empty() {
            return Ok(0);
        }
        self.client
            .execute(sql, &[])
            .map_err(|e| DbAssertError::database(sql, e))
    }

    fn query(&mut self, sql: &str, visitor: &mut RowVisitor<'_>) -> Result<Vec<String>> {
        if sql.trim().is_empty() {
            return Ok(Vec::new());
        }

        let stmt = self
            .client
            .prepare(sql)
            .map_err(|e| DbAssertError::database(sql, e))?;
        let columns: Vec<String> = stmt
            .columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect();

        let mut rows = self
            .client
            .query_raw(&stmt, std::iter::empty::<&dyn ToSql>())
            .map_err(|e| DbAssertError::database(sql, e))?;
        while let Some(pg_row) = rows.next().map_err(|e| DbAssertError::database(sql, e))? {
            let mut values = Vec::with_capacity(columns.len());
            for idx in 0..pg_row.len() {
                values.push(cell_text(&pg_row, idx).map_err(|e| DbAssertError::database(sql, e))?);
            }
            if visitor(&Row::new(values))?.is_break() {
                break;
            }
        }

        Ok(columns)
    }

    fn table_exists(&mut self, table: &str) -> Result<bool> {
        let sql = "SELECT EXISTS (
                SELECT 1 FROM information_schema.tables
                WHERE table_name LIKE $1
            )";
        let row = self
            .client
            .query_one(sql, &[&table])
            .map_err(|e| DbAssertError::database(sql, e))?;
        Ok(row.get::<_, bool>(0))
    }

    fn primary_key_columns(&mut self, table: &str) -> Result<Vec<String>> {
        let sql = r#"
            SELECT a.attname
            FROM pg_catalog.pg_constraint c
            JOIN pg_catalog.pg_class t ON t.oid = c.conrelid
            JOIN pg_catalog.pg_attribute a ON a.attrelid = t.oid
            WHERE t.relname = $1
              AND pg_catalog.pg_table_is_visible(t.oid)
              AND c.contype = 'p'
              AND a.attnum = ANY(c.conkey)
            ORDER BY array_position(c.conkey, a.attnum)
        "#;
        let rows = self
            .client
            .query(sql, &[&table])
            .map_err(|e| DbAssertError::database(sql, e))?;
        Ok(rows.iter().map(|row| row.get::<_, String>(0)).collect())
    }

    fn transaction_isolation(&mut self) -> Result<i32> {
        let sql = "SHOW transaction_isolation";
        let row = self
            .client
            .query_one(sql, &[])
            .map_err(|e| DbAssertError::database(sql, e))?;
        let level: String = row.get(0);
        Ok(level
            .parse::<IsolationLevel>()
            .map(|l| l.code())
            .unwrap_or(-1))
    }

    fn auto_commit(&self) -> bool {
        self.auto_commit
    }

    fn set_auto_commit(&mut self, enabled: bool) -> Result<()> {
        if enabled {
            self.auto_commit = true;
            if self.in_transaction {
                self.in_transaction = false;
                self.batch("COMMIT")?;
            }
        } else {
            self.auto_commit = false;
            if !self.in_transaction {
                self.begin()?;
            }
        }
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        self.finish("COMMIT")
    }

    fn rollback(&mut self) -> Result<()> {
        self.finish("ROLLBACK")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Runs only when `DBASSERT_PG_URL` points at a scratch database.
    #[test]
    #[ignore]
    fn test_live_round_trip() {
        let url = std::env::var("DBASSERT_PG_URL").expect("DBASSERT_PG_URL not set");
        let mut conn = PostgresConnection::connect(&url, None, None).unwrap();
        conn.execute("CREATE TEMP TABLE dbassert_scratch (id INT PRIMARY KEY, name TEXT)")
            .unwrap();
        conn.execute("INSERT INTO dbassert_scratch VALUES (1, 'a'), (2, NULL)")
            .unwrap();

        let result = conn
            .query_all("SELECT id, name FROM dbassert_scratch ORDER BY id")
            .unwrap();
        assert_eq!(result.columns, vec!["id", "name"]);
        assert_eq!(result.rows[0].to_result_line(), "1|a|");
        assert_eq!(result.rows[1].to_result_line(), "2||");

        assert_eq!(conn.primary_key_columns("dbassert_scratch").unwrap(), vec!["id"]);
        assert_eq!(
            conn.transaction_isolation().unwrap(),
            IsolationLevel::READ_COMMITTED_CODE
        );
    }
}
