//! PostgreSQL driver.
//!
//! - [`PostgresConnection`]: [`Connection`](crate::core::Connection) over the
//!   synchronous `postgres` client
//! - cell rendering per column type lives in `value`

mod connection;
mod value;

pub use connection::PostgresConnection;
