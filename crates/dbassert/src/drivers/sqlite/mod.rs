//! SQLite driver.
//!
//! - [`SqliteConnection`]: [`Connection`](crate::core::Connection) over a
//!   `rusqlite` handle, file-backed or in-memory

mod connection;

pub use connection::SqliteConnection;
