//! # dbassert
//!
//! Assertions about relational table state for automated acceptance tests.
//!
//! This library provides the checks a test step needs against a live
//! database connection:
//!
//! - **Row counts** with an aggregate query and a bounded scan fallback
//! - **Cell content** for a row picked by position or by predicate
//! - **Catalog checks** for table existence, primary keys and isolation level
//! - **SQL scripts** run fail-fast (transactional) or best-effort
//! - **Golden files** holding a query result, written and compared line by line
//!
//! Failed checks surface as [`AssertionFailure`]; anything else (bad SQL,
//! missing files, no connection) is an infrastructure [`DbAssertError`].
//!
//! ## Example
//!
//! ```rust,no_run
//! use dbassert::{Config, Session};
//!
//! fn main() -> dbassert::Result<()> {
//!     let config = Config::load("dbassert.yaml")?;
//!     let mut session = Session::from_config(&config)?;
//!     session.table_must_exist("Sample")?;
//!     session.row_count_is_equal_to("Sample", "2")?;
//!     session.check_content_by_predicate("Name", "Donny Darko", "Sample", "Id = 1")?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod core;
pub mod drivers;
pub mod error;
pub mod golden;
pub mod logging;
pub mod script;
pub mod session;
pub mod verify;

// Re-exports for convenient access
pub use crate::config::{Config, ConnectionConfig, VerifyConfig};
pub use crate::core::{Connection, IsolationLevel, QueryResult, Row};
pub use crate::error::{AssertionFailure, ComparisonDiff, DbAssertError, Result};
pub use crate::golden::ComparisonReport;
pub use crate::script::{ScriptMode, ScriptReport};
pub use crate::session::{ConnectionRegistry, Session};
pub use crate::verify::{ColumnSpec, ExpectedRow};
