//! Core abstractions shared by the verification components.
//!
//! - [`traits`]: the [`Connection`] trait every check runs against
//! - [`value`]: rendered rows and materialized query results
//! - [`isolation`]: symbolic transaction isolation levels

pub mod isolation;
pub mod traits;
pub mod value;

pub use isolation::IsolationLevel;
pub use traits::{Connection, RowVisitor};
pub use value::{QueryResult, Row};
