//! Error types for the verification library.
//!
//! Failures come in two kinds. [`AssertionFailure`] is the expected outcome of
//! a check that did not hold (wrong row count, mismatching cell, ...) and is
//! the normal "test failed" signal. Every other [`DbAssertError`] variant is an
//! infrastructure failure: the database rejected a statement, a file could not
//! be read, no connection was open.

use std::num::ParseIntError;
use std::path::PathBuf;

use thiserror::Error;

/// A single difference found while comparing a query result with a golden file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComparisonDiff {
    /// Row `row` (1-based) differs from the corresponding golden line.
    RowMismatch {
        row: u64,
        expected: String,
        actual: String,
    },
    /// The golden file ran out while the query still produced rows.
    FewerRowsExpected { row: u64, actual: String },
    /// The query ran out while the golden file still had lines.
    MoreRowsExpected,
}

impl std::fmt::Display for ComparisonDiff {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ComparisonDiff::RowMismatch {
                row,
                expected,
                actual,
            } => write!(f, "Row {} does not match:\nexp: {}\nact: {}", row, expected, actual),
            ComparisonDiff::FewerRowsExpected { row, actual } => write!(
                f,
                "Fewer rows in expected file than in query result (first unmatched row {}: {})",
                row, actual
            ),
            ComparisonDiff::MoreRowsExpected => {
                write!(f, "More rows in expected file than in query result")
            }
        }
    }
}

/// Outcome of a check that did not hold.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AssertionFailure {
    #[error("Expecting {expected} rows, fetched: {fetched}")]
    RowCount { expected: u64, fetched: u64 },

    #[error("Expecting less than {threshold} rows, fetched: {fetched}")]
    TooManyRows { threshold: u64, fetched: u64 },

    #[error("Expecting more than {threshold} rows, fetched: {fetched}")]
    TooFewRows { threshold: u64, fetched: u64 },

    #[error(
        "Expecting same amount of rows, but table {first} has {first_count} rows \
         and table {second} has {second_count} rows!"
    )]
    RowCountsDiffer {
        first: String,
        first_count: u64,
        second: String,
        second_count: u64,
    },

    #[error("Table: {0} was not found")]
    TableNotFound(String),

    #[error("Value found: '{found}'. Expected: '{expected}' (column {column})")]
    ValueMismatch {
        column: String,
        expected: String,
        found: String,
    },

    #[error("Given rownum does not exist for statement: {sql}")]
    RowNotFound { sql: String },

    #[error("No row fetched by given where-clause for statement: {sql}")]
    NoRowFetched { sql: String },

    #[error("More than one row fetched by given where-clause for statement: {sql}")]
    MoreThanOneRow { sql: String },

    #[error("More than one value fetched for: {sql}")]
    MoreThanOneValue { sql: String },

    #[error("Row exists (but should not) for where-clause: {predicate} in table: {table}")]
    RowExists { table: String, predicate: String },

    #[error("Given column list: {expected} Keys found: {found}")]
    PrimaryKeyMismatch { expected: String, found: String },

    #[error("Expected Transaction Isolation Level: {expected} Level found: {found}")]
    IsolationLevelMismatch { expected: String, found: String },

    #[error("Error executing: {statement} Execution from file rolled back! Cause: {cause}")]
    ScriptRolledBack { statement: String, cause: String },

    #[error("{}", render_diffs(.diffs, .suppressed))]
    ResultMismatch {
        diffs: Vec<ComparisonDiff>,
        suppressed: u64,
    },
}

fn render_diffs(diffs: &[ComparisonDiff], suppressed: &u64) -> String {
    let mut out = String::new();
    for diff in diffs {
        out.push_str(&diff.to_string());
        out.push('\n');
    }
    if *suppressed > 0 {
        out.push_str(&format!("... {} more differences not shown\n", suppressed));
    }
    out
}

/// Main error type for verification operations.
#[derive(Error, Debug)]
pub enum DbAssertError {
    /// A verification did not hold.
    #[error(transparent)]
    Assertion(#[from] AssertionFailure),

    /// The database rejected a statement or a metadata lookup.
    #[error("Database error: {source}\n  Statement: {sql}")]
    Database {
        sql: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// No connection registered under the requested alias.
    #[error("No connection open with alias {0}. Did you forget to connect before?")]
    NoConnection(String),

    /// A golden file or script file does not exist.
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// Numeric argument could not be parsed.
    #[error("Invalid number '{value}': {source}")]
    InvalidNumber {
        value: String,
        #[source]
        source: ParseIntError,
    },

    /// Argument shape error (e.g. column and value lists of different length).
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Configuration error (invalid YAML, unknown driver, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl DbAssertError {
    /// Create a Database error carrying the statement that failed.
    pub fn database(
        sql: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        DbAssertError::Database {
            sql: sql.into(),
            source: source.into(),
        }
    }

    /// True when this is a failed check rather than an infrastructure problem.
    pub fn is_assertion(&self) -> bool {
        matches!(self, DbAssertError::Assertion(_))
    }

    /// The assertion failure, if this error is one.
    pub fn as_assertion(&self) -> Option<&AssertionFailure> {
        match self {
            DbAssertError::Assertion(failure) => Some(failure),
            _ => None,
        }
    }

    /// Format error with full details including error chain
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }
}

/// Result type alias for verification operations.
pub type Result<T> = std::result::Result<T, DbAssertError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assertion_is_distinguished_from_infrastructure() {
        let failure: DbAssertError = AssertionFailure::TableNotFound("Sample".into()).into();
        assert!(failure.is_assertion());
        assert_eq!(failure.to_string(), "Table: Sample was not found");

        let infra = DbAssertError::NoConnection("default".into());
        assert!(!infra.is_assertion());
        assert!(infra.as_assertion().is_none());
    }

    #[test]
    fn test_result_mismatch_concatenates_diffs() {
        let failure = AssertionFailure::ResultMismatch {
            diffs: vec![
                ComparisonDiff::RowMismatch {
                    row: 1,
                    expected: "a|".into(),
                    actual: "b|".into(),
                },
                ComparisonDiff::MoreRowsExpected,
            ],
            suppressed: 0,
        };
        let message = failure.to_string();
        assert_eq!(
            message,
            "Row 1 does not match:\nexp: a|\nact: b|\n\
             More rows in expected file than in query result\n"
        );
    }

    #[test]
    fn test_result_mismatch_reports_suppressed() {
        let failure = AssertionFailure::ResultMismatch {
            diffs: vec![ComparisonDiff::MoreRowsExpected],
            suppressed: 3,
        };
        assert!(failure.to_string().contains("3 more differences not shown"));
    }

    #[test]
    fn test_format_detailed_includes_cause() {
        let err = DbAssertError::database("SELECT 1", "boom");
        let detailed = err.format_detailed();
        assert!(detailed.contains("Statement: SELECT 1"));
        assert!(detailed.contains("Caused by:\n  1: boom"));
    }
}
