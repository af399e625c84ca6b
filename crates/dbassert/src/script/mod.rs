//! SQL script execution.
//!
//! Scripts are split with [`StatementSplitter`] and run inside a single
//! transaction (auto-commit is switched off for the duration and restored
//! afterwards). Two modes:
//!
//! - [`ScriptMode::FailFast`]: the first failing statement rolls everything
//!   back and is reported as [`AssertionFailure::ScriptRolledBack`].
//! - [`ScriptMode::BestEffort`]: failures are logged and collected in the
//!   [`ScriptReport`]; the remaining statements still run and the transaction
//!   is committed at the end.
//!
//! PostgreSQL aborts the surrounding transaction on the first error, so in
//! best-effort mode every statement after a failure fails as well until the
//! final commit (which PostgreSQL turns into a rollback).

pub mod splitter;

pub use splitter::{is_comment, split_statements, StatementSplitter};

use std::fs::File;
use std::io::{BufRead, BufReader, Cursor, ErrorKind};
use std::path::Path;

use tracing::{debug, info, warn};

use crate::core::Connection;
use crate::error::{AssertionFailure, DbAssertError, Result};

/// How statement failures are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptMode {
    /// Roll back and fail on the first error.
    FailFast,
    /// Log errors, keep going, commit at the end.
    BestEffort,
}

/// A statement that failed in best-effort mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementFailure {
    pub statement: String,
    pub error: String,
}

/// Outcome of a script run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptReport {
    /// Statements that executed successfully.
    pub executed: usize,
    /// Statements that failed (best-effort mode only).
    pub failed: Vec<StatementFailure>,
    /// Unterminated text left at the end of the script, not executed.
    pub unterminated: Option<String>,
}

impl ScriptReport {
    /// True when every statement succeeded.
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Run the statements read from `reader`.
pub fn execute_script<R: BufRead>(
    conn: &mut dyn Connection,
    reader: R,
    mode: ScriptMode,
) -> Result<ScriptReport> {
    let previous = conn.auto_commit();
    conn.set_auto_commit(false)?;

    let outcome = run_statements(conn, reader, mode).and_then(|report| {
        conn.commit()?;
        Ok(report)
    });

    match outcome {
        Ok(report) => {
            conn.set_auto_commit(previous)?;
            info!(
                "Script finished: {} executed, {} failed",
                report.executed,
                report.failed.len()
            );
            Ok(report)
        }
        Err(err) => {
            if let Err(rollback_err) = conn.rollback() {
                warn!("Rollback after script failure failed: {}", rollback_err);
            }
            conn.set_auto_commit(previous)?;
            Err(err)
        }
    }
}

fn run_statements<R: BufRead>(
    conn: &mut dyn Connection,
    reader: R,
    mode: ScriptMode,
) -> Result<ScriptReport> {
    let mut splitter = StatementSplitter::new();
    let mut report = ScriptReport::default();

    for line in reader.lines() {
        let line = line?;
        let Some(statement) = splitter.push_line(&line) else {
            continue;
        };

        debug!("Executing: {}", statement);
        match conn.execute(&statement) {
            Ok(_) => report.executed += 1,
            Err(err) => match mode {
                ScriptMode::FailFast => {
                    return Err(AssertionFailure::ScriptRolledBack {
                        statement,
                        cause: err.to_string(),
                    }
                    .into());
                }
                ScriptMode::BestEffort => {
                    warn!("Error executing: {}\n{}", statement, err);
                    report.failed.push(StatementFailure {
                        statement,
                        error: err.to_string(),
                    });
                }
            },
        }
    }

    if let Some(rest) = splitter.remainder() {
        warn!("Ignoring unterminated statement at end of script: {}", rest);
        report.unterminated = Some(rest.to_string());
    }
    Ok(report)
}

/// Run a script held in memory.
pub fn execute_script_text(
    conn: &mut dyn Connection,
    text: &str,
    mode: ScriptMode,
) -> Result<ScriptReport> {
    execute_script(conn, Cursor::new(text), mode)
}

/// Run a script file. A missing file is reported before anything executes.
pub fn execute_script_file(
    conn: &mut dyn Connection,
    path: impl AsRef<Path>,
    mode: ScriptMode,
) -> Result<ScriptReport> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => DbAssertError::FileNotFound(path.to_path_buf()),
        _ => DbAssertError::Io(e),
    })?;
    info!("Executing SQL script {}", path.display());
    execute_script(conn, BufReader::new(file), mode)
}
