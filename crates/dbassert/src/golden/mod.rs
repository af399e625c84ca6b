//! Query results stored in, and compared against, flat "golden" files.
//!
//! One line per row; every cell is followed by `|`, including the last one.
//! NULL is written as the empty string. There is no header and no escaping,
//! so a value containing `|` or a line break cannot round-trip.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, ErrorKind, Write};
use std::ops::ControlFlow;
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::core::{Connection, Row};
use crate::error::{AssertionFailure, ComparisonDiff, DbAssertError, Result};

/// Default cap on reported differences.
pub const DEFAULT_MAX_DIFFS: usize = 10;

/// Differences between a live query result and a golden file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComparisonReport {
    /// Recorded differences, at most the cap passed to the comparison.
    pub diffs: Vec<ComparisonDiff>,
    /// Differences found after the cap was reached.
    pub suppressed: u64,
    /// Live rows read.
    pub rows_compared: u64,
}

impl ComparisonReport {
    /// True when the result and the file agree, counting suppressed
    /// differences too.
    pub fn is_match(&self) -> bool {
        self.total() == 0
    }

    /// Total differences, reported and suppressed.
    pub fn total(&self) -> u64 {
        self.diffs.len() as u64 + self.suppressed
    }

    /// Turn any difference into a single assertion failure.
    pub fn into_result(self) -> Result<()> {
        if self.is_match() {
            return Ok(());
        }
        Err(AssertionFailure::ResultMismatch {
            diffs: self.diffs,
            suppressed: self.suppressed,
        }
        .into())
    }

    fn record(&mut self, diff: ComparisonDiff, max_diffs: usize) {
        if self.diffs.len() < max_diffs {
            self.diffs.push(diff);
        } else {
            self.suppressed += 1;
        }
    }
}

fn open_golden(path: &Path) -> Result<File> {
    File::open(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => DbAssertError::FileNotFound(path.to_path_buf()),
        _ => DbAssertError::Io(e),
    })
}

/// Run `sql` and write its rows to `path`, replacing any existing file.
/// Returns the number of rows written.
///
/// Rows go to a temporary file next to `path` that only replaces it once the
/// query has completed, so a failing query leaves an existing file intact.
pub fn store_query_result_to_file(
    conn: &mut dyn Connection,
    sql: &str,
    path: impl AsRef<Path>,
) -> Result<u64> {
    let path = path.as_ref();
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut writer = BufWriter::new(NamedTempFile::new_in(dir)?);
    let mut written: u64 = 0;

    conn.query(sql, &mut |row: &Row| {
        writer.write_all(row.to_result_line().as_bytes())?;
        writer.write_all(b"\n")?;
        written += 1;
        Ok(ControlFlow::Continue(()))
    })?;

    let staged = writer.into_inner().map_err(|e| e.into_error())?;
    staged.persist(path).map_err(|e| DbAssertError::Io(e.error))?;

    info!("Stored {} rows to {}", written, path.display());
    Ok(written)
}

/// Compare the rows of `sql` with the lines of `path`, line by line.
///
/// The file is opened before the query runs. After `max_diffs` differences
/// the remaining rows are still read, but further differences are only
/// counted.
pub fn diff_query_result_against_file(
    conn: &mut dyn Connection,
    sql: &str,
    path: impl AsRef<Path>,
    max_diffs: usize,
) -> Result<ComparisonReport> {
    let path = path.as_ref();
    let mut lines = BufReader::new(open_golden(path)?).lines();
    let mut report = ComparisonReport::default();
    let mut golden_exhausted = false;

    conn.query(sql, &mut |row: &Row| {
        report.rows_compared += 1;
        if golden_exhausted {
            return Ok(ControlFlow::Continue(()));
        }

        let actual = row.to_result_line();
        match lines.next().transpose()? {
            Some(expected) => {
                if expected != actual {
                    debug!("Row {} differs: {} != {}", report.rows_compared, expected, actual);
                    let row = report.rows_compared;
                    report.record(
                        ComparisonDiff::RowMismatch {
                            row,
                            expected,
                            actual,
                        },
                        max_diffs,
                    );
                }
            }
            None => {
                golden_exhausted = true;
                let row = report.rows_compared;
                report.record(ComparisonDiff::FewerRowsExpected { row, actual }, max_diffs);
            }
        }
        Ok(ControlFlow::Continue(()))
    })?;

    if !golden_exhausted && lines.next().transpose()?.is_some() {
        report.record(ComparisonDiff::MoreRowsExpected, max_diffs);
    }

    info!(
        "Compared {} rows against {}: {} difference(s)",
        report.rows_compared,
        path.display(),
        report.total()
    );
    Ok(report)
}

/// Fails unless the rows of `sql` match the lines of `path`.
pub fn compare_query_result_to_file(
    conn: &mut dyn Connection,
    sql: &str,
    path: impl AsRef<Path>,
    max_diffs: usize,
) -> Result<()> {
    diff_query_result_against_file(conn, sql, path, max_diffs)?.into_result()
}

#[cfg(all(test, feature = "sqlite"))]
mod tests {
    use super::*;
    use crate::verify::fixtures::sample;

    fn golden(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    const ORDERED: &str = "SELECT * FROM Sample ORDER BY Id";

    #[test]
    fn test_store_writes_trailing_pipes_and_empty_nulls() {
        let mut conn = sample();
        conn.execute("INSERT INTO Sample VALUES (3, NULL, 7)").unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.txt");

        let written = store_query_result_to_file(&mut conn, ORDERED, &path).unwrap();
        assert_eq!(written, 3);
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "1|Donny Darko|1001|\n2|Darth Vader|123|\n3||7|\n"
        );
    }

    #[test]
    fn test_store_then_compare_round_trip() {
        let mut conn = sample();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("round_trip.txt");

        store_query_result_to_file(&mut conn, ORDERED, &path).unwrap();
        let report =
            diff_query_result_against_file(&mut conn, ORDERED, &path, DEFAULT_MAX_DIFFS).unwrap();
        assert!(report.is_match());
        assert_eq!(report.rows_compared, 2);
    }

    #[test]
    fn test_golden_with_fewer_lines_than_rows() {
        let mut conn = sample();
        let file = golden("1|Donny Darko|1001|\n");

        let err = compare_query_result_to_file(&mut conn, ORDERED, file.path(), DEFAULT_MAX_DIFFS)
            .unwrap_err();
        match err.as_assertion() {
            Some(AssertionFailure::ResultMismatch { diffs, suppressed }) => {
                assert_eq!(
                    diffs,
                    &vec![ComparisonDiff::FewerRowsExpected {
                        row: 2,
                        actual: "2|Darth Vader|123|".into()
                    }]
                );
                assert_eq!(*suppressed, 0);
            }
            other => panic!("unexpected failure: {:?}", other),
        }
        assert!(err.to_string().contains("Fewer rows in expected file"));
    }

    #[test]
    fn test_golden_with_more_lines_than_rows() {
        let mut conn = sample();
        let file = golden("1|Donny Darko|1001|\n2|Darth Vader|123|\n3|Extra|0|\n");

        let report =
            diff_query_result_against_file(&mut conn, ORDERED, file.path(), DEFAULT_MAX_DIFFS)
                .unwrap();
        assert_eq!(report.diffs, vec![ComparisonDiff::MoreRowsExpected]);
    }

    #[test]
    fn test_row_mismatch_names_row_and_both_lines() {
        let mut conn = sample();
        let file = golden("1|Donny Darko|1001|\n2|Luke|123|\n");

        let err = compare_query_result_to_file(&mut conn, ORDERED, file.path(), DEFAULT_MAX_DIFFS)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Row 2 does not match:\nexp: 2|Luke|123|\nact: 2|Darth Vader|123|\n"
        );
    }

    #[test]
    fn test_diff_cap_counts_suppressed() {
        let mut conn = sample();
        conn.execute("CREATE TABLE Numbers (n INTEGER)").unwrap();
        for n in 0..15 {
            conn.execute(&format!("INSERT INTO Numbers VALUES ({})", n)).unwrap();
        }
        let expected: String = (0..15).map(|n| format!("{}|\n", n + 100)).collect();
        let file = golden(&expected);

        let report = diff_query_result_against_file(
            &mut conn,
            "SELECT n FROM Numbers ORDER BY n",
            file.path(),
            DEFAULT_MAX_DIFFS,
        )
        .unwrap();
        assert_eq!(report.diffs.len(), 10);
        assert_eq!(report.suppressed, 5);
        assert_eq!(report.rows_compared, 15);

        let err = report.into_result().unwrap_err();
        assert!(err.to_string().contains("... 5 more differences not shown"));
    }

    #[test]
    fn test_missing_golden_file_fails_before_query() {
        let mut conn = sample();
        // The query is invalid; a missing file must be reported instead.
        let err =
            compare_query_result_to_file(&mut conn, "SELEC nope", "/nonexistent/golden.txt", 10)
                .unwrap_err();
        assert!(matches!(err, DbAssertError::FileNotFound(_)));
    }

    #[test]
    fn test_failed_store_keeps_existing_file() {
        let mut conn = sample();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("baseline.txt");
        std::fs::write(&path, "1|Donny Darko|1001|\n").unwrap();

        let err = store_query_result_to_file(&mut conn, "SELEC broken", &path).unwrap_err();
        assert!(matches!(err, DbAssertError::Database { .. }));
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "1|Donny Darko|1001|\n"
        );
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_zero_diff_cap_still_fails() {
        let mut conn = sample();
        let file = golden("totally|wrong|\n");

        let report = diff_query_result_against_file(&mut conn, ORDERED, file.path(), 0).unwrap();
        assert!(report.diffs.is_empty());
        assert_eq!(report.suppressed, 2);
        assert!(!report.is_match());

        let err = compare_query_result_to_file(&mut conn, ORDERED, file.path(), 0).unwrap_err();
        assert!(err.is_assertion());
        assert!(err.to_string().contains("... 2 more differences not shown"));
    }
}
