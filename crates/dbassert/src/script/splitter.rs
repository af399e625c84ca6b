//! Lexical statement splitting.
//!
//! Lines are trimmed and concatenated with no separator until the buffer ends
//! in `;`. A statement therefore has to start on a new line, and a line break
//! inside a statement joins the neighbouring tokens (`SELECT *` / `FROM t`
//! becomes `SELECT *FROM t`). Semicolons inside string literals are not
//! special-cased.

/// True for lines skipped before buffering: `REM ...` (any case) or `# ...`.
pub fn is_comment(trimmed: &str) -> bool {
    trimmed.starts_with('#')
        || trimmed
            .get(..3)
            .is_some_and(|head| head.eq_ignore_ascii_case("rem"))
}

/// Accumulates script lines into statements.
#[derive(Debug, Default)]
pub struct StatementSplitter {
    buffer: String,
}

impl StatementSplitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one line. Returns a complete statement, without its trailing `;`,
    /// once the buffer ends with one.
    pub fn push_line(&mut self, line: &str) -> Option<String> {
        let line = line.trim();
        if is_comment(line) {
            return None;
        }

        self.buffer.push_str(line);
        if self.buffer.ends_with(';') {
            self.buffer.pop();
            return Some(std::mem::take(&mut self.buffer));
        }
        None
    }

    /// Text buffered after the last complete statement, if any.
    pub fn remainder(&self) -> Option<&str> {
        if self.buffer.is_empty() {
            None
        } else {
            Some(&self.buffer)
        }
    }
}

/// Split a whole script. Returns the complete statements and any
/// unterminated remainder.
pub fn split_statements(text: &str) -> (Vec<String>, Option<String>) {
    let mut splitter = StatementSplitter::new();
    let statements = text.lines().filter_map(|l| splitter.push_line(l)).collect();
    (statements, splitter.remainder().map(str::to_string))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comment_detection() {
        assert!(is_comment("REM setup"));
        assert!(is_comment("rem"));
        assert!(is_comment("Rem: x"));
        assert!(is_comment("# note"));
        assert!(!is_comment("-- not a comment here"));
        assert!(!is_comment("re"));
        assert!(!is_comment(""));
    }

    #[test]
    fn test_multiline_statement_joins_without_separator() {
        let (statements, rest) = split_statements("INSERT INTO t\n  VALUES (1);\n");
        assert_eq!(statements, vec!["INSERT INTO tVALUES (1)"]);
        assert!(rest.is_none());
    }

    #[test]
    fn test_comments_and_blank_lines_are_skipped() {
        let script = "REM create\n# table\n\nCREATE TABLE a (x INT);\nrem done\nDROP TABLE a;";
        let (statements, rest) = split_statements(script);
        assert_eq!(statements, vec!["CREATE TABLE a (x INT)", "DROP TABLE a"]);
        assert!(rest.is_none());
    }

    #[test]
    fn test_unterminated_remainder_is_returned() {
        let (statements, rest) = split_statements("SELECT 1;\nSELECT 2");
        assert_eq!(statements, vec!["SELECT 1"]);
        assert_eq!(rest.as_deref(), Some("SELECT 2"));
    }

    #[test]
    fn test_lone_semicolon_yields_empty_statement() {
        let mut splitter = StatementSplitter::new();
        assert_eq!(splitter.push_line("  ;  "), Some(String::new()));
        assert!(splitter.remainder().is_none());
    }
}
