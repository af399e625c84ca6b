//! Row values as seen by the verification engine.
//!
//! Every backend renders cells to text before handing rows to the engine, so
//! comparisons are plain string comparisons. SQL NULL stays distinguishable
//! (`None`) until a comparison or a golden-file line needs its text form,
//! which is the empty string.

/// One result row, cells in result-set order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    values: Vec<Option<String>>,
}

impl Row {
    /// Create a row from rendered cell values (`None` is SQL NULL).
    pub fn new(values: Vec<Option<String>>) -> Self {
        Self { values }
    }

    /// Number of cells.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when the row has no cells.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Raw cell access. Outer `None` means the index is out of range.
    pub fn get(&self, idx: usize) -> Option<Option<&str>> {
        self.values.get(idx).map(|v| v.as_deref())
    }

    /// Cell text with NULL rendered as the empty string.
    pub fn text(&self, idx: usize) -> Option<&str> {
        self.get(idx).map(|v| v.unwrap_or(""))
    }

    /// All cells.
    pub fn values(&self) -> &[Option<String>] {
        &self.values
    }

    /// Render the row in result-file format: every cell followed by `|`,
    /// including the last one.
    pub fn to_result_line(&self) -> String {
        let mut line = String::new();
        for value in &self.values {
            line.push_str(value.as_deref().unwrap_or(""));
            line.push('|');
        }
        line
    }
}

impl From<Vec<Option<String>>> for Row {
    fn from(values: Vec<Option<String>>) -> Self {
        Self::new(values)
    }
}

/// A fully materialized query result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryResult {
    /// Column names in result-set order.
    pub columns: Vec<String>,
    /// Rows in the order the engine returned them.
    pub rows: Vec<Row>,
}

impl QueryResult {
    /// Rows as (column name, value) records.
    pub fn records(&self) -> Vec<Vec<(&str, Option<&str>)>> {
        self.rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .enumerate()
                    .map(|(idx, name)| (name.as_str(), row.get(idx).flatten()))
                    .collect()
            })
            .collect()
    }
}
