//! TableRow - a single delimited record addressable by column name.

use std::sync::Arc;

/// A single record from a delimited file.
///
/// Values are stored by position; the header is shared across all rows of a
/// table. Year columns in the GDP dataset are looked up by name through
/// [`TableRow::get`] with the year string as the column name.
#[derive(Debug, Clone)]
pub struct TableRow {
    /// Field values indexed by position.
    values: Vec<String>,

    /// Reference to the header (shared across all rows in a table).
    header: Arc<Vec<String>>,
}

impl TableRow {
    /// Creates a new row.
    pub fn new(values: Vec<String>, header: Arc<Vec<String>>) -> Self {
        Self { values, header }
    }

    /// Returns the number of fields.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if the row has no fields.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Gets a value by column name.
    ///
    /// Returns `None` when the column is absent from the header, which is
    /// how a request for a year outside the dataset's coverage shows up.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.header
            .iter()
            .position(|c| c == column)
            .and_then(|idx| self.values.get(idx))
            .map(|s| s.as_str())
    }

    /// Gets a value by field index.
    pub fn get_by_index(&self, index: usize) -> Option<&str> {
        self.values.get(index).map(|s| s.as_str())
    }

    /// Returns the header column names.
    pub fn header(&self) -> &[String] {
        &self.header
    }
}
