//! GdpTable - insertion-ordered country records keyed by country code.

use crate::TableRow;
use ahash::RandomState;
use hashbrown::HashMap;

/// The GDP dataset, keyed by country code.
///
/// Entries keep their insertion order (= file order) so that downstream
/// first-occurrence-wins tie-breaking is well defined. Inserting an exact
/// duplicate of an existing key replaces the stored record in place; keys
/// that differ only in casing coexist as distinct entries.
///
/// The loader upper-cases keys before inserting, so a loaded table only ever
/// holds upper-case keys. Tables built directly (in tests, or by callers
/// bringing their own data) may carry arbitrary casing, which the table
/// preserves.
#[derive(Debug, Clone, Default)]
pub struct GdpTable {
    /// Records in insertion order.
    entries: Vec<(String, TableRow)>,

    /// Maps exact key to its position in `entries`.
    index: HashMap<String, usize, RandomState>,
}

impl GdpTable {
    /// Creates a new empty table.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::with_hasher(RandomState::new()),
        }
    }

    /// Inserts a record under `code`, replacing any record already stored
    /// under the exact same key.
    pub fn insert(&mut self, code: impl Into<String>, row: TableRow) {
        let code = code.into();
        match self.index.get(&code) {
            Some(&pos) => self.entries[pos].1 = row,
            None => {
                self.index.insert(code.clone(), self.entries.len());
                self.entries.push((code, row));
            }
        }
    }

    /// Looks up a record by exact key.
    pub fn get(&self, code: &str) -> Option<&TableRow> {
        self.index.get(code).map(|&pos| &self.entries[pos].1)
    }

    /// Iterates over (code, record) in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &TableRow)> {
        self.entries.iter().map(|(code, row)| (code.as_str(), row))
    }

    /// Iterates over the keys in insertion order.
    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(code, _)| code.as_str())
    }

    /// Returns the number of records.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the table has no records.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
