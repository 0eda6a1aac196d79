use std::collections::HashMap;

use serde::Serialize;
use thiserror::Error;

use crate::core::library::ReferenceLibrary;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CountError {
    #[error("Count tables have different lengths: expected {expected} IDs, found {found}")]
    LengthMismatch { expected: usize, found: usize },

    #[error("ID mismatch at row {row}: expected '{expected}', found '{found}'")]
    IdMismatch {
        row: usize,
        expected: String,
        found: String,
    },

    #[error("Count overflow for ID '{0}'")]
    Overflow(String),
}

/// One row of a count table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountEntry {
    pub id: String,
    pub count: u64,
}

/// Mapping from reference ID to count, in a fixed row order.
///
/// Tables built from a library are sorted by ID and hold every library ID,
/// zero-filled. Tables read back from disk keep the file's row order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CountTable {
    entries: Vec<CountEntry>,
}

impl CountTable {
    /// Table holding every library ID with a zero count, sorted by ID
    pub fn zeroed(library: &ReferenceLibrary) -> Self {
        let mut entries: Vec<CountEntry> = library
            .ids()
            .map(|id| CountEntry {
                id: id.to_string(),
                count: 0,
            })
            .collect();
        entries.sort_by(|a, b| a.id.cmp(&b.id));
        Self { entries }
    }

    /// Build a sorted table from dense per-reference counts.
    ///
    /// `counts[i]` is the count for the library entry at position `i`.
    ///
    /// # Panics
    ///
    /// Panics if `counts` is not exactly as long as the library.
    pub fn from_library_counts(library: &ReferenceLibrary, counts: &[u64]) -> Self {
        assert_eq!(
            counts.len(),
            library.len(),
            "dense counts must cover the whole library"
        );
        let mut entries: Vec<CountEntry> = library
            .iter()
            .zip(counts)
            .map(|(sequence, &count)| CountEntry {
                id: sequence.id.clone(),
                count,
            })
            .collect();
        entries.sort_by(|a, b| a.id.cmp(&b.id));
        Self { entries }
    }

    /// Build a table that keeps the given row order
    pub fn from_entries(entries: Vec<CountEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[CountEntry] {
        &self.entries
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.id.as_str())
    }

    /// Count for an ID, if present
    pub fn get(&self, id: &str) -> Option<u64> {
        self.entries.iter().find(|e| e.id == id).map(|e| e.count)
    }

    /// Sum of all counts
    pub fn total(&self) -> u64 {
        self.entries.iter().map(|e| e.count).sum()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check that `other` has the same IDs in the same order
    ///
    /// # Errors
    ///
    /// Returns the first difference found.
    pub fn check_same_ids(&self, other: &CountTable) -> Result<(), CountError> {
        if self.entries.len() != other.entries.len() {
            return Err(CountError::LengthMismatch {
                expected: self.entries.len(),
                found: other.entries.len(),
            });
        }
        for (row, (mine, theirs)) in self.entries.iter().zip(&other.entries).enumerate() {
            if mine.id != theirs.id {
                return Err(CountError::IdMismatch {
                    row,
                    expected: mine.id.clone(),
                    found: theirs.id.clone(),
                });
            }
        }
        Ok(())
    }

    /// Add `other` into this table element-wise, keeping this table's order
    ///
    /// # Errors
    ///
    /// Returns `CountError` if the ID columns differ or a sum overflows.
    /// The table is left unchanged on error.
    pub fn add_table(&mut self, other: &CountTable) -> Result<(), CountError> {
        self.check_same_ids(other)?;
        let sums = self
            .entries
            .iter()
            .zip(&other.entries)
            .map(|(mine, theirs)| {
                mine.count
                    .checked_add(theirs.count)
                    .ok_or_else(|| CountError::Overflow(mine.id.clone()))
            })
            .collect::<Result<Vec<u64>, _>>()?;
        for (entry, sum) in self.entries.iter_mut().zip(sums) {
            entry.count = sum;
        }
        Ok(())
    }
}

/// Sparse counts produced by matching one batch.
///
/// Keys are library positions; only references with at least one matching
/// read are present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchCounts {
    hits: HashMap<usize, u64>,

    /// Reads examined, including skipped ones
    pub reads: u64,

    /// Reads skipped as malformed
    pub skipped: u64,
}

impl BatchCounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one matching read for a library position
    pub fn record_hit(&mut self, index: usize) {
        *self.hits.entry(index).or_insert(0) += 1;
    }

    /// Count for a library position (zero when absent)
    pub fn get(&self, index: usize) -> u64 {
        self.hits.get(&index).copied().unwrap_or(0)
    }

    pub fn hits(&self) -> impl Iterator<Item = (usize, u64)> + '_ {
        self.hits.iter().map(|(&index, &count)| (index, count))
    }

    /// Total matches across all references
    pub fn matched(&self) -> u64 {
        self.hits.values().sum()
    }
}
