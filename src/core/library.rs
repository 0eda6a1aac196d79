use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A known short sequence to count in reads
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceSequence {
    /// Unique identifier, also the sort key for count output
    pub id: String,

    /// Sequence to search for in each read
    pub pattern: String,
}

impl ReferenceSequence {
    pub fn new(id: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            pattern: pattern.into(),
        }
    }
}

/// The fixed set of reference sequences for one run.
///
/// Built once, then shared read-only by every matching task. Entries keep
/// the order they were loaded in; callers address them by position
/// (`usize` index) in the hot loop and by ID everywhere else.
#[derive(Debug, Clone, Default)]
pub struct ReferenceLibrary {
    sequences: Vec<ReferenceSequence>,

    /// Index: ID -> position in `sequences`
    id_to_index: HashMap<String, usize>,
}

impl ReferenceLibrary {
    /// Create an empty library
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sequence, returning it back if its ID is already present
    ///
    /// # Errors
    ///
    /// Returns the rejected sequence when the ID is a duplicate.
    pub fn add(&mut self, sequence: ReferenceSequence) -> Result<usize, ReferenceSequence> {
        if self.id_to_index.contains_key(&sequence.id) {
            return Err(sequence);
        }
        let index = self.sequences.len();
        self.id_to_index.insert(sequence.id.clone(), index);
        self.sequences.push(sequence);
        Ok(index)
    }

    /// Get a sequence by position
    pub fn get(&self, index: usize) -> Option<&ReferenceSequence> {
        self.sequences.get(index)
    }

    /// Look up a sequence position by ID
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.id_to_index.get(id).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ReferenceSequence> {
        self.sequences.iter()
    }

    /// All IDs in load order
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.sequences.iter().map(|s| s.id.as_str())
    }

    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }
}

impl<'a> IntoIterator for &'a ReferenceLibrary {
    type Item = &'a ReferenceSequence;
    type IntoIter = std::slice::Iter<'a, ReferenceSequence>;

    fn into_iter(self) -> Self::IntoIter {
        self.sequences.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_lookup() {
        let mut library = ReferenceLibrary::new();
        assert!(library.is_empty());

        let a = library.add(ReferenceSequence::new("A", "ACGT")).unwrap();
        let b = library.add(ReferenceSequence::new("B", "TTTT")).unwrap();

        assert_eq!(library.len(), 2);
        assert_eq!(library.index_of("A"), Some(a));
        assert_eq!(library.index_of("B"), Some(b));
        assert_eq!(library.get(b).unwrap().pattern, "TTTT");
        assert!(library.index_of("C").is_none());
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let mut library = ReferenceLibrary::new();
        library.add(ReferenceSequence::new("A", "ACGT")).unwrap();

        let rejected = library.add(ReferenceSequence::new("A", "GGGG")).unwrap_err();
        assert_eq!(rejected.pattern, "GGGG");
        assert_eq!(library.len(), 1);
        assert_eq!(library.get(0).unwrap().pattern, "ACGT");
    }

    #[test]
    fn test_ids_keep_load_order() {
        let mut library = ReferenceLibrary::new();
        for id in ["z", "a", "m"] {
            library.add(ReferenceSequence::new(id, "AC")).unwrap();
        }
        let ids: Vec<&str> = library.ids().collect();
        assert_eq!(ids, vec!["z", "a", "m"]);
    }
}
