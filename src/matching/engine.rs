use memchr::memmem::Finder;

use crate::core::counts::BatchCounts;
use crate::core::library::ReferenceLibrary;
use crate::partition::Batch;
use crate::utils::validation::is_valid_sequence;

/// Configuration for the matching rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
pub struct MatchingConfig {
    /// Maximum substitutions allowed between a pattern and a read window.
    /// Zero means exact substring matching.
    pub max_mismatches: u32,
    /// Compare reads and patterns case-insensitively
    pub ignore_case: bool,
    /// Also search for the reverse complement of each pattern
    pub reverse_complement: bool,
}

/// Reverse complement of a nucleotide sequence, preserving case.
/// `N` (and any other byte) maps to itself.
#[must_use]
pub fn reverse_complement(seq: &[u8]) -> Vec<u8> {
    seq.iter()
        .rev()
        .map(|&b| match b {
            b'A' => b'T',
            b'T' => b'A',
            b'C' => b'G',
            b'G' => b'C',
            b'a' => b't',
            b't' => b'a',
            b'c' => b'g',
            b'g' => b'c',
            other => other,
        })
        .collect()
}

/// Whether `pattern` occurs in `read` with at most `max_mismatches`
/// substitutions in some window
fn contains_within(read: &[u8], pattern: &[u8], max_mismatches: u32) -> bool {
    if pattern.len() > read.len() {
        return false;
    }
    read.windows(pattern.len()).any(|window| {
        let mut mismatches = 0;
        for (a, b) in window.iter().zip(pattern) {
            if a != b {
                mismatches += 1;
                if mismatches > max_mismatches {
                    return false;
                }
            }
        }
        true
    })
}

/// One strand of a pattern, prepared for searching
struct Strand {
    seq: Vec<u8>,
    finder: Finder<'static>,
}

impl Strand {
    fn new(seq: Vec<u8>) -> Self {
        let finder = Finder::new(&seq).into_owned();
        Self { seq, finder }
    }

    fn found_in(&self, read: &[u8], max_mismatches: u32) -> bool {
        if max_mismatches == 0 {
            self.finder.find(read).is_some()
        } else {
            contains_within(read, &self.seq, max_mismatches)
        }
    }
}

struct CompiledPattern {
    forward: Strand,
    reverse: Option<Strand>,
}

/// Matches batches of reads against a reference library.
///
/// Patterns are compiled once per run. Matching a batch reads only the
/// matcher and the batch, so batches can run concurrently in any order.
pub struct BatchMatcher<'a> {
    library: &'a ReferenceLibrary,
    config: MatchingConfig,
    patterns: Vec<CompiledPattern>,
}

impl<'a> BatchMatcher<'a> {
    /// Create a matcher using exact, case-sensitive, forward-strand matching
    pub fn new(library: &'a ReferenceLibrary) -> Self {
        Self::with_config(library, MatchingConfig::default())
    }

    /// Create a matcher with a custom matching rule
    pub fn with_config(library: &'a ReferenceLibrary, config: MatchingConfig) -> Self {
        let patterns = library
            .iter()
            .map(|sequence| {
                let mut seq = sequence.pattern.as_bytes().to_vec();
                if config.ignore_case {
                    seq.make_ascii_uppercase();
                }
                let reverse = config
                    .reverse_complement
                    .then(|| Strand::new(reverse_complement(&seq)));
                CompiledPattern {
                    forward: Strand::new(seq),
                    reverse,
                }
            })
            .collect();

        Self {
            library,
            config,
            patterns,
        }
    }

    pub fn library(&self) -> &'a ReferenceLibrary {
        self.library
    }

    pub fn config(&self) -> &MatchingConfig {
        &self.config
    }

    /// Library positions matched by one read.
    ///
    /// Returns `None` for a malformed read (empty, or containing non-nucleotide
    /// bytes). Each matched position appears once no matter how often, or on
    /// how many strands, the pattern occurs.
    pub fn match_read(&self, read: &[u8]) -> Option<Vec<usize>> {
        let mut hits = Vec::new();
        let mut scratch = Vec::new();
        let well_formed = self.match_read_into(read, &mut scratch, &mut hits);
        well_formed.then_some(hits)
    }

    fn match_read_into(&self, read: &[u8], scratch: &mut Vec<u8>, hits: &mut Vec<usize>) -> bool {
        hits.clear();
        if !is_valid_sequence(read) {
            return false;
        }

        let read = if self.config.ignore_case {
            scratch.clear();
            scratch.extend(read.iter().map(u8::to_ascii_uppercase));
            scratch.as_slice()
        } else {
            read
        };

        let k = self.config.max_mismatches;
        for (index, pattern) in self.patterns.iter().enumerate() {
            let matched = pattern.forward.found_in(read, k)
                || pattern
                    .reverse
                    .as_ref()
                    .is_some_and(|strand| strand.found_in(read, k));
            if matched {
                hits.push(index);
            }
        }
        true
    }

    /// Count matching reads per reference for one batch.
    ///
    /// Only references with at least one matching read appear in the
    /// result. Malformed reads are tallied in `skipped` and match nothing.
    pub fn match_batch(&self, batch: &Batch<'_>) -> BatchCounts {
        let mut counts = BatchCounts::new();
        let mut scratch = Vec::new();
        let mut hits = Vec::new();

        for read in batch.reads {
            counts.reads += 1;
            if !self.match_read_into(read, &mut scratch, &mut hits) {
                counts.skipped += 1;
                continue;
            }
            for &index in &hits {
                counts.record_hit(index);
            }
        }

        counts
    }
}
