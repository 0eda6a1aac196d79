//! Matching reads against the reference library.
//!
//! - [`BatchMatcher`]: compiles the library once, then counts matching reads
//!   per reference for each batch
//! - [`MatchingConfig`]: the matching rule
//!
//! ## Matching Rule
//!
//! A read matches a reference when the reference pattern occurs in the read.
//! The rule is tuned by [`MatchingConfig`]:
//!
//! | Setting | Default | Effect |
//! |---------|---------|--------|
//! | `max_mismatches` | 0 | Substitutions allowed per window (Hamming distance) |
//! | `ignore_case` | false | Fold reads and patterns to upper case |
//! | `reverse_complement` | false | Also search the reverse-complement pattern |
//!
//! `N` is an ordinary symbol: it matches `N` and mismatches everything else.
//! A read counts once per matched reference, however many times or on
//! however many strands the pattern occurs. Reads that are empty or contain
//! non-nucleotide bytes are skipped.
//!
//! ## Example
//!
//! ```rust
//! use mpra_count::core::library::{ReferenceLibrary, ReferenceSequence};
//! use mpra_count::matching::BatchMatcher;
//! use mpra_count::partition::Batch;
//!
//! let mut library = ReferenceLibrary::new();
//! library.add(ReferenceSequence::new("A", "ACGT")).unwrap();
//! library.add(ReferenceSequence::new("B", "TTTT")).unwrap();
//!
//! let reads: Vec<Vec<u8>> = vec![b"ACGTACGT".to_vec(), b"TTTT".to_vec(), b"GGGG".to_vec()];
//! let matcher = BatchMatcher::new(&library);
//! let counts = matcher.match_batch(&Batch { index: 0, reads: &reads });
//!
//! assert_eq!(counts.get(0), 1);
//! assert_eq!(counts.get(1), 1);
//! ```

pub mod engine;

pub use engine::{reverse_complement, BatchMatcher, MatchingConfig};
