//! Core data types for counting reference sequences.
//!
//! - [`ReferenceSequence`](library::ReferenceSequence): one library entry, an
//!   ID and the pattern to look for in reads
//! - [`ReferenceLibrary`](library::ReferenceLibrary): the ordered, ID-unique
//!   set of entries loaded once per job
//! - [`CountTable`](counts::CountTable): one row per library entry, ordered
//!   by ID, as written to count files
//! - [`BatchCounts`](counts::BatchCounts): sparse per-batch tallies owned by
//!   a single worker

pub mod counts;
pub mod library;
