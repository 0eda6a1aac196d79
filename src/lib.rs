//! # mpra-count
//!
//! A library for counting known reference sequences in sequencing reads.
//!
//! Massively parallel reporter assays produce read files in which each read
//! should carry one of a known set of sequences (barcodes, oligos, tiles).
//! `mpra-count` counts, for every sequence in a reference library, how many
//! reads contain it.
//!
//! Large read files are split into contiguous partitions that are counted
//! independently, for example as cluster array jobs, and the partition count
//! files are summed into one count file per sample. Within a partition, reads
//! are cut into batches that are matched in parallel and reduced on the
//! calling thread.
//!
//! ## Features
//!
//! - **Partition additivity**: Summing every partition's counts gives the
//!   counts of the whole file, for any partition count
//! - **Deterministic totals**: Thread count, batch size, and completion order
//!   never change the output
//! - **Configurable matching**: Exact substring matching by default, with
//!   optional mismatches, case folding, and reverse complement
//! - **Failure isolation**: A bad sample group fails alone during merging
//!
//! ## Example
//!
//! ```rust,no_run
//! use mpra_count::{BatchMatcher, PartitionJob, PartitionIndex, RayonPool};
//! use mpra_count::parsing::library::load_library_file;
//! use std::path::Path;
//!
//! let library = load_library_file(Path::new("library.tsv")).unwrap();
//! let matcher = BatchMatcher::new(&library);
//! let pool = RayonPool::new(0).unwrap();
//!
//! let partition = PartitionIndex::new(0, 4).unwrap();
//! let job = PartitionJob::new("sample.fastq", partition, "counts/sample_0.txt");
//! let outcome = job.run(&matcher, &pool).unwrap();
//! println!("{:.2}% of reads matched", outcome.counts.summary.percent_aligned);
//! ```
//!
//! ## Modules
//!
//! - [`core`]: Reference library and count table types
//! - [`parsing`]: Library, read, and count file formats
//! - [`partition`]: Partition boundaries and batching
//! - [`matching`]: Per-batch read matching
//! - [`aggregate`]: Worker pools and partition-level aggregation
//! - [`merge`]: Summing partition count files per sample
//! - [`cli`]: Command-line interface implementation

pub mod aggregate;
pub mod cli;
pub mod core;
pub mod matching;
pub mod merge;
pub mod parsing;
pub mod partition;
pub mod utils;

// Re-export commonly used types for convenience
pub use aggregate::{
    PartitionAggregator, PartitionJob, PartitionSummary, RayonPool, SequentialPool, WorkerPool,
};
pub use core::counts::{BatchCounts, CountEntry, CountTable};
pub use core::library::{ReferenceLibrary, ReferenceSequence};
pub use matching::{BatchMatcher, MatchingConfig};
pub use merge::{merge_directory, MergeOptions, MergeReport};
pub use partition::{PartitionIndex, PartitionPlan};
