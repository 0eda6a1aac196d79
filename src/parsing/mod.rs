//! Readers and writers for the files mpra-count consumes and produces.
//!
//! | File | Format | Module |
//! |------|--------|--------|
//! | Reference library | TSV, header `ID` `seq` | [`library`] |
//! | Reads | 4-line records, sequence on line 2, optional `.gz` | [`reads`] |
//! | Count file | TSV, header `ID` `count`, rows sorted by ID | [`counts`] |
//!
//! ## Example
//!
//! ```rust,no_run
//! use mpra_count::parsing::library::load_library_file;
//! use mpra_count::parsing::reads::{count_records, read_range};
//! use std::path::Path;
//!
//! let library = load_library_file(Path::new("library.tsv")).unwrap();
//! let total = count_records(Path::new("sample.fastq")).unwrap();
//! let reads = read_range(Path::new("sample.fastq"), 0..total.min(100)).unwrap();
//! println!("{} patterns, {} reads", library.len(), reads.len());
//! ```

pub mod counts;
pub mod library;
pub mod reads;
