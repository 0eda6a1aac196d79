//! Merging partition count files into one count file per sample.
//!
//! Partition count files are named `<sample>_<partition><suffix>`. The
//! sample key is everything before the final `_`; the final token must end
//! in the partition number. Files sharing a key form a [`SampleGroup`],
//! whose members are summed row by row into `<sample><suffix>`.
//!
//! | File | Sample key | Partition |
//! |------|------------|-----------|
//! | `s1_p0.txt` | `s1` | 0 |
//! | `lib_A_rep2_13.txt` | `lib_A_rep2` | 13 |
//! | `s1.txt` | skipped: no separator | |
//! | `lib_A.txt` | skipped: `A` is not a partition | |
//!
//! Sample names may themselves contain `_`. Files whose final token is not a
//! partition number are reported as skipped rather than grouped under a
//! truncated sample name. Write merged output to a separate directory:
//! a merged `sample_1.txt` would otherwise look like partition 1 of
//! `sample`.
//!
//! Each group is merged on its own: a schema mismatch or unreadable file
//! fails that group only.

pub mod key;
pub mod merger;

pub use key::{parse_partition_file_name, partition_number, sample_key, KeyError};
pub use merger::{
    group_files, merge_directory, merge_group, merge_groups, sample_output_path, GroupFailure,
    MergeError, MergeOptions, MergeReport, PartitionFile, SampleGroup, SkippedFile,
    DEFAULT_SUFFIX,
};
