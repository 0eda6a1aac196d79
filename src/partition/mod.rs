//! Splitting a read file into partitions and a partition into batches.
//!
//! - [`PartitionPlan`]: divides `total` records into `n` contiguous,
//!   index-addressable ranges
//! - [`PartitionIndex`]: a partition index checked against its plan size
//! - [`BatchPolicy`] and [`batchify`]: chunk a partition's reads into batches
//!   for parallel matching
//!
//! A plan is a pure function of `(total, n)`, so the same file, partition
//! count and index always yield the same read range. Batches cover a
//! partition contiguously with no read dropped or repeated.

pub mod batch;
pub mod plan;

pub use batch::{batchify, Batch, BatchPolicy, MAX_BATCH_SIZE, MIN_BATCH_SIZE};
pub use plan::{PartitionError, PartitionIndex, PartitionPlan};
