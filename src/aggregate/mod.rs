//! Partition-level counting.
//!
//! - [`WorkerPool`]: parallel-map interface over typed tasks, with
//!   [`RayonPool`] and [`SequentialPool`] implementations
//! - [`PartitionAggregator`]: dispatches every batch of a partition to a pool
//!   and sums the per-batch counts on the calling thread
//! - [`PartitionJob`]: reads one partition of a read file, aggregates it, and
//!   writes the partition count file
//!
//! Each batch task owns its own [`BatchCounts`](crate::core::counts::BatchCounts);
//! nothing is shared for writing between tasks. Summation is associative and
//! commutative, so neither batch size nor completion order affects the
//! totals, and output rows are ordered by reference ID afterwards.

pub mod aggregator;
pub mod job;
pub mod pool;

pub use aggregator::{AggregateError, PartitionAggregator, PartitionCounts, PartitionSummary};
pub use job::{partition_output_path, CountPartitionError, PartitionJob, PartitionOutcome};
pub use pool::{RayonPool, SequentialPool, WorkerPool};
