use std::path::{Path, PathBuf};
use std::time::Instant;

use thiserror::Error;
use tracing::info;

use crate::aggregate::aggregator::{AggregateError, PartitionAggregator, PartitionCounts};
use crate::aggregate::pool::WorkerPool;
use crate::matching::BatchMatcher;
use crate::parsing::counts::{write_count_file, CountFileError};
use crate::parsing::reads::{count_records, read_range, ReadFileError};
use crate::partition::{PartitionError, PartitionIndex, PartitionPlan};

/// Extension of every count file
pub const COUNT_FILE_EXTENSION: &str = "txt";

#[derive(Error, Debug)]
pub enum CountPartitionError {
    #[error("Reading partition input: {0}")]
    Read(#[from] ReadFileError),

    #[error("Partitioning input: {0}")]
    Partition(#[from] PartitionError),

    #[error("Matching partition: {0}")]
    Aggregate(#[from] AggregateError),

    #[error("Writing partition counts: {0}")]
    Write(#[from] CountFileError),
}

/// Path of the count file for an output prefix: `<dir>/<prefix>.txt`
pub fn partition_output_path(output_dir: &Path, prefix: &str) -> PathBuf {
    output_dir.join(format!("{prefix}.{COUNT_FILE_EXTENSION}"))
}

/// Count one partition of one read file and persist the table.
#[derive(Debug, Clone)]
pub struct PartitionJob {
    pub input: PathBuf,
    pub partition: PartitionIndex,
    /// Destination count file
    pub output: PathBuf,
}

/// Result of a finished partition job
#[derive(Debug, Clone)]
pub struct PartitionOutcome {
    pub output: PathBuf,
    pub counts: PartitionCounts,
}

impl PartitionJob {
    pub fn new(input: impl Into<PathBuf>, partition: PartitionIndex, output: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            partition,
            output: output.into(),
        }
    }

    /// Load the partition's reads, count them, and write the count file.
    ///
    /// The output file is written atomically and only after every batch has
    /// been matched.
    ///
    /// # Errors
    ///
    /// Returns `CountPartitionError` naming the failing stage. No output file
    /// is created on error.
    pub fn run<P: WorkerPool>(
        &self,
        matcher: &BatchMatcher<'_>,
        pool: &P,
    ) -> Result<PartitionOutcome, CountPartitionError> {
        let start = Instant::now();
        let total = count_records(&self.input)?;
        let plan = PartitionPlan::new(total, self.partition.count())?;
        let range = plan.range_for(self.partition)?;
        let reads = read_range(&self.input, range.clone())?;
        info!(
            "Read partition {} of {} ({} of {total} records, {}..{}) in {:.2?}",
            self.partition.index(),
            self.input.display(),
            reads.len(),
            range.start,
            range.end,
            start.elapsed()
        );

        let start = Instant::now();
        let counts = PartitionAggregator::new(matcher, pool).aggregate(&reads)?;
        info!("Matched {} reads in {:.2?}", reads.len(), start.elapsed());

        write_count_file(&self.output, &counts.table)?;
        info!("Wrote {}", self.output.display());

        Ok(PartitionOutcome {
            output: self.output.clone(),
            counts,
        })
    }
}
