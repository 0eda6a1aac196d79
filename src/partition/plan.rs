use std::ops::Range;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PartitionError {
    #[error("Partition count must be at least 1")]
    NoPartitions,

    #[error("Partition index {index} out of range for {count} partitions (valid: 0..{count})")]
    IndexOutOfRange { index: i64, count: usize },

    #[error("Batches cover {covered} reads but the partition holds {expected}")]
    IncompleteBatches { covered: usize, expected: usize },
}

/// A partition index validated against a partition count.
///
/// Built before any input is read so an invalid request fails immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartitionIndex {
    index: usize,
    count: usize,
}

impl PartitionIndex {
    /// Validate `index` against `count` partitions
    ///
    /// # Errors
    ///
    /// Returns `PartitionError::NoPartitions` if `count` is zero, or
    /// `PartitionError::IndexOutOfRange` if `index` is negative or not below
    /// `count`.
    pub fn new(index: i64, count: usize) -> Result<Self, PartitionError> {
        if count == 0 {
            return Err(PartitionError::NoPartitions);
        }
        match usize::try_from(index) {
            Ok(i) if i < count => Ok(Self { index: i, count }),
            _ => Err(PartitionError::IndexOutOfRange { index, count }),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn count(&self) -> usize {
        self.count
    }
}

impl std::fmt::Display for PartitionIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.index, self.count)
    }
}

/// Even division of `total` records into `partitions` contiguous ranges.
///
/// The first `total % partitions` ranges hold one extra record. When there
/// are fewer records than partitions the trailing ranges are empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartitionPlan {
    total: u64,
    partitions: usize,
}

impl PartitionPlan {
    /// # Errors
    ///
    /// Returns `PartitionError::NoPartitions` if `partitions` is zero.
    pub fn new(total: u64, partitions: usize) -> Result<Self, PartitionError> {
        if partitions == 0 {
            return Err(PartitionError::NoPartitions);
        }
        Ok(Self { total, partitions })
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn partitions(&self) -> usize {
        self.partitions
    }

    /// Record range of one partition
    ///
    /// # Errors
    ///
    /// Returns `PartitionError::IndexOutOfRange` if `index` is not below the
    /// partition count.
    pub fn range(&self, index: usize) -> Result<Range<u64>, PartitionError> {
        if index >= self.partitions {
            return Err(PartitionError::IndexOutOfRange {
                index: i64::try_from(index).unwrap_or(i64::MAX),
                count: self.partitions,
            });
        }
        let n = self.partitions as u64;
        let i = index as u64;
        let base = self.total / n;
        let extra = self.total % n;
        let start = i * base + i.min(extra);
        let len = base + u64::from(i < extra);
        Ok(start..start + len)
    }

    /// Record range of a validated partition index
    ///
    /// # Errors
    ///
    /// Returns `PartitionError::IndexOutOfRange` if the index was validated
    /// against a different partition count.
    pub fn range_for(&self, index: PartitionIndex) -> Result<Range<u64>, PartitionError> {
        if index.count() != self.partitions {
            return Err(PartitionError::IndexOutOfRange {
                index: i64::try_from(index.index()).unwrap_or(i64::MAX),
                count: self.partitions,
            });
        }
        self.range(index.index())
    }

    /// All partition ranges in index order
    pub fn boundaries(&self) -> Vec<Range<u64>> {
        (0..self.partitions)
            .filter_map(|i| self.range(i).ok())
            .collect()
    }
}
