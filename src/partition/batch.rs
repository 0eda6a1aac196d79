use crate::parsing::reads::Read;
use crate::partition::plan::PartitionError;

/// Smallest batch handed to a worker
pub const MIN_BATCH_SIZE: usize = 100;

/// Largest batch handed to a worker
pub const MAX_BATCH_SIZE: usize = 1000;

/// Chunk-size policy for splitting a partition into batches.
///
/// Aims for two batches per worker, clamped to
/// [`MIN_BATCH_SIZE`]..=[`MAX_BATCH_SIZE`] reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchPolicy {
    workers: usize,
}

impl BatchPolicy {
    /// Policy for a pool of `workers` threads (at least 1)
    pub fn for_workers(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Reads per batch for a partition of `partition_len` reads
    pub fn chunk_size(&self, partition_len: usize) -> usize {
        let desired = partition_len / (2 * self.workers);
        desired.clamp(MIN_BATCH_SIZE, MAX_BATCH_SIZE)
    }
}

/// A contiguous slice of a partition's reads.
#[derive(Debug, Clone, Copy)]
pub struct Batch<'a> {
    /// Position of this batch within the partition
    pub index: usize,
    pub reads: &'a [Read],
}

impl Batch<'_> {
    pub fn len(&self) -> usize {
        self.reads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reads.is_empty()
    }
}

/// Split reads into contiguous batches of at most `chunk_size` reads.
///
/// # Errors
///
/// Returns `PartitionError::IncompleteBatches` if the batches do not cover
/// every read exactly once.
///
/// # Panics
///
/// Panics if `chunk_size` is zero.
pub fn batchify(reads: &[Read], chunk_size: usize) -> Result<Vec<Batch<'_>>, PartitionError> {
    let batches: Vec<Batch<'_>> = reads
        .chunks(chunk_size)
        .enumerate()
        .map(|(index, reads)| Batch { index, reads })
        .collect();

    let covered: usize = batches.iter().map(Batch::len).sum();
    if covered != reads.len() {
        return Err(PartitionError::IncompleteBatches {
            covered,
            expected: reads.len(),
        });
    }
    Ok(batches)
}
