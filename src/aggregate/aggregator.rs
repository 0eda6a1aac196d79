use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::aggregate::pool::WorkerPool;
use crate::core::counts::{BatchCounts, CountTable};
use crate::matching::BatchMatcher;
use crate::parsing::reads::{Read, RECORD_PERIOD};
use crate::partition::{batchify, BatchPolicy, PartitionError};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AggregateError {
    #[error(transparent)]
    Partition(#[from] PartitionError),

    #[error("Count overflow for reference '{0}'")]
    CountOverflow(String),
}

/// Reporting statistics for one partition
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PartitionSummary {
    /// Sum of all reference counts
    pub matched: u64,
    /// Read records in the partition
    pub records: u64,
    /// Input rows in the partition (`records * RECORD_PERIOD`)
    pub rows: u64,
    /// Reads skipped as malformed (included in `records`)
    pub skipped: u64,
    /// `matched / (rows / RECORD_PERIOD) * 100`
    pub percent_aligned: f64,
}

impl PartitionSummary {
    fn new(matched: u64, records: u64, skipped: u64) -> Self {
        let rows = records * RECORD_PERIOD;
        #[allow(clippy::cast_precision_loss)] // Reporting only
        let percent_aligned = if records == 0 {
            0.0
        } else {
            matched as f64 / (rows as f64 / RECORD_PERIOD as f64) * 100.0
        };
        Self {
            matched,
            records,
            rows,
            skipped,
            percent_aligned,
        }
    }
}

/// Count table and summary for one partition
#[derive(Debug, Clone, PartialEq)]
pub struct PartitionCounts {
    /// Every library ID, sorted by ID, zero-filled
    pub table: CountTable,
    pub summary: PartitionSummary,
}

/// Runs batch matching for a whole partition on a worker pool and reduces
/// the per-batch results into one count table.
pub struct PartitionAggregator<'m, 'a, P> {
    matcher: &'m BatchMatcher<'a>,
    pool: &'m P,
}

impl<'m, 'a, P: WorkerPool> PartitionAggregator<'m, 'a, P> {
    pub fn new(matcher: &'m BatchMatcher<'a>, pool: &'m P) -> Self {
        Self { matcher, pool }
    }

    /// Count a partition's reads.
    ///
    /// Blocks until every batch is matched. Batches are merged by summing
    /// per-reference counts on the calling thread, so the result does not
    /// depend on batch size or completion order.
    ///
    /// # Errors
    ///
    /// Returns `AggregateError` if any batch fails; no partial table is
    /// produced.
    pub fn aggregate(&self, reads: &[Read]) -> Result<PartitionCounts, AggregateError> {
        let policy = BatchPolicy::for_workers(self.pool.workers());
        let chunk_size = policy.chunk_size(reads.len());
        let batches = batchify(reads, chunk_size)?;
        debug!(
            "Dispatching {} batches of up to {chunk_size} reads to {} workers",
            batches.len(),
            policy.workers()
        );

        let matcher = self.matcher;
        let results = self
            .pool
            .try_map(batches, |batch| {
                Ok::<_, AggregateError>(matcher.match_batch(&batch))
            })?;

        self.reduce(&results)
    }

    fn reduce(&self, results: &[BatchCounts]) -> Result<PartitionCounts, AggregateError> {
        let library = self.matcher.library();
        let mut counts = vec![0_u64; library.len()];
        let mut records = 0_u64;
        let mut skipped = 0_u64;

        for batch in results {
            records += batch.reads;
            skipped += batch.skipped;
            for (index, hits) in batch.hits() {
                counts[index] = counts[index].checked_add(hits).ok_or_else(|| {
                    let id = library.get(index).map(|s| s.id.clone()).unwrap_or_default();
                    AggregateError::CountOverflow(id)
                })?;
            }
        }

        let table = CountTable::from_library_counts(library, &counts);
        let summary = PartitionSummary::new(table.total(), records, skipped);
        Ok(PartitionCounts { table, summary })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::pool::{RayonPool, SequentialPool};
    use crate::core::library::{ReferenceLibrary, ReferenceSequence};
    use crate::matching::MatchingConfig;

    /// Runs tasks back to front on the calling thread
    struct ReversePool {
        workers: usize,
    }

    impl WorkerPool for ReversePool {
        fn workers(&self) -> usize {
            self.workers
        }

        fn try_map<T, R, E, F>(&self, tasks: Vec<T>, f: F) -> Result<Vec<R>, E>
        where
            T: Send,
            R: Send,
            E: Send,
            F: Fn(T) -> Result<R, E> + Sync + Send,
        {
            let mut out = tasks.into_iter().rev().map(f).collect::<Result<Vec<R>, E>>()?;
            out.reverse();
            Ok(out)
        }
    }

    fn library() -> ReferenceLibrary {
        let mut library = ReferenceLibrary::new();
        for (id, pattern) in [("C", "GGGG"), ("A", "ACGT"), ("B", "TTTT"), ("D", "CCCCC")] {
            library.add(ReferenceSequence::new(id, pattern)).unwrap();
        }
        library
    }

    /// Deterministic mix of matching, non-matching and malformed reads
    fn reads(n: usize) -> Vec<Read> {
        let kinds = ["ACGTACGT", "TTTTA", "GGGGTTTT", "CATCAT", "ACNGT", "AC*GT"];
        (0..n)
            .map(|i| kinds[(i * 7 + i / 3) % kinds.len()].as_bytes().to_vec())
            .collect()
    }

    #[test]
    fn test_scenario_counts() {
        let mut library = ReferenceLibrary::new();
        library.add(ReferenceSequence::new("A", "ACGT")).unwrap();
        library.add(ReferenceSequence::new("B", "TTTT")).unwrap();
        let matcher = BatchMatcher::new(&library);
        let reads: Vec<Read> = ["ACGTACGT", "TTTT", "GGGG", "ACGT"]
            .iter()
            .map(|s| s.as_bytes().to_vec())
            .collect();

        let result = PartitionAggregator::new(&matcher, &SequentialPool)
            .aggregate(&reads)
            .unwrap();
        assert_eq!(result.table.get("A"), Some(2));
        assert_eq!(result.table.get("B"), Some(1));
        assert_eq!(result.summary.matched, 3);
        assert_eq!(result.summary.records, 4);
        assert_eq!(result.summary.rows, 16);
        assert!((result.summary.percent_aligned - 75.0).abs() < 1e-9);
    }

    #[test]
    fn test_output_holds_every_library_id() {
        let library = library();
        let matcher = BatchMatcher::new(&library);
        let reads: Vec<Read> = vec![b"ACGT".to_vec()];

        let result = PartitionAggregator::new(&matcher, &SequentialPool)
            .aggregate(&reads)
            .unwrap();
        let ids: Vec<&str> = result.table.ids().collect();
        assert_eq!(ids, vec!["A", "B", "C", "D"]);
        assert_eq!(result.table.get("D"), Some(0));
    }

    #[test]
    fn test_every_read_tallied_once_across_batches() {
        let library = library();
        let matcher = BatchMatcher::new(&library);
        let reads = reads(2_345);
        let pool = RayonPool::new(4).unwrap();
        let result = PartitionAggregator::new(&matcher, &pool)
            .aggregate(&reads)
            .unwrap();
        assert_eq!(result.summary.records, 2_345);
        assert_eq!(result.summary.rows, 2_345 * RECORD_PERIOD);
    }

    #[test]
    fn test_empty_partition() {
        let library = library();
        let matcher = BatchMatcher::new(&library);
        let result = PartitionAggregator::new(&matcher, &SequentialPool)
            .aggregate(&[])
            .unwrap();
        assert_eq!(result.table.len(), 4);
        assert_eq!(result.table.total(), 0);
        assert_eq!(result.summary.percent_aligned, 0.0);
    }

    #[test]
    fn test_independent_of_batch_size_and_order() {
        let library = library();
        let matcher = BatchMatcher::new(&library);
        let reads = reads(5_000);

        let expected = PartitionAggregator::new(&matcher, &SequentialPool)
            .aggregate(&reads)
            .unwrap();
        assert!(expected.table.total() > 0);
        assert!(expected.summary.skipped > 0);

        // Worker counts change the chunk size: 1000, 312 and 100 reads
        for workers in [1, 8, 64] {
            let reversed = PartitionAggregator::new(&matcher, &ReversePool { workers })
                .aggregate(&reads)
                .unwrap();
            assert_eq!(reversed, expected, "reverse order, {workers} workers");
        }

        for threads in [1, 3, 8] {
            let pool = RayonPool::new(threads).unwrap();
            let parallel = PartitionAggregator::new(&matcher, &pool)
                .aggregate(&reads)
                .unwrap();
            assert_eq!(parallel, expected, "rayon, {threads} threads");
        }
    }

    #[test]
    fn test_fuzzy_matching_flows_through() {
        let library = library();
        let config = MatchingConfig {
            max_mismatches: 1,
            ..MatchingConfig::default()
        };
        let matcher = BatchMatcher::with_config(&library, config);
        let reads: Vec<Read> = vec![b"AAGT".to_vec()];
        let result = PartitionAggregator::new(&matcher, &SequentialPool)
            .aggregate(&reads)
            .unwrap();
        assert_eq!(result.table.get("A"), Some(1));
    }
}
