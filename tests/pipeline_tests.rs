//! Library-level tests of the count-then-merge pipeline.

use std::fs;
use std::io::Write;
use std::path::Path;

use flate2::write::GzEncoder;
use flate2::Compression;
use tempfile::TempDir;

use mpra_count::aggregate::partition_output_path;
use mpra_count::parsing::counts::read_count_file;
use mpra_count::parsing::library::load_library;
use mpra_count::{
    merge_directory, BatchMatcher, MatchingConfig, MergeOptions, PartitionIndex, PartitionJob,
    RayonPool, SequentialPool,
};

fn fastq(reads: &[&str]) -> String {
    reads
        .iter()
        .enumerate()
        .map(|(i, seq)| format!("@read{i} extra\n{seq}\n+\n{}\n", "I".repeat(seq.len())))
        .collect()
}

fn write_gz(path: &Path, content: &str) {
    let mut encoder = GzEncoder::new(fs::File::create(path).unwrap(), Compression::default());
    encoder.write_all(content.as_bytes()).unwrap();
    encoder.finish().unwrap();
}

#[test]
fn test_gzip_partitions_merge_to_whole_counts() {
    let dir = TempDir::new().unwrap();
    let library = load_library("ID\tseq\nA\tACGT\nB\tTTTT\nC\tGGCC\n".as_bytes()).unwrap();
    let matcher = BatchMatcher::new(&library);

    let seqs: Vec<&str> = ["ACGT", "TTTTACGT", "GGCC", "AAAA", "acgt", "ACGTX"]
        .iter()
        .copied()
        .cycle()
        .take(997)
        .collect();
    let reads = dir.path().join("s1.fastq.gz");
    write_gz(&reads, &fastq(&seqs));

    let counts_dir = dir.path().join("counts");
    let pool = RayonPool::new(4).unwrap();
    let mut skipped = 0;
    for i in 0..5 {
        let partition = PartitionIndex::new(i, 5).unwrap();
        let output = partition_output_path(&counts_dir, &format!("s1_{i}"));
        let outcome = PartitionJob::new(&reads, partition, output)
            .run(&matcher, &pool)
            .unwrap();
        skipped += outcome.counts.summary.skipped;
    }
    // "ACGTX" holds a non-sequence byte
    assert_eq!(skipped, 166);

    let merged_dir = dir.path().join("merged");
    let report = merge_directory(&counts_dir, &merged_dir, &MergeOptions::default()).unwrap();
    assert!(report.is_success());
    assert_eq!(report.written, vec![merged_dir.join("s1.txt")]);

    let whole = PartitionJob::new(
        &reads,
        PartitionIndex::new(0, 1).unwrap(),
        dir.path().join("whole.txt"),
    )
    .run(&matcher, &SequentialPool)
    .unwrap();

    let merged = read_count_file(&merged_dir.join("s1.txt")).unwrap();
    assert_eq!(merged, whole.counts.table);
    assert_eq!(merged.get("A"), Some(333));
    assert_eq!(merged.get("B"), Some(166));
    assert_eq!(merged.get("C"), Some(166));
}

#[test]
fn test_matching_options_change_counts() {
    let dir = TempDir::new().unwrap();
    let library = load_library("ID\tseq\nfwd\tAACCG\n".as_bytes()).unwrap();
    let reads = dir.path().join("s1.fastq");
    // forward, reverse complement, lower case, one mismatch
    fs::write(&reads, fastq(&["TAACCGT", "CGGTT", "aaccg", "AACTG"])).unwrap();
    let partition = PartitionIndex::new(0, 1).unwrap();

    let count_with = |config: MatchingConfig| {
        let matcher = BatchMatcher::with_config(&library, config);
        PartitionJob::new(&reads, partition, dir.path().join("out.txt"))
            .run(&matcher, &SequentialPool)
            .unwrap()
            .counts
            .table
            .get("fwd")
            .unwrap()
    };

    assert_eq!(count_with(MatchingConfig::default()), 1);
    assert_eq!(
        count_with(MatchingConfig {
            reverse_complement: true,
            ..MatchingConfig::default()
        }),
        2
    );
    assert_eq!(
        count_with(MatchingConfig {
            ignore_case: true,
            ..MatchingConfig::default()
        }),
        2
    );
    assert_eq!(
        count_with(MatchingConfig {
            max_mismatches: 1,
            ..MatchingConfig::default()
        }),
        2
    );
}
