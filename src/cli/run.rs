//! Run command - count every partition of every read file, then merge.
//!
//! Runs the whole counting stage in one process: each read file in the input
//! directory is split into `--partitions` partitions, each partition is
//! counted into `<work-dir>/counts/<base>_<index>.txt`, and the partition
//! files are merged into `<work-dir>/merged/<base>.txt`. Every partition
//! finishes before merging starts. Only the files written by this run are
//! merged, so leftovers from an earlier run with more partitions are never
//! added in.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;
use clap::Args;
use tracing::info;

use crate::aggregate::{partition_output_path, PartitionJob, RayonPool, SequentialPool, WorkerPool};
use crate::cli::merge::{check_report, print_report};
use crate::cli::{print_summary, MatchArgs, OutputFormat};
use crate::matching::BatchMatcher;
use crate::merge::{merge_groups, MergeOptions, PartitionFile, SampleGroup};
use crate::parsing::library::load_library_file;
use crate::parsing::reads::read_file_base_name;
use crate::partition::PartitionIndex;

/// Default read file suffixes
const DEFAULT_READ_SUFFIXES: [&str; 4] = [".fastq", ".fq", ".fastq.gz", ".fq.gz"];

#[derive(Args)]
pub struct RunArgs {
    /// Directory holding read files (e.g. merged paired-end reads)
    #[arg(required = true)]
    pub directory: PathBuf,

    /// Reference library: tab-separated `ID` and `seq` columns with header
    #[arg(required = true)]
    pub reference: PathBuf,

    /// Partitions per read file
    #[arg(short = 'n', long, default_value = "1")]
    pub partitions: usize,

    /// Directory for `counts/` and `merged/` outputs
    #[arg(short, long, default_value = "mpra_count_out")]
    pub work_dir: PathBuf,

    /// Read file suffixes to pick up (repeatable)
    #[arg(long = "read-suffix", value_name = "SUFFIX")]
    pub read_suffixes: Vec<String>,

    #[command(flatten)]
    pub matching: MatchArgs,
}

/// Read files in `dir` ending in one of `suffixes`, sorted by path
///
/// # Errors
///
/// Returns an error if the directory cannot be listed.
pub fn find_read_files(dir: &Path, suffixes: &[String]) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("Failed to list read directory {}", dir.display()))?
    {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if suffixes.iter().any(|s| name.ends_with(s.as_str())) {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}

/// Execute the run command
///
/// # Errors
///
/// Returns an error naming the failing stage and path; counting stops at the
/// first failing partition.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: RunArgs, format: OutputFormat) -> anyhow::Result<()> {
    // Fails on a zero partition count before any work
    PartitionIndex::new(0, args.partitions).context("Invalid partition request")?;

    let suffixes: Vec<String> = if args.read_suffixes.is_empty() {
        DEFAULT_READ_SUFFIXES.iter().map(|s| (*s).to_string()).collect()
    } else {
        args.read_suffixes.clone()
    };
    let inputs = find_read_files(&args.directory, &suffixes)?;
    if inputs.is_empty() {
        anyhow::bail!(
            "No read files ending in {} found in {}",
            suffixes.join(", "),
            args.directory.display()
        );
    }

    let mut seen = HashSet::new();
    for input in &inputs {
        let base = read_file_base_name(input)
            .with_context(|| format!("Cannot derive a sample name from {}", input.display()))?;
        if !seen.insert(base) {
            anyhow::bail!("Two read files share the sample name '{base}'");
        }
    }

    let start = Instant::now();
    let library = load_library_file(&args.reference).with_context(|| {
        format!(
            "Failed to load reference library {}",
            args.reference.display()
        )
    })?;
    info!(
        "Loaded {} reference sequences in {:.2?}",
        library.len(),
        start.elapsed()
    );
    let matcher = BatchMatcher::with_config(&library, args.matching.matching_config());

    let counts_dir = args.work_dir.join("counts");
    let groups = if args.matching.threads == 1 {
        count_all(&args, &inputs, &counts_dir, &matcher, &SequentialPool, format)?
    } else {
        let pool = RayonPool::new(args.matching.threads)?;
        count_all(&args, &inputs, &counts_dir, &matcher, &pool, format)?
    };

    let merged_dir = args.work_dir.join("merged");
    let report = merge_groups(&groups, &merged_dir, &MergeOptions::default());
    print_report(&report, format)?;
    check_report(&report)
}

fn count_all<P: WorkerPool>(
    args: &RunArgs,
    inputs: &[PathBuf],
    counts_dir: &Path,
    matcher: &BatchMatcher<'_>,
    pool: &P,
    format: OutputFormat,
) -> anyhow::Result<Vec<SampleGroup>> {
    let mut groups = Vec::with_capacity(inputs.len());
    for input in inputs {
        let base = read_file_base_name(input)
            .with_context(|| format!("Cannot derive a sample name from {}", input.display()))?;
        let mut members = Vec::with_capacity(args.partitions);
        for index in 0..args.partitions {
            let partition = PartitionIndex::new(i64::try_from(index)?, args.partitions)?;
            let prefix = format!("{base}_{index}");
            let job = PartitionJob::new(input, partition, partition_output_path(counts_dir, &prefix));
            let outcome = job.run(matcher, pool).with_context(|| {
                format!("Failed to count partition {partition} of {}", input.display())
            })?;
            print_summary(&prefix, &outcome.counts.summary, format)?;
            members.push(PartitionFile {
                path: outcome.output,
                partition: index as u64,
            });
        }
        groups.push(SampleGroup {
            key: base.to_string(),
            members,
        });
    }
    Ok(groups)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_read_files() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.fastq", "a.fq.gz", "notes.txt", "c.fastq.gz"] {
            std::fs::write(dir.path().join(name), "").unwrap();
        }
        std::fs::create_dir(dir.path().join("d.fastq")).unwrap();

        let suffixes: Vec<String> = DEFAULT_READ_SUFFIXES.iter().map(|s| (*s).to_string()).collect();
        let files = find_read_files(dir.path(), &suffixes).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(names, vec!["a.fq.gz", "b.fastq", "c.fastq.gz"]);
    }
}
