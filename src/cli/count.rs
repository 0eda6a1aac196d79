//! Count command - count reference sequences in one partition of a read file.
//!
//! Mirrors one cluster array task: the partition index and count select a
//! contiguous slice of the read file, and the partition's counts are written
//! to `<output-dir>/<prefix>.txt`.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;
use clap::Args;
use tracing::info;

use crate::aggregate::{partition_output_path, PartitionJob, RayonPool, SequentialPool};
use crate::cli::{print_summary, MatchArgs, OutputFormat};
use crate::matching::BatchMatcher;
use crate::parsing::library::load_library_file;
use crate::parsing::reads::read_file_base_name;
use crate::partition::PartitionIndex;
use crate::utils::validation::validate_output_prefix;

/// Arguments for the count command
#[derive(Args)]
pub struct CountArgs {
    /// Read file (4-line records; `.gz` is decompressed)
    #[arg(required = true)]
    pub input: PathBuf,

    /// Reference library: tab-separated `ID` and `seq` columns with header
    #[arg(required = true)]
    pub reference: PathBuf,

    /// Output file prefix [default: <input base name>_<partition index>]
    #[arg(short, long)]
    pub output_prefix: Option<String>,

    /// Directory for the partition count file
    #[arg(short = 'd', long, default_value = "counts")]
    pub output_dir: PathBuf,

    /// Zero-based index of the partition to count
    #[arg(short = 'i', long, default_value = "0", allow_negative_numbers = true)]
    pub partition_index: i64,

    /// Total number of partitions the read file is split into
    #[arg(short = 'n', long, default_value = "1")]
    pub partitions: usize,

    #[command(flatten)]
    pub matching: MatchArgs,
}

/// Default output prefix: `<input base name>_<partition index>`
///
/// # Errors
///
/// Returns an error if the input path has no usable file name.
pub fn default_prefix(input: &Path, partition: PartitionIndex) -> anyhow::Result<String> {
    let base = read_file_base_name(input)
        .with_context(|| format!("Cannot derive a sample name from {}", input.display()))?;
    Ok(format!("{base}_{}", partition.index()))
}

/// Execute the count command
///
/// # Errors
///
/// Returns an error naming the failing stage if the partition request is
/// invalid, the library cannot be loaded, or counting fails. No count file is
/// written on error.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: CountArgs, format: OutputFormat) -> anyhow::Result<()> {
    // Validate before touching any input
    let partition = PartitionIndex::new(args.partition_index, args.partitions)
        .context("Invalid partition request")?;

    let prefix = match &args.output_prefix {
        Some(prefix) => prefix.clone(),
        None => default_prefix(&args.input, partition)?,
    };
    validate_output_prefix(&prefix)?;
    let output = partition_output_path(&args.output_dir, &prefix);

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
    let job = PartitionJob::new(&args.input, partition, output);
    info!(
        "Counting partition {partition} of {}",
        args.input.display()
    );

    let outcome = if args.matching.threads == 1 {
        job.run(&matcher, &SequentialPool)
    } else {
        job.run(&matcher, &RayonPool::new(args.matching.threads)?)
    }
    .with_context(|| format!("Failed to count {}", args.input.display()))?;

    print_summary(&prefix, &outcome.counts.summary, format)
}
