//! Command-line interface for mpra-count.
//!
//! This module implements the CLI using clap. Available commands:
//!
//! - **count**: Count reference sequences in one partition of a read file
//! - **merge**: Sum partition count files into one count file per sample
//! - **run**: Count every partition of every read file in a directory, then merge
//!
//! ## Usage
//!
//! ```text
//! # Count partition 2 of 8 (e.g. from a cluster job array)
//! mpra-count count sample1.merged.fastq library.tsv --partition-index 2 --partitions 8
//!
//! # Merge all partition files in ./counts into ./merged
//! mpra-count merge counts merged
//!
//! # Do everything locally
//! mpra-count run pandaseq/ library.tsv --partitions 4 --work-dir out
//! ```

use clap::{Parser, Subcommand};

use crate::aggregate::PartitionSummary;
use crate::matching::MatchingConfig;

pub mod count;
pub mod merge;
pub mod run;

#[derive(Parser)]
#[command(name = "mpra-count")]
#[command(version)]
#[command(about = "Count known reference sequences in sequencing reads")]
#[command(
    long_about = "mpra-count counts reads matching a library of known reference sequences.\n\nLarge read files are split into partitions that can be counted independently (for example as cluster array jobs); partition count files are then merged into one count file per sample. Totals do not depend on how many partitions or threads were used."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format for summaries
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Count reference sequences in one partition of a read file
    Count(count::CountArgs),

    /// Merge partition count files into per-sample count files
    Merge(merge::MergeArgs),

    /// Count all partitions of every read file in a directory, then merge
    Run(run::RunArgs),
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Tsv,
}

/// Matching rule and thread options shared by `count` and `run`
#[derive(clap::Args, Debug, Clone)]
pub struct MatchArgs {
    /// Worker threads (0 = all logical processors)
    #[arg(short, long, default_value = "0")]
    pub threads: usize,

    /// Maximum substitutions allowed between a pattern and a read
    #[arg(long, default_value = "0")]
    pub max_mismatches: u32,

    /// Match reads and patterns case-insensitively
    #[arg(long)]
    pub ignore_case: bool,

    /// Also count reads containing the reverse complement of a pattern
    #[arg(long)]
    pub reverse_complement: bool,
}

impl MatchArgs {
    pub fn matching_config(&self) -> MatchingConfig {
        MatchingConfig {
            max_mismatches: self.max_mismatches,
            ignore_case: self.ignore_case,
            reverse_complement: self.reverse_complement,
        }
    }
}

/// Print a partition summary in the selected format
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn print_summary(
    label: &str,
    summary: &PartitionSummary,
    format: OutputFormat,
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => {
            println!("Summary for {label}:");
            println!("  Total counts: {}", summary.matched);
            println!("  Total reads: {}", summary.records);
            println!("  Skipped reads: {}", summary.skipped);
            println!("  Alignment percentage: {:.2}%", summary.percent_aligned);
        }
        OutputFormat::Json => {
            let output = serde_json::json!({
                "label": label,
                "summary": summary,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Tsv => {
            println!("label\tmatched\treads\trows\tskipped\tpercent_aligned");
            println!(
                "{label}\t{}\t{}\t{}\t{}\t{:.4}",
                summary.matched,
                summary.records,
                summary.rows,
                summary.skipped,
                summary.percent_aligned
            );
        }
    }
    Ok(())
}
