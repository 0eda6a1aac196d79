use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

use crate::cli::OutputFormat;
use crate::merge::{merge_directory, MergeOptions, MergeReport, DEFAULT_SUFFIX};

#[derive(Args)]
pub struct MergeArgs {
    /// Directory holding partition count files (`<sample>_<partition>.txt`)
    #[arg(required = true)]
    pub directory: PathBuf,

    /// Directory for the merged per-sample count files
    #[arg(required = true)]
    pub output_dir: PathBuf,

    /// Suffix of partition count files; merged files use the same suffix
    #[arg(long, default_value = DEFAULT_SUFFIX)]
    pub suffix: String,
}

/// Execute merge subcommand
///
/// # Errors
///
/// Returns an error if the input directory cannot be listed, or after all
/// groups are processed if any sample group failed to merge.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: MergeArgs, format: OutputFormat) -> anyhow::Result<()> {
    let options = MergeOptions {
        suffix: args.suffix.clone(),
    };
    let report = merge_directory(&args.directory, &args.output_dir, &options)
        .with_context(|| format!("Failed to merge {}", args.directory.display()))?;

    print_report(&report, format)?;
    check_report(&report)
}

/// Fail if any group of a finished merge failed
///
/// # Errors
///
/// Returns an error listing the failed sample keys.
pub fn check_report(report: &MergeReport) -> anyhow::Result<()> {
    if report.is_success() {
        return Ok(());
    }
    let keys: Vec<&str> = report.failed.iter().map(|f| f.key.as_str()).collect();
    anyhow::bail!(
        "{} sample group(s) failed to merge: {}",
        keys.len(),
        keys.join(", ")
    )
}

/// Print a merge report in the selected format
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn print_report(report: &MergeReport, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => {
            println!("Merged {} sample(s)", report.written.len());
            for path in &report.written {
                println!("  {}", path.display());
            }
            if !report.failed.is_empty() {
                println!("Failed {} sample(s)", report.failed.len());
                for failure in &report.failed {
                    println!("  {}: {}", failure.key, failure.error);
                }
            }
            if !report.skipped.is_empty() {
                println!("Skipped {} file(s)", report.skipped.len());
                for skipped in &report.skipped {
                    println!("  {}: {}", skipped.path.display(), skipped.reason);
                }
            }
        }
        OutputFormat::Json => {
            let output = serde_json::json!({
                "written": report
                    .written
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect::<Vec<_>>(),
                "failed": report
                    .failed
                    .iter()
                    .map(|f| serde_json::json!({ "sample": f.key, "error": f.error.to_string() }))
                    .collect::<Vec<_>>(),
                "skipped": report
                    .skipped
                    .iter()
                    .map(|s| serde_json::json!({
                        "path": s.path.display().to_string(),
                        "reason": s.reason.to_string(),
                    }))
                    .collect::<Vec<_>>(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Tsv => {
            println!("item\tstatus\tdetail");
            for path in &report.written {
                println!("{}\twritten\t", path.display());
            }
            for failure in &report.failed {
                println!("{}\tfailed\t{}", failure.key, failure.error);
            }
            for skipped in &report.skipped {
                println!("{}\tskipped\t{}", skipped.path.display(), skipped.reason);
            }
        }
    }
    Ok(())
}
