use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::core::counts::{CountError, CountTable};
use crate::merge::key::{parse_partition_file_name, KeyError};
use crate::parsing::counts::{read_count_file, write_count_file, CountFileError};

/// Default suffix of partition count files
pub const DEFAULT_SUFFIX: &str = ".txt";

#[derive(Error, Debug)]
pub enum MergeError {
    #[error("Failed to list {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    CountFile(#[from] CountFileError),

    #[error("Schema mismatch: {path} does not share the ID column of {reference}: {source}")]
    SchemaMismatch {
        path: PathBuf,
        reference: PathBuf,
        #[source]
        source: CountError,
    },

    #[error("Sample '{key}' has partition {partition} twice: {first} and {second}")]
    DuplicatePartition {
        key: String,
        partition: u64,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("Count overflow for ID '{id}' while adding {path}")]
    CountOverflow { path: PathBuf, id: String },
}

/// Options for grouping and merging
#[derive(Debug, Clone)]
pub struct MergeOptions {
    /// Only files ending in this suffix are merged; also the output suffix
    pub suffix: String,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            suffix: DEFAULT_SUFFIX.to_string(),
        }
    }
}

/// One partition count file of a sample
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionFile {
    pub path: PathBuf,
    pub partition: u64,
}

/// Partition count files sharing a sample key, in file-name order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleGroup {
    pub key: String,
    pub members: Vec<PartitionFile>,
}

/// A file left out of grouping
#[derive(Debug, Clone)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: KeyError,
}

/// A sample whose merge failed
#[derive(Debug)]
pub struct GroupFailure {
    pub key: String,
    pub error: MergeError,
}

/// Outcome of merging a directory
#[derive(Debug, Default)]
pub struct MergeReport {
    /// Final count files, in sample-key order
    pub written: Vec<PathBuf>,
    pub failed: Vec<GroupFailure>,
    pub skipped: Vec<SkippedFile>,
}

impl MergeReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Group the partition count files of `dir` by sample key.
///
/// Files not ending in the configured suffix are ignored. Files that end in
/// the suffix but do not follow `<sample>_<partition><suffix>` are returned
/// as skipped.
///
/// # Errors
///
/// Returns `MergeError::Io` if the directory cannot be listed.
pub fn group_files(
    dir: &Path,
    options: &MergeOptions,
) -> Result<(Vec<SampleGroup>, Vec<SkippedFile>), MergeError> {
    let io_err = |source: std::io::Error| MergeError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut files: Vec<(String, PathBuf)> = Vec::new();
    let mut skipped = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(io_err)? {
        let entry = entry.map_err(io_err)?;
        if !entry.file_type().map_err(io_err)?.is_file() {
            continue;
        }
        let path = entry.path();
        let name = entry.file_name();
        if !name.to_string_lossy().ends_with(&options.suffix) {
            debug!("Ignoring {}", path.display());
            continue;
        }
        match name.into_string() {
            Ok(name) => files.push((name, path)),
            Err(_) => skipped.push(SkippedFile {
                path,
                reason: KeyError::NotUtf8,
            }),
        }
    }
    files.sort();

    let mut groups: BTreeMap<String, Vec<PartitionFile>> = BTreeMap::new();
    for (name, path) in files {
        match parse_partition_file_name(&name, &options.suffix) {
            Ok((key, partition)) => groups
                .entry(key.to_string())
                .or_default()
                .push(PartitionFile { path, partition }),
            Err(reason) => skipped.push(SkippedFile { path, reason }),
        }
    }

    let groups = groups
        .into_iter()
        .map(|(key, members)| SampleGroup { key, members })
        .collect();
    Ok((groups, skipped))
}

/// Sum the count files of one sample.
///
/// Rows keep the order of the group's first file. Every member must have
/// exactly the same ID column.
///
/// # Errors
///
/// Returns `MergeError` if a file cannot be read, two members encode the
/// same partition, the ID columns differ, or a count overflows.
pub fn merge_group(group: &SampleGroup) -> Result<CountTable, MergeError> {
    let mut seen: HashMap<u64, &Path> = HashMap::new();
    for member in &group.members {
        if let Some(first) = seen.insert(member.partition, &member.path) {
            return Err(MergeError::DuplicatePartition {
                key: group.key.clone(),
                partition: member.partition,
                first: first.to_path_buf(),
                second: member.path.clone(),
            });
        }
    }

    let mut members = group.members.iter();
    let Some(first) = members.next() else {
        return Ok(CountTable::default());
    };
    let mut total = read_count_file(&first.path)?;

    for member in members {
        let table = read_count_file(&member.path)?;
        total.add_table(&table).map_err(|source| match source {
            CountError::Overflow(id) => MergeError::CountOverflow {
                path: member.path.clone(),
                id,
            },
            source => MergeError::SchemaMismatch {
                path: member.path.clone(),
                reference: first.path.clone(),
                source,
            },
        })?;
    }

    Ok(total)
}

/// Path of the final count file of a sample
pub fn sample_output_path(output_dir: &Path, key: &str, options: &MergeOptions) -> PathBuf {
    output_dir.join(format!("{key}{}", options.suffix))
}

/// Merge every sample group of `dir` into `output_dir`.
///
/// Groups are merged independently: a failing group is recorded in the
/// report and the remaining groups are still written. An empty directory
/// yields an empty report.
///
/// # Errors
///
/// Returns `MergeError::Io` only if `dir` cannot be listed.
pub fn merge_directory(
    dir: &Path,
    output_dir: &Path,
    options: &MergeOptions,
) -> Result<MergeReport, MergeError> {
    let (groups, skipped) = group_files(dir, options)?;
    for file in &skipped {
        warn!("Skipping {}: {}", file.path.display(), file.reason);
    }

    let mut report = merge_groups(&groups, output_dir, options);
    report.skipped = skipped;
    Ok(report)
}

/// Merge already-formed sample groups into `output_dir`.
///
/// Each group is merged and written on its own; failures are collected in
/// the report and do not stop the remaining groups.
pub fn merge_groups(
    groups: &[SampleGroup],
    output_dir: &Path,
    options: &MergeOptions,
) -> MergeReport {
    let mut report = MergeReport::default();
    for group in groups {
        let output = sample_output_path(output_dir, &group.key, options);
        let result = merge_group(group)
            .and_then(|table| write_count_file(&output, &table).map_err(MergeError::from));
        match result {
            Ok(()) => {
                info!(
                    "Merged {} partition files into {}",
                    group.members.len(),
                    output.display()
                );
                report.written.push(output);
            }
            Err(error) => {
                warn!("Sample '{}' not merged: {error}", group.key);
                report.failed.push(GroupFailure {
                    key: group.key.clone(),
                    error,
                });
            }
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, rows: &[(&str, u64)]) {
        let mut text = String::from("ID\tcount\n");
        for (id, count) in rows {
            text.push_str(&format!("{id}\t{count}\n"));
        }
        std::fs::write(dir.join(name), text).unwrap();
    }

    fn counts(table: &CountTable) -> Vec<(String, u64)> {
        table
            .entries()
            .iter()
            .map(|e| (e.id.clone(), e.count))
            .collect()
    }

    #[test]
    fn test_group_files() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "s2_p0.txt", &[("A", 1)]);
        write(dir.path(), "s1_p1.txt", &[("A", 1)]);
        write(dir.path(), "s1_p0.txt", &[("A", 1)]);
        write(dir.path(), "s1.txt", &[("A", 1)]);
        std::fs::write(dir.path().join("notes.md"), "x").unwrap();

        let (groups, skipped) = group_files(dir.path(), &MergeOptions::default()).unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].key, "s1");
        let names: Vec<_> = groups[0]
            .members
            .iter()
            .map(|m| m.path.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["s1_p0.txt", "s1_p1.txt"]);
        assert_eq!(groups[1].key, "s2");

        assert_eq!(skipped.len(), 1);
        assert_eq!(skipped[0].reason, KeyError::MissingSeparator);
    }

    #[test]
    fn test_merge_directory_scenario() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        write(input.path(), "s1_p0.txt", &[("A", 1), ("B", 2)]);
        write(input.path(), "s1_p1.txt", &[("A", 3), ("B", 0)]);
        write(input.path(), "s2_p0.txt", &[("A", 5), ("B", 5)]);

        let report =
            merge_directory(input.path(), output.path(), &MergeOptions::default()).unwrap();
        assert!(report.is_success());
        assert_eq!(
            report.written,
            vec![output.path().join("s1.txt"), output.path().join("s2.txt")]
        );

        let s1 = read_count_file(&output.path().join("s1.txt")).unwrap();
        assert_eq!(counts(&s1), vec![("A".to_string(), 4), ("B".to_string(), 2)]);
        let s2 = read_count_file(&output.path().join("s2.txt")).unwrap();
        assert_eq!(counts(&s2), vec![("A".to_string(), 5), ("B".to_string(), 5)]);
    }

    #[test]
    fn test_merge_keeps_first_file_order() {
        let input = tempfile::tempdir().unwrap();
        write(input.path(), "s_0.txt", &[("Z", 1), ("A", 1)]);
        write(input.path(), "s_1.txt", &[("Z", 2), ("A", 3)]);

        let (groups, _) = group_files(input.path(), &MergeOptions::default()).unwrap();
        let table = merge_group(&groups[0]).unwrap();
        assert_eq!(counts(&table), vec![("Z".to_string(), 3), ("A".to_string(), 4)]);
    }

    #[test]
    fn test_schema_mismatch_isolated_to_group() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        write(input.path(), "bad_0.txt", &[("A", 1), ("B", 1)]);
        write(input.path(), "bad_1.txt", &[("A", 1), ("C", 1)]);
        write(input.path(), "good_0.txt", &[("A", 1)]);

        let report =
            merge_directory(input.path(), output.path(), &MergeOptions::default()).unwrap();
        assert!(!report.is_success());
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].key, "bad");
        assert!(matches!(
            report.failed[0].error,
            MergeError::SchemaMismatch { .. }
        ));
        assert_eq!(report.written, vec![output.path().join("good.txt")]);
        assert!(!output.path().join("bad.txt").exists());
    }

    #[test]
    fn test_duplicate_partition_number() {
        let input = tempfile::tempdir().unwrap();
        write(input.path(), "s1_1.txt", &[("A", 1)]);
        write(input.path(), "s1_p1.txt", &[("A", 1)]);

        let (groups, _) = group_files(input.path(), &MergeOptions::default()).unwrap();
        assert!(matches!(
            merge_group(&groups[0]),
            Err(MergeError::DuplicatePartition { partition: 1, .. })
        ));
    }

    #[test]
    fn test_empty_directory() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        let report =
            merge_directory(input.path(), output.path(), &MergeOptions::default()).unwrap();
        assert!(report.written.is_empty());
        assert!(report.is_success());
        assert_eq!(std::fs::read_dir(output.path()).unwrap().count(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_names_follow_suffix_rule() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "s1_0.txt", &[("A", 1)]);
        std::fs::write(dir.path().join(OsStr::from_bytes(b"notes\xff.log")), "").unwrap();
        std::fs::write(dir.path().join(OsStr::from_bytes(b"s\xff_0.txt")), "").unwrap();

        let (groups, skipped) = group_files(dir.path(), &MergeOptions::default()).unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(skipped.len(), 1);
        assert_eq!(skipped[0].reason, KeyError::NotUtf8);
        assert!(skipped[0]
            .path
            .as_os_str()
            .as_bytes()
            .ends_with(b"s\xff_0.txt"));
    }

    #[test]
    fn test_missing_directory() {
        let missing = Path::new("/nonexistent/mpra-count/dir");
        assert!(matches!(
            merge_directory(missing, missing, &MergeOptions::default()),
            Err(MergeError::Io { .. })
        ));
    }

    #[test]
    fn test_merge_is_idempotent() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        write(input.path(), "s1_0.txt", &[("A", 1), ("B", 2)]);
        write(input.path(), "s1_1.txt", &[("A", 7), ("B", 9)]);

        merge_directory(input.path(), output.path(), &MergeOptions::default()).unwrap();
        let first = std::fs::read(output.path().join("s1.txt")).unwrap();
        merge_directory(input.path(), output.path(), &MergeOptions::default()).unwrap();
        let second = std::fs::read(output.path().join("s1.txt")).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_sum_independent_of_member_order() {
        let input = tempfile::tempdir().unwrap();
        write(input.path(), "s_0.txt", &[("A", 1), ("B", 2)]);
        write(input.path(), "s_1.txt", &[("A", 10), ("B", 20)]);
        write(input.path(), "s_2.txt", &[("A", 100), ("B", 200)]);

        let (groups, _) = group_files(input.path(), &MergeOptions::default()).unwrap();
        let forward = merge_group(&groups[0]).unwrap();

        let mut reversed = groups[0].clone();
        reversed.members.reverse();
        assert_eq!(merge_group(&reversed).unwrap(), forward);
        assert_eq!(counts(&forward), vec![("A".to_string(), 111), ("B".to_string(), 222)]);
    }
}
