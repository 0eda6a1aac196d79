//! Record-aware scanning of FASTQ-like read files.
//!
//! Reads occupy fixed-period rows: every [`RECORD_PERIOD`] lines form one
//! record and the read sequence is the first whitespace-delimited field of
//! the line at [`SEQUENCE_OFFSET`] within the record. Files ending in `.gz`
//! are decompressed on the fly.
//!
//! Loading a partition takes two passes over the file: one to count records
//! so partition boundaries can be computed, one to keep only the reads in the
//! selected range. Memory use is proportional to the partition, not the file.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::ops::Range;
use std::path::{Path, PathBuf};

use flate2::read::MultiGzDecoder;
use thiserror::Error;

/// Lines per read record
pub const RECORD_PERIOD: u64 = 4;

/// Line within a record holding the sequence
pub const SEQUENCE_OFFSET: u64 = 1;

/// A single read sequence
pub type Read = Vec<u8>;

#[derive(Error, Debug)]
pub enum ReadFileError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path} has {lines} lines, which is not a multiple of {RECORD_PERIOD}")]
    TruncatedRecord { path: PathBuf, lines: u64 },
}

impl ReadFileError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

fn is_gzip(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("gz"))
}

/// Open a read file, decompressing `.gz` input
///
/// # Errors
///
/// Returns `ReadFileError::Io` if the file cannot be opened.
pub fn open_reads(path: &Path) -> Result<Box<dyn BufRead>, ReadFileError> {
    let file = File::open(path).map_err(|e| ReadFileError::io(path, e))?;
    if is_gzip(path) {
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Visit every line of a reader as raw bytes, without the line terminator.
///
/// Empty lines at the end of the input are dropped, except those needed to
/// complete the final record (an empty read has an empty quality line).
/// Empty lines followed by content are visited as usual. The callback
/// returns `false` to stop early. Returns the number of lines visited.
fn for_each_line<R, F>(mut reader: R, mut f: F) -> std::io::Result<u64>
where
    R: BufRead,
    F: FnMut(u64, &[u8]) -> bool,
{
    let mut buf = Vec::new();
    let mut line_no = 0;
    let mut pending_empty = 0_u64;
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            let missing = (RECORD_PERIOD - line_no % RECORD_PERIOD) % RECORD_PERIOD;
            for _ in 0..pending_empty.min(missing) {
                let keep_going = f(line_no, &[]);
                line_no += 1;
                if !keep_going {
                    break;
                }
            }
            return Ok(line_no);
        }
        let line = trim_line_end(&buf);
        if line.is_empty() {
            pending_empty += 1;
            continue;
        }
        for _ in 0..pending_empty {
            let keep_going = f(line_no, &[]);
            line_no += 1;
            if !keep_going {
                return Ok(line_no);
            }
        }
        pending_empty = 0;
        let keep_going = f(line_no, line);
        line_no += 1;
        if !keep_going {
            return Ok(line_no);
        }
    }
}

fn trim_line_end(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

/// First whitespace-delimited field of a line
fn first_field(line: &[u8]) -> &[u8] {
    line.split(u8::is_ascii_whitespace)
        .find(|f| !f.is_empty())
        .unwrap_or(&[])
}

/// Count the records in a reader
///
/// # Errors
///
/// Returns `ReadFileError::TruncatedRecord` if the line count is not a
/// multiple of [`RECORD_PERIOD`].
pub fn count_records_in<R: BufRead>(reader: R, path: &Path) -> Result<u64, ReadFileError> {
    let lines = for_each_line(reader, |_, _| true).map_err(|e| ReadFileError::io(path, e))?;
    if lines % RECORD_PERIOD != 0 {
        return Err(ReadFileError::TruncatedRecord {
            path: path.to_path_buf(),
            lines,
        });
    }
    Ok(lines / RECORD_PERIOD)
}

/// Count the records in a read file
///
/// # Errors
///
/// Returns `ReadFileError` if the file cannot be read or ends mid-record.
pub fn count_records(path: &Path) -> Result<u64, ReadFileError> {
    count_records_in(open_reads(path)?, path)
}

/// Collect the reads of records `range` from a reader.
///
/// Records are numbered from zero. Reading stops as soon as the range is
/// exhausted.
///
/// # Errors
///
/// Returns `ReadFileError::Io` on read failure.
pub fn read_range_in<R: BufRead>(
    reader: R,
    range: Range<u64>,
    path: &Path,
) -> Result<Vec<Read>, ReadFileError> {
    let capacity = usize::try_from(range.end.saturating_sub(range.start)).unwrap_or(0);
    let mut reads = Vec::with_capacity(capacity);
    if range.is_empty() {
        return Ok(reads);
    }

    for_each_line(reader, |line_no, line| {
        let record = line_no / RECORD_PERIOD;
        if record >= range.end {
            return false;
        }
        if record >= range.start && line_no % RECORD_PERIOD == SEQUENCE_OFFSET {
            reads.push(first_field(line).to_vec());
        }
        true
    })
    .map_err(|e| ReadFileError::io(path, e))?;

    Ok(reads)
}

/// Collect the reads of records `range` from a read file
///
/// # Errors
///
/// Returns `ReadFileError::Io` if the file cannot be read.
pub fn read_range(path: &Path, range: Range<u64>) -> Result<Vec<Read>, ReadFileError> {
    read_range_in(open_reads(path)?, range, path)
}

/// File stem used to name per-partition outputs: the base name up to the
/// first `.` (`sample_1.merged.fastq.gz` -> `sample_1`)
pub fn read_file_base_name(path: &Path) -> Option<&str> {
    let name = path.file_name()?.to_str()?;
    let base = name.split('.').next()?;
    (!base.is_empty()).then_some(base)
}
