use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;

use crate::core::counts::{CountEntry, CountTable};

/// Header of every count file
pub const COUNT_HEADER: [&str; 2] = ["ID", "count"];

#[derive(Error, Debug)]
pub enum CountFileError {
    #[error("Failed to access count file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed count file {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Count file {path} header must be 'ID<TAB>count', found '{found}'")]
    InvalidHeader { path: PathBuf, found: String },

    #[error("Count file {path} line {line}: {reason}")]
    InvalidRow {
        path: PathBuf,
        line: u64,
        reason: String,
    },
}

/// Parse a count table from a reader, keeping row order
///
/// # Errors
///
/// Returns `CountFileError` if the header is wrong, a row does not have two
/// fields, or a count is not a non-negative integer.
pub fn parse_count_table<R: Read>(reader: R, path: &Path) -> Result<CountTable, CountFileError> {
    let csv_err = |source: csv::Error| CountFileError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let header = rdr.headers().map_err(csv_err)?.clone();
    if header.len() != 2 || &header[0] != COUNT_HEADER[0] || &header[1] != COUNT_HEADER[1] {
        return Err(CountFileError::InvalidHeader {
            path: path.to_path_buf(),
            found: header.iter().collect::<Vec<_>>().join("\t"),
        });
    }

    let mut entries = Vec::new();
    for record in rdr.records() {
        let record = record.map_err(csv_err)?;
        let line = record.position().map_or(0, csv::Position::line);
        let invalid = |reason: String| CountFileError::InvalidRow {
            path: path.to_path_buf(),
            line,
            reason,
        };

        if record.len() != 2 {
            return Err(invalid(format!("expected 2 fields, found {}", record.len())));
        }
        let count = record[1]
            .trim()
            .parse::<u64>()
            .map_err(|_| invalid(format!("invalid count '{}'", &record[1])))?;

        entries.push(CountEntry {
            id: record[0].to_string(),
            count,
        });
    }

    Ok(CountTable::from_entries(entries))
}

/// Read a count file
///
/// # Errors
///
/// Returns `CountFileError::Io` if the file cannot be opened, or a parse
/// error for malformed content.
pub fn read_count_file(path: &Path) -> Result<CountTable, CountFileError> {
    let file = std::fs::File::open(path).map_err(|source| CountFileError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_count_table(file, path)
}

/// Serialize a count table as TSV with header
///
/// # Errors
///
/// Returns a `csv::Error` if the writer fails.
pub fn write_count_table<W: Write>(writer: W, table: &CountTable) -> Result<(), csv::Error> {
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_writer(writer);
    wtr.write_record(COUNT_HEADER)?;
    for entry in table.entries() {
        wtr.write_record([entry.id.as_str(), entry.count.to_string().as_str()])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write a count file atomically.
///
/// The table is written to a temporary file in the destination directory and
/// renamed over `path` only once fully written, so `path` either holds the
/// complete table or does not exist. The parent directory is created if
/// needed.
///
/// # Errors
///
/// Returns `CountFileError` if the directory, temporary file, or rename
/// fails.
pub fn write_count_file(path: &Path, table: &CountTable) -> Result<(), CountFileError> {
    let io_err = |source: std::io::Error| CountFileError::Io {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(io_err)?;

    let mut tmp = NamedTempFile::new_in(dir).map_err(io_err)?;
    write_count_table(tmp.as_file_mut(), table).map_err(|source| CountFileError::Csv {
        path: path.to_path_buf(),
        source,
    })?;
    tmp.as_file().sync_all().map_err(io_err)?;
    tmp.persist(path).map_err(|e| io_err(e.error))?;
    Ok(())
}
