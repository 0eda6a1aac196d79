use std::io::Read;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::core::library::{ReferenceLibrary, ReferenceSequence};
use crate::utils::validation::is_valid_sequence;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Failed to read reference library {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed reference library: {0}")]
    Csv(#[from] csv::Error),

    #[error("Reference library header must be 'ID<TAB>seq', found '{0}'")]
    InvalidHeader(String),

    #[error("Line {line} has {fields} fields, expected exactly 2")]
    WrongFieldCount { line: u64, fields: usize },

    #[error("Line {0} has an empty ID")]
    EmptyId(u64),

    #[error("Invalid sequence for '{id}' on line {line}: '{pattern}'")]
    InvalidPattern {
        id: String,
        line: u64,
        pattern: String,
    },

    #[error("Duplicate reference ID '{id}' on line {line}")]
    DuplicateId { id: String, line: u64 },

    #[error("Reference library contains no sequences")]
    Empty,
}

/// Load a reference library from a tab-separated `ID`/`seq` file
///
/// # Errors
///
/// Returns `LoadError::Io` if the file cannot be opened, or another
/// `LoadError` if the content is not a valid library.
pub fn load_library_file(path: &Path) -> Result<ReferenceLibrary, LoadError> {
    let file = std::fs::File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_library(file)
}

/// Parse a reference library from any reader.
///
/// The first row is a header naming the `ID` and `seq` columns (matched
/// case-insensitively). Every following row must have exactly two fields,
/// a non-empty ID that has not been seen before, and a nucleotide pattern.
///
/// # Errors
///
/// Returns the first `LoadError` found; nothing is returned for a partially
/// valid file.
pub fn load_library<R: Read>(reader: R) -> Result<ReferenceLibrary, LoadError> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let header = rdr.headers()?.clone();
    let is_expected_header = header.len() == 2
        && header[0].trim().eq_ignore_ascii_case("id")
        && header[1].trim().eq_ignore_ascii_case("seq");
    if !is_expected_header {
        return Err(LoadError::InvalidHeader(
            header.iter().collect::<Vec<_>>().join("\t"),
        ));
    }

    let mut library = ReferenceLibrary::new();
    for record in rdr.records() {
        let record = record?;
        let line = record.position().map_or(0, csv::Position::line);

        if record.len() != 2 {
            return Err(LoadError::WrongFieldCount {
                line,
                fields: record.len(),
            });
        }

        let id = record[0].trim();
        let pattern = record[1].trim();
        if id.is_empty() {
            return Err(LoadError::EmptyId(line));
        }
        if !is_valid_sequence(pattern.as_bytes()) {
            return Err(LoadError::InvalidPattern {
                id: id.to_string(),
                line,
                pattern: pattern.to_string(),
            });
        }

        library
            .add(ReferenceSequence::new(id, pattern))
            .map_err(|rejected| LoadError::DuplicateId {
                id: rejected.id,
                line,
            })?;
    }

    if library.is_empty() {
        return Err(LoadError::Empty);
    }

    Ok(library)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_library() {
        let text = "ID\tseq\nA\tACGT\nB\tTTTT\n";
        let library = load_library(text.as_bytes()).unwrap();
        assert_eq!(library.len(), 2);
        assert_eq!(library.get(0).unwrap().id, "A");
        assert_eq!(library.get(1).unwrap().pattern, "TTTT");
    }

    #[test]
    fn test_header_case_insensitive() {
        let text = "id\tSEQ\nA\tACGT\n";
        assert_eq!(load_library(text.as_bytes()).unwrap().len(), 1);
    }

    #[test]
    fn test_wrong_header() {
        let text = "name\tsequence\nA\tACGT\n";
        assert!(matches!(
            load_library(text.as_bytes()),
            Err(LoadError::InvalidHeader(_))
        ));
    }

    #[test]
    fn test_extra_column() {
        let text = "ID\tseq\nA\tACGT\textra\n";
        assert!(matches!(
            load_library(text.as_bytes()),
            Err(LoadError::WrongFieldCount { line: 2, fields: 3 })
        ));
    }

    #[test]
    fn test_missing_column() {
        let text = "ID\tseq\nA\n";
        assert!(matches!(
            load_library(text.as_bytes()),
            Err(LoadError::WrongFieldCount { fields: 1, .. })
        ));
    }

    #[test]
    fn test_duplicate_id() {
        let text = "ID\tseq\nA\tACGT\nA\tGGGG\n";
        match load_library(text.as_bytes()) {
            Err(LoadError::DuplicateId { id, line }) => {
                assert_eq!(id, "A");
                assert_eq!(line, 3);
            }
            other => panic!("expected duplicate ID error, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_pattern() {
        let text = "ID\tseq\nA\tAC-GT\n";
        assert!(matches!(
            load_library(text.as_bytes()),
            Err(LoadError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn test_empty_library() {
        assert!(matches!(
            load_library("ID\tseq\n".as_bytes()),
            Err(LoadError::Empty)
        ));
        assert!(load_library("".as_bytes()).is_err());
    }
}
