//! Centralized validation and helper functions.

/// Maximum length of an output prefix or sample key
pub const MAX_FILENAME_LENGTH: usize = 255;

/// Check whether a byte is a nucleotide code accepted in reads and patterns.
///
/// Accepts `A`, `C`, `G`, `T`, `N` in either case.
#[must_use]
pub fn is_sequence_byte(b: u8) -> bool {
    matches!(
        b,
        b'A' | b'C' | b'G' | b'T' | b'N' | b'a' | b'c' | b'g' | b't' | b'n'
    )
}

/// Validate that a byte string is a non-empty nucleotide sequence.
///
/// # Examples
///
/// ```
/// use mpra_count::utils::validation::is_valid_sequence;
///
/// assert!(is_valid_sequence(b"ACGTN"));
/// assert!(is_valid_sequence(b"acgt"));
/// assert!(!is_valid_sequence(b"ACGU"));
/// assert!(!is_valid_sequence(b""));
/// ```
#[must_use]
pub fn is_valid_sequence(seq: &[u8]) -> bool {
    !seq.is_empty() && seq.iter().copied().all(is_sequence_byte)
}

/// Output name validation error types
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Output name too long: exceeds {MAX_FILENAME_LENGTH} characters")]
    NameTooLong,
    #[error("Invalid output name '{0}': contains path separators or control characters")]
    InvalidName(String),
    #[error("Empty output name provided")]
    EmptyName,
}

/// Validate an output prefix used as a bare file name.
///
/// Prefixes become `<dir>/<prefix>.txt`, so they must not escape the output
/// directory:
/// - no `/`, `\` or `..`
/// - no NUL or control characters
/// - not empty, not longer than [`MAX_FILENAME_LENGTH`]
///
/// # Errors
///
/// Returns `ValidationError::EmptyName` if the prefix is blank,
/// `ValidationError::NameTooLong` if it exceeds the limit, or
/// `ValidationError::InvalidName` if it contains forbidden characters.
pub fn validate_output_prefix(prefix: &str) -> Result<&str, ValidationError> {
    if prefix.trim().is_empty() {
        return Err(ValidationError::EmptyName);
    }

    if prefix.len() > MAX_FILENAME_LENGTH {
        return Err(ValidationError::NameTooLong);
    }

    if prefix.contains("..") || prefix.contains('/') || prefix.contains('\\') {
        return Err(ValidationError::InvalidName(prefix.to_string()));
    }

    if prefix.chars().any(char::is_control) {
        return Err(ValidationError::InvalidName(prefix.to_string()));
    }

    Ok(prefix)
}
