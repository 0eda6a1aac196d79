use thiserror::Error;

/// Why a file name does not follow `<sample>_<partition><suffix>`
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyError {
    #[error("file name is not valid UTF-8")]
    NotUtf8,

    #[error("file name has no '_' separating sample and partition")]
    MissingSeparator,

    #[error("file name has an empty sample name")]
    EmptySampleKey,

    #[error("final token '{0}' does not end in a partition number")]
    NonNumericPartition(String),
}

/// Sample key of a file name: everything before the final `_`.
///
/// The final `_`-delimited token encodes the partition, so it is dropped
/// along with whatever extension follows it.
///
/// ```
/// use mpra_count::merge::sample_key;
///
/// assert_eq!(sample_key("s1_p0.txt"), Some("s1"));
/// assert_eq!(sample_key("lib_A_rep2_13.txt"), Some("lib_A_rep2"));
/// assert_eq!(sample_key("merged.txt"), None);
/// ```
pub fn sample_key(file_name: &str) -> Option<&str> {
    file_name
        .rsplit_once('_')
        .map(|(key, _)| key)
        .filter(|key| !key.is_empty())
}

/// Partition number encoded in a token: its trailing ASCII digits
/// (`"3"`, `"p3"` and `"part003"` all give 3)
pub fn partition_number(token: &str) -> Option<u64> {
    let digits_start = token
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_digit())
        .last()
        .map(|(i, _)| i)?;
    token[digits_start..].parse().ok()
}

/// Split a partition count file name into sample key and partition number.
///
/// `suffix` (e.g. `.txt`) is removed before the final token is examined.
///
/// # Errors
///
/// Returns `KeyError` when the name has no separator, an empty sample key,
/// or a final token without a trailing partition number.
pub fn parse_partition_file_name<'a>(
    file_name: &'a str,
    suffix: &str,
) -> Result<(&'a str, u64), KeyError> {
    let stem = file_name.strip_suffix(suffix).unwrap_or(file_name);
    let key = sample_key(stem).ok_or(if stem.contains('_') {
        KeyError::EmptySampleKey
    } else {
        KeyError::MissingSeparator
    })?;
    let token = &stem[key.len() + 1..];
    let partition =
        partition_number(token).ok_or_else(|| KeyError::NonNumericPartition(token.to_string()))?;
    Ok((key, partition))
}
