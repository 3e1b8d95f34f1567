//! The canonical document timestamp.
//!
//! Every promoted document name starts with `YYYY-MM-DD_HH-MM-SS`. The format
//! is fixed-width and zero-padded, so lexicographic order over filenames is
//! chronological order within a series.

use chrono::NaiveDateTime;

/// `strftime` pattern of the canonical timestamp.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// Byte length of a formatted timestamp.
pub const TIMESTAMP_LEN: usize = 19;

/// Format `instant` as a canonical timestamp.
pub fn format(instant: &NaiveDateTime) -> String {
    instant.format(TIMESTAMP_FORMAT).to_string()
}

/// Return the timestamp prefix of `name` if it starts with a valid one.
pub fn prefix_of(name: &str) -> Option<&str> {
    let prefix = name.get(..TIMESTAMP_LEN)?;
    NaiveDateTime::parse_from_str(prefix, TIMESTAMP_FORMAT).ok()?;
    Some(prefix)
}
