//! Structured errors for parsing cgroup and procfs statistics.
//!
//! [`StatParseError`] converts into [`std::io::Error`] with kind
//! [`InvalidData`](std::io::ErrorKind::InvalidData), so the parsers can be used
//! wherever plain I/O results are expected and the file nodes can surface a
//! single error type.
//!
//! # Example
//!
//! ```rust
//! use std::io;
//! use cgroupfs::cgroup::stats::StatParseError;
//!
//! fn parse_line(val: &str) -> io::Result<u64> {
//!     let value = val.parse::<u64>().map_err(|e| {
//!         StatParseError::InvalidValue {
//!             value: val.to_string(),
//!             line: 1,
//!             source: e,
//!         }
//!     })?;
//!     Ok(value)
//! }
//!
//! parse_line("not-a-number").unwrap_err();
//! ```

use std::num::ParseIntError;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StatParseError {
    #[error("duplicate field '{field}' at line {line}")]
    DuplicateField { field: String, line: usize },

    #[error("invalid value for '{key}' at line {line}: '{value}': {source}")]
    InvalidKeyValue {
        key: String,
        value: String,
        line: usize,
        #[source]
        source: ParseIntError,
    },

    #[error("invalid value at line {line}: '{value}': {source}")]
    InvalidValue {
        value: String,
        line: usize,
        #[source]
        source: ParseIntError,
    },

    #[error("invalid range at line {line}: '{value}'")]
    InvalidRange { value: String, line: usize },

    #[error("invalid device number at line {line}: '{value}'")]
    InvalidDevice { value: String, line: usize },

    #[error("error during I/O: {0}")]
    Io(#[from] std::io::Error),
}

impl From<StatParseError> for std::io::Error {
    fn from(err: StatParseError) -> Self {
        match err {
            StatParseError::Io(e) => e,
            other => std::io::Error::new(std::io::ErrorKind::InvalidData, other),
        }
    }
}

/// Extracts a `StatParseError` from an `std::io::Error` assuming it was wrapped.
///
/// Panics if the inner error is not a `StatParseError`. Intended for use in test assertions only.
#[cfg(test)]
pub(crate) fn extract_stat_parse_error(err: &std::io::Error) -> &StatParseError {
    err.get_ref()
        .and_then(|e| e.downcast_ref::<StatParseError>())
        .unwrap()
}
