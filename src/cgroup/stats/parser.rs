//! Generic parsing of line-oriented statistics files.
//!
//! - [`KeyValueStat`] covers multi-line key/value files such as `memory.stat`,
//!   `cpuacct.stat` or `/proc/meminfo`. Keys that the implementor does not
//!   register are ignored.
//! - [`SingleLineStat`] covers single-line files such as
//!   `memory.usage_in_bytes` or `cpuset.cpus`.
//!
//! # Example: Implementing `KeyValueStat`
//!
//! ```rust
//! use std::collections::HashMap;
//! use std::sync::LazyLock;
//! use cgroupfs::cgroup::stats::KeyValueStat;
//!
//! #[derive(Default)]
//! struct Throttling {
//!     nr_throttled: u64,
//! }
//!
//! static HANDLERS: LazyLock<HashMap<&'static str, fn(&mut Throttling, u64)>> =
//!     LazyLock::new(|| {
//!         let mut m: HashMap<&'static str, fn(&mut Throttling, u64)> = HashMap::new();
//!         m.insert("nr_throttled", |s, v| s.nr_throttled = v);
//!         m
//!     });
//!
//! impl KeyValueStat for Throttling {
//!     fn field_handlers() -> &'static HashMap<&'static str, fn(&mut Self, u64)> {
//!         &HANDLERS
//!     }
//! }
//!
//! let stat = Throttling::from_reader(&mut "nr_periods 7\nnr_throttled 3\n".as_bytes()).unwrap();
//! assert_eq!(stat.nr_throttled, 3);
//! ```

use std::collections::{HashMap, HashSet};
use std::io::BufRead;

use super::StatParseError;

/// Parses `key value` files into a struct.
///
/// Each line carries one key followed by its value; trailing tokens such as a
/// `kB` unit are ignored. [`field_handlers`](Self::field_handlers) maps every
/// known key to the function storing its value.
pub trait KeyValueStat: Default
where
    Self: 'static,
{
    fn field_handlers() -> &'static HashMap<&'static str, fn(&mut Self, u64)>;

    /// Parses a whole file. Parsing stops as soon as every known key was seen.
    ///
    /// # Errors
    ///
    /// Returns an `io::Error` if reading fails, or a wrapped [`StatParseError`]
    /// for an unparsable value or a repeated key.
    fn from_reader<R: BufRead>(buf: &mut R) -> std::io::Result<Self> {
        let mut stat = Self::default();
        let handlers = Self::field_handlers();
        let mut seen_keys = HashSet::with_capacity(handlers.len());

        let mut line = String::new();
        let mut lineno = 0;
        while buf.read_line(&mut line)? != 0 {
            lineno += 1;
            let mut parts = line.split_whitespace();
            if let (Some(key), Some(val)) = (parts.next(), parts.next()) {
                if let Some((k, handler)) = handlers.get_key_value(key) {
                    let parsed =
                        val.parse::<u64>()
                            .map_err(|source| StatParseError::InvalidKeyValue {
                                key: key.to_string(),
                                value: val.to_string(),
                                line: lineno,
                                source,
                            })?;
                    if !seen_keys.insert(*k) {
                        return Err(StatParseError::DuplicateField {
                            field: key.to_string(),
                            line: lineno,
                        }
                        .into());
                    }
                    handler(&mut stat, parsed);
                }
            }

            if seen_keys.len() == handlers.len() {
                break;
            }
            line.clear();
        }

        Ok(stat)
    }
}

/// Parses a statistics file that holds a single line.
pub trait SingleLineStat: Sized + Default {
    /// # Errors
    ///
    /// Returns an `io::Error` if reading fails or the line cannot be parsed.
    fn from_reader<R: BufRead>(buf: &mut R) -> std::io::Result<Self>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cgroup::stats::error::extract_stat_parse_error;
    use std::sync::LazyLock;

    #[derive(Debug, Default, PartialEq)]
    struct Pair {
        a: u64,
        b: u64,
    }

    static HANDLERS: LazyLock<HashMap<&'static str, fn(&mut Pair, u64)>> = LazyLock::new(|| {
        let mut m: HashMap<&'static str, fn(&mut Pair, u64)> = HashMap::new();
        m.insert("a", |s, v| s.a = v);
        m.insert("b", |s, v| s.b = v);
        m
    });

    impl KeyValueStat for Pair {
        fn field_handlers() -> &'static HashMap<&'static str, fn(&mut Self, u64)> {
            &HANDLERS
        }
    }

    #[test]
    fn test_unknown_keys_and_units_are_ignored() {
        let stat = Pair::from_reader(&mut "x 1\na 2 kB\n\nb 3\n".as_bytes()).unwrap();
        assert_eq!(stat, Pair { a: 2, b: 3 });
    }

    #[test]
    fn test_stops_after_all_keys() {
        // The trailing garbage is never read.
        let stat = Pair::from_reader(&mut "a 1\nb 2\na x\n".as_bytes()).unwrap();
        assert_eq!(stat, Pair { a: 1, b: 2 });
    }

    #[test]
    fn test_duplicate_key() {
        let err = Pair::from_reader(&mut "a 1\na 2\n".as_bytes()).unwrap_err();
        match extract_stat_parse_error(&err) {
            StatParseError::DuplicateField { field, line } => {
                assert_eq!(field, "a");
                assert_eq!(*line, 2);
            }
            other => panic!("Expected DuplicateField error, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_value() {
        let err = Pair::from_reader(&mut "b -1\n".as_bytes()).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
        assert!(matches!(
            extract_stat_parse_error(&err),
            StatParseError::InvalidKeyValue { line: 1, .. }
        ));
    }
}
