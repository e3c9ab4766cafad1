//! Memory statistics of a cgroup v1 memory controller and of the host.
//!
//! - [`MemoryStat`] from `memory.stat` (byte counters, one `key value` pair per line).
//! - [`MemoryUsage`] from `memory.usage_in_bytes` and `memory.memsw.usage_in_bytes`.
//! - [`MemoryLimit`] from `memory.limit_in_bytes` and `memory.memsw.limit_in_bytes`.
//! - [`HostMemInfo`] from the host's `/proc/meminfo` (kibibyte counters).
//!
//! # Examples
//!
//! ```rust
//! use cgroupfs::cgroup::stats::{MemoryStat, MemoryUsage, MemoryLimit, KeyValueStat, SingleLineStat};
//!
//! let stat = MemoryStat::from_reader(&mut "cache 4096\nrss 8192\n".as_bytes()).unwrap();
//! assert_eq!(stat.rss, 8192);
//!
//! let usage = MemoryUsage::from_reader(&mut "12288\n".as_bytes()).unwrap();
//! assert_eq!(usage.usage_bytes, 12288);
//!
//! let limit = MemoryLimit::from_reader(&mut "9223372036854771712\n".as_bytes()).unwrap();
//! assert_eq!(limit.limit_bytes, None);
//! ```

use std::collections::HashMap;
use std::io::BufRead;
use std::sync::LazyLock;

use super::parser::KeyValueStat;
use super::{SingleLineStat, StatParseError};

/// Byte counters from a cgroup v1 `memory.stat`.
///
/// Only the cgroup-local counters are read; the `total_*` hierarchy sums are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MemoryStat {
    /// Page cache, including tmpfs.
    pub cache: u64,
    /// Anonymous memory and swap cache.
    pub rss: u64,
    /// Shared memory.
    pub shmem: u64,
    /// Mapped file memory.
    pub mapped_file: u64,
    /// Swap usage. Only reported with swap accounting enabled.
    pub swap: u64,
    pub active_anon: u64,
    pub inactive_anon: u64,
    pub active_file: u64,
    pub inactive_file: u64,
    pub unevictable: u64,
}

type Setter = fn(&mut MemoryStat, u64);

static SETTERS: LazyLock<HashMap<&'static str, Setter>> = LazyLock::new(|| {
    let mut m: HashMap<&'static str, Setter> = HashMap::with_capacity(10);

    m.insert("cache", |s, v| s.cache = v);
    m.insert("rss", |s, v| s.rss = v);
    m.insert("shmem", |s, v| s.shmem = v);
    m.insert("mapped_file", |s, v| s.mapped_file = v);
    m.insert("swap", |s, v| s.swap = v);
    m.insert("active_anon", |s, v| s.active_anon = v);
    m.insert("inactive_anon", |s, v| s.inactive_anon = v);
    m.insert("active_file", |s, v| s.active_file = v);
    m.insert("inactive_file", |s, v| s.inactive_file = v);
    m.insert("unevictable", |s, v| s.unevictable = v);

    m
});

impl KeyValueStat for MemoryStat {
    fn field_handlers() -> &'static HashMap<&'static str, fn(&mut Self, u64)> {
        &SETTERS
    }
}

/// Current usage from `memory.usage_in_bytes`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MemoryUsage {
    pub usage_bytes: u64,
}

impl SingleLineStat for MemoryUsage {
    /// # Errors
    ///
    /// Returns an error of kind `InvalidData` if the value is not a `u64`.
    fn from_reader<R: BufRead>(buf: &mut R) -> std::io::Result<Self> {
        let mut line = String::new();
        buf.read_line(&mut line)?;
        let line = line.trim();
        let usage_bytes = line
            .parse::<u64>()
            .map_err(|source| StatParseError::InvalidValue {
                value: line.to_string(),
                line: 1,
                source,
            })?;

        Ok(MemoryUsage { usage_bytes })
    }
}

/// The kernel reports "no limit" as `PAGE_COUNTER_MAX` pages, i.e. just below
/// `i64::MAX` rounded down to the page size.
const UNLIMITED_THRESHOLD: u64 = 0x7FFF_FFFF_FFFF_F000;

/// Limit from `memory.limit_in_bytes`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MemoryLimit {
    /// `None` means no limit is set.
    pub limit_bytes: Option<u64>,
}

impl SingleLineStat for MemoryLimit {
    /// Accepts a byte count, or `max` as written by the unified hierarchy.
    ///
    /// # Errors
    ///
    /// Returns an error of kind `InvalidData` if the value is neither.
    fn from_reader<R: BufRead>(buf: &mut R) -> std::io::Result<Self> {
        let mut line = String::new();
        buf.read_line(&mut line)?;
        let limit_bytes = match line.trim() {
            "max" => None,
            value => {
                let bytes = value
                    .parse::<u64>()
                    .map_err(|source| StatParseError::InvalidValue {
                        value: value.to_string(),
                        line: 1,
                        source,
                    })?;
                (bytes < UNLIMITED_THRESHOLD).then_some(bytes)
            }
        };

        Ok(MemoryLimit { limit_bytes })
    }
}

/// Kibibyte counters from the host's `/proc/meminfo`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HostMemInfo {
    pub mem_total_kb: u64,
    pub swap_total_kb: u64,
    pub swap_free_kb: u64,
}

static MEMINFO_SETTERS: LazyLock<HashMap<&'static str, fn(&mut HostMemInfo, u64)>> =
    LazyLock::new(|| {
        let mut m: HashMap<&'static str, fn(&mut HostMemInfo, u64)> = HashMap::with_capacity(3);

        m.insert("MemTotal:", |s, v| s.mem_total_kb = v);
        m.insert("SwapTotal:", |s, v| s.swap_total_kb = v);
        m.insert("SwapFree:", |s, v| s.swap_free_kb = v);

        m
    });

impl KeyValueStat for HostMemInfo {
    fn field_handlers() -> &'static HashMap<&'static str, fn(&mut Self, u64)> {
        &MEMINFO_SETTERS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cgroup::stats::error::extract_stat_parse_error;

    #[test]
    fn test_parse_empty_memory_stat() {
        let stat = MemoryStat::from_reader(&mut "".as_bytes()).unwrap();
        assert_eq!(stat, MemoryStat::default());
    }

    #[test]
    fn test_parse_v1_memory_stat_ignores_hierarchy_totals() {
        let data = "\
cache 2000
rss 1000
rss_huge 0
shmem 600
mapped_file 700
swap 50
active_anon 300
inactive_anon 400
active_file 500
inactive_file 1500
unevictable 7
hierarchical_memory_limit 9223372036854771712
total_cache 999999
total_rss 999999
";
        let stat = MemoryStat::from_reader(&mut data.as_bytes()).unwrap();
        assert_eq!(
            stat,
            MemoryStat {
                cache: 2000,
                rss: 1000,
                shmem: 600,
                mapped_file: 700,
                swap: 50,
                active_anon: 300,
                inactive_anon: 400,
                active_file: 500,
                inactive_file: 1500,
                unevictable: 7,
            }
        );
    }

    #[test]
    fn test_parse_invalid_memory_stat() {
        let data = "\
invalid line
rss abc
cache 2000
";
        let err = MemoryStat::from_reader(&mut data.as_bytes()).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
        match extract_stat_parse_error(&err) {
            StatParseError::InvalidKeyValue {
                key, value, line, ..
            } => {
                assert_eq!(key, "rss");
                assert_eq!(value, "abc");
                assert_eq!(*line, 2);
            }
            other => panic!("Expected InvalidKeyValue error, got {other:?}"),
        }
    }

    #[test]
    fn test_duplicate_memory_stat_field() {
        let err = MemoryStat::from_reader(&mut "rss 1000\nrss 2000\n".as_bytes()).unwrap_err();
        match extract_stat_parse_error(&err) {
            StatParseError::DuplicateField { field, line } => {
                assert_eq!(field, "rss");
                assert_eq!(*line, 2);
            }
            other => panic!("Expected DuplicateField error, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_memory_usage() {
        let usage = MemoryUsage::from_reader(&mut "8192\n".as_bytes()).unwrap();
        assert_eq!(usage.usage_bytes, 8192);

        let err = MemoryUsage::from_reader(&mut "".as_bytes()).unwrap_err();
        match extract_stat_parse_error(&err) {
            StatParseError::InvalidValue { value, line, .. } => {
                assert_eq!(value, "");
                assert_eq!(*line, 1);
            }
            other => panic!("Expected InvalidValue error, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_memory_limit() {
        let limit = MemoryLimit::from_reader(&mut "104857600\n".as_bytes()).unwrap();
        assert_eq!(limit.limit_bytes, Some(104_857_600));

        let limit = MemoryLimit::from_reader(&mut "9223372036854771712\n".as_bytes()).unwrap();
        assert_eq!(limit.limit_bytes, None);

        let limit = MemoryLimit::from_reader(&mut "max\n".as_bytes()).unwrap();
        assert_eq!(limit.limit_bytes, None);
    }

    #[test]
    fn test_invalid_memory_limit() {
        let err = MemoryLimit::from_reader(&mut "abc\n".as_bytes()).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_parse_host_meminfo() {
        let data = "\
MemTotal:       16318216 kB
MemFree:         1234567 kB
HugePages_Total:       0
SwapTotal:       2097148 kB
SwapFree:        2000000 kB
";
        let info = HostMemInfo::from_reader(&mut data.as_bytes()).unwrap();
        assert_eq!(
            info,
            HostMemInfo {
                mem_total_kb: 16_318_216,
                swap_total_kb: 2_097_148,
                swap_free_kb: 2_000_000,
            }
        );
    }
}
