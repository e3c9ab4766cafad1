//! CPU accounting of the cgroup v1 `cpuacct` and `cpuset` controllers.
//!
//! - [`CpuAcctStat`] from `cpuacct.stat`: user and system time in `USER_HZ` ticks.
//! - [`CpuUsagePerCpu`] from `cpuacct.usage_percpu`: nanoseconds per host CPU.
//! - [`CpuSet`] from `cpuset.cpus`: the CPUs the cgroup may run on, in kernel
//!   list format (`0-3,8,10-11`).
//!
//! # Examples
//!
//! ```rust
//! use cgroupfs::cgroup::stats::{CpuAcctStat, CpuSet, KeyValueStat, SingleLineStat};
//!
//! let stat = CpuAcctStat::from_reader(&mut "user 4056\nsystem 1234\n".as_bytes()).unwrap();
//! assert_eq!(stat.user, 4056);
//!
//! let cpus = CpuSet::from_reader(&mut "0-2,5\n".as_bytes()).unwrap();
//! assert!(cpus.contains(5));
//! assert_eq!(cpus.len(), 4);
//! ```

use std::collections::{BTreeSet, HashMap};
use std::io::BufRead;
use std::sync::LazyLock;

use super::{KeyValueStat, SingleLineStat, StatParseError};

/// Kernel `USER_HZ`: the tick rate of `cpuacct.stat` and `/proc/stat`.
pub const USER_HZ: u64 = 100;

const NANOS_PER_TICK: u64 = 1_000_000_000 / USER_HZ;

/// Largest CPU count the kernel can be configured for (`CONFIG_NR_CPUS`).
const MAX_CPUS: u32 = 8192;

/// Parsed `cpuacct.stat`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CpuAcctStat {
    /// Ticks spent in user mode.
    pub user: u64,
    /// Ticks spent in kernel mode.
    pub system: u64,
}

static SETTERS: LazyLock<HashMap<&'static str, fn(&mut CpuAcctStat, u64)>> =
    LazyLock::new(|| {
        let mut m: HashMap<&'static str, fn(&mut CpuAcctStat, u64)> = HashMap::with_capacity(2);

        m.insert("user", |s, v| s.user = v);
        m.insert("system", |s, v| s.system = v);

        m
    });

impl KeyValueStat for CpuAcctStat {
    fn field_handlers() -> &'static HashMap<&'static str, fn(&mut Self, u64)> {
        &SETTERS
    }
}

/// Parsed `cpuacct.usage_percpu`, indexed by host CPU number.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CpuUsagePerCpu {
    pub usage_nanos: Vec<u64>,
}

impl CpuUsagePerCpu {
    /// Usage of `cpu` converted to `USER_HZ` ticks.
    pub fn ticks(&self, cpu: usize) -> u64 {
        self.usage_nanos.get(cpu).copied().unwrap_or(0) / NANOS_PER_TICK
    }
}

impl SingleLineStat for CpuUsagePerCpu {
    fn from_reader<R: BufRead>(buf: &mut R) -> std::io::Result<Self> {
        let mut line = String::new();
        buf.read_line(&mut line)?;
        let usage_nanos = line
            .split_whitespace()
            .map(|value| {
                value
                    .parse::<u64>()
                    .map_err(|source| StatParseError::InvalidValue {
                        value: value.to_string(),
                        line: 1,
                        source,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(CpuUsagePerCpu { usage_nanos })
    }
}

/// Parsed `cpuset.cpus`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CpuSet {
    cpus: BTreeSet<u32>,
}

impl CpuSet {
    pub fn contains(&self, cpu: u32) -> bool {
        self.cpus.contains(&cpu)
    }

    pub fn len(&self) -> usize {
        self.cpus.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cpus.is_empty()
    }

    /// CPUs in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.cpus.iter().copied()
    }
}

fn parse_cpu(value: &str) -> Result<u32, StatParseError> {
    value
        .parse::<u32>()
        .map_err(|source| StatParseError::InvalidValue {
            value: value.to_string(),
            line: 1,
            source,
        })
}

impl SingleLineStat for CpuSet {
    /// # Errors
    ///
    /// Returns an error of kind `InvalidData` for a non-numeric CPU, a
    /// descending range or a range reaching past the kernel's CPU limit.
    fn from_reader<R: BufRead>(buf: &mut R) -> std::io::Result<Self> {
        let mut line = String::new();
        buf.read_line(&mut line)?;

        let mut cpus = BTreeSet::new();
        for item in line.trim().split(',').filter(|item| !item.is_empty()) {
            match item.split_once('-') {
                Some((start, end)) => {
                    let (start, end) = (parse_cpu(start)?, parse_cpu(end)?);
                    if start > end || end >= MAX_CPUS {
                        return Err(StatParseError::InvalidRange {
                            value: item.to_string(),
                            line: 1,
                        }
                        .into());
                    }
                    cpus.extend(start..=end);
                }
                None => {
                    cpus.insert(parse_cpu(item)?);
                }
            }
        }

        Ok(CpuSet { cpus })
    }
}
