//! Parsers for the cgroup v1 and host procfs files that back the pseudo-files.
//!
//! # Main types
//!
//! - [`MemoryStat`], [`MemoryUsage`], [`MemoryLimit`] and [`HostMemInfo`] feed `meminfo`.
//! - [`CpuSet`] feeds `cpuinfo`.
//! - [`CpuAcctStat`] and [`CpuUsagePerCpu`] feed `stat`.
//! - [`BlkioStat`] and [`DeviceNames`] feed `diskstats`.
//! - [`NetworkStat`] feeds `net_dev`.
//!
//! Parse failures surface as [`std::io::Error`]s of kind `InvalidData` wrapping a
//! [`StatParseError`].

mod cpu;
mod error;
mod io;
mod memory;
mod net;
mod parser;

pub use cpu::{CpuAcctStat, CpuSet, CpuUsagePerCpu, USER_HZ};
pub use error::StatParseError;
pub use io::{BlkioStat, DeviceNames, DeviceNumber, ReadWrite};
pub use memory::{HostMemInfo, MemoryLimit, MemoryStat, MemoryUsage};
pub use net::{NET_DEV_HEADER, NetworkStat};
pub use parser::{KeyValueStat, SingleLineStat};
