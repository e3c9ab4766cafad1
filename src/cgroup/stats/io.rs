//! Block I/O accounting of the cgroup v1 `blkio` controller.
//!
//! `blkio.throttle.io_serviced` and `blkio.throttle.io_service_bytes` share one
//! layout: a `<major>:<minor> <operation> <value>` line per device and
//! operation, closed by a `Total <value>` line.
//!
//! ```text
//! 8:0 Read 1024
//! 8:0 Write 2048
//! 8:0 Sync 3072
//! 8:0 Async 0
//! 8:0 Total 3072
//! Total 3072
//! ```
//!
//! [`BlkioStat`] keeps the `Read` and `Write` counters per device; the other
//! operations are ignored. [`DeviceNames`] maps device numbers to names using
//! the host's `/proc/diskstats`.

use std::collections::{BTreeMap, HashMap};
use std::io::BufRead;

use super::StatParseError;

/// A block device number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DeviceNumber {
    pub major: u32,
    pub minor: u32,
}

impl std::str::FromStr for DeviceNumber {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (major, minor) = s.split_once(':').unwrap_or((s, ""));
        Ok(DeviceNumber {
            major: major.parse()?,
            minor: minor.parse()?,
        })
    }
}

/// Read and write counters of one device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReadWrite {
    pub read: u64,
    pub write: u64,
}

/// Per-device counters from one blkio accounting file, ordered by device number.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BlkioStat {
    pub devices: BTreeMap<DeviceNumber, ReadWrite>,
}

impl BlkioStat {
    /// # Errors
    ///
    /// Returns an error of kind `InvalidData` for a malformed device number or value.
    pub fn from_reader<R: BufRead>(buf: &mut R) -> std::io::Result<Self> {
        let mut stat = BlkioStat::default();
        let mut line = String::new();
        let mut lineno = 0;

        while buf.read_line(&mut line)? != 0 {
            lineno += 1;
            let mut parts = line.split_whitespace();
            if let (Some(device), Some(op), Some(value)) = (parts.next(), parts.next(), parts.next())
            {
                let device: DeviceNumber =
                    device.parse().map_err(|_| StatParseError::InvalidDevice {
                        value: device.to_string(),
                        line: lineno,
                    })?;
                let value =
                    value
                        .parse::<u64>()
                        .map_err(|source| StatParseError::InvalidKeyValue {
                            key: op.to_string(),
                            value: value.to_string(),
                            line: lineno,
                            source,
                        })?;
                let counters = stat.devices.entry(device).or_default();
                match op {
                    "Read" => counters.read += value,
                    "Write" => counters.write += value,
                    _ => {}
                }
            }
            line.clear();
        }

        Ok(stat)
    }

    pub fn get(&self, device: DeviceNumber) -> ReadWrite {
        self.devices.get(&device).copied().unwrap_or_default()
    }
}

/// Device names by device number, from the host's `/proc/diskstats`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DeviceNames {
    names: HashMap<DeviceNumber, String>,
}

impl DeviceNames {
    /// Lines that do not start with two numeric fields and a name are skipped.
    pub fn from_reader<R: BufRead>(buf: &mut R) -> std::io::Result<Self> {
        let mut names = HashMap::new();
        let mut line = String::new();

        while buf.read_line(&mut line)? != 0 {
            let mut parts = line.split_whitespace();
            if let (Some(major), Some(minor), Some(name)) = (parts.next(), parts.next(), parts.next())
            {
                if let (Ok(major), Ok(minor)) = (major.parse(), minor.parse()) {
                    names.insert(DeviceNumber { major, minor }, name.to_owned());
                }
            }
            line.clear();
        }

        Ok(DeviceNames { names })
    }

    pub fn get(&self, device: DeviceNumber) -> Option<&str> {
        self.names.get(&device).map(String::as_str)
    }
}
