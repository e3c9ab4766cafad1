use std::collections::BTreeSet;
use std::io;
use std::path::PathBuf;

use log::trace;

use crate::cgroup::stats::{BlkioStat, DeviceNames, DeviceNumber};
use crate::fs::FileNode;

use super::{DISKSTATS_INODE, HostPaths, read_file};

const SECTOR_SIZE: u64 = 512;

/// `/proc/diskstats` limited to the I/O a blkio cgroup issued.
///
/// Completed requests come from `blkio.throttle.io_serviced`, sectors from
/// `blkio.throttle.io_service_bytes`. Fields the controller does not account
/// are zero.
#[derive(Debug, Clone)]
pub struct DiskStatsNode {
    cgroup: PathBuf,
    host: HostPaths,
}

impl DiskStatsNode {
    pub fn new(cgroup: PathBuf, host: HostPaths) -> Self {
        Self { cgroup, host }
    }
}

fn render_diskstats(serviced: &BlkioStat, bytes: &BlkioStat, names: &DeviceNames) -> String {
    let devices: BTreeSet<DeviceNumber> = serviced
        .devices
        .keys()
        .chain(bytes.devices.keys())
        .copied()
        .collect();

    let mut out = String::new();
    for device in devices {
        let Some(name) = names.get(device) else {
            trace!("Skipping unnamed block device {}:{}", device.major, device.minor);
            continue;
        };
        let ops = serviced.get(device);
        let sectors = bytes.get(device);
        out.push_str(&format!(
            "{:>4} {:>7} {} {} 0 {} 0 {} 0 {} 0 0 0 0\n",
            device.major,
            device.minor,
            name,
            ops.read,
            sectors.read / SECTOR_SIZE,
            ops.write,
            sectors.write / SECTOR_SIZE,
        ));
    }
    out
}

impl FileNode for DiskStatsNode {
    fn inode(&self) -> u64 {
        DISKSTATS_INODE
    }

    fn read_content(&self) -> io::Result<Vec<u8>> {
        let serviced = read_file(
            &self.cgroup.join("blkio.throttle.io_serviced"),
            BlkioStat::from_reader,
        )?;
        let bytes = read_file(
            &self.cgroup.join("blkio.throttle.io_service_bytes"),
            BlkioStat::from_reader,
        )?;
        let names = read_file(&self.host.diskstats(), DeviceNames::from_reader)?;
        Ok(render_diskstats(&serviced, &bytes, &names).into_bytes())
    }
}
