use std::io;
use std::path::PathBuf;

use crate::cgroup::stats::{
    HostMemInfo, KeyValueStat, MemoryLimit, MemoryStat, MemoryUsage, SingleLineStat,
};
use crate::fs::FileNode;

use super::{HostPaths, MEMINFO_INODE, read_file, read_optional_file};

/// `/proc/meminfo` scoped to a memory cgroup.
///
/// Totals are the cgroup limits, capped by the host's physical memory and swap.
/// Swap is reported as zero when the kernel does not account it
/// (no `memory.memsw.*` files).
#[derive(Debug, Clone)]
pub struct MemInfoNode {
    cgroup: PathBuf,
    host: HostPaths,
}

/// Values shown in the rendered file, in kibibytes.
#[derive(Debug, Default, PartialEq, Eq)]
struct MemInfo {
    total: u64,
    free: u64,
    available: u64,
    cached: u64,
    active_anon: u64,
    inactive_anon: u64,
    active_file: u64,
    inactive_file: u64,
    unevictable: u64,
    swap_total: u64,
    swap_free: u64,
    shmem: u64,
    mapped: u64,
}

impl MemInfoNode {
    pub fn new(cgroup: PathBuf, host: HostPaths) -> Self {
        Self { cgroup, host }
    }

    fn collect(&self) -> io::Result<MemInfo> {
        let host = read_file(&self.host.meminfo(), HostMemInfo::from_reader)?;
        let limit = read_file(
            &self.cgroup.join("memory.limit_in_bytes"),
            MemoryLimit::from_reader,
        )?;
        let usage = read_file(
            &self.cgroup.join("memory.usage_in_bytes"),
            MemoryUsage::from_reader,
        )?;
        let stat = read_file(&self.cgroup.join("memory.stat"), MemoryStat::from_reader)?;
        let memsw_limit = read_optional_file(
            &self.cgroup.join("memory.memsw.limit_in_bytes"),
            MemoryLimit::from_reader,
        )?;
        let memsw_usage = read_optional_file(
            &self.cgroup.join("memory.memsw.usage_in_bytes"),
            MemoryUsage::from_reader,
        )?;

        let total = limit
            .limit_bytes
            .map_or(host.mem_total_kb, |bytes| (bytes / 1024).min(host.mem_total_kb));
        let used = (usage.usage_bytes / 1024).min(total);
        let free = total - used;
        let cached = stat.cache / 1024;

        let (swap_total, swap_free) = match (memsw_limit, memsw_usage) {
            (Some(memsw_limit), Some(memsw_usage)) => {
                // memsw counters include memory, swap is the difference.
                let swap_total = match (memsw_limit.limit_bytes, limit.limit_bytes) {
                    (Some(memsw), Some(mem)) => {
                        (memsw.saturating_sub(mem) / 1024).min(host.swap_total_kb)
                    }
                    _ => host.swap_total_kb,
                };
                let swap_used = (memsw_usage.usage_bytes.saturating_sub(usage.usage_bytes)
                    / 1024)
                    .min(swap_total);
                (swap_total, swap_total - swap_used)
            }
            _ => (0, 0),
        };

        Ok(MemInfo {
            total,
            free,
            available: (free + cached).min(total),
            cached,
            active_anon: stat.active_anon / 1024,
            inactive_anon: stat.inactive_anon / 1024,
            active_file: stat.active_file / 1024,
            inactive_file: stat.inactive_file / 1024,
            unevictable: stat.unevictable / 1024,
            swap_total,
            swap_free,
            shmem: stat.shmem / 1024,
            mapped: stat.mapped_file / 1024,
        })
    }
}

impl MemInfo {
    fn render(&self) -> String {
        let lines = [
            ("MemTotal", self.total),
            ("MemFree", self.free),
            ("MemAvailable", self.available),
            ("Buffers", 0),
            ("Cached", self.cached),
            ("SwapCached", 0),
            ("Active", self.active_anon + self.active_file),
            ("Inactive", self.inactive_anon + self.inactive_file),
            ("Active(anon)", self.active_anon),
            ("Inactive(anon)", self.inactive_anon),
            ("Active(file)", self.active_file),
            ("Inactive(file)", self.inactive_file),
            ("Unevictable", self.unevictable),
            ("SwapTotal", self.swap_total),
            ("SwapFree", self.swap_free),
            ("Shmem", self.shmem),
            ("Mapped", self.mapped),
        ];

        lines
            .iter()
            .map(|(key, kb)| format!("{:<16}{:>8} kB\n", format!("{key}:"), kb))
            .collect()
    }
}

impl FileNode for MemInfoNode {
    fn inode(&self) -> u64 {
        MEMINFO_INODE
    }

    fn read_content(&self) -> io::Result<Vec<u8>> {
        Ok(self.collect()?.render().into_bytes())
    }
}
