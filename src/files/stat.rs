use std::io;
use std::path::PathBuf;

use crate::cgroup::stats::{CpuAcctStat, CpuUsagePerCpu, KeyValueStat, SingleLineStat};
use crate::fs::FileNode;

use super::{HostPaths, STAT_INODE, read_file, read_text};

/// `/proc/stat` with CPU times taken from a cpuacct cgroup.
///
/// The aggregate `cpu` line carries the cgroup's user and system ticks. Each
/// `cpuN` line splits that CPU's usage in the same user/system ratio. Lines
/// that are not CPU times are copied from the host.
#[derive(Debug, Clone)]
pub struct StatNode {
    cgroup: PathBuf,
    host: HostPaths,
}

impl StatNode {
    pub fn new(cgroup: PathBuf, host: HostPaths) -> Self {
        Self { cgroup, host }
    }
}

fn cpu_line(label: &str, user: u64, system: u64) -> String {
    format!("{label} {user} 0 {system} 0 0 0 0 0 0 0\n")
}

fn render_stat(acct: &CpuAcctStat, usage: &CpuUsagePerCpu, host: &str) -> String {
    let mut out = cpu_line("cpu ", acct.user, acct.system);

    let total = u128::from(acct.user) + u128::from(acct.system);
    for cpu in 0..usage.usage_nanos.len() {
        let ticks = usage.ticks(cpu);
        let user = if total == 0 {
            ticks
        } else {
            // Bounded by `ticks`, so the narrowing cannot truncate.
            (u128::from(ticks) * u128::from(acct.user) / total) as u64
        };
        out.push_str(&cpu_line(&format!("cpu{cpu}"), user, ticks - user));
    }

    for line in host.lines().filter(|line| !line.starts_with("cpu")) {
        out.push_str(line);
        out.push('\n');
    }

    out
}

impl FileNode for StatNode {
    fn inode(&self) -> u64 {
        STAT_INODE
    }

    fn read_content(&self) -> io::Result<Vec<u8>> {
        let acct = read_file(&self.cgroup.join("cpuacct.stat"), CpuAcctStat::from_reader)?;
        let usage = read_file(
            &self.cgroup.join("cpuacct.usage_percpu"),
            CpuUsagePerCpu::from_reader,
        )?;
        let host = read_text(&self.host.stat())?;
        Ok(render_stat(&acct, &usage, &host).into_bytes())
    }
}
