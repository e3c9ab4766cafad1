use std::io;
use std::path::PathBuf;

use crate::cgroup::stats::{CpuSet, SingleLineStat};
use crate::fs::FileNode;

use super::{CPUINFO_INODE, HostPaths, read_file, read_text};

/// `/proc/cpuinfo` restricted to the CPUs of a cpuset cgroup.
///
/// Processor blocks of CPUs outside `cpuset.cpus` are dropped and the rest are
/// renumbered from 0. Blocks without a `processor` line (architecture-wide
/// trailers) are kept.
#[derive(Debug, Clone)]
pub struct CpuInfoNode {
    cgroup: PathBuf,
    host: HostPaths,
}

impl CpuInfoNode {
    pub fn new(cgroup: PathBuf, host: HostPaths) -> Self {
        Self { cgroup, host }
    }
}

/// Returns the CPU number of a `processor\t: N` line.
fn processor_number(line: &str) -> Option<u32> {
    let (key, value) = line.split_once(':')?;
    if key.trim() != "processor" {
        return None;
    }
    value.trim().parse().ok()
}

fn filter_cpuinfo(host: &str, cpus: &CpuSet) -> String {
    let mut out = String::with_capacity(host.len());
    let mut next_index = 0;

    for block in host.split("\n\n").filter(|block| !block.trim().is_empty()) {
        let cpu = block.lines().find_map(processor_number);
        if cpu.is_some_and(|cpu| !cpus.contains(cpu)) {
            continue;
        }

        for line in block.lines() {
            if processor_number(line).is_some() {
                out.push_str(&format!("processor\t: {next_index}\n"));
            } else {
                out.push_str(line);
                out.push('\n');
            }
        }
        out.push('\n');

        if cpu.is_some() {
            next_index += 1;
        }
    }

    out
}

impl FileNode for CpuInfoNode {
    fn inode(&self) -> u64 {
        CPUINFO_INODE
    }

    fn read_content(&self) -> io::Result<Vec<u8>> {
        let cpus = read_file(&self.cgroup.join("cpuset.cpus"), CpuSet::from_reader)?;
        let host = read_text(&self.host.cpuinfo())?;
        Ok(filter_cpuinfo(&host, &cpus).into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const HOST_CPUINFO: &str = "\
processor\t: 0
model name\t: Test CPU
core id\t\t: 0

processor\t: 1
model name\t: Test CPU
core id\t\t: 1

processor\t: 2
model name\t: Test CPU
core id\t\t: 2

processor\t: 3
model name\t: Test CPU
core id\t\t: 3

";

    fn cpuset(list: &str) -> CpuSet {
        CpuSet::from_reader(&mut list.as_bytes()).unwrap()
    }

    #[test]
    fn test_filter_and_renumber() {
        let out = filter_cpuinfo(HOST_CPUINFO, &cpuset("1,3\n"));
        assert_eq!(
            out,
            "\
processor\t: 0
model name\t: Test CPU
core id\t\t: 1

processor\t: 1
model name\t: Test CPU
core id\t\t: 3

"
        );
    }

    #[test]
    fn test_all_cpus_keep_host_content() {
        assert_eq!(filter_cpuinfo(HOST_CPUINFO, &cpuset("0-3\n")), HOST_CPUINFO);
    }

    #[test]
    fn test_blocks_without_processor_are_kept() {
        let host = "processor\t: 0\nBogoMIPS\t: 50.00\n\nprocessor\t: 1\nBogoMIPS\t: 50.00\n\nHardware\t: Test Board\n";
        let out = filter_cpuinfo(host, &cpuset("1\n"));
        assert_eq!(
            out,
            "processor\t: 0\nBogoMIPS\t: 50.00\n\nHardware\t: Test Board\n\n"
        );
    }

    #[test]
    fn test_read_content() {
        let dir = tempfile::tempdir().unwrap();
        let proc_root = dir.path().join("proc");
        let cgroup = dir.path().join("cpuset/docker/abc");
        fs::create_dir_all(&proc_root).unwrap();
        fs::create_dir_all(&cgroup).unwrap();
        fs::write(proc_root.join("cpuinfo"), HOST_CPUINFO).unwrap();
        fs::write(cgroup.join("cpuset.cpus"), "2\n").unwrap();

        let node = CpuInfoNode::new(cgroup, HostPaths::new(proc_root));
        let content = String::from_utf8(node.read_content().unwrap()).unwrap();

        assert_eq!(content.matches("processor").count(), 1);
        assert!(content.contains("core id\t\t: 2"));
    }
}
