use std::path::{Path, PathBuf};

/// Default mount point of the host's procfs.
pub const DEFAULT_PROC_ROOT: &str = "/proc";

/// Locations of the host-wide files the pseudo-files are derived from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostPaths {
    proc_root: PathBuf,
}

impl HostPaths {
    pub fn new(proc_root: impl Into<PathBuf>) -> Self {
        Self {
            proc_root: proc_root.into(),
        }
    }

    pub fn proc_root(&self) -> &Path {
        &self.proc_root
    }

    pub fn meminfo(&self) -> PathBuf {
        self.proc_root.join("meminfo")
    }

    pub fn cpuinfo(&self) -> PathBuf {
        self.proc_root.join("cpuinfo")
    }

    pub fn stat(&self) -> PathBuf {
        self.proc_root.join("stat")
    }

    pub fn diskstats(&self) -> PathBuf {
        self.proc_root.join("diskstats")
    }

    pub fn net_dev(&self) -> PathBuf {
        self.proc_root.join("net/dev")
    }
}

impl Default for HostPaths {
    fn default() -> Self {
        Self::new(DEFAULT_PROC_ROOT)
    }
}
