use std::path::{Path, PathBuf};

use super::{Result, find_cgroup_mount_point};

/// Default location of the mount table of the current process.
pub const SELF_MOUNTINFO: &str = "/proc/self/mountinfo";

/// Resolves the host mount point of a cgroup subsystem.
pub trait MountResolver: Send + Sync {
    /// Returns the current mount point of `subsystem`.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`](super::Error) if the subsystem is not mounted or the
    /// mount table cannot be read.
    fn mount_point(&self, subsystem: &str) -> Result<PathBuf>;
}

/// A [`MountResolver`] that re-reads a mountinfo file on every query, so
/// hierarchies mounted after start-up are picked up without invalidation.
#[derive(Debug, Clone)]
pub struct MountInfoResolver {
    mountinfo: PathBuf,
}

impl MountInfoResolver {
    pub fn new(mountinfo: impl Into<PathBuf>) -> Self {
        Self {
            mountinfo: mountinfo.into(),
        }
    }

    pub fn mountinfo(&self) -> &Path {
        &self.mountinfo
    }
}

impl Default for MountInfoResolver {
    fn default() -> Self {
        Self::new(SELF_MOUNTINFO)
    }
}

impl MountResolver for MountInfoResolver {
    fn mount_point(&self, subsystem: &str) -> Result<PathBuf> {
        find_cgroup_mount_point(&self.mountinfo, subsystem)
    }
}
