use crate::fsutil;

use super::parser::parse_mount_info_line;
use super::{Error, Result};
use std::io::BufRead;
use std::path::{Path, PathBuf};

/// Finds the mount point of a cgroup v1 subsystem by parsing the given `mountinfo` file.
///
/// The first entry with filesystem type `cgroup` whose superblock options list
/// `subsystem` wins. Co-mounted hierarchies such as `cpu,cpuacct` match either name.
///
/// # Errors
///
/// - [`Error::FileOpen`] if the file can't be opened.
/// - [`Error::ReadLine`] if reading from the file fails.
/// - [`Error::Parse`] if parsing any line fails.
/// - [`Error::MissingCgroupMount`] if no matching entry is found.
///
/// # Example
///
/// ```no_run
/// use cgroupfs::mountinfo::find_cgroup_mount_point;
///
/// let memory = find_cgroup_mount_point("/proc/self/mountinfo", "memory").unwrap();
/// println!("memory cgroup: {}", memory.display());
/// ```
pub fn find_cgroup_mount_point(path: impl AsRef<Path>, subsystem: &str) -> Result<PathBuf> {
    let path = path.as_ref();
    let buf = fsutil::open_file_reader(path)?;

    find_cgroup_mount_point_from_reader(buf, path, subsystem)
}

/// Reader-based implementation of [`find_cgroup_mount_point`].
///
/// `origin` names the data source in error messages.
fn find_cgroup_mount_point_from_reader<R: BufRead>(
    mut reader: R,
    origin: &Path,
    subsystem: &str,
) -> Result<PathBuf> {
    let mut line = String::with_capacity(256);

    while reader
        .read_line(&mut line)
        .map_err(|source| Error::ReadLine {
            path: origin.to_path_buf(),
            source,
        })?
        != 0
    {
        let mount_info = parse_mount_info_line(line.as_str()).map_err(|source| Error::Parse {
            path: origin.to_path_buf(),
            source,
        })?;
        if mount_info.fs_type == "cgroup" && mount_info.has_super_option(subsystem) {
            log::trace!(
                "Found `{}` cgroup mount point with root `{}`: {}",
                subsystem,
                mount_info.root,
                mount_info.mount_point
            );
            return Ok(PathBuf::from(mount_info.mount_point.into_owned()));
        }

        line.clear();
    }

    Err(Error::MissingCgroupMount {
        subsystem: subsystem.to_owned(),
        path: origin.to_path_buf(),
    })
}
