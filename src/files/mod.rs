//! The pseudo-files and the standard [`Registry`] that presents them.
//!
//! Every node renders its content on each read, combining the control files of
//! its cgroup with the corresponding host file so the output keeps the syntax
//! of the host file it replaces.
mod cpuinfo;
mod diskstats;
mod error;
mod host;
mod meminfo;
mod net_dev;
mod stat;

pub use cpuinfo::CpuInfoNode;
pub use diskstats::DiskStatsNode;
pub use error::ReadError;
pub use host::{DEFAULT_PROC_ROOT, HostPaths};
pub use meminfo::MemInfoNode;
pub use net_dev::NetDevNode;
pub use stat::StatNode;

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

use crate::fs::{Registry, RegistryError, factory};
use crate::fsutil;

pub const MEMINFO_INODE: u64 = 3;
pub const DISKSTATS_INODE: u64 = 4;
pub const CPUINFO_INODE: u64 = 5;
pub const STAT_INODE: u64 = 6;
pub const NET_DEV_INODE: u64 = 7;

/// Builds the registry of all pseudo-files, reading host data below `host`.
///
/// # Errors
///
/// Returns a [`RegistryError`] if the table is inconsistent.
pub fn standard_registry(host: HostPaths) -> Result<Registry, RegistryError> {
    Ok(Registry::builder()
        .register(
            "meminfo",
            MEMINFO_INODE,
            "memory",
            factory(with_host(&host, MemInfoNode::new)),
        )?
        .register(
            "diskstats",
            DISKSTATS_INODE,
            "blkio",
            factory(with_host(&host, DiskStatsNode::new)),
        )?
        .register(
            "cpuinfo",
            CPUINFO_INODE,
            "cpuset",
            factory(with_host(&host, CpuInfoNode::new)),
        )?
        .register(
            "stat",
            STAT_INODE,
            "cpuacct",
            factory(with_host(&host, StatNode::new)),
        )?
        .register(
            "net_dev",
            NET_DEV_INODE,
            "",
            factory(with_host(&host, NetDevNode::new)),
        )?
        .build())
}

/// Binds the host paths into a node constructor.
fn with_host<N: 'static>(
    host: &HostPaths,
    build: fn(PathBuf, HostPaths) -> N,
) -> impl Fn(PathBuf) -> N + Send + Sync + 'static {
    let host = host.clone();
    move |path| build(path, host.clone())
}

/// Opens `path` and parses it, attaching the path to any failure.
fn read_file<T>(
    path: &Path,
    parse: impl FnOnce(&mut BufReader<File>) -> io::Result<T>,
) -> io::Result<T> {
    let mut reader = fsutil::open_file_reader(path)?;
    parse(&mut reader).map_err(|source| {
        ReadError {
            path: path.to_path_buf(),
            source,
        }
        .into()
    })
}

/// Like [`read_file`], but a missing file yields `Ok(None)`.
fn read_optional_file<T>(
    path: &Path,
    parse: impl FnOnce(&mut BufReader<File>) -> io::Result<T>,
) -> io::Result<Option<T>> {
    match fsutil::open_optional_file_reader(path)? {
        Some(mut reader) => parse(&mut reader).map(Some).map_err(|source| {
            ReadError {
                path: path.to_path_buf(),
                source,
            }
            .into()
        }),
        None => Ok(None),
    }
}

fn read_text(path: &Path) -> io::Result<String> {
    read_file(path, |reader| {
        let mut text = String::new();
        reader.read_to_string(&mut text)?;
        Ok(text)
    })
}
