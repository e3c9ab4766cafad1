//! Cgroup v1 accounting data.
//!
//! The pseudo-files read their data from the control files of one cgroup per
//! subsystem. This module holds the parsers for those files and for the host
//! procfs files they are combined with.
//!
//! # Platform Requirements
//!
//! - Linux with the cgroup v1 `memory`, `cpuset`, `cpuacct` and `blkio` controllers.
//! - Read access to the subsystem hierarchies below `/sys/fs/cgroup` and to `/proc`.
pub mod stats;
