//! Mount configuration, read from the environment at start-up.
//!
//! | variable               | default  |                                        |
//! |------------------------|----------|----------------------------------------|
//! | `CGROUPFS_MOUNT_POINT` | required | where the directory is mounted         |
//! | `CGROUPFS_CGROUP_PATH` | `/`      | cgroup of the container                |
//! | `CGROUPFS_INTERFACE`   | empty    | host end of the container's link       |
//! | `CGROUPFS_PROC_ROOT`   | `/proc`  | procfs with the host-wide files        |
//! | `CGROUPFS_ALLOW_OTHER` | `false`  | let other users access the mount       |
use std::path::PathBuf;

use crate::files::DEFAULT_PROC_ROOT;

pub const MOUNT_POINT_VAR: &str = "CGROUPFS_MOUNT_POINT";
pub const CGROUP_PATH_VAR: &str = "CGROUPFS_CGROUP_PATH";
pub const INTERFACE_VAR: &str = "CGROUPFS_INTERFACE";
pub const PROC_ROOT_VAR: &str = "CGROUPFS_PROC_ROOT";
pub const ALLOW_OTHER_VAR: &str = "CGROUPFS_ALLOW_OTHER";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum Error {
    #[error("environment variable `{var}` must be set")]
    Missing { var: &'static str },
    #[error("environment variable `{var}` must be a boolean, got `{value}`")]
    InvalidBool { var: &'static str, value: String },
}

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub mount_point: PathBuf,
    /// Cgroup path relative to each subsystem's mount point.
    pub cgroup_path: String,
    /// Host-side network interface; empty when the container has none.
    pub interface: String,
    pub proc_root: PathBuf,
    pub allow_other: bool,
}

impl Config {
    /// Reads the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// See [`Config::from_lookup`].
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Reads the configuration through `lookup`, which returns the value of a
    /// variable if it is set.
    ///
    /// # Errors
    ///
    /// - [`Error::Missing`] if `CGROUPFS_MOUNT_POINT` is unset or empty.
    /// - [`Error::InvalidBool`] if `CGROUPFS_ALLOW_OTHER` is not a boolean.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mount_point = lookup(MOUNT_POINT_VAR)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .ok_or(Error::Missing {
                var: MOUNT_POINT_VAR,
            })?;
        let cgroup_path = lookup(CGROUP_PATH_VAR).unwrap_or_else(|| String::from("/"));
        let interface = lookup(INTERFACE_VAR).unwrap_or_default();
        let proc_root = lookup(PROC_ROOT_VAR)
            .filter(|v| !v.is_empty())
            .map_or_else(|| PathBuf::from(DEFAULT_PROC_ROOT), PathBuf::from);
        let allow_other = match lookup(ALLOW_OTHER_VAR) {
            Some(value) => parse_bool(ALLOW_OTHER_VAR, value)?,
            None => false,
        };

        Ok(Config {
            mount_point,
            cgroup_path,
            interface,
            proc_root,
            allow_other,
        })
    }
}

fn parse_bool(var: &'static str, value: String) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "" | "0" | "false" | "no" => Ok(false),
        _ => Err(Error::InvalidBool { var, value }),
    }
}
