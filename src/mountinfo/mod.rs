//! Cgroup subsystem mount point discovery from `/proc/[pid]/mountinfo`.
mod detect;
mod error;
mod parser;
mod resolver;

pub use detect::find_cgroup_mount_point;
pub use error::{Error, Result};
pub use parser::{MountInfo, MountInfoField, ParseError, parse_mount_info_line};
pub use resolver::{MountInfoResolver, MountResolver, SELF_MOUNTINFO};
