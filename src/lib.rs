//! cgroupfs: a synthetic directory of container-scoped `/proc` files.
//!
//! Each mount presents files such as `meminfo`, `cpuinfo` or `stat` whose
//! content is computed from the cgroup v1 controllers of one container, so
//! tools reading them inside the container see the container's resources
//! instead of the host's.
//!
//! The core ([`fs`]) resolves names through a [`mountinfo::MountResolver`] and
//! reports ownership through an [`identity::IdentityProvider`]; the [`fuse`]
//! module serves it to the kernel.
pub mod cgroup;
pub mod config;
pub mod error;
pub mod files;
pub mod fs;
pub mod fsutil;
pub mod identity;
pub mod mountinfo;

#[cfg(all(feature = "fuse", target_os = "linux"))]
pub mod fuse;

#[cfg(all(feature = "fuse", target_os = "linux"))]
pub use app::run;

#[cfg(all(feature = "fuse", target_os = "linux"))]
mod app {
    use std::sync::Arc;

    use crate::config::Config;
    use crate::error::ResultOkLogExt;
    use crate::files::{HostPaths, standard_registry};
    use crate::fs::DirectoryNode;
    use crate::fuse;
    use crate::identity::ProcessIdentity;
    use crate::mountinfo::{MountInfoResolver, MountResolver};

    /// Runs cgroupfs with the configuration from the environment.
    ///
    /// Blocks until the filesystem is unmounted.
    ///
    /// # Errors
    ///
    /// Possible errors include:
    /// - Missing or malformed environment variables (e.g., `CGROUPFS_MOUNT_POINT`).
    /// - Failure to mount the filesystem.
    pub fn run() -> Result<(), Box<dyn std::error::Error>> {
        let config = Config::from_env()?;
        log::debug!("Configuration: {config:?}");

        let registry = Arc::new(standard_registry(HostPaths::new(config.proc_root.clone()))?);
        let resolver = Arc::new(MountInfoResolver::default());
        for subsystem in registry.iter().filter_map(|desc| desc.subsystem()) {
            if let Some(mount_point) = resolver.mount_point(subsystem).ok_log() {
                log::debug!("Subsystem `{subsystem}` mounted at {}", mount_point.display());
            }
        }

        let dir = DirectoryNode::new(
            registry,
            resolver,
            Arc::new(ProcessIdentity),
            config.cgroup_path,
            config.interface,
        );
        dir.attr().ok_log();

        fuse::mount(fuse::CgroupFs::new(dir), &config.mount_point, config.allow_other)?;
        Ok(())
    }
}
