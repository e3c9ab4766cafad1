use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::identity::IdentityProvider;
use crate::mountinfo::MountResolver;

use super::node::{FileNode, HelloNode};
use super::registry::{DirectoryEntry, EntryKind, Registry};
use super::{DIR_INODE, DIR_PERMISSIONS, Error, HELLO_NAME, Result};

/// Attributes of the synthetic directory itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirAttr {
    pub inode: u64,
    pub kind: EntryKind,
    pub uid: u32,
    pub gid: u32,
    pub perm: u16,
}

/// The root directory of one mount.
///
/// Holds the mount's cgroup scope and network interface and resolves names to
/// nodes on every lookup; nothing resolved is remembered between calls.
#[derive(Clone)]
pub struct DirectoryNode {
    registry: Arc<Registry>,
    resolver: Arc<dyn MountResolver>,
    identity: Arc<dyn IdentityProvider>,
    cgroup_path: String,
    interface: String,
}

impl DirectoryNode {
    pub fn new(
        registry: Arc<Registry>,
        resolver: Arc<dyn MountResolver>,
        identity: Arc<dyn IdentityProvider>,
        cgroup_path: impl Into<String>,
        interface: impl Into<String>,
    ) -> Self {
        Self {
            registry,
            resolver,
            identity,
            cgroup_path: cgroup_path.into(),
            interface: interface.into(),
        }
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn cgroup_path(&self) -> &str {
        &self.cgroup_path
    }

    pub fn interface(&self) -> &str {
        &self.interface
    }

    /// Reports the directory as owned by the current process owner.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IdentityLookup`] if the owner cannot be resolved.
    pub fn attr(&self) -> Result<DirAttr> {
        let identity = self.identity.current()?;
        Ok(DirAttr {
            inode: DIR_INODE,
            kind: EntryKind::Directory,
            uid: identity.uid,
            gid: identity.gid,
            perm: DIR_PERMISSIONS,
        })
    }

    /// Resolves `name` to the node serving it.
    ///
    /// # Errors
    ///
    /// - [`Error::NotFound`] if `name` is neither `hello` nor registered.
    /// - [`Error::DataUnavailable`] if the backing cgroup subsystem is not mounted.
    pub fn lookup(&self, name: &str) -> Result<Arc<dyn FileNode>> {
        if name == HELLO_NAME {
            return Ok(Arc::new(HelloNode));
        }

        let desc = self
            .registry
            .lookup(name)
            .ok_or_else(|| Error::NotFound(name.to_owned()))?;

        let backing = match desc.subsystem() {
            None => PathBuf::from(&self.interface),
            Some(subsystem) => {
                let mount_point = self.resolver.mount_point(subsystem).map_err(|err| {
                    log::debug!("Lookup of `{name}` has no data: {err}");
                    Error::DataUnavailable {
                        name: name.to_owned(),
                        subsystem: subsystem.to_owned(),
                    }
                })?;
                join_cgroup_path(&mount_point, &self.cgroup_path)
            }
        };

        log::debug!("Resolved `{}` to `{}`", name, backing.display());
        Ok(desc.build(backing))
    }

    /// Lists the registry's entries. Identical for every mount sharing the registry.
    pub fn read_dir(&self) -> Arc<[DirectoryEntry]> {
        self.registry.listing()
    }
}

impl std::fmt::Debug for DirectoryNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectoryNode")
            .field("cgroup_path", &self.cgroup_path)
            .field("interface", &self.interface)
            .finish_non_exhaustive()
    }
}

/// Appends a cgroup path below a subsystem mount point.
///
/// The cgroup path is relative to the hierarchy root even when written with a
/// leading `/`.
fn join_cgroup_path(mount_point: &Path, cgroup_path: &str) -> PathBuf {
    let relative = cgroup_path.trim_start_matches('/');
    if relative.is_empty() {
        mount_point.to_path_buf()
    } else {
        mount_point.join(relative)
    }
}
