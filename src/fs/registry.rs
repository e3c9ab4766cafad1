use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

use super::error::RegistryError;
use super::node::{FileNode, NodeFactory};
use super::{DIR_INODE, HELLO_INODE, HELLO_NAME};

/// A pseudo-file known to the [`Registry`].
#[derive(Clone)]
pub struct VirtualFileDescriptor {
    name: String,
    inode: u64,
    subsystem: Option<String>,
    factory: NodeFactory,
}

impl VirtualFileDescriptor {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn inode(&self) -> u64 {
        self.inode
    }

    /// The cgroup subsystem backing this file.
    ///
    /// `None` means the file is backed by the mount's network interface instead.
    pub fn subsystem(&self) -> Option<&str> {
        self.subsystem.as_deref()
    }

    /// Builds the node serving this file from a resolved backing path.
    pub fn build(&self, backing: PathBuf) -> Arc<dyn FileNode> {
        (self.factory)(backing)
    }
}

impl fmt::Debug for VirtualFileDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VirtualFileDescriptor")
            .field("name", &self.name)
            .field("inode", &self.inode)
            .field("subsystem", &self.subsystem)
            .finish_non_exhaustive()
    }
}

/// Kind of a listed entry. Everything below the synthetic directory is a regular file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Directory,
    File,
}

/// One entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub inode: u64,
    pub name: String,
    pub kind: EntryKind,
}

/// Immutable table of the pseudo-files presented by every mount in a process.
///
/// The directory listing is derived from this table alone and is built at most
/// once per `Registry` value.
#[derive(Debug)]
pub struct Registry {
    descriptors: Vec<VirtualFileDescriptor>,
    index: HashMap<String, usize>,
    listing: OnceLock<Arc<[DirectoryEntry]>>,
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Returns the descriptor registered under `name`.
    pub fn lookup(&self, name: &str) -> Option<&VirtualFileDescriptor> {
        self.index.get(name).map(|&idx| &self.descriptors[idx])
    }

    /// Iterates descriptors in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &VirtualFileDescriptor> {
        self.descriptors.iter()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Returns the listing snapshot, building it on first use.
    ///
    /// Concurrent first callers block until the single build completes and then
    /// all receive the same snapshot.
    pub fn listing(&self) -> Arc<[DirectoryEntry]> {
        Arc::clone(self.listing.get_or_init(|| {
            log::debug!("Building directory listing for {} entries", self.len() + 1);
            std::iter::once(DirectoryEntry {
                inode: HELLO_INODE,
                name: HELLO_NAME.to_owned(),
                kind: EntryKind::File,
            })
            .chain(self.descriptors.iter().map(|desc| DirectoryEntry {
                inode: desc.inode,
                name: desc.name.clone(),
                kind: EntryKind::File,
            }))
            .collect()
        }))
    }
}

/// Accumulates descriptors for a [`Registry`].
#[derive(Default)]
pub struct RegistryBuilder {
    descriptors: Vec<VirtualFileDescriptor>,
    index: HashMap<String, usize>,
}

impl RegistryBuilder {
    /// Registers a pseudo-file.
    ///
    /// An empty `subsystem` marks a file backed by the mount's network interface.
    ///
    /// # Errors
    ///
    /// Returns a [`RegistryError`] if the name or inode is reserved or already taken.
    pub fn register(
        mut self,
        name: impl Into<String>,
        inode: u64,
        subsystem: &str,
        factory: NodeFactory,
    ) -> Result<Self, RegistryError> {
        let name = name.into();
        if name == HELLO_NAME {
            return Err(RegistryError::ReservedName(name));
        }
        if inode == 0 || inode == DIR_INODE || inode == HELLO_INODE {
            return Err(RegistryError::ReservedInode { inode, name });
        }
        if self.index.contains_key(&name) {
            return Err(RegistryError::DuplicateName(name));
        }
        if let Some(existing) = self.descriptors.iter().find(|desc| desc.inode == inode) {
            return Err(RegistryError::DuplicateInode {
                inode,
                name,
                existing: existing.name.clone(),
            });
        }

        self.index.insert(name.clone(), self.descriptors.len());
        self.descriptors.push(VirtualFileDescriptor {
            name,
            inode,
            subsystem: (!subsystem.is_empty()).then(|| subsystem.to_owned()),
            factory,
        });
        Ok(self)
    }

    pub fn build(self) -> Registry {
        Registry {
            descriptors: self.descriptors,
            index: self.index,
            listing: OnceLock::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::node::{HelloNode, factory};
    use std::collections::HashSet;

    fn noop() -> NodeFactory {
        factory(|_| HelloNode)
    }

    fn sample() -> Registry {
        Registry::builder()
            .register("meminfo", 3, "memory", noop())
            .unwrap()
            .register("cpuinfo", 5, "cpuset", noop())
            .unwrap()
            .register("net_dev", 7, "", noop())
            .unwrap()
            .build()
    }

    #[test]
    fn test_lookup() {
        let registry = sample();
        let desc = registry.lookup("meminfo").unwrap();
        assert_eq!(desc.inode(), 3);
        assert_eq!(desc.subsystem(), Some("memory"));
        assert_eq!(registry.lookup("net_dev").unwrap().subsystem(), None);
        assert!(registry.lookup("hello").is_none());
        assert!(registry.lookup("missing").is_none());
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_iter_keeps_registration_order() {
        let names: Vec<_> = sample().iter().map(|d| d.name().to_owned()).collect();
        assert_eq!(names, vec!["meminfo", "cpuinfo", "net_dev"]);
    }

    #[test]
    fn test_reject_duplicate_name() {
        let err = Registry::builder()
            .register("stat", 6, "cpuacct", noop())
            .unwrap()
            .register("stat", 8, "cpuacct", noop())
            .err()
            .unwrap();
        assert_eq!(err, RegistryError::DuplicateName("stat".into()));
    }

    #[test]
    fn test_reject_duplicate_inode() {
        let err = Registry::builder()
            .register("stat", 6, "cpuacct", noop())
            .unwrap()
            .register("diskstats", 6, "blkio", noop())
            .err()
            .unwrap();
        assert_eq!(
            err,
            RegistryError::DuplicateInode {
                inode: 6,
                name: "diskstats".into(),
                existing: "stat".into(),
            }
        );
    }

    #[test]
    fn test_reject_reserved_inodes_and_name() {
        for inode in [0, DIR_INODE, HELLO_INODE] {
            let err = Registry::builder()
                .register("meminfo", inode, "memory", noop())
                .err()
                .unwrap();
            assert!(matches!(err, RegistryError::ReservedInode { .. }));
        }

        let err = Registry::builder()
            .register(HELLO_NAME, 9, "", noop())
            .err()
            .unwrap();
        assert_eq!(err, RegistryError::ReservedName(HELLO_NAME.into()));
    }

    #[test]
    fn test_listing_contents() {
        let registry = sample();
        let listing = registry.listing();

        assert_eq!(listing.len(), 1 + registry.len());
        assert_eq!(listing[0].name, HELLO_NAME);
        assert_eq!(listing[0].inode, HELLO_INODE);
        assert!(listing.iter().all(|e| e.kind == EntryKind::File));

        let inodes: HashSet<u64> = listing.iter().map(|e| e.inode).collect();
        assert_eq!(inodes, HashSet::from([HELLO_INODE, 3, 5, 7]));
    }

    #[test]
    fn test_listing_is_built_once() {
        let registry = sample();
        let first = registry.listing();
        let second = registry.listing();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_concurrent_first_listing_shares_one_snapshot() {
        let registry = sample();
        let snapshots: Vec<_> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..16).map(|_| s.spawn(|| registry.listing())).collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        for snapshot in &snapshots[1..] {
            assert!(Arc::ptr_eq(&snapshots[0], snapshot));
        }
    }

    #[test]
    fn test_listing_is_scoped_per_registry() {
        let a = sample();
        let b = Registry::builder()
            .register("stat", 6, "cpuacct", noop())
            .unwrap()
            .build();

        assert_eq!(a.listing().len(), 4);
        assert_eq!(b.listing().len(), 2);
    }
}
