//! The synthetic directory: name resolution, attributes and listing.
//!
//! Each entry is a container-scoped substitute for a host-wide resource file.
//! A [`DirectoryNode`] maps a fixed set of names from a [`Registry`] to nodes
//! whose data comes from the mount's cgroup (below the current mount point of
//! the entry's subsystem) or from the mount's network interface.
//!
//! # Failure isolation
//!
//! An unmounted subsystem fails only the lookup of the files it backs, with
//! [`Error::DataUnavailable`]. The listing never consults a resolver and never
//! fails.
mod dir;
mod error;
mod node;
mod registry;

pub use dir::{DirAttr, DirectoryNode};
pub use error::{Error, RegistryError, Result};
pub use node::{FileNode, HelloNode, NodeFactory, factory};
pub use registry::{DirectoryEntry, EntryKind, Registry, RegistryBuilder, VirtualFileDescriptor};

/// Inode of the synthetic directory.
pub const DIR_INODE: u64 = 1;
/// Inode of the `hello` entry.
pub const HELLO_INODE: u64 = 2;
/// Name of the fixed example entry, served without any backing data.
pub const HELLO_NAME: &str = "hello";
/// Read and search for owner, group and others.
pub const DIR_PERMISSIONS: u16 = 0o555;
