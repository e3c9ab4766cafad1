use std::fmt;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use super::HELLO_INODE;

/// A pseudo-file served below the synthetic directory.
///
/// Content is rendered on every read from the node's backing data source.
pub trait FileNode: Send + Sync {
    /// The inode number presented for this file.
    fn inode(&self) -> u64;

    /// Renders the full file content.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the backing data cannot be read or parsed.
    fn read_content(&self) -> io::Result<Vec<u8>>;
}

/// Builds a [`FileNode`] from a resolved backing path.
pub type NodeFactory = Arc<dyn Fn(PathBuf) -> Arc<dyn FileNode> + Send + Sync>;

/// Wraps a closure as a [`NodeFactory`].
pub fn factory<F, N>(build: F) -> NodeFactory
where
    F: Fn(PathBuf) -> N + Send + Sync + 'static,
    N: FileNode + 'static,
{
    Arc::new(move |path| Arc::new(build(path)) as Arc<dyn FileNode>)
}

/// Fixed example entry that needs no backing data.
#[derive(Debug, Default, Clone, Copy)]
pub struct HelloNode;

impl HelloNode {
    pub const CONTENT: &'static [u8] = b"hello, world\n";
}

impl FileNode for HelloNode {
    fn inode(&self) -> u64 {
        HELLO_INODE
    }

    fn read_content(&self) -> io::Result<Vec<u8>> {
        Ok(Self::CONTENT.to_vec())
    }
}

impl fmt::Debug for dyn FileNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileNode")
            .field("inode", &self.inode())
            .finish()
    }
}
