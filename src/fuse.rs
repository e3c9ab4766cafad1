//! Serves a [`DirectoryNode`] over FUSE.
//!
//! Registry inode numbers are used as FUSE inode numbers; the directory is the
//! FUSE root. Files are looked up afresh on every `getattr` and `open`, so the
//! mount follows subsystems being mounted or unmounted while it runs.
use std::ffi::OsStr;
use std::io;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime};

use dashmap::DashMap;
use fuser::{
    FUSE_ROOT_ID, FileAttr, FileType, Filesystem, MountOption, ReplyAttr, ReplyData,
    ReplyDirectory, ReplyEmpty, ReplyEntry, ReplyOpen, Request,
};
use libc::{EBADF, EIO, ENOENT, c_int};
use log::{debug, trace};
use nix::unistd::{getegid, geteuid};

use crate::fs::{self, DIR_INODE, DirectoryNode, EntryKind, FileNode};
use crate::identity::Identity;

const TTL: Duration = Duration::from_secs(1);
const FILE_PERMISSIONS: u16 = 0o444;
const BLOCK_SIZE: u32 = 512;

/// Content of open files, rendered once per `open`.
///
/// Every read of a handle slices the same snapshot, so a file read in several
/// chunks is never stitched together from different renders.
#[derive(Debug)]
struct OpenFiles {
    contents: DashMap<u64, Arc<[u8]>>,
    next_fh: AtomicU64,
}

impl OpenFiles {
    fn new() -> Self {
        Self {
            contents: DashMap::new(),
            next_fh: AtomicU64::new(1),
        }
    }

    /// Renders `node` and returns the handle of the snapshot.
    fn open(&self, node: &dyn FileNode) -> io::Result<u64> {
        let content: Arc<[u8]> = node.read_content()?.into();
        let fh = self.next_fh.fetch_add(1, Ordering::Relaxed);
        self.contents.insert(fh, content);
        Ok(fh)
    }

    fn get(&self, fh: u64) -> Option<Arc<[u8]>> {
        self.contents.get(&fh).map(|content| Arc::clone(content.value()))
    }

    fn release(&self, fh: u64) -> bool {
        self.contents.remove(&fh).is_some()
    }
}

/// FUSE filesystem over one [`DirectoryNode`].
pub struct CgroupFs {
    dir: DirectoryNode,
    files: OpenFiles,
    /// Owner shown for files. Taken from the process credentials so file
    /// lookups never depend on the user database.
    file_owner: Identity,
    mounted_at: SystemTime,
}

impl CgroupFs {
    pub fn new(dir: DirectoryNode) -> Self {
        Self::with_file_owner(
            dir,
            Identity {
                uid: geteuid().as_raw(),
                gid: getegid().as_raw(),
            },
        )
    }

    fn with_file_owner(dir: DirectoryNode, file_owner: Identity) -> Self {
        Self {
            dir,
            files: OpenFiles::new(),
            file_owner,
            mounted_at: SystemTime::now(),
        }
    }

    fn attr(&self, ino: u64, kind: FileType, perm: u16, owner: Identity) -> FileAttr {
        FileAttr {
            ino,
            size: 0,
            blocks: 0,
            atime: self.mounted_at,
            mtime: self.mounted_at,
            ctime: self.mounted_at,
            crtime: self.mounted_at,
            kind,
            perm,
            nlink: if kind == FileType::Directory { 2 } else { 1 },
            uid: owner.uid,
            gid: owner.gid,
            rdev: 0,
            blksize: BLOCK_SIZE,
            flags: 0,
        }
    }

    fn dir_attr(&self) -> fs::Result<FileAttr> {
        let dir = self.dir.attr()?;
        let owner = Identity {
            uid: dir.uid,
            gid: dir.gid,
        };
        Ok(self.attr(dir.inode, FileType::Directory, dir.perm, owner))
    }

    /// Looks `name` up and builds the attributes of the resulting file.
    fn file_attr(&self, name: &str) -> fs::Result<FileAttr> {
        let node = self.dir.lookup(name)?;
        Ok(self.attr(
            node.inode(),
            FileType::RegularFile,
            FILE_PERMISSIONS,
            self.file_owner,
        ))
    }

    /// Name of the listed entry with inode `ino`.
    fn name_of(&self, ino: u64) -> Option<String> {
        self.dir
            .read_dir()
            .iter()
            .find(|entry| entry.inode == ino)
            .map(|entry| entry.name.clone())
    }

    fn lookup_inode(&self, ino: u64) -> Result<Arc<dyn FileNode>, c_int> {
        let name = self.name_of(ino).ok_or(ENOENT)?;
        self.dir.lookup(&name).map_err(|err| log_errno(&err))
    }
}

fn log_errno(err: &fs::Error) -> c_int {
    debug!("{err}");
    err.errno()
}

fn io_errno(err: &io::Error) -> c_int {
    match err.kind() {
        io::ErrorKind::NotFound => ENOENT,
        _ => err.raw_os_error().unwrap_or(EIO),
    }
}

fn file_type(kind: EntryKind) -> FileType {
    match kind {
        EntryKind::Directory => FileType::Directory,
        EntryKind::File => FileType::RegularFile,
    }
}

/// The part of `content` a read of `size` bytes at `offset` returns.
fn slice_at(content: &[u8], offset: i64, size: u32) -> &[u8] {
    let start = usize::try_from(offset).unwrap_or(0).min(content.len());
    let end = start.saturating_add(size as usize).min(content.len());
    &content[start..end]
}

impl Filesystem for CgroupFs {
    fn lookup(&mut self, _req: &Request<'_>, parent: u64, name: &OsStr, reply: ReplyEntry) {
        if parent != FUSE_ROOT_ID {
            reply.error(ENOENT);
            return;
        }
        let Some(name) = name.to_str() else {
            reply.error(ENOENT);
            return;
        };

        match self.file_attr(name) {
            Ok(attr) => reply.entry(&TTL, &attr, 0),
            Err(err) => reply.error(log_errno(&err)),
        }
    }

    fn getattr(&mut self, _req: &Request<'_>, ino: u64, _fh: Option<u64>, reply: ReplyAttr) {
        let attr = if ino == FUSE_ROOT_ID {
            self.dir_attr()
        } else {
            let Some(name) = self.name_of(ino) else {
                reply.error(ENOENT);
                return;
            };
            self.file_attr(&name)
        };

        match attr {
            Ok(attr) => reply.attr(&TTL, &attr),
            Err(err) => reply.error(log_errno(&err)),
        }
    }

    fn open(&mut self, _req: &Request<'_>, ino: u64, _flags: i32, reply: ReplyOpen) {
        let node = match self.lookup_inode(ino) {
            Ok(node) => node,
            Err(errno) => {
                reply.error(errno);
                return;
            }
        };

        match self.files.open(node.as_ref()) {
            Ok(fh) => {
                trace!("Opened inode {ino} as handle {fh}");
                // Sizes are reported as 0, so the page cache must be bypassed.
                reply.opened(fh, fuser::consts::FOPEN_DIRECT_IO);
            }
            Err(err) => {
                debug!("Failed to render inode {ino}: {err}");
                reply.error(io_errno(&err));
            }
        }
    }

    fn read(
        &mut self,
        _req: &Request<'_>,
        _ino: u64,
        fh: u64,
        offset: i64,
        size: u32,
        _flags: i32,
        _lock_owner: Option<u64>,
        reply: ReplyData,
    ) {
        match self.files.get(fh) {
            Some(content) => reply.data(slice_at(&content, offset, size)),
            None => reply.error(EBADF),
        }
    }

    fn release(
        &mut self,
        _req: &Request<'_>,
        _ino: u64,
        fh: u64,
        _flags: i32,
        _lock_owner: Option<u64>,
        _flush: bool,
        reply: ReplyEmpty,
    ) {
        if self.files.release(fh) {
            reply.ok();
        } else {
            reply.error(EBADF);
        }
    }

    fn readdir(
        &mut self,
        _req: &Request<'_>,
        ino: u64,
        _fh: u64,
        offset: i64,
        mut reply: ReplyDirectory,
    ) {
        if ino != FUSE_ROOT_ID {
            reply.error(ENOENT);
            return;
        }

        let listing = self.dir.read_dir();
        let entries = [
            (DIR_INODE, FileType::Directory, "."),
            (DIR_INODE, FileType::Directory, ".."),
        ]
        .into_iter()
        .chain(
            listing
                .iter()
                .map(|entry| (entry.inode, file_type(entry.kind), entry.name.as_str())),
        );

        let skip = usize::try_from(offset).unwrap_or(0);
        for (i, (ino, kind, name)) in entries.enumerate().skip(skip) {
            if reply.add(ino, (i + 1) as i64, kind, name) {
                break;
            }
        }
        reply.ok();
    }
}

/// Mounts `fs` read-only at `mount_point` and serves it until unmounted.
///
/// # Errors
///
/// Returns an error if the mount fails.
pub fn mount(fs: CgroupFs, mount_point: &Path, allow_other: bool) -> io::Result<()> {
    let mut options = vec![
        MountOption::FSName("cgroupfs".to_string()),
        MountOption::RO,
        MountOption::NoExec,
        MountOption::NoSuid,
        MountOption::NoDev,
    ];
    if allow_other {
        options.push(MountOption::AllowOther);
    }

    log::info!("Mounting at {}", mount_point.display());
    fuser::mount2(fs, mount_point, &options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::{HELLO_INODE, HelloNode, Registry, factory};
    use crate::identity::{self, IdentityProvider};
    use crate::mountinfo::{self, MountResolver};
    use std::path::PathBuf;
    use std::sync::atomic::AtomicUsize;

    /// Renders a different, longer text on every read.
    #[derive(Default)]
    struct Ticking(AtomicUsize);

    impl FileNode for Ticking {
        fn inode(&self) -> u64 {
            3
        }

        fn read_content(&self) -> io::Result<Vec<u8>> {
            let n = self.0.fetch_add(1, Ordering::SeqCst);
            Ok(format!("render {n}: {}\n", "x".repeat(n)).into_bytes())
        }
    }

    struct NoMounts;

    impl MountResolver for NoMounts {
        fn mount_point(&self, subsystem: &str) -> mountinfo::Result<PathBuf> {
            Err(mountinfo::Error::MissingCgroupMount {
                subsystem: subsystem.to_owned(),
                path: PathBuf::from("/dummy"),
            })
        }
    }

    struct NoUser;

    impl IdentityProvider for NoUser {
        fn current(&self) -> identity::Result<Identity> {
            Err(identity::Error::UnknownUser { uid: 4242 })
        }
    }

    fn cgroup_fs() -> CgroupFs {
        let registry = Registry::builder()
            .register("meminfo", 3, "memory", factory(|_| HelloNode))
            .unwrap()
            .build();
        let dir = DirectoryNode::new(
            Arc::new(registry),
            Arc::new(NoMounts),
            Arc::new(NoUser),
            "/",
            "",
        );
        CgroupFs::with_file_owner(dir, Identity { uid: 1000, gid: 100 })
    }

    #[test]
    fn test_reads_of_one_handle_share_a_render() {
        let files = OpenFiles::new();
        let node = Ticking::default();

        let fh = files.open(&node).unwrap();
        let first = files.get(fh).unwrap();
        let head = slice_at(&first, 0, 4).to_vec();
        let tail = slice_at(&files.get(fh).unwrap(), 4, 4096).to_vec();
        assert_eq!([head, tail].concat(), b"render 0: \n");

        let other = files.open(&node).unwrap();
        assert_ne!(other, fh);
        assert_eq!(&*files.get(other).unwrap(), b"render 1: x\n");
    }

    #[test]
    fn test_release_drops_the_snapshot() {
        let files = OpenFiles::new();
        let fh = files.open(&HelloNode).unwrap();

        assert!(files.release(fh));
        assert!(files.get(fh).is_none());
        assert!(!files.release(fh));
    }

    #[test]
    fn test_open_surfaces_render_errors() {
        struct Broken;
        impl FileNode for Broken {
            fn inode(&self) -> u64 {
                4
            }
            fn read_content(&self) -> io::Result<Vec<u8>> {
                Err(io::Error::from(io::ErrorKind::NotFound))
            }
        }

        let files = OpenFiles::new();
        let err = files.open(&Broken).unwrap_err();
        assert_eq!(io_errno(&err), ENOENT);
        assert!(files.contents.is_empty());
    }

    #[test]
    fn test_file_attr_does_not_need_the_user_database() {
        let cgroupfs = cgroup_fs();

        let attr = cgroupfs.file_attr("hello").unwrap();
        assert_eq!(attr.ino, HELLO_INODE);
        assert_eq!((attr.uid, attr.gid), (1000, 100));
        assert_eq!(attr.perm, FILE_PERMISSIONS);

        let err = cgroupfs.file_attr("meminfo").unwrap_err();
        assert_eq!(err.errno(), libc::ENODATA);
        let err = cgroupfs.file_attr("missing").unwrap_err();
        assert_eq!(err.errno(), ENOENT);

        // Only the directory itself reports its owner through the identity provider.
        assert_eq!(cgroupfs.dir_attr().unwrap_err().errno(), EIO);
    }

    #[test]
    fn test_slice_at() {
        let content = b"hello, world\n";
        assert_eq!(slice_at(content, 0, 5), b"hello");
        assert_eq!(slice_at(content, 7, 100), b"world\n");
        assert_eq!(slice_at(content, 13, 10), b"");
        assert_eq!(slice_at(content, 100, 10), b"");
        assert_eq!(slice_at(content, -1, 5), b"hello");
    }

    #[test]
    fn test_io_errno() {
        assert_eq!(io_errno(&io::Error::from(io::ErrorKind::NotFound)), ENOENT);
        assert_eq!(io_errno(&io::Error::from_raw_os_error(libc::EACCES)), libc::EACCES);
        assert_eq!(io_errno(&io::Error::other("bad")), EIO);
    }
}
