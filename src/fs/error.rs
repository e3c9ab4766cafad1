use crate::identity;

/// Failures of the directory operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("no such entry: `{0}`")]
    NotFound(String),
    #[error("no data for `{name}`: cgroup subsystem `{subsystem}` is not mounted")]
    DataUnavailable { name: String, subsystem: String },
    #[error("failed to resolve directory owner: {0}")]
    IdentityLookup(#[from] identity::Error),
}

impl Error {
    /// The errno reported to the filesystem client.
    pub fn errno(&self) -> libc::c_int {
        match self {
            Error::NotFound(_) => libc::ENOENT,
            Error::DataUnavailable { .. } => libc::ENODATA,
            Error::IdentityLookup(_) => libc::EIO,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while building a [`Registry`](super::Registry).
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("duplicate virtual file name `{0}`")]
    DuplicateName(String),
    #[error("inode {inode} of `{name}` is already used by `{existing}`")]
    DuplicateInode {
        inode: u64,
        name: String,
        existing: String,
    },
    #[error("inode {inode} of `{name}` is reserved")]
    ReservedInode { inode: u64, name: String },
    #[error("virtual file name `{0}` is reserved")]
    ReservedName(String),
}
