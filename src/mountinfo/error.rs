use std::path::PathBuf;

use crate::fsutil;

/// Failures of mount point resolution.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    FileOpen(#[from] fsutil::FileOpenError),
    #[error("failed to read mount table `{path}`: {source}")]
    ReadLine {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cgroup subsystem `{subsystem}` is not mounted according to `{path}`")]
    MissingCgroupMount { subsystem: String, path: PathBuf },
    #[error("malformed entry in mount table `{path}`: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: super::parser::ParseError,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
