use std::io;
use std::path::PathBuf;

/// A backing file could not be read or parsed.
#[derive(Debug, thiserror::Error)]
#[error("failed to read `{path}`: {source}")]
pub struct ReadError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

impl From<ReadError> for io::Error {
    fn from(err: ReadError) -> Self {
        io::Error::new(err.source.kind(), err)
    }
}
