/// Errors that may occur while resolving the identity of the current process owner.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("no user database entry for uid {uid}")]
    UnknownUser { uid: u32 },
    #[error("failed to look up user with uid {uid}: {source}")]
    Lookup {
        uid: u32,
        #[source]
        source: nix::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
