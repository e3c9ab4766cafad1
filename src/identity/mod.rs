//! Identity of the process that serves the filesystem.
//!
//! The synthetic directory is presented as owned by whoever runs the daemon,
//! not by the owner of the directory it is mounted over.
mod error;

pub use error::{Error, Result};

use nix::unistd::{User, geteuid};

/// Numeric user and group identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub uid: u32,
    pub gid: u32,
}

/// Source of the current process owner's identity.
pub trait IdentityProvider: Send + Sync {
    /// Returns the uid and gid of the current process owner.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] if the owner cannot be resolved.
    fn current(&self) -> Result<Identity>;
}

/// Resolves the effective user of this process through the user database.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessIdentity;

impl IdentityProvider for ProcessIdentity {
    fn current(&self) -> Result<Identity> {
        let uid = geteuid();
        let user = User::from_uid(uid)
            .map_err(|source| Error::Lookup {
                uid: uid.as_raw(),
                source,
            })?
            .ok_or(Error::UnknownUser { uid: uid.as_raw() })?;

        Ok(Identity {
            uid: user.uid.as_raw(),
            gid: user.gid.as_raw(),
        })
    }
}
