//! Advisory lock serializing actions against one install home.

use std::fs::{File, OpenOptions};
use std::path::Path;

use ambar_shared::constants::files;
use ambar_shared::errors::{AmbarError, AmbarResult};
use nix::errno::Errno;
use nix::fcntl::{Flock, FlockArg};

/// Held for the whole of a public [`Deployment`](crate::Deployment) action.
/// The kernel drops the lock when this value is dropped or the process exits.
#[derive(Debug)]
pub struct InstallLock {
    _flock: Flock<File>,
}

impl InstallLock {
    /// Takes the lock without waiting; a second holder gets an error.
    pub fn acquire(home_dir: &Path) -> AmbarResult<Self> {
        std::fs::create_dir_all(home_dir).map_err(|e| {
            AmbarError::Storage(format!("cannot create {}: {e}", home_dir.display()))
        })?;

        let lock_path = home_dir.join(files::LOCK);
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|e| {
                AmbarError::Storage(format!("cannot open {}: {e}", lock_path.display()))
            })?;

        let flock = match Flock::lock(file, FlockArg::LockExclusiveNonblock) {
            Ok(flock) => flock,
            Err((_, errno)) if errno == Errno::EWOULDBLOCK => {
                return Err(AmbarError::Internal(format!(
                    "Another ambar invocation is already using {}\n\
                     Wait for it to finish and retry.",
                    home_dir.display()
                )));
            }
            Err((_, errno)) => {
                return Err(AmbarError::Storage(format!(
                    "cannot lock {}: {errno}",
                    lock_path.display()
                )));
            }
        };

        tracing::debug!(lock = %lock_path.display(), "Holding install lock");
        Ok(Self { _flock: flock })
    }
}
