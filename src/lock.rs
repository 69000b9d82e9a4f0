//! Advisory repository lock
//!
//! `add` holds an exclusive lock on `<root>/lock` from validation until the
//! record is logged. The lock is released when the guard drops.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

/// Scoped exclusive lock on the repository
pub struct RepoLock {
    path: PathBuf,
    file: File,
}

impl RepoLock {
    /// Block until the exclusive lock on `path` is held
    pub fn acquire(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .open(path)?;

        lock_exclusive(&file)?;
        tracing::debug!(lock = %path.display(), "repository lock acquired");

        Ok(RepoLock {
            path: path.to_path_buf(),
            file,
        })
    }

    /// Get the lock file path
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for RepoLock {
    fn drop(&mut self) {
        // Closing the descriptor releases the lock as well
        let _ = unlock(&self.file);
        tracing::debug!(lock = %self.path.display(), "repository lock released");
    }
}

#[cfg(unix)]
fn lock_exclusive(file: &File) -> io::Result<()> {
    use nix::errno::Errno;
    use nix::fcntl::{flock, FlockArg};
    use std::os::unix::io::AsRawFd;

    loop {
        match flock(file.as_raw_fd(), FlockArg::LockExclusive) {
            Ok(()) => return Ok(()),
            Err(Errno::EINTR) => continue,
            Err(e) => return Err(e.into()),
        }
    }
}

#[cfg(unix)]
fn unlock(file: &File) -> io::Result<()> {
    use nix::fcntl::{flock, FlockArg};
    use std::os::unix::io::AsRawFd;

    flock(file.as_raw_fd(), FlockArg::Unlock).map_err(io::Error::from)
}

// Without flock there is no exclusivity beyond the single process
#[cfg(not(unix))]
fn lock_exclusive(_file: &File) -> io::Result<()> {
    Ok(())
}

#[cfg(not(unix))]
fn unlock(_file: &File) -> io::Result<()> {
    Ok(())
}
