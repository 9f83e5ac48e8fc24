//! File-backed mutual exclusion for fanout.
//!
//! A `FileLock` wraps one filesystem path as an OS advisory lock (`flock`)
//! via the `fs2` crate. The lock is tied to the open file description, so
//! the OS releases it when the holder exits or crashes; no application-level
//! cleanup is required for crash safety. The file's content is irrelevant,
//! only its lock state carries meaning.
//!
//! Two handles on the same path contend even within one process, which is
//! what lets the test suite simulate multiple participants with threads.

use crate::error::{FanoutError, Result};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

/// An exclusive lock backed by a file on a shared filesystem.
#[derive(Debug)]
pub struct FileLock {
    file: File,
    path: PathBuf,
    held: bool,
}

impl FileLock {
    /// Open (creating if absent) the backing file for a lock.
    ///
    /// Opening never acquires the lock; it only establishes the file
    /// description the lock operations act on.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(|e| {
                FanoutError::Io(format!(
                    "failed to open lock file '{}': {}",
                    path.display(),
                    e
                ))
            })?;

        Ok(Self {
            file,
            path: path.to_path_buf(),
            held: false,
        })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Block until the lock is acquired.
    pub fn acquire(&mut self) -> Result<()> {
        self.file.lock_exclusive().map_err(|e| {
            FanoutError::Io(format!(
                "failed to lock '{}': {}",
                self.path.display(),
                e
            ))
        })?;
        self.held = true;
        Ok(())
    }

    /// Attempt non-blocking acquisition.
    ///
    /// Returns `Ok(false)` if another holder currently has the lock.
    pub fn try_acquire(&mut self) -> Result<bool> {
        match self.file.try_lock_exclusive() {
            Ok(()) => {
                self.held = true;
                Ok(true)
            }
            Err(e) if e.kind() == fs2::lock_contended_error().kind() => Ok(false),
            Err(e) => Err(FanoutError::Io(format!(
                "failed to try-lock '{}': {}",
                self.path.display(),
                e
            ))),
        }
    }

    /// Release the lock if held.
    pub fn release(&mut self) -> Result<()> {
        if !self.held {
            return Ok(());
        }
        self.held = false;
        self.file.unlock().map_err(|e| {
            FanoutError::Io(format!(
                "failed to unlock '{}': {}",
                self.path.display(),
                e
            ))
        })
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        // Closing the file description releases the lock anyway; this just
        // makes the release happen at drop time rather than at close time.
        if self.held {
            let _ = self.file.unlock();
        }
    }
}

/// Probe whether a lock path is currently held by some process.
///
/// An absent file is free. An existing file that cannot be opened is
/// reported as held, since its state cannot be verified. Otherwise the
/// probe takes and immediately drops a non-blocking exclusive lock.
pub fn is_locked<P: AsRef<Path>>(path: P) -> bool {
    let path = path.as_ref();
    if !path.exists() {
        return false;
    }

    let Ok(file) = File::open(path) else {
        return true;
    };

    match file.try_lock_exclusive() {
        Ok(()) => {
            let _ = file.unlock();
            false
        }
        Err(_) => true,
    }
}
