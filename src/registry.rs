//! Process membership registry.
//!
//! An append-only log of participant identities, one per line. Appends are
//! serialized by an exclusive lock on the registry file itself; the count
//! is read under a shared lock so it never observes a half-written line.
//! The registry lives for one distribution round; the orchestrator deletes
//! it during cleanup.

use crate::error::{FanoutError, Result};
use fs2::FileExt;
use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

/// Register a participant identity, creating the registry lazily.
pub fn register<P: AsRef<Path>>(path: P, identity: &str) -> Result<()> {
    let path = path.as_ref();

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| {
            FanoutError::Io(format!(
                "failed to open registry '{}': {}",
                path.display(),
                e
            ))
        })?;

    file.lock_exclusive().map_err(|e| {
        FanoutError::Io(format!(
            "failed to lock registry '{}': {}",
            path.display(),
            e
        ))
    })?;

    let result = writeln!(file, "{}", identity).map_err(|e| {
        FanoutError::Io(format!(
            "failed to append to registry '{}': {}",
            path.display(),
            e
        ))
    });

    let _ = file.unlock();
    result
}

/// Count registered participants.
///
/// Counts non-empty lines under a shared lock. An absent or empty registry
/// counts as 1 so downstream quota division never divides by zero.
pub fn count<P: AsRef<Path>>(path: P) -> Result<usize> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(1);
    }

    let file = fs::File::open(path).map_err(|e| {
        FanoutError::Io(format!(
            "failed to open registry '{}': {}",
            path.display(),
            e
        ))
    })?;

    file.lock_shared().map_err(|e| {
        FanoutError::Io(format!(
            "failed to shared-lock registry '{}': {}",
            path.display(),
            e
        ))
    })?;

    let mut lines = 0usize;
    for line in BufReader::new(&file).lines() {
        let line = line.map_err(|e| {
            FanoutError::Io(format!(
                "failed to read registry '{}': {}",
                path.display(),
                e
            ))
        })?;
        if !line.trim().is_empty() {
            lines += 1;
        }
    }

    let _ = file.unlock();
    Ok(lines.max(1))
}

/// Delete the registry file at the end of a round.
///
/// An already-absent registry is not an error; another participant may
/// have cleaned up first.
pub fn clear<P: AsRef<Path>>(path: P) -> Result<()> {
    let path = path.as_ref();
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(FanoutError::Io(format!(
            "failed to clear registry '{}': {}",
            path.display(),
            e
        ))),
    }
}
