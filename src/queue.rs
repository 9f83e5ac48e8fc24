//! Shared task queue with atomic partial drain.
//!
//! The task list is a plain text file, one opaque task identifier per line.
//! It is never edited in place: a drain reads the current file, writes the
//! unclaimed remainder to a temporary sibling, and renames it over the
//! source in one filesystem operation. An auxiliary lock file serializes
//! the read-then-replace sequence across participants, and the atomic
//! rename guarantees other readers only ever see a complete remainder.

use crate::error::{FanoutError, Result};
use crate::fs as fsutil;
use crate::lock::{self, FileLock};
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use std::time::Duration;

/// How much of the queue a drain claims.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Drain {
    /// Claim the first `n` lines; the rest stay queued.
    First(usize),
    /// Claim nothing; the queue is rewritten unchanged.
    None,
    /// Claim every line, leaving the queue empty.
    All,
}

/// Atomically remove a batch of tasks from the head of the queue.
///
/// Blocks on the auxiliary lock at `lock_path` for the duration of the
/// read-then-replace, so concurrent drains from different participants
/// cannot claim the same line. Claimed identifiers are returned trimmed,
/// in their original order.
pub fn drain(task_path: &Path, amount: Drain, lock_path: &Path) -> Result<Vec<String>> {
    let mut guard = FileLock::open(lock_path)?;
    guard.acquire()?;

    match drain_locked(task_path, amount) {
        Ok(claimed) => {
            guard.release()?;
            Ok(claimed)
        }
        Err(e) => {
            // A failed release must not mask the drain error.
            let _ = guard.release();
            Err(e)
        }
    }
}

/// The drain body, running under the auxiliary lock.
fn drain_locked(task_path: &Path, amount: Drain) -> Result<Vec<String>> {
    let source = File::open(task_path).map_err(|e| {
        FanoutError::Io(format!(
            "failed to open task list '{}': {}",
            task_path.display(),
            e
        ))
    })?;

    let temp_path = fsutil::temp_sibling(task_path)?;
    let temp = File::create(&temp_path).map_err(|e| {
        FanoutError::Io(format!(
            "failed to create '{}': {}",
            temp_path.display(),
            e
        ))
    })?;
    let mut remainder = BufWriter::new(temp);

    let mut claimed = Vec::new();
    let mut wanted = match amount {
        Drain::First(n) => n,
        Drain::None => 0,
        Drain::All => usize::MAX,
    };

    for line in BufReader::new(source).lines() {
        let line = line.map_err(|e| {
            FanoutError::Io(format!(
                "failed to read task list '{}': {}",
                task_path.display(),
                e
            ))
        })?;

        if wanted > 0 {
            claimed.push(line.trim().to_string());
            wanted = wanted.saturating_sub(1);
        } else {
            writeln!(remainder, "{}", line).map_err(|e| {
                FanoutError::Io(format!(
                    "failed to write '{}': {}",
                    temp_path.display(),
                    e
                ))
            })?;
        }
    }

    let temp = remainder.into_inner().map_err(|e| {
        FanoutError::Io(format!("failed to flush '{}': {}", temp_path.display(), e))
    })?;
    temp.sync_all().map_err(|e| {
        FanoutError::Io(format!("failed to sync '{}': {}", temp_path.display(), e))
    })?;

    fsutil::atomic_replace(&temp_path, task_path)?;
    Ok(claimed)
}

/// Write a fresh task list, guarding against leftovers of a prior round.
///
/// This is the leader-action body for the first rendezvous. It refuses to
/// run when:
/// - any of `guard_paths` is currently lock-held, which means a previous
///   round crashed mid-protocol (`BadInitialState`); or
/// - a task list already exists and is younger than `freshness_floor`,
///   which means it likely belongs to a round still in flight (I/O error).
///   A zero floor disables this heuristic.
pub fn publish(
    task_path: &Path,
    tasks: &[String],
    guard_paths: &[&Path],
    freshness_floor: Duration,
) -> Result<()> {
    for guard in guard_paths {
        if lock::is_locked(guard) {
            return Err(FanoutError::BadInitialState(format!(
                "'{}' is still lock-held",
                guard.display()
            )));
        }
    }

    if !freshness_floor.is_zero()
        && let Some(age) = task_list_age(task_path)
        && age < freshness_floor
    {
        return Err(FanoutError::Io(format!(
            "task list '{}' was written {}s ago and may still be in use",
            task_path.display(),
            age.as_secs()
        )));
    }

    let mut content = String::new();
    for task in tasks {
        content.push_str(task);
        content.push('\n');
    }

    fsutil::atomic_write(task_path, content.as_bytes())
}

/// Age of an existing task list, from its modification time.
fn task_list_age(task_path: &Path) -> Option<Duration> {
    let modified = fs::metadata(task_path).ok()?.modified().ok()?;
    modified.elapsed().ok()
}
