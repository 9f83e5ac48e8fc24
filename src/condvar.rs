//! Polling condition variable built on a file lock.
//!
//! There is no cross-process notification channel on a shared filesystem,
//! so "wait" means acquiring the lock and "notify" means releasing it. At
//! most one blocked waiter is unblocked per notify, and which one is
//! OS-dependent; no fairness is guaranteed. This mirrors the protocol's
//! contract deliberately rather than emulating true wait-queue semantics.
//!
//! The deadline in [`PollCondition::wait_until`] is checked against a
//! monotonic clock at each iteration, so it does not drift under load the
//! way an iteration-count estimate would.

use crate::error::{FanoutError, Result};
use crate::lock::FileLock;
use std::thread;
use std::time::{Duration, Instant};

/// Default polling interval for non-blocking waits.
pub const DEFAULT_POLL_PERIOD: Duration = Duration::from_millis(100);

/// A wait/notify abstraction over exactly one [`FileLock`].
///
/// A condition binds the lock it waited on; `notify_all` releases the bound
/// lock. Each condition is meant for a single wait/notify cycle.
#[derive(Debug)]
pub struct PollCondition {
    period: Duration,
    bound: Option<FileLock>,
}

impl PollCondition {
    /// Create a condition with the default 100ms poll period.
    pub fn new() -> Self {
        Self {
            period: DEFAULT_POLL_PERIOD,
            bound: None,
        }
    }

    /// Set the polling interval used by [`wait_until`](Self::wait_until).
    pub fn set_poll_period(&mut self, period: Duration) -> Result<()> {
        if period.is_zero() {
            return Err(FanoutError::UserError(
                "poll period must be positive".to_string(),
            ));
        }
        self.period = period;
        Ok(())
    }

    /// Enter the critical section now: blocking acquire, binding the lock.
    pub fn wait(&mut self, mut lock: FileLock) -> Result<()> {
        lock.acquire()?;
        self.bound = Some(lock);
        Ok(())
    }

    /// Poll for the lock until it is acquired or `timeout` elapses.
    ///
    /// Returns the number of polling iterations consumed; zero means the
    /// lock was free on the first attempt. The deadline is checked between
    /// an attempt and the following sleep, never right after waking, so a
    /// holder that releases during the final poll interval is still
    /// claimed by the retry. On deadline the lock is never bound and a
    /// `Timeout` error is returned.
    pub fn wait_until(&mut self, mut lock: FileLock, timeout: Duration) -> Result<u32> {
        let start = Instant::now();
        let mut polls = 0u32;

        loop {
            if lock.try_acquire()? {
                self.bound = Some(lock);
                return Ok(polls);
            }

            if start.elapsed() >= timeout {
                return Err(FanoutError::Timeout(timeout));
            }
            thread::sleep(self.period);
            polls += 1;
        }
    }

    /// Release the bound lock, if any.
    ///
    /// This is the only signaling mechanism: an unlock is indistinguishable
    /// from a notify for whoever is polling the same path.
    pub fn notify_all(&mut self) -> Result<()> {
        if let Some(mut lock) = self.bound.take() {
            lock.release()?;
        }
        Ok(())
    }
}

impl Default for PollCondition {
    fn default() -> Self {
        Self::new()
    }
}
