//! Rendezvous barrier with implicit leader election.
//!
//! Arrivers race to acquire one lock file. Whoever finds the lock free on
//! the very first attempt is the leader for this round; it runs the setup
//! action, then keeps the lock until the full deadline window has passed so
//! that every peer whose own timeout exceeds the window is still polling
//! when setup finishes. Followers acquire later (one at a time, as each
//! predecessor releases) and release immediately, cascading the unblock.
//!
//! "Who arrives first" and "who leads" are the same observable fact, so no
//! election message is needed.

use crate::condvar::{DEFAULT_POLL_PERIOD, PollCondition};
use crate::error::Result;
use crate::lock::FileLock;
use crate::stopwatch::Stopwatch;
use std::path::Path;
use std::thread;
use std::time::Duration;

/// Outcome of a rendezvous for the calling participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// This participant arrived first and ran the leader action.
    Leader,
    /// This participant arrived while the window was occupied.
    Follower {
        /// Polling iterations spent before the lock was obtained.
        polls: u32,
    },
}

impl Role {
    /// Whether this participant led the round.
    pub fn is_leader(&self) -> bool {
        matches!(self, Role::Leader)
    }
}

/// Rendezvous at `lock_path` with the default poll period.
///
/// See [`rendezvous_with_period`].
pub fn rendezvous<F>(lock_path: &Path, timeout: Duration, leader_action: Option<F>) -> Result<Role>
where
    F: FnOnce() -> Result<()>,
{
    rendezvous_with_period(lock_path, timeout, leader_action, DEFAULT_POLL_PERIOD)
}

/// Rendezvous at `lock_path`, electing the first arriver as leader.
///
/// The leader runs `leader_action` (if any) and occupies the lock for
/// approximately the full `timeout` window regardless of how fast the
/// action ran, which is what gives followers a happens-before edge on the
/// leader's setup. Every participant releases the lock on its way out.
///
/// # Errors
///
/// * `Timeout` — the deadline elapsed before the lock could be acquired;
///   the caller missed the barrier and must decide whether to proceed.
/// * Any error from `leader_action` propagates unchanged; the lock is
///   released as the guard drops, so followers still cascade.
pub fn rendezvous_with_period<F>(
    lock_path: &Path,
    timeout: Duration,
    leader_action: Option<F>,
    poll_period: Duration,
) -> Result<Role>
where
    F: FnOnce() -> Result<()>,
{
    let lock = FileLock::open(lock_path)?;
    let mut cv = PollCondition::new();
    cv.set_poll_period(poll_period)?;

    let polls = cv.wait_until(lock, timeout)?;

    if polls == 0 {
        let stopwatch = Stopwatch::start();
        if let Some(action) = leader_action {
            action()?;
        }

        // Pad the occupancy out to the full window. Followers with a
        // timeout longer than this window are guaranteed to still be
        // polling when the leader releases.
        if let Some(pad) = timeout.checked_sub(stopwatch.elapsed()) {
            thread::sleep(pad);
        }

        cv.notify_all()?;
        Ok(Role::Leader)
    } else {
        cv.notify_all()?;
        Ok(Role::Follower { polls })
    }
}

/// Pure synchronization point: a rendezvous with no leader action.
pub fn synchronize(lock_path: &Path, timeout: Duration, poll_period: Duration) -> Result<Role> {
    rendezvous_with_period::<fn() -> Result<()>>(lock_path, timeout, None, poll_period)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FanoutError;
    use crate::lock;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    const FAST_POLL: Duration = Duration::from_millis(10);

    #[test]
    fn sole_arriver_becomes_leader_and_runs_action() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("barrier.lock");
        let ran = AtomicUsize::new(0);

        let role = rendezvous(
            &path,
            Duration::from_millis(50),
            Some(|| {
                ran.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }),
        )
        .unwrap();

        assert!(role.is_leader());
        assert_eq!(ran.load(Ordering::SeqCst), 1);
        // Everyone releases on the way out.
        assert!(!lock::is_locked(&path));
    }

    #[test]
    fn exactly_one_of_concurrent_arrivers_leads() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("barrier.lock");
        let actions = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let path = path.clone();
                let actions = Arc::clone(&actions);
                std::thread::spawn(move || {
                    rendezvous_with_period(
                        &path,
                        Duration::from_millis(300),
                        Some(move || {
                            actions.fetch_add(1, Ordering::SeqCst);
                            Ok(())
                        }),
                        FAST_POLL,
                    )
                    .unwrap()
                })
            })
            .collect();

        let roles: Vec<Role> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        let leaders = roles.iter().filter(|r| r.is_leader()).count();
        assert_eq!(leaders, 1);
        assert_eq!(actions.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn followers_report_nonzero_polls() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("barrier.lock");

        let leader_path = path.clone();
        let leader = std::thread::spawn(move || {
            rendezvous_with_period(
                &leader_path,
                Duration::from_millis(150),
                Some(|| Ok(())),
                FAST_POLL,
            )
            .unwrap()
        });

        // Give the leader time to take the lock, then arrive late.
        std::thread::sleep(Duration::from_millis(40));
        let role = synchronize(&path, Duration::from_secs(2), FAST_POLL).unwrap();

        assert!(leader.join().unwrap().is_leader());
        match role {
            Role::Follower { polls } => assert!(polls >= 1),
            Role::Leader => panic!("late arriver must not lead"),
        }
    }

    #[test]
    fn follower_with_deadline_equal_to_the_window_still_cascades() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("barrier.lock");

        let leader_path = path.clone();
        let leader = std::thread::spawn(move || {
            rendezvous_with_period(
                &leader_path,
                Duration::from_millis(150),
                Some(|| Ok(())),
                FAST_POLL,
            )
            .unwrap()
        });

        // Arrive mid-window with a deadline no longer than the window
        // itself and a poll period that leaves exactly one retry after the
        // leader's release. That retry must claim the lock rather than the
        // wait declaring a timeout.
        std::thread::sleep(Duration::from_millis(30));
        let role = synchronize(
            &path,
            Duration::from_millis(150),
            Duration::from_millis(100),
        )
        .unwrap();

        assert!(leader.join().unwrap().is_leader());
        assert!(matches!(role, Role::Follower { .. }));
    }

    #[test]
    fn leader_occupies_the_lock_for_the_window() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("barrier.lock");

        let leader_path = path.clone();
        let leader = std::thread::spawn(move || {
            rendezvous_with_period(
                &leader_path,
                Duration::from_millis(300),
                Some(|| Ok(())),
                FAST_POLL,
            )
            .unwrap()
        });

        // Mid-window the lock must still be held even though the leader
        // action finished immediately.
        std::thread::sleep(Duration::from_millis(100));
        assert!(lock::is_locked(&path));

        leader.join().unwrap();
        assert!(!lock::is_locked(&path));
    }

    #[test]
    fn missing_the_barrier_raises_timeout() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("barrier.lock");

        let mut holder = FileLock::open(&path).unwrap();
        holder.acquire().unwrap();

        let result = synchronize(&path, Duration::from_millis(60), FAST_POLL);
        assert!(matches!(result, Err(FanoutError::Timeout(_))));
    }

    #[test]
    fn leader_action_error_propagates_and_lock_is_released() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("barrier.lock");

        let result = rendezvous_with_period(
            &path,
            Duration::from_millis(50),
            Some(|| Err(FanoutError::BadInitialState("stale".to_string()))),
            FAST_POLL,
        );

        assert!(matches!(result, Err(FanoutError::BadInitialState(_))));
        assert!(!lock::is_locked(&path));
    }
}
