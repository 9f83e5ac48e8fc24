//! The distribution orchestrator.
//!
//! Composes the registry, rendezvous, and queue into the end-to-end
//! protocol that splits one task list across however many participants
//! show up on the same set of shared paths:
//!
//! 1. register `pid@host` in the registry
//! 2. rendezvous #1 — the leader validates that no stale lock state
//!    remains, then publishes the task list
//! 3. read the participant count `P` and drain `len / P` tasks
//! 4. rendezvous #2 — wait for every peer to finish its quota drain
//! 5. drain whatever remains (the integer-division remainder)
//! 6. delete the registry
//!
//! A missed first barrier means another participant already initialized
//! the round, so it is tolerated. Everything else that goes wrong
//! degrades to a smaller (possibly empty) claim set for this participant;
//! `distribute` never panics or propagates an error.

use crate::barrier;
use crate::config::ShareConfig;
use crate::error::{FanoutError, Result};
use crate::events::{self, Event, EventAction};
use crate::queue::{self, Drain};
use crate::registry;
use serde_json::{Value, json};

/// Orchestrates one participant's side of a distribution round.
#[derive(Debug)]
pub struct Distributor {
    config: ShareConfig,
    identity: String,
}

impl Distributor {
    /// Create a distributor for the given round configuration.
    pub fn new(config: ShareConfig) -> Self {
        Self {
            config,
            identity: participant_identity(),
        }
    }

    /// The round configuration.
    pub fn config(&self) -> &ShareConfig {
        &self.config
    }

    /// This participant's registry identity (`pid@host`).
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Run one distribution round and return the tasks this participant
    /// claimed.
    ///
    /// Tolerated timeouts are silent; I/O and stale-state failures outside
    /// the first barrier are reported to stderr. Either way the result is
    /// whatever was claimed before the failure, and the registry is
    /// cleaned up so the next round starts fresh.
    pub fn distribute(&self, tasks: &[String]) -> Vec<String> {
        let mut claimed = Vec::new();

        match self.run_round(tasks, &mut claimed) {
            Ok(()) => {}
            Err(FanoutError::Timeout(_)) => {}
            Err(e) => eprintln!("fanout: {}", e),
        }

        if self.config.registry_file.exists() {
            match registry::clear(&self.config.registry_file) {
                Ok(()) => self.log(EventAction::Cleanup, json!({})),
                Err(e) => eprintln!("fanout: {}", e),
            }
        }

        claimed
    }

    /// The fallible round body; `claimed` accumulates across phases so a
    /// late failure still leaves the caller with its partial result.
    fn run_round(&self, tasks: &[String], claimed: &mut Vec<String>) -> Result<()> {
        let config = &self.config;

        if config.verbose {
            for line in participant_banner(&self.identity) {
                println!("{}", line);
            }
        }

        registry::register(&config.registry_file, &self.identity)?;
        self.log(EventAction::Register, json!({}));

        // The leader must see no leftovers of a crashed prior round on any
        // path the protocol is about to lock.
        let leader_action = || {
            queue::publish(
                &config.task_file,
                tasks,
                &[
                    &config.registry_file,
                    &config.share_lock_file,
                    &config.barrier2_file,
                ],
                config.freshness_floor(),
            )
        };

        match barrier::rendezvous_with_period(
            &config.barrier1_file,
            config.barrier1_wait(),
            Some(leader_action),
            config.poll_period(),
        ) {
            Ok(role) => {
                if role.is_leader() {
                    if config.verbose {
                        println!("published {} tasks", tasks.len());
                    }
                    self.log(EventAction::Publish, json!({ "tasks": tasks.len() }));
                }
            }
            // Missing the first barrier just means another participant
            // already initialized the round.
            Err(e @ (FanoutError::Timeout(_) | FanoutError::BadInitialState(_))) => {
                if config.verbose {
                    println!("missed first barrier: {}", e);
                }
                self.log(
                    EventAction::MissedBarrier,
                    json!({ "reason": e.to_string() }),
                );
            }
            Err(e) => return Err(e),
        }

        let participants = registry::count(&config.registry_file)?;
        if config.verbose {
            println!("participants: {}", participants);
        }

        let quota = tasks.len() / participants;
        let batch = queue::drain(
            &config.task_file,
            Drain::First(quota),
            &config.share_lock_file,
        )?;
        self.log(
            EventAction::Claim,
            json!({ "quota": quota, "claimed": batch.len() }),
        );
        claimed.extend(batch);

        // Every participant must finish its quota drain before anyone
        // sweeps the remainder, or the sweep could steal unclaimed quota.
        barrier::synchronize(
            &config.barrier2_file,
            config.barrier2_wait(),
            config.poll_period(),
        )?;

        let swept = queue::drain(&config.task_file, Drain::All, &config.share_lock_file)?;
        self.log(EventAction::Sweep, json!({ "claimed": swept.len() }));
        claimed.extend(swept);

        Ok(())
    }

    /// Append to the round log, best-effort.
    fn log(&self, action: EventAction, details: Value) {
        if let Some(path) = &self.config.events_file {
            let event = Event::new(action, &self.identity).with_details(details);
            if let Err(e) = events::append_event(path, &event)
                && self.config.verbose
            {
                eprintln!("warning: failed to log round event: {}", e);
            }
        }
    }
}

/// The verbose progress lines announcing a participant, one fact per line.
fn participant_banner(identity: &str) -> [String; 2] {
    let (pid, host) = identity.split_once('@').unwrap_or((identity, "unknown"));
    [
        format!("hostname: {}", host),
        format!("process id: {}", pid),
    ]
}

/// This process's registry identity.
pub fn participant_identity() -> String {
    let host = hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    format!("{}@{}", std::process::id(), host)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lock::FileLock;
    use std::collections::HashSet;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn test_config(dir: &Path) -> ShareConfig {
        let mut config = ShareConfig::default();
        config.barrier1_wait_ms = 400;
        config.barrier2_wait_ms = 150;
        config.poll_period_ms = 10;
        config.rooted(dir)
    }

    #[test]
    fn identity_is_pid_at_host() {
        let identity = participant_identity();
        assert!(identity.starts_with(&std::process::id().to_string()));
        assert!(identity.contains('@'));
    }

    #[test]
    fn banner_reports_hostname_and_pid_on_separate_lines() {
        let lines = participant_banner("4242@workerbox");
        assert_eq!(lines[0], "hostname: workerbox");
        assert_eq!(lines[1], "process id: 4242");
    }

    #[test]
    fn sole_participant_claims_every_task() {
        let temp_dir = TempDir::new().unwrap();
        let distributor = Distributor::new(test_config(temp_dir.path()));
        let tasks = crate::tasks::generate_tasks(5);

        let claimed = distributor.distribute(&tasks);

        assert_eq!(claimed, tasks);
        // The queue is drained and the registry cleaned up.
        assert_eq!(
            fs::read_to_string(temp_dir.path().join("task.txt")).unwrap(),
            ""
        );
        assert!(!temp_dir.path().join("process.txt").exists());
    }

    #[test]
    fn empty_task_list_yields_empty_claims() {
        let temp_dir = TempDir::new().unwrap();
        let distributor = Distributor::new(test_config(temp_dir.path()));

        let claimed = distributor.distribute(&[]);

        assert!(claimed.is_empty());
    }

    #[test]
    fn three_participants_partition_ten_tasks_without_duplicates() {
        let temp_dir = TempDir::new().unwrap();
        let tasks = crate::tasks::generate_tasks(10);

        let handles: Vec<_> = (0..3)
            .map(|_| {
                let config = test_config(temp_dir.path());
                let tasks = tasks.clone();
                std::thread::spawn(move || Distributor::new(config).distribute(&tasks))
            })
            .collect();

        let claims: Vec<Vec<String>> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        let mut seen = HashSet::new();
        let mut total = 0;
        for claim in &claims {
            for task in claim {
                assert!(seen.insert(task.clone()), "task {} claimed twice", task);
                total += 1;
            }
        }

        // Every task lands with exactly one participant: quota drains plus
        // the remainder sweep cover all ten.
        assert_eq!(total, 10);
        assert_eq!(seen.len(), 10);
        assert!(!temp_dir.path().join("process.txt").exists());
    }

    #[test]
    fn stale_guard_lock_is_tolerated_and_existing_list_is_distributed() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(temp_dir.path());

        // Leftover list from a round whose second barrier never released.
        fs::write(&config.task_file, "old1\nold2\n").unwrap();
        let mut stale_holder = FileLock::open(&config.barrier2_file).unwrap();
        stale_holder.acquire().unwrap();

        let tasks = crate::tasks::generate_tasks(2);
        let claimed = Distributor::new(config).distribute(&tasks);

        // The leader action failed with BadInitialState, so the fresh list
        // was never published; the round distributed what already existed.
        // The held second barrier then timed out, which is silent.
        assert_eq!(claimed, vec!["old1".to_string(), "old2".to_string()]);
    }

    #[test]
    fn round_log_records_the_protocol_steps() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = test_config(temp_dir.path());
        config.events_file = Some(temp_dir.path().join("round.ndjson"));

        Distributor::new(config.clone()).distribute(&crate::tasks::generate_tasks(3));

        let content = fs::read_to_string(config.events_file.unwrap()).unwrap();
        let actions: Vec<String> = content
            .lines()
            .map(|line| {
                let event: crate::events::Event = serde_json::from_str(line).unwrap();
                serde_json::to_value(event.action)
                    .unwrap()
                    .as_str()
                    .unwrap()
                    .to_string()
            })
            .collect();

        assert_eq!(
            actions,
            vec!["register", "publish", "claim", "sweep", "cleanup"]
        );
    }
}
