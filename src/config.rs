//! Configuration for a distribution round.
//!
//! `ShareConfig` names the shared files a round coordinates through and the
//! timing knobs of the protocol. It can be built in code, loaded from a
//! YAML file, or produced with defaults. Unknown YAML fields are ignored
//! for forward compatibility.
//!
//! Diagnostics are controlled here explicitly (`verbose`, `events_file`)
//! rather than through process-wide state, so two rounds in one program can
//! run with different settings.

use crate::error::{FanoutError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration for one distribution round.
///
/// The path fields default to bare filenames; call [`rooted`](Self::rooted)
/// to rebase them into the shared directory all participants agree on.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShareConfig {
    // =========================================================================
    // Shared files
    // =========================================================================
    /// Shared task list, one task identifier per line.
    pub task_file: PathBuf,

    /// Participant registry, one identity per line.
    pub registry_file: PathBuf,

    /// Lock file for the first rendezvous (leader publishes the task list).
    pub barrier1_file: PathBuf,

    /// Lock file for the second rendezvous (pure synchronization).
    pub barrier2_file: PathBuf,

    /// Auxiliary lock serializing task-queue drains.
    pub share_lock_file: PathBuf,

    // =========================================================================
    // Protocol timing
    // =========================================================================
    /// Deadline for the first rendezvous, in milliseconds.
    pub barrier1_wait_ms: u64,

    /// Deadline for the second rendezvous, in milliseconds.
    pub barrier2_wait_ms: u64,

    /// Polling interval for lock waits, in milliseconds.
    pub poll_period_ms: u64,

    /// An existing task list younger than this is treated as belonging to
    /// a round still in flight. Zero disables the guard.
    pub freshness_floor_secs: u64,

    // =========================================================================
    // Diagnostics
    // =========================================================================
    /// Print protocol progress to stdout.
    pub verbose: bool,

    /// Optional NDJSON round log, appended best-effort.
    pub events_file: Option<PathBuf>,
}

impl Default for ShareConfig {
    fn default() -> Self {
        Self {
            task_file: PathBuf::from("task.txt"),
            registry_file: PathBuf::from("process.txt"),
            barrier1_file: PathBuf::from("barrier1.lock"),
            barrier2_file: PathBuf::from("barrier2.lock"),
            share_lock_file: PathBuf::from("share.lock"),
            barrier1_wait_ms: 500,
            barrier2_wait_ms: 100,
            poll_period_ms: 100,
            freshness_floor_secs: 30,
            verbose: false,
            events_file: None,
        }
    }
}

impl ShareConfig {
    /// Load config from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path).map_err(|e| {
            FanoutError::UserError(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        Self::from_yaml(&content)
    }

    /// Parse config from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: ShareConfig = serde_yaml::from_str(yaml)
            .map_err(|e| FanoutError::UserError(format!("failed to parse config YAML: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Serialize config to a YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self)
            .map_err(|e| FanoutError::UserError(format!("failed to serialize config: {}", e)))
    }

    /// Validate config values.
    ///
    /// The poll period and both barrier deadlines must be positive; a
    /// follower with a zero deadline could never observe the leader's
    /// window.
    pub fn validate(&self) -> Result<()> {
        if self.poll_period_ms == 0 {
            return Err(FanoutError::UserError(
                "config validation failed: poll_period_ms must be greater than 0".to_string(),
            ));
        }
        if self.barrier1_wait_ms == 0 || self.barrier2_wait_ms == 0 {
            return Err(FanoutError::UserError(
                "config validation failed: barrier waits must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Rebase all relative paths into `dir`, the directory every
    /// participant shares.
    pub fn rooted<P: AsRef<Path>>(mut self, dir: P) -> Self {
        let dir = dir.as_ref();
        for path in [
            &mut self.task_file,
            &mut self.registry_file,
            &mut self.barrier1_file,
            &mut self.barrier2_file,
            &mut self.share_lock_file,
        ] {
            if path.is_relative() {
                *path = dir.join(&*path);
            }
        }
        if let Some(events) = &mut self.events_file
            && events.is_relative()
        {
            *events = dir.join(&*events);
        }
        self
    }

    /// First rendezvous deadline.
    pub fn barrier1_wait(&self) -> Duration {
        Duration::from_millis(self.barrier1_wait_ms)
    }

    /// Second rendezvous deadline.
    pub fn barrier2_wait(&self) -> Duration {
        Duration::from_millis(self.barrier2_wait_ms)
    }

    /// Polling interval for lock waits.
    pub fn poll_period(&self) -> Duration {
        Duration::from_millis(self.poll_period_ms)
    }

    /// Freshness floor for an existing task list.
    pub fn freshness_floor(&self) -> Duration {
        Duration::from_secs(self.freshness_floor_secs)
    }
}
