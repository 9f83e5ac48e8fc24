//! Fanout: leaderless task distribution over a shared filesystem.
//!
//! An unknown number of independent processes (possibly on different hosts
//! sharing a network filesystem) agree on a task list, elect an ad-hoc
//! leader to publish it, rendezvous at two barriers, and atomically
//! partition the list among themselves. There is no coordinator service;
//! the only primitives are OS advisory file locks and atomic file
//! replacement.
//!
//! The entry point for most callers is [`share::Distributor`]:
//!
//! ```no_run
//! use fanout::config::ShareConfig;
//! use fanout::share::Distributor;
//!
//! let config = ShareConfig::default().rooted("/mnt/shared/round");
//! let tasks: Vec<String> = (1..=10).map(|i| format!("job-{}", i)).collect();
//!
//! let claimed = Distributor::new(config).distribute(&tasks);
//! for task in &claimed {
//!     println!("claimed {}", task);
//! }
//! ```

pub mod barrier;
pub mod cli;
pub mod commands;
pub mod condvar;
pub mod config;
pub mod error;
pub mod events;
pub mod exit_codes;
pub mod fs;
pub mod lock;
pub mod queue;
pub mod registry;
pub mod share;
pub mod stopwatch;
pub mod tasks;
