//! CLI argument parsing for fanout.
//!
//! Uses clap derive macros for declarative argument definitions.
//! This module defines the command structure; actual implementations
//! are in the `commands` module.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Fanout: leaderless task distribution over a shared filesystem.
///
/// Every process running `fanout run` against the same directory joins the
/// same round: the first arriver publishes the task list and the
/// participants split it evenly among themselves.
#[derive(Parser, Debug)]
#[command(name = "fanout")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands for fanout.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run one distribution round and print the claimed tasks.
    Run(RunArgs),

    /// Remove leftover round files (task list, registry, lock files).
    ///
    /// Refuses to remove files that are currently lock-held, since that
    /// means a round is still in flight.
    Clean(CleanArgs),
}

/// Arguments for the `run` command.
#[derive(clap::Args, Debug)]
pub struct RunArgs {
    /// Number of synthetic tasks to generate for the round.
    #[arg(long, default_value_t = 10)]
    pub tasks: usize,

    /// Directory the cooperating processes share (default: current dir).
    #[arg(long)]
    pub dir: Option<PathBuf>,

    /// YAML config file overriding the protocol defaults.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Print protocol progress to stdout.
    #[arg(long, short)]
    pub verbose: bool,
}

/// Arguments for the `clean` command.
#[derive(clap::Args, Debug)]
pub struct CleanArgs {
    /// Directory the cooperating processes share (default: current dir).
    #[arg(long)]
    pub dir: Option<PathBuf>,

    /// YAML config file overriding the protocol defaults.
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
