//! Command implementations for fanout.
//!
//! This module provides the dispatcher that routes CLI commands to their
//! implementations.

use crate::cli::{CleanArgs, Command, RunArgs};
use crate::config::ShareConfig;
use crate::error::{FanoutError, Result};
use crate::lock;
use crate::share::Distributor;
use crate::stopwatch::RuntimeReport;
use crate::tasks;
use std::path::{Path, PathBuf};

/// Dispatch a command to its implementation.
pub fn dispatch(command: Command) -> Result<()> {
    match command {
        Command::Run(args) => cmd_run(args),
        Command::Clean(args) => cmd_clean(args),
    }
}

/// Resolve the round configuration from CLI arguments.
///
/// Precedence: config file values, then the shared directory rebases the
/// relative paths.
fn resolve_config(config_path: Option<&Path>, dir: Option<&Path>) -> Result<ShareConfig> {
    let config = match config_path {
        Some(path) => ShareConfig::load(path)?,
        None => ShareConfig::default(),
    };

    let dir = match dir {
        Some(dir) => dir.to_path_buf(),
        None => std::env::current_dir().map_err(|e| {
            FanoutError::UserError(format!("failed to get current working directory: {}", e))
        })?,
    };

    Ok(config.rooted(dir))
}

/// Run one distribution round end to end.
fn cmd_run(args: RunArgs) -> Result<()> {
    let mut config = resolve_config(args.config.as_deref(), args.dir.as_deref())?;
    if args.verbose {
        config.verbose = true;
    }

    let _report = RuntimeReport::new();

    let task_list = tasks::generate_tasks(args.tasks);
    let claimed = Distributor::new(config).distribute(&task_list);
    tasks::consume_tasks(&claimed);

    Ok(())
}

/// Remove leftover round files.
fn cmd_clean(args: CleanArgs) -> Result<()> {
    let config = resolve_config(args.config.as_deref(), args.dir.as_deref())?;

    let leftovers: [&PathBuf; 5] = [
        &config.task_file,
        &config.registry_file,
        &config.barrier1_file,
        &config.barrier2_file,
        &config.share_lock_file,
    ];

    let mut removed = 0;
    for path in leftovers {
        if !path.exists() {
            continue;
        }
        if lock::is_locked(path) {
            return Err(FanoutError::UserError(format!(
                "refusing to clean '{}': it is lock-held, a round appears to be in flight",
                path.display()
            )));
        }
        std::fs::remove_file(path).map_err(|e| {
            FanoutError::Io(format!("failed to remove '{}': {}", path.display(), e))
        })?;
        removed += 1;
    }

    println!("removed {} leftover file(s)", removed);
    Ok(())
}
