//! Error types for fanout.
//!
//! Uses thiserror for derive macros. Lower-level components (lock, queue,
//! registry) always surface errors; only the orchestrator and the CLI
//! boundary interpret them.

use crate::exit_codes;
use std::time::Duration;
use thiserror::Error;

/// Main error type for fanout operations.
///
/// The variants are deliberately coarse: callers recover based on the kind
/// (a tolerated barrier timeout vs. a hard I/O failure), not on structured
/// payloads, so each variant carries a pre-formatted message where needed.
#[derive(Error, Debug)]
pub enum FanoutError {
    /// Failure to open/create/read/write/rename a required file.
    #[error("{0}")]
    Io(String),

    /// A polling wait exceeded its deadline before the lock was acquired.
    #[error("timed out after {0:?} waiting for lock")]
    Timeout(Duration),

    /// Stale lock state from a crashed prior round was detected during
    /// leader setup.
    #[error("bad initial state: {0}")]
    BadInitialState(String),

    /// User provided invalid arguments or configuration.
    #[error("{0}")]
    UserError(String),
}

impl FanoutError {
    /// Returns the appropriate process exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            FanoutError::UserError(_) => exit_codes::USER_ERROR,
            FanoutError::Io(_) => exit_codes::IO_FAILURE,
            FanoutError::Timeout(_) => exit_codes::TIMEOUT,
            FanoutError::BadInitialState(_) => exit_codes::BAD_INITIAL_STATE,
        }
    }
}

/// Result type alias for fanout operations.
pub type Result<T> = std::result::Result<T, FanoutError>;
