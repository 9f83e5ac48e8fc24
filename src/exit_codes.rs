//! Exit code constants for the fanout CLI.
//!
//! - 0: Success
//! - 1: User error (bad args, invalid config)
//! - 2: I/O failure on a shared file
//! - 3: Deadline elapsed while waiting on a lock
//! - 4: Stale lock state from an unfinished prior round

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// User error: bad arguments or invalid configuration.
pub const USER_ERROR: i32 = 1;

/// I/O failure: a shared file could not be opened, read, written, or renamed.
pub const IO_FAILURE: i32 = 2;

/// A polling wait exceeded its deadline.
pub const TIMEOUT: i32 = 3;

/// Stale lock state detected at round start.
pub const BAD_INITIAL_STATE: i32 = 4;
