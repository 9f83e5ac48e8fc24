//! Elapsed-time measurement utilities.
//!
//! The rendezvous leader uses a [`Stopwatch`] to compute its pad sleep, and
//! the CLI wraps a whole run in a [`RuntimeReport`] that prints the total
//! runtime when it goes out of scope.

use std::time::{Duration, Instant};

/// Monotonic stopwatch.
#[derive(Debug, Clone, Copy)]
pub struct Stopwatch {
    started: Instant,
}

impl Stopwatch {
    /// Start a new stopwatch.
    pub fn start() -> Self {
        Self {
            started: Instant::now(),
        }
    }

    /// Duration elapsed since the stopwatch was started.
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

/// Prints an end-of-run elapsed-time line when dropped.
#[derive(Debug)]
pub struct RuntimeReport {
    stopwatch: Stopwatch,
}

impl RuntimeReport {
    /// Start measuring from now.
    pub fn new() -> Self {
        Self {
            stopwatch: Stopwatch::start(),
        }
    }
}

impl Default for RuntimeReport {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for RuntimeReport {
    fn drop(&mut self) {
        println!("runtime: {:.6}s", self.stopwatch.elapsed().as_secs_f64());
    }
}
