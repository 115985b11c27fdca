//! Signal handling for graceful shutdown.
//!
//! Centralized Ctrl+C handling built on an `AtomicBool` flag shared
//! across worker threads. The engine checks the flag at stage boundaries
//! and before each deletion; when it is set the run aborts cleanly and
//! the process exits with code 130 (128 + SIGINT).

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Centralized shutdown handler for graceful termination.
///
/// Wraps an `AtomicBool` flag that is set when a Ctrl+C signal is
/// received. The flag can be shared with worker threads to enable
/// coordinated shutdown.
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandler {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandler {
    /// Create a new shutdown handler with the flag initially unset.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if shutdown has been requested.
    #[must_use]
    pub fn is_shutdown_requested(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Manually request a shutdown.
    pub fn request_shutdown(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Get a clone of the shutdown flag for passing to the engine.
    #[must_use]
    pub fn get_flag(&self) -> Arc<AtomicBool> {
        self.flag.clone()
    }
}

/// Install the Ctrl+C handler and return the shutdown handler.
///
/// The handler sets the shared flag and prints a short notice to stderr;
/// in-flight work observes the flag and unwinds at the next checkpoint.
///
/// # Errors
///
/// Returns an error if the signal handler could not be installed (for
/// example if another handler is already registered).
pub fn install_handler() -> Result<ShutdownHandler, ctrlc::Error> {
    let handler = ShutdownHandler::new();
    let flag = handler.get_flag();

    ctrlc::set_handler(move || {
        // Only announce the first signal; repeated Ctrl+C is a no-op.
        if !flag.swap(true, Ordering::SeqCst) {
            let mut stderr = std::io::stderr();
            let _ = writeln!(stderr, "\nInterrupted. Cleaning up...");
        }
    })?;

    Ok(handler)
}
