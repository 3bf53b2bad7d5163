//! Ctrl+C handling.
//!
//! A signal sets a shared `AtomicBool`. The duplicate finder checks it while
//! walking and before starting each size group; a comparison session that
//! has started always runs to completion, so no partial cluster is ever
//! reported.
//!
//! ```rust,no_run
//! use dupecmp::duplicates::FinderConfig;
//! use dupecmp::signal::install_handler;
//!
//! let handler = install_handler().expect("signal handler");
//! let config = FinderConfig::default().with_shutdown_flag(handler.get_flag());
//! ```

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

/// Exit code for SIGINT: 128 + 2.
pub const EXIT_CODE_INTERRUPTED: i32 = 130;

/// Shared shutdown flag.
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandler {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandler {
    /// Create a handler with no shutdown requested.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether shutdown was requested.
    #[must_use]
    pub fn is_shutdown_requested(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Request shutdown, as Ctrl+C would.
    pub fn request_shutdown(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// The flag, for [`FinderConfig::with_shutdown_flag`](crate::duplicates::FinderConfig::with_shutdown_flag)
    /// and [`Walker::with_shutdown_flag`](crate::scanner::Walker::with_shutdown_flag).
    #[must_use]
    pub fn get_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.flag)
    }

    /// Clear the flag.
    pub fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// Error type for signal handler installation.
#[derive(Debug, thiserror::Error)]
pub enum SignalError {
    /// Failed to install the Ctrl+C handler.
    #[error("Failed to install signal handler: {0}")]
    InstallFailed(#[from] ctrlc::Error),
}

static GLOBAL_HANDLER: OnceLock<ShutdownHandler> = OnceLock::new();

/// Install the process-wide Ctrl+C handler.
///
/// The hook is registered once per process; later calls reset and return
/// the same handler, so `run_app` can be called repeatedly (as the tests do).
///
/// # Errors
///
/// Returns `SignalError::InstallFailed` if the hook cannot be registered
/// and no handler was installed before.
pub fn install_handler() -> Result<ShutdownHandler, SignalError> {
    if let Some(handler) = GLOBAL_HANDLER.get() {
        handler.reset();
        return Ok(handler.clone());
    }

    let handler = ShutdownHandler::new();
    let flag = handler.get_flag();
    let registered = ctrlc::set_handler(move || {
        flag.store(true, Ordering::SeqCst);
        let mut stderr = std::io::stderr();
        let _ = writeln!(stderr, "\nInterrupted. Finishing the current size group...");
        let _ = stderr.flush();
        log::info!("Shutdown signal received");
    });

    match registered {
        Ok(()) => Ok(GLOBAL_HANDLER.get_or_init(|| handler).clone()),
        Err(ctrlc::Error::MultipleHandlers) => {
            // Another thread won the race, or some other code owns the hook.
            log::debug!("Ctrl+C handler already registered, using unhooked handler");
            let existing = GLOBAL_HANDLER.get_or_init(ShutdownHandler::new);
            existing.reset();
            Ok(existing.clone())
        }
        Err(e) => Err(e.into()),
    }
}
