//! Ctrl+C handling.
//!
//! The first Ctrl+C cancels the process-wide shutdown token so long-running
//! commands can stop their sessions and exit cleanly.

use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};

use super::CancelToken;

/// Shutdown has been requested (Ctrl+C received)
static SHUTDOWN: AtomicBool = AtomicBool::new(false);

/// Token cancelled on shutdown
static SHUTDOWN_TOKEN: OnceLock<CancelToken> = OnceLock::new();

/// Setup the global Ctrl+C handler. Call once at program start.
pub fn setup_shutdown_handler() -> anyhow::Result<()> {
    ctrlc::set_handler(|| {
        if SHUTDOWN.swap(true, Ordering::SeqCst) {
            // Second Ctrl+C: give up on a clean exit
            std::process::exit(130);
        }
        shutdown_token().cancel();
    })
    .map_err(|e| anyhow::anyhow!("failed to set Ctrl+C handler: {}", e))
}

/// Token cancelled once shutdown is requested.
pub fn shutdown_token() -> &'static CancelToken {
    SHUTDOWN_TOKEN.get_or_init(CancelToken::new)
}
