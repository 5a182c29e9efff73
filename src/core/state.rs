//! Process-wide interrupt state.
//!
//! Ctrl+C does not kill `bpmn-svg` directly: it sets `SHUTDOWN` so the build
//! stops scheduling conversions. Renderers already running receive the
//! terminal's SIGINT themselves, and their scratch files are removed as each
//! conversion unwinds.

use std::sync::atomic::{AtomicBool, Ordering};

/// Shutdown has been requested (Ctrl+C received)
static SHUTDOWN: AtomicBool = AtomicBool::new(false);

/// Setup the global Ctrl+C handler. Call once at program start
///
/// A second Ctrl+C exits immediately.
pub fn setup_shutdown_handler() -> anyhow::Result<()> {
    ctrlc::set_handler(|| {
        if SHUTDOWN.swap(true, Ordering::SeqCst) {
            std::process::exit(130);
        }
        crate::log!("build"; "interrupted, finishing running conversions...");
    })
    .map_err(|e| anyhow::anyhow!("failed to set Ctrl+C handler: {}", e))
}

/// Check if shutdown has been requested
///
/// Uses Relaxed ordering - worst case is starting one more conversion
pub fn is_shutdown() -> bool {
    SHUTDOWN.load(Ordering::Relaxed)
}
