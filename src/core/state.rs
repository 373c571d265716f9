//! Serve-mode state shared between the HTTP loop and the build actor.
//!
//! - `SHUTDOWN`: Ctrl+C received
//! - `BUILD_ERROR`: message of the last failed build pass, if the last pass failed

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, LazyLock, OnceLock};

use parking_lot::RwLock;
use tiny_http::Server;

static SHUTDOWN: AtomicBool = AtomicBool::new(false);

static BUILD_ERROR: LazyLock<RwLock<Option<String>>> = LazyLock::new(|| RwLock::new(None));

/// HTTP server reference for graceful shutdown
static SERVER: OnceLock<Arc<Server>> = OnceLock::new();

/// Shutdown signal sender for the actor system
static SHUTDOWN_TX: OnceLock<crossbeam::channel::Sender<()>> = OnceLock::new();

// =============================================================================
// Build health
// =============================================================================

/// Record the outcome of a build pass.
pub fn set_build_result(error: Option<String>) {
    *BUILD_ERROR.write() = error;
}

/// Error text of the last pass, `None` when it succeeded.
pub fn build_error() -> Option<String> {
    BUILD_ERROR.read().clone()
}

// =============================================================================
// Shutdown
// =============================================================================

/// Install the Ctrl+C handler. Call once at program start.
///
/// Before a server is registered the process exits right away; afterwards
/// the request loop is unblocked and the actors are told to stop.
pub fn setup_shutdown_handler() -> anyhow::Result<()> {
    ctrlc::set_handler(|| {
        SHUTDOWN.store(true, Ordering::SeqCst);

        if let Some(tx) = SHUTDOWN_TX.get() {
            let _ = tx.send(());
        }

        if let Some(server) = SERVER.get() {
            crate::log!("serve"; "shutting down...");
            server.unblock();
        } else {
            std::process::exit(0);
        }
    })
    .map_err(|e| anyhow::anyhow!("failed to set Ctrl+C handler: {}", e))
}

/// Register the HTTP server and actor shutdown channel.
pub fn register_server(server: Arc<Server>, shutdown_tx: crossbeam::channel::Sender<()>) {
    let _ = SERVER.set(server);
    let _ = SHUTDOWN_TX.set(shutdown_tx);
}

pub fn is_shutdown() -> bool {
    SHUTDOWN.load(Ordering::Relaxed)
}
