//! Server lifecycle management.

use std::net::{IpAddr, SocketAddr, TcpListener};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::Result;
use crossbeam::channel::Receiver;
use tiny_http::Server;

use crate::actor::Coordinator;
use crate::config::ProjectConfig;
use crate::log;

/// Maximum number of port binding attempts.
const MAX_PORT_RETRIES: u16 = 10;

/// Bind to the specified interface and port, with automatic port retry.
pub fn bind_with_retry(interface: IpAddr, base_port: u16) -> Result<(Server, SocketAddr)> {
    let mut last_error = None;

    for offset in 0..MAX_PORT_RETRIES {
        let port = base_port.saturating_add(offset);
        let addr = SocketAddr::new(interface, port);

        match Server::http(addr) {
            Ok(server) => {
                if offset > 0 {
                    log!("serve"; "port {} in use, using {} instead", base_port, port);
                }
                return Ok((server, addr));
            }
            Err(e) => last_error = Some(e),
        }
    }

    Err(anyhow::anyhow!(
        "Failed to bind after {} attempts (ports {}-{}): {}",
        MAX_PORT_RETRIES,
        base_port,
        base_port.saturating_add(MAX_PORT_RETRIES - 1),
        last_error.map(|e| e.to_string()).unwrap_or_default()
    ))
}

/// Run the watch actors on their own thread with a tokio runtime.
///
/// `inputs` are the files the initial build read.
pub fn spawn_actors(
    config: Arc<ProjectConfig>,
    inputs: Vec<PathBuf>,
    ws_listener: Option<TcpListener>,
    shutdown_rx: Receiver<()>,
) -> JoinHandle<()> {
    thread::spawn(move || run_actor_system(config, inputs, ws_listener, shutdown_rx))
}

fn run_actor_system(
    config: Arc<ProjectConfig>,
    inputs: Vec<PathBuf>,
    ws_listener: Option<TcpListener>,
    shutdown_rx: Receiver<()>,
) {
    let rt = match tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            log!("actor"; "failed to create runtime: {}", e);
            return;
        }
    };

    rt.block_on(async {
        let mut coordinator = Coordinator::with_config(config)
            .with_inputs(inputs)
            .with_shutdown_signal(shutdown_rx);
        if let Some(listener) = ws_listener {
            coordinator = coordinator.with_ws_listener(listener);
        }
        if let Err(e) = coordinator.run().await {
            log!("actor"; "error: {}", e);
        }
    });

    // Do not wait on a pass still running on the blocking pool
    rt.shutdown_timeout(Duration::from_millis(500));
}

/// Wait for actor system to shutdown gracefully (max 2 seconds).
pub fn wait_for_shutdown(handle: Option<JoinHandle<()>>) {
    let Some(handle) = handle else { return };

    for _ in 0..40 {
        if handle.is_finished() {
            let _ = handle.join();
            return;
        }
        thread::sleep(Duration::from_millis(50));
    }
}
