//! Coordinator - wires up and runs the serve-mode actors.

use std::net::TcpListener;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use crossbeam::channel::Receiver;
use tokio::sync::mpsc;

use super::builder::BuildActor;
use super::fs::FsActor;
use super::messages::{BuildMsg, FsMsg, WsMsg};
use super::ws::WsActor;
use crate::config::ProjectConfig;

const CHANNEL_BUFFER: usize = 32;

/// How long an in-flight pass may delay shutdown
const SHUTDOWN_GRACE: Duration = Duration::from_millis(500);

pub struct Coordinator {
    config: Arc<ProjectConfig>,
    ws_listener: Option<TcpListener>,
    shutdown_rx: Option<Receiver<()>>,
    /// Files read by the initial build
    inputs: Vec<PathBuf>,
}

impl Coordinator {
    pub fn with_config(config: Arc<ProjectConfig>) -> Self {
        Self {
            config,
            ws_listener: None,
            shutdown_rx: None,
            inputs: Vec::new(),
        }
    }

    pub fn with_inputs(mut self, inputs: Vec<PathBuf>) -> Self {
        self.inputs = inputs;
        self
    }

    /// Live reload listener; without one, rebuilds still run but no
    /// browser is notified.
    pub fn with_ws_listener(mut self, listener: TcpListener) -> Self {
        self.ws_listener = Some(listener);
        self
    }

    pub fn with_shutdown_signal(mut self, rx: Receiver<()>) -> Self {
        self.shutdown_rx = Some(rx);
        self
    }

    /// Run the actor system until shutdown.
    pub async fn run(self) -> Result<()> {
        let (build_tx, build_rx) = mpsc::channel::<BuildMsg>(CHANNEL_BUFFER);
        let (ws_tx, ws_rx) = mpsc::channel::<WsMsg>(CHANNEL_BUFFER);
        let (fs_tx, fs_rx) = mpsc::channel::<FsMsg>(CHANNEL_BUFFER);

        if let Some(listener) = self.ws_listener {
            crate::reload::server::spawn_acceptor(listener, ws_tx.clone())?;
        }

        let fs_actor = FsActor::new(&self.config, &self.inputs, build_tx.clone(), fs_rx)
            .map_err(|e| anyhow::anyhow!("watcher failed: {}", e))?;
        let build_actor = BuildActor::new(
            build_rx,
            ws_tx.clone(),
            fs_tx,
            Arc::clone(&self.config),
        );
        let ws_actor = WsActor::new(ws_rx);

        crate::debug!("actor"; "start");
        let fs_handle = tokio::spawn(fs_actor.run());
        let build_handle = tokio::spawn(build_actor.run());
        let ws_handle = tokio::spawn(ws_actor.run());

        match self.shutdown_rx {
            Some(rx) => loop {
                if rx.try_recv().is_ok() {
                    crate::debug!("actor"; "shutdown signal received");
                    break;
                }
                tokio::time::sleep(Duration::from_millis(100)).await;
            },
            None => {
                tokio::select! {
                    _ = fs_handle => {}
                    _ = ws_handle => {}
                }
            }
        }

        let _ = build_tx.send(BuildMsg::Shutdown).await;
        let _ = ws_tx.send(WsMsg::Shutdown).await;
        let _ = tokio::time::timeout(SHUTDOWN_GRACE, build_handle).await;

        crate::debug!("actor"; "stopped");
        Ok(())
    }
}
