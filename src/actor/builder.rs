//! Build Actor - the only writer of the output tree.
//!
//! Requests that arrive while a pass is running wait in the channel. Before
//! each pass the queue is drained and folded into one request, so a burst of
//! changes costs at most one extra build.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;

use super::messages::{BuildMsg, FsMsg, WsMsg};
use crate::config::ProjectConfig;
use crate::core::set_build_result;
use crate::logger::{status_error, status_success};

/// One pass worth of queued requests.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct PendingBuild {
    pub changed: BTreeSet<PathBuf>,
    pub config_changed: bool,
}

/// Result of folding a batch of queued messages.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Coalesced {
    Build(PendingBuild),
    Shutdown,
}

/// Fold queued messages into a single pass. Shutdown wins over any rebuild.
pub(crate) fn coalesce(msgs: impl IntoIterator<Item = BuildMsg>) -> Coalesced {
    let mut pending = PendingBuild::default();
    for msg in msgs {
        match msg {
            BuildMsg::Rebuild {
                changed,
                config_changed,
            } => {
                pending.changed.extend(changed);
                pending.config_changed |= config_changed;
            }
            BuildMsg::Shutdown => return Coalesced::Shutdown,
        }
    }
    Coalesced::Build(pending)
}

pub struct BuildActor {
    rx: mpsc::Receiver<BuildMsg>,
    ws_tx: mpsc::Sender<WsMsg>,
    fs_tx: mpsc::Sender<FsMsg>,
    config: Arc<ProjectConfig>,
}

impl BuildActor {
    pub fn new(
        rx: mpsc::Receiver<BuildMsg>,
        ws_tx: mpsc::Sender<WsMsg>,
        fs_tx: mpsc::Sender<FsMsg>,
        config: Arc<ProjectConfig>,
    ) -> Self {
        Self {
            rx,
            ws_tx,
            fs_tx,
            config,
        }
    }

    /// Run the actor event loop
    pub async fn run(mut self) {
        while let Some(first) = self.rx.recv().await {
            let mut batch = vec![first];
            while let Ok(next) = self.rx.try_recv() {
                batch.push(next);
            }

            match coalesce(batch) {
                Coalesced::Build(pending) => self.rebuild(pending).await,
                Coalesced::Shutdown => break,
            }
        }
        crate::debug!("build"; "stopped");
    }

    async fn rebuild(&mut self, pending: PendingBuild) {
        crate::debug!("build"; "{} changed paths", pending.changed.len());

        if pending.config_changed {
            match self.config.reload() {
                Ok(config) => {
                    crate::log!("watch"; "config reloaded");
                    self.config = Arc::new(config);
                }
                Err(e) => {
                    self.report_failure("config error", format!("{e:#}")).await;
                    return;
                }
            }
        }

        let started = Instant::now();
        let config = Arc::clone(&self.config);
        let result =
            tokio::task::spawn_blocking(move || crate::pipeline::build_once(&config)).await;

        match result {
            Ok(Ok(plan)) => {
                set_build_result(None);
                status_success(&format!(
                    "{} ({} files in {}ms)",
                    describe_changes(&pending, &self.config),
                    plan.artifacts().len(),
                    started.elapsed().as_millis()
                ));
                let _ = self.ws_tx.send(WsMsg::Reload).await;

                let inputs = plan.inputs().iter().cloned().collect();
                let _ = self.fs_tx.send(FsMsg::WatchInputs(inputs)).await;
            }
            Ok(Err(e)) => {
                let summary = format!("build failed: {}", e.kind());
                self.report_failure(&summary, format!("{:#}", anyhow::Error::from(e)))
                    .await;
            }
            Err(e) => self.report_failure("build aborted", e.to_string()).await,
        }
    }

    async fn report_failure(&self, summary: &str, detail: String) {
        status_error(summary, &detail);
        set_build_result(Some(detail.clone()));
        let _ = self.ws_tx.send(WsMsg::Error(detail)).await;
    }
}

/// `rebuilt src/js/app.js`, or a count when several files changed.
fn describe_changes(pending: &PendingBuild, config: &ProjectConfig) -> String {
    let mut paths = pending.changed.iter();
    match (paths.next(), paths.next()) {
        (Some(only), None) => format!("rebuilt {}", config.root_relative(only).display()),
        (None, _) => "rebuilt".to_string(),
        _ => format!("rebuilt {} changed files", pending.changed.len()),
    }
}
