//! FileSystem Actor
//!
//! Watches the project sources and sends debounced rebuild requests to the
//! BuildActor.
//!
//! ```text
//! notify → WatchScope (filter) → Debouncer (timing) → BuildMsg::Rebuild
//! ```
//!
//! After each successful pass the BuildActor reports the files it read, so
//! stylesheets imported from outside the configured roots are watched too.
//!
//! The watcher is created before the actor runs, so events that happen
//! while the server starts up are buffered rather than lost.

use std::path::PathBuf;
use std::time::Duration;

use notify::RecommendedWatcher;
use tokio::sync::mpsc;

use super::messages::{BuildMsg, FsMsg};
use crate::config::ProjectConfig;
use crate::utils::path::normalize_path;

// Pure timing and deduplication.
mod debouncer;
// Watched roots and event filtering.
mod scope;
// Shared fs event types.
mod types;
// Watch root attach/re-attach lifecycle.
mod watch_roots;

#[cfg(test)]
mod tests;

use debouncer::{Debouncer, change_kind};
use scope::WatchScope;
use types::ChangeKind;
use watch_roots::WatchRoots;

/// How often missing watch roots are retried while idle
const MAINTAIN_INTERVAL: Duration = Duration::from_secs(1);

/// FileSystem Actor - watches for file changes
pub struct FsActor {
    /// notify events (sync side of the bridge)
    notify_rx: std::sync::mpsc::Receiver<notify::Result<notify::Event>>,
    /// Watcher handle (must be kept alive)
    watcher: RecommendedWatcher,
    watch_roots: WatchRoots,
    scope: WatchScope,
    build_tx: mpsc::Sender<BuildMsg>,
    rx: mpsc::Receiver<FsMsg>,
}

impl FsActor {
    /// `inputs` are the files read by the build that ran before the actor.
    pub fn new(
        config: &ProjectConfig,
        inputs: &[PathBuf],
        build_tx: mpsc::Sender<BuildMsg>,
        rx: mpsc::Receiver<FsMsg>,
    ) -> notify::Result<Self> {
        let (notify_tx, notify_rx) = std::sync::mpsc::channel();

        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = notify_tx.send(res);
        })?;

        let mut scope = WatchScope::from_config(config);
        scope.add_inputs(inputs);
        let mut watch_roots = WatchRoots::new(scope.roots());
        let attached = watch_roots.attach_existing(&mut watcher);
        crate::debug!("watch"; "{} roots attached", attached);

        Ok(Self {
            notify_rx,
            watcher,
            watch_roots,
            scope,
            build_tx,
            rx,
        })
    }

    /// Run the actor event loop
    pub async fn run(self) {
        let Self {
            notify_rx,
            mut watcher,
            mut watch_roots,
            mut scope,
            build_tx,
            mut rx,
        } = self;
        let mut debouncer = Debouncer::new();

        let (async_tx, mut async_rx) = mpsc::channel::<notify::Event>(64);

        // notify only offers a sync channel
        std::thread::spawn(move || {
            while let Ok(result) = notify_rx.recv() {
                match result {
                    Ok(event) => {
                        if async_tx.blocking_send(event).is_err() {
                            break;
                        }
                    }
                    Err(e) => crate::log!("watch"; "notify error: {}", e),
                }
            }
        });

        loop {
            tokio::select! {
                biased;
                Some(event) = async_rx.recv() => add_event(&mut debouncer, &scope, &event),
                Some(FsMsg::WatchInputs(inputs)) = rx.recv() => {
                    let added = scope.add_inputs(&inputs);
                    watch_roots.add(added, &mut watcher);
                }
                _ = tokio::time::sleep(debouncer.sleep_duration().min(MAINTAIN_INTERVAL)) => {
                    watch_roots.maintain(&mut watcher);
                    if crate::core::is_shutdown() {
                        break;
                    }
                    if flush(&mut debouncer, &scope, &build_tx).await.is_err() {
                        break;
                    }
                }
            }
        }
        crate::debug!("watch"; "stopped");
    }
}

fn add_event(debouncer: &mut Debouncer, scope: &WatchScope, event: &notify::Event) {
    let Some(kind) = change_kind(&event.kind) else {
        return;
    };

    for path in &event.paths {
        let path = normalize_path(path);
        if scope.accepts(&path) {
            debouncer.add(path, kind);
        }
    }
}

/// Send pending changes once the debouncer is ready.
///
/// Returns `Err(())` when the BuildActor is gone.
async fn flush(
    debouncer: &mut Debouncer,
    scope: &WatchScope,
    build_tx: &mpsc::Sender<BuildMsg>,
) -> Result<(), ()> {
    let Some(changes) = debouncer.take_if_ready() else {
        return Ok(());
    };

    let removed = changes
        .iter()
        .filter(|(_, kind)| *kind == ChangeKind::Removed)
        .count();
    crate::debug!("watch"; "{} changed ({} removed)", changes.len(), removed);

    let changed = changes.into_iter().map(|(path, _)| path).collect();
    build_tx
        .send(scope.rebuild_msg(changed))
        .await
        .map_err(|_| ())
}
