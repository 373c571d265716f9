use std::path::PathBuf;
use std::time::{Duration, Instant};

use rustc_hash::FxHashMap;

use super::types::ChangeKind;

pub(super) const DEBOUNCE_MS: u64 = 300;
pub(super) const REBUILD_COOLDOWN_MS: u64 = 800;

/// Map a notify event kind, `None` for events that never trigger a rebuild.
pub(super) fn change_kind(kind: &notify::EventKind) -> Option<ChangeKind> {
    use notify::EventKind;
    use notify::event::ModifyKind;

    match kind {
        EventKind::Create(_) => Some(ChangeKind::Created),
        EventKind::Remove(_) => Some(ChangeKind::Removed),
        // mtime/atime/chmod noise would loop rebuilds forever
        EventKind::Modify(ModifyKind::Metadata(_)) => None,
        EventKind::Modify(_) => Some(ChangeKind::Modified),
        _ => None,
    }
}

/// Pure debouncer: timing and per-path deduplication only.
pub(super) struct Debouncer {
    pub(super) changes: FxHashMap<PathBuf, ChangeKind>,
    pub(super) last_event: Option<Instant>,
    pub(super) last_rebuild: Option<Instant>,
}

impl Debouncer {
    pub(super) fn new() -> Self {
        Self {
            changes: FxHashMap::default(),
            last_event: None,
            last_rebuild: None,
        }
    }

    /// Record one change.
    ///
    /// - Removed then Created/Modified: restored, keep the new kind
    /// - Modified then Removed: Removed
    /// - Created then Removed: never existed as far as the build cares
    /// - anything else: first event wins
    pub(super) fn add(&mut self, path: PathBuf, kind: ChangeKind) {
        self.last_event = Some(Instant::now());

        let Some(&existing) = self.changes.get(&path) else {
            crate::debug!("watch"; "event {}: {}", kind.label(), path.display());
            self.changes.insert(path, kind);
            return;
        };

        match (existing, kind) {
            (ChangeKind::Removed, ChangeKind::Created | ChangeKind::Modified) => {
                self.changes.insert(path, kind);
            }
            (ChangeKind::Modified, ChangeKind::Removed) => {
                self.changes.insert(path, ChangeKind::Removed);
            }
            (ChangeKind::Created, ChangeKind::Removed) => {
                crate::debug!("watch"; "discard created+removed: {}", path.display());
                self.changes.remove(&path);
            }
            _ => {}
        }
    }

    /// Take the pending changes, sorted by path, once debounce and
    /// cooldown have both elapsed.
    pub(super) fn take_if_ready(&mut self) -> Option<Vec<(PathBuf, ChangeKind)>> {
        if !self.is_ready() {
            return None;
        }

        let mut changes: Vec<_> = std::mem::take(&mut self.changes).into_iter().collect();
        self.last_event = None;
        self.last_rebuild = Some(Instant::now());

        changes.sort_by(|a, b| a.0.cmp(&b.0));
        Some(changes)
    }

    pub(super) fn is_ready(&self) -> bool {
        let Some(last_event) = self.last_event else {
            return false;
        };

        if last_event.elapsed() < Duration::from_millis(DEBOUNCE_MS) {
            return false;
        }

        if let Some(last_rebuild) = self.last_rebuild
            && last_rebuild.elapsed() < Duration::from_millis(REBUILD_COOLDOWN_MS)
        {
            return false;
        }

        !self.changes.is_empty()
    }

    /// Time until the debouncer could next become ready.
    pub(super) fn sleep_duration(&self) -> Duration {
        let Some(last_event) = self.last_event.filter(|_| !self.changes.is_empty()) else {
            return Duration::from_secs(86400);
        };

        let debounce_remaining =
            Duration::from_millis(DEBOUNCE_MS).saturating_sub(last_event.elapsed());

        let cooldown_remaining = self
            .last_rebuild
            .map(|t| Duration::from_millis(REBUILD_COOLDOWN_MS).saturating_sub(t.elapsed()))
            .unwrap_or(Duration::ZERO);

        debounce_remaining
            .max(cooldown_remaining)
            .max(Duration::from_millis(1))
    }
}
