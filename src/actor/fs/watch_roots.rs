use std::path::PathBuf;

use notify::Watcher;
use rustc_hash::FxHashSet;

use super::types::WatchRoot;

/// Keeps every wanted root attached to the watcher.
///
/// Roots that do not exist yet (a copy source or deps directory created
/// later) are attached once they appear. Roots that were deleted and
/// recreated are re-attached.
pub(super) struct WatchRoots {
    desired: Vec<WatchRoot>,
    attached: FxHashSet<PathBuf>,
}

impl WatchRoots {
    pub(super) fn new(roots: Vec<WatchRoot>) -> Self {
        Self {
            desired: roots,
            attached: FxHashSet::default(),
        }
    }

    /// Attach every existing root, returning how many are attached.
    pub(super) fn attach_existing(&mut self, watcher: &mut impl Watcher) -> usize {
        for root in &self.desired {
            if !root.path.exists() {
                crate::debug!("watch"; "not watching yet: {}", root.path.display());
                continue;
            }
            match watcher.watch(&root.path, root.mode()) {
                Ok(()) => {
                    self.attached.insert(root.path.clone());
                }
                Err(e) => crate::log!("watch"; "cannot watch {}: {}", root.path.display(), e),
            }
        }
        self.attached.len()
    }

    /// Start watching roots discovered after startup.
    pub(super) fn add(&mut self, roots: Vec<WatchRoot>, watcher: &mut impl Watcher) {
        for root in roots {
            if self.desired.contains(&root) {
                continue;
            }
            if root.path.exists() {
                match watcher.watch(&root.path, root.mode()) {
                    Ok(()) => {
                        self.attached.insert(root.path.clone());
                        crate::debug!("watch"; "watching {}", root.path.display());
                    }
                    Err(e) => {
                        crate::log!("watch"; "cannot watch {}: {}", root.path.display(), e)
                    }
                }
            }
            self.desired.push(root);
        }
    }

    pub(super) fn maintain(&mut self, watcher: &mut impl Watcher) {
        // Drop stale handles for roots that no longer exist
        self.attached.retain(|path| path.exists());

        for root in &self.desired {
            if self.attached.contains(&root.path) || !root.path.exists() {
                continue;
            }

            if watcher.watch(&root.path, root.mode()).is_ok() {
                self.attached.insert(root.path.clone());
                crate::debug!("watch"; "re-attached watch: {}", root.path.display());
            }
        }
    }

    #[cfg(test)]
    pub(super) fn is_attached(&self, path: &std::path::Path) -> bool {
        self.attached.contains(path)
    }
}
