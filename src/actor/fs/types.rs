use std::path::PathBuf;

/// What happened to a file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum ChangeKind {
    Created,
    Modified,
    Removed,
}

impl ChangeKind {
    pub(super) fn label(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Modified => "modified",
            Self::Removed => "removed",
        }
    }
}

/// A path handed to the watcher.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(super) struct WatchRoot {
    pub path: PathBuf,
    /// Directories holding single watched files are not watched recursively
    pub recursive: bool,
}

impl WatchRoot {
    pub(super) fn recursive(path: PathBuf) -> Self {
        Self {
            path,
            recursive: true,
        }
    }

    pub(super) fn flat(path: PathBuf) -> Self {
        Self {
            path,
            recursive: false,
        }
    }

    pub(super) fn mode(&self) -> notify::RecursiveMode {
        if self.recursive {
            notify::RecursiveMode::Recursive
        } else {
            notify::RecursiveMode::NonRecursive
        }
    }
}
