use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use super::types::WatchRoot;
use crate::actor::messages::BuildMsg;
use crate::config::ProjectConfig;
use crate::utils::path::normalize_path;

/// Which paths are watched, and which events inside them count.
///
/// - `dirs`: watched recursively, every change counts
/// - `files`: single files, watched through their parent directory so a
///   rename-save that replaces the file is still seen
/// - `input_dirs`: directories of files a build pass read from outside the
///   roots above (stylesheets imported from another directory); any direct
///   child counts
pub(super) struct WatchScope {
    dirs: Vec<PathBuf>,
    files: BTreeSet<PathBuf>,
    input_dirs: BTreeSet<PathBuf>,
    output: PathBuf,
    config_path: PathBuf,
}

impl WatchScope {
    /// Entry dir, copy sources, template, deps and the config file.
    pub(super) fn from_config(config: &ProjectConfig) -> Self {
        let build = &config.build;

        let mut dirs = vec![normalize_path(&build.entry)];
        dirs.extend(build.copy.iter().map(|c| normalize_path(&c.from)));

        let mut files = BTreeSet::new();
        files.insert(normalize_path(&config.config_path));
        if build.html.enable {
            files.insert(normalize_path(&build.html.template));
        }
        for dep in &build.deps {
            let dep = normalize_path(dep);
            if dep.is_file() {
                files.insert(dep);
            } else {
                dirs.push(dep);
            }
        }

        dedupe_nested(&mut dirs);
        files.retain(|file| !dirs.iter().any(|dir| file.starts_with(dir)));

        Self {
            dirs,
            files,
            input_dirs: BTreeSet::new(),
            output: normalize_path(&build.output),
            config_path: normalize_path(&config.config_path),
        }
    }

    /// Everything to hand to the watcher.
    pub(super) fn roots(&self) -> Vec<WatchRoot> {
        let mut roots: Vec<_> = self.dirs.iter().cloned().map(WatchRoot::recursive).collect();

        let parents: BTreeSet<PathBuf> = self
            .files
            .iter()
            .filter_map(|file| file.parent().map(Path::to_path_buf))
            .chain(self.input_dirs.iter().cloned())
            .filter(|dir| !self.in_dirs(dir))
            .collect();
        roots.extend(parents.into_iter().map(WatchRoot::flat));
        roots
    }

    /// Track the directories of `inputs` not already covered.
    ///
    /// Returns the roots that are new to the watcher.
    pub(super) fn add_inputs<'a>(
        &mut self,
        inputs: impl IntoIterator<Item = &'a PathBuf>,
    ) -> Vec<WatchRoot> {
        let before = self.roots();

        for input in inputs {
            let input = normalize_path(input);
            if self.covers(&input) || input.starts_with(&self.output) {
                continue;
            }
            if let Some(parent) = input.parent() {
                self.input_dirs.insert(parent.to_path_buf());
            }
        }

        self.roots()
            .into_iter()
            .filter(|root| !before.contains(root))
            .collect()
    }

    /// Whether a change to `path` should trigger a rebuild.
    pub(super) fn accepts(&self, path: &Path) -> bool {
        !path.starts_with(&self.output) && !is_temp_file(path) && self.covers(path)
    }

    fn covers(&self, path: &Path) -> bool {
        self.in_dirs(path)
            || self.files.contains(path)
            || path.parent().is_some_and(|dir| self.input_dirs.contains(dir))
    }

    fn in_dirs(&self, path: &Path) -> bool {
        self.dirs.iter().any(|dir| path.starts_with(dir))
    }

    pub(super) fn rebuild_msg(&self, changed: Vec<PathBuf>) -> BuildMsg {
        let config_changed = changed.iter().any(|p| *p == self.config_path);
        BuildMsg::Rebuild {
            changed,
            config_changed,
        }
    }
}

/// Drop roots already covered by a recursive watch on an ancestor.
fn dedupe_nested(roots: &mut Vec<PathBuf>) {
    roots.sort();
    roots.dedup();
    let all = roots.clone();
    roots.retain(|path| {
        !all
            .iter()
            .any(|other| other != path && path.starts_with(other))
    });
}

/// Editor temp and backup files.
pub(super) fn is_temp_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    matches!(ext, "bck" | "bak" | "backup" | "swp" | "swo" | "tmp")
        || name.ends_with('~')
        || name.starts_with('.')
        // vim checks directory writability with this name
        || name == "4913"
}
