//! Entry discovery: one named build input per file in the entry directory.
//!
//! ```text
//! src/js/
//! ├── app.js        -> "app"
//! ├── admin.min.js  -> "admin.min"
//! ├── .eslintrc     -> (hidden, skipped)
//! └── lib/          -> (directory, skipped)
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::{BuildError, BuildResult};

/// A named build input corresponding to one output bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryPoint {
    pub name: String,
    /// Absolute path
    pub path: PathBuf,
}

impl EntryPoint {
    pub fn file_name(&self) -> &str {
        crate::utils::path::file_name(&self.path)
    }
}

/// Entry points ordered by name; names are unique.
pub type EntryMap = BTreeMap<String, EntryPoint>;

/// Scan `dir` (non-recursively) for entry points.
///
/// Fails with `NotFound` when the directory is absent and with
/// `DuplicateEntry` when two files share a name (`app.js`, `app.mjs`).
pub fn discover_entries(dir: &Path) -> BuildResult<EntryMap> {
    if !dir.is_dir() {
        return Err(BuildError::NotFound(dir.to_path_buf()));
    }

    let read = fs::read_dir(dir).map_err(BuildError::io(dir))?;
    let mut entries = EntryMap::new();

    for item in read {
        let item = item.map_err(BuildError::io(dir))?;
        let path = item.path();
        if !path.is_file() || is_hidden(&path) {
            continue;
        }
        let name = entry_name(&path);
        if path.file_stem().and_then(|stem| stem.to_str()).is_none() {
            crate::log!("entry"; "file name is not UTF-8, using `{}`: {}", name, path.display());
        }

        let path = crate::utils::path::normalize_path(&path);
        if let Some(existing) = entries.get(&name) {
            // Report in a stable order regardless of read_dir order
            let (first, second) = if existing.path < path {
                (existing.path.clone(), path)
            } else {
                (path, existing.path.clone())
            };
            return Err(BuildError::DuplicateEntry {
                name,
                first,
                second,
            });
        }
        entries.insert(name.clone(), EntryPoint { name, path });
    }

    Ok(entries)
}

/// File name without its last extension: `a.min.js` -> `a.min`.
///
/// Names that are not valid UTF-8 are converted lossily.
fn entry_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn is_hidden(path: &Path) -> bool {
    crate::utils::path::file_name(path).starts_with('.')
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), "").unwrap();
    }

    #[test]
    fn test_one_entry_per_file() {
        let dir = TempDir::new().unwrap();
        let names = ["a.js", "b.js", "c.mjs", "theme.scss", "logo.png"];
        for name in names {
            touch(dir.path(), name);
        }

        let entries = discover_entries(dir.path()).unwrap();
        assert_eq!(entries.len(), names.len());

        let unique: BTreeSet<_> = entries.values().map(|e| e.name.clone()).collect();
        assert_eq!(unique.len(), names.len());
        assert!(entries.values().all(|e| e.path.is_absolute()));
    }

    #[test]
    fn test_entry_names_strip_last_extension() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "admin.min.js");
        touch(dir.path(), "README");

        let entries = discover_entries(dir.path()).unwrap();
        assert!(entries.contains_key("admin.min"));
        assert!(entries.contains_key("README"));
        assert_eq!(entries["admin.min"].file_name(), "admin.min.js");
    }

    #[test]
    fn test_non_recursive_and_hidden_skipped() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "app.js");
        touch(dir.path(), ".eslintrc");
        fs::create_dir_all(dir.path().join("lib")).unwrap();
        touch(&dir.path().join("lib"), "util.js");

        let entries = discover_entries(dir.path()).unwrap();
        assert_eq!(entries.keys().collect::<Vec<_>>(), vec!["app"]);
    }

    #[test]
    fn test_missing_directory() {
        let dir = TempDir::new().unwrap();
        let err = discover_entries(&dir.path().join("missing")).unwrap_err();
        assert!(matches!(err, BuildError::NotFound(_)));
        assert!(err.is_configuration());
    }

    #[test]
    fn test_file_instead_of_directory() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "app.js");
        let err = discover_entries(&dir.path().join("app.js")).unwrap_err();
        assert!(matches!(err, BuildError::NotFound(_)));
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "app.js");
        touch(dir.path(), "app.mjs");

        match discover_entries(dir.path()).unwrap_err() {
            BuildError::DuplicateEntry { name, first, second } => {
                assert_eq!(name, "app");
                assert!(first < second);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_name_still_an_entry() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = TempDir::new().unwrap();
        touch(dir.path(), "app.js");
        fs::write(dir.path().join(OsStr::from_bytes(b"caf\xe9.js")), "").unwrap();

        let entries = discover_entries(dir.path()).unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries.contains_key("caf\u{FFFD}"));
    }

    #[test]
    fn test_empty_directory() {
        let dir = TempDir::new().unwrap();
        assert!(discover_entries(dir.path()).unwrap().is_empty());
    }
}
