//! Config file discovery.

use std::path::{Path, PathBuf};

/// Find the config file by walking up from the current directory.
///
/// ```text
/// /home/user/app/src/js/   ← cwd
/// /home/user/app/sprig.toml ← found
/// ```
pub fn find_config_file(config_name: &Path) -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    find_upward(&cwd, config_name)
}

fn find_upward(start: &Path, config_name: &Path) -> Option<PathBuf> {
    if config_name.is_absolute() {
        return config_name.exists().then(|| config_name.to_path_buf());
    }

    start
        .ancestors()
        .map(|dir| dir.join(config_name))
        .find(|candidate| candidate.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_find_upward_from_nested_dir() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("src/js");
        fs::create_dir_all(&nested).unwrap();
        fs::write(dir.path().join("sprig.toml"), "").unwrap();

        let found = find_upward(&nested, Path::new("sprig.toml")).unwrap();
        assert_eq!(found, dir.path().join("sprig.toml"));
    }

    #[test]
    fn test_find_upward_missing() {
        let dir = TempDir::new().unwrap();
        assert!(find_upward(dir.path(), Path::new("no-such-config-file.toml")).is_none());
    }

    #[test]
    fn test_absolute_config_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("custom.toml");
        assert!(find_upward(dir.path(), &path).is_none());
        fs::write(&path, "").unwrap();
        assert_eq!(find_upward(Path::new("/"), &path), Some(path));
    }
}
