//! URL to filesystem path resolution.

use std::path::{Path, PathBuf};

/// Resolve a request URL to a file under `serve_root`.
///
/// Directories map to their `index.html`. Anything that escapes the root,
/// including through symlinks, resolves to `None`.
pub fn resolve_path(url: &str, serve_root: &Path) -> Option<PathBuf> {
    let clean = normalize_url(url);

    if clean.split('/').any(|segment| segment == "..") {
        return None;
    }

    let local = serve_root.join(&clean);

    let canonical = local.canonicalize().ok()?;
    let root_canonical = serve_root.canonicalize().ok()?;

    if !canonical.starts_with(&root_canonical) {
        return None;
    }

    if canonical.is_file() {
        return Some(canonical);
    }

    if canonical.is_dir() {
        let index = canonical.join("index.html");
        if index.is_file() {
            return Some(index);
        }
    }

    None
}

/// Whether a browser asking for `url` expects a page: a directory, an
/// `.html` file, or an extensionless route.
pub fn wants_html(url: &str) -> bool {
    let clean = normalize_url(url);
    let last = clean.rsplit('/').next().unwrap_or_default();
    clean.is_empty()
        || url.split(['?', '#']).next().is_some_and(|p| p.ends_with('/'))
        || last.ends_with(".html")
        || last.ends_with(".htm")
        || !last.contains('.')
}

/// Decode, strip query string and fragment, trim slashes.
fn normalize_url(url: &str) -> String {
    use percent_encoding::percent_decode_str;

    let path = url.split(['?', '#']).next().unwrap_or(url);
    let decoded = percent_decode_str(path)
        .decode_utf8()
        .map(std::borrow::Cow::into_owned)
        .unwrap_or_default();

    decoded.trim_matches('/').replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn site() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("dist/js")).unwrap();
        fs::create_dir_all(dir.path().join("dist/docs")).unwrap();
        fs::write(dir.path().join("dist/index.html"), "<html></html>").unwrap();
        fs::write(dir.path().join("dist/docs/index.html"), "<html></html>").unwrap();
        fs::write(dir.path().join("dist/js/app bundle.js"), "").unwrap();
        fs::write(dir.path().join("secret.txt"), "").unwrap();
        dir
    }

    #[test]
    fn test_directory_index() {
        let dir = site();
        let root = dir.path().join("dist");

        let index = resolve_path("/", &root).unwrap();
        assert!(index.ends_with("dist/index.html"));

        let docs = resolve_path("/docs/?tab=1", &root).unwrap();
        assert!(docs.ends_with("docs/index.html"));
    }

    #[test]
    fn test_percent_decoding() {
        let dir = site();
        let root = dir.path().join("dist");
        let file = resolve_path("/js/app%20bundle.js", &root).unwrap();
        assert!(file.ends_with("js/app bundle.js"));
    }

    #[test]
    fn test_traversal_rejected() {
        let dir = site();
        let root = dir.path().join("dist");
        assert!(resolve_path("/../secret.txt", &root).is_none());
        assert!(resolve_path("/js/%2e%2e/%2e%2e/secret.txt", &root).is_none());
        assert!(resolve_path("/missing.js", &root).is_none());
    }

    #[test]
    fn test_wants_html() {
        assert!(wants_html("/"));
        assert!(wants_html("/docs/"));
        assert!(wants_html("/about"));
        assert!(wants_html("/index.html?x=1"));
        assert!(!wants_html("/js/app.bundle.js"));
        assert!(!wants_html("/css/app.bundle.css?v=2"));
    }
}
