//! Output emitter: replace the destination tree with the planned artifacts.

use std::fs;
use std::path::Path;

use rayon::prelude::*;

use super::{ArtifactBody, ArtifactKind, BuildPlan, OutputArtifact};
use crate::config::ProjectConfig;
use crate::core::{BuildError, BuildResult};
use crate::logger::ProgressLine;

/// Counter an artifact advances in the progress line.
pub fn progress_label(kind: ArtifactKind) -> &'static str {
    match kind {
        ArtifactKind::Script => "scripts",
        ArtifactKind::Style => "styles",
        ArtifactKind::Html => "pages",
        _ => "assets",
    }
}

/// Clear `config.build.output` and write every artifact of `plan`.
///
/// Writes are not rolled back when one fails.
pub fn emit(
    plan: &BuildPlan,
    config: &ProjectConfig,
    progress: Option<&ProgressLine>,
) -> BuildResult<()> {
    let output = &config.build.output;
    check_output_dir(output, config)?;
    clear_dir(output)?;

    plan.artifacts().par_iter().try_for_each(|artifact| {
        write_artifact(output, artifact)?;
        if let Some(progress) = progress {
            progress.inc(progress_label(artifact.kind));
        }
        Ok(())
    })
}

/// Refuse to clear a directory that holds project sources.
fn check_output_dir(output: &Path, config: &ProjectConfig) -> BuildResult<()> {
    let root = config.get_root();
    let build = &config.build;

    let unsafe_output = output.as_os_str().is_empty()
        || root.starts_with(output)
        || build.entry.starts_with(output)
        || build.deps.iter().any(|dep| dep.starts_with(output))
        || build.copy.iter().any(|c| c.from.starts_with(output))
        || (build.html.enable && build.html.template.starts_with(output))
        || config.config_path.starts_with(output);

    if unsafe_output {
        return Err(BuildError::UnsafeOutput(output.to_path_buf()));
    }
    Ok(())
}

fn clear_dir(dir: &Path) -> BuildResult<()> {
    if dir.exists() {
        fs::remove_dir_all(dir).map_err(BuildError::io(dir))?;
    }
    fs::create_dir_all(dir).map_err(BuildError::io(dir))
}

fn write_artifact(output: &Path, artifact: &OutputArtifact) -> BuildResult<()> {
    crate::debug!("emit"; "{}", artifact.url());
    let dest = output.join(&artifact.dest_path);
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).map_err(BuildError::io(parent))?;
    }

    match &artifact.body {
        ArtifactBody::Generated(bytes) => fs::write(&dest, bytes).map_err(BuildError::io(&dest)),
        ArtifactBody::Copied => fs::copy(&artifact.source_path, &dest)
            .map(|_| ())
            .map_err(BuildError::io(&artifact.source_path)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config_at;
    use crate::pipeline::plan_build;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &[u8]) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    /// Every file under `dir` with its bytes, sorted by relative path.
    fn snapshot(dir: &Path) -> Vec<(PathBuf, Vec<u8>)> {
        fn walk(dir: &Path, base: &Path, out: &mut Vec<(PathBuf, Vec<u8>)>) {
            for entry in fs::read_dir(dir).unwrap() {
                let path = entry.unwrap().path();
                if path.is_dir() {
                    walk(&path, base, out);
                } else {
                    let rel = path.strip_prefix(base).unwrap().to_path_buf();
                    out.push((rel, fs::read(&path).unwrap()));
                }
            }
        }
        let mut out = Vec::new();
        walk(dir, dir, &mut out);
        out.sort();
        out
    }

    fn build(config: &ProjectConfig) -> BuildResult<()> {
        let plan = plan_build(config)?;
        emit(&plan, config, None)
    }

    fn project(root: &Path) {
        write(root, "src/js/a.js", b"import '../scss/a.scss';\nconsole.log('a');\n");
        write(root, "src/js/b.js", b"console.log('b');\n");
        write(
            root,
            "src/scss/a.scss",
            b".a { background: url(\"data:image/svg+xml,%3csvg/%3e\"); }\n",
        );
        write(root, "src/images/logo.png", &[0x89, b'P', b'N', b'G', 0, 1, 2]);
        write(root, "src/js/notes.dat", &[0xff, 0x00, 0xfe]);
    }

    #[test]
    fn test_two_entries_emitted() {
        let dir = TempDir::new().unwrap();
        let config = test_config_at(dir.path());
        project(dir.path());

        build(&config).unwrap();
        let out = &config.build.output;
        assert!(out.join("js/a.bundle.js").is_file());
        assert!(out.join("js/b.bundle.js").is_file());
        assert!(out.join("css/a.bundle.css").is_file());
        assert!(out.join("images/logo.png").is_file());
        assert!(out.join("index.html").is_file());
        assert_eq!(fs::read_dir(out.join("icons")).unwrap().count(), 1);
    }

    #[test]
    fn test_rebuild_is_byte_identical() {
        let dir = TempDir::new().unwrap();
        let config = test_config_at(dir.path());
        project(dir.path());

        build(&config).unwrap();
        let first = snapshot(&config.build.output);
        build(&config).unwrap();
        assert_eq!(first, snapshot(&config.build.output));
    }

    #[test]
    fn test_passthrough_bytes_unchanged() {
        let dir = TempDir::new().unwrap();
        let config = test_config_at(dir.path());
        project(dir.path());

        build(&config).unwrap();
        assert_eq!(
            fs::read(config.build.output.join("notes.dat")).unwrap(),
            vec![0xff, 0x00, 0xfe]
        );
    }

    #[test]
    fn test_stale_files_removed() {
        let dir = TempDir::new().unwrap();
        let config = test_config_at(dir.path());
        project(dir.path());
        write(&config.build.output, "js/old.bundle.js", b"old");

        build(&config).unwrap();
        assert!(!config.build.output.join("js/old.bundle.js").exists());
    }

    #[test]
    fn test_missing_asset_fails_before_write() {
        let dir = TempDir::new().unwrap();
        let config = test_config_at(dir.path());
        project(dir.path());
        write(
            dir.path(),
            "src/scss/a.scss",
            b"@font-face { src: url(../fonts/missing.woff2); }\n",
        );
        write(&config.build.output, "keep.txt", b"previous build");

        let err = build(&config).unwrap_err();
        assert!(matches!(err, BuildError::MissingAsset { .. }));
        assert!(err.is_configuration());
        assert_eq!(
            fs::read(config.build.output.join("keep.txt")).unwrap(),
            b"previous build"
        );
        assert!(!config.build.output.join("js").exists());
    }

    #[test]
    fn test_refuses_unsafe_output() {
        let dir = TempDir::new().unwrap();
        let mut config = test_config_at(dir.path());
        project(dir.path());
        let plan = plan_build(&config).unwrap();

        config.build.output = config.get_root().to_path_buf();
        let err = emit(&plan, &config, None).unwrap_err();
        assert!(matches!(err, BuildError::UnsafeOutput(_)));
        assert!(dir.path().join("src/js/a.js").exists());

        config.build.output = config.get_root().join("src");
        assert!(matches!(
            emit(&plan, &config, None).unwrap_err(),
            BuildError::UnsafeOutput(_)
        ));
    }

    #[test]
    fn test_io_error_names_path() {
        let dir = TempDir::new().unwrap();
        let mut config = test_config_at(dir.path());
        project(dir.path());
        write(dir.path(), "blocker", b"a regular file");
        config.build.output = dir.path().join("blocker/dist");
        let plan = plan_build(&config).unwrap();

        let err = emit(&plan, &config, None).unwrap_err();
        match &err {
            BuildError::Io(path, _) => assert_eq!(path, &config.build.output),
            other => panic!("expected an IO error, got {other}"),
        }
        assert!(!err.is_configuration());
        assert_eq!(err.kind(), "io error");
        assert!(err.to_string().contains("blocker"));
    }

    #[test]
    fn test_progress_labels() {
        assert_eq!(progress_label(ArtifactKind::Script), "scripts");
        assert_eq!(progress_label(ArtifactKind::Icon), "assets");
        assert_eq!(progress_label(ArtifactKind::Html), "pages");
    }
}
