//! Copy patterns: directories mirrored verbatim into the output.
//!
//! ```text
//! [[build.copy]] from = "src/images", to = "images"
//!
//! src/images/logo.png        -> images/logo.png
//! src/images/icons/menu.svg  -> images/icons/menu.svg
//! ```

use std::fs;
use std::path::Path;

use crate::config::CopyPattern;
use crate::core::{BuildError, BuildResult};
use crate::pipeline::{ArtifactKind, OutputArtifact};
use crate::utils::path::clean;

/// Expand every pattern into copy artifacts, in a stable order.
///
/// A missing `from` is skipped unless the pattern is `required`.
pub fn scan_copy_patterns(patterns: &[CopyPattern]) -> BuildResult<Vec<OutputArtifact>> {
    let mut results = Vec::new();

    for pattern in patterns {
        let from = &pattern.from;
        if !from.exists() {
            if pattern.required {
                return Err(BuildError::NotFound(from.clone()));
            }
            crate::debug!("copy"; "{} not found, skipping", from.display());
            continue;
        }

        if from.is_file() {
            let dest = clean(&pattern.to.join(crate::utils::path::file_name(from)));
            results.push(OutputArtifact::copied(from, dest, ArtifactKind::Passthrough));
        } else {
            scan_recursive(&mut results, from, from, &pattern.to)?;
        }
    }

    Ok(results)
}

fn scan_recursive(
    results: &mut Vec<OutputArtifact>,
    dir: &Path,
    base: &Path,
    to: &Path,
) -> BuildResult<()> {
    let mut paths = fs::read_dir(dir)
        .map_err(BuildError::io(dir))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(BuildError::io(dir))?;
    paths.sort();

    for path in paths {
        if path.is_dir() {
            scan_recursive(results, &path, base, to)?;
        } else {
            let rel = path.strip_prefix(base).unwrap_or(&path);
            let dest = clean(&to.join(rel));
            results.push(OutputArtifact::copied(path.clone(), dest, ArtifactKind::Passthrough));
        }
    }
    Ok(())
}
