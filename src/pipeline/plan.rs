//! Build planning: everything a pass will write, computed in memory.
//!
//! ```text
//! entries ──par──▶ plan_entry ──┐
//! copy patterns ────────────────┼──▶ BuildPlan (sorted by dest, conflicts checked)
//! template + bundle links ──────┘
//! ```
//!
//! Nothing is written here, so every configuration problem (missing
//! reference, syntax error, clashing destinations) surfaces before the
//! output directory is touched.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use rayon::prelude::*;

use super::html::{PageLinks, plan_page};
use super::{ArtifactBody, ArtifactKind, OutputArtifact};
use crate::asset::{
    Classifier, Handler, StyleOptions, compile_script, compile_styles, scan_copy_patterns,
};
use crate::config::ProjectConfig;
use crate::core::{BuildError, BuildResult};
use crate::entry::{EntryPoint, discover_entries};

/// Artifacts of one build pass, ordered by destination.
#[derive(Debug, Default)]
pub struct BuildPlan {
    artifacts: Vec<OutputArtifact>,
    /// Source files read while planning
    inputs: BTreeSet<PathBuf>,
    entries: usize,
}

impl BuildPlan {
    pub fn artifacts(&self) -> &[OutputArtifact] {
        &self.artifacts
    }

    pub fn inputs(&self) -> &BTreeSet<PathBuf> {
        &self.inputs
    }

    pub fn entry_count(&self) -> usize {
        self.entries
    }

    pub fn count(&self, kind: ArtifactKind) -> usize {
        self.artifacts.iter().filter(|a| a.kind == kind).count()
    }

    #[cfg(test)]
    pub fn get(&self, dest: impl AsRef<Path>) -> Option<&OutputArtifact> {
        let dest = dest.as_ref();
        self.artifacts
            .binary_search_by(|a| a.dest_path.as_path().cmp(dest))
            .ok()
            .map(|idx| &self.artifacts[idx])
    }
}

#[derive(Debug, Clone, Copy)]
struct EntryOptions {
    minify: bool,
    style: StyleOptions,
}

/// What one entry contributes to the plan.
#[derive(Debug, Default)]
struct EntryOutput {
    artifacts: Vec<OutputArtifact>,
    inputs: Vec<PathBuf>,
    /// Bundle paths for the HTML page
    style: Option<String>,
    script: Option<String>,
}

pub fn plan_build(config: &ProjectConfig) -> BuildResult<BuildPlan> {
    let build = &config.build;
    let classifier = Classifier::new(&build.rules)?;
    let entries = discover_entries(&build.entry)?;
    crate::debug!("plan"; "{} entries in {}", entries.len(), config.root_relative(&build.entry).display());

    let options = EntryOptions {
        minify: build.minify,
        style: StyleOptions {
            minify: build.minify,
            prefix: build.css.prefix,
        },
    };

    // BTreeMap values are in name order, and collect() keeps that order
    let outputs = entries
        .values()
        .collect::<Vec<_>>()
        .into_par_iter()
        .map(|entry| plan_entry(entry, &classifier, options))
        .collect::<BuildResult<Vec<_>>>()?;

    let mut builder = PlanBuilder::default();
    let mut links = PageLinks::default();
    for output in outputs {
        builder.inputs.extend(output.inputs);
        links.styles.extend(output.style);
        links.scripts.extend(output.script);
        for artifact in output.artifacts {
            builder.add(artifact)?;
        }
    }

    for artifact in scan_copy_patterns(&build.copy)? {
        builder.inputs.insert(artifact.source_path.clone());
        builder.add(artifact)?;
    }

    if let Some(page) = plan_page(config, &links)? {
        if build.html.template.is_file() {
            builder.inputs.insert(build.html.template.clone());
        }
        builder.add(page)?;
    }

    Ok(builder.finish(entries.len()))
}

fn plan_entry(
    entry: &EntryPoint,
    classifier: &Classifier,
    options: EntryOptions,
) -> BuildResult<EntryOutput> {
    let mut output = EntryOutput {
        inputs: vec![entry.path.clone()],
        ..EntryOutput::default()
    };

    match classifier.classify(&entry.path) {
        Some(Handler::Script) => {
            let script = compile_script(&entry.path, classifier, options.minify)?;
            let dest = ArtifactKind::Script.dest_for(&format!("{}.bundle.js", entry.name));
            output.script = Some(crate::utils::path::to_url_path(&dest));
            output.artifacts.push(OutputArtifact::generated(
                &entry.path,
                dest,
                ArtifactKind::Script,
                script.code,
            ));

            if !script.style_imports.is_empty() {
                plan_style(&mut output, entry, &script.style_imports, classifier, options)?;
            }
        }
        Some(Handler::Style) => {
            plan_style(&mut output, entry, &[entry.path.clone()], classifier, options)?;
        }
        Some(Handler::Font) => output.artifacts.push(copy_entry(entry, ArtifactKind::Font)),
        Some(Handler::Image) => output.artifacts.push(copy_entry(entry, ArtifactKind::Image)),
        None => output
            .artifacts
            .push(copy_entry(entry, ArtifactKind::Passthrough)),
    }

    Ok(output)
}

fn copy_entry(entry: &EntryPoint, kind: ArtifactKind) -> OutputArtifact {
    OutputArtifact::copied(&entry.path, kind.dest_for(entry.file_name()), kind)
}

/// Compile `sources` into `css/<entry>.bundle.css`.
fn plan_style(
    output: &mut EntryOutput,
    entry: &EntryPoint,
    sources: &[PathBuf],
    classifier: &Classifier,
    options: EntryOptions,
) -> BuildResult<()> {
    let style = compile_styles(sources, classifier, options.style)?;
    let dest = ArtifactKind::Style.dest_for(&format!("{}.bundle.css", entry.name));

    output.style = Some(crate::utils::path::to_url_path(&dest));
    output.inputs.extend(style.inputs);
    output.inputs.extend(
        style
            .assets
            .iter()
            .filter(|a| a.body == ArtifactBody::Copied)
            .map(|a| a.source_path.clone()),
    );
    output.artifacts.push(OutputArtifact::generated(
        &entry.path,
        dest,
        ArtifactKind::Style,
        style.css,
    ));
    output.artifacts.extend(style.assets);
    Ok(())
}

#[derive(Default)]
struct PlanBuilder {
    artifacts: BTreeMap<PathBuf, OutputArtifact>,
    inputs: BTreeSet<PathBuf>,
}

impl PlanBuilder {
    /// Add an artifact; a second writer for the same destination must
    /// produce the same output.
    fn add(&mut self, artifact: OutputArtifact) -> BuildResult<()> {
        if let Some(existing) = self.artifacts.get(&artifact.dest_path) {
            if existing.same_output(&artifact) {
                return Ok(());
            }
            return Err(BuildError::OutputConflict {
                dest: artifact.dest_path,
                first: existing.source_path.clone(),
                second: artifact.source_path,
            });
        }
        self.artifacts.insert(artifact.dest_path.clone(), artifact);
        Ok(())
    }

    fn finish(self, entries: usize) -> BuildPlan {
        BuildPlan {
            artifacts: self.artifacts.into_values().collect(),
            inputs: self.inputs,
            entries,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CopyPattern, test_config_at};
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) -> PathBuf {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    fn dests(plan: &BuildPlan) -> Vec<String> {
        plan.artifacts()
            .iter()
            .map(|a| crate::utils::path::to_url_path(&a.dest_path))
            .collect()
    }

    fn generated(plan: &BuildPlan, dest: &str) -> String {
        match &plan.get(dest).unwrap().body {
            ArtifactBody::Generated(bytes) => String::from_utf8(bytes.clone()).unwrap(),
            ArtifactBody::Copied => panic!("{dest} is a copy"),
        }
    }

    #[test]
    fn test_two_scripts() {
        let dir = TempDir::new().unwrap();
        let config = test_config_at(dir.path());
        write(dir.path(), "src/js/a.js", "console.log('a');\n");
        write(dir.path(), "src/js/b.js", "console.log('b');\n");

        let plan = plan_build(&config).unwrap();
        assert_eq!(
            dests(&plan),
            vec!["index.html", "js/a.bundle.js", "js/b.bundle.js"]
        );
        assert_eq!(plan.entry_count(), 2);
        assert_eq!(plan.count(ArtifactKind::Script), 2);

        let page = generated(&plan, "index.html");
        let a = page.find("js/a.bundle.js").unwrap();
        let b = page.find("js/b.bundle.js").unwrap();
        assert!(a < b);
    }

    #[test]
    fn test_script_with_extracted_style() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        let config = test_config_at(root);
        write(root, "src/fonts/inter.woff2", "font");
        write(
            root,
            "src/scss/main.scss",
            "@font-face { font-family: Inter; src: url(../fonts/inter.woff2); }\n",
        );
        write(root, "src/js/app.js", "import '../scss/main.scss';\nrun();\n");

        let plan = plan_build(&config).unwrap();
        assert_eq!(
            dests(&plan),
            vec![
                "css/app.bundle.css",
                "fonts/inter.woff2",
                "index.html",
                "js/app.bundle.js",
            ]
        );
        assert_eq!(generated(&plan, "js/app.bundle.js"), "run();\n");
        assert!(generated(&plan, "css/app.bundle.css").contains("../fonts/inter.woff2"));

        let page = generated(&plan, "index.html");
        assert!(page.contains("href=\"css/app.bundle.css\""));
        assert!(plan.inputs().contains(&config.get_root().join("src/scss/main.scss")));
    }

    #[test]
    fn test_entry_handlers() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        let mut config = test_config_at(root);
        config.build.html.enable = false;
        write(root, "src/js/theme.css", ".a { color: red; }\n");
        write(root, "src/js/logo.png", "png");
        write(root, "src/js/icons.woff", "woff");
        write(root, "src/js/robots.txt", "User-agent: *\n");

        let plan = plan_build(&config).unwrap();
        assert_eq!(
            dests(&plan),
            vec![
                "css/theme.bundle.css",
                "fonts/icons.woff",
                "images/logo.png",
                "robots.txt",
            ]
        );
        assert_eq!(plan.get("robots.txt").unwrap().body, ArtifactBody::Copied);
        assert_eq!(
            plan.get("robots.txt").unwrap().kind,
            ArtifactKind::Passthrough
        );
    }

    #[test]
    fn test_copy_patterns_and_shared_assets() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        let mut config = test_config_at(root);
        config.build.html.enable = false;
        write(root, "src/images/logo.png", "png");
        write(root, "src/images/bg/paper.jpg", "jpg");
        write(
            root,
            "src/js/site.scss",
            ".logo { background: url(../images/logo.png); }\n",
        );

        // The stylesheet reference and the copy pattern agree on images/logo.png
        let plan = plan_build(&config).unwrap();
        assert_eq!(
            dests(&plan),
            vec!["css/site.bundle.css", "images/bg/paper.jpg", "images/logo.png"]
        );
    }

    #[test]
    fn test_output_conflict() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        let mut config = test_config_at(root);
        config.build.html.enable = false;
        write(root, "src/js/robots.txt", "a");
        write(root, "static/robots.txt", "b");
        config
            .build
            .copy
            .push(CopyPattern::new(root.join("static"), "."));

        let err = plan_build(&config).unwrap_err();
        assert!(matches!(err, BuildError::OutputConflict { ref dest, .. } if dest == Path::new("robots.txt")));
        assert!(err.is_configuration());
    }

    #[test]
    fn test_missing_entry_dir() {
        let dir = TempDir::new().unwrap();
        let config = test_config_at(dir.path());
        assert!(matches!(
            plan_build(&config).unwrap_err(),
            BuildError::NotFound(_)
        ));
    }

    #[test]
    fn test_syntax_error_is_reported() {
        let dir = TempDir::new().unwrap();
        let config = test_config_at(dir.path());
        write(dir.path(), "src/js/ok.js", "ok();\n");
        write(dir.path(), "src/js/broken.js", "function (\n");

        let err = plan_build(&config).unwrap_err();
        assert!(matches!(err, BuildError::ScriptSyntax { .. }));
    }
}
