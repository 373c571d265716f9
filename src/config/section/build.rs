//! `[build]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [build]
//! entry = "src/js"            # every file here becomes one bundle
//! output = "dist"             # cleared and rewritten on each build
//! minify = false
//! deps = ["src/scss"]         # extra directories watched by `sprig serve`
//!
//! [build.html]
//! template = "src/index.html"
//! filename = "index.html"
//!
//! [build.css]
//! prefix = true               # vendor prefixes for the default browser set
//!
//! [[build.copy]]
//! from = "src/images"
//! to = "images"
//!
//! [[build.rules]]
//! pattern = '\.(woff2?|ttf|eot)$'
//! handler = "font"
//! ```

use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::asset::Handler;
use crate::config::{ConfigDiagnostics, FieldPath};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Directory scanned (non-recursively) for entry points.
    pub entry: PathBuf,

    /// Destination root.
    pub output: PathBuf,

    /// Minify script and style bundles.
    pub minify: bool,

    /// Extra directories watched in serve mode.
    pub deps: Vec<PathBuf>,

    pub html: HtmlConfig,

    pub css: CssConfig,

    /// Directories copied verbatim into the output tree.
    pub copy: Vec<CopyPattern>,

    /// Ordered classification rules; the first match wins.
    pub rules: Vec<RuleConfig>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            entry: "src/js".into(),
            output: "dist".into(),
            minify: false,
            deps: Vec::new(),
            html: HtmlConfig::default(),
            css: CssConfig::default(),
            copy: vec![
                CopyPattern::new("src/images", "images"),
                CopyPattern::new("src/fonts", "fonts"),
            ],
            rules: RuleConfig::defaults(),
        }
    }
}

/// `[build.html]`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HtmlConfig {
    pub enable: bool,
    /// Template file; a built-in page is used when it does not exist.
    pub template: PathBuf,
    /// Output file name, relative to the output root.
    pub filename: PathBuf,
}

impl Default for HtmlConfig {
    fn default() -> Self {
        Self {
            enable: true,
            template: "src/index.html".into(),
            filename: "index.html".into(),
        }
    }
}

/// `[build.css]`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CssConfig {
    pub prefix: bool,
}

impl Default for CssConfig {
    fn default() -> Self {
        Self { prefix: true }
    }
}

/// `[[build.copy]]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CopyPattern {
    pub from: PathBuf,
    pub to: PathBuf,
    /// Fail the build when `from` does not exist.
    #[serde(default)]
    pub required: bool,
}

impl CopyPattern {
    pub fn new(from: impl Into<PathBuf>, to: impl Into<PathBuf>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            required: false,
        }
    }
}

/// `[[build.rules]]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleConfig {
    /// Regular expression matched against the file name.
    pub pattern: String,
    pub handler: Handler,
}

impl RuleConfig {
    pub fn new(pattern: &str, handler: Handler) -> Self {
        Self {
            pattern: pattern.to_string(),
            handler,
        }
    }

    pub fn defaults() -> Vec<Self> {
        vec![
            Self::new(r"\.(woff2?|ttf|eot|otf)$", Handler::Font),
            Self::new(r"\.s?css$", Handler::Style),
            Self::new(r"\.(png|jpe?g|gif|webp|avif|svg|ico)$", Handler::Image),
            Self::new(r"\.[mc]?js$", Handler::Script),
        ]
    }
}

impl BuildConfig {
    /// Resolve every path against the project root.
    pub fn normalize(&mut self, root: &Path) {
        use crate::utils::path::normalize_path;

        self.entry = normalize_path(&root.join(&self.entry));
        self.output = normalize_path(&root.join(&self.output));
        self.html.template = normalize_path(&root.join(&self.html.template));
        self.deps = self
            .deps
            .iter()
            .map(|p| normalize_path(&root.join(p)))
            .collect();
        for pattern in &mut self.copy {
            pattern.from = normalize_path(&root.join(&pattern.from));
        }
    }

    /// Checks that need the raw (relative) values, before `normalize`.
    pub fn validate_raw(&self, diag: &mut ConfigDiagnostics) {
        if !is_plain_relative(&self.html.filename) {
            diag.error(
                FieldPath::new("build.html.filename"),
                format!(
                    "'{}' must be a relative path inside the output directory",
                    self.html.filename.display()
                ),
            );
        }

        for (idx, pattern) in self.copy.iter().enumerate() {
            if !is_plain_relative(&pattern.to) {
                diag.error(
                    FieldPath::indexed("build.copy", idx, "to"),
                    format!(
                        "'{}' must be a relative path inside the output directory",
                        pattern.to.display()
                    ),
                );
            }
        }

        for (idx, rule) in self.rules.iter().enumerate() {
            if let Err(e) = regex::Regex::new(&rule.pattern) {
                diag.error_with_hint(
                    FieldPath::indexed("build.rules", idx, "pattern"),
                    format!("invalid pattern '{}': {e}", rule.pattern),
                    "patterns are regular expressions, e.g. '\\.(woff2?|ttf)$'",
                );
            }
        }
    }

    /// Checks on normalized (absolute) paths.
    pub fn validate(&self, root: &Path, diag: &mut ConfigDiagnostics) {
        if self.output == root || root.starts_with(&self.output) {
            diag.error(
                FieldPath::new("build.output"),
                "output directory must not be the project root or one of its parents",
            );
        }
        if self.entry.starts_with(&self.output) {
            diag.error_with_hint(
                FieldPath::new("build.output"),
                "entry directory lies inside the output directory",
                "the output directory is cleared on every build",
            );
        }

        for dep in &self.deps {
            if !dep.exists() {
                diag.warn(
                    FieldPath::new("build.deps"),
                    format!("directory '{}' not found, not watching it", dep.display()),
                );
            }
        }
    }
}

/// Relative, non-empty, and free of `..` / root components.
fn is_plain_relative(path: &Path) -> bool {
    !path.as_os_str().is_empty()
        && path
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}
