//! Stylesheet compilation.
//!
//! ```text
//! main.scss ──@import──▶ _vars.scss, base.css     (inlined, each file once)
//!     │
//!     ├── url(../fonts/inter.woff2)  -> url("../fonts/inter.woff2")  + copy
//!     ├── url(img/logo.png?v=2)      -> url("../images/logo.png?v=2") + copy
//!     ├── url("data:image/svg+xml,…") -> url("../icons/<hash>.svg")   + write
//!     └── url(https://…)             -> unchanged
//!     │
//!     ▼
//! lightningcss (vendor prefixes, minify)  -> css/<name>.bundle.css
//! ```
//!
//! Sass features beyond `@import` are not evaluated. Text lightningcss
//! cannot parse is emitted as-is.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use lightningcss::targets::{Browsers, Targets};
use percent_encoding::percent_decode_str;
use regex::{Captures, Regex};
use rustc_hash::FxHashSet;

use super::Classifier;
use crate::core::{BuildError, BuildResult};
use crate::pipeline::{ArtifactKind, OutputArtifact};
use crate::utils::{hash, path::file_name};

static RE_IMPORT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"@import\s+([^;]+);").unwrap());

static RE_IMPORT_ITEM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"url\(\s*["']?([^"')\s]+)["']?\s*\)|"([^"]+)"|'([^']+)'"#).unwrap()
});

static RE_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"url\(\s*(?:"([^"]*)"|'([^']*)'|([^)"'\s]*))\s*\)"#).unwrap()
});

static RE_SCHEME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*:").unwrap());

#[derive(Debug, Clone, Copy, Default)]
pub struct StyleOptions {
    pub minify: bool,
    /// Add vendor prefixes for the supported browser range
    pub prefix: bool,
}

#[derive(Debug, Default)]
pub struct CompiledStyle {
    pub css: String,
    /// Copied `url()` targets and extracted icons
    pub assets: Vec<OutputArtifact>,
    /// Every stylesheet read, in inlining order
    pub inputs: Vec<PathBuf>,
}

/// Compile `sources` in order into a single stylesheet.
///
/// A file reached twice through `@import` (or listed twice) is inlined once.
pub fn compile_styles(
    sources: &[PathBuf],
    classifier: &Classifier,
    options: StyleOptions,
) -> BuildResult<CompiledStyle> {
    let mut compiler = StyleCompiler {
        classifier,
        visited: FxHashSet::default(),
        hoisted: Vec::new(),
        out: CompiledStyle::default(),
    };

    let mut body = String::new();
    for source in sources {
        compiler.inline_file(source, &mut body)?;
    }

    let mut css = compiler.hoisted.join("\n");
    if !css.is_empty() {
        css.push('\n');
    }
    css.push_str(&body);

    let filename = sources.first().map(|p| file_name(p)).unwrap_or_default();
    compiler.out.css = finish(css, filename, options);
    Ok(compiler.out)
}

struct StyleCompiler<'a> {
    classifier: &'a Classifier,
    visited: FxHashSet<PathBuf>,
    /// Remote `@import`s, kept at the top of the bundle
    hoisted: Vec<String>,
    out: CompiledStyle,
}

impl StyleCompiler<'_> {
    fn inline_file(&mut self, path: &Path, body: &mut String) -> BuildResult<()> {
        if !self.visited.insert(path.to_path_buf()) {
            return Ok(());
        }
        self.out.inputs.push(path.to_path_buf());

        let raw = fs::read_to_string(path).map_err(BuildError::io(path))?;
        let is_scss = path.extension().is_some_and(|ext| ext == "scss");
        let source = strip_comments(&raw, is_scss);
        let base = path.parent().unwrap_or(Path::new(""));

        let mut last = 0;
        for caps in RE_IMPORT.captures_iter(&source) {
            let Some(whole) = caps.get(0) else { continue };
            body.push_str(&self.rewrite_urls(&source[last..whole.start()], path)?);
            last = whole.end();

            let (items, media) = split_import(caps.get(1).map_or("", |m| m.as_str()));
            for spec in items {
                if is_external(spec) {
                    self.hoisted.push(match media {
                        Some(media) => format!("@import url(\"{spec}\") {media};"),
                        None => format!("@import url(\"{spec}\");"),
                    });
                    continue;
                }
                let resolved = resolve_import(base, spec).ok_or_else(|| {
                    BuildError::MissingAsset {
                        reference: spec.to_string(),
                        from: path.to_path_buf(),
                        resolved: base.join(spec),
                    }
                })?;
                match media {
                    Some(media) => {
                        body.push_str(&format!("@media {media} {{\n"));
                        self.inline_file(&resolved, body)?;
                        body.push_str("}\n");
                    }
                    None => self.inline_file(&resolved, body)?,
                }
            }
        }
        body.push_str(&self.rewrite_urls(&source[last..], path)?);
        if !body.ends_with('\n') {
            body.push('\n');
        }
        Ok(())
    }

    fn rewrite_urls(&mut self, text: &str, from: &Path) -> BuildResult<String> {
        let mut result = String::with_capacity(text.len());
        let mut last = 0;

        for caps in RE_URL.captures_iter(text) {
            let Some(whole) = caps.get(0) else { continue };
            result.push_str(&text[last..whole.start()]);
            last = whole.end();

            let reference = first_group(&caps).unwrap_or_default();
            match self.rewrite_reference(reference, from)? {
                Some(url) => {
                    result.push_str("url(\"");
                    result.push_str(&url);
                    result.push_str("\")");
                }
                None => result.push_str(whole.as_str()),
            }
        }
        result.push_str(&text[last..]);
        Ok(result)
    }

    /// New URL for `reference`, `None` to leave it untouched.
    fn rewrite_reference(&mut self, reference: &str, from: &Path) -> BuildResult<Option<String>> {
        if let Some(data) = reference.strip_prefix("data:") {
            return Ok(self.extract_svg(data, from));
        }
        if reference.is_empty() || reference.starts_with('#') || is_external(reference) {
            return Ok(None);
        }

        let split = reference.find(['?', '#']).unwrap_or(reference.len());
        let (file, suffix) = reference.split_at(split);
        let decoded = percent_decode_str(file).decode_utf8_lossy();
        let base = from.parent().unwrap_or(Path::new(""));
        let resolved = crate::utils::path::clean(&base.join(decoded.as_ref()));

        if !resolved.is_file() {
            return Err(BuildError::MissingAsset {
                reference: reference.to_string(),
                from: from.to_path_buf(),
                resolved,
            });
        }

        let kind = ArtifactKind::for_reference(self.classifier.classify(&resolved));
        let dest = kind.dest_for(file_name(&resolved));
        let url = format!("../{}{suffix}", crate::utils::path::to_url_path(&dest));
        self.push_asset(OutputArtifact::copied(resolved, dest, kind));
        Ok(Some(url))
    }

    /// Move an inline `image/svg+xml` payload to `icons/<hash>.svg`.
    fn extract_svg(&mut self, data: &str, from: &Path) -> Option<String> {
        let (header, payload) = data.split_once(',')?;
        if !header.starts_with("image/svg+xml") || header.contains(";base64") {
            return None;
        }

        let svg: Vec<u8> = percent_decode_str(payload).collect();
        let dest = ArtifactKind::Icon.dest_for(&format!("{}.svg", hash::content_name(&svg)));
        let url = format!("../{}", crate::utils::path::to_url_path(&dest));
        self.push_asset(OutputArtifact::generated(from, dest, ArtifactKind::Icon, svg));
        Some(url)
    }

    fn push_asset(&mut self, artifact: OutputArtifact) {
        let known = self.out.assets.iter().any(|a| a.same_output(&artifact));
        if !known {
            self.out.assets.push(artifact);
        }
    }
}

/// Split an `@import` prelude into its targets and trailing media list.
///
/// `'print.css' print` -> (["print.css"], Some("print"))
fn split_import(prelude: &str) -> (Vec<&str>, Option<&str>) {
    let mut items = Vec::new();
    let mut end = 0;
    for caps in RE_IMPORT_ITEM.captures_iter(prelude) {
        if let Some(spec) = first_group(&caps) {
            items.push(spec);
        }
        if let Some(whole) = caps.get(0) {
            end = whole.end();
        }
    }
    let media = prelude[end..].trim_start_matches([',', ' ', '\t', '\n', '\r']).trim();
    (items, (!media.is_empty()).then_some(media))
}

/// Remove comments, leaving strings and `url(...)` arguments alone.
///
/// `//` line comments are Sass syntax and only removed when `line_comments`
/// is set. A `//` right after `:` is a protocol, not a comment.
fn strip_comments(source: &str, line_comments: bool) -> String {
    let bytes = source.as_bytes();
    let mut out = String::with_capacity(source.len());
    let mut copied = 0;
    let mut quote = None;
    let mut in_url = false;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        if let Some(q) = quote {
            match b {
                b'\\' => i += 1,
                _ if b == q => quote = None,
                _ => {}
            }
            i += 1;
            continue;
        }

        match b {
            b'"' | b'\'' => quote = Some(b),
            b'(' => in_url = i >= 3 && bytes[i - 3..i].eq_ignore_ascii_case(b"url"),
            b')' => in_url = false,
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                out.push_str(&source[copied..i]);
                let end = source[i + 2..]
                    .find("*/")
                    .map_or(bytes.len(), |at| i + 2 + at + 2);
                copied = end;
                i = end;
                continue;
            }
            b'/' if line_comments
                && !in_url
                && bytes.get(i + 1) == Some(&b'/')
                && (i == 0 || bytes[i - 1] != b':') =>
            {
                out.push_str(&source[copied..i]);
                let end = source[i..].find('\n').map_or(bytes.len(), |at| i + at);
                copied = end;
                i = end;
                continue;
            }
            _ => {}
        }
        i += 1;
    }
    out.push_str(&source[copied..]);
    out
}

fn first_group<'t>(caps: &Captures<'t>) -> Option<&'t str> {
    caps.iter().skip(1).flatten().next().map(|m| m.as_str())
}

/// Remote, protocol-relative or root-relative references.
fn is_external(reference: &str) -> bool {
    reference.starts_with('/') || RE_SCHEME.is_match(reference)
}

/// Locate an `@import` target the way Sass does: exact path, then with
/// `.scss`/`.css`, then the `_partial` form of each.
fn resolve_import(base: &Path, spec: &str) -> Option<PathBuf> {
    let target = base.join(spec);
    let name = file_name(&target).to_string();
    let dir = target.parent().unwrap_or(base).to_path_buf();

    let mut names = vec![name.clone()];
    if Path::new(&name).extension().is_none() {
        names.push(format!("{name}.scss"));
        names.push(format!("{name}.css"));
    }
    let partials: Vec<String> = names.iter().map(|n| format!("_{n}")).collect();
    names.extend(partials);

    names
        .into_iter()
        .map(|n| crate::utils::path::clean(&dir.join(n)))
        .find(|candidate| candidate.is_file())
}

fn targets(prefix: bool) -> Targets {
    if !prefix {
        return Targets::default();
    }
    // (major << 16) | (minor << 8) | patch
    let version = |major: u32| Some(major << 16);
    Targets::from(Browsers {
        chrome: version(95),
        edge: version(95),
        firefox: version(91),
        safari: version(13),
        ios_saf: version(13),
        ..Browsers::default()
    })
}

/// Run lightningcss over the bundled text when prefixing or minifying.
fn finish(css: String, filename: &str, options: StyleOptions) -> String {
    if !options.prefix && !options.minify {
        return css;
    }
    process(&css, filename, options).unwrap_or(css)
}

/// `None` when lightningcss cannot handle the text.
fn process(css: &str, filename: &str, options: StyleOptions) -> Option<String> {
    let parser_options = ParserOptions {
        filename: filename.to_string(),
        ..ParserOptions::default()
    };
    let mut sheet = match StyleSheet::parse(css, parser_options) {
        Ok(sheet) => sheet,
        Err(e) => {
            crate::debug!("style"; "{filename}: emitting unprocessed css ({e})");
            return None;
        }
    };

    let minify_options = MinifyOptions {
        targets: targets(options.prefix),
        ..MinifyOptions::default()
    };
    if let Err(e) = sheet.minify(minify_options) {
        crate::debug!("style"; "{filename}: emitting unprocessed css ({e})");
        return None;
    }

    let printer_options = PrinterOptions {
        minify: options.minify,
        targets: targets(options.prefix),
        ..PrinterOptions::default()
    };
    match sheet.to_css(printer_options) {
        Ok(result) => Some(result.code),
        Err(e) => {
            crate::debug!("style"; "{filename}: emitting unprocessed css ({e})");
            None
        }
    }
}
