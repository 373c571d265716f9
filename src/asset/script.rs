//! Script entries.
//!
//! A script is parsed with oxc to validate its syntax and to find
//! side-effect style imports (`import './main.scss';`). Those imports are
//! removed from the emitted code; the importing entry owns the resulting
//! stylesheet instead. Everything else is emitted as written, optionally
//! minified.

use std::fs;
use std::path::{Path, PathBuf};

use oxc::allocator::Allocator;
use oxc::ast::ast::Statement;
use oxc::codegen::{Codegen, CodegenOptions, CommentOptions};
use oxc::mangler::MangleOptions;
use oxc::minifier::{CompressOptions, Minifier, MinifierOptions};
use oxc::parser::Parser;
use oxc::span::SourceType;

use super::{Classifier, Handler};
use crate::core::{BuildError, BuildResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledScript {
    pub code: String,
    /// Stylesheets imported for their side effect, in source order
    pub style_imports: Vec<PathBuf>,
}

/// A side-effect import to cut out of the source.
struct StyleImport {
    start: usize,
    end: usize,
    specifier: String,
}

pub fn compile_script(
    path: &Path,
    classifier: &Classifier,
    minify: bool,
) -> BuildResult<CompiledScript> {
    let source = fs::read_to_string(path).map_err(BuildError::io(path))?;
    let source_type = SourceType::from_path(path).unwrap_or_else(|_| SourceType::mjs());
    let base = path.parent().unwrap_or(Path::new(""));

    let candidates = scan_imports(path, &source, source_type)?;

    let mut style_imports = Vec::new();
    let mut removed = Vec::new();
    for import in candidates {
        let resolved = crate::utils::path::clean(&base.join(&import.specifier));
        if classifier.classify(&resolved) != Some(Handler::Style) {
            continue;
        }
        if !resolved.is_file() {
            return Err(BuildError::MissingAsset {
                reference: import.specifier,
                from: path.to_path_buf(),
                resolved,
            });
        }
        if !style_imports.contains(&resolved) {
            style_imports.push(resolved);
        }
        removed.push((import.start, import.end));
    }

    let stripped = strip_ranges(&source, &removed);
    let code = if minify {
        minify_js(&stripped, source_type).unwrap_or(stripped)
    } else {
        stripped
    };

    Ok(CompiledScript {
        code,
        style_imports,
    })
}

/// Relative side-effect imports of `source`, in source order.
fn scan_imports(
    path: &Path,
    source: &str,
    source_type: SourceType,
) -> BuildResult<Vec<StyleImport>> {
    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, source, source_type).parse();

    if let Some(error) = ret.errors.first() {
        return Err(BuildError::ScriptSyntax {
            path: path.to_path_buf(),
            message: error.to_string(),
        });
    }
    if ret.panicked {
        return Err(BuildError::ScriptSyntax {
            path: path.to_path_buf(),
            message: "parser aborted".into(),
        });
    }

    let imports = ret
        .program
        .body
        .iter()
        .filter_map(|stmt| match stmt {
            Statement::ImportDeclaration(decl) if decl.specifiers.is_none() => {
                let specifier = decl.source.value.as_str();
                is_relative(specifier).then(|| StyleImport {
                    start: decl.span.start as usize,
                    end: decl.span.end as usize,
                    specifier: specifier.to_string(),
                })
            }
            _ => None,
        })
        .collect();
    Ok(imports)
}

fn is_relative(specifier: &str) -> bool {
    specifier.starts_with("./") || specifier.starts_with("../")
}

/// Remove byte ranges (sorted, non-overlapping) along with one trailing
/// newline each.
fn strip_ranges(source: &str, ranges: &[(usize, usize)]) -> String {
    let mut out = String::with_capacity(source.len());
    let mut last = 0;
    for &(start, end) in ranges {
        out.push_str(&source[last..start]);
        last = if source[end..].starts_with('\n') {
            end + 1
        } else {
            end
        };
    }
    out.push_str(&source[last..]);
    out
}

/// Minify JavaScript source code.
fn minify_js(source: &str, source_type: SourceType) -> Option<String> {
    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, source, source_type).parse();
    if !ret.errors.is_empty() {
        return None;
    }
    let mut program = ret.program;
    let options = MinifierOptions {
        mangle: Some(MangleOptions::default()),
        compress: Some(CompressOptions::smallest()),
    };
    let ret = Minifier::new(options).minify(&allocator, &mut program);
    let code = Codegen::new()
        .with_options(CodegenOptions {
            minify: true,
            comments: CommentOptions::disabled(),
            ..CodegenOptions::default()
        })
        .with_scoping(ret.scoping)
        .build(&program)
        .code;
    Some(code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) -> PathBuf {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    fn compile(path: &Path, minify: bool) -> BuildResult<CompiledScript> {
        compile_script(path, &Classifier::default(), minify)
    }

    #[test]
    fn test_style_imports_extracted() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(root, "scss/main.scss", ".a {}");
        write(root, "css/vendor.css", ".b {}");
        let entry = write(
            root,
            "js/app.js",
            concat!(
                "import '../scss/main.scss';\n",
                "import \"../css/vendor.css\";\n",
                "import '../scss/main.scss';\n",
                "console.log('app');\n",
            ),
        );

        let out = compile(&entry, false).unwrap();
        assert_eq!(out.code, "console.log('app');\n");
        assert_eq!(
            out.style_imports,
            vec![root.join("scss/main.scss"), root.join("css/vendor.css")]
        );
    }

    #[test]
    fn test_other_imports_kept() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(root, "js/polyfill.js", "");
        write(root, "js/theme.css", "");
        let source = concat!(
            "import './polyfill.js';\n",
            "import theme from './theme.css';\n",
            "import 'bootstrap/dist/css/bootstrap.css';\n",
            "export const x = theme;\n",
        );
        let entry = write(root, "js/app.js", source);

        let out = compile(&entry, false).unwrap();
        assert_eq!(out.code, source);
        assert!(out.style_imports.is_empty());
    }

    #[test]
    fn test_missing_style_import() {
        let dir = TempDir::new().unwrap();
        let entry = write(dir.path(), "js/app.js", "import '../scss/gone.scss';\n");

        match compile(&entry, false).unwrap_err() {
            BuildError::MissingAsset {
                reference, from, ..
            } => {
                assert_eq!(reference, "../scss/gone.scss");
                assert_eq!(from, entry);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_syntax_error() {
        let dir = TempDir::new().unwrap();
        let entry = write(dir.path(), "app.js", "const = ;\n");

        let err = compile(&entry, false).unwrap_err();
        assert!(matches!(err, BuildError::ScriptSyntax { .. }));
        assert!(err.is_configuration());
    }

    #[test]
    fn test_minify() {
        let dir = TempDir::new().unwrap();
        let source = concat!(
            "// greeting helper\n",
            "function greet(personName) {\n",
            "    return 'hello ' + personName;\n",
            "}\n",
            "console.log(greet(document.title));\n",
        );
        let entry = write(dir.path(), "app.js", source);

        let out = compile(&entry, true).unwrap();
        assert!(out.code.len() < source.len());
        assert!(out.code.contains("console.log"));
        assert!(!out.code.contains("greeting helper"));
    }

    #[test]
    fn test_strip_ranges() {
        let source = "a;\nb;\nc;";
        assert_eq!(strip_ranges(source, &[(3, 5)]), "a;\nc;");
        assert_eq!(strip_ranges(source, &[(0, 2), (6, 8)]), "b;\n");
        assert_eq!(strip_ranges(source, &[]), source);
    }
}
