//! Config field path used to label diagnostics.

use owo_colors::OwoColorize;
use std::fmt;

/// Dotted path of a config field, e.g. `build.html.template`.
///
/// Indexed entries keep the array index inline: `build.rules[2].pattern`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath(String);

impl FieldPath {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// `build.rules` + 2 + `pattern` -> `build.rules[2].pattern`
    pub fn indexed(section: &str, idx: usize, field: &str) -> Self {
        Self(format!("{section}[{idx}].{field}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", format_args!("`{}`", self.0).bright_blue())
    }
}
