//! Build errors.
//!
//! Two kinds matter to callers:
//! - configuration errors (bad input, missing sources) abort before any write
//! - IO errors abort the current pass; serve mode retries on the next change

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("directory `{0}` not found")]
    NotFound(PathBuf),

    #[error("entry name `{name}` is used by both `{first}` and `{second}`")]
    DuplicateEntry {
        name: String,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("invalid asset rule `{pattern}`")]
    InvalidRule {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("`{reference}` referenced from `{from}` not found (looked for `{resolved}`)")]
    MissingAsset {
        reference: String,
        from: PathBuf,
        resolved: PathBuf,
    },

    #[error("syntax error in `{path}`: {message}")]
    ScriptSyntax { path: PathBuf, message: String },

    #[error("`{dest}` would be written by both `{first}` and `{second}`")]
    OutputConflict {
        dest: PathBuf,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("refusing to clear `{0}`: it contains project sources")]
    UnsafeOutput(PathBuf),

    #[error("IO error on `{0}`")]
    Io(PathBuf, #[source] std::io::Error),
}

impl BuildError {
    /// Configuration errors are detected before anything is written.
    pub fn is_configuration(&self) -> bool {
        !matches!(self, Self::Io(..))
    }

    /// Short label for status lines.
    pub fn kind(&self) -> &'static str {
        if self.is_configuration() {
            "configuration error"
        } else {
            "io error"
        }
    }

    pub fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |err| Self::Io(path, err)
    }
}

pub type BuildResult<T> = Result<T, BuildError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error, ErrorKind};

    #[test]
    fn test_error_kinds() {
        let missing = BuildError::NotFound(PathBuf::from("src/js"));
        assert!(missing.is_configuration());
        assert_eq!(missing.kind(), "configuration error");

        let io = BuildError::Io(
            PathBuf::from("dist/js/a.bundle.js"),
            Error::new(ErrorKind::PermissionDenied, "denied"),
        );
        assert!(!io.is_configuration());
        assert_eq!(io.kind(), "io error");
    }

    #[test]
    fn test_io_helper_keeps_path() {
        let err = BuildError::io("dist/index.html")(Error::other("disk full"));
        assert!(err.to_string().contains("dist/index.html"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_missing_asset_display() {
        let err = BuildError::MissingAsset {
            reference: "../fonts/inter.woff2".into(),
            from: PathBuf::from("src/scss/main.scss"),
            resolved: PathBuf::from("src/fonts/inter.woff2"),
        };
        let text = err.to_string();
        assert!(text.contains("../fonts/inter.woff2"));
        assert!(text.contains("main.scss"));
    }
}
