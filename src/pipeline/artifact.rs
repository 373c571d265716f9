//! Output artifacts: one planned file under the output directory.

use std::path::{Path, PathBuf};

use crate::asset::Handler;

/// Output subdirectory family of an artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    Script,
    Style,
    Font,
    Image,
    /// SVG extracted from a `data:` URI in a stylesheet.
    Icon,
    Html,
    Passthrough,
}

impl ArtifactKind {
    /// Directory under the output root, empty for the root itself.
    pub const fn dir(self) -> &'static str {
        match self {
            Self::Script => "js",
            Self::Style => "css",
            Self::Font => "fonts",
            Self::Image => "images",
            Self::Icon => "icons",
            Self::Html | Self::Passthrough => "",
        }
    }

    /// Kind of a file copied because a stylesheet references it.
    ///
    /// Only fonts and images get a dedicated directory, anything else
    /// lands at the output root.
    pub const fn for_reference(handler: Option<Handler>) -> Self {
        match handler {
            Some(Handler::Font) => Self::Font,
            Some(Handler::Image) => Self::Image,
            _ => Self::Passthrough,
        }
    }

    /// Destination of `file_name` inside this kind's directory.
    pub fn dest_for(self, file_name: &str) -> PathBuf {
        match self.dir() {
            "" => PathBuf::from(file_name),
            dir => Path::new(dir).join(file_name),
        }
    }
}

/// Contents of an artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactBody {
    /// Bytes produced by the build
    Generated(Vec<u8>),
    /// Verbatim copy of `source_path`
    Copied,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputArtifact {
    /// File the artifact was derived from
    pub source_path: PathBuf,
    /// Path relative to the output directory
    pub dest_path: PathBuf,
    pub kind: ArtifactKind,
    pub body: ArtifactBody,
}

impl OutputArtifact {
    pub fn generated(
        source_path: impl Into<PathBuf>,
        dest_path: impl Into<PathBuf>,
        kind: ArtifactKind,
        bytes: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            source_path: source_path.into(),
            dest_path: dest_path.into(),
            kind,
            body: ArtifactBody::Generated(bytes.into()),
        }
    }

    pub fn copied(
        source_path: impl Into<PathBuf>,
        dest_path: impl Into<PathBuf>,
        kind: ArtifactKind,
    ) -> Self {
        Self {
            source_path: source_path.into(),
            dest_path: dest_path.into(),
            kind,
            body: ArtifactBody::Copied,
        }
    }

    /// Two artifacts for the same destination are interchangeable when
    /// they would write the same bytes.
    pub fn same_output(&self, other: &Self) -> bool {
        if self.dest_path != other.dest_path {
            return false;
        }
        match (&self.body, &other.body) {
            (ArtifactBody::Generated(a), ArtifactBody::Generated(b)) => a == b,
            (ArtifactBody::Copied, ArtifactBody::Copied) => self.source_path == other.source_path,
            _ => false,
        }
    }

    /// URL path of the artifact, e.g. `/css/app.bundle.css`.
    pub fn url(&self) -> String {
        format!("/{}", crate::utils::path::to_url_path(&self.dest_path))
    }
}
