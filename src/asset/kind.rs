//! Handler kinds an asset rule can route a file to.

use serde::{Deserialize, Serialize};

/// What to do with a classified file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Handler {
    /// Script entry: `js/<name>.bundle.js`, style imports extracted.
    Script,
    /// Stylesheet: compiled into `css/<name>.bundle.css`.
    Style,
    /// Font file, copied to `fonts/`.
    Font,
    /// Image file, copied to `images/`.
    Image,
}

impl Handler {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Script => "script",
            Self::Style => "style",
            Self::Font => "font",
            Self::Image => "image",
        }
    }
}
