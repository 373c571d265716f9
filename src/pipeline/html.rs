//! HTML page: the template with bundle tags injected.
//!
//! ```text
//! <head>
//!   ...
//!   <link rel="stylesheet" href="css/app.bundle.css">   ┐ inserted before
//!   <script defer src="js/app.bundle.js"></script>      ┘ </head>
//! </head>
//! ```

use std::fs;
use std::path::Component;

use super::{ArtifactKind, OutputArtifact};
use crate::config::ProjectConfig;
use crate::core::{BuildError, BuildResult};
use crate::embed::build::{DEFAULT_PAGE, PageVars};
use crate::utils::html::{body_start, find_tag};

/// Bundles an HTML page links to, each list in entry-name order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PageLinks {
    /// Paths relative to the output root
    pub styles: Vec<String>,
    pub scripts: Vec<String>,
}

impl PageLinks {
    /// The `<link>`/`<script>` block, with hrefs relative to `page_dir_depth`
    /// directories below the output root.
    fn render_tags(&self, page_dir_depth: usize) -> String {
        let prefix = "../".repeat(page_dir_depth);
        let mut tags = String::new();
        for href in &self.styles {
            tags.push_str(&format!("<link rel=\"stylesheet\" href=\"{prefix}{href}\">\n"));
        }
        for src in &self.scripts {
            tags.push_str(&format!("<script defer src=\"{prefix}{src}\"></script>\n"));
        }
        tags
    }
}

/// Plan the HTML page, `None` when `build.html.enable` is off.
pub fn plan_page(config: &ProjectConfig, links: &PageLinks) -> BuildResult<Option<OutputArtifact>> {
    let html = &config.build.html;
    if !html.enable {
        return Ok(None);
    }

    let template = if html.template.is_file() {
        fs::read_to_string(&html.template).map_err(BuildError::io(&html.template))?
    } else {
        crate::debug!("html"; "{} not found, using the built-in page", html.template.display());
        DEFAULT_PAGE.render(&PageVars {
            title: page_title(config),
        })
    };

    let depth = html
        .filename
        .parent()
        .map_or(0, |dir| {
            dir.components()
                .filter(|c| matches!(c, Component::Normal(_)))
                .count()
        });
    let page = inject_tags(&template, &links.render_tags(depth));

    Ok(Some(OutputArtifact::generated(
        &html.template,
        crate::utils::path::clean(&html.filename),
        ArtifactKind::Html,
        page,
    )))
}

fn page_title(config: &ProjectConfig) -> String {
    config
        .get_root()
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "sprig".to_string())
}

/// Insert `tags` before `</head>`, else at the top of `<body>`, else at
/// the end of the document.
pub fn inject_tags(template: &str, tags: &str) -> String {
    if tags.is_empty() {
        return template.to_string();
    }

    let bytes = template.as_bytes();
    let at = find_tag(bytes, b"</head>")
        .or_else(|| body_start(bytes))
        .unwrap_or(bytes.len());

    let mut page = String::with_capacity(template.len() + tags.len());
    page.push_str(&template[..at]);
    if at > 0 && !template[..at].ends_with('\n') {
        page.push('\n');
    }
    page.push_str(tags);
    page.push_str(&template[at..]);
    page
}
