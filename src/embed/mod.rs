//! Embedded static resources.
//!
//! - `build` - pages written into the output (default `index.html`)
//! - `serve` - dev server resources (hotreload.js, build error page)
//!
//! ```ignore
//! use embed::serve::{HOTRELOAD_JS, HotreloadVars};
//!
//! let js = HOTRELOAD_JS.render(&HotreloadVars { ws_port: 35729 });
//! ```

use std::marker::PhantomData;

/// Placeholder substitution for one template.
pub trait TemplateVars {
    fn apply(&self, content: &str) -> String;
}

/// Embedded text with typed variables.
#[derive(Debug, Clone, Copy)]
pub struct Template<V> {
    content: &'static str,
    _marker: PhantomData<V>,
}

impl<V> Template<V> {
    pub const fn new(content: &'static str) -> Self {
        Self {
            content,
            _marker: PhantomData,
        }
    }
}

impl<V: TemplateVars> Template<V> {
    pub fn render(&self, vars: &V) -> String {
        vars.apply(self.content)
    }
}

pub mod build {
    use super::{Template, TemplateVars};

    pub struct PageVars {
        pub title: String,
    }

    impl TemplateVars for PageVars {
        fn apply(&self, content: &str) -> String {
            content.replace("__TITLE__", &crate::utils::html::escape(&self.title))
        }
    }

    /// Page used when the project has no HTML template.
    pub const DEFAULT_PAGE: Template<PageVars> =
        Template::new(include_str!("build/index.html"));
}

pub mod serve {
    use super::{Template, TemplateVars};

    pub struct HotreloadVars {
        pub ws_port: u16,
    }

    impl TemplateVars for HotreloadVars {
        fn apply(&self, content: &str) -> String {
            content.replace("__SPRIG_WS_PORT__", &self.ws_port.to_string())
        }
    }

    /// Live reload client, injected into served HTML.
    pub const HOTRELOAD_JS: Template<HotreloadVars> =
        Template::new(include_str!("serve/hotreload.js"));

    pub struct ErrorVars {
        /// Plain text, escaped on render
        pub message: String,
    }

    impl TemplateVars for ErrorVars {
        fn apply(&self, content: &str) -> String {
            content.replace("__MESSAGE__", &crate::utils::html::escape(&self.message))
        }
    }

    /// Shown instead of HTML pages while the last build is failing.
    pub const ERROR_HTML: Template<ErrorVars> =
        Template::new(include_str!("serve/error.html"));
}
