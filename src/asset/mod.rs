//! Asset handling: classification and the per-kind compilers.
//!
//! ```text
//! asset/
//! ├── kind.rs    # Handler (script/style/font/image)
//! ├── rule.rs    # Classifier: ordered regex rules, first match wins
//! ├── script.rs  # script entries: syntax check, style imports, minify
//! ├── style.rs   # stylesheets: @import inlining, url() rewriting
//! └── copy.rs    # [[build.copy]] directory mirroring
//! ```

mod copy;
mod kind;
mod rule;
mod script;
mod style;

pub use copy::scan_copy_patterns;
pub use kind::Handler;
pub use rule::Classifier;
pub use script::compile_script;
pub use style::{StyleOptions, compile_styles};
