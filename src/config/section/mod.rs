//! Configuration sections of `sprig.toml`.

pub mod build;
mod serve;

pub use build::{BuildConfig, CopyPattern, RuleConfig};
pub use serve::ServeConfig;
