//! Asset classifier: ordered pattern → handler rules, first match wins.

use std::path::Path;

use regex::Regex;

use super::Handler;
use crate::config::RuleConfig;
use crate::core::{BuildError, BuildResult};

/// A compiled `[[build.rules]]` entry.
#[derive(Debug, Clone)]
pub struct AssetRule {
    pub matcher: Regex,
    pub handler: Handler,
    /// Patterns containing `/` see the whole path, others only the file name.
    match_path: bool,
}

impl AssetRule {
    pub fn new(pattern: &str, handler: Handler) -> BuildResult<Self> {
        let matcher = Regex::new(pattern).map_err(|source| BuildError::InvalidRule {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Self {
            matcher,
            handler,
            match_path: pattern.contains('/'),
        })
    }

    pub fn matches(&self, path: &Path) -> bool {
        if self.match_path {
            let subject = path.to_string_lossy().replace('\\', "/");
            self.matcher.is_match(&subject)
        } else {
            self.matcher
                .is_match(crate::utils::path::file_name(path))
        }
    }
}

#[derive(Debug, Clone)]
pub struct Classifier {
    rules: Vec<AssetRule>,
}

impl Classifier {
    pub fn new(rules: &[RuleConfig]) -> BuildResult<Self> {
        let rules = rules
            .iter()
            .map(|rule| AssetRule::new(&rule.pattern, rule.handler))
            .collect::<BuildResult<Vec<_>>>()?;
        Ok(Self { rules })
    }

    /// Handler of the first matching rule; `None` means passthrough copy.
    pub fn classify(&self, path: &Path) -> Option<Handler> {
        self.rules
            .iter()
            .find(|rule| rule.matches(path))
            .map(|rule| rule.handler)
    }

    #[cfg(test)]
    pub fn rules(&self) -> &[AssetRule] {
        &self.rules
    }
}

impl Default for Classifier {
    fn default() -> Self {
        // Built-in patterns are known to compile
        let rules = RuleConfig::defaults()
            .iter()
            .filter_map(|rule| AssetRule::new(&rule.pattern, rule.handler).ok())
            .collect();
        Self { rules }
    }
}
