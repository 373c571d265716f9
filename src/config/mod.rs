//! Project configuration management for `sprig.toml`.
//!
//! ```text
//! config/
//! ├── section/       # [build] and [serve]
//! ├── types/         # ConfigError, ConfigDiagnostics, FieldPath
//! ├── util.rs        # config file discovery
//! └── mod.rs         # ProjectConfig (this file)
//! ```
//!
//! Values are layered: built-in defaults, then `sprig.toml` (searched upward
//! from the working directory), then command-line flags.

pub mod section;
pub mod types;
mod util;

pub use section::{BuildConfig, CopyPattern, RuleConfig, ServeConfig};
pub use types::{ConfigDiagnostics, ConfigError, FieldPath};

use crate::cli::{BuildArgs, Cli, Commands};
use crate::{debug, log};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use util::find_config_file;

/// Root configuration structure representing sprig.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// CLI arguments reference (internal use only)
    #[serde(skip)]
    pub cli: Option<&'static Cli>,

    /// Absolute path to the config file, which may not exist
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Project root directory - parent of the config file
    #[serde(skip)]
    pub root: PathBuf,

    #[serde(default)]
    pub build: BuildConfig,

    #[serde(default)]
    pub serve: ServeConfig,
}

impl ProjectConfig {
    /// Load configuration for the given command line.
    ///
    /// A missing config file is not an error: defaults apply and the
    /// working directory becomes the project root.
    pub fn load(cli: &'static Cli) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current working directory")?;

        let (config_path, mut config) = match find_config_file(&cli.config) {
            Some(path) => {
                let config = Self::from_path(&path)?;
                (path, config)
            }
            None => {
                debug!("config"; "{} not found, using defaults", cli.config.display());
                (cwd.join(&cli.config), Self::default())
            }
        };

        config.config_path = config_path;
        config.cli = Some(cli);
        config.finalize()?;
        Ok(config)
    }

    /// Re-read the config file, keeping the original command-line overrides.
    pub fn reload(&self) -> Result<Self> {
        let mut config = if self.config_path.exists() {
            Self::from_path(&self.config_path)?
        } else {
            Self::default()
        };
        config.config_path = self.config_path.clone();
        config.cli = self.cli;
        config.finalize()?;
        Ok(config)
    }

    /// Validate, normalize paths, and apply CLI options.
    fn finalize(&mut self) -> Result<()> {
        let mut diag = ConfigDiagnostics::new();
        self.build.validate_raw(&mut diag);

        let root = self
            .config_path
            .parent()
            .map(crate::utils::path::normalize_path)
            .unwrap_or_default();
        self.root = root.clone();

        if let Some(cli) = self.cli {
            Self::update_option(&mut self.build.entry, cli.entry.as_ref());
            Self::update_option(&mut self.build.output, cli.output.as_ref());
            self.build.output = expand_tilde(&self.build.output);
            self.build.normalize(&root);
            self.apply_command_options(cli);
        } else {
            self.build.output = expand_tilde(&self.build.output);
            self.build.normalize(&root);
        }

        self.build.validate(&root, &mut diag);
        diag.print_warnings();

        diag.into_result()
            .map_err(|e| ConfigError::Diagnostics(e).into())
    }

    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(ConfigError::Toml)?;
        Ok(config)
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy())
                .unwrap_or_else(|| path.to_string_lossy());
            log!("warning"; "unknown fields in {}, ignoring: {}", name, ignored.join(", "));
        }

        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    pub fn get_root(&self) -> &Path {
        &self.root
    }

    /// Path relative to the project root, for log lines.
    pub fn root_relative(&self, path: impl AsRef<Path>) -> PathBuf {
        path.as_ref()
            .strip_prefix(&self.root)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| path.as_ref().to_path_buf())
    }

    // ========================================================================
    // cli configuration updates
    // ========================================================================

    fn apply_command_options(&mut self, cli: &Cli) {
        self.apply_build_args(cli.build_args());
        if let Commands::Serve {
            interface,
            port,
            watch,
            ..
        } = &cli.command
        {
            Self::update_option(&mut self.serve.interface, interface.as_ref());
            Self::update_option(&mut self.serve.port, port.as_ref());
            Self::update_option(&mut self.serve.watch, watch.as_ref());
        }
    }

    fn apply_build_args(&mut self, args: &BuildArgs) {
        crate::logger::set_verbose(args.verbose);
        Self::update_option(&mut self.build.minify, args.minify.as_ref());
    }

    /// Update config option if CLI value is provided.
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }
}

fn expand_tilde(path: &Path) -> PathBuf {
    match path.to_str() {
        Some(s) => PathBuf::from(shellexpand::tilde(s).into_owned()),
        None => path.to_path_buf(),
    }
}

// ============================================================================
// Test Helpers
// ============================================================================

/// Parse config, panicking on unknown fields to catch typos in tests.
#[cfg(test)]
pub fn test_parse_config(content: &str) -> ProjectConfig {
    let (parsed, ignored) = ProjectConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

/// Config rooted at `root` with the default layout, paths normalized.
#[cfg(test)]
pub fn test_config_at(root: &Path) -> ProjectConfig {
    let root = crate::utils::path::normalize_path(root);
    let mut config = ProjectConfig {
        config_path: root.join("sprig.toml"),
        root: root.clone(),
        ..ProjectConfig::default()
    };
    config.build.normalize(&root);
    config
}
