//! Configuration management for `bpmn-svg.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # Configuration section definitions
//! │   ├── build      # [build]
//! │   └── render     # [render]
//! ├── types/         # Utility types
//! │   ├── error      # ConfigError, ConfigDiagnostics
//! │   └── field      # FieldPath
//! └── mod.rs         # Config (this file)
//! ```
//!
//! The file is optional. Without one, defaults apply and the current
//! directory is the project root.

pub mod section;
pub mod types;
mod util;

use util::find_config_file;

pub use section::{BuildConfig, RenderConfig};
pub use types::{ConfigDiagnostics, ConfigError, FieldPath};

use crate::{
    cli::{BuildArgs, Cli, Commands},
    debug, log,
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs, io,
    path::{Path, PathBuf},
};

/// Config file searched for when `-C` is not given.
pub const CONFIG_FILE: &str = "bpmn-svg.toml";

/// Root configuration structure representing bpmn-svg.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Absolute path to the config file, if one was found (internal use only)
    #[serde(skip)]
    pub config_path: Option<PathBuf>,

    /// Directory of the config file, or cwd without one
    #[serde(skip)]
    pub root: PathBuf,

    /// Renderer settings
    #[serde(default)]
    pub render: RenderConfig,

    /// Discovery and output settings
    #[serde(default)]
    pub build: BuildConfig,
}

impl Config {
    /// Load configuration for the given CLI invocation.
    ///
    /// Searches upward from cwd for the config file. The project root is the
    /// config file's parent directory, or cwd when there is none.
    pub fn load(cli: &Cli) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current working directory")?;
        Self::load_from(cli, &cwd)
    }

    fn load_from(cli: &Cli, cwd: &Path) -> Result<Self> {
        let (mut config, root) = match Self::locate(cli, cwd)? {
            Some(path) => {
                debug!("config"; "using {}", path.display());
                let mut config = Self::from_path(&path)?;
                let root = path.parent().map(Path::to_path_buf).unwrap_or_default();
                config.config_path = Some(path);
                (config, root)
            }
            None => {
                debug!("config"; "no {CONFIG_FILE} found, using defaults");
                (Self::default(), cwd.to_path_buf())
            }
        };

        config.validate_paths()?;

        config.finalize(&root, cli);
        config.validate(cli)?;

        Ok(config)
    }

    /// Config file for this run.
    ///
    /// An explicit `-C` path must exist. Otherwise `bpmn-svg.toml` is
    /// searched upward from `cwd`, and not finding one is fine.
    fn locate(cli: &Cli, cwd: &Path) -> Result<Option<PathBuf>> {
        let Some(path) = &cli.config else {
            return Ok(find_config_file(Path::new(CONFIG_FILE), cwd));
        };
        let path = cwd.join(path);
        if !path.is_file() {
            let err = io::Error::new(io::ErrorKind::NotFound, "config file not found");
            return Err(ConfigError::Io(path, err).into());
        }
        Ok(Some(crate::utils::path::normalize_path(&path)))
    }

    /// Read and parse `path`, warning about keys this tool does not know.
    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        let (config, unknown) = Self::parse_with_ignored(&content)?;
        if !unknown.is_empty() {
            log!("warning"; "ignoring unknown keys in {}: {}", path.display(), unknown.join(", "));
        }
        Ok(config)
    }

    /// Parse TOML, returning the config and the dotted paths of unknown keys.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>)> {
        let mut unknown = Vec::new();
        let config: Self =
            serde_ignored::deserialize(toml::Deserializer::new(content), |key: serde_ignored::Path| {
                unknown.push(key.to_string())
            })
            .map_err(ConfigError::from)?;
        Ok((config, unknown))
    }

    /// Get path relative to the project root
    pub fn root_relative(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        path.strip_prefix(&self.root).unwrap_or(path).to_path_buf()
    }

    /// Set the root, apply CLI overrides, then resolve paths.
    fn finalize(&mut self, root: &Path, cli: &Cli) {
        self.root = crate::utils::path::normalize_path(root);

        if let Commands::Build { args } = &cli.command {
            self.apply_build_args(args);
        }

        let root = self.root.clone();
        self.build.normalize(&root);
        self.render.normalize(&root);
    }

    /// `build -s/-o` replace the configured paths before they are resolved.
    fn apply_build_args(&mut self, args: &BuildArgs) {
        if let Some(source) = &args.source {
            self.build.source.clone_from(source);
        }
        if let Some(output) = &args.output {
            self.build.output.clone_from(output);
        }
    }

    /// Pre-validate paths before normalization.
    ///
    /// Must run before `finalize()`: afterwards every path is absolute and
    /// an absolute `assets` entry can no longer be told apart.
    fn validate_paths(&self) -> Result<()> {
        let mut diag = ConfigDiagnostics::new();
        self.build.validate_paths(&mut diag);
        diag.into_result()
            .map_err(|e| ConfigError::Diagnostics(e).into())
    }

    /// Validate configuration for the current command.
    ///
    /// Collects all validation errors and returns them at once.
    pub fn validate(&self, cli: &Cli) -> Result<()> {
        let mut diag = ConfigDiagnostics::new();

        self.render.validate(&self.root, &mut diag);

        // Discovery paths only matter when building
        if let Commands::Build { .. } = &cli.command {
            self.build.validate(&mut diag);
        }

        diag.into_result()
            .map_err(|e| ConfigError::Diagnostics(e).into())
    }
}

// ============================================================================
// Test Helpers (available to all modules via `use crate::config::test_*`)
// ============================================================================

/// Parse config, panicking on unknown fields (to catch config typos in tests).
#[cfg(test)]
pub fn test_parse_config(content: &str) -> Config {
    let (parsed, ignored) = Config::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

// ============================================================================
// tests
// ============================================================================
