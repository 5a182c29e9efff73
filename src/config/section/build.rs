//! `[build]` section configuration.
//!
//! Where diagrams are discovered and where their SVGs are written.
//!
//! # Example
//!
//! ```toml
//! [build]
//! source = "."            # Site source root (relative to project root)
//! assets = "assets/bpmn"  # Diagram directory (relative to `source`)
//! output = "_site"        # Output root (relative to project root)
//! extension = "bpmn"      # Recognised diagram extension (case-insensitive)
//! ```
//!
//! `source/assets/bpmn/flows/order.bpmn` becomes
//! `output/assets/bpmn/flows/order.svg`.

use crate::config::{ConfigDiagnostics, FieldPath};
use crate::utils::path::normalize_path;
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Site source root.
    pub source: PathBuf,

    /// Diagram directory, relative to `source`.
    pub assets: PathBuf,

    /// Output root.
    pub output: PathBuf,

    /// Diagram file extension, with or without the leading dot.
    pub extension: String,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            source: PathBuf::from("."),
            assets: PathBuf::from("assets/bpmn"),
            output: PathBuf::from("_site"),
            extension: "bpmn".to_string(),
        }
    }
}

/// Field paths of [`BuildConfig`].
pub struct BuildConfigFields {
    pub source: FieldPath,
    pub assets: FieldPath,
    pub extension: FieldPath,
}

impl BuildConfig {
    pub const FIELDS: BuildConfigFields = BuildConfigFields {
        source: FieldPath::new("build.source"),
        assets: FieldPath::new("build.assets"),
        extension: FieldPath::new("build.extension"),
    };

    /// Resolve `source` and `output` against the project root.
    ///
    /// `assets` stays relative: discovery matches it as a prefix of
    /// source-relative paths.
    pub fn normalize(&mut self, root: &Path) {
        self.source = normalize_path(&root.join(&self.source));
        self.output = normalize_path(&root.join(&self.output));
    }

    /// Pre-validate raw paths, before `normalize` makes them absolute.
    pub fn validate_paths(&self, diag: &mut ConfigDiagnostics) {
        let escapes = self
            .assets
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes {
            diag.error_with_hint(
                Self::FIELDS.assets,
                format!("`{}` must be a relative path inside the source", self.assets.display()),
                "use a path like \"assets/bpmn\"",
            );
        }
    }

    /// Validate build configuration (after normalization).
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.extension.trim_start_matches('.').is_empty() {
            diag.error(Self::FIELDS.extension, "must not be empty");
        }

        if !self.source.is_dir() {
            diag.error(
                Self::FIELDS.source,
                format!("`{}` is not a directory", self.source.display()),
            );
        }
    }

    /// Absolute diagram directory.
    pub fn assets_dir(&self) -> PathBuf {
        self.source.join(&self.assets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_parse_config;

    #[test]
    fn test_defaults() {
        let config = test_parse_config("");
        assert_eq!(config.build.source, PathBuf::from("."));
        assert_eq!(config.build.assets, PathBuf::from("assets/bpmn"));
        assert_eq!(config.build.output, PathBuf::from("_site"));
        assert_eq!(config.build.extension, "bpmn");
    }

    #[test]
    fn test_parse_paths() {
        let config = test_parse_config(
            "[build]\nsource = \"blog\"\nassets = \"diagrams\"\noutput = \"public\"\nextension = \".BPMN\"",
        );
        assert_eq!(config.build.source, PathBuf::from("blog"));
        assert_eq!(config.build.assets, PathBuf::from("diagrams"));
        assert_eq!(config.build.output, PathBuf::from("public"));
        assert_eq!(config.build.extension, ".BPMN");
    }

    #[test]
    fn test_assets_must_stay_inside_source() {
        for assets in ["/abs/bpmn", "../outside", "assets/../../x"] {
            let config = test_parse_config(&format!("[build]\nassets = \"{assets}\""));
            let mut diag = ConfigDiagnostics::new();
            config.build.validate_paths(&mut diag);
            assert_eq!(diag.errors().len(), 1, "accepted {assets}");
        }

        let config = test_parse_config("[build]\nassets = \"./assets/bpmn\"");
        let mut diag = ConfigDiagnostics::new();
        config.build.validate_paths(&mut diag);
        assert!(diag.is_empty());
    }

    #[test]
    fn test_normalize_and_validate() {
        let dir = tempfile::tempdir().unwrap();
        let mut build = BuildConfig::default();
        build.normalize(dir.path());
        assert!(build.source.is_absolute());
        assert!(build.output.ends_with("_site"));

        let mut diag = ConfigDiagnostics::new();
        build.validate(&mut diag);
        assert!(diag.is_empty());

        build.extension = ".".into();
        build.source = dir.path().join("missing");
        let mut diag = ConfigDiagnostics::new();
        build.validate(&mut diag);
        assert_eq!(diag.errors().len(), 2);
    }

    #[test]
    fn test_assets_dir() {
        let build = BuildConfig {
            source: PathBuf::from("/site"),
            ..Default::default()
        };
        assert_eq!(build.assets_dir(), PathBuf::from("/site/assets/bpmn"));
    }
}
