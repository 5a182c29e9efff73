//! `[render]` section configuration.
//!
//! How the external renderer is invoked.
//!
//! # Example
//!
//! ```toml
//! [render]
//! command = ["npx", "bpmn-to-image"]  # Program and leading arguments
//! shell = false                       # Run through `sh -c` with quoted paths
//! on_failure = "error"                # error | passthrough
//! temp_dir = "~/.cache/bpmn-svg"      # Scratch directory (default: system temp)
//! prefix = "bpmn"                     # Scratch file name prefix
//! ```
//!
//! The renderer is called as `<command...> <input>:<output>`.

use crate::config::{ConfigDiagnostics, FieldPath};
use crate::raster::{FailurePolicy, ScratchSpace};
use crate::utils::path::expand_path;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Renderer program followed by its leading arguments.
    pub command: Vec<String>,

    /// Run the command line through `sh -c`, quoting every word and path.
    /// Useful when the renderer is a shell function. Unix only: the quoting
    /// follows POSIX rules, which `cmd /C` does not understand.
    pub shell: bool,

    /// Behavior on non-zero exit or empty output.
    pub on_failure: FailurePolicy,

    /// Directory for scratch files (default: system temp directory).
    /// Relative paths resolve against the project root; `~` is expanded.
    pub temp_dir: Option<PathBuf>,

    /// Scratch file name prefix.
    pub prefix: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            command: vec!["npx".to_string(), "bpmn-to-image".to_string()],
            shell: false,
            on_failure: FailurePolicy::Error,
            temp_dir: None,
            prefix: "bpmn".to_string(),
        }
    }
}

/// Field paths of [`RenderConfig`].
pub struct RenderConfigFields {
    pub command: FieldPath,
    pub shell: FieldPath,
    pub temp_dir: FieldPath,
    pub prefix: FieldPath,
}

impl RenderConfig {
    pub const FIELDS: RenderConfigFields = RenderConfigFields {
        command: FieldPath::new("render.command"),
        shell: FieldPath::new("render.shell"),
        temp_dir: FieldPath::new("render.temp_dir"),
        prefix: FieldPath::new("render.prefix"),
    };

    /// Resolve `temp_dir` against the project root.
    pub fn normalize(&mut self, root: &Path) {
        if let Some(dir) = self.temp_dir.take() {
            self.temp_dir = Some(expand_path(&dir, root));
        }
    }

    /// Scratch space described by `temp_dir` and `prefix`.
    pub fn scratch(&self) -> ScratchSpace {
        let scratch = ScratchSpace::new().prefix(&self.prefix);
        match &self.temp_dir {
            Some(dir) => scratch.in_dir(dir),
            None => scratch,
        }
    }

    /// Validate render configuration.
    ///
    /// # Checks
    /// - `command` is non-empty and its program can be found (direct mode)
    /// - `shell` is only enabled where `sh` quoting applies
    /// - `prefix` is a plain file name fragment
    /// - the scratch directory exists and cannot split `<input>:<output>`
    pub fn validate(&self, root: &Path, diag: &mut ConfigDiagnostics) {
        self.validate_command(root, diag);

        if self.shell && cfg!(windows) {
            diag.error_with_hint(
                Self::FIELDS.shell,
                "shell mode quotes for `sh` and is not supported on Windows",
                "remove the field to run the renderer directly",
            );
        }

        if self.prefix.contains(['/', '\\', ':']) {
            diag.error(
                Self::FIELDS.prefix,
                "must not contain path separators or `:`",
            );
        }

        match &self.temp_dir {
            Some(dir) => {
                if !dir.is_dir() {
                    diag.error_with_hint(
                        Self::FIELDS.temp_dir,
                        format!("`{}` is not a directory", dir.display()),
                        "create it or remove the field to use the system temp directory",
                    );
                }
                Self::validate_scratch_dir(dir, true, diag);
            }
            None => Self::validate_scratch_dir(&std::env::temp_dir(), false, diag),
        }
    }

    /// A `:` in the scratch directory would split `<input>:<output>` early.
    ///
    /// Windows paths carry a drive colon, so the check only applies elsewhere.
    fn validate_scratch_dir(dir: &Path, configured: bool, diag: &mut ConfigDiagnostics) {
        if cfg!(windows) || !dir.to_string_lossy().contains(':') {
            return;
        }
        if configured {
            diag.error(
                Self::FIELDS.temp_dir,
                "must not contain `:`, the renderer splits its argument there",
            );
        } else {
            diag.error_with_hint(
                Self::FIELDS.temp_dir,
                format!(
                    "system temp directory `{}` contains `:`, the renderer splits its argument there",
                    dir.display()
                ),
                "set render.temp_dir to a directory without `:`",
            );
        }
    }

    fn validate_command(&self, root: &Path, diag: &mut ConfigDiagnostics) {
        let Some(program) = self.command.first() else {
            diag.error_with_hint(
                Self::FIELDS.command,
                "must not be empty",
                "use [\"npx\", \"bpmn-to-image\"]",
            );
            return;
        };

        // In shell mode the first word may be an alias or function.
        if self.shell {
            return;
        }

        if which::which_in(program, std::env::var_os("PATH"), root).is_err() {
            diag.error_with_hint(
                Self::FIELDS.command,
                format!("`{program}` command not found"),
                "install Node.js (for npx) or point the command at an installed renderer",
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_parse_config;

    #[test]
    fn test_defaults() {
        let config = test_parse_config("");
        assert_eq!(config.render.command, vec!["npx", "bpmn-to-image"]);
        assert!(!config.render.shell);
        assert_eq!(config.render.on_failure, FailurePolicy::Error);
        assert_eq!(config.render.temp_dir, None);
        assert_eq!(config.render.prefix, "bpmn");
    }

    #[test]
    fn test_on_failure_parsing() {
        let cases = [
            ("error", FailurePolicy::Error),
            ("passthrough", FailurePolicy::Passthrough),
        ];
        for (input, expected) in cases {
            let config = test_parse_config(&format!("[render]\non_failure = \"{input}\""));
            assert_eq!(config.render.on_failure, expected, "failed for {input}");
        }
    }

    #[test]
    fn test_invalid_on_failure_rejected() {
        let result: Result<crate::config::Config, _> =
            toml::from_str("[render]\non_failure = \"ignore\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_normalize_relative_temp_dir() {
        let mut config = test_parse_config("[render]\ntemp_dir = \"tmp\"").render;
        config.normalize(Path::new("/site"));
        assert_eq!(config.temp_dir, Some(PathBuf::from("/site/tmp")));
    }

    #[test]
    fn test_empty_command_rejected() {
        let config = test_parse_config("[render]\ncommand = []").render;
        let mut diag = ConfigDiagnostics::new();
        config.validate(Path::new("."), &mut diag);
        assert_eq!(diag.errors().len(), 1);
        assert_eq!(diag.errors()[0].field, RenderConfig::FIELDS.command);
    }

    #[test]
    fn test_missing_program_rejected() {
        let config = test_parse_config(
            "[render]\ncommand = [\"definitely-not-a-real-program-bpmn-svg\"]",
        )
        .render;
        let mut diag = ConfigDiagnostics::new();
        config.validate(Path::new("."), &mut diag);
        assert!(!diag.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_shell_mode_skips_program_lookup() {
        let config = test_parse_config(
            "[render]\nshell = true\ncommand = [\"definitely-not-a-real-program-bpmn-svg\"]",
        )
        .render;
        let mut diag = ConfigDiagnostics::new();
        config.validate(Path::new("."), &mut diag);
        assert!(diag.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_prefix_and_temp_dir_checks() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = RenderConfig {
            command: vec!["sh".into()],
            shell: true,
            prefix: "a/b".into(),
            temp_dir: Some(dir.path().join("missing")),
            ..Default::default()
        };
        let mut diag = ConfigDiagnostics::new();
        config.validate(dir.path(), &mut diag);
        assert_eq!(diag.errors().len(), 2);

        config.prefix = "bpmn".into();
        config.temp_dir = Some(dir.path().to_path_buf());
        let mut diag = ConfigDiagnostics::new();
        config.validate(dir.path(), &mut diag);
        assert!(diag.is_empty());
    }

    #[test]
    fn test_scratch_uses_temp_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config = RenderConfig {
            temp_dir: Some(dir.path().to_path_buf()),
            ..Default::default()
        };
        let pair = config.scratch().acquire(b"x").unwrap();
        assert!(pair.source().starts_with(dir.path()));
    }

    #[test]
    fn test_colon_in_scratch_dir_rejected() {
        for configured in [true, false] {
            let mut diag = ConfigDiagnostics::new();
            RenderConfig::validate_scratch_dir(Path::new("/tmp/a:b"), configured, &mut diag);
            assert_eq!(diag.errors().len(), usize::from(cfg!(not(windows))));
            if let Some(error) = diag.errors().first() {
                assert_eq!(error.field, RenderConfig::FIELDS.temp_dir);
                assert_eq!(error.hint.is_some(), !configured);
            }
        }

        let mut diag = ConfigDiagnostics::new();
        RenderConfig::validate_scratch_dir(Path::new("/tmp/plain"), false, &mut diag);
        assert!(diag.is_empty());
    }

    #[test]
    fn test_shell_mode_is_unix_only() {
        let config = RenderConfig {
            command: vec!["sh".into()],
            shell: true,
            ..Default::default()
        };
        let mut diag = ConfigDiagnostics::new();
        config.validate(Path::new("."), &mut diag);
        let shell_errors = diag
            .errors()
            .iter()
            .filter(|e| e.field == RenderConfig::FIELDS.shell)
            .count();
        assert_eq!(shell_errors, usize::from(cfg!(windows)));
    }
}
