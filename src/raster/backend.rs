//! Rendering backends.
//!
//! A backend turns a diagram file into an image file. The production backend
//! shells out to a command-line renderer using the `<input>:<output>`
//! argument convention of `bpmn-to-image`.

use super::RenderError;
use crate::config::RenderConfig;
use crate::utils::exec::{Cmd, NPM_FILTER};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Exit status and diagnostics of one renderer run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProcessResult {
    /// Exit code, `None` when terminated by a signal.
    pub exit_code: Option<i32>,
    /// Captured standard error, lossily decoded.
    pub stderr: String,
}

impl ProcessResult {
    /// Successful run with no diagnostics.
    pub fn ok() -> Self {
        Self {
            exit_code: Some(0),
            stderr: String::new(),
        }
    }

    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Capability to render the diagram at `input` into `output`.
///
/// Implementations block until the image is written (or the attempt failed).
/// A non-zero exit is reported through [`ProcessResult`], not as `Err`;
/// `Err` is reserved for failing to run the renderer at all.
pub trait RenderingBackend: Send + Sync {
    fn render(&self, input: &Path, output: &Path) -> Result<ProcessResult, RenderError>;
}

impl<B: RenderingBackend + ?Sized> RenderingBackend for &B {
    fn render(&self, input: &Path, output: &Path) -> Result<ProcessResult, RenderError> {
        (**self).render(input, output)
    }
}

/// Runs an external renderer as `<command...> <input>:<output>`.
#[derive(Debug, Clone)]
pub struct CommandBackend {
    command: Vec<String>,
    shell: bool,
    cwd: Option<PathBuf>,
}

impl CommandBackend {
    /// Spawn `command` directly; the first word is the program.
    pub fn new<I, S>(command: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            command: command.into_iter().map(Into::into).collect(),
            shell: false,
            cwd: None,
        }
    }

    pub fn from_config(config: &RenderConfig, root: &Path) -> Self {
        Self::new(config.command.iter().cloned())
            .shell(config.shell)
            .cwd(root)
    }

    /// Go through the platform shell, quoting every word and both paths.
    pub fn shell(mut self, shell: bool) -> Self {
        self.shell = shell;
        self
    }

    /// Working directory of the renderer (where `npx` looks for packages).
    pub fn cwd(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    fn program(&self) -> String {
        if self.shell {
            Cmd::shell("").program_name()
        } else {
            self.command.first().cloned().unwrap_or_default()
        }
    }

    fn build(&self, input: &Path, output: &Path) -> Cmd {
        let cmd = if self.shell {
            Cmd::shell(&shell_line(&self.command, input, output))
        } else {
            Cmd::from_slice(&self.command).arg(direct_arg(input, output))
        };
        let cmd = cmd.filter(&NPM_FILTER);
        match &self.cwd {
            Some(dir) => cmd.cwd(dir),
            None => cmd,
        }
    }
}

impl RenderingBackend for CommandBackend {
    fn render(&self, input: &Path, output: &Path) -> Result<ProcessResult, RenderError> {
        let output = self
            .build(input, output)
            .capture()
            .map_err(|source| RenderError::Launch {
                program: self.program(),
                source,
            })?;

        Ok(ProcessResult {
            exit_code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// `<input>:<output>` as one raw argument, for direct spawning.
pub fn direct_arg(input: &Path, output: &Path) -> OsString {
    let mut arg = OsString::from(input.as_os_str());
    arg.push(":");
    arg.push(output.as_os_str());
    arg
}

/// Full command line for `sh -c`, every piece quoted.
///
/// Input and output are quoted separately and joined by a bare `:`; the
/// shell glues adjacent segments back into the single argument the renderer
/// expects.
pub fn shell_line(command: &[String], input: &Path, output: &Path) -> String {
    let input = input.to_string_lossy();
    let output = output.to_string_lossy();
    let mut line = shell_words::join(command);
    if !line.is_empty() {
        line.push(' ');
    }
    line.push_str(&shell_words::quote(&input));
    line.push(':');
    line.push_str(&shell_words::quote(&output));
    line
}
