//! Running the external renderer.
//!
//! ```ignore
//! let output = Cmd::from_slice(&["npx", "bpmn-to-image"])
//!     .arg("in.bpmn:out.svg")
//!     .filter(&NPM_FILTER)
//!     .capture()?;
//!
//! let output = Cmd::shell("npx bpmn-to-image 'a b.bpmn':'a b.svg'").capture()?;
//! ```

use crate::debug;
use regex::Regex;
use std::{
    borrow::Cow,
    ffi::{OsStr, OsString},
    io,
    path::{Path, PathBuf},
    process::{Command, Output, Stdio},
    sync::LazyLock,
};

/// Shell used by [`Cmd::shell`] and the flag that makes it run one line.
#[cfg(windows)]
const SHELL: [&str; 2] = ["cmd", "/C"];
#[cfg(not(windows))]
const SHELL: [&str; 2] = ["sh", "-c"];

/// A program invocation, run once with [`Cmd::capture`].
#[derive(Debug, Default)]
pub struct Cmd {
    argv: Vec<OsString>,
    cwd: Option<PathBuf>,
    filter: Option<&'static StderrFilter>,
}

impl Cmd {
    /// Program followed by its leading arguments, e.g. `["npx", "bpmn-to-image"]`.
    ///
    /// An empty slice yields a command with an empty program name, which
    /// fails to spawn.
    pub fn from_slice<S: AsRef<OsStr>>(words: &[S]) -> Self {
        Self {
            argv: words.iter().map(|w| w.as_ref().to_owned()).collect(),
            ..Default::default()
        }
    }

    /// `line` run by the platform shell. Quoting is the caller's job.
    pub fn shell(line: &str) -> Self {
        Self::from_slice(&SHELL).arg(line)
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.argv.push(arg.as_ref().to_owned());
        self
    }

    pub fn cwd(mut self, dir: impl AsRef<Path>) -> Self {
        self.cwd = Some(dir.as_ref().to_owned());
        self
    }

    /// Drop stderr lines matching `filter` from the verbose log.
    pub fn filter(mut self, filter: &'static StderrFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn program_name(&self) -> String {
        self.argv
            .first()
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Spawn, wait, and collect stdout and stderr.
    ///
    /// A non-zero exit is returned as part of `Output`; only spawn and wait
    /// failures are `Err`. Stdin is closed so the program cannot block on it.
    pub fn capture(self) -> io::Result<Output> {
        let name = self.program_name();
        let (program, args) = self.argv.split_first().ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "empty command")
        })?;

        let mut command = Command::new(program);
        command.args(args).stdin(Stdio::null());
        if let Some(dir) = &self.cwd {
            command.current_dir(dir);
        }

        let output = command.output()?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        let lines = self.filter.unwrap_or(&NO_FILTER).keep(&stderr);
        if !lines.is_empty() {
            debug!(&name; "{}", lines.join("\n"));
        }

        Ok(output)
    }
}

/// Prefixes of stderr lines not worth showing, even with `--verbose`.
#[derive(Debug)]
pub struct StderrFilter {
    noise: &'static [&'static str],
}

impl StderrFilter {
    pub const fn new(noise: &'static [&'static str]) -> Self {
        Self { noise }
    }

    fn is_noise(&self, line: &str) -> bool {
        line.is_empty() || self.noise.iter().any(|p| line.starts_with(p))
    }

    /// Non-noise lines of `output`, trimmed and without colour codes.
    pub fn keep(&self, output: &str) -> Vec<String> {
        output
            .lines()
            .map(|line| strip_ansi(line).trim().to_string())
            .filter(|line| !self.is_noise(line))
            .collect()
    }
}

pub const NO_FILTER: StderrFilter = StderrFilter::new(&[]);

/// npm/npx chatter printed on every `npx` invocation.
pub const NPM_FILTER: StderrFilter = StderrFilter::new(&["npm WARN", "npm warn", "npm notice"]);

static ANSI: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\x1b\[[0-9;]*m").unwrap());

pub fn strip_ansi(s: &str) -> Cow<'_, str> {
    ANSI.replace_all(s, "")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_slice_and_arg() {
        let cmd = Cmd::from_slice(&["npx", "bpmn-to-image"])
            .arg("a.bpmn:a.svg")
            .cwd("/site");

        assert_eq!(cmd.program_name(), "npx");
        assert_eq!(cmd.argv.len(), 3);
        assert_eq!(cmd.argv[2], OsString::from("a.bpmn:a.svg"));
        assert_eq!(cmd.cwd, Some(PathBuf::from("/site")));
    }

    #[test]
    fn test_shell_wraps_line() {
        let cmd = Cmd::shell("echo 'a b'");
        assert_eq!(cmd.program_name(), SHELL[0]);
        assert_eq!(cmd.argv.last(), Some(&OsString::from("echo 'a b'")));
    }

    #[test]
    fn test_npm_noise() {
        assert!(NPM_FILTER.is_noise("npm WARN deprecated"));
        assert!(NPM_FILTER.is_noise("npm notice New major version"));
        assert!(NPM_FILTER.is_noise(""));
        assert!(!NPM_FILTER.is_noise("Error: no diagram to display"));
    }

    #[test]
    fn test_keep_strips_colour_and_noise() {
        let out = "npm WARN old\n\x1b[31mfailed to parse\x1b[0m\n\n  npm notice x";
        assert_eq!(NPM_FILTER.keep(out), vec!["failed to parse".to_string()]);
        assert_eq!(NO_FILTER.keep("a\n\nb"), vec!["a", "b"]);
    }

    #[test]
    fn test_strip_ansi() {
        assert_eq!(strip_ansi("\x1b[1;31mRed\x1b[0m"), "Red");
        assert_eq!(strip_ansi("Plain text"), "Plain text");
    }

    #[cfg(unix)]
    #[test]
    fn test_capture_keeps_nonzero_status() {
        let output = Cmd::shell("echo oops >&2; exit 3").capture().unwrap();
        assert_eq!(output.status.code(), Some(3));
        assert_eq!(String::from_utf8_lossy(&output.stderr).trim(), "oops");
    }

    #[test]
    fn test_capture_missing_program() {
        let err = Cmd::from_slice(&["definitely-not-a-real-program-bpmn-svg"])
            .capture()
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_capture_empty_command() {
        let err = Cmd::from_slice::<&str>(&[]).capture().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }
}
