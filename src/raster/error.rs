//! Conversion error types.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Why a single diagram could not be rendered.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Creating or writing the scratch files failed.
    #[error("failed to prepare scratch files")]
    Scratch(#[source] io::Error),

    /// Reading the rendered image back failed.
    #[error("failed to read rendered image `{}`", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The renderer could not be started at all.
    #[error("failed to launch `{program}`")]
    Launch {
        program: String,
        #[source]
        source: io::Error,
    },

    /// The renderer ran but reported failure.
    #[error("renderer exited with {}{}", describe_code(*code), describe_stderr(stderr))]
    ToolFailed { code: Option<i32>, stderr: String },

    /// The renderer exited successfully without writing anything.
    #[error("renderer produced no output{}", describe_stderr(stderr))]
    EmptyOutput { stderr: String },
}

pub(super) fn describe_code(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("status {code}"),
        None => "a signal".to_string(),
    }
}

fn describe_stderr(stderr: &str) -> String {
    let stderr = stderr.trim();
    if stderr.is_empty() {
        String::new()
    } else {
        format!("\n{stderr}")
    }
}
