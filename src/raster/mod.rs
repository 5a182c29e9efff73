//! Diagram rasterization through an external renderer.
//!
//! # Flow
//!
//! ```text
//! source bytes ──▶ ScratchPair::source ──▶ backend.render(src, dst)
//!                                                   │
//! RenderedImage ◀── FailurePolicy ◀── read(dst) ◀───┘
//!                                     (pair dropped: both files removed)
//! ```
//!
//! # Module Structure
//!
//! - [`backend`]: `RenderingBackend` capability and the command-line backend
//! - [`scratch`]: scoped scratch files, unique per conversion
//! - [`error`]: `RenderError`

pub mod backend;
mod error;
pub mod scratch;

pub use backend::{CommandBackend, ProcessResult, RenderingBackend};
pub use error::RenderError;

use error::describe_code;
pub use scratch::{ScratchPair, ScratchSpace};

use crate::{debug, log};
use serde::{Deserialize, Serialize};
use std::{fs, io};

/// What to do when the renderer fails or writes nothing.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Non-zero exit or empty output is an error.
    #[default]
    Error,
    /// Warn and hand back whatever bytes were written, possibly none.
    Passthrough,
}

/// Image bytes of one conversion together with how the renderer exited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedImage {
    bytes: Vec<u8>,
    process: ProcessResult,
}

impl RenderedImage {
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn process(&self) -> &ProcessResult {
        &self.process
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Renders diagram text to an image through a [`RenderingBackend`].
#[derive(Debug, Clone)]
pub struct DiagramRasterizer<B> {
    backend: B,
    scratch: ScratchSpace,
    policy: FailurePolicy,
}

impl<B: RenderingBackend> DiagramRasterizer<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            scratch: ScratchSpace::default(),
            policy: FailurePolicy::default(),
        }
    }

    pub fn scratch(mut self, scratch: ScratchSpace) -> Self {
        self.scratch = scratch;
        self
    }

    pub fn policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Render `source` and return the image the backend wrote.
    ///
    /// Blocks for the duration of one renderer run. Scratch files are
    /// removed before returning, whatever the outcome.
    pub fn render(&self, source: &[u8]) -> Result<RenderedImage, RenderError> {
        let pair = self.scratch.acquire(source).map_err(RenderError::Scratch)?;

        let process = self.backend.render(pair.source(), pair.destination())?;
        let bytes = read_destination(&pair)?;

        if let Err(err) = pair.close() {
            debug!("render"; "failed to remove scratch files: {err}");
        }

        self.apply_policy(bytes, process)
    }

    fn apply_policy(
        &self,
        bytes: Vec<u8>,
        process: ProcessResult,
    ) -> Result<RenderedImage, RenderError> {
        match self.policy {
            FailurePolicy::Error if !process.success() => Err(RenderError::ToolFailed {
                code: process.exit_code,
                stderr: process.stderr,
            }),
            FailurePolicy::Error if bytes.is_empty() => Err(RenderError::EmptyOutput {
                stderr: process.stderr,
            }),
            FailurePolicy::Error => Ok(RenderedImage { bytes, process }),
            FailurePolicy::Passthrough => {
                if !process.success() {
                    log!("warning"; "renderer exited with {}, keeping its output", describe_code(process.exit_code));
                }
                if bytes.is_empty() {
                    log!("warning"; "renderer produced no output");
                }
                Ok(RenderedImage { bytes, process })
            }
        }
    }
}

/// Read the destination in full; a file the renderer removed reads as empty.
fn read_destination(pair: &ScratchPair) -> Result<Vec<u8>, RenderError> {
    match fs::read(pair.destination()) {
        Ok(bytes) => Ok(bytes),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(source) => Err(RenderError::Read {
            path: pair.destination().to_path_buf(),
            source,
        }),
    }
}
