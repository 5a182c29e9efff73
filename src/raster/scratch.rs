//! Scratch files handed to the renderer.
//!
//! Every conversion gets its own [`ScratchPair`]: a source file holding the
//! diagram and an empty destination file the renderer overwrites. Names are
//! random and created with an exclusive open, so concurrent conversions never
//! collide. Both files are removed when the pair is closed or dropped.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::{Builder, TempPath};

/// Where and under which name prefix scratch files are created.
#[derive(Debug, Clone)]
pub struct ScratchSpace {
    dir: Option<PathBuf>,
    prefix: String,
}

impl Default for ScratchSpace {
    fn default() -> Self {
        Self {
            dir: None,
            prefix: "bpmn".to_string(),
        }
    }
}

impl ScratchSpace {
    /// Scratch files in the system temp directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create scratch files in `dir` instead of the system temp directory.
    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = Some(dir.into());
        self
    }

    /// Prefix of every scratch file name.
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    fn builder<'a>(&'a self, suffix: &'a str) -> Builder<'a, 'a> {
        let mut builder = Builder::new();
        builder.prefix(&self.prefix).suffix(suffix);
        builder
    }

    /// Write `content` into a fresh source file and reserve a destination.
    pub fn acquire(&self, content: &[u8]) -> io::Result<ScratchPair> {
        let mut source = match &self.dir {
            Some(dir) => self.builder(".bpmn").tempfile_in(dir)?,
            None => self.builder(".bpmn").tempfile()?,
        };
        source.write_all(content)?;
        source.flush()?;
        let source = source.into_temp_path();

        let destination = match &self.dir {
            Some(dir) => self.builder(".svg").tempfile_in(dir)?,
            None => self.builder(".svg").tempfile()?,
        }
        .into_temp_path();

        Ok(ScratchPair {
            source,
            destination,
        })
    }
}

/// Source and destination files of one conversion.
#[derive(Debug)]
pub struct ScratchPair {
    source: TempPath,
    destination: TempPath,
}

impl ScratchPair {
    /// File holding the diagram text.
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// File the renderer writes the image to.
    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Delete both files, reporting the first failure.
    ///
    /// Both deletions are attempted even when the first one fails.
    pub fn close(self) -> io::Result<()> {
        let source = self.source.close();
        let destination = self.destination.close();
        source.and(destination)
    }
}
