//! Diagram converter: which files are diagrams, what they become, and the
//! conversion itself.

use crate::config::Config;
use crate::raster::{CommandBackend, DiagramRasterizer, RenderError, RenderingBackend};
use std::path::{Path, PathBuf};

/// Extension of every converted file.
pub const OUTPUT_EXT: &str = ".svg";

/// Converts diagram files (`.bpmn` by default) to SVG.
pub struct BpmnConverter<B> {
    rasterizer: DiagramRasterizer<B>,
    extension: String,
}

impl<B: RenderingBackend> BpmnConverter<B> {
    /// Converter for `.bpmn` files.
    pub fn new(rasterizer: DiagramRasterizer<B>) -> Self {
        Self {
            rasterizer,
            extension: "bpmn".to_string(),
        }
    }

    /// Recognise `extension` (with or without the leading dot) instead.
    pub fn extension(mut self, extension: &str) -> Self {
        self.extension = extension.trim_start_matches('.').to_string();
        self
    }

    /// Case-insensitive match of `ext` (`".bpmn"` or `"bpmn"`).
    pub fn matches(&self, ext: &str) -> bool {
        ext.trim_start_matches('.')
            .eq_ignore_ascii_case(&self.extension)
    }

    /// Whether the file name at `path` carries the diagram extension.
    pub fn matches_path(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.matches(ext))
    }

    /// Output extension for an accepted input, independent of its casing.
    pub fn output_ext(&self, _ext: &str) -> &'static str {
        OUTPUT_EXT
    }

    /// `path` with its extension replaced by the output extension.
    pub fn output_path(&self, path: &Path) -> PathBuf {
        path.with_extension(OUTPUT_EXT.trim_start_matches('.'))
    }

    /// Render diagram text to SVG bytes.
    pub fn convert(&self, content: &[u8]) -> Result<Vec<u8>, RenderError> {
        self.rasterizer.render(content).map(|image| image.into_bytes())
    }
}

impl BpmnConverter<CommandBackend> {
    /// Converter running the configured renderer from the project root.
    pub fn from_config(config: &Config) -> Self {
        let backend = CommandBackend::from_config(&config.render, &config.root);
        let rasterizer = DiagramRasterizer::new(backend)
            .scratch(config.render.scratch())
            .policy(config.render.on_failure);
        Self::new(rasterizer).extension(&config.build.extension)
    }
}
