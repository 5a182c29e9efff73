//! Diagram discovery (pure, no side effects).
//!
//! Every regular file under the source root whose source-relative path
//! starts with the configured asset prefix and whose extension matches
//! becomes one [`DiagramRoute`]:
//!
//! ```text
//! source/
//! ├── assets/bpmn/
//! │   ├── order.bpmn          -> output/assets/bpmn/order.svg
//! │   ├── notes.md            -> (skipped, not a diagram)
//! │   └── flows/
//! │       └── refund.BPMN     -> output/assets/bpmn/flows/refund.svg
//! ├── posts/draft.bpmn        -> (skipped, outside the asset prefix)
//! └── _site/                  -> (skipped, output directory)
//! ```

use crate::config::Config;
use crate::converter::BpmnConverter;
use crate::raster::RenderingBackend;
use jwalk::WalkDir;
use std::path::{Path, PathBuf};

/// A diagram found under the asset directory and where its SVG goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagramRoute {
    /// Absolute path of the diagram.
    pub source: PathBuf,
    /// Directory of the diagram, relative to the source root.
    pub dir: PathBuf,
    /// File name of the diagram.
    pub name: String,
    /// Absolute path of the SVG to write.
    pub output: PathBuf,
}

/// Scan the asset directory for diagrams
///
/// Only the asset directory is walked, which is the same as filtering all
/// source files by the asset prefix. Hidden entries are skipped. Results are
/// sorted by source path.
pub fn scan_diagrams<B: RenderingBackend>(
    config: &Config,
    converter: &BpmnConverter<B>,
) -> Vec<DiagramRoute> {
    let source_root = &config.build.source;
    let output_root = &config.build.output;
    let assets_dir = config.build.assets_dir();

    if !assets_dir.is_dir() {
        return Vec::new();
    }

    let mut routes: Vec<_> = WalkDir::new(&assets_dir)
        .sort(true)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| e.path())
        .filter(|path| !path.starts_with(output_root))
        .filter(|path| converter.matches_path(path))
        .filter_map(|path| route_for(&path, source_root, output_root, converter))
        .collect();

    routes.sort_by(|a, b| a.source.cmp(&b.source));
    routes
}

/// Build the route of `path`, or `None` when it lies outside the source.
fn route_for<B: RenderingBackend>(
    path: &Path,
    source_root: &Path,
    output_root: &Path,
    converter: &BpmnConverter<B>,
) -> Option<DiagramRoute> {
    let rel = path.strip_prefix(source_root).ok()?;

    let name = rel.file_name()?.to_string_lossy().into_owned();
    let dir = rel.parent().map(Path::to_path_buf).unwrap_or_default();
    let output = output_root.join(converter.output_path(rel));

    Some(DiagramRoute {
        source: path.to_path_buf(),
        dir,
        name,
        output,
    })
}
