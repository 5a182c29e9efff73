//! Mtime-based freshness detection for converted diagrams.
//!
//! The SVG next to a diagram is written by this tool, so comparing its
//! modification time with the source's is enough to decide whether a
//! rebuild can skip it.

use std::path::Path;
use std::time::SystemTime;

/// Check if output file is at least as new as the given source mtime
///
/// Returns `true` if the output exists and is not older than `source_mtime`,
/// meaning the output is fresh and conversion can be skipped. An unknown
/// source mtime is never fresh.
pub fn is_output_fresh(output: &Path, source_mtime: Option<SystemTime>) -> bool {
    let Some(source_time) = source_mtime else {
        return false;
    };

    get_mtime(output).is_some_and(|output_time| output_time >= source_time)
}

/// Get the modification time of a file
///
/// Returns `None` if the file doesn't exist or mtime cannot be read
pub fn get_mtime(path: &Path) -> Option<SystemTime> {
    path.metadata().and_then(|m| m.modified()).ok()
}
