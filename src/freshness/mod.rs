//! Freshness detection: mtime comparison between a diagram and its SVG.

pub mod mtime;

pub use mtime::{get_mtime, is_output_fresh};
