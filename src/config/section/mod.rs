//! Configuration section definitions.
//!
//! Each module corresponds to a section in `bpmn-svg.toml`:
//!
//! | Module   | TOML Section | Purpose                              |
//! |----------|--------------|--------------------------------------|
//! | `build`  | `[build]`    | Discovery and output paths           |
//! | `render` | `[render]`   | Renderer command, failure policy     |

mod build;
mod render;

pub use build::BuildConfig;
pub use render::RenderConfig;
