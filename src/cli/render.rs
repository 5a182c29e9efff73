//! `render` command: one diagram in, one SVG out.

use crate::{
    cli::RenderArgs,
    config::Config,
    converter::BpmnConverter,
    log,
    raster::RenderingBackend,
};
use anyhow::{Context, Result};
use std::{
    fs,
    io::{self, Read, Write},
};

/// Convert the diagram named by `args` with the configured renderer.
pub fn render_file(config: &Config, args: &RenderArgs) -> Result<()> {
    let converter = BpmnConverter::from_config(config);
    render_with(&converter, args, &mut io::stdin().lock(), &mut io::stdout().lock())
}

/// Convert with an explicit converter and stdio, so tests can swap both.
fn render_with<B: RenderingBackend>(
    converter: &BpmnConverter<B>,
    args: &RenderArgs,
    stdin: &mut impl Read,
    stdout: &mut impl Write,
) -> Result<()> {
    let (content, label) = if args.reads_stdin() {
        let mut content = Vec::new();
        stdin
            .read_to_end(&mut content)
            .context("Failed to read diagram from stdin")?;
        (content, "<stdin>".to_string())
    } else {
        let content = fs::read(&args.input)
            .with_context(|| format!("Failed to read `{}`", args.input.display()))?;
        if !converter.matches_path(&args.input) {
            log!("warning"; "`{}` is not a recognised diagram file, converting anyway", args.input.display());
        }
        (content, args.input.display().to_string())
    };

    let svg = converter
        .convert(&content)
        .with_context(|| format!("Failed to render `{label}`"))?;

    match &args.output {
        Some(output) => {
            if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create `{}`", parent.display()))?;
            }
            fs::write(output, &svg)
                .with_context(|| format!("Failed to write `{}`", output.display()))?;
            log!("render"; "{label} -> {}", output.display());
        }
        None => {
            stdout.write_all(&svg).context("Failed to write SVG to stdout")?;
            stdout.flush()?;
        }
    }

    Ok(())
}
