//! bpmn-svg - Render the BPMN diagrams of a static blog to SVG.

mod cli;
mod config;
mod converter;
mod core;
mod freshness;
mod logger;
mod raster;
mod scan;
mod utils;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::Config;

fn main() -> Result<()> {
    // Setup global Ctrl+C handler (before any renderer is spawned)
    core::setup_shutdown_handler()?;

    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    logger::set_verbose(cli.verbose);

    let config = Config::load(&cli)?;

    match &cli.command {
        Commands::Render { args } => cli::render::render_file(&config, args),
        Commands::Build { args } => cli::build::build_site(&config, args).map(|_| ()),
    }
}
