//! sprig - a minimal front-end asset pipeline with a live-reload dev server.

mod actor;
mod asset;
mod cli;
mod config;
mod core;
mod embed;
mod entry;
mod logger;
mod pipeline;
mod reload;
mod utils;

use std::sync::Arc;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::ProjectConfig;

fn main() -> Result<()> {
    // Setup global Ctrl+C handler (before any blocking operations)
    core::setup_shutdown_handler()?;

    let cli: &'static Cli = Box::leak(Box::new(Cli::parse()));

    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }

    let config = ProjectConfig::load(cli)?;

    match &cli.command {
        Commands::Build { .. } => cli::build::build_project(&config, false).map(|_| ()),
        Commands::Serve { .. } => cli::serve::serve_project(Arc::new(config)),
    }
}
