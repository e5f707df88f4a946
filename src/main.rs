//! Gobinet - incremental LaTeX builder with a watch mode.

#![allow(dead_code)]

mod cli;
mod compiler;
mod config;
mod freshness;
mod logger;
mod notifier;
mod utils;
mod watch;

use std::sync::Arc;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use compiler::BuildContext;
use config::BuildConfig;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }

    logger::set_verbose(cli.build_args().verbose);

    let config = BuildConfig::load(&cli)?;
    let ctx = Arc::new(BuildContext::new(config));

    match &cli.command {
        Commands::Build { .. } => cli::build::build_all(&ctx),
        Commands::Watch { .. } => cli::watch::watch_sources(ctx),
    }
}
