//! pagesync - keep a rendered page in sync with its server.

#![allow(dead_code)]

mod cli;
mod config;
mod core;
mod dom;
mod live;
mod logger;
mod morph;
mod mount;
mod nav;
mod page;
mod scheduler;
mod transport;

use anyhow::{Context, Result};
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::PageConfig;

fn main() -> Result<()> {
    // Setup global Ctrl+C handler (before any blocking operations)
    core::setup_shutdown_handler()?;

    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    logger::set_verbose(cli.verbose);

    let config = PageConfig::load(cli.config.as_deref())?;

    match &cli.command {
        Commands::Morph { live, target, push } => cli::morph::run(live, target, *push),
        Commands::Open { url } => block_on(cli::open::run(&config, url)),
        Commands::Watch { url, reload } => block_on(cli::watch::run(&config, url, *reload)),
    }
}

/// Drive a command on a single-threaded runtime.
fn block_on<F: Future<Output = Result<()>>>(future: F) -> Result<()> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?
        .block_on(future)
}
