// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! revgraph: browse repository history as a commit graph
//!
//! Lists the history of a repository, lays it out into lanes and prints the
//! requested window of rows as text or JSON.

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use revgraph::browse::{load_window, producer};
use revgraph::config::Config;
use revgraph::render::{to_json, to_text};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::parse();

    // Logs go to stderr so stdout carries only the rendered window
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(config.log_level().into()),
        )
        .init();

    config.validate().context("Invalid configuration")?;
    let repo = config
        .repo_path()
        .context("Could not determine the repository path")?;

    info!(repo = %repo.display(), backend = ?config.backend, "Starting revgraph");

    let view = load_window(&config, producer(&config, repo)).await?;
    if config.json {
        println!("{}", to_json(&view)?);
    } else {
        print!("{}", to_text(&view));
    }
    Ok(())
}
