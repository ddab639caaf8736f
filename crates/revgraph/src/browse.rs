// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! One-shot history load for the command line
//!
//! Runs a single refresh cycle until the requested window is filled or the
//! history ends, then renders the window.

use std::path::PathBuf;
use std::sync::Arc;

use revgraph_core::{CoreError, RefreshCoordinator, TriggerReason};
use revgraph_log::{CommitStreamProducer, GitLogProducer, RevwalkProducer};
use tracing::{debug, info};

use crate::config::{Backend, Config};
use crate::render::{WindowView, window};

/// Producer selected by `--backend`
#[must_use]
pub fn producer(config: &Config, repo: PathBuf) -> Arc<dyn CommitStreamProducer> {
    match config.backend {
        Backend::Git => Arc::new(GitLogProducer::new(repo).with_program(&config.git)),
        Backend::Libgit2 => Arc::new(RevwalkProducer::new(repo)),
    }
}

/// Load enough history to fill the configured window
///
/// # Errors
///
/// Returns the cycle's error if the history could not be listed.
pub async fn load_window(
    config: &Config,
    producer: Arc<dyn CommitStreamProducer>,
) -> Result<WindowView, CoreError> {
    let mut coordinator =
        RefreshCoordinator::new(producer, config.query(), config.coordinator_config());
    let snapshot = config.snapshot();
    let needed = snapshot.scroll_offset.saturating_add(snapshot.viewport_rows);
    coordinator.trigger(TriggerReason::InitialLoad, snapshot);

    while coordinator.is_streaming() && coordinator.rows().row_count() < needed {
        let outcome = coordinator.next_event().await;
        debug!(
            integrated = outcome.integrated,
            rows = coordinator.rows().row_count(),
            "Pumped events"
        );
    }
    if let Some(error) = coordinator.take_error() {
        return Err(error);
    }

    for warning in coordinator.integrity_warnings() {
        debug!(%warning, "Graph integrity");
    }
    let complete = !coordinator.is_streaming();
    info!(rows = coordinator.rows().row_count(), complete, "Window ready");
    Ok(window(coordinator.rows(), config.skip, config.rows, complete))
}
