// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Error types for revgraph-core

use revgraph_log::{CommitId, LogError};
use thiserror::Error;

/// A refresh cycle that could not produce a history view
#[derive(Debug, Error)]
pub enum CoreError {
    /// The producer could not be started
    #[error("Could not start history listing: {0}")]
    StartFailed(#[source] LogError),

    /// The producer failed after starting
    #[error("History listing failed: {0}")]
    ProducerFailed(#[source] LogError),
}

/// Tolerated inconsistencies in the integrated graph
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphIntegrityWarning {
    /// The same commit id was integrated more than once
    #[error("Duplicate commit {id}")]
    DuplicateCommit {
        /// The repeated id
        id: CommitId,
    },

    /// A parent was referenced but never integrated
    #[error("Commit {child} references unresolved parent {parent}")]
    BoundaryParent {
        /// The referencing commit
        child: CommitId,
        /// The missing parent
        parent: CommitId,
    },
}
