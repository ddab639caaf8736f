// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Error types for revgraph-log

use thiserror::Error;

/// Errors that can occur while producing commit records
#[derive(Debug, Error)]
pub enum LogError {
    /// Error from git2 library
    #[error("Git error: {0}")]
    Git2(#[from] git2::Error),

    /// Repository not found at the specified path
    #[error("Repository not found: {path}")]
    RepositoryNotFound {
        /// The path that was searched for a repository
        path: String,
    },

    /// Invalid commit reference (branch, tag, or SHA)
    #[error("Invalid commit reference: {reference}")]
    InvalidReference {
        /// The reference string that could not be resolved
        reference: String,
    },

    /// The log-listing process could not be launched
    #[error("Failed to start {program}: {source}")]
    ProducerStart {
        /// The program that failed to launch
        program: String,
        /// Underlying spawn error
        source: std::io::Error,
    },

    /// One record in the stream was malformed
    #[error("Malformed log record: {message}")]
    Parse {
        /// Description of the format error
        message: String,
    },

    /// Error reading producer output
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The log process exited unsuccessfully
    #[error("Log process exited with {status}: {stderr}")]
    ProcessExit {
        /// Exit status as reported by the OS
        status: String,
        /// Captured standard error
        stderr: String,
    },
}

impl LogError {
    pub(crate) fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }
}
