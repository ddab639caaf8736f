// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Configuration for the revgraph command
//!
//! This module provides the command-line options: which repository to read,
//! what to list, how much to render and how verbosely to log.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use revgraph_core::{CoordinatorConfig, DEFAULT_PAGE_SIZE, GrowthPolicy, RowOrder, ViewSnapshot};
use revgraph_log::{FilterFields, LogQuery, RefScope, TextFilter};

/// Default number of rows rendered
pub const DEFAULT_ROWS: usize = 40;

/// Which producer lists the history
#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Backend {
    /// Spawn `git log`
    #[default]
    Git,
    /// Walk the repository in-process with libgit2
    Libgit2,
}

/// A field the text filter looks at
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterField {
    /// Author name and email
    Author,
    /// Committer name
    Committer,
    /// Commit message
    Message,
}

/// revgraph - browse repository history as a commit graph
#[derive(Parser, Debug, Clone)]
#[command(name = "revgraph")]
#[command(version, about, long_about = None)]
pub struct Config {
    /// Repository to browse
    ///
    /// Defaults to the current working directory.
    #[arg(short, long, env = "REVGRAPH_REPO")]
    pub repo: Option<PathBuf>,

    /// List every ref instead of the current branch
    #[arg(short, long, default_value = "false")]
    pub all: bool,

    /// Only list commits containing this text (case-insensitive)
    #[arg(short, long)]
    pub filter: Option<String>,

    /// Fields the filter applies to (comma separated)
    ///
    /// Defaults to author, committer and message.
    #[arg(long, value_enum, value_delimiter = ',')]
    pub filter_fields: Vec<FilterField>,

    /// Stop after this many commits
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,

    /// Smallest number of commits requested at a time
    #[arg(long, env = "REVGRAPH_PAGE_SIZE", default_value_t = DEFAULT_PAGE_SIZE)]
    pub page_size: usize,

    /// Number of rows to render
    #[arg(long, default_value_t = DEFAULT_ROWS)]
    pub rows: usize,

    /// First row to render
    #[arg(long, default_value_t = 0)]
    pub skip: usize,

    /// Order rows by committer date instead of listing order
    #[arg(long, default_value = "false")]
    pub date_order: bool,

    /// Producer used to list the history
    #[arg(long, value_enum, default_value_t = Backend::Git)]
    pub backend: Backend,

    /// Git executable used by the `git` backend
    #[arg(long, env = "REVGRAPH_GIT", default_value = "git")]
    pub git: PathBuf,

    /// Print the rendered window as JSON
    #[arg(long, default_value = "false")]
    pub json: bool,

    /// Enable verbose logging (debug level)
    ///
    /// Logs are written to stderr so the rendered graph on stdout stays
    /// clean.
    #[arg(short, long, default_value = "false")]
    pub verbose: bool,

    /// Quiet mode - suppress info-level logs
    ///
    /// Only errors and warnings will be logged.
    #[arg(short, long, default_value = "false")]
    pub quiet: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            repo: None,
            all: false,
            filter: None,
            filter_fields: Vec::new(),
            limit: None,
            page_size: DEFAULT_PAGE_SIZE,
            rows: DEFAULT_ROWS,
            skip: 0,
            date_order: false,
            backend: Backend::Git,
            git: PathBuf::from("git"),
            json: false,
            verbose: false,
            quiet: false,
        }
    }
}

impl Config {
    /// Get the repository path, using current directory as default
    ///
    /// Returns `None` if no repository is specified and the current
    /// directory cannot be determined.
    #[must_use]
    pub fn repo_path(&self) -> Option<PathBuf> {
        self.repo.clone().or_else(|| std::env::current_dir().ok())
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The repository path is specified but doesn't exist
    /// - The page size or the row count is zero
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(ref repo) = self.repo {
            if !repo.exists() {
                return Err(ConfigError::RepoNotFound(repo.clone()));
            }
            if !repo.is_dir() {
                return Err(ConfigError::RepoNotDirectory(repo.clone()));
            }
        }
        if self.page_size == 0 {
            return Err(ConfigError::ZeroPageSize);
        }
        if self.rows == 0 {
            return Err(ConfigError::ZeroRows);
        }
        Ok(())
    }

    /// Get the log level based on verbose/quiet flags
    #[must_use]
    pub fn log_level(&self) -> tracing::Level {
        if self.verbose {
            tracing::Level::DEBUG
        } else if self.quiet {
            tracing::Level::WARN
        } else {
            tracing::Level::INFO
        }
    }

    /// The history query described by the flags
    #[must_use]
    pub fn query(&self) -> LogQuery {
        let mut query = LogQuery {
            scope: if self.all {
                RefScope::AllRefs
            } else {
                RefScope::CurrentBranch
            },
            ..LogQuery::default()
        };
        if let Some(text) = &self.filter {
            query = query.with_filter(TextFilter::with_fields(text, self.filter_fields()));
        }
        if let Some(limit) = self.limit {
            query = query.with_limit(limit);
        }
        query
    }

    /// Fields selected by `--filter-fields`, all of them when none are given
    #[must_use]
    pub fn filter_fields(&self) -> FilterFields {
        if self.filter_fields.is_empty() {
            return FilterFields::default();
        }
        FilterFields {
            author: self.filter_fields.contains(&FilterField::Author),
            committer: self.filter_fields.contains(&FilterField::Committer),
            message: self.filter_fields.contains(&FilterField::Message),
        }
    }

    /// Producer depth growth
    #[must_use]
    pub fn growth_policy(&self) -> GrowthPolicy {
        GrowthPolicy::with_page_size(self.page_size)
    }

    /// Settings for the refresh coordinator
    #[must_use]
    pub fn coordinator_config(&self) -> CoordinatorConfig {
        CoordinatorConfig {
            growth: self.growth_policy(),
            order: if self.date_order {
                RowOrder::CommitDate
            } else {
                RowOrder::Arrival
            },
        }
    }

    /// The window to render
    #[must_use]
    pub fn snapshot(&self) -> ViewSnapshot {
        ViewSnapshot {
            scroll_offset: self.skip,
            viewport_rows: self.rows,
            selected: Vec::new(),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Repository path not found
    #[error("Repository path not found: {0}")]
    RepoNotFound(PathBuf),

    /// Repository path is not a directory
    #[error("Repository path is not a directory: {0}")]
    RepoNotDirectory(PathBuf),

    /// Page size of zero
    #[error("Page size must be at least 1")]
    ZeroPageSize,

    /// Row count of zero
    #[error("Row count must be at least 1")]
    ZeroRows,
}
