// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! CLI tests for revgraph's flags
//!
//! These tests verify flag parsing, defaults and the values derived from
//! them (query, growth policy, logging level).

use std::path::PathBuf;

use clap::Parser;
use revgraph::config::{Backend, Config, ConfigError, FilterField};
use revgraph_core::RowOrder;
use revgraph_log::RefScope;
use similar_asserts::assert_eq;
use tracing::Level;

// ============================================================================
// Logging flags
// ============================================================================

#[test]
fn test_verbose_short_flag_v() {
    let config = Config::try_parse_from(["revgraph", "-v"]).expect("parse should succeed");
    assert!(config.verbose);
    assert!(!config.quiet);
    assert_eq!(config.log_level(), Level::DEBUG);
}

#[test]
fn test_quiet_long_flag() {
    let config = Config::try_parse_from(["revgraph", "--quiet"]).expect("parse should succeed");
    assert!(config.quiet);
    assert_eq!(config.log_level(), Level::WARN);
}

#[test]
fn test_verbose_and_quiet_flags_both_parse() {
    let config = Config::try_parse_from(["revgraph", "-q", "-v"]).expect("parse should succeed");
    // Verbose wins
    assert_eq!(config.log_level(), Level::DEBUG);
}

#[test]
fn test_verbose_flag_value_syntax_not_supported() {
    let result = Config::try_parse_from(["revgraph", "--verbose=true"]);
    assert!(result.is_err(), "Boolean flags don't support =value syntax");
}

#[test]
fn test_multiple_verbose_flags_conflicts() {
    let result = Config::try_parse_from(["revgraph", "-v", "-v"]);
    assert!(result.is_err(), "Repeated flags should conflict");
}

// ============================================================================
// History selection
// ============================================================================

#[test]
fn test_no_flags_lists_current_branch() {
    let config = Config::try_parse_from(["revgraph"]).expect("parse should succeed");
    let query = config.query();
    assert_eq!(query.scope, RefScope::CurrentBranch);
    assert!(query.filter.is_none());
    assert_eq!(query.limit, None);
    assert_eq!(config.backend, Backend::Git);
    assert_eq!(config.git, PathBuf::from("git"));
}

#[test]
fn test_all_filter_and_limit() {
    let config = Config::try_parse_from([
        "revgraph", "--all", "-f", "Topic", "-n", "25", "--repo", "/tmp",
    ])
    .expect("parse should succeed");

    let query = config.query();
    assert_eq!(query.scope, RefScope::AllRefs);
    assert_eq!(query.limit, Some(25));
    assert_eq!(query.filter.map(|f| f.text().to_string()), Some("topic".to_string()));
    assert_eq!(config.repo, Some(PathBuf::from("/tmp")));
}

#[test]
fn test_filter_fields_are_comma_separated() {
    let config = Config::try_parse_from([
        "revgraph",
        "--filter",
        "alice",
        "--filter-fields",
        "author,committer",
    ])
    .expect("parse should succeed");

    assert_eq!(
        config.filter_fields,
        vec![FilterField::Author, FilterField::Committer]
    );
    let fields = config.filter_fields();
    assert!(fields.author && fields.committer && !fields.message);
}

#[test]
fn test_unknown_filter_field_is_rejected() {
    let result = Config::try_parse_from(["revgraph", "--filter-fields", "subject"]);
    assert!(result.is_err());
}

#[test]
fn test_backend_libgit2() {
    let config =
        Config::try_parse_from(["revgraph", "--backend", "libgit2"]).expect("parse should succeed");
    assert_eq!(config.backend, Backend::Libgit2);
}

// ============================================================================
// Window and growth
// ============================================================================

#[test]
fn test_window_flags() {
    let config = Config::try_parse_from([
        "revgraph",
        "--rows",
        "10",
        "--skip",
        "30",
        "--page-size",
        "64",
        "--date-order",
    ])
    .expect("parse should succeed");

    let snapshot = config.snapshot();
    assert_eq!(snapshot.scroll_offset, 30);
    assert_eq!(snapshot.viewport_rows, 10);
    assert_eq!(config.growth_policy().page_size, 64);
    assert_eq!(config.coordinator_config().order, RowOrder::CommitDate);
}

#[test]
fn test_zero_rows_fails_validation() {
    let config = Config::try_parse_from(["revgraph", "--rows", "0"]).expect("parse should succeed");
    assert!(matches!(config.validate(), Err(ConfigError::ZeroRows)));
}

#[test]
fn test_negative_limit_is_rejected() {
    let result = Config::try_parse_from(["revgraph", "--limit", "-3"]);
    assert!(result.is_err());
}

#[test]
fn test_repo_must_be_a_directory() {
    let file = std::env::temp_dir().join(format!("revgraph-not-a-dir-{}", std::process::id()));
    std::fs::write(&file, "x").expect("write file");
    let config = Config {
        repo: Some(file.clone()),
        ..Default::default()
    };
    let result = config.validate();
    let _ = std::fs::remove_file(&file);
    assert!(matches!(result, Err(ConfigError::RepoNotDirectory(_))));
}
