// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Test utilities for revgraph-core integration tests
//!
//! This module provides utilities for:
//! - Temporary directory management
//! - Git repository scaffolding for tests

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::atomic::{AtomicU32, Ordering};

// ============================================================================
// Temporary Directory Management
// ============================================================================

/// Counter for generating unique test directory names
static TEST_DIR_COUNTER: AtomicU32 = AtomicU32::new(0);

/// A temporary directory that is automatically cleaned up when dropped
pub struct TempTestDir {
    path: PathBuf,
}

impl TempTestDir {
    /// Create a new temporary test directory
    ///
    /// The directory is created under the system temp directory with a
    /// unique name based on the test name and a counter.
    pub fn new(test_name: &str) -> Self {
        let counter = TEST_DIR_COUNTER.fetch_add(1, Ordering::SeqCst);
        let dir_name = format!(
            "revgraph-core-test-{}-{}-{}",
            test_name,
            std::process::id(),
            counter
        );
        let path = std::env::temp_dir().join(dir_name);

        fs::create_dir_all(&path).expect("Failed to create temp test directory");

        Self { path }
    }

    /// Get the path to the temporary directory
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempTestDir {
    fn drop(&mut self) {
        if self.path.exists() {
            let _ = fs::remove_dir_all(&self.path);
        }
    }
}

// ============================================================================
// Git Repository Scaffolding
// ============================================================================

/// A temporary git repository on branch `main`
pub struct TestGitRepo {
    temp_dir: TempTestDir,
}

impl TestGitRepo {
    /// Create and initialize a new test git repository
    pub fn new(test_name: &str) -> Self {
        let repo = Self {
            temp_dir: TempTestDir::new(test_name),
        };
        repo.git(&["init", "-q"]);
        repo.git(&["symbolic-ref", "HEAD", "refs/heads/main"]);
        repo.git(&["config", "user.email", "test@example.com"]);
        repo.git(&["config", "user.name", "Test Author"]);
        repo
    }

    /// Get the path to the repository
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Run a git command in the repository and return its trimmed stdout
    pub fn git(&self, args: &[&str]) -> String {
        let output = Command::new("git")
            .current_dir(self.temp_dir.path())
            .args(args)
            .output()
            .expect("Failed to run git command");

        if !output.status.success() {
            panic!(
                "Git command failed: git {}\nstderr: {}",
                args.join(" "),
                String::from_utf8_lossy(&output.stderr)
            );
        }
        String::from_utf8_lossy(&output.stdout).trim().to_string()
    }

    /// Create an empty commit with the given message
    pub fn commit(&self, message: &str) -> String {
        self.git(&["commit", "-q", "--allow-empty", "-m", message]);
        self.rev_parse("HEAD")
    }

    /// Resolve a revision to its full commit id
    pub fn rev_parse(&self, rev: &str) -> String {
        self.git(&["rev-parse", rev])
    }

    /// main: A - C - D(merge), topic: A - B
    pub fn with_merge(test_name: &str) -> Self {
        let repo = Self::new(test_name);
        repo.commit("A: initial");
        repo.git(&["checkout", "-q", "-b", "topic"]);
        repo.commit("B: topic work");
        repo.git(&["checkout", "-q", "main"]);
        repo.commit("C: mainline work");
        repo.git(&["merge", "-q", "--no-ff", "topic", "-m", "D: merge topic"]);
        repo
    }
}
