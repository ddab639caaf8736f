// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Commit record types produced by the log stream

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Name of the label attached to the commit currently checked out
pub const HEAD_LABEL: &str = "HEAD";

/// Opaque commit identifier, compared by value
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommitId(Arc<str>);

impl CommitId {
    /// Create an identifier from its textual form
    #[must_use]
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(Arc::from(id.as_ref()))
    }

    /// The full identifier
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The abbreviated identifier (first 7 characters)
    #[must_use]
    pub fn short(&self) -> &str {
        let end = self
            .0
            .char_indices()
            .nth(7)
            .map_or(self.0.len(), |(idx, _)| idx);
        &self.0[..end]
    }
}

impl fmt::Display for CommitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CommitId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for CommitId {
    fn from(id: String) -> Self {
        Self(Arc::from(id))
    }
}

impl From<git2::Oid> for CommitId {
    fn from(oid: git2::Oid) -> Self {
        Self::from(oid.to_string())
    }
}

/// Kind of a named ref pointing at a commit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RefKind {
    /// `refs/tags/*`
    Tag,
    /// `refs/heads/*`
    LocalBranch,
    /// `refs/remotes/*`
    RemoteBranch,
    /// Anything else (`HEAD`, stashes, notes, ...)
    Other,
}

/// A branch, tag or other ref attached to a commit
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RefLabel {
    /// Full ref name, e.g. `refs/heads/main`
    pub name: String,
    /// Classification of the ref
    pub kind: RefKind,
}

impl RefLabel {
    /// Classify a full ref name by its namespace
    #[must_use]
    pub fn from_full_name(name: &str) -> Self {
        let kind = if name.starts_with("refs/tags/") {
            RefKind::Tag
        } else if name.starts_with("refs/heads/") {
            RefKind::LocalBranch
        } else if name.starts_with("refs/remotes/") {
            RefKind::RemoteBranch
        } else {
            RefKind::Other
        };
        Self {
            name: name.to_string(),
            kind,
        }
    }

    /// The label marking the current checkout
    #[must_use]
    pub fn head() -> Self {
        Self {
            name: HEAD_LABEL.to_string(),
            kind: RefKind::Other,
        }
    }

    /// Whether this label marks the current checkout
    #[must_use]
    pub fn is_head(&self) -> bool {
        self.kind == RefKind::Other && self.name == HEAD_LABEL
    }

    /// Name without the namespace prefix, for display
    #[must_use]
    pub fn short_name(&self) -> &str {
        ["refs/heads/", "refs/remotes/", "refs/tags/"]
            .iter()
            .find_map(|prefix| self.name.strip_prefix(prefix))
            .unwrap_or(&self.name)
    }
}

/// One commit as emitted by a producer. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRecord {
    /// Commit identifier
    pub id: CommitId,
    /// Parent identifiers, first parent first
    pub parents: Vec<CommitId>,
    /// Author name
    pub author: String,
    /// Author email
    pub author_email: String,
    /// Committer name
    pub committer: String,
    /// Author timestamp
    pub author_date: DateTime<Utc>,
    /// Committer timestamp
    pub committer_date: DateTime<Utc>,
    /// Full commit message
    pub message: String,
    /// Refs pointing at this commit
    pub refs: Vec<RefLabel>,
}

impl CommitRecord {
    /// Check if this is a merge commit (has multiple parents)
    #[must_use]
    pub fn is_merge(&self) -> bool {
        self.parents.len() > 1
    }

    /// Check if this is a root commit (has no parents)
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.parents.is_empty()
    }

    /// Get the first line of the commit message (subject)
    #[must_use]
    pub fn subject(&self) -> &str {
        self.message.lines().next().unwrap_or("")
    }

    /// Whether `HEAD` points at this commit
    #[must_use]
    pub fn is_current_checkout(&self) -> bool {
        self.refs.iter().any(RefLabel::is_head)
    }
}
