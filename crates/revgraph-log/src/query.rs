// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Query specification handed to a producer

use crate::commit::CommitRecord;

/// Which refs the history walk starts from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefScope {
    /// Every branch, tag and remote ref
    AllRefs,
    /// Only the history reachable from `HEAD`
    #[default]
    CurrentBranch,
}

/// Which commit fields a text filter is matched against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterFields {
    /// Match against the author name and email
    pub author: bool,
    /// Match against the committer name
    pub committer: bool,
    /// Match against the commit message
    pub message: bool,
}

impl Default for FilterFields {
    fn default() -> Self {
        Self {
            author: true,
            committer: true,
            message: true,
        }
    }
}

/// A free-text filter, matched case-insensitively as a substring
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextFilter {
    /// Lowercased needle
    needle: String,
    /// Fields the needle is matched against
    pub fields: FilterFields,
}

impl TextFilter {
    /// Create a filter over all fields
    #[must_use]
    pub fn new(text: &str) -> Self {
        Self::with_fields(text, FilterFields::default())
    }

    /// Create a filter over a chosen set of fields
    #[must_use]
    pub fn with_fields(text: &str, fields: FilterFields) -> Self {
        Self {
            needle: text.trim().to_lowercase(),
            fields,
        }
    }

    /// The normalised filter text
    #[must_use]
    pub fn text(&self) -> &str {
        &self.needle
    }

    /// A record passes if any enabled field contains the text
    #[must_use]
    pub fn matches(&self, record: &CommitRecord) -> bool {
        if self.needle.is_empty() {
            return true;
        }
        let hit = |haystack: &str| haystack.to_lowercase().contains(&self.needle);

        (self.fields.author && (hit(&record.author) || hit(&record.author_email)))
            || (self.fields.committer && hit(&record.committer))
            || (self.fields.message && hit(&record.message))
    }
}

/// What a producer should list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogQuery {
    /// Starting refs
    pub scope: RefScope,
    /// Optional text filter
    pub filter: Option<TextFilter>,
    /// Maximum number of records to emit (None = unbounded)
    pub limit: Option<usize>,
}

impl LogQuery {
    /// Query for the current branch, unfiltered
    #[must_use]
    pub fn current_branch() -> Self {
        Self::default()
    }

    /// Query for every ref, unfiltered
    #[must_use]
    pub fn all_refs() -> Self {
        Self {
            scope: RefScope::AllRefs,
            ..Default::default()
        }
    }

    /// Limit the number of emitted records
    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Apply a text filter
    #[must_use]
    pub fn with_filter(mut self, filter: TextFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Whether a record passes the query's filter
    #[must_use]
    pub fn matches(&self, record: &CommitRecord) -> bool {
        self.filter.as_ref().is_none_or(|f| f.matches(record))
    }

    /// The effective record limit
    #[must_use]
    pub fn effective_limit(&self) -> usize {
        self.limit.unwrap_or(usize::MAX)
    }
}
