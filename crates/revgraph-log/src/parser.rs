// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Log record parsing
//!
//! The process producer runs `git log -z` with a machine-readable record
//! format: every record ends with NUL, which cannot occur in a commit, and
//! its fields are split by the unit separator (0x1f):
//!
//! ```text
//! hash US parents US author US email US author-date US committer US committer-date US decorations US body NUL
//! ```
//!
//! Dates are unix seconds, parents are space-separated and decorations are
//! the comma-separated `%D` list produced with `--decorate=full`. The body
//! is the last field, so separators inside it are kept.

use std::io::{BufRead, ErrorKind};

use chrono::{DateTime, Utc};

use crate::commit::{CommitId, CommitRecord, RefLabel};
use crate::error::LogError;

/// End-of-record marker (`git log -z`)
pub const RECORD_TERMINATOR: u8 = 0;

/// Field separator within a record
pub const FIELD_SEPARATOR: char = '\x1f';

/// `--format` argument producing the record layout parsed here
pub const LOG_FORMAT: &str = "--format=%H%x1f%P%x1f%an%x1f%ae%x1f%at%x1f%cn%x1f%ct%x1f%D%x1f%B";

const FIELD_COUNT: usize = 9;

/// Parse a single record (without its terminator)
///
/// # Errors
///
/// Returns `LogError::Parse` if a field is missing or malformed.
pub fn parse_record(raw: &[u8]) -> Result<CommitRecord, LogError> {
    let text = String::from_utf8_lossy(raw);
    let text = text.trim_start_matches(['\n', '\r']);
    let fields: Vec<&str> = text.splitn(FIELD_COUNT, FIELD_SEPARATOR).collect();
    if fields.len() != FIELD_COUNT {
        return Err(LogError::parse(format!(
            "expected {FIELD_COUNT} fields, found {}",
            fields.len()
        )));
    }

    let id = parse_id(fields[0])?;
    let parents = fields[1]
        .split_whitespace()
        .map(parse_id)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(CommitRecord {
        id,
        parents,
        author: fields[2].to_string(),
        author_email: fields[3].to_string(),
        author_date: parse_timestamp(fields[4])?,
        committer: fields[5].to_string(),
        committer_date: parse_timestamp(fields[6])?,
        refs: parse_decorations(fields[7]),
        message: fields[8].trim_end_matches(['\n', '\r']).to_string(),
    })
}

fn parse_id(raw: &str) -> Result<CommitId, LogError> {
    let raw = raw.trim();
    if raw.is_empty() || !raw.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(LogError::parse(format!("invalid commit id {raw:?}")));
    }
    Ok(CommitId::new(raw))
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, LogError> {
    let seconds: i64 = raw
        .trim()
        .parse()
        .map_err(|_| LogError::parse(format!("invalid timestamp {raw:?}")))?;
    DateTime::from_timestamp(seconds, 0)
        .ok_or_else(|| LogError::parse(format!("timestamp out of range {seconds}")))
}

/// Parse a `%D` decoration list (`HEAD -> refs/heads/main, tag: refs/tags/v1`)
#[must_use]
pub fn parse_decorations(raw: &str) -> Vec<RefLabel> {
    let mut labels = Vec::new();
    for item in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        if let Some(target) = item.strip_prefix("HEAD -> ") {
            labels.push(RefLabel::head());
            labels.push(RefLabel::from_full_name(target.trim()));
        } else if let Some(tag) = item.strip_prefix("tag: ") {
            labels.push(RefLabel::from_full_name(tag.trim()));
        } else if item == crate::commit::HEAD_LABEL {
            labels.push(RefLabel::head());
        } else {
            labels.push(RefLabel::from_full_name(item));
        }
    }
    labels
}

/// Splits a byte stream into raw records on the record terminator
pub struct RecordReader<R> {
    inner: R,
    buf: Vec<u8>,
}

impl<R: BufRead> RecordReader<R> {
    /// Wrap a buffered reader
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            buf: Vec::new(),
        }
    }
}

impl<R: BufRead> Iterator for RecordReader<R> {
    type Item = std::io::Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buf.clear();
            match self.inner.read_until(RECORD_TERMINATOR, &mut self.buf) {
                Ok(0) => return None,
                Ok(_) => {
                    if self.buf.last() == Some(&RECORD_TERMINATOR) {
                        self.buf.pop();
                    }
                    // trailing newline after the last record
                    if self.buf.iter().all(u8::is_ascii_whitespace) {
                        continue;
                    }
                    return Some(Ok(std::mem::take(&mut self.buf)));
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => return Some(Err(e)),
            }
        }
    }
}
