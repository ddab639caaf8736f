// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! In-process producer using `git2`
//!
//! This walks the repository with libgit2 instead of spawning `git log`. It
//! honours the same query, depth budget and cancellation contract as
//! [`crate::GitLogProducer`].

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone, Utc};
use git2::{Oid, Repository, Sort};
use tracing::{debug, info};

use crate::commit::{CommitId, CommitRecord, RefLabel};
use crate::error::LogError;
use crate::producer::{
    CommitStreamProducer, DemandGate, EventSink, ProducerEvent, ProducerHandle, StreamEnd, drain,
    spawn_producer,
};
use crate::query::{LogQuery, RefScope};

/// Repository opened for one walk
struct GitRepo {
    repo: Repository,
}

impl GitRepo {
    /// Discover and open the repository containing `path`
    fn discover(path: &Path) -> Result<Self, LogError> {
        let repo = Repository::discover(path).map_err(|_| LogError::RepositoryNotFound {
            path: path.display().to_string(),
        })?;
        Ok(Self { repo })
    }

    /// Map every commit a ref points at to its labels, including `HEAD`
    fn ref_labels(&self) -> HashMap<Oid, Vec<RefLabel>> {
        let mut labels: HashMap<Oid, Vec<RefLabel>> = HashMap::new();

        if let Some(oid) = self.repo.head().ok().and_then(|h| h.target()) {
            labels.entry(oid).or_default().push(RefLabel::head());
        }

        if let Ok(references) = self.repo.references() {
            for reference in references.flatten() {
                let Some(name) = reference.name() else {
                    continue;
                };
                if let Ok(commit) = reference.peel_to_commit() {
                    labels
                        .entry(commit.id())
                        .or_default()
                        .push(RefLabel::from_full_name(name));
                }
            }
        }
        labels
    }

    /// Iterate the history for `scope` lazily, newest first
    fn walk(
        &self,
        scope: RefScope,
    ) -> Result<impl Iterator<Item = Result<CommitRecord, LogError>> + '_, LogError> {
        let mut revwalk = self.repo.revwalk()?;
        revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME)?;
        match scope {
            RefScope::CurrentBranch => {
                revwalk
                    .push_head()
                    .map_err(|_| LogError::InvalidReference {
                        reference: "HEAD".to_string(),
                    })?;
            }
            RefScope::AllRefs => {
                revwalk.push_glob("*")?;
                // a detached HEAD is not under refs/
                let _ = revwalk.push_head();
            }
        }

        let mut labels = self.ref_labels();
        Ok(revwalk.map(move |oid| {
            let oid = oid?;
            let git_commit = self.repo.find_commit(oid)?;
            Ok(extract_record(&git_commit, labels.remove(&oid).unwrap_or_default()))
        }))
    }
}

fn timestamp(time: git2::Time) -> DateTime<Utc> {
    Utc.timestamp_opt(time.seconds(), 0)
        .single()
        .unwrap_or_else(Utc::now)
}

/// Convert a git2 commit into a record
fn extract_record(git_commit: &git2::Commit<'_>, refs: Vec<RefLabel>) -> CommitRecord {
    let author = git_commit.author();
    let committer = git_commit.committer();

    CommitRecord {
        id: git_commit.id().into(),
        parents: git_commit.parent_ids().map(CommitId::from).collect(),
        author: author.name().unwrap_or("Unknown").to_string(),
        author_email: author.email().unwrap_or("").to_string(),
        committer: committer.name().unwrap_or("Unknown").to_string(),
        author_date: timestamp(author.when()),
        committer_date: timestamp(git_commit.time()),
        message: git_commit.message().unwrap_or("").trim_end().to_string(),
        refs,
    }
}

/// Lists commits by walking the repository with libgit2
#[derive(Debug, Clone)]
pub struct RevwalkProducer {
    path: PathBuf,
}

impl RevwalkProducer {
    /// Producer for the repository containing `path`
    #[must_use]
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl CommitStreamProducer for RevwalkProducer {
    fn start(
        &self,
        query: &LogQuery,
        initial_depth: usize,
        sink: EventSink,
    ) -> Result<ProducerHandle, LogError> {
        let repo = GitRepo::discover(&self.path)?;
        info!(
            generation = %sink.generation(),
            path = %self.path.display(),
            "Started revwalk"
        );

        let gate = DemandGate::new(initial_depth);
        let handle = ProducerHandle::new(sink.generation(), gate.clone());
        let query = query.clone();

        spawn_producer("revgraph-revwalk", move || {
            let terminal = match repo.walk(query.scope) {
                Ok(records) => match drain(records, &query, &gate, &sink) {
                    StreamEnd::Exhausted(count) | StreamEnd::LimitReached(count) => {
                        ProducerEvent::Completed { count }
                    }
                    StreamEnd::Cancelled => ProducerEvent::Cancelled,
                    StreamEnd::Failed(error) => ProducerEvent::Failed(error),
                },
                Err(error) => ProducerEvent::Failed(error),
            };
            debug!(generation = %sink.generation(), ?terminal, "Revwalk finished");
            sink.send(terminal);
        })?;

        Ok(handle)
    }
}
