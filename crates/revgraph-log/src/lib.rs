// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! revgraph-log: commit stream producers for revgraph
//!
//! This library crate lists repository history as a lazily produced stream of
//! [`CommitRecord`]s, either by spawning `git log` ([`GitLogProducer`]) or by
//! walking the repository with libgit2 ([`RevwalkProducer`]).

#![warn(missing_docs)]

//! # Example
//!
//! ```no_run
//! use revgraph_log::{CommitStreamProducer, EventSink, Generation, GitLogProducer, LogQuery};
//!
//! let (tx, mut rx) = revgraph_log::event_channel();
//! let producer = GitLogProducer::new(".");
//! let handle = producer
//!     .start(&LogQuery::all_refs(), 100, EventSink::new(Generation(1), tx))
//!     .expect("start git log");
//!
//! while let Some(tagged) = rx.blocking_recv() {
//!     if tagged.event.is_terminal() {
//!         break;
//!     }
//! }
//! handle.cancel();
//! ```

pub mod commit;
pub mod error;
pub mod git_log;
pub mod parser;
pub mod producer;
pub mod query;
pub mod revwalk;

pub use commit::{CommitId, CommitRecord, RefKind, RefLabel};
pub use error::LogError;
pub use git_log::GitLogProducer;
pub use producer::{
    CommitStreamProducer, DemandGate, EventReceiver, EventSender, EventSink, Generation,
    ProducerEvent, ProducerHandle, Tagged, event_channel,
};
pub use query::{FilterFields, LogQuery, RefScope, TextFilter};
pub use revwalk::RevwalkProducer;

