// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! revgraph-core: incremental commit graph for revgraph
//!
//! Records from a [`revgraph_log::CommitStreamProducer`] are folded into a
//! [`Graph`] as they arrive, laid out into lanes on demand and exposed to a
//! virtualized list through [`VirtualizedRowSource`]. A
//! [`RefreshCoordinator`] runs one producer per refresh cycle and keeps the
//! last good graph when a refresh fails.

#![warn(missing_docs)]

//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use revgraph_core::{CoordinatorConfig, RefreshCoordinator, TriggerReason, ViewSnapshot};
//! use revgraph_log::{GitLogProducer, LogQuery};
//!
//! let mut coordinator = RefreshCoordinator::new(
//!     Arc::new(GitLogProducer::new(".")),
//!     LogQuery::all_refs(),
//!     CoordinatorConfig::default(),
//! );
//! coordinator.trigger(TriggerReason::InitialLoad, ViewSnapshot::top(40));
//! let outcome = coordinator.pump();
//! println!("{} rows so far", coordinator.rows().row_count());
//! # let _ = outcome;
//! ```

pub mod coordinator;
pub mod error;
pub mod graph;
pub mod layout;
pub mod notify;
pub mod rows;

pub use coordinator::{
    CoordinatorConfig, CoordinatorState, CycleOutcome, CycleStats, PumpOutcome, RefreshCoordinator,
    RestoredView, TriggerReason, ViewSnapshot,
};
pub use error::{CoreError, GraphIntegrityWarning};
pub use graph::{Graph, GraphBuilder, GraphNode, Integration, RowOrder};
pub use layout::{LaneAllocator, LayoutEngine, RowLayout};
pub use notify::RowsChanged;
pub use rows::{DEFAULT_PAGE_SIZE, GrowthPolicy, RowSlot, VirtualizedRowSource};
