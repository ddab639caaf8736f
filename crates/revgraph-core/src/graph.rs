// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Incremental commit graph
//!
//! [`GraphBuilder`] integrates records in whatever order a producer emits
//! them. Parent links to commits that have not arrived yet are kept as
//! boundary stubs and resolved when (if) the parent shows up. Rows are
//! assigned in batches by [`GraphBuilder::finalize`]; an assigned row never
//! moves again.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use revgraph_log::{CommitId, CommitRecord};
use tracing::{debug, warn};

use crate::error::GraphIntegrityWarning;
use crate::layout::{LaneAllocator, RowLayout};

/// Order in which newly integrated commits are appended to the rows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RowOrder {
    /// The order the producer emitted them
    #[default]
    Arrival,
    /// Newest committer date first within each batch, arrival order on ties
    CommitDate,
}

/// Result of integrating one record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Integration {
    /// A new node was added
    Inserted,
    /// The id was already present; the graph is unchanged
    Duplicate,
}

/// One commit in the graph
#[derive(Debug, Clone)]
pub struct GraphNode {
    record: Arc<CommitRecord>,
    lane: Option<usize>,
    children: BTreeSet<CommitId>,
}

impl GraphNode {
    /// Commit id
    #[must_use]
    pub fn id(&self) -> &CommitId {
        &self.record.id
    }

    /// The record this node was built from
    #[must_use]
    pub fn record(&self) -> &CommitRecord {
        &self.record
    }

    /// Parent ids, first parent first
    #[must_use]
    pub fn parents(&self) -> &[CommitId] {
        &self.record.parents
    }

    /// Integrated commits listing this one as a parent
    #[must_use]
    pub fn children(&self) -> &BTreeSet<CommitId> {
        &self.children
    }

    /// Lane, once the row has been laid out
    #[must_use]
    pub fn lane(&self) -> Option<usize> {
        self.lane
    }

    /// Whether this is the commit `HEAD` points at
    #[must_use]
    pub fn is_current_checkout(&self) -> bool {
        self.record.is_current_checkout()
    }
}

/// The integrated commits of one refresh cycle
#[derive(Debug, Clone, Default)]
pub struct Graph {
    nodes: HashMap<CommitId, GraphNode>,
    /// Children of parents that have not been integrated
    boundaries: HashMap<CommitId, BTreeSet<CommitId>>,
    arrival: Vec<CommitId>,
    rows: Vec<CommitId>,
    row_index: HashMap<CommitId, usize>,
    layouts: Vec<RowLayout>,
}

impl Graph {
    /// Number of integrated commits
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether nothing has been integrated
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of commits with an assigned row
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of rows with a lane layout
    #[must_use]
    pub fn laid_out(&self) -> usize {
        self.layouts.len()
    }

    /// Look up a commit by id
    #[must_use]
    pub fn node(&self, id: &CommitId) -> Option<&GraphNode> {
        self.nodes.get(id)
    }

    /// Whether `id` has been integrated
    #[must_use]
    pub fn contains(&self, id: &CommitId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Commit at `row`
    #[must_use]
    pub fn row(&self, row: usize) -> Option<&GraphNode> {
        self.rows.get(row).and_then(|id| self.nodes.get(id))
    }

    /// Lane layout of `row`, if it has been laid out
    #[must_use]
    pub fn row_layout(&self, row: usize) -> Option<&RowLayout> {
        self.layouts.get(row)
    }

    /// Row assigned to `id`
    #[must_use]
    pub fn row_of(&self, id: &CommitId) -> Option<usize> {
        self.row_index.get(id).copied()
    }

    /// Children of `id`, whether or not `id` itself has been integrated
    #[must_use]
    pub fn children(&self, id: &CommitId) -> Option<&BTreeSet<CommitId>> {
        self.nodes
            .get(id)
            .map(GraphNode::children)
            .or_else(|| self.boundaries.get(id))
    }

    /// Whether `id` is referenced as a parent but has not been integrated
    #[must_use]
    pub fn is_boundary(&self, id: &CommitId) -> bool {
        self.boundaries.contains_key(id)
    }

    /// Unresolved parents with the commits that reference them
    pub fn boundaries(&self) -> impl Iterator<Item = (&CommitId, &BTreeSet<CommitId>)> {
        self.boundaries.iter()
    }

    /// Commit ids in the order they were integrated
    #[must_use]
    pub fn arrival_order(&self) -> &[CommitId] {
        &self.arrival
    }

    /// The commit `HEAD` points at, if integrated
    #[must_use]
    pub fn current_checkout(&self) -> Option<&GraphNode> {
        self.arrival
            .iter()
            .filter_map(|id| self.nodes.get(id))
            .find(|node| node.is_current_checkout())
    }
}

/// Builds a [`Graph`] from records as they stream in
#[derive(Debug, Default)]
pub struct GraphBuilder {
    graph: Graph,
    lanes: LaneAllocator,
    duplicates: Vec<GraphIntegrityWarning>,
}

impl GraphBuilder {
    /// Empty builder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The graph built so far
    #[must_use]
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Add one record. Re-integrating a known id changes nothing.
    pub fn integrate(&mut self, record: CommitRecord) -> Integration {
        if self.graph.nodes.contains_key(&record.id) {
            warn!(commit = %record.id, "Duplicate commit ignored");
            self.duplicates
                .push(GraphIntegrityWarning::DuplicateCommit { id: record.id });
            return Integration::Duplicate;
        }

        let id = record.id.clone();
        for parent in &record.parents {
            match self.graph.nodes.get_mut(parent) {
                Some(node) => {
                    node.children.insert(id.clone());
                }
                None => {
                    self.graph
                        .boundaries
                        .entry(parent.clone())
                        .or_default()
                        .insert(id.clone());
                }
            }
        }

        let children = self.graph.boundaries.remove(&id).unwrap_or_default();
        self.graph.nodes.insert(
            id.clone(),
            GraphNode {
                record: Arc::new(record),
                lane: None,
                children,
            },
        );
        self.graph.arrival.push(id);
        Integration::Inserted
    }

    /// Assign rows to every integrated commit that has none yet, then lay
    /// out rows up to `layout_rows`. Existing rows keep their position.
    pub fn finalize(&mut self, order: RowOrder, layout_rows: usize) {
        let assigned = self.graph.rows.len();
        if self.graph.arrival.len() > assigned {
            let mut tail = self.graph.arrival[assigned..].to_vec();
            if order == RowOrder::CommitDate {
                let nodes = &self.graph.nodes;
                tail.sort_by_key(|id| {
                    std::cmp::Reverse(nodes.get(id).map(|n| n.record.committer_date))
                });
            }
            debug!(appended = tail.len(), total = assigned + tail.len(), "Assigned rows");
            for id in tail {
                self.graph.row_index.insert(id.clone(), self.graph.rows.len());
                self.graph.rows.push(id);
            }
        }
        self.layout_through(layout_rows);
    }

    /// Lay out assigned rows up to (not including) `rows`
    pub fn layout_through(&mut self, rows: usize) {
        let end = rows.min(self.graph.rows.len());
        for row in self.graph.layouts.len()..end {
            let id = &self.graph.rows[row];
            let Some(node) = self.graph.nodes.get_mut(id) else {
                continue;
            };
            let layout = self.lanes.step(id, &node.record.parents);
            node.lane = Some(layout.lane);
            self.graph.layouts.push(layout);
        }
    }

    /// Duplicates seen so far plus every unresolved parent link
    #[must_use]
    pub fn integrity_warnings(&self) -> Vec<GraphIntegrityWarning> {
        let mut warnings = self.duplicates.clone();
        let mut boundary: Vec<GraphIntegrityWarning> = self
            .graph
            .boundaries
            .iter()
            .flat_map(|(parent, children)| {
                children
                    .iter()
                    .map(|child| GraphIntegrityWarning::BoundaryParent {
                        child: child.clone(),
                        parent: parent.clone(),
                    })
            })
            .collect();
        boundary.sort_by(|a, b| a.to_string().cmp(&b.to_string()));
        warnings.append(&mut boundary);
        warnings
    }
}
