// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Row access for a virtualized list
//!
//! The rendering layer asks for rows by index and reports how far down it
//! needs data with [`VirtualizedRowSource::grow_to`]. Producer depth grows
//! geometrically so that scrolling issues few requests.

use revgraph_log::{CommitId, CommitRecord};
use tracing::debug;

use crate::coordinator::ViewSnapshot;
use crate::graph::{Graph, GraphBuilder, GraphNode, Integration, RowOrder};
use crate::layout::RowLayout;

/// Default number of rows requested up front
pub const DEFAULT_PAGE_SIZE: usize = 200;

/// How the producer depth grows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GrowthPolicy {
    /// Smallest depth ever requested
    pub page_size: usize,
    /// Multiplier applied to the previous depth
    pub factor: usize,
}

impl Default for GrowthPolicy {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            factor: 2,
        }
    }
}

impl GrowthPolicy {
    /// Policy with the given page size and the default factor
    #[must_use]
    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            page_size,
            ..Self::default()
        }
    }

    /// Depth to request after `previous` when `min_count` rows are needed
    #[must_use]
    pub fn next_depth(&self, previous: usize, min_count: usize) -> usize {
        previous
            .saturating_mul(self.factor)
            .max(min_count)
            .max(self.page_size)
    }

    /// Depth for the first request of a cycle, covering the snapshot window
    #[must_use]
    pub fn initial_depth(&self, snapshot: &ViewSnapshot) -> usize {
        snapshot.window_end().max(self.page_size)
    }
}

/// A row as seen by the rendering layer
#[derive(Debug, Clone, Copy)]
pub enum RowSlot<'a> {
    /// The row is available
    Ready {
        /// The commit
        node: &'a GraphNode,
        /// Lanes, if the row has been laid out
        layout: Option<&'a RowLayout>,
    },
    /// Not loaded yet
    Pending,
}

impl<'a> RowSlot<'a> {
    /// The commit, if loaded
    #[must_use]
    pub fn node(&self) -> Option<&'a GraphNode> {
        match *self {
            Self::Ready { node, .. } => Some(node),
            Self::Pending => None,
        }
    }

    /// Whether the row is still loading
    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }
}

/// Index-addressable rows over the graph of one cycle
#[derive(Debug)]
pub struct VirtualizedRowSource {
    builder: GraphBuilder,
    policy: GrowthPolicy,
    order: RowOrder,
    granted_depth: usize,
    requested_rows: usize,
}

impl VirtualizedRowSource {
    /// Empty source whose producer was started with `initial_depth`.
    /// Rows below `visible_rows` are laid out as soon as they arrive.
    #[must_use]
    pub fn new(
        policy: GrowthPolicy,
        order: RowOrder,
        initial_depth: usize,
        visible_rows: usize,
    ) -> Self {
        Self {
            builder: GraphBuilder::new(),
            policy,
            order,
            granted_depth: initial_depth,
            requested_rows: visible_rows,
        }
    }

    /// Number of rows currently available. Never shrinks within a cycle.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.builder.graph().row_count()
    }

    /// Row `index`, or [`RowSlot::Pending`] past the loaded rows
    #[must_use]
    pub fn row_at(&self, index: usize) -> RowSlot<'_> {
        let graph = self.builder.graph();
        match graph.row(index) {
            Some(node) => RowSlot::Ready {
                node,
                layout: graph.row_layout(index),
            },
            None => RowSlot::Pending,
        }
    }

    /// Rows `start..start + len`
    pub fn window(&self, start: usize, len: usize) -> impl Iterator<Item = RowSlot<'_>> {
        (start..start.saturating_add(len)).map(|index| self.row_at(index))
    }

    /// Make sure at least `min_count` rows will be loaded. Returns the new
    /// producer depth when a request is needed, `None` when the depth already
    /// granted covers it.
    pub fn grow_to(&mut self, min_count: usize) -> Option<usize> {
        if min_count > self.requested_rows {
            self.requested_rows = min_count;
            self.builder.layout_through(min_count);
        }
        if min_count <= self.granted_depth {
            return None;
        }
        let depth = self.policy.next_depth(self.granted_depth, min_count);
        debug!(
            min_count,
            previous = self.granted_depth,
            depth,
            "Growing producer depth"
        );
        self.granted_depth = depth;
        Some(depth)
    }

    /// Depth the producer has been granted so far
    #[must_use]
    pub fn granted_depth(&self) -> usize {
        self.granted_depth
    }

    /// The underlying graph
    #[must_use]
    pub fn graph(&self) -> &Graph {
        self.builder.graph()
    }

    /// Row of `id`, if loaded
    #[must_use]
    pub fn row_of(&self, id: &CommitId) -> Option<usize> {
        self.builder.graph().row_of(id)
    }

    pub(crate) fn integrate(&mut self, record: CommitRecord) -> Integration {
        self.builder.integrate(record)
    }

    /// Assign rows to everything integrated since the last call
    pub(crate) fn settle(&mut self) {
        self.builder.finalize(self.order, self.requested_rows);
    }

    pub(crate) fn builder(&self) -> &GraphBuilder {
        &self.builder
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::tests::record;
    use similar_asserts::assert_eq;

    fn source(page_size: usize, initial_depth: usize, visible: usize) -> VirtualizedRowSource {
        VirtualizedRowSource::new(
            GrowthPolicy::with_page_size(page_size),
            RowOrder::Arrival,
            initial_depth,
            visible,
        )
    }

    #[test]
    fn test_repeated_grow_requests_once() {
        let mut rows = source(2, 2, 2);
        assert_eq!(rows.grow_to(5), Some(5));
        assert_eq!(rows.grow_to(5), None);
        assert_eq!(rows.grow_to(3), None);
        assert_eq!(rows.granted_depth(), 5);
    }

    #[test]
    fn test_growth_is_geometric() {
        let mut rows = source(10, 10, 5);
        assert_eq!(rows.grow_to(11), Some(20));
        assert_eq!(rows.grow_to(21), Some(40));
        assert_eq!(rows.grow_to(100), Some(100));
        assert_eq!(rows.grow_to(101), Some(200));
    }

    #[test]
    fn test_small_request_uses_page_size() {
        let policy = GrowthPolicy::with_page_size(50);
        assert_eq!(policy.next_depth(0, 1), 50);
        let snapshot = ViewSnapshot {
            scroll_offset: 90,
            viewport_rows: 30,
            ..ViewSnapshot::default()
        };
        assert_eq!(policy.initial_depth(&snapshot), 121);
    }

    #[test]
    fn test_rows_past_the_end_are_pending() {
        let mut rows = source(10, 10, 10);
        assert!(rows.row_at(0).is_pending());
        rows.integrate(record("B", &["A"], 2));
        rows.integrate(record("A", &[], 1));
        rows.settle();

        assert_eq!(rows.row_count(), 2);
        assert_eq!(rows.row_at(1).node().map(|n| n.id().as_str()), Some("A"));
        assert!(rows.row_at(2).is_pending());
        let slots: Vec<bool> = rows.window(1, 3).map(|s| s.is_pending()).collect();
        assert_eq!(slots, vec![false, true, true]);
    }

    #[test]
    fn test_layout_follows_requested_rows() {
        let mut rows = source(10, 10, 1);
        rows.integrate(record("C", &["B"], 3));
        rows.integrate(record("B", &["A"], 2));
        rows.integrate(record("A", &[], 1));
        rows.settle();
        assert_eq!(rows.graph().laid_out(), 1);
        match rows.row_at(1) {
            RowSlot::Ready { layout, .. } => assert!(layout.is_none()),
            RowSlot::Pending => panic!("row 1 should be loaded"),
        }

        assert_eq!(rows.grow_to(3), None);
        assert_eq!(rows.graph().laid_out(), 3);
    }
}
