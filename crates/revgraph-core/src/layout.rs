// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Lane assignment
//!
//! Rows are laid out top to bottom in a single pass. Each open lane holds the
//! id of the commit it is waiting for. A commit takes the lowest lane waiting
//! for it, or the lowest free lane when nothing is. Its first parent inherits
//! the lane; every further parent opens a new one.
//!
//! Assignment is purely a function of the row order, so laying out rows
//! `0..n` and later `n..m` gives the same result as laying out `0..m` at once.

use revgraph_log::CommitId;
use serde::Serialize;

/// Drawing data for one row
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RowLayout {
    /// Lane holding the commit
    pub lane: usize,
    /// A line enters the commit from the row above
    pub incoming: bool,
    /// A line leaves the commit towards its first parent
    pub continues: bool,
    /// Other lanes that were waiting for this commit and end here
    pub closed: Vec<usize>,
    /// Lanes opened here for the second and later parents
    pub opened: Vec<usize>,
    /// Lanes that pass through this row untouched
    pub passing: Vec<usize>,
    /// Number of lane columns this row spans
    pub width: usize,
}

/// Running lane state for a top-to-bottom layout
#[derive(Debug, Clone, Default)]
pub struct LaneAllocator {
    lanes: Vec<Option<CommitId>>,
}

impl LaneAllocator {
    /// Empty allocator for the first row
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of lanes currently open
    #[must_use]
    pub fn open_lanes(&self) -> usize {
        self.lanes.iter().filter(|l| l.is_some()).count()
    }

    /// Lay out the next row
    pub fn step(&mut self, id: &CommitId, parents: &[CommitId]) -> RowLayout {
        let waiting: Vec<usize> = self
            .lanes
            .iter()
            .enumerate()
            .filter(|(_, expected)| expected.as_ref() == Some(id))
            .map(|(lane, _)| lane)
            .collect();

        let (lane, incoming) = match waiting.first() {
            Some(&lane) => (lane, true),
            None => (self.lowest_free(), false),
        };

        let closed: Vec<usize> = waiting.iter().skip(1).copied().collect();
        for &lane in &closed {
            self.lanes[lane] = None;
        }

        let passing: Vec<usize> = self
            .lanes
            .iter()
            .enumerate()
            .filter(|(idx, expected)| *idx != lane && expected.is_some())
            .map(|(idx, _)| idx)
            .collect();

        let mut opened = Vec::new();
        let continues = match parents.split_first() {
            Some((first, rest)) => {
                self.lanes[lane] = Some(first.clone());
                for parent in rest {
                    let new_lane = self.lowest_free();
                    self.lanes[new_lane] = Some(parent.clone());
                    opened.push(new_lane);
                }
                true
            }
            None => {
                self.lanes[lane] = None;
                false
            }
        };

        let width = [
            Some(lane),
            closed.last().copied(),
            opened.iter().max().copied(),
            passing.last().copied(),
        ]
        .into_iter()
        .flatten()
        .max()
        .map_or(0, |max| max + 1);

        while self.lanes.last().is_some_and(Option::is_none) {
            self.lanes.pop();
        }

        RowLayout {
            lane,
            incoming,
            continues,
            closed,
            opened,
            passing,
            width,
        }
    }

    /// Index of the lowest unused lane, growing the pool if every lane is used
    fn lowest_free(&mut self) -> usize {
        if let Some(idx) = self.lanes.iter().position(Option::is_none) {
            return idx;
        }
        self.lanes.push(None);
        self.lanes.len() - 1
    }
}

/// Stateless entry point for laying out a whole row sequence
pub struct LayoutEngine;

impl LayoutEngine {
    /// Lay out `rows` (commit id and parents, in row order) from scratch
    pub fn assign<'a, I>(rows: I) -> Vec<RowLayout>
    where
        I: IntoIterator<Item = (&'a CommitId, &'a [CommitId])>,
    {
        let mut lanes = LaneAllocator::new();
        rows.into_iter()
            .map(|(id, parents)| lanes.step(id, parents))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use similar_asserts::assert_eq;

    fn id(s: &str) -> CommitId {
        CommitId::new(s)
    }

    fn rows(history: &[(&str, &[&str])]) -> Vec<(CommitId, Vec<CommitId>)> {
        history
            .iter()
            .map(|(c, ps)| (id(c), ps.iter().map(|p| id(p)).collect()))
            .collect()
    }

    fn layout(history: &[(&str, &[&str])]) -> Vec<RowLayout> {
        let rows = rows(history);
        LayoutEngine::assign(rows.iter().map(|(c, ps)| (c, ps.as_slice())))
    }

    #[test]
    fn test_merge_then_converge() {
        let out = layout(&[
            ("D", &["B", "C"]),
            ("B", &["A"]),
            ("C", &["A"]),
            ("A", &[]),
        ]);

        let lanes: Vec<usize> = out.iter().map(|r| r.lane).collect();
        assert_eq!(lanes, vec![0, 0, 1, 0]);

        assert_eq!(out[0].opened, vec![1]);
        assert!(!out[0].incoming);
        assert_eq!(out[1].passing, vec![1]);
        assert_eq!(out[2].passing, vec![0]);

        let root = &out[3];
        assert!(root.incoming);
        assert!(!root.continues);
        assert_eq!(root.closed, vec![1]);
        assert_eq!(root.width, 2);
    }

    #[test]
    fn test_linear_history_stays_in_lane_zero() {
        let out = layout(&[("C", &["B"]), ("B", &["A"]), ("A", &[])]);
        assert!(out.iter().all(|r| r.lane == 0 && r.width == 1));
        assert!(out[0].continues && out[1].continues && !out[2].continues);
    }

    #[test]
    fn test_octopus_opens_one_lane_per_extra_parent() {
        let out = layout(&[("M", &["P1", "P2", "P3", "P4"])]);
        assert_eq!(out[0].lane, 0);
        assert_eq!(out[0].opened, vec![1, 2, 3]);
        assert_eq!(out[0].width, 4);
    }

    #[test]
    fn test_freed_lane_is_reused() {
        // X is a separate root history listed between two chains
        let out = layout(&[
            ("M", &["A", "B"]),
            ("B", &[]),
            ("X", &[]),
            ("A", &[]),
        ]);
        assert_eq!(out[1].lane, 1);
        assert!(!out[1].continues);
        assert_eq!(out[2].lane, 1, "lane 1 was freed by root B");
        assert!(!out[2].incoming);
    }

    #[test]
    fn test_unrelated_tips_get_new_lanes() {
        let out = layout(&[("T1", &["A"]), ("T2", &["A"]), ("A", &[])]);
        assert_eq!(out[0].lane, 0);
        assert_eq!(out[1].lane, 1);
        assert_eq!(out[1].passing, vec![0]);
        assert_eq!(out[2].lane, 0);
        assert_eq!(out[2].closed, vec![1]);
    }

    #[test]
    fn test_incremental_layout_matches_full_layout() {
        let history: &[(&str, &[&str])] = &[
            ("E", &["D", "X"]),
            ("X", &["C"]),
            ("D", &["C"]),
            ("C", &["B", "Y"]),
            ("Y", &[]),
            ("B", &["A"]),
            ("A", &[]),
        ];
        let full = layout(history);

        let rows = rows(history);
        let mut lanes = LaneAllocator::new();
        let mut incremental = Vec::new();
        for (c, ps) in &rows[..3] {
            incremental.push(lanes.step(c, ps));
        }
        for (c, ps) in &rows[3..] {
            incremental.push(lanes.step(c, ps));
        }
        assert_eq!(full, incremental);
        assert_eq!(lanes.open_lanes(), 0);
    }
}
