// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Text and JSON rendering of a row window

use std::fmt::Write as _;

use revgraph_core::{RowLayout, RowSlot, VirtualizedRowSource};
use serde::Serialize;

/// One rendered row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WindowRow {
    /// Row index
    pub row: usize,
    /// Full commit id
    pub id: String,
    /// Lane of the commit
    pub lane: Option<usize>,
    /// Lane glyphs, `*` marking the commit
    pub graph: String,
    /// First line of the message
    pub subject: String,
    /// Author name
    pub author: String,
    /// Committer date, RFC 3339
    pub date: String,
    /// Short ref names, `HEAD` first when present
    pub refs: Vec<String>,
}

/// The visible part of the history
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WindowView {
    /// First row of the window
    pub scroll_offset: usize,
    /// Rows loaded when the window was rendered
    pub loaded_rows: usize,
    /// Whether the whole history was listed
    pub complete: bool,
    /// Window rows that are loaded
    pub rows: Vec<WindowRow>,
    /// Window rows still loading
    pub pending: usize,
}

/// Draw the lane columns of one row
#[must_use]
pub fn lane_glyphs(layout: &RowLayout) -> String {
    let mut out = String::with_capacity(layout.width * 2);
    for column in 0..layout.width {
        if column > 0 {
            out.push(' ');
        }
        let glyph = if column == layout.lane {
            '*'
        } else if layout.passing.contains(&column) {
            '|'
        } else if layout.closed.contains(&column) {
            if column > layout.lane { '/' } else { '\\' }
        } else if layout.opened.contains(&column) {
            if column > layout.lane { '\\' } else { '/' }
        } else {
            ' '
        };
        out.push(glyph);
    }
    out.truncate(out.trim_end().len());
    out
}

/// Collect rows `scroll_offset..scroll_offset + len`
#[must_use]
pub fn window(
    source: &VirtualizedRowSource,
    scroll_offset: usize,
    len: usize,
    complete: bool,
) -> WindowView {
    let mut view = WindowView {
        scroll_offset,
        loaded_rows: source.row_count(),
        complete,
        ..WindowView::default()
    };

    for (offset, slot) in source.window(scroll_offset, len).enumerate() {
        let RowSlot::Ready { node, layout } = slot else {
            view.pending += 1;
            continue;
        };
        let record = node.record();
        let mut refs: Vec<String> = record
            .refs
            .iter()
            .filter(|r| r.is_head())
            .chain(record.refs.iter().filter(|r| !r.is_head()))
            .map(|r| r.short_name().to_string())
            .collect();
        refs.dedup();

        view.rows.push(WindowRow {
            row: scroll_offset + offset,
            id: node.id().to_string(),
            lane: node.lane(),
            graph: layout.map(lane_glyphs).unwrap_or_default(),
            subject: record.subject().to_string(),
            author: record.author.clone(),
            date: record.committer_date.to_rfc3339(),
            refs,
        });
    }
    view
}

/// Plain-text rendering, one line per row
#[must_use]
pub fn to_text(view: &WindowView) -> String {
    let graph_width = view
        .rows
        .iter()
        .map(|r| r.graph.chars().count())
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    for row in &view.rows {
        let short = row.id.get(..7).unwrap_or(&row.id);
        let _ = write!(out, "{:<graph_width$}  {short}", row.graph);
        if !row.refs.is_empty() {
            let _ = write!(out, " ({})", row.refs.join(", "));
        }
        let _ = writeln!(out, " {} <{}>", row.subject, row.author);
    }
    if view.pending > 0 {
        let _ = writeln!(out, "... {} more rows loading", view.pending);
    }
    out
}

/// JSON rendering
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn to_json(view: &WindowView) -> serde_json::Result<String> {
    serde_json::to_string_pretty(view)
}
