// 🧱 Row-Packing Layout Engine - overlapping intervals → non-colliding rows
//
// Greedy first-fit interval colouring: each assignment, in input order, goes to
// the lowest row where it overlaps nothing already placed. Row count is minimal
// only when the input is sorted by start; input order is kept unless the
// caller opts in to `pack_by_start`.
//
// Per-row height shrinks as rows are added, down to a floor, after which the
// track grows instead.

use crate::axis::TimeAxis;
use crate::config::TimelineConfig;
use crate::extractor::Assignment;
use crate::position::bar_geometry;
use serde::{Deserialize, Serialize};

// ============================================================================
// LAYOUT TYPES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutBar {
    pub assignment: Assignment,
    pub row: usize,
    pub left_px: u32,
    pub width_px: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackMetrics {
    pub row_count: usize,
    pub bar_height: u32,
    pub track_height: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityTrack {
    pub entity_key: String,
    pub display_name: String,
    pub bars: Vec<LayoutBar>,
    pub row_count: usize,
    pub bar_height: u32,
    pub track_height: u32,
}

impl EntityTrack {
    /// Bars placed on one row, in placement order
    pub fn row(&self, row: usize) -> impl Iterator<Item = &LayoutBar> {
        self.bars.iter().filter(move |b| b.row == row)
    }

    pub fn is_idle(&self) -> bool {
        self.bars.is_empty()
    }
}

// ============================================================================
// ROW PACKING
// ============================================================================

/// First-fit row index for every assignment, in the order given
pub fn pack_rows(assignments: &[&Assignment]) -> Vec<usize> {
    let mut rows: Vec<Vec<&Assignment>> = Vec::new();
    let mut placement = Vec::with_capacity(assignments.len());

    for &assignment in assignments {
        let free = rows
            .iter()
            .position(|row| row.iter().all(|placed| !placed.overlaps(assignment)));

        let row = match free {
            Some(row) => row,
            None => {
                rows.push(Vec::new());
                rows.len() - 1
            }
        };

        rows[row].push(assignment);
        placement.push(row);
    }

    placement
}

/// Bar and track height for a track with `row_count` rows
pub fn track_metrics(row_count: usize, config: &TimelineConfig) -> TrackMetrics {
    let padding = config.track_padding.saturating_mul(2);
    let inner = config.track_height.saturating_sub(padding);
    let bar_height = (inner / row_count.max(1) as u32).max(config.min_bar_height);
    let track_height = (row_count as u32)
        .saturating_mul(bar_height)
        .saturating_add(padding)
        .max(config.track_height);

    TrackMetrics {
        row_count,
        bar_height,
        track_height,
    }
}

/// Lay out one entity's assignments against an axis
///
/// Assignments outside the axis window are dropped before packing.
pub fn layout_track(
    entity_key: &str,
    display_name: &str,
    assignments: &[&Assignment],
    axis: &TimeAxis,
    config: &TimelineConfig,
) -> EntityTrack {
    let mut visible: Vec<&Assignment> = match (axis.view_start(), axis.view_end()) {
        (Some(view_start), Some(view_end)) => assignments
            .iter()
            .copied()
            .filter(|a| a.intersects_window(view_start, view_end))
            .collect(),
        _ => Vec::new(),
    };

    if config.pack_by_start {
        // Stable: ties keep their input order
        visible.sort_by_key(|a| a.start);
    }

    let rows = pack_rows(&visible);
    let row_count = rows.iter().map(|r| r + 1).max().unwrap_or(0);
    let metrics = track_metrics(row_count, config);

    let bars = visible
        .into_iter()
        .zip(rows)
        .map(|(assignment, row)| {
            let (left_px, width_px) =
                bar_geometry(assignment.start, assignment.end, &axis.columns, axis.column_width);
            LayoutBar {
                assignment: assignment.clone(),
                row,
                left_px,
                width_px,
            }
        })
        .collect();

    EntityTrack {
        entity_key: entity_key.to_string(),
        display_name: display_name.to_string(),
        bars,
        row_count: metrics.row_count,
        bar_height: metrics.bar_height,
        track_height: metrics.track_height,
    }
}

// ============================================================================
// TESTS
// ============================================================================
