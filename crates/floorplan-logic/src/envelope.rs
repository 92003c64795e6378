//! Envelope builder: wall segments for a finished layout.
//!
//! Outer walls come from a rasterised silhouette of every cell, so the
//! envelope follows the union of the rooms rather than any single room.
//! Inner walls are room edges (or shared spans) minus whatever already lies
//! on the envelope.
//!
//! Output is outer segments first, then inner segments, each group in a
//! canonical order so merging twice gives the same list.

use std::collections::BTreeMap;

use crate::config::{EnvelopeConfig, InnerWallMode};
use crate::geometry::Rect;
use crate::model::{Cell, WallKind, WallSegment};
use crate::pipeline::Layout;

/// Coordinates closer than this are the same wall line.
pub const MERGE_EPS: f32 = 0.01;

/// Gap under which two cells count as touching for shared partitions.
const SHARED_TOLERANCE: f32 = 0.05;

/// Project placed rooms into envelope cells.
pub fn cells_from_layout(layout: &Layout) -> Vec<Cell> {
    layout
        .rooms
        .iter()
        .map(|r| Cell {
            id: r.room_id.clone(),
            purpose: r.purpose,
            rect: Rect::new(r.x, r.y, r.width, r.height),
        })
        .collect()
}

/// Drop circulation cells too small to be real corridors.
pub fn filter_noise_cells(cells: &[Cell], min_corridor_area: f32) -> Vec<Cell> {
    cells
        .iter()
        .filter(|c| !(c.is_circulation() && c.rect.area() < min_corridor_area))
        .cloned()
        .collect()
}

/// Outer walls of the union of all cells, traced on a `grid` raster.
pub fn compute_silhouette(cells: &[Cell], grid: f32) -> Vec<WallSegment> {
    let spans: Vec<(i64, i64, i64, i64)> = cells
        .iter()
        .map(|c| {
            let (x1, y1, x2, y2) = c.rect.bounds();
            (
                (x1 / grid).round() as i64,
                (y1 / grid).round() as i64,
                (x2 / grid).round() as i64,
                (y2 / grid).round() as i64,
            )
        })
        .filter(|(x1, y1, x2, y2)| x2 > x1 && y2 > y1)
        .collect();
    if spans.is_empty() {
        return Vec::new();
    }

    let min_x = spans.iter().map(|s| s.0).min().unwrap_or(0);
    let min_y = spans.iter().map(|s| s.1).min().unwrap_or(0);
    let max_x = spans.iter().map(|s| s.2).max().unwrap_or(0);
    let max_y = spans.iter().map(|s| s.3).max().unwrap_or(0);
    let cols = (max_x - min_x) as usize;
    let rows = (max_y - min_y) as usize;

    let mut occupied = vec![false; cols * rows];
    for &(x1, y1, x2, y2) in &spans {
        for j in (y1 - min_y) as usize..(y2 - min_y) as usize {
            for i in (x1 - min_x) as usize..(x2 - min_x) as usize {
                occupied[j * cols + i] = true;
            }
        }
    }
    let filled = |i: i64, j: i64| {
        i >= 0
            && j >= 0
            && (i as usize) < cols
            && (j as usize) < rows
            && occupied[j as usize * cols + i as usize]
    };

    let coord = |k: i64| k as f32 * grid;
    let mut edges = Vec::new();
    for j in 0..rows as i64 {
        for i in 0..cols as i64 {
            if !filled(i, j) {
                continue;
            }
            let (x0, y0) = (coord(i + min_x), coord(j + min_y));
            let (x1, y1) = (coord(i + min_x + 1), coord(j + min_y + 1));
            if !filled(i - 1, j) {
                edges.push(WallSegment::new(x0, y0, x0, y1, WallKind::Outer));
            }
            if !filled(i + 1, j) {
                edges.push(WallSegment::new(x1, y0, x1, y1, WallKind::Outer));
            }
            if !filled(i, j - 1) {
                edges.push(WallSegment::new(x0, y0, x1, y0, WallKind::Outer));
            }
            if !filled(i, j + 1) {
                edges.push(WallSegment::new(x0, y1, x1, y1, WallKind::Outer));
            }
        }
    }
    merge_walls(&edges)
}

/// Four edges of every non-circulation cell, as inner candidates.
pub fn room_partition_walls(cells: &[Cell]) -> Vec<WallSegment> {
    let mut walls = Vec::with_capacity(cells.len() * 4);
    for c in cells.iter().filter(|c| !c.is_circulation()) {
        let (x1, y1, x2, y2) = c.rect.bounds();
        walls.push(WallSegment::new(x1, y1, x1, y2, WallKind::Inner));
        walls.push(WallSegment::new(x2, y1, x2, y2, WallKind::Inner));
        walls.push(WallSegment::new(x1, y1, x2, y1, WallKind::Inner));
        walls.push(WallSegment::new(x1, y2, x2, y2, WallKind::Inner));
    }
    walls
}

/// Only the spans where two cells touch, as inner candidates.
pub fn shared_partitions(cells: &[Cell]) -> Vec<WallSegment> {
    let mut walls = Vec::new();
    for (i, a) in cells.iter().enumerate() {
        for b in &cells[i + 1..] {
            let (a, b) = (&a.rect, &b.rect);

            let x = if (a.x2() - b.x).abs() < SHARED_TOLERANCE {
                Some(a.x2())
            } else if (b.x2() - a.x).abs() < SHARED_TOLERANCE {
                Some(b.x2())
            } else {
                None
            };
            if let Some(x) = x {
                let (lo, hi) = (a.y.max(b.y), a.y2().min(b.y2()));
                if hi - lo > SHARED_TOLERANCE {
                    walls.push(WallSegment::new(x, lo, x, hi, WallKind::Inner));
                }
            }

            let y = if (a.y2() - b.y).abs() < SHARED_TOLERANCE {
                Some(a.y2())
            } else if (b.y2() - a.y).abs() < SHARED_TOLERANCE {
                Some(b.y2())
            } else {
                None
            };
            if let Some(y) = y {
                let (lo, hi) = (a.x.max(b.x), a.x2().min(b.x2()));
                if hi - lo > SHARED_TOLERANCE {
                    walls.push(WallSegment::new(lo, y, hi, y, WallKind::Inner));
                }
            }
        }
    }
    walls
}

/// Axis of a segment: vertical walls keyed by x, horizontal by y.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Axis {
    Vertical,
    Horizontal,
}

/// (axis, wall-line coordinate, span start, span end)
fn axis_span(w: &WallSegment) -> Option<(Axis, f32, f32, f32)> {
    if w.is_vertical() {
        Some((Axis::Vertical, w.x1, w.y1, w.y2))
    } else if w.is_horizontal() {
        Some((Axis::Horizontal, w.y1, w.x1, w.x2))
    } else {
        None
    }
}

fn from_axis_span(axis: Axis, line: f32, lo: f32, hi: f32, kind: WallKind) -> WallSegment {
    match axis {
        Axis::Vertical => WallSegment::new(line, lo, line, hi, kind),
        Axis::Horizontal => WallSegment::new(lo, line, hi, line, kind),
    }
}

/// Wall-line coordinate rounded to hundredths, for grouping.
fn line_key(v: f32) -> i64 {
    (v * 100.0).round() as i64
}

/// Remove the parts of inner segments that lie on an outer segment.
///
/// Exact coincidence removes the segment; partial coincidence clips it.
pub fn subtract_outer(inner: &[WallSegment], outer: &[WallSegment]) -> Vec<WallSegment> {
    let mut result = Vec::with_capacity(inner.len());
    for w in inner {
        let Some((axis, line, lo, hi)) = axis_span(w) else {
            result.push(*w);
            continue;
        };
        let mut pieces = vec![(lo, hi)];
        for o in outer {
            let Some((o_axis, o_line, o_lo, o_hi)) = axis_span(o) else {
                continue;
            };
            if o_axis != axis || line_key(o_line) != line_key(line) {
                continue;
            }
            let mut next = Vec::with_capacity(pieces.len() + 1);
            for (a, b) in pieces {
                if o_hi <= a + MERGE_EPS || o_lo >= b - MERGE_EPS {
                    next.push((a, b));
                    continue;
                }
                if o_lo - a > MERGE_EPS {
                    next.push((a, o_lo));
                }
                if b - o_hi > MERGE_EPS {
                    next.push((o_hi, b));
                }
            }
            pieces = next;
        }
        result.extend(
            pieces
                .into_iter()
                .map(|(a, b)| from_axis_span(axis, line, a, b, w.kind)),
        );
    }
    result
}

/// Fold collinear overlapping or touching segments of the same kind into
/// maximal runs.
pub fn merge_walls(walls: &[WallSegment]) -> Vec<WallSegment> {
    let mut groups: BTreeMap<(WallKind, Axis, i64), Vec<(f32, f32, f32)>> = BTreeMap::new();
    let mut skew = Vec::new();

    for w in walls {
        match axis_span(w) {
            Some((axis, line, lo, hi)) => groups
                .entry((w.kind, axis, line_key(line)))
                .or_default()
                .push((lo, hi, line)),
            None => skew.push(*w),
        }
    }

    let mut merged = Vec::with_capacity(walls.len());
    for ((kind, axis, _), mut spans) in groups {
        spans.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.total_cmp(&b.1)));
        let mut iter = spans.into_iter();
        let Some((mut lo, mut hi, mut line)) = iter.next() else {
            continue;
        };
        for (next_lo, next_hi, next_line) in iter {
            if next_lo <= hi + MERGE_EPS {
                hi = hi.max(next_hi);
            } else {
                if hi - lo > MERGE_EPS {
                    merged.push(from_axis_span(axis, line, lo, hi, kind));
                }
                (lo, hi, line) = (next_lo, next_hi, next_line);
            }
        }
        if hi - lo > MERGE_EPS {
            merged.push(from_axis_span(axis, line, lo, hi, kind));
        }
    }
    merged.extend(skew);
    merged
}

/// Shift outer walls outward by half the wall thickness.
///
/// The outward side is the one whose half-thickness probe hits no
/// non-circulation cell. Walls with both or neither side occupied stay put.
/// Inner walls are returned unchanged.
pub fn offset_outer_walls(walls: &[WallSegment], cells: &[Cell], thickness: f32) -> Vec<WallSegment> {
    let offset = thickness / 2.0;
    let solid: Vec<Rect> = cells
        .iter()
        .filter(|c| !c.is_circulation())
        .map(|c| c.rect)
        .collect();
    let hits = |probe: Rect| solid.iter().any(|r| probe.overlaps(r));

    walls
        .iter()
        .map(|w| {
            if w.kind != WallKind::Outer {
                return *w;
            }
            let Some((axis, line, lo, hi)) = axis_span(w) else {
                return *w;
            };
            let (before, after) = match axis {
                Axis::Vertical => (
                    Rect::new(line - offset, lo, offset, hi - lo),
                    Rect::new(line, lo, offset, hi - lo),
                ),
                Axis::Horizontal => (
                    Rect::new(lo, line - offset, hi - lo, offset),
                    Rect::new(lo, line, hi - lo, offset),
                ),
            };
            let shift = match (hits(before), hits(after)) {
                (true, false) => offset,
                (false, true) => -offset,
                _ => return *w,
            };
            from_axis_span(axis, line + shift, lo, hi, WallKind::Outer)
        })
        .collect()
}

/// Build the full wall list for a set of cells: outer first, then inner.
pub fn build_envelope(cells: &[Cell], config: &EnvelopeConfig) -> Vec<WallSegment> {
    let cells = filter_noise_cells(cells, config.min_corridor_area);
    let outer = compute_silhouette(&cells, config.grid);

    let candidates = match config.inner_mode {
        InnerWallMode::RoomEdges => room_partition_walls(&cells),
        InnerWallMode::SharedWalls => shared_partitions(&cells),
    };
    let inner = merge_walls(&subtract_outer(&candidates, &outer));

    let mut walls = if config.offset_outer {
        offset_outer_walls(&outer, &cells, config.wall_thickness)
    } else {
        outer
    };
    log::info!(
        "Envelope: {} outer and {} inner segments from {} cells",
        walls.len(),
        inner.len(),
        cells.len()
    );
    walls.extend(inner);
    walls
}
