//! Axis-aligned rectangle math shared by every phase.
//!
//! Coordinates follow the plan convention: x grows to the right, y grows
//! away from the road (the "front" of the plot is the low-y edge).

use serde::{Deserialize, Serialize};

/// Float slack used when comparing coordinates produced by grid arithmetic.
pub const EPS: f32 = 1e-4;

/// Door / wall orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    Vertical,
    Horizontal,
}

/// Side of a rectangle, used for snapping candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Right,
    Left,
    Top,
    Bottom,
}

impl Side {
    /// Candidate order used by the refiner and the master-pair search.
    pub const ALL: [Side; 4] = [Side::Right, Side::Left, Side::Top, Side::Bottom];

    pub fn is_horizontal_neighbour(self) -> bool {
        matches!(self, Side::Right | Side::Left)
    }
}

/// Axis-aligned rectangle: origin (top-left) plus extents.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle spanning two corners.
    pub fn from_corners(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self::new(x1, y1, x2 - x1, y2 - y1)
    }

    pub fn x2(&self) -> f32 {
        self.x + self.width
    }

    pub fn y2(&self) -> f32 {
        self.y + self.height
    }

    /// (x1, y1, x2, y2)
    pub fn bounds(&self) -> (f32, f32, f32, f32) {
        (self.x, self.y, self.x2(), self.y2())
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    /// Same extents, new origin.
    pub fn at(&self, x: f32, y: f32) -> Self {
        Self::new(x, y, self.width, self.height)
    }

    /// Strict interior overlap; rectangles that only touch do not overlap.
    pub fn overlaps(&self, other: &Rect) -> bool {
        !(self.x2() <= other.x
            || self.x >= other.x2()
            || self.y2() <= other.y
            || self.y >= other.y2())
    }

    /// Overlap test that treats penetrations below [`EPS`] as touching.
    pub fn overlaps_eps(&self, other: &Rect) -> bool {
        !(self.x2() <= other.x + EPS
            || self.x >= other.x2() - EPS
            || self.y2() <= other.y + EPS
            || self.y >= other.y2() - EPS)
    }

    /// True when `self` lies entirely inside `outer` (edges may coincide).
    pub fn inside(&self, outer: &Rect) -> bool {
        outer.x <= self.x && outer.y <= self.y && self.x2() <= outer.x2() && self.y2() <= outer.y2()
    }

    /// [`Rect::inside`] with [`EPS`] slack for grid-rounded coordinates.
    pub fn inside_eps(&self, outer: &Rect) -> bool {
        outer.x - EPS <= self.x
            && outer.y - EPS <= self.y
            && self.x2() <= outer.x2() + EPS
            && self.y2() <= outer.y2() + EPS
    }

    /// Shift the origin so the rectangle sits inside `outer`.
    /// Oversized rectangles end up pinned to the outer origin.
    pub fn clamped_into(&self, outer: &Rect) -> Self {
        let x = self.x.min(outer.x2() - self.width).max(outer.x);
        let y = self.y.min(outer.y2() - self.height).max(outer.y);
        self.at(x, y)
    }

    /// Length of the shared span along y (for rooms side by side).
    pub fn span_overlap_y(&self, other: &Rect) -> f32 {
        self.y2().min(other.y2()) - self.y.max(other.y)
    }

    /// Length of the shared span along x (for rooms stacked vertically).
    pub fn span_overlap_x(&self, other: &Rect) -> f32 {
        self.x2().min(other.x2()) - self.x.max(other.x)
    }

    /// Manhattan distance between the two centres.
    pub fn manhattan(&self, other: &Rect) -> f32 {
        let (ax, ay) = self.center();
        let (bx, by) = other.center();
        (ax - bx).abs() + (ay - by).abs()
    }

    /// Wall-adjacency test used by corridor insertion and scoring.
    ///
    /// If a pair of vertical walls lies within `tol`, the answer is decided by
    /// the y-span alone; horizontal walls are only consulted otherwise.
    pub fn shares_wall(&self, other: &Rect, tol: f32, min_span: f32) -> bool {
        if (self.x2() - other.x).abs() < tol || (self.x - other.x2()).abs() < tol {
            return self.span_overlap_y(other) > min_span;
        }
        if (self.y2() - other.y).abs() < tol || (self.y - other.y2()).abs() < tol {
            return self.span_overlap_x(other) > min_span;
        }
        false
    }

    /// Longest span two non-overlapping rectangles share across a gap below `tol`.
    /// Returns 0 when they are not facing each other.
    pub fn shared_wall_length(&self, other: &Rect, tol: f32) -> f32 {
        let mut best: f32 = 0.0;
        let gap_x = (other.x - self.x2()).max(self.x - other.x2());
        if (-EPS..tol).contains(&gap_x) {
            best = best.max(self.span_overlap_y(other));
        }
        let gap_y = (other.y - self.y2()).max(self.y - other.y2());
        if (-EPS..tol).contains(&gap_y) {
            best = best.max(self.span_overlap_x(other));
        }
        best.max(0.0)
    }

    /// Collision test with a clearance ring around `other`.
    pub fn collides_with_clearance(&self, other: &Rect, clearance: f32) -> bool {
        !(self.x2() + clearance <= other.x
            || self.x >= other.x2() + clearance
            || self.y2() + clearance <= other.y
            || self.y >= other.y2() + clearance)
    }
}

/// Round `v` to the nearest multiple of `grid`.
pub fn snap(v: f32, grid: f32) -> f32 {
    (v / grid).round() * grid
}
