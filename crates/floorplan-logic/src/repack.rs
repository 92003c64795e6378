//! Last-resort repacking for plans the legalizer could not settle.
//!
//! Runs only when rooms are still overlapping, out of bounds, or the master
//! pair is detached. Strategies run from least to most disruptive and the
//! first one that places every room wins:
//!
//! 1. [`Strategy::KeepSound`]: rooms that are already legal stay, the rest
//!    move to the first free grid slot.
//! 2. [`Strategy::Shelves`]: every room is laid out in rows, tallest first.
//! 3. [`Strategy::FirstFit`]: every room goes to the first free grid slot,
//!    largest first.
//!
//! The master pair moves as one suite with the bathroom flush against the
//! bedroom. Corridors are placed after the rooms and dropped if nothing fits.

use serde::{Deserialize, Serialize};

use crate::geometry::{Rect, EPS};
use crate::model::{RoomId, RoomSet};
use crate::settle::{grid_origins, SettleParams};

/// Which packing was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    KeepSound,
    Shelves,
    FirstFit,
}

/// Counters from one repack.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RepackReport {
    /// `None` when the layout was already sound or nothing worked.
    pub strategy: Option<Strategy>,
    pub relocated: usize,
    /// Relocated rooms that had been locked by an earlier phase.
    pub relocated_locked: usize,
    pub corridors_dropped: usize,
    /// No strategy placed every room.
    pub failed: bool,
}

/// One room of a unit, offset from the unit origin.
#[derive(Debug, Clone, Copy)]
struct Part {
    id: RoomId,
    dx: f32,
    dy: f32,
    width: f32,
    height: f32,
}

/// A room, or the master suite, placed as one block.
#[derive(Debug, Clone)]
struct Unit {
    current: Vec<(RoomId, Rect)>,
    /// Candidate arrangements; singles have exactly one.
    shapes: Vec<Vec<Part>>,
    locked: bool,
    priority: i32,
    area: f32,
}

impl Unit {
    fn single(id: RoomId, rect: Rect, locked: bool, priority: i32) -> Self {
        Self {
            current: vec![(id, rect)],
            shapes: vec![vec![Part {
                id,
                dx: 0.0,
                dy: 0.0,
                width: rect.width,
                height: rect.height,
            }]],
            locked,
            priority,
            area: rect.area(),
        }
    }

    fn is_suite(&self) -> bool {
        self.current.len() > 1
    }

    /// Singles always; suites when the members share enough wall.
    fn is_sound(&self, p: &SettleParams) -> bool {
        match self.current.as_slice() {
            [(_, bed), (_, bath)] => {
                !bed.overlaps(bath)
                    && bed.shared_wall_length(bath, p.adjacency_tolerance) + EPS >= p.min_shared_wall
            }
            _ => true,
        }
    }
}

fn extent(shape: &[Part]) -> (f32, f32) {
    shape.iter().fold((0.0_f32, 0.0_f32), |(w, h), part| {
        (w.max(part.dx + part.width), h.max(part.dy + part.height))
    })
}

fn translate(shape: &[Part], x: f32, y: f32) -> Vec<(RoomId, Rect)> {
    shape
        .iter()
        .map(|p| (p.id, Rect::new(x + p.dx, y + p.dy, p.width, p.height)))
        .collect()
}

/// Bathroom beside, then below, the bedroom. Arrangements that cannot share
/// the minimum wall are left out.
fn suite_shapes(bed: (RoomId, Rect), bath: (RoomId, Rect), p: &SettleParams) -> Vec<Vec<Part>> {
    let (b, t) = (bed.1, bath.1);
    let part = |id, dx, dy, r: Rect| Part {
        id,
        dx,
        dy,
        width: r.width,
        height: r.height,
    };
    let mut shapes = Vec::new();
    if b.height.min(t.height) >= p.min_shared_wall {
        shapes.push(vec![
            part(bed.0, 0.0, 0.0, b),
            part(bath.0, b.width + p.clearance, 0.0, t),
        ]);
    }
    if b.width.min(t.width) >= p.min_shared_wall {
        shapes.push(vec![
            part(bed.0, 0.0, 0.0, b),
            part(bath.0, 0.0, b.height + p.clearance, t),
        ]);
    }
    shapes
}

/// Split the set into room units (master suite first) and corridors.
fn collect_units(set: &RoomSet, p: &SettleParams) -> (Vec<Unit>, Vec<(RoomId, Rect)>) {
    let mut units = Vec::new();
    let mut suite_ids: Vec<RoomId> = Vec::new();

    if let Some((bed, bath)) = set.master_pair() {
        if let (Some(b), Some(t)) = (set.get(bed), set.get(bath)) {
            let shapes = suite_shapes((bed, b.rect), (bath, t.rect), p);
            if !shapes.is_empty() {
                units.push(Unit {
                    current: vec![(bed, b.rect), (bath, t.rect)],
                    shapes,
                    locked: b.locked || t.locked,
                    priority: b.priority.max(t.priority),
                    area: b.area() + t.area(),
                });
                suite_ids = vec![bed, bath];
            }
        }
    }

    let mut corridors = Vec::new();
    for room in set.iter().filter(|r| !suite_ids.contains(&r.id)) {
        if room.is_circulation() {
            corridors.push((room.id, room.rect));
        } else {
            units.push(Unit::single(room.id, room.rect, room.locked, room.priority));
        }
    }
    (units, corridors)
}

/// Rooms placed so far.
#[derive(Debug, Default)]
struct Packing {
    placed: Vec<(RoomId, Rect)>,
    dropped: Vec<RoomId>,
}

impl Packing {
    fn fits(&self, bounds: &Rect, rects: &[(RoomId, Rect)]) -> bool {
        rects.iter().all(|(_, r)| {
            r.inside_eps(bounds) && self.placed.iter().all(|(_, other)| !other.overlaps(r))
        })
    }

    /// Place `unit` at the first free grid origin of any of its shapes.
    fn first_fit(&mut self, bounds: &Rect, unit: &Unit, grid: f32) -> bool {
        for shape in &unit.shapes {
            let (w, h) = extent(shape);
            for (x, y) in grid_origins(bounds, &Rect::new(0.0, 0.0, w, h), grid) {
                let rects = translate(shape, x, y);
                if self.fits(bounds, &rects) {
                    self.placed.extend(rects);
                    return true;
                }
            }
        }
        false
    }
}

type PackFn = fn(&[Unit], &Rect, &SettleParams) -> Option<Packing>;

/// Suite first, then largest area first.
fn by_size(units: &[Unit]) -> Vec<&Unit> {
    let mut order: Vec<&Unit> = units.iter().collect();
    order.sort_by(|a, b| b.is_suite().cmp(&a.is_suite()).then(b.area.total_cmp(&a.area)));
    order
}

fn keep_sound(units: &[Unit], bounds: &Rect, p: &SettleParams) -> Option<Packing> {
    let mut ranked: Vec<&Unit> = units.iter().collect();
    ranked.sort_by(|a, b| {
        b.locked
            .cmp(&a.locked)
            .then(b.priority.cmp(&a.priority))
            .then(b.area.total_cmp(&a.area))
    });

    let mut packing = Packing::default();
    let mut movers = Vec::new();
    for unit in ranked {
        if unit.is_sound(p) && packing.fits(bounds, &unit.current) {
            packing.placed.extend(unit.current.iter().copied());
        } else {
            movers.push(unit.clone());
        }
    }
    for unit in by_size(&movers) {
        if !packing.first_fit(bounds, unit, p.grid) {
            return None;
        }
    }
    Some(packing)
}

fn shelves(units: &[Unit], bounds: &Rect, _: &SettleParams) -> Option<Packing> {
    let mut items = Vec::with_capacity(units.len());
    for unit in units {
        let shape = unit
            .shapes
            .iter()
            .find(|s| extent(s).0 <= bounds.width + EPS)?;
        let (w, h) = extent(shape);
        items.push((shape, w, h));
    }
    items.sort_by(|a, b| b.2.total_cmp(&a.2).then(b.1.total_cmp(&a.1)));

    let mut packing = Packing::default();
    let (mut x, mut y, mut row) = (bounds.x, bounds.y, 0.0_f32);
    for (shape, w, h) in items {
        if x + w > bounds.x2() + EPS {
            x = bounds.x;
            y += row;
            row = 0.0;
        }
        if y + h > bounds.y2() + EPS {
            return None;
        }
        packing.placed.extend(translate(shape, x, y));
        x += w;
        row = row.max(h);
    }
    Some(packing)
}

fn first_fit(units: &[Unit], bounds: &Rect, p: &SettleParams) -> Option<Packing> {
    let mut packing = Packing::default();
    for unit in by_size(units) {
        if !packing.first_fit(bounds, unit, p.grid) {
            return None;
        }
    }
    Some(packing)
}

/// Corridors keep their place when it is free, else take the first free
/// slot, else are dropped.
fn place_corridors(packing: &mut Packing, corridors: &[(RoomId, Rect)], bounds: &Rect, grid: f32) {
    for &(id, rect) in corridors {
        if packing.fits(bounds, &[(id, rect)]) {
            packing.placed.push((id, rect));
        } else if !packing.first_fit(bounds, &Unit::single(id, rect, false, 0), grid) {
            packing.dropped.push(id);
        }
    }
}

/// True when every room is inside `bounds`, nothing overlaps, and the
/// master pair shares its wall.
pub fn layout_is_sound(set: &RoomSet, bounds: &Rect, p: &SettleParams) -> bool {
    let rooms_ok = set
        .iter()
        .all(|r| r.rect.inside_eps(bounds) && !set.overlaps_any(&r.rect, &[r.id]));
    let (units, _) = collect_units(set, p);
    rooms_ok && units.iter().all(|u| u.is_sound(p))
}

/// Repack the whole layout if it is not sound. See the module docs.
pub fn repack(set: &mut RoomSet, bounds: &Rect, params: &SettleParams) -> RepackReport {
    if layout_is_sound(set, bounds, params) {
        return RepackReport::default();
    }
    let (units, corridors) = collect_units(set, params);
    let strategies: [(Strategy, PackFn); 3] = [
        (Strategy::KeepSound, keep_sound),
        (Strategy::Shelves, shelves),
        (Strategy::FirstFit, first_fit),
    ];

    for (strategy, pack) in strategies {
        let Some(mut packing) = pack(&units, bounds, params) else {
            log::debug!("repack strategy {:?} could not place every room", strategy);
            continue;
        };
        place_corridors(&mut packing, &corridors, bounds, params.grid);

        let mut report = RepackReport {
            strategy: Some(strategy),
            ..RepackReport::default()
        };
        for (id, rect) in packing.placed {
            let Some(room) = set.get(id) else {
                continue;
            };
            if (room.rect.x, room.rect.y) == (rect.x, rect.y) {
                continue;
            }
            report.relocated += 1;
            if room.locked {
                report.relocated_locked += 1;
            }
            set.set_origin(id, rect.x, rect.y);
        }
        for id in packing.dropped {
            if let Some(room) = set.remove(id) {
                log::warn!("Dropped corridor {} while repacking", room.key);
                report.corridors_dropped += 1;
            }
        }
        log::warn!(
            "Repacked layout with {:?}: {} rooms moved ({} locked), {} corridors dropped",
            strategy,
            report.relocated,
            report.relocated_locked,
            report.corridors_dropped
        );
        return report;
    }

    log::warn!("No packing fits every room in the buildable area");
    RepackReport {
        failed: true,
        ..RepackReport::default()
    }
}
