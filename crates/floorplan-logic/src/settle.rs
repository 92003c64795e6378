//! Legalizer: restores the geometric invariants the heuristic phases can
//! leave broken.
//!
//! Two deterministic steps. The master bathroom is re-attached to the master
//! bedroom, sliding along the bedroom's sides (or moving the pair as a unit).
//! Then every movable room that is out of bounds or overlapping is relocated
//! to the nearest free grid slot. A pair that could not be re-attached is
//! settled like any other room so it never stays overlapping. Nothing here
//! is an error; rooms that cannot be placed are logged and counted.

use crate::config::LayoutConfig;
use crate::geometry::{Rect, Side};
use crate::model::{Room, RoomId, RoomSet};

/// Maximum pair/settle rounds per legalization.
const MAX_ROUNDS: usize = 3;

/// Thresholds the legalizer needs from [`LayoutConfig`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SettleParams {
    pub grid: f32,
    pub adjacency_tolerance: f32,
    pub min_shared_wall: f32,
    pub clearance: f32,
}

impl From<&LayoutConfig> for SettleParams {
    fn from(config: &LayoutConfig) -> Self {
        Self {
            grid: config.grid,
            adjacency_tolerance: config.adjacency_tolerance,
            min_shared_wall: config.refine.min_shared_wall,
            clearance: config.refine.clearance,
        }
    }
}

/// What happened to the master pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairOutcome {
    /// No master bedroom or bathroom in the plan.
    Absent,
    Sound,
    Repaired,
    Unresolved,
}

/// Counters from one settle run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SettleReport {
    pub moved: usize,
    pub unresolved: usize,
}

/// Counters from a full legalization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LegalizeReport {
    pub moved: usize,
    pub pair_repaired: bool,
    pub pair_unresolved: bool,
    /// Rooms still out of bounds or overlapping after the last round.
    pub unresolved: usize,
}

/// Run pair enforcement and settling of unlocked rooms until stable.
///
/// Pair members are left to [`enforce_master_pair`] while it succeeds. Once
/// it gives up they are settled too, locks included.
pub fn legalize(set: &mut RoomSet, bounds: &Rect, params: &SettleParams) -> LegalizeReport {
    let mut report = LegalizeReport::default();
    let members = set.master_pair();
    let in_pair = |id: RoomId| members.is_some_and(|(bed, bath)| id == bed || id == bath);

    for _ in 0..MAX_ROUNDS {
        let pair = enforce_master_pair(set, bounds, params);
        let loose = pair == PairOutcome::Unresolved;
        let settle = settle_rooms(set, bounds, params, |r| {
            if in_pair(r.id) {
                loose
            } else {
                !r.locked
            }
        });

        report.moved += settle.moved;
        report.pair_repaired |= pair == PairOutcome::Repaired;
        report.pair_unresolved = pair == PairOutcome::Unresolved;
        report.unresolved = settle.unresolved;

        if pair != PairOutcome::Repaired && settle.moved == 0 {
            break;
        }
    }
    report
}

fn pair_is_sound(set: &RoomSet, bed: RoomId, bath: RoomId, bounds: &Rect, p: &SettleParams) -> bool {
    let (Some(b), Some(t)) = (set.rect(bed), set.rect(bath)) else {
        return true;
    };
    let skip = [bed, bath];
    b.inside_eps(bounds)
        && t.inside_eps(bounds)
        && !b.overlaps(&t)
        && !set.overlaps_any(&b, &skip)
        && !set.overlaps_any(&t, &skip)
        && b.shared_wall_length(&t, p.adjacency_tolerance) >= p.min_shared_wall
}

/// Make the master bathroom sit flush against the master bedroom.
pub fn enforce_master_pair(set: &mut RoomSet, bounds: &Rect, params: &SettleParams) -> PairOutcome {
    let Some((bed, bath)) = set.master_pair() else {
        return PairOutcome::Absent;
    };
    if pair_is_sound(set, bed, bath, bounds, params) {
        return PairOutcome::Sound;
    }
    let (Some(bed_room), Some(bath_rect)) = (set.get(bed), set.rect(bath)) else {
        return PairOutcome::Absent;
    };
    let bed_rect = bed_room.rect;
    let bed_locked = bed_room.locked;
    let skip = [bed, bath];

    let bed_ok = bed_rect.inside_eps(bounds) && !set.overlaps_any(&bed_rect, &skip);
    if bed_ok {
        if let Some(slot) = bath_slot(set, bounds, params, &bed_rect, &bath_rect, &skip) {
            set.set_origin(bath, slot.x, slot.y);
            set.set_locked(bath, true);
            log::debug!("master bath re-attached at ({}, {})", slot.x, slot.y);
            return PairOutcome::Repaired;
        }
    }

    if !bed_locked {
        if let Some((b, t)) = unit_slot(set, bounds, params, &bed_rect, &bath_rect, &skip) {
            set.set_origin(bed, b.x, b.y);
            set.set_origin(bath, t.x, t.y);
            set.set_locked(bath, true);
            log::debug!("master suite moved to ({}, {})", b.x, b.y);
            return PairOutcome::Repaired;
        }
    }

    log::warn!("Could not place the master bathroom against the master bedroom");
    PairOutcome::Unresolved
}

/// Offsets 0, -g, +g, -2g, ... up to `reach` either way.
fn slide_offsets(grid: f32, reach: f32) -> Vec<f32> {
    let steps = (reach / grid).ceil() as i32;
    let mut offsets = vec![0.0];
    for k in 1..=steps {
        offsets.push(-(k as f32) * grid);
        offsets.push(k as f32 * grid);
    }
    offsets
}

fn fits(set: &RoomSet, bounds: &Rect, rect: &Rect, skip: &[RoomId]) -> bool {
    rect.inside_eps(bounds) && !set.overlaps_any(rect, skip)
}

/// First free slot for the bath flush against the bed: right, below, left,
/// above, each side tried nearest-aligned first.
fn bath_slot(
    set: &RoomSet,
    bounds: &Rect,
    p: &SettleParams,
    bed: &Rect,
    bath: &Rect,
    skip: &[RoomId],
) -> Option<Rect> {
    let reach = bed.width.max(bed.height) + bath.width.max(bath.height);
    let offsets = slide_offsets(p.grid, reach);
    for side in [Side::Right, Side::Bottom, Side::Left, Side::Top] {
        for &d in &offsets {
            let rect = match side {
                Side::Right => bath.at(bed.x2() + p.clearance, bed.y + d),
                Side::Left => bath.at(bed.x - bath.width - p.clearance, bed.y + d),
                Side::Bottom => bath.at(bed.x + d, bed.y2() + p.clearance),
                Side::Top => bath.at(bed.x + d, bed.y - bath.height - p.clearance),
            };
            if bed.shared_wall_length(&rect, p.adjacency_tolerance) < p.min_shared_wall {
                continue;
            }
            if fits(set, bounds, &rect, skip) {
                return Some(rect);
            }
        }
    }
    None
}

/// Nearest grid origin for the bed with a free aligned bath slot beside it.
fn unit_slot(
    set: &RoomSet,
    bounds: &Rect,
    p: &SettleParams,
    bed: &Rect,
    bath: &Rect,
    skip: &[RoomId],
) -> Option<(Rect, Rect)> {
    let mut origins = grid_origins(bounds, bed, p.grid);
    origins.sort_by(|a, b| {
        let da = (a.0 - bed.x).abs() + (a.1 - bed.y).abs();
        let db = (b.0 - bed.x).abs() + (b.1 - bed.y).abs();
        da.total_cmp(&db)
    });
    for (x, y) in origins {
        let b = bed.at(x, y);
        if set.overlaps_any(&b, skip) {
            continue;
        }
        for side in Side::ALL {
            let t = match side {
                Side::Right => bath.at(b.x2() + p.clearance, b.y),
                Side::Bottom => bath.at(b.x, b.y2() + p.clearance),
                Side::Left => bath.at(b.x - bath.width - p.clearance, b.y),
                Side::Top => bath.at(b.x, b.y - bath.height - p.clearance),
            };
            if b.shared_wall_length(&t, p.adjacency_tolerance) >= p.min_shared_wall
                && fits(set, bounds, &t, skip)
            {
                return Some((b, t));
            }
        }
    }
    None
}

/// Every grid-aligned origin at which `rect` lies inside `bounds`, row by row.
pub(crate) fn grid_origins(bounds: &Rect, rect: &Rect, grid: f32) -> Vec<(f32, f32)> {
    let nx = ((bounds.width - rect.width) / grid + 1e-3).floor();
    let ny = ((bounds.height - rect.height) / grid + 1e-3).floor();
    if nx < 0.0 || ny < 0.0 {
        return Vec::new();
    }
    let (nx, ny) = (nx as usize, ny as usize);
    let mut origins = Vec::with_capacity((nx + 1) * (ny + 1));
    for j in 0..=ny {
        for i in 0..=nx {
            origins.push((bounds.x + i as f32 * grid, bounds.y + j as f32 * grid));
        }
    }
    origins
}

/// Nearest (Manhattan) free slot for `id`; earlier rows win ties.
pub fn nearest_free_slot(set: &RoomSet, bounds: &Rect, id: RoomId, grid: f32) -> Option<Rect> {
    let current = set.rect(id)?;
    let skip = [id];
    let mut best: Option<(f32, Rect)> = None;
    for (x, y) in grid_origins(bounds, &current, grid) {
        let dist = (x - current.x).abs() + (y - current.y).abs();
        if best.as_ref().is_some_and(|(d, _)| dist >= *d) {
            continue;
        }
        let rect = current.at(x, y);
        if !set.overlaps_any(&rect, &skip) {
            best = Some((dist, rect));
        }
    }
    best.map(|(_, rect)| rect)
}

fn is_offending(set: &RoomSet, room: &Room, bounds: &Rect) -> bool {
    !room.rect.inside_eps(bounds) || set.overlaps_any(&room.rect, &[room.id])
}

/// Relocate every room `movable` accepts that is out of bounds or overlapping.
///
/// Offenders move lowest priority first, smallest first on ties.
pub fn settle_rooms<F>(set: &mut RoomSet, bounds: &Rect, params: &SettleParams, movable: F) -> SettleReport
where
    F: Fn(&Room) -> bool,
{
    let mut offenders: Vec<&Room> = set
        .iter()
        .filter(|r| movable(*r) && is_offending(set, r, bounds))
        .collect();
    offenders.sort_by(|a, b| {
        a.priority
            .cmp(&b.priority)
            .then(a.area().total_cmp(&b.area()))
    });
    let offenders: Vec<RoomId> = offenders.into_iter().map(|r| r.id).collect();

    let mut report = SettleReport::default();
    for id in offenders {
        // An earlier move may already have cleared this one.
        match set.get(id) {
            Some(room) if is_offending(set, room, bounds) => {}
            _ => continue,
        }
        match nearest_free_slot(set, bounds, id, params.grid) {
            Some(slot) => {
                set.set_origin(id, slot.x, slot.y);
                report.moved += 1;
            }
            None => {
                let key = set.get(id).map(|r| r.key.clone()).unwrap_or_default();
                log::warn!("No free slot for room {}; leaving it in place", key);
                report.unresolved += 1;
            }
        }
    }
    report
}
