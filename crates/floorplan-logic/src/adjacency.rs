//! Adjacency refiner: snaps movable rooms against their anchors so that
//! "attach" edges end up sharing a wall.

use crate::config::RefineConfig;
use crate::geometry::{snap, Rect, Side};
use crate::model::{EdgePreference, Purpose, Relation, Role, RoomId, RoomSet};

/// Counters for one refinement run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefineStats {
    /// Attach edges whose target was moved.
    pub snapped: usize,
    /// Attach edges with no qualifying candidate; the target stayed put.
    pub misses: usize,
}

/// One attach edge scheduled for processing.
#[derive(Debug, Clone, Copy)]
struct Attachment {
    score: i32,
    anchor: RoomId,
    target: RoomId,
    preference: Option<EdgePreference>,
}

/// Run the refiner for `iterations` passes, then snap movable rooms to `grid`.
pub fn refine(
    set: &mut RoomSet,
    bounds: &Rect,
    config: &RefineConfig,
    grid: f32,
    iterations: usize,
) -> RefineStats {
    let mut stats = RefineStats::default();

    for _ in 0..iterations {
        attach_master_bath(set, config.clearance);

        for attachment in collect_attachments(set) {
            let (Some(anchor), Some(target)) = (set.get(attachment.anchor), set.get(attachment.target))
            else {
                continue;
            };
            if anchor.is_circulation() || target.is_circulation() || target.locked {
                continue;
            }
            match best_snap(set, bounds, config, grid, &attachment) {
                Some((x, y)) => {
                    set.set_origin(attachment.target, x, y);
                    stats.snapped += 1;
                }
                None => {
                    log::debug!(
                        "no attach candidate for {:?} against {:?}",
                        attachment.target,
                        attachment.anchor
                    );
                    stats.misses += 1;
                }
            }
        }
    }

    let bath = set.find_role(Role::MasterBathroom);
    for room in set.iter_mut() {
        if !room.locked || Some(room.id) == bath {
            room.rect.x = snap(room.rect.x, grid);
            room.rect.y = snap(room.rect.y, grid);
        }
    }
    stats
}

/// Put the master bathroom flush right of the master bedroom, tops aligned.
fn attach_master_bath(set: &mut RoomSet, clearance: f32) {
    let Some((bed, bath)) = set.master_pair() else {
        return;
    };
    if let Some(b) = set.rect(bed) {
        set.set_origin(bath, b.x2() + clearance, b.y);
        set.set_locked(bath, true);
    }
}

fn attachment_score(anchor: Purpose, target: Purpose) -> i32 {
    match (anchor, target) {
        (Purpose::Bedroom, Purpose::Bathroom) => 80,
        (Purpose::Kitchen, Purpose::Living) | (Purpose::Living, Purpose::Kitchen) => 70,
        (Purpose::Living, Purpose::Bathroom) => 75,
        _ => 50,
    }
}

/// Every attach edge except those targeting the master bathroom, highest score first.
fn collect_attachments(set: &RoomSet) -> Vec<Attachment> {
    let mut attachments = Vec::new();
    for anchor in set.iter() {
        for edge in anchor.edges.iter().filter(|e| e.relation == Relation::Attach) {
            let Some(target) = set.get(edge.target) else {
                continue;
            };
            if target.role == Role::MasterBathroom || target.id == anchor.id {
                continue;
            }
            attachments.push(Attachment {
                score: attachment_score(anchor.purpose, target.purpose),
                anchor: anchor.id,
                target: target.id,
                preference: edge.preference,
            });
        }
    }
    // sort_by is stable, so equal scores keep edge order
    attachments.sort_by(|a, b| b.score.cmp(&a.score));
    attachments
}

fn preferred_side(preference: Option<EdgePreference>) -> Option<Side> {
    match preference? {
        EdgePreference::Front => Some(Side::Top),
        EdgePreference::Rear => Some(Side::Bottom),
        EdgePreference::Left => Some(Side::Left),
        EdgePreference::Right => Some(Side::Right),
        EdgePreference::Center => None,
    }
}

/// Candidate origin for `mover` flush against `side` of `anchor`.
fn candidate(anchor: &Rect, mover: &Rect, side: Side, clearance: f32) -> (f32, f32) {
    match side {
        Side::Right => (anchor.x2() + clearance, anchor.y),
        Side::Left => (anchor.x - mover.width - clearance, anchor.y),
        Side::Top => (anchor.x, anchor.y - mover.height - clearance),
        Side::Bottom => (anchor.x, anchor.y2() + clearance),
    }
}

fn best_snap(
    set: &RoomSet,
    bounds: &Rect,
    config: &RefineConfig,
    grid: f32,
    attachment: &Attachment,
) -> Option<(f32, f32)> {
    let anchor = set.rect(attachment.anchor)?;
    let mover = set.rect(attachment.target)?;
    let preferred = preferred_side(attachment.preference);
    let skip = [attachment.anchor, attachment.target];

    let mut scored: Vec<(f32, f32, f32)> = Vec::with_capacity(4);
    for side in Side::ALL {
        let (x, y) = candidate(&anchor, &mover, side, config.clearance);
        let placed = mover.at(x, y);
        if !placed.inside_eps(bounds) || set.overlaps_any(&placed, &skip) {
            continue;
        }
        let overlap = if side.is_horizontal_neighbour() {
            anchor.span_overlap_y(&placed)
        } else {
            anchor.span_overlap_x(&placed)
        };
        if overlap < config.min_shared_wall {
            continue;
        }
        let mut score = overlap * 100.0 - anchor.manhattan(&placed) * 2.0;
        if preferred == Some(side) {
            score += overlap * 100.0;
        }
        scored.push((score, x, y));
    }

    scored
        .into_iter()
        .max_by(|a, b| {
            a.0.total_cmp(&b.0)
                .then(a.1.total_cmp(&b.1))
                .then(a.2.total_cmp(&b.2))
        })
        .map(|(_, x, y)| (snap(x, grid), snap(y, grid)))
}
