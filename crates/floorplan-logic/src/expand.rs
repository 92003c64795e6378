//! Room expander: grows rooms into free space, then clamps to bounds.

use crate::config::{ExpandBudgets, ExpandConfig};
use crate::geometry::{Rect, EPS};
use crate::model::{Purpose, Role, Room, RoomId, RoomSet};
use crate::settle::nearest_free_slot;

fn budget(room: &Room, budgets: &ExpandBudgets) -> usize {
    match room.purpose {
        Purpose::Living => budgets.living,
        Purpose::Kitchen => budgets.kitchen,
        Purpose::Bedroom if room.role == Role::MasterBedroom => budgets.master_bedroom,
        Purpose::Bedroom => budgets.bedroom,
        _ => budgets.other,
    }
}

/// True when `grown` (the new rectangle of `id`) stays in bounds and keeps
/// its clearance from every other room.
pub fn can_expand(set: &RoomSet, id: RoomId, grown: &Rect, bounds: &Rect, config: &ExpandConfig) -> bool {
    if grown.x2() > bounds.x2() + EPS || grown.y2() > bounds.y2() + EPS {
        return false;
    }
    if grown.x < bounds.x - EPS || grown.y < bounds.y - EPS {
        return false;
    }
    set.iter()
        .filter(|r| r.id != id)
        .filter(|r| !(config.into_circulation && r.is_circulation()))
        .all(|r| !grown.collides_with_clearance(&r.rect, config.clearance))
}

/// Grow every eligible room, highest priority first: width, then height,
/// one step at a time until a step fails or the budget runs out.
///
/// Origins never move, so locked rooms only grow their far edges.
/// Returns the total number of steps taken.
pub fn expand_rooms(set: &mut RoomSet, bounds: &Rect, config: &ExpandConfig) -> usize {
    let mut order: Vec<(RoomId, i32)> = set.iter().map(|r| (r.id, r.priority)).collect();
    order.sort_by(|a, b| b.1.cmp(&a.1));

    let mut steps = 0;
    for (id, _) in order {
        let Some(room) = set.get(id) else {
            continue;
        };
        if room.is(Purpose::Bathroom) || room.is_circulation() {
            continue;
        }
        let max_steps = budget(room, &config.budgets);

        for horizontal in [true, false] {
            for _ in 0..max_steps {
                let Some(mut grown) = set.rect(id) else {
                    break;
                };
                if horizontal {
                    grown.width += config.step;
                } else {
                    grown.height += config.step;
                }
                if !can_expand(set, id, &grown, bounds, config) {
                    break;
                }
                if let Some(room) = set.get_mut(id) {
                    room.rect = grown;
                }
                steps += 1;
            }
        }
    }
    log::info!("Expanded rooms by {} steps", steps);
    steps
}

/// Force every room back inside `bounds`. Returns how many had to move.
///
/// A room whose clamped position would overlap a neighbour goes to the
/// nearest free grid slot instead, and stays put when there is none.
pub fn clamp_to_bounds(set: &mut RoomSet, bounds: &Rect, grid: f32) -> usize {
    let mut moved = 0;
    for id in set.ids() {
        let Some(room) = set.get(id) else {
            continue;
        };
        if room.rect.inside_eps(bounds) {
            continue;
        }
        let clamped = room.rect.clamped_into(bounds);
        let target = if set.overlaps_any(&clamped, &[id]) {
            nearest_free_slot(set, bounds, id, grid)
        } else {
            Some(clamped)
        };
        let key = room.key.clone();
        match target {
            Some(rect) => {
                set.set_origin(id, rect.x, rect.y);
                log::debug!("clamped {} into bounds at ({}, {})", key, rect.x, rect.y);
                moved += 1;
            }
            None => log::warn!("No free space to pull {} inside the buildable area", key),
        }
    }
    moved
}
