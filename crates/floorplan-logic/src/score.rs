//! Heuristic quality score of a finished layout.

use crate::config::ScoreConfig;
use crate::geometry::Rect;
use crate::model::{Door, Purpose, RoomSet};

/// Score a layout. Starts at `base`, subtracts penalties, adds a compactness
/// bonus, and never goes below zero.
pub fn score_layout(set: &RoomSet, doors: &[Door], config: &ScoreConfig) -> i32 {
    let mut score = config.base;
    let shares_wall = |a: &Rect, b: &Rect| {
        a.shares_wall(b, config.wall_tolerance, config.wall_min_overlap)
    };

    let living = set.find_purpose(Purpose::Living).and_then(|id| set.get(id));
    let kitchen = set.find_purpose(Purpose::Kitchen).and_then(|id| set.get(id));

    // Living room used as a hallway.
    if let Some(living) = living {
        let degree = doors.iter().filter(|d| d.touches(living.id)).count();
        if degree > config.living_door_allowance {
            score -= (degree - config.living_door_allowance) as i32 * config.living_door_penalty;
        }
    }

    if let Some(kitchen) = kitchen {
        let noisy = set
            .iter()
            .filter(|r| r.is(Purpose::Bedroom) && shares_wall(&kitchen.rect, &r.rect))
            .count();
        score -= noisy as i32 * config.bedroom_kitchen_penalty;
    }

    if let Some(living) = living {
        let exposed = set
            .iter()
            .filter(|r| r.is(Purpose::Bathroom) && shares_wall(&living.rect, &r.rect))
            .count();
        score -= exposed as i32 * config.bathroom_living_penalty;
    }

    let corridors = set.iter().filter(|r| r.is_circulation()).count();
    if corridors > config.corridor_allowance {
        score -= (corridors - config.corridor_allowance) as i32 * config.corridor_penalty;
    }

    score += config.compactness_target.saturating_sub(set.len()) as i32;

    score.max(0)
}
