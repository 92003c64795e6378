//! Overlap resolver: pushes rooms apart pair by pair until a full pass sees
//! no overlapping pair, or the pass cap runs out.

use crate::config::OverlapConfig;
use crate::geometry::Rect;
use crate::model::{Purpose, Role, Room, RoomId, RoomSet};

/// Result of one resolver run. Never an error: hitting the cap is reported here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlapOutcome {
    pub passes: usize,
    pub converged: bool,
    /// Overlapping pairs left when the run ended.
    pub remaining: usize,
}

/// Resolve overlaps in place.
pub fn resolve(set: &mut RoomSet, config: &OverlapConfig) -> OverlapOutcome {
    let ids = set.ids();

    for pass in 1..=config.max_passes {
        let mut changed = false;
        let mut found = 0;

        for i in 0..ids.len() {
            for j in (i + 1)..ids.len() {
                let (Some(a), Some(b)) = (set.get(ids[i]), set.get(ids[j])) else {
                    continue;
                };
                if !a.rect.overlaps(&b.rect) {
                    continue;
                }
                // Skipped pairs still count, so a stuck pair keeps the loop going.
                found += 1;

                if (a.is_circulation() && b.is_circulation())
                    || (a.locked && b.locked)
                    || set.is_master_pair(a.id, b.id)
                {
                    continue;
                }

                let (mover, anchor, stack_below) = choose_mover(a, b);
                let (m, an) = (mover.rect, anchor.rect);
                let target = if stack_below {
                    m.at(m.x, an.y2() + config.clearance)
                } else {
                    push_away(&m, &an, config.clearance)
                };
                log::debug!(
                    "pass {}: moving {} off {} to ({}, {})",
                    pass,
                    mover.key,
                    anchor.key,
                    target.x,
                    target.y
                );
                let mover_id = mover.id;
                set.set_origin(mover_id, target.x, target.y);
                changed = true;
            }
        }

        if !changed && found == 0 {
            return OverlapOutcome {
                passes: pass,
                converged: true,
                remaining: 0,
            };
        }
    }

    let remaining = count_overlaps(set);
    log::warn!(
        "Overlap resolver stopped after {} passes with {} overlapping pairs",
        config.max_passes,
        remaining
    );
    OverlapOutcome {
        passes: config.max_passes,
        converged: false,
        remaining,
    }
}

/// Number of overlapping room pairs.
pub fn count_overlaps(set: &RoomSet) -> usize {
    let rooms: Vec<&Room> = set.iter().collect();
    let mut count = 0;
    for (i, a) in rooms.iter().enumerate() {
        for b in &rooms[i + 1..] {
            if a.rect.overlaps(&b.rect) {
                count += 1;
            }
        }
    }
    count
}

fn is_foyer(room: &Room) -> bool {
    room.role == Role::Foyer || room.is(Purpose::Foyer)
}

/// Pick which room of an overlapping pair moves.
///
/// Returns `(mover, anchor, stack_below)`; `stack_below` means the mover is a
/// bedroom dropped under the kitchen instead of being pushed.
fn choose_mover<'a>(a: &'a Room, b: &'a Room) -> (&'a Room, &'a Room, bool) {
    if a.is(Purpose::Kitchen) && b.is(Purpose::Bedroom) && !b.locked {
        return (b, a, true);
    }
    if b.is(Purpose::Kitchen) && a.is(Purpose::Bedroom) && !a.locked {
        return (a, b, true);
    }

    if !a.locked && !b.locked {
        let rules: [fn(&Room) -> bool; 3] = [
            |r| r.is(Purpose::Living),
            |r| r.is(Purpose::Kitchen),
            is_foyer,
        ];
        for rule in rules {
            if rule(a) {
                return (b, a, false);
            }
            if rule(b) {
                return (a, b, false);
            }
        }
    }

    let (mover, anchor) = separate_by_priority(a, b);
    (mover, anchor, false)
}

fn separate_by_priority<'a>(a: &'a Room, b: &'a Room) -> (&'a Room, &'a Room) {
    if a.locked {
        return (b, a);
    }
    if b.locked {
        return (a, b);
    }
    if a.priority != b.priority {
        return if a.priority > b.priority { (b, a) } else { (a, b) };
    }
    if a.area() <= b.area() {
        (a, b)
    } else {
        (b, a)
    }
}

/// Move `mover` flush against `anchor` on the axis of least penetration,
/// leaving `clearance` between them.
pub fn push_away(mover: &Rect, anchor: &Rect, clearance: f32) -> Rect {
    let from_left = anchor.x2() - mover.x;
    let from_right = mover.x2() - anchor.x;
    let from_below = anchor.y2() - mover.y;
    let from_above = mover.y2() - anchor.y;
    let least = from_left.min(from_right).min(from_below).min(from_above);

    if least == from_left {
        mover.at(anchor.x2() + clearance, mover.y)
    } else if least == from_right {
        mover.at(anchor.x - mover.width - clearance, mover.y)
    } else if least == from_below {
        mover.at(mover.x, anchor.y2() + clearance)
    } else {
        mover.at(mover.x, anchor.y - mover.height - clearance)
    }
}

/// Ids of every room overlapping `id`.
pub fn overlapping(set: &RoomSet, id: RoomId) -> Vec<RoomId> {
    let Some(rect) = set.rect(id) else {
        return Vec::new();
    };
    set.iter()
        .filter(|r| r.id != id && r.rect.overlaps(&rect))
        .map(|r| r.id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::test_support::{make_room, with_role};

    #[test]
    fn test_push_away_least_penetration() {
        let anchor = Rect::new(0.0, 0.0, 10.0, 10.0);
        let pushed = push_away(&Rect::new(8.0, 2.0, 6.0, 4.0), &anchor, 1.0);
        assert_eq!((pushed.x, pushed.y), (11.0, 2.0));
        let pushed = push_away(&Rect::new(2.0, -3.0, 4.0, 5.0), &anchor, 1.0);
        assert_eq!((pushed.x, pushed.y), (2.0, -6.0));
    }

    #[test]
    fn test_smaller_room_is_pushed_on_tie() {
        let mut set = RoomSet::new();
        let big = make_room(&mut set, "store", Purpose::Store, Rect::new(0.0, 0.0, 10.0, 10.0));
        let small = make_room(&mut set, "study", Purpose::Study, Rect::new(5.0, 0.0, 4.0, 4.0));

        let outcome = resolve(&mut set, &OverlapConfig::default());

        assert!(outcome.converged);
        assert_eq!(outcome.passes, 2);
        assert_eq!(set.rect(big).map(|r| (r.x, r.y)), Some((0.0, 0.0)));
        let s = set.rect(small).unwrap();
        assert_eq!((s.x, s.y), (5.0, -5.0), "pushed up: least penetration");
    }

    #[test]
    fn test_bedroom_stacks_below_kitchen() {
        let mut set = RoomSet::new();
        let kitchen = make_room(&mut set, "kitchen", Purpose::Kitchen, Rect::new(0.0, 0.0, 8.0, 8.0));
        let bed = make_room(&mut set, "bed", Purpose::Bedroom, Rect::new(2.0, 2.0, 10.0, 10.0));

        resolve(&mut set, &OverlapConfig::default());

        let b = set.rect(bed).unwrap();
        assert_eq!((b.x, b.y), (2.0, 9.0));
        assert_eq!(set.rect(kitchen).map(|r| (r.x, r.y)), Some((0.0, 0.0)));
    }

    #[test]
    fn test_living_pushes_lower_priority_rooms() {
        let mut set = RoomSet::new();
        let bed = make_room(&mut set, "bed", Purpose::Bedroom, Rect::new(0.0, 0.0, 10.0, 10.0));
        let living = make_room(&mut set, "living", Purpose::Living, Rect::new(8.0, 0.0, 12.0, 10.0));
        if let Some(r) = set.get_mut(bed) {
            r.priority = 200;
        }

        resolve(&mut set, &OverlapConfig::default());

        assert_eq!(set.rect(living).map(|r| (r.x, r.y)), Some((8.0, 0.0)));
        let b = set.rect(bed).unwrap();
        assert_eq!((b.x, b.y), (-3.0, 0.0));
    }

    #[test]
    fn test_locked_room_never_moves() {
        let mut set = RoomSet::new();
        let living = make_room(&mut set, "living", Purpose::Living, Rect::new(0.0, 0.0, 10.0, 10.0));
        let store = make_room(&mut set, "store", Purpose::Store, Rect::new(9.0, 0.0, 4.0, 4.0));
        set.set_locked(living, true);

        let outcome = resolve(&mut set, &OverlapConfig::default());

        assert!(outcome.converged);
        assert_eq!(set.rect(living).map(|r| (r.x, r.y)), Some((0.0, 0.0)));
        assert_eq!(set.rect(store).map(|r| (r.x, r.y)), Some((11.0, 0.0)));
    }

    #[test]
    fn test_cap_exhaustion_is_soft() {
        let mut set = RoomSet::new();
        let a = make_room(&mut set, "a", Purpose::Store, Rect::new(0.0, 0.0, 10.0, 10.0));
        let b = make_room(&mut set, "b", Purpose::Store, Rect::new(5.0, 5.0, 10.0, 10.0));
        set.set_locked(a, true);
        set.set_locked(b, true);

        let config = OverlapConfig {
            max_passes: 5,
            ..OverlapConfig::default()
        };
        let outcome = resolve(&mut set, &config);

        assert_eq!(
            outcome,
            OverlapOutcome {
                passes: 5,
                converged: false,
                remaining: 1
            }
        );
    }

    #[test]
    fn test_master_pair_is_never_separated() {
        let mut set = RoomSet::new();
        let bed = make_room(&mut set, "mbed", Purpose::Bedroom, Rect::new(0.0, 0.0, 10.0, 10.0));
        let bath = make_room(&mut set, "mbath", Purpose::Bathroom, Rect::new(9.0, 0.0, 5.0, 5.0));
        with_role(&mut set, bed, Role::MasterBedroom);
        with_role(&mut set, bath, Role::MasterBathroom);

        let config = OverlapConfig {
            max_passes: 3,
            ..OverlapConfig::default()
        };
        let outcome = resolve(&mut set, &config);

        assert!(!outcome.converged);
        assert_eq!(set.rect(bath).map(|r| (r.x, r.y)), Some((9.0, 0.0)));
        assert_eq!(overlapping(&set, bed), vec![bath]);
    }
}
