//! Opt-in final nudges: corridors onto whole units, bathrooms onto the
//! two-unit plumbing grid.
//!
//! A nudge is only applied when the room stays inside the buildable area and
//! clear of every other room. Locked rooms and the master pair never move.
//! Disabled by default.

use crate::geometry::Rect;
use crate::model::{Purpose, RoomSet};

/// Round unlocked corridor origins and unlocked bathroom x positions.
/// Returns the number of rooms that moved.
pub fn polish_layout(set: &mut RoomSet, bounds: &Rect) -> usize {
    let pair = set.master_pair();
    let mut moved = 0;
    for id in set.ids() {
        let Some(room) = set.get(id) else {
            continue;
        };
        if room.locked || pair.is_some_and(|(bed, bath)| id == bed || id == bath) {
            continue;
        }
        let r = room.rect;
        let target = if room.is_circulation() {
            r.at(r.x.round(), r.y.round())
        } else if room.is(Purpose::Bathroom) {
            r.at((r.x / 2.0).round() * 2.0, r.y)
        } else {
            continue;
        };
        if (target.x, target.y) == (r.x, r.y) {
            continue;
        }
        if !target.inside_eps(bounds) || set.overlaps_any(&target, &[id]) {
            log::debug!("polish of {} rejected: would collide or leave bounds", room.key);
            continue;
        }
        set.set_origin(id, target.x, target.y);
        moved += 1;
    }
    moved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::test_support::{make_room, with_role};
    use crate::model::Role;

    fn bounds() -> Rect {
        Rect::new(5.0, 5.0, 30.0, 30.0)
    }

    #[test]
    fn test_polish_rounds_corridors_and_bathrooms() {
        let mut set = RoomSet::new();
        let hall = make_room(&mut set, "hall", Purpose::Circulation, Rect::new(6.5, 9.5, 4.0, 8.0));
        let bath = make_room(&mut set, "bath", Purpose::Bathroom, Rect::new(13.5, 6.5, 5.0, 5.0));
        let bed = make_room(&mut set, "bed", Purpose::Bedroom, Rect::new(6.5, 20.5, 10.0, 10.0));

        assert_eq!(polish_layout(&mut set, &bounds()), 2);
        assert_eq!(set.rect(hall).map(|r| (r.x, r.y)), Some((7.0, 10.0)));
        assert_eq!(set.rect(bath).map(|r| (r.x, r.y)), Some((14.0, 6.5)));
        assert_eq!(set.rect(bed).map(|r| (r.x, r.y)), Some((6.5, 20.5)));
    }

    #[test]
    fn test_locked_rooms_stay() {
        let mut set = RoomSet::new();
        let bath = make_room(&mut set, "bath", Purpose::Bathroom, Rect::new(16.5, 6.0, 5.0, 5.0));
        let hall = make_room(&mut set, "hall", Purpose::Circulation, Rect::new(6.5, 20.5, 4.0, 8.0));
        set.set_locked(bath, true);
        set.set_locked(hall, true);

        assert_eq!(polish_layout(&mut set, &bounds()), 0);
        assert_eq!(set.rect(bath).map(|r| r.x), Some(16.5));
        assert_eq!(set.rect(hall).map(|r| (r.x, r.y)), Some((6.5, 20.5)));
    }

    #[test]
    fn test_colliding_nudge_is_rejected() {
        let mut set = RoomSet::new();
        let bed = make_room(&mut set, "bed", Purpose::Bedroom, Rect::new(5.0, 5.0, 11.5, 10.0));
        let bath = make_room(&mut set, "bath", Purpose::Bathroom, Rect::new(16.5, 5.0, 5.0, 5.0));
        let edge = make_room(&mut set, "edge", Purpose::Circulation, Rect::new(30.5, 20.0, 4.5, 4.0));

        // Bath rounds down into the bedroom, the corridor rounds out of bounds.
        assert_eq!(polish_layout(&mut set, &bounds()), 0);
        assert_eq!(set.rect(bath).map(|r| r.x), Some(16.5));
        assert_eq!(set.rect(edge).map(|r| r.x), Some(30.5));
        assert!(!set.overlaps_any(&set.rect(bed).unwrap(), &[bed]));
    }

    #[test]
    fn test_master_bath_stays_flush() {
        let mut set = RoomSet::new();
        let bed = make_room(&mut set, "mbed", Purpose::Bedroom, Rect::new(5.0, 5.0, 10.5, 10.0));
        let bath = make_room(&mut set, "mbath", Purpose::Bathroom, Rect::new(15.5, 5.0, 5.0, 5.0));
        with_role(&mut set, bed, Role::MasterBedroom);
        with_role(&mut set, bath, Role::MasterBathroom);

        assert_eq!(polish_layout(&mut set, &bounds()), 0);
        assert_eq!(set.rect(bath).map(|r| r.x), Some(15.5));
    }
}
