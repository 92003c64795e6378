//! Door inference from shared walls.
//!
//! Two rooms get a door when a wall of one lies on a wall of the other and
//! the shared span is long enough. Some pairings never get a direct door:
//! corridor to corridor, and two private rooms unless one is a bathroom.

use crate::config::DoorConfig;
use crate::geometry::{Orientation, Rect};
use crate::model::{Door, Purpose, Room, RoomSet, Zone};

/// Returns true if two rooms may be connected by a direct door.
pub fn should_have_door(a: &Room, b: &Room) -> bool {
    if a.is_circulation() && b.is_circulation() {
        return false;
    }
    if a.zone == Zone::Private && b.zone == Zone::Private {
        return a.is(Purpose::Bathroom) || b.is(Purpose::Bathroom);
    }
    true
}

/// Door position on the first matching wall pairing: `a` right on `b` left,
/// `a` left on `b` right, `a` bottom on `b` top, `a` top on `b` bottom.
pub fn shared_wall(a: &Rect, b: &Rect, config: &DoorConfig) -> Option<(Orientation, f32, f32)> {
    let vertical = [(a.x2(), b.x), (a.x, b.x2())];
    for (wall, other) in vertical {
        if (wall - other).abs() < config.tolerance {
            let span = a.span_overlap_y(b);
            if span > config.min_overlap {
                return Some((Orientation::Vertical, wall, a.y.max(b.y) + span / 2.0));
            }
        }
    }

    let horizontal = [(a.y2(), b.y), (a.y, b.y2())];
    for (wall, other) in horizontal {
        if (wall - other).abs() < config.tolerance {
            let span = a.span_overlap_x(b);
            if span > config.min_overlap {
                return Some((Orientation::Horizontal, a.x.max(b.x) + span / 2.0, wall));
            }
        }
    }
    None
}

/// Emit one door per eligible room pair, in room order.
pub fn place_doors(set: &RoomSet, config: &DoorConfig) -> Vec<Door> {
    let rooms: Vec<&Room> = set.iter().collect();
    let mut doors = Vec::new();

    for (i, a) in rooms.iter().enumerate() {
        for b in &rooms[i + 1..] {
            let Some((orientation, x, y)) = shared_wall(&a.rect, &b.rect, config) else {
                continue;
            };
            if !should_have_door(a, b) {
                continue;
            }
            doors.push(Door {
                from: a.id,
                to: b.id,
                x,
                y,
                orientation,
            });
        }
    }

    log::info!("Placed {} doors", doors.len());
    doors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::test_support::make_room;

    fn room(purpose: Purpose, zone: Zone) -> Room {
        let mut set = RoomSet::new();
        let id = make_room(&mut set, "r", purpose, Rect::new(0.0, 0.0, 4.0, 4.0));
        let mut room = set.get(id).unwrap().clone();
        room.zone = zone;
        room
    }

    #[test]
    fn test_corridors_do_not_connect_directly() {
        let c = room(Purpose::Circulation, Zone::Circulation);
        assert!(!should_have_door(&c, &c));
    }

    #[test]
    fn test_private_rooms_need_a_bathroom() {
        let bed = room(Purpose::Bedroom, Zone::Private);
        let study = room(Purpose::Study, Zone::Private);
        let bath = room(Purpose::Bathroom, Zone::Private);
        assert!(!should_have_door(&bed, &study));
        assert!(!should_have_door(&study, &bed));
        assert!(should_have_door(&bed, &bath));
        assert!(should_have_door(&bath, &bed));
    }

    #[test]
    fn test_mixed_zones_connect() {
        let living = room(Purpose::Living, Zone::Public);
        let bed = room(Purpose::Bedroom, Zone::Private);
        let corridor = room(Purpose::Circulation, Zone::Circulation);
        assert!(should_have_door(&living, &bed));
        assert!(should_have_door(&bed, &living));
        assert!(should_have_door(&corridor, &bed));
        assert!(should_have_door(&bed, &corridor));
    }

    #[test]
    fn test_vertical_wall_door_is_centred() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(10.1, 4.0, 6.0, 10.0);
        let door = shared_wall(&a, &b, &DoorConfig::default());
        assert_eq!(door, Some((Orientation::Vertical, 10.0, 7.0)));
    }

    #[test]
    fn test_gap_and_short_span_get_no_door() {
        let config = DoorConfig::default();
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        // Half-unit gap is over the door tolerance.
        assert_eq!(shared_wall(&a, &Rect::new(10.5, 0.0, 5.0, 5.0), &config), None);
        // Exactly 2 units of shared wall is not enough.
        assert_eq!(shared_wall(&a, &Rect::new(8.0, 10.0, 5.0, 5.0), &config), None);
    }

    #[test]
    fn test_horizontal_wall_door() {
        let a = Rect::new(0.0, 10.0, 10.0, 5.0);
        let b = Rect::new(2.0, 0.0, 4.0, 10.0);
        let door = shared_wall(&a, &b, &DoorConfig::default());
        assert_eq!(door, Some((Orientation::Horizontal, 4.0, 10.0)));
    }

    #[test]
    fn test_place_doors_respects_exclusions() {
        let mut set = RoomSet::new();
        let living = make_room(&mut set, "living", Purpose::Living, Rect::new(0.0, 0.0, 10.0, 10.0));
        let bed = make_room(&mut set, "bed", Purpose::Bedroom, Rect::new(10.0, 0.0, 10.0, 10.0));
        make_room(&mut set, "study", Purpose::Study, Rect::new(20.0, 0.0, 6.0, 10.0));
        let c1 = make_room(&mut set, "c1", Purpose::Circulation, Rect::new(0.0, 10.0, 10.0, 4.0));
        make_room(&mut set, "c2", Purpose::Circulation, Rect::new(10.0, 10.0, 10.0, 4.0));

        let doors = place_doors(&set, &DoorConfig::default());

        let pairs: Vec<(_, _)> = doors.iter().map(|d| (d.from, d.to)).collect();
        assert!(pairs.contains(&(living, bed)));
        assert!(pairs.contains(&(living, c1)));
        assert_eq!(doors.len(), 3, "bed/study and c1/c2 are excluded: {pairs:?}");
    }
}
