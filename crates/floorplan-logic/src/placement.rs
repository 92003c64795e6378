//! Zone placer: priorities plus the strategic starting template.
//!
//! Public rooms go near the road-side corner of the buildable rectangle,
//! service rooms below them and the private wing further back. The template
//! only produces a starting point; later phases fix overlaps and adjacency.

use std::collections::HashSet;

use crate::geometry::Rect;
use crate::model::{Purpose, Role, Room, RoomId, RoomSet};

/// Gap kept between template rooms.
const MARGIN: f32 = 1.0;
/// Gap between the master bedroom and its bathroom.
const PAIR_GAP: f32 = 0.5;

/// Placement priority of a room; higher numbers win overlap disputes.
pub fn priority_of(room: &Room) -> i32 {
    if room.is(Purpose::Living) {
        return 100;
    }
    match (room.role, room.purpose) {
        (Role::Foyer, _) => 95,
        (Role::MasterBedroom, _) => 90,
        (Role::MasterBathroom, _) => 85,
        (_, Purpose::Kitchen) => 80,
        (_, Purpose::Bedroom) => 70,
        (_, Purpose::Bathroom) => 65,
        _ => 50,
    }
}

/// Assign priorities and starting positions to every room.
pub fn place_rooms(set: &mut RoomSet, bounds: &Rect) {
    for room in set.iter_mut() {
        room.priority = priority_of(room);
    }

    let (x0, y0) = (bounds.x, bounds.y);
    let mut placed: HashSet<RoomId> = HashSet::new();

    let living = set.find_purpose(Purpose::Living);
    let foyer = set.find_role(Role::Foyer);
    let kitchen = set.find_purpose(Purpose::Kitchen);
    let common_bath = set.find_role(Role::CommonBathroom);
    let master_bed = set.find_role(Role::MasterBedroom);
    let master_bath = set.find_role(Role::MasterBathroom);

    if let Some(id) = living {
        set.set_origin(id, x0 + MARGIN, y0 + MARGIN);
        placed.insert(id);
    }

    // The foyer owns the entrance corner and pushes living to its right.
    if let Some(id) = foyer {
        set.set_origin(id, x0 + MARGIN, y0 + MARGIN);
        placed.insert(id);
        if let (Some(living), Some(f)) = (living, set.rect(id)) {
            if living != id {
                set.set_origin(living, f.x2() + MARGIN, y0 + MARGIN);
            }
        }
    }

    if let Some(id) = kitchen {
        let anchor = foyer.or(living).and_then(|a| set.rect(a));
        match anchor {
            Some(a) => set.set_origin(id, a.x, a.y2() + MARGIN),
            None => set.set_origin(id, x0 + MARGIN, y0 + MARGIN),
        }
        placed.insert(id);
    }

    if let (Some(id), Some(l)) = (common_bath, living.and_then(|l| set.rect(l))) {
        set.set_origin(id, l.x2() + PAIR_GAP, l.y + 2.0);
        placed.insert(id);
    }

    if let Some(id) = master_bed {
        match kitchen.and_then(|k| set.rect(k)) {
            Some(k) => set.set_origin(id, x0 + MARGIN, k.y2() + 2.0),
            None => set.set_origin(id, x0 + MARGIN, y0 + bounds.height * 0.5),
        }
        placed.insert(id);
    }

    if let (Some(bath), Some(bed)) = (master_bath, master_bed.and_then(|b| set.rect(b))) {
        set.set_origin(bath, bed.x, bed.y2() + PAIR_GAP);
        set.set_locked(bath, true);
        placed.insert(bath);
    }

    if let Some(bed) = master_bed.and_then(|b| set.rect(b)) {
        let others: Vec<RoomId> = set
            .iter()
            .filter(|r| r.is(Purpose::Bedroom) && r.role != Role::MasterBedroom)
            .map(|r| r.id)
            .collect();
        for (i, id) in others.into_iter().enumerate() {
            let height = set.rect(id).map_or(0.0, |r| r.height);
            set.set_origin(id, bed.x2() + 1.5, bed.y + i as f32 * (height + MARGIN));
            placed.insert(id);
        }
    }

    let leftovers: Vec<RoomId> = set.ids().into_iter().filter(|id| !placed.contains(id)).collect();
    stack_leftovers(set, bounds, &leftovers);

    for room in set.iter() {
        log::debug!(
            "placed {} at ({}, {}) priority {}",
            room.key,
            room.rect.x,
            room.rect.y,
            room.priority
        );
    }
}

/// Stack rooms the template has no slot for down the far side of the
/// buildable area, starting a new column to the left when one fills up.
fn stack_leftovers(set: &mut RoomSet, bounds: &Rect, ids: &[RoomId]) {
    let mut column_right = bounds.x2();
    let mut column_width: f32 = 0.0;
    let mut cursor_y = bounds.y;

    for &id in ids {
        let Some(rect) = set.rect(id) else {
            continue;
        };
        if cursor_y > bounds.y && cursor_y + rect.height > bounds.y2() {
            column_right -= column_width + MARGIN;
            column_width = 0.0;
            cursor_y = bounds.y;
        }
        set.set_origin(id, column_right - rect.width, cursor_y);
        column_width = column_width.max(rect.width);
        cursor_y += rect.height + MARGIN;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::test_support::{make_room, with_role};

    fn bounds() -> Rect {
        Rect::new(5.0, 5.0, 30.0, 30.0)
    }

    fn sized(w: f32, h: f32) -> Rect {
        Rect::new(0.0, 0.0, w, h)
    }

    #[test]
    fn test_priorities_by_purpose_and_role() {
        let mut set = RoomSet::new();
        let living = make_room(&mut set, "living", Purpose::Living, sized(10.0, 10.0));
        let foyer = make_room(&mut set, "foyer", Purpose::Foyer, sized(4.0, 4.0));
        let mbed = make_room(&mut set, "mbed", Purpose::Bedroom, sized(10.0, 10.0));
        let bed = make_room(&mut set, "bed2", Purpose::Bedroom, sized(10.0, 10.0));
        let bath = make_room(&mut set, "bath", Purpose::Bathroom, sized(5.0, 5.0));
        let store = make_room(&mut set, "store", Purpose::Store, sized(4.0, 4.0));
        with_role(&mut set, foyer, Role::Foyer);
        with_role(&mut set, mbed, Role::MasterBedroom);

        place_rooms(&mut set, &bounds());

        let p = |id| set.get(id).unwrap().priority;
        assert_eq!(p(living), 100);
        assert_eq!(p(foyer), 95);
        assert_eq!(p(mbed), 90);
        assert_eq!(p(bed), 70);
        assert_eq!(p(bath), 65);
        assert_eq!(p(store), 50);
    }

    #[test]
    fn test_foyer_pushes_living_right_and_kitchen_below() {
        let mut set = RoomSet::new();
        let living = make_room(&mut set, "living", Purpose::Living, sized(12.0, 10.0));
        let foyer = make_room(&mut set, "foyer", Purpose::Foyer, sized(5.0, 6.0));
        let kitchen = make_room(&mut set, "kitchen", Purpose::Kitchen, sized(8.0, 8.0));
        with_role(&mut set, foyer, Role::Foyer);

        place_rooms(&mut set, &bounds());

        let f = set.rect(foyer).unwrap();
        let l = set.rect(living).unwrap();
        let k = set.rect(kitchen).unwrap();
        assert_eq!((f.x, f.y), (6.0, 6.0));
        assert_eq!((l.x, l.y), (12.0, 6.0), "living shifts by foyer width + margin");
        assert_eq!((k.x, k.y), (6.0, 13.0), "kitchen sits below the foyer");
    }

    #[test]
    fn test_master_bath_below_bed_and_locked() {
        let mut set = RoomSet::new();
        let kitchen = make_room(&mut set, "kitchen", Purpose::Kitchen, sized(8.0, 8.0));
        let bed = make_room(&mut set, "mbed", Purpose::Bedroom, sized(10.0, 10.0));
        let bath = make_room(&mut set, "mbath", Purpose::Bathroom, sized(5.0, 5.0));
        with_role(&mut set, bed, Role::MasterBedroom);
        with_role(&mut set, bath, Role::MasterBathroom);

        place_rooms(&mut set, &bounds());

        let k = set.rect(kitchen).unwrap();
        assert_eq!((k.x, k.y), (6.0, 6.0), "kitchen takes the corner without living");
        let b = set.rect(bed).unwrap();
        assert_eq!((b.x, b.y), (6.0, 16.0));
        let t = set.get(bath).unwrap();
        assert_eq!((t.rect.x, t.rect.y), (6.0, 26.5));
        assert!(t.locked);
    }

    #[test]
    fn test_missing_roles_are_skipped() {
        let mut set = RoomSet::new();
        let bath = make_room(&mut set, "mbath", Purpose::Bathroom, sized(5.0, 5.0));
        with_role(&mut set, bath, Role::MasterBathroom);

        place_rooms(&mut set, &bounds());

        let t = set.get(bath).unwrap();
        assert!(!t.locked, "bath without a bedroom is not template-placed");
        assert!(t.rect.inside(&bounds()));
    }

    #[test]
    fn test_leftovers_stack_down_the_right_side() {
        let mut set = RoomSet::new();
        let a = make_room(&mut set, "store", Purpose::Store, sized(4.0, 12.0));
        let b = make_room(&mut set, "study", Purpose::Study, sized(6.0, 12.0));
        let c = make_room(&mut set, "pooja", Purpose::Pooja, sized(3.0, 12.0));

        place_rooms(&mut set, &bounds());

        let (ra, rb, rc) = (set.rect(a).unwrap(), set.rect(b).unwrap(), set.rect(c).unwrap());
        assert_eq!((ra.x, ra.y), (31.0, 5.0));
        assert_eq!((rb.x, rb.y), (29.0, 18.0));
        // Third room does not fit below, so it opens a new column.
        assert_eq!((rc.x, rc.y), (25.0, 5.0));
        for r in [ra, rb, rc] {
            assert!(r.inside(&bounds()));
        }
    }
}
