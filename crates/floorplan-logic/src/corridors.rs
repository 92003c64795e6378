//! Corridor synthesis for unmet adjacencies, corridor merging, and fitting
//! corridors into the free space left between rooms.

use std::collections::{HashSet, VecDeque};

use crate::config::CorridorConfig;
use crate::geometry::{Rect, EPS};
use crate::model::{Purpose, Relation, Role, Room, RoomId, RoomSet, Zone};
use crate::settle::nearest_free_slot;

/// Corridor rectangle linking the centres of `a` and `b`.
///
/// Runs along the axis that separates the centres most, capped at
/// `max_length`, centred across the other axis. `None` when the centres
/// coincide on the running axis.
pub fn make_corridor(a: &Rect, b: &Rect, width: f32, max_length: f32) -> Option<Rect> {
    let (ax, ay) = a.center();
    let (bx, by) = b.center();
    let rect = if (ax - bx).abs() > (ay - by).abs() {
        let length = (ax - bx).abs().min(max_length);
        Rect::new(ax.min(bx), (ay + by) / 2.0 - width / 2.0, length, width)
    } else {
        let length = (ay - by).abs().min(max_length);
        Rect::new((ax + bx) / 2.0 - width / 2.0, ay.min(by), width, length)
    };
    (rect.width > EPS && rect.height > EPS).then_some(rect)
}

fn push_corridor(set: &mut RoomSet, a: &Room, b: &Room, rect: Rect) -> RoomId {
    let base = format!("corridor_{}_{}", a.key, b.key);
    let mut key = base.clone();
    let mut n = 2;
    while set.contains_key(&key) {
        key = format!("{base}_{n}");
        n += 1;
    }
    let id = set.allocate_id();
    set.insert(Room {
        id,
        key,
        name: "Corridor".to_string(),
        purpose: Purpose::Circulation,
        zone: Zone::Circulation,
        role: Role::None,
        rect,
        locked: false,
        priority: 0,
        edges: Vec::new(),
    })
}

/// Add corridors for the living ↔ master bedroom link and for every
/// non-"near" edge whose rooms do not already share a wall.
///
/// Returns the number of corridors inserted.
pub fn insert_corridors(set: &mut RoomSet, config: &CorridorConfig) -> usize {
    let rooms: Vec<Room> = set.iter().cloned().collect();
    let find = |id: RoomId| rooms.iter().find(|r| r.id == id);
    let mut planned: Vec<(RoomId, RoomId, Rect)> = Vec::new();

    let living = rooms.iter().find(|r| r.is(Purpose::Living));
    let master_bed = rooms.iter().find(|r| r.role == Role::MasterBedroom);
    if let (Some(l), Some(m)) = (living, master_bed) {
        match make_corridor(&l.rect, &m.rect, config.primary_width, config.max_length) {
            Some(rect) => planned.push((l.id, m.id, rect)),
            None => log::debug!("living and master bedroom share a centre; no spine corridor"),
        }
    }

    let mut seen: HashSet<(String, String)> = HashSet::new();
    for room in &rooms {
        for edge in room.edges.iter().filter(|e| e.relation != Relation::Near) {
            let Some(target) = find(edge.target) else {
                continue;
            };
            if room.rect.shares_wall(
                &target.rect,
                config.adjacency_tolerance,
                config.adjacency_min_span,
            ) {
                continue;
            }
            let pair = if room.key <= target.key {
                (room.key.clone(), target.key.clone())
            } else {
                (target.key.clone(), room.key.clone())
            };
            if !seen.insert(pair) {
                continue;
            }
            if let Some(rect) = make_corridor(&room.rect, &target.rect, config.width, config.max_length)
            {
                planned.push((room.id, target.id, rect));
            }
        }
    }

    let count = planned.len();
    for (a, b, rect) in planned {
        if let (Some(a), Some(b)) = (find(a), find(b)) {
            let id = push_corridor(set, a, b, rect);
            log::debug!("corridor {:?} between {} and {}", id, a.key, b.key);
        }
    }
    log::info!("Inserted {} corridors", count);
    count
}

/// True when two corridors line up on one axis (within `tol`) and touch or
/// overlap on the other.
fn can_merge(a: &Rect, b: &Rect, tol: f32) -> bool {
    if (a.x - b.x).abs() < tol && (a.x2() - b.x2()).abs() < tol {
        return !(a.y2() < b.y || b.y2() < a.y);
    }
    if (a.y - b.y).abs() < tol && (a.y2() - b.y2()).abs() < tol {
        return !(a.x2() < b.x || b.x2() < a.x);
    }
    false
}

/// Fold aligned corridors into their first member and enforce the size floor.
///
/// Returns the number of corridors absorbed (and removed from the set).
pub fn merge_corridors(set: &mut RoomSet, config: &CorridorConfig) -> usize {
    let mut queue: VecDeque<RoomId> = set
        .iter()
        .filter(|r| r.is_circulation())
        .map(|r| r.id)
        .collect();
    let mut absorbed = 0;

    while let Some(base) = queue.pop_front() {
        let Some(original) = set.rect(base) else {
            continue;
        };
        let (mut x1, mut y1, mut x2, mut y2) = original.bounds();

        let mut remaining = VecDeque::with_capacity(queue.len());
        while let Some(other) = queue.pop_front() {
            match set.rect(other) {
                Some(c) if can_merge(&original, &c, config.merge_tolerance) => {
                    x1 = x1.min(c.x);
                    y1 = y1.min(c.y);
                    x2 = x2.max(c.x2());
                    y2 = y2.max(c.y2());
                    set.remove(other);
                    absorbed += 1;
                }
                Some(_) => remaining.push_back(other),
                None => {}
            }
        }
        queue = remaining;

        if let Some(room) = set.get_mut(base) {
            room.rect = Rect::from_corners(x1, y1, x2, y2);
            room.rect.width = room.rect.width.max(config.min_size);
            room.rect.height = room.rect.height.max(config.min_size);
        }
    }

    if absorbed > 0 {
        log::info!("Merged away {} corridors", absorbed);
    }
    absorbed
}

/// What [`fit_corridors`] did to the corridors it touched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CorridorFit {
    /// Trimmed to their longest free stretch.
    pub clipped: usize,
    /// Relocated to the nearest free grid slot.
    pub moved: usize,
    /// Removed because neither worked.
    pub dropped: usize,
}

/// Free stretches of `[lo, hi]` once every `blocked` interval is cut out.
fn free_spans(lo: f32, hi: f32, mut blocked: Vec<(f32, f32)>) -> Vec<(f32, f32)> {
    blocked.sort_by(|a, b| a.0.total_cmp(&b.0));
    let mut spans = Vec::new();
    let mut cursor = lo;
    for (start, end) in blocked {
        if start > cursor {
            spans.push((cursor, start.min(hi)));
        }
        cursor = cursor.max(end);
        if cursor >= hi {
            break;
        }
    }
    if cursor < hi {
        spans.push((cursor, hi));
    }
    spans
}

/// Longest stretch of `corridor` along its running axis that stays inside
/// `bounds` and clear of every other room, if it is at least `min_length`.
fn clip_corridor(set: &RoomSet, id: RoomId, corridor: &Rect, bounds: &Rect, min_length: f32) -> Option<Rect> {
    let c = corridor.clamped_into(bounds);
    let c = Rect::from_corners(
        c.x.max(bounds.x),
        c.y.max(bounds.y),
        c.x2().min(bounds.x2()),
        c.y2().min(bounds.y2()),
    );
    let horizontal = c.width >= c.height;
    let blocked: Vec<(f32, f32)> = set
        .iter()
        .filter(|r| r.id != id && r.rect.overlaps(&c))
        .map(|r| {
            if horizontal {
                (r.rect.x, r.rect.x2())
            } else {
                (r.rect.y, r.rect.y2())
            }
        })
        .collect();
    let (lo, hi) = if horizontal { (c.x, c.x2()) } else { (c.y, c.y2()) };

    let (start, end) = free_spans(lo, hi, blocked)
        .into_iter()
        .fold(None, |best: Option<(f32, f32)>, span| match best {
            Some(b) if b.1 - b.0 >= span.1 - span.0 => Some(b),
            _ => Some(span),
        })?;
    if end - start + EPS < min_length {
        return None;
    }
    Some(if horizontal {
        Rect::new(start, c.y, end - start, c.height)
    } else {
        Rect::new(c.x, start, c.width, end - start)
    })
}

/// Make every unlocked corridor legal before it is locked in place.
///
/// A corridor that leaves `bounds` or overlaps another room is clipped to its
/// longest free stretch, moved to the nearest free slot when no stretch
/// reaches the size floor, and removed as a last resort.
pub fn fit_corridors(set: &mut RoomSet, bounds: &Rect, config: &CorridorConfig, grid: f32) -> CorridorFit {
    let ids: Vec<RoomId> = set
        .iter()
        .filter(|r| r.is_circulation() && !r.locked)
        .map(|r| r.id)
        .collect();
    let mut fit = CorridorFit::default();

    for id in ids {
        let Some(rect) = set.rect(id) else {
            continue;
        };
        if rect.inside_eps(bounds) && !set.overlaps_any(&rect, &[id]) {
            continue;
        }
        if let Some(piece) = clip_corridor(set, id, &rect, bounds, config.min_size) {
            if let Some(room) = set.get_mut(id) {
                room.rect = piece;
            }
            fit.clipped += 1;
        } else if let Some(slot) = nearest_free_slot(set, bounds, id, grid) {
            set.set_origin(id, slot.x, slot.y);
            fit.moved += 1;
        } else if let Some(room) = set.remove(id) {
            log::warn!("No room left for corridor {}; dropping it", room.key);
            fit.dropped += 1;
        }
    }
    if fit != CorridorFit::default() {
        log::info!(
            "Fitted corridors: {} clipped, {} moved, {} dropped",
            fit.clipped,
            fit.moved,
            fit.dropped
        );
    }
    fit
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::test_support::{attach, make_room, with_role};
    use crate::model::AdjacencyEdge;

    #[test]
    fn test_corridor_runs_along_dominant_axis() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(30.0, 2.0, 10.0, 10.0);
        let c = make_corridor(&a, &b, 4.0, 12.0).unwrap();
        assert_eq!((c.x, c.y, c.width, c.height), (5.0, 4.0, 12.0, 4.0));

        let d = Rect::new(0.0, 8.0, 10.0, 10.0);
        let v = make_corridor(&a, &d, 4.0, 12.0).unwrap();
        assert_eq!((v.x, v.y, v.width, v.height), (3.0, 5.0, 4.0, 8.0));
    }

    #[test]
    fn test_zero_length_corridor_is_skipped() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(2.0, 2.0, 6.0, 6.0);
        assert_eq!(make_corridor(&a, &b, 4.0, 12.0), None);
    }

    #[test]
    fn test_insert_dedupes_pairs_and_skips_near_and_adjacent() {
        let mut set = RoomSet::new();
        let living = make_room(&mut set, "living", Purpose::Living, Rect::new(6.0, 6.0, 10.0, 10.0));
        let kitchen = make_room(&mut set, "kitchen", Purpose::Kitchen, Rect::new(25.0, 6.0, 8.0, 8.0));
        let bath = make_room(&mut set, "bath", Purpose::Bathroom, Rect::new(16.5, 6.0, 5.0, 5.0));
        let store = make_room(&mut set, "store", Purpose::Store, Rect::new(6.0, 28.0, 4.0, 4.0));
        attach(&mut set, living, kitchen);
        attach(&mut set, kitchen, living);
        attach(&mut set, living, bath);
        if let Some(room) = set.get_mut(living) {
            room.edges.push(AdjacencyEdge {
                target: store,
                relation: Relation::Near,
                preference: None,
            });
        }

        let inserted = insert_corridors(&mut set, &CorridorConfig::default());

        assert_eq!(inserted, 1, "kitchen pair once; bath adjacent; store only near");
        let corridor = set.lookup("corridor_living_kitchen").and_then(|id| set.get(id)).unwrap();
        assert_eq!(corridor.zone, Zone::Circulation);
        assert_eq!(corridor.priority, 0);
        assert_eq!(corridor.rect.height, 4.0);
    }

    #[test]
    fn test_spine_corridor_and_unique_keys() {
        let mut set = RoomSet::new();
        let living = make_room(&mut set, "living", Purpose::Living, Rect::new(6.0, 6.0, 10.0, 10.0));
        let bed = make_room(&mut set, "mbed", Purpose::Bedroom, Rect::new(6.0, 24.0, 10.0, 10.0));
        with_role(&mut set, bed, Role::MasterBedroom);
        attach(&mut set, living, bed);

        let inserted = insert_corridors(&mut set, &CorridorConfig::default());

        assert_eq!(inserted, 2);
        let spine = set.get(set.lookup("corridor_living_mbed").unwrap()).unwrap();
        assert_eq!((spine.rect.x, spine.rect.width, spine.rect.height), (8.5, 5.0, 12.0));
        assert!(set.contains_key("corridor_living_mbed_2"));
    }

    #[test]
    fn test_merge_unions_aligned_corridors() {
        let mut set = RoomSet::new();
        let a = make_room(&mut set, "c1", Purpose::Circulation, Rect::new(0.0, 0.0, 4.0, 10.0));
        let b = make_room(&mut set, "c2", Purpose::Circulation, Rect::new(0.2, 10.0, 4.0, 6.0));
        let c = make_room(&mut set, "c3", Purpose::Circulation, Rect::new(20.0, 20.0, 2.0, 3.0));

        let absorbed = merge_corridors(&mut set, &CorridorConfig::default());

        assert_eq!(absorbed, 1);
        assert!(set.get(b).is_none());
        let merged = set.rect(a).unwrap();
        assert_eq!((merged.x, merged.y, merged.x2(), merged.y2()), (0.0, 0.0, 4.2, 16.0));
        let floored = set.rect(c).unwrap();
        assert_eq!((floored.width, floored.height), (4.0, 4.0));
    }

    #[test]
    fn test_merge_skips_misaligned_corridors() {
        let mut set = RoomSet::new();
        make_room(&mut set, "c1", Purpose::Circulation, Rect::new(0.0, 0.0, 4.0, 10.0));
        make_room(&mut set, "c2", Purpose::Circulation, Rect::new(1.0, 12.0, 4.0, 6.0));
        assert_eq!(merge_corridors(&mut set, &CorridorConfig::default()), 0);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_free_spans_cut_blocked_intervals() {
        assert_eq!(
            free_spans(0.0, 20.0, vec![(12.0, 14.0), (-2.0, 3.0)]),
            vec![(3.0, 12.0), (14.0, 20.0)]
        );
        assert!(free_spans(0.0, 5.0, vec![(0.0, 5.0)]).is_empty());
    }

    #[test]
    fn test_fit_clips_corridor_to_longest_free_stretch() {
        let bounds = Rect::new(5.0, 5.0, 30.0, 30.0);
        let mut set = RoomSet::new();
        let hall = make_room(&mut set, "hall", Purpose::Circulation, Rect::new(2.0, 10.0, 20.0, 4.0));
        let bed = make_room(&mut set, "bed", Purpose::Bedroom, Rect::new(10.0, 8.0, 6.0, 8.0));

        let fit = fit_corridors(&mut set, &bounds, &CorridorConfig::default(), 0.5);

        assert_eq!(fit, CorridorFit { clipped: 1, moved: 0, dropped: 0 });
        let h = set.rect(hall).unwrap();
        assert_eq!((h.x, h.y, h.width, h.height), (16.0, 10.0, 9.0, 4.0));
        assert!(!h.overlaps(&set.rect(bed).unwrap()));
        assert!(h.inside(&bounds));
    }

    #[test]
    fn test_fit_moves_corridor_with_no_usable_stretch() {
        let bounds = Rect::new(0.0, 0.0, 20.0, 20.0);
        let mut set = RoomSet::new();
        let living = make_room(&mut set, "living", Purpose::Living, Rect::new(0.0, 0.0, 20.0, 10.0));
        set.set_locked(living, true);
        let hall = make_room(&mut set, "hall", Purpose::Circulation, Rect::new(4.0, 2.0, 4.0, 6.0));

        let fit = fit_corridors(&mut set, &bounds, &CorridorConfig::default(), 0.5);

        assert_eq!(fit, CorridorFit { clipped: 0, moved: 1, dropped: 0 });
        assert_eq!(set.rect(hall).map(|r| (r.x, r.y)), Some((4.0, 10.0)));
    }

    #[test]
    fn test_fit_drops_corridor_when_plot_is_full() {
        let bounds = Rect::new(0.0, 0.0, 10.0, 10.0);
        let mut set = RoomSet::new();
        make_room(&mut set, "living", Purpose::Living, bounds);
        let hall = make_room(&mut set, "hall", Purpose::Circulation, Rect::new(2.0, 2.0, 4.0, 4.0));

        let fit = fit_corridors(&mut set, &bounds, &CorridorConfig::default(), 0.5);

        assert_eq!(fit.dropped, 1);
        assert!(set.get(hall).is_none());
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_fit_skips_legal_and_locked_corridors() {
        let bounds = Rect::new(0.0, 0.0, 20.0, 20.0);
        let mut set = RoomSet::new();
        make_room(&mut set, "bed", Purpose::Bedroom, Rect::new(0.0, 0.0, 10.0, 10.0));
        let free = make_room(&mut set, "hall", Purpose::Circulation, Rect::new(10.0, 0.0, 4.0, 10.0));
        let locked = make_room(&mut set, "spine", Purpose::Circulation, Rect::new(6.0, 8.0, 4.0, 4.0));
        set.set_locked(locked, true);

        assert_eq!(fit_corridors(&mut set, &bounds, &CorridorConfig::default(), 0.5), CorridorFit::default());
        assert_eq!(set.rect(free).map(|r| r.x), Some(10.0));
    }
}
