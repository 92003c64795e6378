//! Post-hoc validation of a finished layout.
//!
//! Pure functions over the room arena and door list, plus a record-level
//! pass over a serialised [`Layout`] for layouts that come back from disk
//! or another tool. Nothing here moves a room; findings are returned to the
//! caller and surfaced as diagnostics.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::config::LayoutConfig;
use crate::geometry::{Rect, EPS};
use crate::model::{Door, RoomId, RoomSet};
use crate::pipeline::Layout;

/// A layout validation finding.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    pub category: &'static str,
    pub severity: Severity,
    pub message: String,
}

/// Finding severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

// ── A. Room geometry (per-room) ─────────────────────────────────────────

/// Check that no room has zero, negative or non-finite dimensions.
pub fn check_room_dimensions(set: &RoomSet) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    for r in set.iter() {
        let (w, h) = (r.rect.width, r.rect.height);
        if !(w.is_finite() && h.is_finite()) || w <= 0.0 || h <= 0.0 {
            errors.push(ValidationError {
                category: "room_geometry",
                severity: Severity::Error,
                message: format!("Room {} has non-positive dimensions: {}×{}", r.key, w, h),
            });
        }
    }
    errors
}

/// Check that every room lies inside the buildable rectangle.
pub fn check_rooms_within_bounds(set: &RoomSet, bounds: &Rect) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    for r in set.iter() {
        if !r.rect.inside_eps(bounds) {
            let (x1, y1, x2, y2) = r.rect.bounds();
            errors.push(ValidationError {
                category: "room_geometry",
                severity: Severity::Error,
                message: format!(
                    "Room {} at ({}, {})–({}, {}) leaves the buildable area",
                    r.key, x1, y1, x2, y2
                ),
            });
        }
    }
    errors
}

// ── B. Room-to-room (pairwise) ──────────────────────────────────────────

/// Check that no two rooms overlap. Corridors count like any other room.
pub fn check_room_overlaps(set: &RoomSet) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let rooms: Vec<_> = set.iter().collect();
    for i in 0..rooms.len() {
        for j in (i + 1)..rooms.len() {
            let (a, b) = (rooms[i], rooms[j]);
            if a.rect.overlaps_eps(&b.rect) {
                errors.push(ValidationError {
                    category: "room_overlap",
                    severity: Severity::Error,
                    message: format!("Rooms {} and {} overlap", a.key, b.key),
                });
            }
        }
    }
    errors
}

/// Check that the master bathroom shares a long enough wall with the master bedroom.
pub fn check_master_pair(set: &RoomSet, tolerance: f32, min_shared_wall: f32) -> Vec<ValidationError> {
    let Some((bed, bath)) = set.master_pair() else {
        return Vec::new();
    };
    let (Some(b), Some(t)) = (set.get(bed), set.get(bath)) else {
        return Vec::new();
    };
    let shared = b.rect.shared_wall_length(&t.rect, tolerance);
    if shared + EPS >= min_shared_wall && !b.rect.overlaps_eps(&t.rect) {
        return Vec::new();
    }
    vec![ValidationError {
        category: "master_pair",
        severity: Severity::Error,
        message: format!(
            "Master bathroom {} shares {:.2} of wall with {} (need {})",
            t.key, shared, b.key, min_shared_wall
        ),
    }]
}

// ── C. Door validity ────────────────────────────────────────────────────

/// Check that both rooms of every door record exist in the layout.
pub fn check_door_rooms_exist(layout: &Layout) -> Vec<ValidationError> {
    let ids: HashSet<&str> = layout.rooms.iter().map(|r| r.room_id.as_str()).collect();
    let mut errors = Vec::new();
    for (i, d) in layout.doors.iter().enumerate() {
        for end in [&d.from, &d.to] {
            if !ids.contains(end.as_str()) {
                errors.push(ValidationError {
                    category: "door_validity",
                    severity: Severity::Error,
                    message: format!("Door #{} references non-existent room {}", i, end),
                });
            }
        }
    }
    errors
}

/// Flag non-circulation rooms without any door.
pub fn check_rooms_have_doors(set: &RoomSet, doors: &[Door]) -> Vec<ValidationError> {
    let connected: HashSet<RoomId> = doors.iter().flat_map(|d| [d.from, d.to]).collect();
    set.iter()
        .filter(|r| !r.is_circulation() && !connected.contains(&r.id))
        .map(|r| ValidationError {
            category: "door_validity",
            severity: Severity::Warning,
            message: format!("Room {} ({:?}) has no doors", r.key, r.purpose),
        })
        .collect()
}

// ── D. Connectivity (graph-level) ───────────────────────────────────────

/// Check that every room is reachable from the first one through doors.
pub fn check_connectivity(set: &RoomSet, doors: &[Door]) -> Vec<ValidationError> {
    let ids = set.ids();
    let Some(&start) = ids.first() else {
        return Vec::new();
    };

    let mut adj: HashMap<RoomId, Vec<RoomId>> = HashMap::new();
    for d in doors {
        adj.entry(d.from).or_default().push(d.to);
        adj.entry(d.to).or_default().push(d.from);
    }

    let mut visited = HashSet::from([start]);
    let mut queue = VecDeque::from([start]);
    while let Some(current) = queue.pop_front() {
        for &next in adj.get(&current).into_iter().flatten() {
            if visited.insert(next) {
                queue.push_back(next);
            }
        }
    }

    let unreached: Vec<&str> = set
        .iter()
        .filter(|r| !visited.contains(&r.id))
        .map(|r| r.key.as_str())
        .collect();
    if unreached.is_empty() {
        return Vec::new();
    }
    vec![ValidationError {
        category: "connectivity",
        severity: Severity::Warning,
        message: format!(
            "{} of {} rooms unreachable through doors (e.g. {})",
            unreached.len(),
            ids.len(),
            unreached[0]
        ),
    }]
}

// ── Master validation ───────────────────────────────────────────────────

/// Run every layout check and return the combined findings.
pub fn validate_layout(
    set: &RoomSet,
    doors: &[Door],
    bounds: &Rect,
    config: &LayoutConfig,
) -> Vec<ValidationError> {
    let mut all = Vec::new();
    all.extend(check_room_dimensions(set));
    all.extend(check_rooms_within_bounds(set, bounds));
    all.extend(check_room_overlaps(set));
    all.extend(check_master_pair(
        set,
        config.adjacency_tolerance,
        config.refine.min_shared_wall,
    ));
    all.extend(check_rooms_have_doors(set, doors));
    all.extend(check_connectivity(set, doors));
    all
}

/// Validate a serialised layout on its own: unique room ids, positive
/// dimensions, bounds, overlaps and door references.
pub fn validate_layout_record(layout: &Layout) -> Vec<ValidationError> {
    let b = &layout.bounds;
    let bounds = Rect::from_corners(b.xmin, b.ymin, b.xmax, b.ymax);
    let mut all = Vec::new();
    let mut seen = HashSet::new();
    let rects: Vec<(&str, Rect)> = layout
        .rooms
        .iter()
        .map(|r| (r.room_id.as_str(), Rect::new(r.x, r.y, r.width, r.height)))
        .collect();

    for &(id, rect) in &rects {
        if !seen.insert(id) {
            all.push(ValidationError {
                category: "room_geometry",
                severity: Severity::Error,
                message: format!("Room id {} appears more than once", id),
            });
        }
        if !(rect.width.is_finite() && rect.height.is_finite()) || rect.width <= 0.0 || rect.height <= 0.0 {
            all.push(ValidationError {
                category: "room_geometry",
                severity: Severity::Error,
                message: format!("Room {} has non-positive dimensions: {}×{}", id, rect.width, rect.height),
            });
        } else if !rect.inside_eps(&bounds) {
            all.push(ValidationError {
                category: "room_geometry",
                severity: Severity::Error,
                message: format!("Room {} leaves the buildable area", id),
            });
        }
    }
    for (i, (a, ra)) in rects.iter().enumerate() {
        for (c, rc) in &rects[i + 1..] {
            if ra.overlaps_eps(rc) {
                all.push(ValidationError {
                    category: "room_overlap",
                    severity: Severity::Error,
                    message: format!("Rooms {} and {} overlap", a, c),
                });
            }
        }
    }
    all.extend(check_door_rooms_exist(layout));
    all
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Orientation;
    use crate::model::test_support::{make_room, with_role};
    use crate::model::{Purpose, Role, Zone};
    use crate::pipeline::{Bounds, DoorRecord, PlacedRoom};

    fn make_door(from: RoomId, to: RoomId) -> Door {
        Door {
            from,
            to,
            x: 0.0,
            y: 0.0,
            orientation: Orientation::Vertical,
        }
    }

    #[test]
    fn test_valid_layout_has_no_findings() {
        let mut set = RoomSet::new();
        let a = make_room(&mut set, "living", Purpose::Living, Rect::new(5.0, 5.0, 10.0, 10.0));
        let b = make_room(&mut set, "kitchen", Purpose::Kitchen, Rect::new(15.0, 5.0, 8.0, 8.0));
        let doors = vec![make_door(a, b)];
        let errs = validate_layout(&set, &doors, &Rect::new(5.0, 5.0, 30.0, 30.0), &LayoutConfig::default());
        assert!(errs.is_empty(), "{errs:?}");
    }

    #[test]
    fn test_zero_width_room() {
        let mut set = RoomSet::new();
        make_room(&mut set, "sliver", Purpose::Store, Rect::new(0.0, 0.0, 0.0, 10.0));
        let errs = check_room_dimensions(&set);
        assert_eq!(errs.len(), 1);
        assert!(errs[0].message.contains("non-positive"));
    }

    #[test]
    fn test_room_outside_bounds() {
        let mut set = RoomSet::new();
        make_room(&mut set, "a", Purpose::Store, Rect::new(30.0, 5.0, 8.0, 4.0));
        make_room(&mut set, "b", Purpose::Store, Rect::new(5.0, 5.0, 4.0, 4.0));
        let errs = check_rooms_within_bounds(&set, &Rect::new(5.0, 5.0, 30.0, 30.0));
        assert_eq!(errs.len(), 1);
        assert!(errs[0].message.contains("Room a"));
    }

    #[test]
    fn test_overlapping_rooms_include_corridors() {
        let mut set = RoomSet::new();
        make_room(&mut set, "a", Purpose::Living, Rect::new(0.0, 0.0, 10.0, 10.0));
        make_room(&mut set, "hall", Purpose::Circulation, Rect::new(9.0, 0.0, 4.0, 10.0));
        make_room(&mut set, "b", Purpose::Store, Rect::new(13.0, 0.0, 4.0, 4.0));
        let errs = check_room_overlaps(&set);
        assert_eq!(errs.len(), 1, "touching rooms are fine: {errs:?}");
        assert_eq!(errs[0].category, "room_overlap");
    }

    #[test]
    fn test_detached_master_bath() {
        let mut set = RoomSet::new();
        let bed = make_room(&mut set, "mbed", Purpose::Bedroom, Rect::new(0.0, 0.0, 10.0, 10.0));
        let bath = make_room(&mut set, "mbath", Purpose::Bathroom, Rect::new(12.0, 0.0, 5.0, 5.0));
        with_role(&mut set, bed, Role::MasterBedroom);
        with_role(&mut set, bath, Role::MasterBathroom);
        assert_eq!(check_master_pair(&set, 1.0, 2.5).len(), 1);

        if let Some(r) = set.get_mut(bath) {
            r.rect.x = 10.5;
        }
        assert!(check_master_pair(&set, 1.0, 2.5).is_empty());
    }

    fn record(rooms: &[(&str, Rect)], doors: &[(&str, &str)]) -> Layout {
        Layout {
            bounds: Bounds {
                xmin: 0.0,
                ymin: 0.0,
                xmax: 30.0,
                ymax: 30.0,
            },
            quality_score: 100,
            rooms: rooms
                .iter()
                .map(|(id, r)| PlacedRoom {
                    room_id: id.to_string(),
                    name: id.to_string(),
                    purpose: Purpose::Store,
                    zone: Zone::Service,
                    x: r.x,
                    y: r.y,
                    width: r.width,
                    height: r.height,
                })
                .collect(),
            doors: doors
                .iter()
                .map(|(from, to)| DoorRecord {
                    from: from.to_string(),
                    to: to.to_string(),
                    x: 0.0,
                    y: 0.0,
                    orientation: Orientation::Vertical,
                })
                .collect(),
        }
    }

    #[test]
    fn test_door_to_missing_room() {
        let layout = record(
            &[("a", Rect::new(0.0, 0.0, 10.0, 10.0)), ("b", Rect::new(10.0, 0.0, 5.0, 5.0))],
            &[("a", "b"), ("a", "ghost")],
        );
        let errs = check_door_rooms_exist(&layout);
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].severity, Severity::Error);
        assert!(errs[0].message.contains("ghost"));
    }

    #[test]
    fn test_layout_record_checks() {
        let clean = record(
            &[("a", Rect::new(0.0, 0.0, 10.0, 10.0)), ("b", Rect::new(10.0, 0.0, 5.0, 5.0))],
            &[("a", "b")],
        );
        assert!(validate_layout_record(&clean).is_empty());

        let broken = record(
            &[
                ("a", Rect::new(0.0, 0.0, 10.0, 10.0)),
                ("a", Rect::new(28.0, 0.0, 5.0, 5.0)),
                ("c", Rect::new(5.0, 5.0, 4.0, 4.0)),
            ],
            &[("c", "d")],
        );
        let errs = validate_layout_record(&broken);
        let count = |cat: &str| errs.iter().filter(|e| e.category == cat).count();
        assert_eq!(count("room_geometry"), 2, "duplicate id and out of bounds: {errs:?}");
        assert_eq!(count("room_overlap"), 1);
        assert_eq!(count("door_validity"), 1);
    }

    #[test]
    fn test_exported_layout_passes_record_checks() {
        use crate::config::LayoutConfig;
        use crate::input::parse_plan;
        use crate::pipeline::generate_layout;

        let json = r#"{"rooms": [
            {"room_id": "living", "name": "Living", "purpose": "living",
             "dimensions_ft": [10, 10], "placement_intent": {"zone": "public"},
             "adjacency_edges": [{"to": "kitchen", "type": "attach"}]},
            {"room_id": "kitchen", "name": "Kitchen", "purpose": "kitchen",
             "dimensions_ft": [8, 8], "placement_intent": {"zone": "service"}}
        ]}"#;
        let run = generate_layout(&parse_plan(json, None).unwrap(), &LayoutConfig::default()).unwrap();
        let text = serde_json::to_string(&run.layout).unwrap();
        let back: Layout = serde_json::from_str(&text).unwrap();
        assert_eq!(back.rooms.len(), 2);
        assert!(validate_layout_record(&back).is_empty());
    }

    #[test]
    fn test_doorless_rooms_and_connectivity_are_warnings() {
        let mut set = RoomSet::new();
        let a = make_room(&mut set, "living", Purpose::Living, Rect::new(0.0, 0.0, 10.0, 10.0));
        let b = make_room(&mut set, "kitchen", Purpose::Kitchen, Rect::new(10.0, 0.0, 8.0, 8.0));
        make_room(&mut set, "store", Purpose::Store, Rect::new(30.0, 0.0, 4.0, 4.0));
        make_room(&mut set, "hall", Purpose::Circulation, Rect::new(0.0, 20.0, 4.0, 4.0));
        let doors = vec![make_door(a, b)];

        let doorless = check_rooms_have_doors(&set, &doors);
        assert_eq!(doorless.len(), 1, "corridors are exempt: {doorless:?}");
        assert_eq!(doorless[0].severity, Severity::Warning);

        let reach = check_connectivity(&set, &doors);
        assert_eq!(reach.len(), 1);
        assert!(reach[0].message.starts_with("2 of 4"));
    }
}
