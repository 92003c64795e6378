//! Room graph data model and the room arena.
//!
//! A pipeline run owns exactly one [`RoomSet`]. Phases reference rooms by
//! [`RoomId`] and route every mutation through the arena, so there is no
//! second copy of a room anywhere.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::geometry::{Orientation, Rect};

/// Functional room type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Purpose {
    Living,
    Kitchen,
    Bedroom,
    Bathroom,
    Circulation,
    Foyer,
    Store,
    Study,
    Pooja,
    Dining,
    Utility,
    #[serde(other)]
    Other,
}

/// Coarse privacy classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Zone {
    Public,
    SemiPrivate,
    Private,
    Service,
    Circulation,
}

/// Special function a room plays in the placement template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    None,
    Foyer,
    MasterBedroom,
    MasterBathroom,
    CommonBathroom,
}

/// Adjacency relation kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relation {
    Attach,
    Near,
    Separate,
}

/// Preferred side of an adjacency, in plot terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgePreference {
    Front,
    Rear,
    Left,
    Right,
    Center,
}

/// Stable arena handle. Survives removals of other rooms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RoomId(pub u32);

/// Directed adjacency requirement from the owning room to `target`.
#[derive(Debug, Clone, PartialEq)]
pub struct AdjacencyEdge {
    pub target: RoomId,
    pub relation: Relation,
    pub preference: Option<EdgePreference>,
}

/// A room being placed.
#[derive(Debug, Clone)]
pub struct Room {
    pub id: RoomId,
    /// External identifier from the plan (`room_id`).
    pub key: String,
    pub name: String,
    pub purpose: Purpose,
    pub zone: Zone,
    pub role: Role,
    pub rect: Rect,
    pub locked: bool,
    pub priority: i32,
    pub edges: Vec<AdjacencyEdge>,
}

impl Room {
    pub fn is(&self, purpose: Purpose) -> bool {
        self.purpose == purpose
    }

    pub fn is_circulation(&self) -> bool {
        self.purpose == Purpose::Circulation
    }

    pub fn area(&self) -> f32 {
        self.rect.area()
    }
}

/// A door between two rooms.
#[derive(Debug, Clone, PartialEq)]
pub struct Door {
    pub from: RoomId,
    pub to: RoomId,
    pub x: f32,
    pub y: f32,
    pub orientation: Orientation,
}

impl Door {
    pub fn touches(&self, id: RoomId) -> bool {
        self.from == id || self.to == id
    }
}

/// Wall classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WallKind {
    Outer,
    Inner,
}

/// An immutable wall segment. Endpoints are normalised so `x1 <= x2` and `y1 <= y2`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WallSegment {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    pub kind: WallKind,
}

impl WallSegment {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32, kind: WallKind) -> Self {
        Self {
            x1: x1.min(x2),
            y1: y1.min(y2),
            x2: x1.max(x2),
            y2: y1.max(y2),
            kind,
        }
    }

    pub fn is_vertical(&self) -> bool {
        (self.x1 - self.x2).abs() < crate::envelope::MERGE_EPS
    }

    pub fn is_horizontal(&self) -> bool {
        (self.y1 - self.y2).abs() < crate::envelope::MERGE_EPS
    }

    pub fn length(&self) -> f32 {
        (self.x2 - self.x1) + (self.y2 - self.y1)
    }
}

/// Read-only projection of a placed room for envelope extraction.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub id: String,
    pub purpose: Purpose,
    pub rect: Rect,
}

impl Cell {
    pub fn is_circulation(&self) -> bool {
        self.purpose == Purpose::Circulation
    }
}

/// Owned collection of every room in one pipeline run.
#[derive(Debug, Clone, Default)]
pub struct RoomSet {
    rooms: Vec<Room>,
    /// RoomId → position in `rooms`
    slots: HashMap<RoomId, usize>,
    /// external key → RoomId
    keys: HashMap<String, RoomId>,
    next_id: u32,
}

impl RoomSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve the next id without inserting anything.
    pub fn allocate_id(&mut self) -> RoomId {
        let id = RoomId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Insert a room whose id came from [`RoomSet::allocate_id`].
    pub fn insert(&mut self, room: Room) -> RoomId {
        let id = room.id;
        self.slots.insert(id, self.rooms.len());
        self.keys.insert(room.key.clone(), id);
        self.rooms.push(room);
        id
    }

    /// Remove a room. Ids of the remaining rooms are unchanged.
    pub fn remove(&mut self, id: RoomId) -> Option<Room> {
        let pos = self.slots.remove(&id)?;
        let room = self.rooms.remove(pos);
        self.keys.remove(&room.key);
        for slot in self.slots.values_mut() {
            if *slot > pos {
                *slot -= 1;
            }
        }
        Some(room)
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    pub fn get(&self, id: RoomId) -> Option<&Room> {
        self.slots.get(&id).map(|&pos| &self.rooms[pos])
    }

    pub fn get_mut(&mut self, id: RoomId) -> Option<&mut Room> {
        match self.slots.get(&id) {
            Some(&pos) => Some(&mut self.rooms[pos]),
            None => None,
        }
    }

    /// Rectangle of a room; rooms that no longer exist have none.
    pub fn rect(&self, id: RoomId) -> Option<Rect> {
        self.get(id).map(|r| r.rect)
    }

    /// Move a room's origin.
    pub fn set_origin(&mut self, id: RoomId, x: f32, y: f32) {
        if let Some(room) = self.get_mut(id) {
            room.rect.x = x;
            room.rect.y = y;
        }
    }

    pub fn set_locked(&mut self, id: RoomId, locked: bool) {
        if let Some(room) = self.get_mut(id) {
            room.locked = locked;
        }
    }

    pub fn lookup(&self, key: &str) -> Option<RoomId> {
        self.keys.get(key).copied()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.keys.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Room> {
        self.rooms.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Room> {
        self.rooms.iter_mut()
    }

    /// Ids in insertion order.
    pub fn ids(&self) -> Vec<RoomId> {
        self.rooms.iter().map(|r| r.id).collect()
    }

    /// First room with the given role.
    pub fn find_role(&self, role: Role) -> Option<RoomId> {
        self.rooms.iter().find(|r| r.role == role).map(|r| r.id)
    }

    /// First room with the given purpose.
    pub fn find_purpose(&self, purpose: Purpose) -> Option<RoomId> {
        self.rooms.iter().find(|r| r.purpose == purpose).map(|r| r.id)
    }

    /// The master bedroom and master bathroom, when both exist.
    pub fn master_pair(&self) -> Option<(RoomId, RoomId)> {
        Some((
            self.find_role(Role::MasterBedroom)?,
            self.find_role(Role::MasterBathroom)?,
        ))
    }

    /// True when `a` and `b` are the master bedroom and bathroom, in either order.
    pub fn is_master_pair(&self, a: RoomId, b: RoomId) -> bool {
        match self.master_pair() {
            Some((bed, bath)) => (a == bed && b == bath) || (a == bath && b == bed),
            None => false,
        }
    }

    /// True when `rect` overlaps any room other than those in `skip`.
    pub fn overlaps_any(&self, rect: &Rect, skip: &[RoomId]) -> bool {
        self.rooms
            .iter()
            .filter(|r| !skip.contains(&r.id))
            .any(|r| rect.overlaps(&r.rect))
    }
}
