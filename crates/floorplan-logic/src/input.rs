//! Plan input schema and room-arena construction.
//!
//! The upstream planner emits either a single plan or a document with a
//! `plans` array. Everything the pipeline cannot work with is rejected here,
//! before any placement happens.

use serde::Deserialize;
use serde_json::Value;

use crate::config::{LayoutConfig, PlotConfig};
use crate::error::{PlanError, Result};
use crate::geometry::Rect;
use crate::model::{
    AdjacencyEdge, EdgePreference, Purpose, Relation, Role, Room, RoomSet, Zone,
};

/// Plot outline as the planner describes it.
#[derive(Debug, Clone, Deserialize)]
pub struct PlotBoundary {
    pub width: f32,
    pub depth: f32,
}

/// Setbacks as the planner describes them.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Setbacks {
    pub front: f32,
    pub rear: f32,
    pub left: f32,
    pub right: f32,
}

/// Optional `geometry` block of a plan.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PlanGeometry {
    pub plot_boundary_ft: Option<PlotBoundary>,
    pub setbacks_ft: Option<Setbacks>,
}

/// Placement intent attached to each room.
#[derive(Debug, Clone, Deserialize)]
pub struct PlacementIntent {
    pub zone: Zone,
    #[serde(default)]
    pub edge_preference: Option<EdgePreference>,
    #[serde(default)]
    pub road_facing: Option<bool>,
    #[serde(default)]
    pub light_priority: Option<String>,
}

/// One adjacency edge as emitted by the planner.
#[derive(Debug, Clone, Deserialize)]
pub struct EdgeSpec {
    pub to: String,
    #[serde(rename = "type")]
    pub relation: Relation,
    #[serde(default)]
    pub edge_preference: Option<EdgePreference>,
}

/// One room as emitted by the planner.
#[derive(Debug, Clone, Deserialize)]
pub struct RoomSpec {
    pub room_id: String,
    pub name: String,
    pub purpose: Purpose,
    /// `[length, width]` → (width, height) on the plan.
    pub dimensions_ft: [f32; 2],
    pub placement_intent: PlacementIntent,
    #[serde(default)]
    pub adjacency_edges: Vec<EdgeSpec>,
    /// Explicit template role; inferred from the name when absent.
    #[serde(default)]
    pub role: Option<Role>,
}

/// A single plan.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlanInput {
    #[serde(default)]
    pub plan_id: Option<String>,
    #[serde(default)]
    pub geometry: Option<PlanGeometry>,
    #[serde(default)]
    pub rooms: Option<Vec<RoomSpec>>,
}

impl PlanInput {
    /// Plot for this plan: the plan's own geometry when present and allowed.
    pub fn plot(&self, config: &LayoutConfig) -> PlotConfig {
        let mut plot = config.plot.clone();
        if !config.use_plan_geometry {
            return plot;
        }
        if let Some(geometry) = &self.geometry {
            if let Some(boundary) = &geometry.plot_boundary_ft {
                plot.width = boundary.width;
                plot.depth = boundary.depth;
            }
            if let Some(s) = &geometry.setbacks_ft {
                plot.setback_front = s.front;
                plot.setback_rear = s.rear;
                plot.setback_left = s.left;
                plot.setback_right = s.right;
            }
        }
        plot
    }
}

/// Parse a plan or a multi-plan document and pick one plan.
///
/// With a `plans` array, `plan_id` selects the plan (first plan when `None`).
pub fn parse_plan(json: &str, plan_id: Option<&str>) -> Result<PlanInput> {
    let value: Value = serde_json::from_str(json)?;
    match value.get("plans") {
        Some(Value::Array(plans)) => {
            let chosen = match plan_id {
                Some(id) => plans
                    .iter()
                    .find(|p| p.get("plan_id").and_then(Value::as_str) == Some(id))
                    .ok_or_else(|| PlanError::PlanNotFound(id.to_string()))?,
                None => plans.first().ok_or(PlanError::EmptyDocument)?,
            };
            Ok(PlanInput::deserialize(chosen)?)
        }
        _ => Ok(PlanInput::deserialize(&value)?),
    }
}

/// Counters from arena construction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildReport {
    /// Edges pointing at unknown rooms or at their own room.
    pub dropped_edges: usize,
    /// Roles recovered from room names rather than an explicit field.
    pub inferred_roles: usize,
}

/// Build the room arena for one run, rejecting unusable geometry.
pub fn build_rooms(
    plan: &PlanInput,
    bounds: &Rect,
    config: &LayoutConfig,
) -> Result<(RoomSet, BuildReport)> {
    let specs = plan.rooms.as_ref().ok_or(PlanError::MissingRooms)?;
    let mut set = RoomSet::new();
    let mut report = BuildReport::default();

    for spec in specs {
        if set.contains_key(&spec.room_id) {
            return Err(PlanError::DuplicateRoomId(spec.room_id.clone()));
        }
        let [width, height] = spec.dimensions_ft;
        if !(width.is_finite() && height.is_finite()) || width <= 0.0 || height <= 0.0 {
            return Err(PlanError::InvalidDimensions {
                id: spec.room_id.clone(),
                width,
                height,
            });
        }
        if width > bounds.width || height > bounds.height {
            return Err(PlanError::RoomExceedsBounds {
                id: spec.room_id.clone(),
                width,
                height,
                bound_w: bounds.width,
                bound_h: bounds.height,
            });
        }

        let id = set.allocate_id();
        set.insert(Room {
            id,
            key: spec.room_id.clone(),
            name: spec.name.clone(),
            purpose: spec.purpose,
            zone: spec.placement_intent.zone,
            role: Role::None,
            rect: Rect::new(0.0, 0.0, width, height),
            locked: false,
            priority: 0,
            edges: Vec::new(),
        });
    }

    // Second pass: edges can only be resolved once every room exists.
    for spec in specs {
        let Some(from) = set.lookup(&spec.room_id) else {
            continue;
        };
        let mut edges = Vec::with_capacity(spec.adjacency_edges.len());
        for edge in &spec.adjacency_edges {
            match set.lookup(&edge.to) {
                Some(target) if target != from => edges.push(AdjacencyEdge {
                    target,
                    relation: edge.relation,
                    preference: edge.edge_preference,
                }),
                _ => {
                    log::warn!(
                        "Dropping {:?} edge {} → {} (unknown or self target)",
                        edge.relation,
                        spec.room_id,
                        edge.to
                    );
                    report.dropped_edges += 1;
                }
            }
        }
        if let Some(room) = set.get_mut(from) {
            room.edges = edges;
        }
    }

    assign_roles(&mut set, specs, config.infer_roles_from_names, &mut report);
    Ok((set, report))
}

/// Populate [`Room::role`] once, at construction.
///
/// Explicit roles always win. Name matching is a compatibility fallback and
/// each inference is logged so a renamed room losing its role is visible.
/// A role claimed twice keeps the first claimant.
fn assign_roles(set: &mut RoomSet, specs: &[RoomSpec], infer: bool, report: &mut BuildReport) {
    for spec in specs {
        let Some(id) = set.lookup(&spec.room_id) else {
            continue;
        };
        let (role, inferred) = match spec.role {
            Some(role) => (role, false),
            None if spec.purpose == Purpose::Foyer => (Role::Foyer, false),
            None if infer => (infer_role(spec.purpose, &spec.name), true),
            None => (Role::None, false),
        };
        if role == Role::None {
            continue;
        }
        if set.find_role(role).is_some() {
            log::warn!(
                "Room {} also claims role {:?}; keeping the first claimant",
                spec.room_id,
                role
            );
            continue;
        }
        if inferred {
            log::info!(
                "Room {} ('{}') assigned role {:?} from its name",
                spec.room_id,
                spec.name,
                role
            );
            report.inferred_roles += 1;
        }
        if let Some(room) = set.get_mut(id) {
            room.role = role;
        }
    }
}

fn infer_role(purpose: Purpose, name: &str) -> Role {
    let name = name.to_lowercase();
    match purpose {
        Purpose::Bedroom if name.contains("master") => Role::MasterBedroom,
        Purpose::Bathroom if name.contains("master") => Role::MasterBathroom,
        Purpose::Bathroom if name.contains("common") => Role::CommonBathroom,
        _ if name.contains("foyer") => Role::Foyer,
        _ => Role::None,
    }
}
