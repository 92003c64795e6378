//! Layout pipeline: plan in, placed rooms, doors and a score out.
//!
//! Phase order:
//! 1. build the room arena
//! 2. template placement
//! 3. refine, resolve overlaps, legalize
//! 4. lock living/kitchen/foyer, refine again
//! 5. corridors: insert, resolve, merge, fit into free space, lock
//! 6. final refine and legalize, repack if rooms still collide
//! 7. optional polish, doors, expansion and clamp
//! 8. score and validate
//!
//! Soft failures never abort a run. They are logged and counted in
//! [`Diagnostics`]. The one late hard failure is a plan whose rooms no
//! packing can fit ([`PlanError::Unplaceable`]).

use serde::{Deserialize, Serialize};

use crate::adjacency::refine;
use crate::config::{validate_config, LayoutConfig};
use crate::corridors::{fit_corridors, insert_corridors, merge_corridors};
use crate::doors::place_doors;
use crate::error::{PlanError, Result};
use crate::expand::{clamp_to_bounds, expand_rooms};
use crate::geometry::{Orientation, Rect};
use crate::input::{build_rooms, parse_plan, PlanInput};
use crate::model::{Door, Purpose, Role, RoomSet, Zone};
use crate::overlap::{resolve, OverlapOutcome};
use crate::placement::place_rooms;
use crate::polish::polish_layout;
use crate::repack::{repack, RepackReport, Strategy};
use crate::score::score_layout;
use crate::settle::{legalize, LegalizeReport, SettleParams};
use crate::validate::{validate_layout, Severity, ValidationError};

/// Buildable rectangle as emitted in the layout JSON.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub xmin: f32,
    pub ymin: f32,
    pub xmax: f32,
    pub ymax: f32,
}

impl From<&Rect> for Bounds {
    fn from(r: &Rect) -> Self {
        let (xmin, ymin, xmax, ymax) = r.bounds();
        Self {
            xmin,
            ymin,
            xmax,
            ymax,
        }
    }
}

/// A room in the finished layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedRoom {
    pub room_id: String,
    pub name: String,
    pub purpose: Purpose,
    pub zone: Zone,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// A door in the finished layout, referencing rooms by `room_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoorRecord {
    pub from: String,
    pub to: String,
    pub x: f32,
    pub y: f32,
    pub orientation: Orientation,
}

/// Finished layout, in the shape downstream renderers consume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    pub bounds: Bounds,
    pub quality_score: i32,
    pub rooms: Vec<PlacedRoom>,
    pub doors: Vec<DoorRecord>,
}

/// Soft outcomes of a run.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    /// Adjacency edges dropped at build time (unknown or self target).
    pub dropped_edges: usize,
    /// Roles recovered from room names.
    pub roles_inferred: usize,
    /// Attach edges the refiner could not satisfy, summed over all runs.
    pub refine_misses: usize,
    /// One entry per overlap resolver run.
    pub overlap_runs: Vec<OverlapOutcome>,
    pub corridors_inserted: usize,
    pub corridors_merged: usize,
    /// Corridors trimmed to their longest free stretch.
    pub corridors_clipped: usize,
    /// Corridors removed for lack of space, while fitting or repacking.
    pub corridors_dropped: usize,
    /// Rooms relocated by the legalizer or corridor fitting.
    pub rooms_settled: usize,
    /// Rooms the last settle could not place.
    pub rooms_unsettled: usize,
    pub master_pair_repaired: bool,
    pub master_pair_unresolved: bool,
    /// Repack strategy applied, if the legalizer left rooms colliding.
    pub repack: Option<Strategy>,
    pub rooms_repacked: usize,
    /// Locked rooms the repack had to move.
    pub locked_relocated: usize,
    pub expand_steps: usize,
    pub rooms_clamped: usize,
    pub rooms_polished: usize,
    pub violations: Vec<ValidationError>,
}

impl Diagnostics {
    /// Overlap resolver runs that stopped at the pass cap.
    pub fn overlap_cap_hits(&self) -> usize {
        self.overlap_runs.iter().filter(|o| !o.converged).count()
    }

    /// Validation findings with [`Severity::Error`].
    pub fn errors(&self) -> impl Iterator<Item = &ValidationError> {
        self.violations
            .iter()
            .filter(|v| v.severity == Severity::Error)
    }

    fn absorb_legalize(&mut self, report: LegalizeReport) {
        self.rooms_settled += report.moved;
        self.rooms_unsettled = report.unresolved;
        self.master_pair_repaired |= report.pair_repaired;
        self.master_pair_unresolved = report.pair_unresolved;
    }

    fn absorb_repack(&mut self, report: RepackReport) {
        self.repack = report.strategy;
        self.rooms_repacked = report.relocated;
        self.locked_relocated = report.relocated_locked;
        self.corridors_dropped += report.corridors_dropped;
    }
}

/// A finished layout plus what happened on the way.
#[derive(Debug, Clone)]
pub struct LayoutRun {
    pub layout: Layout,
    pub diagnostics: Diagnostics,
}

fn lock_primary_rooms(set: &mut RoomSet) {
    for room in set.iter_mut() {
        if room.is(Purpose::Living)
            || room.is(Purpose::Kitchen)
            || room.is(Purpose::Foyer)
            || room.role == Role::Foyer
        {
            room.locked = true;
        }
    }
}

fn lock_circulation(set: &mut RoomSet) {
    for room in set.iter_mut().filter(|r| r.is_circulation()) {
        room.locked = true;
    }
}

fn export(set: &RoomSet, doors: &[Door], bounds: &Rect, quality_score: i32) -> Layout {
    let key = |id| set.get(id).map(|r| r.key.clone()).unwrap_or_default();
    Layout {
        bounds: Bounds::from(bounds),
        quality_score,
        rooms: set
            .iter()
            .map(|r| PlacedRoom {
                room_id: r.key.clone(),
                name: r.name.clone(),
                purpose: r.purpose,
                zone: r.zone,
                x: r.rect.x,
                y: r.rect.y,
                width: r.rect.width,
                height: r.rect.height,
            })
            .collect(),
        doors: doors
            .iter()
            .map(|d| DoorRecord {
                from: key(d.from),
                to: key(d.to),
                x: d.x,
                y: d.y,
                orientation: d.orientation,
            })
            .collect(),
    }
}

/// Run the full pipeline on one plan.
pub fn generate_layout(plan: &PlanInput, config: &LayoutConfig) -> Result<LayoutRun> {
    let errors = validate_config(config);
    if !errors.is_empty() {
        return Err(PlanError::InvalidConfig(errors));
    }

    let plot = plan.plot(config);
    let bounds = plot.buildable();
    if !(bounds.width > 0.0 && bounds.height > 0.0) {
        return Err(PlanError::EmptyBuildableArea {
            width: plot.width,
            depth: plot.depth,
        });
    }

    let (mut set, report) = build_rooms(plan, &bounds, config)?;
    let mut diag = Diagnostics {
        dropped_edges: report.dropped_edges,
        roles_inferred: report.inferred_roles,
        ..Diagnostics::default()
    };
    let params = SettleParams::from(config);
    let passes = &config.refine.passes;

    log::info!(
        "Generating layout for {} rooms in {}×{} buildable area",
        set.len(),
        bounds.width,
        bounds.height
    );

    place_rooms(&mut set, &bounds);

    diag.refine_misses += refine(&mut set, &bounds, &config.refine, config.grid, passes.initial).misses;
    diag.overlap_runs.push(resolve(&mut set, &config.overlap));
    diag.absorb_legalize(legalize(&mut set, &bounds, &params));

    lock_primary_rooms(&mut set);
    diag.refine_misses += refine(&mut set, &bounds, &config.refine, config.grid, passes.reinforce).misses;

    diag.corridors_inserted = insert_corridors(&mut set, &config.corridor);
    diag.overlap_runs.push(resolve(&mut set, &config.overlap));
    diag.corridors_merged = merge_corridors(&mut set, &config.corridor);
    let fit = fit_corridors(&mut set, &bounds, &config.corridor, config.grid);
    diag.corridors_clipped = fit.clipped;
    diag.corridors_dropped = fit.dropped;
    diag.rooms_settled += fit.moved;
    if config.polish {
        diag.rooms_polished += polish_layout(&mut set, &bounds);
    }
    lock_circulation(&mut set);

    diag.refine_misses += refine(&mut set, &bounds, &config.refine, config.grid, passes.last).misses;
    diag.absorb_legalize(legalize(&mut set, &bounds, &params));
    diag.absorb_repack(repack(&mut set, &bounds, &params));

    if config.polish {
        diag.rooms_polished += polish_layout(&mut set, &bounds);
    }
    let doors = place_doors(&set, &config.door);

    diag.expand_steps = expand_rooms(&mut set, &bounds, &config.expand);
    diag.rooms_clamped = clamp_to_bounds(&mut set, &bounds, config.grid);

    let quality_score = score_layout(&set, &doors, &config.score);

    diag.violations = validate_layout(&set, &doors, &bounds, config);
    for v in &diag.violations {
        match v.severity {
            Severity::Error => log::warn!("[{}] {}", v.category, v.message),
            Severity::Warning => log::debug!("[{}] {}", v.category, v.message),
        }
    }
    let unplaced: Vec<String> = diag
        .errors()
        .filter(|v| matches!(v.category, "room_overlap" | "room_geometry"))
        .map(|v| v.message.clone())
        .collect();
    if !unplaced.is_empty() {
        return Err(PlanError::Unplaceable(unplaced));
    }

    log::info!(
        "Layout done: {} rooms, {} doors, score {} ({} refine misses, {} overlap cap hits)",
        set.len(),
        doors.len(),
        quality_score,
        diag.refine_misses,
        diag.overlap_cap_hits()
    );

    Ok(LayoutRun {
        layout: export(&set, &doors, &bounds, quality_score),
        diagnostics: diag,
    })
}

/// Parse a plan document, run the pipeline, and return the layout as JSON.
pub fn generate_layout_json(json: &str, plan_id: Option<&str>, config: &LayoutConfig) -> Result<String> {
    let plan = parse_plan(json, plan_id)?;
    let run = generate_layout(&plan, config)?;
    Ok(serde_json::to_string_pretty(&run.layout)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan(json: &str) -> PlanInput {
        parse_plan(json, None).unwrap()
    }

    #[test]
    fn test_empty_room_list_scores_base_plus_bonus() {
        let run = generate_layout(&plan(r#"{"rooms": []}"#), &LayoutConfig::default()).unwrap();
        assert_eq!(run.layout.quality_score, 110);
        assert!(run.layout.rooms.is_empty());
        assert!(run.layout.doors.is_empty());
        assert_eq!(
            run.layout.bounds,
            Bounds {
                xmin: 5.0,
                ymin: 5.0,
                xmax: 35.0,
                ymax: 35.0
            }
        );
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = LayoutConfig {
            grid: 0.0,
            ..LayoutConfig::default()
        };
        let err = generate_layout(&plan(r#"{"rooms": []}"#), &config).unwrap_err();
        assert!(matches!(err, PlanError::InvalidConfig(_)));
    }

    #[test]
    fn test_plan_setbacks_can_empty_the_plot() {
        let json = r#"{
            "geometry": {
                "plot_boundary_ft": {"width": 20, "depth": 20},
                "setbacks_ft": {"front": 10, "rear": 10, "left": 2, "right": 2}
            },
            "rooms": []
        }"#;
        let err = generate_layout(&plan(json), &LayoutConfig::default()).unwrap_err();
        assert!(matches!(err, PlanError::EmptyBuildableArea { .. }));

        let config = LayoutConfig {
            use_plan_geometry: false,
            ..LayoutConfig::default()
        };
        assert!(generate_layout(&plan(json), &config).is_ok());
    }

    #[test]
    fn test_missing_rooms_fails_before_placement() {
        let err = generate_layout(&plan(r#"{"plan_id": "x"}"#), &LayoutConfig::default()).unwrap_err();
        assert!(matches!(err, PlanError::MissingRooms));
    }

    #[test]
    fn test_attached_rooms_end_up_wall_adjacent() {
        let json = r#"{"rooms": [
            {"room_id": "living", "name": "Living", "purpose": "living",
             "dimensions_ft": [10, 10], "placement_intent": {"zone": "public"},
             "adjacency_edges": [{"to": "kitchen", "type": "attach"}]},
            {"room_id": "kitchen", "name": "Kitchen", "purpose": "kitchen",
             "dimensions_ft": [8, 8], "placement_intent": {"zone": "service"}}
        ]}"#;
        let run = generate_layout(&plan(json), &LayoutConfig::default()).unwrap();
        let rect = |key: &str| {
            let r = run.layout.rooms.iter().find(|r| r.room_id == key).unwrap();
            Rect::new(r.x, r.y, r.width, r.height)
        };
        let (living, kitchen) = (rect("living"), rect("kitchen"));
        assert!(!living.overlaps(&kitchen));
        assert!(living.shared_wall_length(&kitchen, 1.0) >= 2.5, "{living:?} {kitchen:?}");
        assert!(run.diagnostics.errors().next().is_none(), "{:?}", run.diagnostics.violations);
    }

    #[test]
    fn test_crowded_plot_is_repacked() {
        // Six 9×9 rooms fill most of the 30×30 buildable area.
        let rooms: Vec<String> = (0..6)
            .map(|i| {
                format!(
                    r#"{{"room_id": "r{i}", "name": "Room {i}", "purpose": "store",
                        "dimensions_ft": [9, 9], "placement_intent": {{"zone": "service"}}}}"#
                )
            })
            .collect();
        let json = format!(r#"{{"rooms": [{}]}}"#, rooms.join(","));
        let run = generate_layout(&plan(&json), &LayoutConfig::default()).unwrap();
        assert_eq!(run.layout.rooms.len(), 6);
        assert!(run.diagnostics.errors().next().is_none(), "{:?}", run.diagnostics.violations);
    }

    #[test]
    fn test_plan_no_packing_fits_is_unplaceable() {
        let rooms: Vec<String> = (0..4)
            .map(|i| {
                format!(
                    r#"{{"room_id": "r{i}", "name": "Room {i}", "purpose": "store",
                        "dimensions_ft": [16, 16], "placement_intent": {{"zone": "service"}}}}"#
                )
            })
            .collect();
        let json = format!(r#"{{"rooms": [{}]}}"#, rooms.join(","));
        let err = generate_layout(&plan(&json), &LayoutConfig::default()).unwrap_err();
        assert!(matches!(err, PlanError::Unplaceable(ref found) if !found.is_empty()), "{err}");
    }

    #[test]
    fn test_polish_keeps_invariants() {
        let json = r#"{"rooms": [
            {"room_id": "living", "name": "Living", "purpose": "living",
             "dimensions_ft": [12, 10], "placement_intent": {"zone": "public"},
             "adjacency_edges": [{"to": "bath", "type": "attach"}, {"to": "bed", "type": "separate"}]},
            {"room_id": "bath", "name": "Bath", "purpose": "bathroom",
             "dimensions_ft": [5, 5], "placement_intent": {"zone": "private"}},
            {"room_id": "bed", "name": "Bedroom", "purpose": "bedroom",
             "dimensions_ft": [10, 10], "placement_intent": {"zone": "private"}}
        ]}"#;
        let config = LayoutConfig {
            polish: true,
            ..LayoutConfig::default()
        };
        let run = generate_layout(&plan(json), &config).unwrap();
        assert!(run.diagnostics.errors().next().is_none(), "{:?}", run.diagnostics.violations);
    }
}
