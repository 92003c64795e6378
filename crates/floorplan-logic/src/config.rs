//! Layout and envelope configuration.
//!
//! Every threshold the pipeline uses lives here instead of being compiled
//! into the phases. Each component receives only its own section, so tests
//! can vary one threshold without touching the rest.
//!
//! All structs deserialize with `#[serde(default)]`, so a JSON file only
//! needs to name the values it overrides:
//!
//! ```
//! use floorplan_logic::config::{validate_config, LayoutConfig};
//!
//! let config: LayoutConfig =
//!     serde_json::from_str(r#"{ "overlap": { "max_passes": 50 } }"#).unwrap();
//! assert_eq!(config.overlap.max_passes, 50);
//! assert_eq!(config.refine.min_shared_wall, 2.5);
//! assert!(validate_config(&config).is_empty());
//! ```

use serde::{Deserialize, Serialize};

use crate::geometry::Rect;

/// Plot size and setbacks. The buildable rectangle is the plot minus setbacks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotConfig {
    pub width: f32,
    pub depth: f32,
    pub setback_front: f32,
    pub setback_rear: f32,
    pub setback_left: f32,
    pub setback_right: f32,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            width: 40.0,
            depth: 40.0,
            setback_front: 5.0,
            setback_rear: 5.0,
            setback_left: 5.0,
            setback_right: 5.0,
        }
    }
}

impl PlotConfig {
    /// Buildable rectangle: origin at (left, front) setbacks.
    pub fn buildable(&self) -> Rect {
        Rect::new(
            self.setback_left,
            self.setback_front,
            self.width - self.setback_left - self.setback_right,
            self.depth - self.setback_front - self.setback_rear,
        )
    }
}

/// Iteration counts of the three adjacency refinement runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefinePasses {
    pub initial: usize,
    pub reinforce: usize,
    #[serde(rename = "final")]
    pub last: usize,
}

impl Default for RefinePasses {
    fn default() -> Self {
        Self {
            initial: 3,
            reinforce: 2,
            last: 1,
        }
    }
}

/// Adjacency refiner thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefineConfig {
    /// Gap left between an anchor and a snapped room.
    pub clearance: f32,
    /// Minimum span two rooms must share for a snap to count.
    pub min_shared_wall: f32,
    pub passes: RefinePasses,
}

impl Default for RefineConfig {
    fn default() -> Self {
        Self {
            clearance: 0.5,
            min_shared_wall: 2.5,
            passes: RefinePasses::default(),
        }
    }
}

/// Overlap resolver thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlapConfig {
    /// Gap left after pushing a room off its anchor.
    pub clearance: f32,
    pub max_passes: usize,
}

impl Default for OverlapConfig {
    fn default() -> Self {
        Self {
            clearance: 1.0,
            max_passes: 200,
        }
    }
}

/// Corridor synthesis and merging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorridorConfig {
    pub width: f32,
    /// Width of the living ↔ master bedroom spine.
    pub primary_width: f32,
    pub max_length: f32,
    /// Two rooms closer than this (with enough span) need no corridor.
    pub adjacency_tolerance: f32,
    pub adjacency_min_span: f32,
    /// Extent mismatch tolerated when merging two corridors.
    pub merge_tolerance: f32,
    /// Merged corridors are never smaller than this on either axis.
    pub min_size: f32,
}

impl Default for CorridorConfig {
    fn default() -> Self {
        Self {
            width: 4.0,
            primary_width: 5.0,
            max_length: 12.0,
            adjacency_tolerance: 1.0,
            adjacency_min_span: 1.0,
            merge_tolerance: 0.5,
            min_size: 4.0,
        }
    }
}

/// Door inference thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DoorConfig {
    /// Walls closer than this are treated as collinear.
    pub tolerance: f32,
    /// Shared span must exceed this to carry a door.
    pub min_overlap: f32,
}

impl Default for DoorConfig {
    fn default() -> Self {
        Self {
            tolerance: 0.2,
            min_overlap: 2.0,
        }
    }
}

/// Per-purpose growth budgets, counted in steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpandBudgets {
    pub living: usize,
    pub kitchen: usize,
    pub master_bedroom: usize,
    pub bedroom: usize,
    pub other: usize,
}

impl Default for ExpandBudgets {
    fn default() -> Self {
        Self {
            living: 30,
            kitchen: 18,
            master_bedroom: 20,
            bedroom: 15,
            other: 10,
        }
    }
}

/// Room expander thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpandConfig {
    pub step: f32,
    pub clearance: f32,
    /// Ignore circulation rooms in the collision test.
    pub into_circulation: bool,
    pub budgets: ExpandBudgets,
}

impl Default for ExpandConfig {
    fn default() -> Self {
        Self {
            step: 0.5,
            clearance: 0.5,
            into_circulation: false,
            budgets: ExpandBudgets::default(),
        }
    }
}

/// Quality scorer weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreConfig {
    pub base: i32,
    pub living_door_allowance: usize,
    pub living_door_penalty: i32,
    pub bedroom_kitchen_penalty: i32,
    pub bathroom_living_penalty: i32,
    pub corridor_allowance: usize,
    pub corridor_penalty: i32,
    /// Rooms below this count earn one point each.
    pub compactness_target: usize,
    pub wall_tolerance: f32,
    pub wall_min_overlap: f32,
}

impl Default for ScoreConfig {
    fn default() -> Self {
        Self {
            base: 100,
            living_door_allowance: 2,
            living_door_penalty: 10,
            bedroom_kitchen_penalty: 15,
            bathroom_living_penalty: 10,
            corridor_allowance: 3,
            corridor_penalty: 5,
            compactness_target: 10,
            wall_tolerance: 0.5,
            wall_min_overlap: 2.0,
        }
    }
}

/// Full layout pipeline configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub plot: PlotConfig,
    /// Placement grid: refiner snapping, legalizer slots and repacking.
    pub grid: f32,
    /// Gap under which two rooms count as wall-adjacent for the master pair.
    pub adjacency_tolerance: f32,
    pub refine: RefineConfig,
    pub overlap: OverlapConfig,
    pub corridor: CorridorConfig,
    pub door: DoorConfig,
    pub expand: ExpandConfig,
    pub score: ScoreConfig,
    /// Run the corridor/bathroom rounding pass before scoring.
    pub polish: bool,
    /// Prefer the plan's own plot/setbacks over `plot`.
    pub use_plan_geometry: bool,
    /// Fall back to name matching ("master", "foyer", "common") for roles.
    pub infer_roles_from_names: bool,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            plot: PlotConfig::default(),
            grid: 0.5,
            adjacency_tolerance: 1.0,
            refine: RefineConfig::default(),
            overlap: OverlapConfig::default(),
            corridor: CorridorConfig::default(),
            door: DoorConfig::default(),
            expand: ExpandConfig::default(),
            score: ScoreConfig::default(),
            polish: false,
            use_plan_geometry: true,
            infer_roles_from_names: true,
        }
    }
}

/// How the envelope builder derives inner walls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InnerWallMode {
    /// Every non-circulation room contributes its four edges.
    RoomEdges,
    /// Only spans where two cells touch become partitions.
    SharedWalls,
}

/// Envelope builder configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvelopeConfig {
    /// Rasterization cell size for the silhouette.
    pub grid: f32,
    /// Circulation cells smaller than this are placement noise.
    pub min_corridor_area: f32,
    pub wall_thickness: f32,
    pub inner_mode: InnerWallMode,
    /// Shift outer walls outward by half the wall thickness.
    pub offset_outer: bool,
}

impl Default for EnvelopeConfig {
    fn default() -> Self {
        Self {
            grid: 0.5,
            min_corridor_area: 6.0,
            wall_thickness: 0.6,
            inner_mode: InnerWallMode::RoomEdges,
            offset_outer: false,
        }
    }
}

/// Configuration validation error.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// A length or tolerance that must be strictly positive is not.
    NonPositive(&'static str, f32),
    /// A clearance or gap that must not be negative is.
    Negative(&'static str, f32),
    /// An iteration cap of zero would skip the phase entirely.
    ZeroPasses(&'static str),
    /// Setbacks consume the whole plot.
    EmptyBuildableArea,
}

/// Validate a layout configuration, returning all errors found.
pub fn validate_config(config: &LayoutConfig) -> Vec<ConfigError> {
    let mut errors = Vec::new();

    let positive = [
        ("grid", config.grid),
        ("adjacency_tolerance", config.adjacency_tolerance),
        ("refine.min_shared_wall", config.refine.min_shared_wall),
        ("corridor.width", config.corridor.width),
        ("corridor.primary_width", config.corridor.primary_width),
        ("corridor.max_length", config.corridor.max_length),
        ("corridor.min_size", config.corridor.min_size),
        ("door.tolerance", config.door.tolerance),
        ("expand.step", config.expand.step),
        ("plot.width", config.plot.width),
        ("plot.depth", config.plot.depth),
    ];
    for (name, value) in positive {
        if value.is_nan() || value <= 0.0 {
            errors.push(ConfigError::NonPositive(name, value));
        }
    }

    let non_negative = [
        ("refine.clearance", config.refine.clearance),
        ("overlap.clearance", config.overlap.clearance),
        ("expand.clearance", config.expand.clearance),
        ("door.min_overlap", config.door.min_overlap),
        ("corridor.merge_tolerance", config.corridor.merge_tolerance),
        ("plot.setback_front", config.plot.setback_front),
        ("plot.setback_rear", config.plot.setback_rear),
        ("plot.setback_left", config.plot.setback_left),
        ("plot.setback_right", config.plot.setback_right),
    ];
    for (name, value) in non_negative {
        if value.is_nan() || value < 0.0 {
            errors.push(ConfigError::Negative(name, value));
        }
    }

    if config.overlap.max_passes == 0 {
        errors.push(ConfigError::ZeroPasses("overlap.max_passes"));
    }

    let buildable = config.plot.buildable();
    if buildable.width <= 0.0 || buildable.height <= 0.0 {
        errors.push(ConfigError::EmptyBuildableArea);
    }

    errors
}

/// Validate an envelope configuration.
pub fn validate_envelope_config(config: &EnvelopeConfig) -> Vec<ConfigError> {
    let mut errors = Vec::new();
    if config.grid.is_nan() || config.grid <= 0.0 {
        errors.push(ConfigError::NonPositive("envelope.grid", config.grid));
    }
    if config.wall_thickness.is_nan() || config.wall_thickness < 0.0 {
        errors.push(ConfigError::Negative(
            "envelope.wall_thickness",
            config.wall_thickness,
        ));
    }
    if config.min_corridor_area.is_nan() || config.min_corridor_area < 0.0 {
        errors.push(ConfigError::Negative(
            "envelope.min_corridor_area",
            config.min_corridor_area,
        ));
    }
    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let errors = validate_config(&LayoutConfig::default());
        assert!(errors.is_empty(), "default config should be valid: {errors:?}");
        assert!(validate_envelope_config(&EnvelopeConfig::default()).is_empty());
    }

    #[test]
    fn test_default_buildable_rect() {
        let b = PlotConfig::default().buildable();
        assert_eq!((b.x, b.y, b.x2(), b.y2()), (5.0, 5.0, 35.0, 35.0));
    }

    #[test]
    fn test_zero_grid_rejected() {
        let mut config = LayoutConfig::default();
        config.grid = 0.0;
        assert!(validate_config(&config).contains(&ConfigError::NonPositive("grid", 0.0)));
    }

    #[test]
    fn test_negative_clearance_rejected() {
        let mut config = LayoutConfig::default();
        config.overlap.clearance = -1.0;
        assert!(validate_config(&config)
            .contains(&ConfigError::Negative("overlap.clearance", -1.0)));
    }

    #[test]
    fn test_zero_overlap_cap_rejected() {
        let mut config = LayoutConfig::default();
        config.overlap.max_passes = 0;
        assert!(validate_config(&config).contains(&ConfigError::ZeroPasses("overlap.max_passes")));
    }

    #[test]
    fn test_setbacks_swallow_plot() {
        let mut config = LayoutConfig::default();
        config.plot.setback_left = 25.0;
        config.plot.setback_right = 20.0;
        assert!(validate_config(&config).contains(&ConfigError::EmptyBuildableArea));
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: LayoutConfig =
            serde_json::from_str(r#"{ "refine": { "passes": { "final": 4 } }, "polish": true }"#)
                .unwrap();
        assert_eq!(config.refine.passes.last, 4);
        assert_eq!(config.refine.passes.initial, 3);
        assert_eq!(config.refine.clearance, 0.5);
        assert!(config.polish);
        assert_eq!(config.corridor.max_length, 12.0);
    }

    #[test]
    fn test_one_grid_drives_every_phase() {
        let config: LayoutConfig =
            serde_json::from_str(r#"{ "grid": 1.0, "refine": { "grid": 2.0 } }"#).unwrap();
        assert_eq!(config.grid, 1.0);
        assert_eq!(crate::settle::SettleParams::from(&config).grid, 1.0);
    }

    #[test]
    fn test_inner_mode_from_json() {
        let config: EnvelopeConfig =
            serde_json::from_str(r#"{ "inner_mode": "shared_walls" }"#).unwrap();
        assert_eq!(config.inner_mode, InnerWallMode::SharedWalls);
        assert_eq!(config.grid, 0.5);
    }
}
