//! Hard failures of the layout pipeline.
//!
//! Everything here except [`PlanError::Unplaceable`] aborts a run before any
//! placement work starts. `Unplaceable` is the one late failure: no packing
//! fits every room without overlaps. Soft conditions (iteration caps,
//! refinement misses, settle misses) are reported through
//! [`crate::pipeline::Diagnostics`] instead.

use thiserror::Error;

use crate::config::ConfigError;

/// Result type for plan construction and pipeline entry points.
pub type Result<T> = std::result::Result<T, PlanError>;

/// Errors raised while turning a plan into a room arena.
#[derive(Error, Debug)]
pub enum PlanError {
    /// The plan document is not valid JSON or a mandatory field is absent.
    #[error("invalid plan JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The plan has no `rooms` array.
    #[error("plan has no `rooms` array")]
    MissingRooms,

    /// A multi-plan document does not contain the requested plan.
    #[error("plan `{0}` not found in document")]
    PlanNotFound(String),

    /// A multi-plan document contains no plans at all.
    #[error("plan document contains no plans")]
    EmptyDocument,

    /// Two rooms share the same `room_id`.
    #[error("duplicate room id `{0}`")]
    DuplicateRoomId(String),

    /// A room has zero, negative or non-finite dimensions.
    #[error("room `{id}` has invalid dimensions {width}×{height}")]
    InvalidDimensions { id: String, width: f32, height: f32 },

    /// A room cannot fit inside the buildable rectangle at all.
    #[error("room `{id}` ({width}×{height}) exceeds the buildable area ({bound_w}×{bound_h})")]
    RoomExceedsBounds {
        id: String,
        width: f32,
        height: f32,
        bound_w: f32,
        bound_h: f32,
    },

    /// Setbacks leave no buildable area.
    #[error("plot {width}×{depth} leaves no buildable area after setbacks")]
    EmptyBuildableArea { width: f32, depth: f32 },

    /// The layout configuration failed validation.
    #[error("invalid layout configuration: {0:?}")]
    InvalidConfig(Vec<ConfigError>),

    /// Even a full repack left rooms overlapping or out of bounds.
    #[error("could not place every room without overlaps: {}", .0.join("; "))]
    Unplaceable(Vec<String>),
}
