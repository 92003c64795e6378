//! Pure floor-plan synthesis logic.
//!
//! Turns a room requirement graph (sizes, purposes, zoning intent, adjacency
//! preferences) into a non-overlapping plan with corridors and doors, then
//! derives outer and inner wall segments from the finished rooms. Functions
//! take plain data and return results; the only I/O is parsing JSON already
//! in memory.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`adjacency`] | Snaps rooms against their anchors to satisfy "attach" edges |
//! | [`config`] | Layout and envelope configuration, defaults, validation |
//! | [`corridors`] | Corridor insertion, merging, and fitting into free space |
//! | [`doors`] | Door inference from shared walls |
//! | [`envelope`] | Outer silhouette, inner partitions, wall merging and offset |
//! | [`error`] | Hard failures (`PlanError`) |
//! | [`expand`] | Greedy room growth into free space, final clamp |
//! | [`geometry`] | Rectangle math and grid snapping |
//! | [`input`] | Plan JSON schema and room arena construction |
//! | [`model`] | Rooms, doors, wall segments, the `RoomSet` arena |
//! | [`overlap`] | Rule-based overlap resolution |
//! | [`pipeline`] | Phase orchestration, layout output, diagnostics |
//! | [`placement`] | Purpose priorities and template placement |
//! | [`polish`] | Opt-in corridor and bathroom rounding |
//! | [`repack`] | Last-resort whole-layout repacking when rooms still collide |
//! | [`score`] | Heuristic layout quality score |
//! | [`settle`] | Master-pair repair and free-slot relocation |
//! | [`validate`] | Post-hoc checks on the arena and on serialised layouts |

pub mod adjacency;
pub mod config;
pub mod corridors;
pub mod doors;
pub mod envelope;
pub mod error;
pub mod expand;
pub mod geometry;
pub mod input;
pub mod model;
pub mod overlap;
pub mod pipeline;
pub mod placement;
pub mod polish;
pub mod repack;
pub mod score;
pub mod settle;
pub mod validate;

pub use error::{PlanError, Result};
pub use pipeline::{generate_layout, generate_layout_json, Layout, LayoutRun};
