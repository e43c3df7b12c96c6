//! Deterministic simulation module
//!
//! Trail collision and the round loop built on it. This module must be pure
//! and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by rider index, then by cell walk order)
//! - No rendering or platform dependencies

pub mod collision;
pub mod cycle;
pub mod grid;
pub mod linear;
pub mod segment;
pub mod state;
pub mod tick;
pub mod trail;

pub use collision::{
    ArenaError, ArenaRect, Bounds, Collider, CollisionError, Tracker, TrackerState,
};
pub use cycle::{BotSteering, LightCycle};
pub use grid::{Fragment, FragmentRef, GridCollider, GridTracker};
pub use linear::{LinearCollider, LinearTracker};
pub use segment::{box_overlap, clip, intersects};
pub use state::{GameEvent, Rider, RngState, RoundPhase, RoundState};
pub use tick::{TickInput, tick};
pub use trail::{TrailId, Trails};
