//! Linerage - trail collision engine for a light-cycle arena game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (segment predicates, spatial grid,
//!   trail trackers, light cycles, round driver)
//! - `settings`: Data-driven arena and round configuration

pub mod settings;
pub mod sim;

pub use settings::{ColliderKind, Settings, SettingsError};

use glam::{Vec2, Vec3};

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;

    /// Default arena rectangle (integer arena units, one grid cell each)
    pub const ARENA_MIN: (i32, i32) = (-10, -10);
    pub const ARENA_MAX: (i32, i32) = (10, 10);
    /// Largest arena the grid will allocate cells for
    pub const MAX_ARENA_CELLS: u64 = 1 << 24;

    /// Light cycle speed in arena units per second
    pub const CYCLE_SPEED: f32 = 3.0;
    /// Steering applied per tick while a turn key is held (radians)
    pub const TURN_SPEED: f32 = 0.1;
    /// Buffered steering beyond this commits a turn (radians)
    pub const TURN_THRESHOLD: f32 = 0.5;

    /// Spawn points keep this distance from the arena walls
    pub const SPAWN_MARGIN: f32 = 2.0;

    /// Bots start turning when the wall is this close ahead
    pub const BOT_LOOKAHEAD: f32 = 2.0;
    /// Bots hold a steering choice for this many ticks (min..max)
    pub const BOT_MIN_HOLD: u32 = 10;
    pub const BOT_MAX_HOLD: u32 = 60;

    /// Default number of ticks in a headless round (one minute)
    pub const ROUND_TICKS: u64 = 3600;
}

/// Project a world point onto the ground plane (X, Z)
///
/// Height (Y) never takes part in collision.
#[inline]
pub fn ground(p: Vec3) -> Vec2 {
    Vec2::new(p.x, p.z)
}

/// Heading vector for a light cycle angle
///
/// Angle zero points along +X/+Z, matching the cycle's spawn orientation.
#[inline]
pub fn heading(angle: f32) -> Vec3 {
    let (sin, cos) = angle.sin_cos();
    Vec3::new(cos - sin, 0.0, sin + cos)
}
