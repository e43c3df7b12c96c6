//! Collider facade: errors, arena bounds and the tracker state machine
//!
//! A collider answers one question per trail update: does the newest segment
//! leave the arena or strike any segment placed before it? Two colliders
//! share this interface: the spatial grid used in play and a linear scan kept
//! as the reference oracle.

use std::fmt;

use glam::{IVec2, Vec2, Vec3};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::trail::{TrailId, Trails};
use crate::consts::{ARENA_MAX, ARENA_MIN, MAX_ARENA_CELLS};
use crate::ground;

/// Outcome of a trail update that did not succeed
#[derive(Debug, Clone, Copy, PartialEq, Error, Serialize, Deserialize)]
pub enum CollisionError {
    /// Fewer than two points recorded; wait for more
    #[error("trail has fewer than two points")]
    InsufficientSegment,
    /// The newest point left the arena (touching the wall counts)
    #[error("collision with boundary")]
    Boundary,
    /// The newest segment struck a stored segment with these endpoints
    #[error("collision with segment: {x0},{y0} -> {x1},{y1}")]
    Segment { x0: f32, y0: f32, x1: f32, y1: f32 },
}

impl CollisionError {
    pub(crate) fn segment(a: Vec2, b: Vec2) -> Self {
        Self::Segment {
            x0: a.x,
            y0: a.y,
            x1: b.x,
            y1: b.y,
        }
    }

    /// Whether the error ends the trail (everything but `InsufficientSegment`)
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::InsufficientSegment)
    }
}

/// Arena rectangle could not be used
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ArenaError {
    #[error("arena rectangle {min}..{max} is empty")]
    Empty { min: IVec2, max: IVec2 },
    #[error("arena of {cells} cells exceeds the limit of {max}")]
    TooLarge { cells: u64, max: u64 },
}

/// Integer arena rectangle; every unit square is one grid cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArenaRect {
    pub min: IVec2,
    pub max: IVec2,
}

impl Default for ArenaRect {
    fn default() -> Self {
        Self {
            min: IVec2::new(ARENA_MIN.0, ARENA_MIN.1),
            max: IVec2::new(ARENA_MAX.0, ARENA_MAX.1),
        }
    }
}

impl ArenaRect {
    pub fn new(min: IVec2, max: IVec2) -> Result<Self, ArenaError> {
        let rect = Self { min, max };
        rect.validate()?;
        Ok(rect)
    }

    /// Reject empty, inverted or oversized rectangles (e.g. after deserializing)
    pub fn validate(&self) -> Result<(), ArenaError> {
        if !(self.min.x < self.max.x && self.min.y < self.max.y) {
            return Err(ArenaError::Empty {
                min: self.min,
                max: self.max,
            });
        }

        let cells = self.width() as u64 * self.height() as u64;
        if cells > MAX_ARENA_CELLS {
            return Err(ArenaError::TooLarge {
                cells,
                max: MAX_ARENA_CELLS,
            });
        }
        Ok(())
    }

    /// Number of cell columns
    pub fn width(&self) -> usize {
        if self.max.x > self.min.x {
            self.max.x.abs_diff(self.min.x) as usize
        } else {
            0
        }
    }

    /// Number of cell rows
    pub fn height(&self) -> usize {
        if self.max.y > self.min.y {
            self.max.y.abs_diff(self.min.y) as usize
        } else {
            0
        }
    }
}

/// Float arena bounds on the ground plane (`y` is world Z)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl From<ArenaRect> for Bounds {
    fn from(rect: ArenaRect) -> Self {
        Self {
            x1: rect.min.x as f32,
            y1: rect.min.y as f32,
            x2: rect.max.x as f32,
            y2: rect.max.y as f32,
        }
    }
}

impl Bounds {
    /// Strictly inside; a point on the wall is already a collision
    #[inline]
    pub fn contains(&self, p: Vec2) -> bool {
        self.x1 < p.x && p.x < self.x2 && self.y1 < p.y && p.y < self.y2
    }

    #[inline]
    pub fn min(&self) -> Vec2 {
        Vec2::new(self.x1, self.y1)
    }

    #[inline]
    pub fn max(&self) -> Vec2 {
        Vec2::new(self.x2, self.y2)
    }
}

/// Per-trail state machine
///
/// `Idle -> Tracking -> (Boundary | SegmentCollision)`. Terminal states are
/// sticky: a respawned trail needs a new tracker.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum TrackerState {
    /// Waiting for a first full segment
    #[default]
    Idle,
    /// Last update succeeded
    Tracking,
    /// Left the arena
    Boundary,
    /// Struck the stored segment `(x0, y0) -> (x1, y1)`
    SegmentCollision { x0: f32, y0: f32, x1: f32, y1: f32 },
}

impl TrackerState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Boundary | Self::SegmentCollision { .. })
    }

    /// The error a terminal state keeps answering with
    pub fn terminal_error(&self) -> Option<CollisionError> {
        match *self {
            Self::Idle | Self::Tracking => None,
            Self::Boundary => Some(CollisionError::Boundary),
            Self::SegmentCollision { x0, y0, x1, y1 } => {
                Some(CollisionError::Segment { x0, y0, x1, y1 })
            }
        }
    }

    /// Fold an update result into the state machine and pass it through
    pub(crate) fn settle(
        &mut self,
        result: Result<(), CollisionError>,
    ) -> Result<(), CollisionError> {
        match result {
            Ok(()) => *self = Self::Tracking,
            Err(CollisionError::InsufficientSegment) => {}
            Err(CollisionError::Boundary) => *self = Self::Boundary,
            Err(CollisionError::Segment { x0, y0, x1, y1 }) => {
                *self = Self::SegmentCollision { x0, y0, x1, y1 }
            }
        }
        result
    }
}

/// A shared collision structure that hands out per-trail trackers
pub trait Collider: fmt::Display + Sized {
    type Tracker: Tracker<Collider = Self>;

    /// Create an empty collider covering `arena`
    fn new(arena: ArenaRect) -> Self;

    /// Start tracking a trail
    fn track(&mut self, trail: TrailId) -> Self::Tracker;

    /// Forget every stored segment (new round)
    fn reset(&mut self);

    fn bounds(&self) -> Bounds;
}

/// Per-trail cursor into a collider
pub trait Tracker {
    type Collider;

    fn trail(&self) -> TrailId;

    fn state(&self) -> TrackerState;

    /// Check and register the trail's newest segment
    ///
    /// Call once after every appended or amended point.
    fn update(
        &mut self,
        collider: &mut Self::Collider,
        trails: &Trails,
    ) -> Result<(), CollisionError>;
}

/// Accept a segment only when both endpoints are strictly inside the arena
///
/// Both colliders go through this, so a point is never inside for one and
/// outside for the other.
pub(crate) fn check_inside(bounds: &Bounds, from: Vec2, to: Vec2) -> Result<(), CollisionError> {
    if bounds.contains(from) && bounds.contains(to) {
        Ok(())
    } else {
        Err(CollisionError::Boundary)
    }
}

/// Last two points of a trail on the ground plane
pub(crate) fn tail_segment(points: &[Vec3]) -> Result<(Vec2, Vec2), CollisionError> {
    match points {
        [.., from, to] => Ok((ground(*from), ground(*to))),
        _ => Err(CollisionError::InsufficientSegment),
    }
}
