//! Trail point buffers
//!
//! Trails are owned by the game and addressed by handle. Colliders never copy
//! them; they re-read the store on every update.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Handle to one trail in a [`Trails`] store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TrailId(u32);

impl TrailId {
    /// Position of the trail in its store
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for TrailId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "t{}", self.0)
    }
}

/// Append-only point buffers, one per trail
///
/// The last point of a trail may be replaced in place ([`Trails::extend`])
/// while a straight run continues; everything before it is immutable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Trails {
    trails: Vec<Vec<Vec3>>,
}

impl Trails {
    pub fn new() -> Self {
        Self { trails: Vec::new() }
    }

    /// Allocate an empty trail
    pub fn spawn(&mut self) -> TrailId {
        let id = TrailId(self.trails.len() as u32);
        self.trails.push(Vec::new());
        id
    }

    /// Append a new point (a turn, or the first points of a trail)
    pub fn push(&mut self, id: TrailId, point: Vec3) {
        if let Some(trail) = self.trails.get_mut(id.index()) {
            trail.push(point);
        }
    }

    /// Replace the last point (straight extension); appends to an empty trail
    pub fn extend(&mut self, id: TrailId, point: Vec3) {
        if let Some(trail) = self.trails.get_mut(id.index()) {
            match trail.last_mut() {
                Some(last) => *last = point,
                None => trail.push(point),
            }
        }
    }

    /// Points of a trail; unknown handles read as empty
    #[inline]
    pub fn points(&self, id: TrailId) -> &[Vec3] {
        self.trails.get(id.index()).map(Vec::as_slice).unwrap_or(&[])
    }

    #[inline]
    pub fn len(&self, id: TrailId) -> usize {
        self.points(id).len()
    }

    /// Number of trails in the store
    pub fn count(&self) -> usize {
        self.trails.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trails.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = TrailId> + '_ {
        (0..self.trails.len() as u32).map(TrailId)
    }

    /// Drop every trail (new round); old handles read as empty afterwards
    pub fn clear(&mut self) {
        self.trails.clear();
    }
}
