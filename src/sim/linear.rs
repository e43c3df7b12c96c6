//! Linear scan collider
//!
//! Tests the newest segment against every stored segment of every tracked
//! trail. Slow, but simple enough to serve as the reference for the grid.

use std::fmt;

use super::collision::{
    ArenaRect, Bounds, Collider, CollisionError, Tracker, TrackerState, check_inside,
    tail_segment,
};
use super::segment::intersects;
use super::trail::{TrailId, Trails};
use crate::ground;

/// Reference collider: a list of tracked trails
pub struct LinearCollider {
    bounds: Bounds,
    trails: Vec<TrailId>,
    round: u64,
}

impl LinearCollider {
    /// Trails currently scanned
    pub fn trails(&self) -> &[TrailId] {
        &self.trails
    }

    fn enlist(&mut self, trail: TrailId) {
        if !self.trails.contains(&trail) {
            self.trails.push(trail);
        }
    }
}

impl Collider for LinearCollider {
    type Tracker = LinearTracker;

    fn new(arena: ArenaRect) -> Self {
        Self {
            bounds: arena.into(),
            trails: Vec::new(),
            round: 0,
        }
    }

    fn track(&mut self, trail: TrailId) -> LinearTracker {
        self.enlist(trail);
        LinearTracker {
            trail,
            round: self.round,
            state: TrackerState::Idle,
        }
    }

    fn reset(&mut self) {
        self.trails.clear();
        self.round += 1;
        log::debug!("linear collider reset, round {}", self.round);
    }

    fn bounds(&self) -> Bounds {
        self.bounds
    }
}

impl fmt::Display for LinearCollider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<linear collider: {} trail(s)>", self.trails.len())
    }
}

/// Per-trail handle into a [`LinearCollider`]
#[derive(Debug, Clone)]
pub struct LinearTracker {
    trail: TrailId,
    round: u64,
    state: TrackerState,
}

impl LinearTracker {
    fn step(&self, collider: &LinearCollider, trails: &Trails) -> Result<(), CollisionError> {
        let (from, to) = tail_segment(trails.points(self.trail))?;
        check_inside(&collider.bounds, from, to)?;

        for &id in &collider.trails {
            let points = trails.points(id);
            // The newest segment is the one being tested
            let end = if id == self.trail {
                points.len() - 1
            } else {
                points.len()
            };

            for pair in points[..end].windows(2) {
                let (a, b) = (ground(pair[0]), ground(pair[1]));
                if intersects(a, b, from, to) {
                    return Err(CollisionError::segment(a, b));
                }
            }
        }
        Ok(())
    }
}

impl Tracker for LinearTracker {
    type Collider = LinearCollider;

    fn trail(&self) -> TrailId {
        self.trail
    }

    fn state(&self) -> TrackerState {
        self.state
    }

    fn update(
        &mut self,
        collider: &mut LinearCollider,
        trails: &Trails,
    ) -> Result<(), CollisionError> {
        if self.round != collider.round {
            self.round = collider.round;
            self.state = TrackerState::Idle;
            collider.enlist(self.trail);
        }
        if let Some(err) = self.state.terminal_error() {
            return Err(err);
        }

        let result = self.step(collider, trails);
        if let Err(err) = &result {
            if err.is_fatal() {
                log::debug!("{} stopped: {err}", self.trail);
            }
        }
        self.state.settle(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn test_scan_finds_other_trail() {
        let mut collider = LinearCollider::new(ArenaRect::default());
        let mut trails = Trails::new();
        let (a, b) = (trails.spawn(), trails.spawn());
        let mut ta = collider.track(a);
        let mut tb = collider.track(b);

        trails.push(a, Vec3::new(-2.0, 0.0, 0.5));
        trails.push(a, Vec3::new(2.0, 0.0, 0.5));
        assert_eq!(ta.update(&mut collider, &trails), Ok(()));

        trails.push(b, Vec3::new(0.5, 0.0, -2.0));
        trails.push(b, Vec3::new(0.5, 0.0, 1.5));
        assert_eq!(
            tb.update(&mut collider, &trails),
            Err(CollisionError::Segment {
                x0: -2.0,
                y0: 0.5,
                x1: 2.0,
                y1: 0.5
            })
        );
        assert!(tb.state().is_terminal());
        assert_eq!(ta.state(), TrackerState::Tracking);
    }

    #[test]
    fn test_own_newest_segment_is_skipped() {
        let mut collider = LinearCollider::new(ArenaRect::default());
        let mut trails = Trails::new();
        let id = trails.spawn();
        let mut tracker = collider.track(id);

        for p in [(0.0, 0.0), (0.0, 1.0), (1.0, 1.0)] {
            trails.push(id, Vec3::new(p.0, 0.0, p.1));
            let _ = tracker.update(&mut collider, &trails);
        }
        assert_eq!(tracker.state(), TrackerState::Tracking);

        // Reverse onto the previous segment
        trails.push(id, Vec3::new(0.0, 0.0, 1.0));
        assert!(tracker.update(&mut collider, &trails).is_err());
    }

    #[test]
    fn test_boundary() {
        let mut collider = LinearCollider::new(ArenaRect::default());
        let mut trails = Trails::new();
        let id = trails.spawn();
        let mut tracker = collider.track(id);

        trails.push(id, Vec3::new(9.0, 0.0, 0.0));
        trails.push(id, Vec3::new(10.0, 0.0, 0.0));
        assert_eq!(
            tracker.update(&mut collider, &trails),
            Err(CollisionError::Boundary)
        );
        assert_eq!(tracker.state(), TrackerState::Boundary);
    }

    #[test]
    fn test_start_outside_arena_is_boundary() {
        let mut collider = LinearCollider::new(ArenaRect::default());
        let mut trails = Trails::new();
        let id = trails.spawn();
        let mut tracker = collider.track(id);

        // Single point amended onto the wall, then a step back inside
        trails.push(id, Vec3::new(0.0, 0.0, 8.5));
        trails.extend(id, Vec3::new(0.0, 0.0, 10.0));
        assert_eq!(
            tracker.update(&mut collider, &trails),
            Err(CollisionError::InsufficientSegment)
        );
        trails.push(id, Vec3::new(0.0, 0.0, 9.75));
        assert_eq!(
            tracker.update(&mut collider, &trails),
            Err(CollisionError::Boundary)
        );
    }

    #[test]
    fn test_reset_reenlists_stale_trackers() {
        let mut collider = LinearCollider::new(ArenaRect::default());
        let mut trails = Trails::new();
        let id = trails.spawn();
        let mut tracker = collider.track(id);
        assert_eq!(collider.to_string(), "<linear collider: 1 trail(s)>");

        collider.reset();
        assert!(collider.trails().is_empty());

        trails.push(id, Vec3::ZERO);
        trails.push(id, Vec3::X);
        assert_eq!(tracker.update(&mut collider, &trails), Ok(()));
        assert_eq!(collider.trails(), &[id]);
    }
}
