//! Round state and core simulation types
//!
//! Everything a round needs to replay deterministically lives here: the
//! trail store, the collider, one rider per light cycle and the seed.

use std::f32::consts::TAU;

use glam::Vec3;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::collision::{Bounds, Collider, CollisionError, Tracker, TrackerState};
use super::cycle::{BotSteering, LightCycle};
use super::trail::Trails;
use crate::consts::*;
use crate::settings::Settings;

/// Current phase of a round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundPhase {
    /// Cycles are moving
    Running,
    /// At most one cycle left (none for a solo round)
    Over,
}

/// Things that happened during a tick, for the caller to react to
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// A rider's trail left the arena or struck a segment
    Crashed {
        rider: usize,
        tick: u64,
        error: CollisionError,
    },
    /// The round ended; `winner` is the last rider standing
    RoundOver { winner: Option<usize> },
}

/// RNG state wrapper for serialization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RngState {
    pub seed: u64,
    /// Advanced once per round
    pub stream: u64,
}

impl RngState {
    pub fn new(seed: u64) -> Self {
        Self { seed, stream: 0 }
    }

    pub fn to_rng(&self) -> Pcg32 {
        Pcg32::new(self.seed, self.stream)
    }
}

/// A light cycle with its tracker and bot steering
#[derive(Debug, Clone)]
pub struct Rider<T> {
    pub cycle: LightCycle,
    pub tracker: T,
    pub bot: BotSteering,
    pub alive: bool,
}

/// Complete round state, generic over the collider
pub struct RoundState<C: Collider> {
    pub settings: Settings,
    pub rng_state: RngState,
    /// Round counter (0-based)
    pub round: u32,
    /// Simulation tick counter for this round
    pub time_ticks: u64,
    pub phase: RoundPhase,
    pub trails: Trails,
    pub collider: C,
    /// Riders in spawn order; a rider's index is its id
    pub riders: Vec<Rider<C::Tracker>>,
    /// Events since the caller last drained them
    pub events: Vec<GameEvent>,
}

impl<C: Collider> RoundState<C> {
    /// Create a round and spawn its riders
    pub fn new(settings: Settings) -> Self {
        let mut state = Self {
            collider: C::new(settings.arena),
            rng_state: RngState::new(settings.seed),
            settings,
            round: 0,
            time_ticks: 0,
            phase: RoundPhase::Running,
            trails: Trails::new(),
            riders: Vec::new(),
            events: Vec::new(),
        };
        state.spawn_riders();
        state
    }

    /// Clear trails and collider and start the next round
    pub fn reset(&mut self) {
        self.trails.clear();
        self.collider.reset();
        self.riders.clear();
        self.events.clear();
        self.round += 1;
        self.rng_state.stream += 1;
        self.time_ticks = 0;
        self.phase = RoundPhase::Running;
        self.spawn_riders();
    }

    fn spawn_riders(&mut self) {
        let mut rng = self.rng_state.to_rng();
        let bounds = self.collider.bounds();

        for _ in 0..self.settings.cycles {
            let origin = spawn_point(&mut rng, &bounds);
            let angle = rng.random_range(0.0..TAU);
            let cycle = LightCycle::spawn(&mut self.trails, origin, angle, self.settings.speed);
            let tracker = self.collider.track(cycle.trail);
            let bot = BotSteering::new(rng.random());
            self.riders.push(Rider {
                cycle,
                tracker,
                bot,
                alive: true,
            });
        }

        log::info!(
            "Round {} started: {} cycle(s), seed {}",
            self.round,
            self.riders.len(),
            self.settings.seed
        );
    }

    /// Number of riders still moving
    pub fn alive(&self) -> usize {
        self.riders.iter().filter(|r| r.alive).count()
    }

    /// Last rider standing, once the round is over
    pub fn winner(&self) -> Option<usize> {
        if self.phase != RoundPhase::Over || self.riders.len() < 2 {
            return None;
        }
        self.riders.iter().position(|r| r.alive)
    }

    /// Tracker states in rider order
    pub fn tracker_states(&self) -> Vec<TrackerState> {
        self.riders.iter().map(|r| r.tracker.state()).collect()
    }

    /// Take the events recorded so far
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}

/// Random spawn point keeping `SPAWN_MARGIN` from the walls
fn spawn_point(rng: &mut Pcg32, bounds: &Bounds) -> Vec3 {
    let pick = |rng: &mut Pcg32, lo: f32, hi: f32| {
        let (lo, hi) = (lo + SPAWN_MARGIN, hi - SPAWN_MARGIN);
        if lo < hi {
            rng.random_range(lo..hi)
        } else {
            (lo + hi) / 2.0
        }
    };
    let x = pick(rng, bounds.x1, bounds.x2);
    let z = pick(rng, bounds.y1, bounds.y2);
    Vec3::new(x, 0.0, z)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::grid::GridCollider;
    use crate::sim::linear::LinearCollider;

    #[test]
    fn test_spawn_inside_margin() {
        let state: RoundState<GridCollider> = RoundState::new(Settings {
            cycles: 8,
            ..Default::default()
        });
        assert_eq!(state.riders.len(), 8);
        assert_eq!(state.trails.count(), 8);

        let bounds = state.collider.bounds();
        for rider in &state.riders {
            let p = rider.cycle.position;
            assert!(p.x >= bounds.x1 + SPAWN_MARGIN && p.x <= bounds.x2 - SPAWN_MARGIN);
            assert!(p.z >= bounds.y1 + SPAWN_MARGIN && p.z <= bounds.y2 - SPAWN_MARGIN);
            assert_eq!(state.trails.len(rider.cycle.trail), 1);
        }
    }

    #[test]
    fn test_same_seed_same_spawns() {
        let a: RoundState<GridCollider> = RoundState::new(Settings::default());
        let b: RoundState<LinearCollider> = RoundState::new(Settings::default());
        for (ra, rb) in a.riders.iter().zip(&b.riders) {
            assert_eq!(ra.cycle.position, rb.cycle.position);
            assert_eq!(ra.cycle.angle, rb.cycle.angle);
        }
    }

    #[test]
    fn test_reset_respawns_with_next_stream() {
        let mut state: RoundState<GridCollider> = RoundState::new(Settings::default());
        let first = state.riders[0].cycle.position;

        state.reset();
        assert_eq!(state.round, 1);
        assert_eq!(state.phase, RoundPhase::Running);
        assert_eq!(state.trails.count(), 2);
        assert_eq!(state.collider.fragment_count(), 0);
        assert_ne!(state.riders[0].cycle.position, first);
    }

    #[test]
    fn test_tiny_arena_spawns_at_center() {
        let settings = Settings {
            arena: crate::sim::collision::ArenaRect::new(glam::IVec2::ZERO, glam::IVec2::new(2, 2))
                .unwrap(),
            cycles: 1,
            ..Default::default()
        };
        let state: RoundState<GridCollider> = RoundState::new(settings);
        assert_eq!(state.riders[0].cycle.position, Vec3::new(1.0, 0.0, 1.0));
    }
}
