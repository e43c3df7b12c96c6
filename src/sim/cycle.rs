//! Light cycles and bot steering
//!
//! A cycle moves a fixed step per tick. Steering is buffered: once the
//! buffered angle strays more than `TURN_THRESHOLD` from the committed
//! heading the cycle turns and appends a trail point; otherwise it keeps
//! amending the last point of its straight run.

use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::collision::Bounds;
use super::trail::{TrailId, Trails};
use crate::consts::*;
use crate::{ground, heading};

/// A light cycle dragging its trail across the arena
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LightCycle {
    pub trail: TrailId,
    pub position: Vec3,
    /// Unnormalized heading for `angle`
    pub direction: Vec3,
    /// Committed heading (radians)
    pub angle: f32,
    /// Committed heading plus steering not yet acted on
    pub angle_buffer: f32,
    /// Arena units per second
    pub speed: f32,
}

impl LightCycle {
    /// Spawn a cycle at `origin`, seeding a new trail with that point
    pub fn spawn(trails: &mut Trails, origin: Vec3, angle: f32, speed: f32) -> Self {
        let trail = trails.spawn();
        trails.push(trail, origin);
        Self {
            trail,
            position: origin,
            direction: heading(angle),
            angle,
            angle_buffer: angle,
            speed,
        }
    }

    /// Buffered steering is past the turn threshold
    #[inline]
    pub fn is_turning(&self) -> bool {
        (self.angle_buffer - self.angle).abs() > TURN_THRESHOLD
    }

    /// Move one step, steering by `rotate` radians
    ///
    /// Returns true when a point was appended to the trail (a turn, or the
    /// first step) and false when the last point was moved in place.
    pub fn advance(&mut self, trails: &mut Trails, dt: f32, rotate: f32) -> bool {
        self.angle_buffer += rotate;

        let turning = self.is_turning();
        if turning {
            self.angle = self.angle_buffer;
            self.direction = heading(self.angle);
        }

        let step = self.speed * dt;
        let unit = Vec3::new(self.direction.x, 0.0, self.direction.z).normalize_or_zero();
        self.position += unit * step;

        let append = turning || trails.len(self.trail) <= 1;
        if append {
            trails.push(self.trail, self.position);
        } else {
            trails.extend(self.trail, self.position);
        }
        append
    }
}

/// Seeded wandering steering for demo rounds
#[derive(Debug, Clone)]
pub struct BotSteering {
    rng: Pcg32,
    rotate: f32,
    hold: u32,
}

impl BotSteering {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
            rotate: 0.0,
            hold: 0,
        }
    }

    /// Steering for the next tick of `cycle`
    pub fn steer(&mut self, cycle: &LightCycle, bounds: &Bounds, turn_rate: f32) -> f32 {
        let ahead = cycle.position + cycle.direction.normalize_or_zero() * BOT_LOOKAHEAD;
        if !bounds.contains(ground(ahead)) {
            // Wall ahead: keep turning one way until clear
            if self.rotate == 0.0 {
                self.rotate = if self.rng.random_bool(0.5) {
                    turn_rate
                } else {
                    -turn_rate
                };
            }
            self.hold = BOT_MIN_HOLD;
            return self.rotate;
        }

        if self.hold == 0 {
            self.hold = self.rng.random_range(BOT_MIN_HOLD..BOT_MAX_HOLD);
            self.rotate = match self.rng.random_range(0..4) {
                0 => -turn_rate,
                1 => turn_rate,
                _ => 0.0,
            };
        }
        self.hold -= 1;
        self.rotate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::collision::ArenaRect;

    #[test]
    fn test_spawn_seeds_trail() {
        let mut trails = Trails::new();
        let cycle = LightCycle::spawn(&mut trails, Vec3::new(1.0, 0.0, 2.0), 0.0, CYCLE_SPEED);
        assert_eq!(trails.points(cycle.trail), &[Vec3::new(1.0, 0.0, 2.0)]);
        assert!(!cycle.is_turning());
    }

    #[test]
    fn test_straight_run_extends() {
        let mut trails = Trails::new();
        let mut cycle = LightCycle::spawn(&mut trails, Vec3::ZERO, 0.0, 3.0);

        assert!(cycle.advance(&mut trails, 1.0, 0.0));
        assert_eq!(trails.len(cycle.trail), 2);
        let step = 3.0 / 2.0_f32.sqrt();
        assert!((cycle.position - Vec3::new(step, 0.0, step)).length() < 1e-5);

        assert!(!cycle.advance(&mut trails, 1.0, 0.0));
        assert!(!cycle.advance(&mut trails, 1.0, 0.0));
        assert_eq!(trails.len(cycle.trail), 2);
        assert_eq!(trails.points(cycle.trail)[1], cycle.position);
        assert!((cycle.position.length() - 9.0).abs() < 1e-4);
    }

    #[test]
    fn test_turn_after_threshold() {
        let mut trails = Trails::new();
        let mut cycle = LightCycle::spawn(&mut trails, Vec3::ZERO, 0.0, 3.0);
        cycle.advance(&mut trails, SIM_DT, 0.0);

        // Buffered but below the threshold
        assert!(!cycle.advance(&mut trails, SIM_DT, 0.3));
        assert_eq!(cycle.angle, 0.0);
        assert_eq!(trails.len(cycle.trail), 2);

        assert!(cycle.advance(&mut trails, SIM_DT, 0.3));
        assert!((cycle.angle - 0.6).abs() < 1e-6);
        assert_eq!(trails.len(cycle.trail), 3);
        assert_eq!(cycle.direction, heading(cycle.angle));
    }

    #[test]
    fn test_bot_steering_is_seeded() {
        let bounds = Bounds::from(ArenaRect::default());
        let mut trails = Trails::new();
        let cycle = LightCycle::spawn(&mut trails, Vec3::ZERO, 0.0, CYCLE_SPEED);

        let mut a = BotSteering::new(7);
        let mut b = BotSteering::new(7);
        for _ in 0..200 {
            assert_eq!(
                a.steer(&cycle, &bounds, TURN_SPEED),
                b.steer(&cycle, &bounds, TURN_SPEED)
            );
        }
    }

    #[test]
    fn test_bot_turns_away_from_wall() {
        let bounds = Bounds::from(ArenaRect::default());
        let mut trails = Trails::new();
        let cycle = LightCycle::spawn(&mut trails, Vec3::new(9.0, 0.0, 9.0), 0.0, CYCLE_SPEED);

        let mut bot = BotSteering::new(1);
        let rotate = bot.steer(&cycle, &bounds, TURN_SPEED);
        assert_eq!(rotate.abs(), TURN_SPEED);
        assert_eq!(bot.steer(&cycle, &bounds, TURN_SPEED), rotate);
    }
}
