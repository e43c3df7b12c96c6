//! Fixed timestep simulation tick
//!
//! Advances every live cycle one step and checks its newest segment right
//! away, so the collider always sees one new or amended point per update.

use super::collision::{Collider, CollisionError, Tracker};
use super::state::{GameEvent, RoundPhase, RoundState};

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Steering per rider (radians this tick); riders without an entry go
    /// straight unless `idle_mode` is set
    pub steer: Vec<f32>,
    /// Idle/demo mode: bots steer every rider without an entry
    pub idle_mode: bool,
}

impl TickInput {
    /// Bots drive everyone
    pub fn idle() -> Self {
        Self {
            steer: Vec::new(),
            idle_mode: true,
        }
    }
}

/// Advance the round by one fixed timestep
pub fn tick<C: Collider>(state: &mut RoundState<C>, input: &TickInput, dt: f32) {
    if state.phase == RoundPhase::Over {
        return;
    }
    state.time_ticks += 1;

    let bounds = state.collider.bounds();
    let turn_rate = state.settings.turn_rate;

    for (idx, rider) in state.riders.iter_mut().enumerate() {
        if !rider.alive {
            continue;
        }

        let rotate = match input.steer.get(idx) {
            Some(&rotate) => rotate,
            None if input.idle_mode => rider.bot.steer(&rider.cycle, &bounds, turn_rate),
            None => 0.0,
        };
        rider.cycle.advance(&mut state.trails, dt, rotate);

        match rider.tracker.update(&mut state.collider, &state.trails) {
            Ok(()) | Err(CollisionError::InsufficientSegment) => {}
            Err(error) => {
                rider.alive = false;
                log::info!("Rider {idx} crashed at tick {}: {error}", state.time_ticks);
                state.events.push(GameEvent::Crashed {
                    rider: idx,
                    tick: state.time_ticks,
                    error,
                });
            }
        }
    }

    let alive = state.alive();
    let over = if state.riders.len() > 1 {
        alive <= 1
    } else {
        alive == 0
    };
    if over {
        state.phase = RoundPhase::Over;
        let winner = state.winner();
        log::info!(
            "Round {} over after {} ticks, winner: {winner:?}",
            state.round,
            state.time_ticks
        );
        state.events.push(GameEvent::RoundOver { winner });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::*;
    use crate::settings::Settings;
    use crate::sim::grid::GridCollider;
    use crate::sim::linear::LinearCollider;

    fn solo() -> Settings {
        Settings {
            cycles: 1,
            ..Default::default()
        }
    }

    #[test]
    fn test_straight_cycle_hits_wall() {
        let mut state: RoundState<GridCollider> = RoundState::new(solo());
        let input = TickInput::default();

        // 20 units of arena at 3 units/s: gone within 10 seconds
        for _ in 0..600 {
            tick(&mut state, &input, SIM_DT);
            if state.phase == RoundPhase::Over {
                break;
            }
        }

        assert_eq!(state.phase, RoundPhase::Over);
        let events = state.drain_events();
        assert_eq!(
            events[0],
            GameEvent::Crashed {
                rider: 0,
                tick: state.time_ticks,
                error: CollisionError::Boundary
            }
        );
        assert_eq!(events[1], GameEvent::RoundOver { winner: None });
        // Straight run: the trail never grew past two points
        assert_eq!(state.trails.len(state.riders[0].cycle.trail), 2);
    }

    #[test]
    fn test_over_round_does_not_tick() {
        let mut state: RoundState<GridCollider> = RoundState::new(solo());
        state.phase = RoundPhase::Over;
        tick(&mut state, &TickInput::default(), SIM_DT);
        assert_eq!(state.time_ticks, 0);
        assert_eq!(state.trails.len(state.riders[0].cycle.trail), 1);
    }

    #[test]
    fn test_explicit_steering_turns() {
        let mut state: RoundState<LinearCollider> = RoundState::new(solo());
        let trail = state.riders[0].cycle.trail;

        tick(&mut state, &TickInput::default(), SIM_DT);
        let input = TickInput {
            steer: vec![0.3],
            ..Default::default()
        };
        tick(&mut state, &input, SIM_DT);
        tick(&mut state, &input, SIM_DT);
        assert_eq!(state.trails.len(trail), 3);
        assert_eq!(state.phase, RoundPhase::Running);
    }

    #[test]
    fn test_determinism() {
        let settings = Settings {
            cycles: 4,
            ..Default::default()
        };
        let mut state1: RoundState<GridCollider> = RoundState::new(settings.clone());
        let mut state2: RoundState<GridCollider> = RoundState::new(settings);

        let input = TickInput::idle();
        for _ in 0..1200 {
            tick(&mut state1, &input, SIM_DT);
            tick(&mut state2, &input, SIM_DT);
        }

        assert_eq!(state1.time_ticks, state2.time_ticks);
        assert_eq!(state1.events, state2.events);
        for id in state1.trails.ids() {
            assert_eq!(state1.trails.points(id), state2.trails.points(id));
        }
    }

    #[test]
    fn test_grid_and_linear_rounds_agree() {
        let settings = Settings {
            cycles: 6,
            seed: 4242,
            ..Default::default()
        };
        let mut grid: RoundState<GridCollider> = RoundState::new(settings.clone());
        let mut linear: RoundState<LinearCollider> = RoundState::new(settings);

        let input = TickInput::idle();
        for _ in 0..3600 {
            tick(&mut grid, &input, SIM_DT);
            tick(&mut linear, &input, SIM_DT);
            assert_eq!(grid.alive(), linear.alive(), "tick {}", grid.time_ticks);
        }
        assert_eq!(grid.phase, linear.phase);
        assert_eq!(grid.winner(), linear.winner());
    }
}
