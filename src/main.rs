//! Linerage headless entry point
//!
//! Plays seeded bot rounds with the configured collider and, when
//! `cross_check` is set, replays every step on the other collider and
//! reports any disagreement.
//!
//! Usage: `linerage [settings.json]`

use std::process::ExitCode;

use linerage::consts::SIM_DT;
use linerage::sim::{
    Collider, GameEvent, GridCollider, LinearCollider, RoundPhase, RoundState, TickInput, tick,
};
use linerage::{ColliderKind, Settings, SettingsError};

fn main() -> ExitCode {
    #[cfg(not(target_arch = "wasm32"))]
    env_logger::init();
    log::info!("Linerage (headless) starting...");

    let settings = match load_settings() {
        Ok(settings) => settings,
        Err(err) => {
            log::error!("{err}");
            return ExitCode::FAILURE;
        }
    };

    let disagreements = match settings.collider {
        ColliderKind::Grid => play::<GridCollider, LinearCollider>(&settings),
        ColliderKind::Linear => play::<LinearCollider, GridCollider>(&settings),
    };

    if disagreements > 0 {
        log::error!("{disagreements} tick(s) where the colliders disagreed");
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn load_settings() -> Result<Settings, SettingsError> {
    match std::env::args().nth(1) {
        Some(path) => Settings::load(path),
        None => {
            log::info!("Using default settings");
            Ok(Settings::default())
        }
    }
}

/// Play one round on `P`, shadowed by `O` when cross-checking
///
/// Returns the number of ticks on which the two disagreed about who crashed.
fn play<P: Collider, O: Collider>(settings: &Settings) -> usize {
    let mut primary: RoundState<P> = RoundState::new(settings.clone());
    let mut oracle: Option<RoundState<O>> = settings
        .cross_check
        .then(|| RoundState::new(settings.clone()));

    let input = TickInput::idle();
    let mut disagreements = 0;

    for _ in 0..settings.ticks {
        tick(&mut primary, &input, SIM_DT);
        let events = primary.drain_events();

        if let Some(oracle) = oracle.as_mut() {
            tick(oracle, &input, SIM_DT);
            let expected = oracle.drain_events();
            if crashed(&events) != crashed(&expected) {
                disagreements += 1;
                log::warn!(
                    "Tick {}: {} collider reported {:?}, cross-check reported {:?}",
                    primary.time_ticks,
                    settings.collider.as_str(),
                    events,
                    expected
                );
            }
        }

        for event in &events {
            if let GameEvent::Crashed { rider, error, .. } = event {
                println!("tick {:>5}: rider {rider} out ({error})", primary.time_ticks);
            }
        }

        if primary.phase == RoundPhase::Over {
            break;
        }
    }

    match primary.winner() {
        Some(winner) => println!("winner: rider {winner}"),
        None if primary.phase == RoundPhase::Over => println!("no winner"),
        None => println!("round still running after {} ticks", primary.time_ticks),
    }
    log::debug!("final collider state:\n{}", primary.collider);

    disagreements
}

/// Riders that crashed, in report order
fn crashed(events: &[GameEvent]) -> Vec<usize> {
    events
        .iter()
        .filter_map(|event| match event {
            GameEvent::Crashed { rider, .. } => Some(*rider),
            GameEvent::RoundOver { .. } => None,
        })
        .collect()
}
