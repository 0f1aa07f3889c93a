//! Meteor Division - headless demo runner
//!
//! Plays the game with the autopilot at a fixed timestep and prints the final
//! frame as JSON. Usage: `meteor-division [settings.json] [seed]`

use std::path::Path;

use meteor_division::consts::*;
use meteor_division::sim::{GameEvent, GamePhase, GameState, TickInput, tick};
use meteor_division::{ConfigError, Settings};

/// Ten simulated minutes
const MAX_TICKS: u64 = 60 * 60 * 10;

const DEFAULT_SEED: u64 = 0x00d1_71de;

fn main() -> Result<(), ConfigError> {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let settings = match args.first().map(String::as_str) {
        Some(path) if path != "-" => Settings::load(Path::new(path))?,
        _ => Settings::default(),
    };
    let seed = match args.get(1) {
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            log::warn!("Invalid seed {:?}, using default", raw);
            DEFAULT_SEED
        }),
        None => DEFAULT_SEED,
    };

    let mut state = GameState::new(settings, seed)?;
    log::info!("Meteor Division starting with seed: {}", seed);

    let input = TickInput {
        idle_mode: true,
        ..Default::default()
    };

    let mut last_phase = state.phase;
    let mut ticks = 0;
    while ticks < MAX_TICKS && !state.quit_requested {
        tick(&mut state, &input, SIM_DT);
        ticks += 1;

        for event in &state.events {
            match event {
                GameEvent::TierStarted { tier_index } => {
                    log::info!("Tier {} ({}) started", tier_index, state.tier().name)
                }
                GameEvent::QuestionSpawned { problem } => log::debug!("Question: {}", problem),
                GameEvent::QuestionAbandoned { problem } => {
                    log::info!("Missed {} = {}", problem, problem.quotient)
                }
                _ => {}
            }
        }

        if state.phase != last_phase {
            log::info!("Phase {:?} -> {:?} at tick {}", last_phase, state.phase, ticks);
            last_phase = state.phase;
        }
        if state.phase == GamePhase::GameClear {
            break;
        }
    }

    log::info!(
        "Finished after {} ticks: score {}, phase {:?}",
        ticks,
        state.session.score,
        state.phase
    );
    println!("{}", serde_json::to_string_pretty(&state.snapshot())?);
    Ok(())
}
