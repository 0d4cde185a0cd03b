//! Marble Siege headless runner
//!
//! Plays a seeded session against the combat core and logs the result.
//! Usage: `marble-siege [seed] [settings.json]`

use glam::Vec2;

use marble_siege::CombatSettings;
use marble_siege::sim::{
    CombatEvent, CombatPhase, CombatWorld, MunitionProfile, RecipeLevels, begin_player_turn,
    fire_next_shot, tick,
};

const MAX_ROUNDS: u32 = 30;
const MAX_TICKS_PER_ROUND: u32 = 20_000;
const SHOT_SPEED: f32 = 12.0;
const SHOT_INTERVAL: u32 = 30;

fn load_settings(path: Option<&str>) -> CombatSettings {
    let Some(path) = path else {
        return CombatSettings::default();
    };
    match std::fs::read_to_string(path) {
        Ok(json) => CombatSettings::load_or_default(&json),
        Err(e) => {
            log::warn!("Could not read settings from {path}: {e}; using defaults");
            CombatSettings::default()
        }
    }
}

/// Loadout for a round: cycles through a few recipes as the game goes on
fn loadout(round: u32) -> Vec<MunitionProfile> {
    let recipes = [
        RecipeLevels {
            damage: 3.0,
            bounce: 2,
            ..Default::default()
        },
        RecipeLevels {
            damage: 2.0,
            scatter: 2,
            cryo: 1,
            ..Default::default()
        },
        RecipeLevels {
            damage: 4.0,
            pyro: 2,
            explosive: true,
            ..Default::default()
        },
        RecipeLevels {
            damage: 3.0,
            pierce: 1,
            lightning: 2,
            beam: round % 3 == 0,
            ..Default::default()
        },
    ];
    recipes.iter().map(MunitionProfile::from_levels).collect()
}

/// Aim at the lowest active enemy
fn aim(world: &CombatWorld) -> Vec2 {
    let launcher = world.launcher_pos();
    let target = world
        .enemies
        .iter()
        .filter(|e| e.active)
        .max_by(|a, b| a.logical_pos.y.total_cmp(&b.logical_pos.y))
        .map(|e| e.logical_pos)
        .unwrap_or(Vec2::new(launcher.x, 0.0));
    let dir = (target - launcher).normalize_or(Vec2::NEG_Y);
    dir * SHOT_SPEED
}

fn play_round(world: &mut CombatWorld) {
    if !begin_player_turn(world, loadout(world.round)) {
        return;
    }
    for t in 0..MAX_TICKS_PER_ROUND {
        if world.phase == CombatPhase::PlayerTurn && t % SHOT_INTERVAL == 0 {
            let vel = aim(world);
            fire_next_shot(world, vel);
        }
        let outcome = tick(world, 1.0);
        for event in world.drain_events() {
            match event {
                CombatEvent::PerfectClear { bonus_multiplier } => {
                    log::info!("Perfect clear (x{bonus_multiplier})");
                }
                CombatEvent::BossDefeated { id } => log::info!("Boss {id} defeated"),
                _ => {}
            }
        }
        if let Some(outcome) = outcome {
            log::info!(
                "Round {} finalized: {} new enemies, score {}",
                outcome.round,
                outcome.spawned,
                world.score
            );
            return;
        }
    }
    log::warn!("Round {} did not settle within {MAX_TICKS_PER_ROUND} ticks", world.round);
}

fn main() {
    #[cfg(not(target_arch = "wasm32"))]
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let seed = args
        .next()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(42);
    let settings = load_settings(args.next().as_deref());

    log::info!("Marble Siege starting with seed {seed}");
    let mut world = CombatWorld::with_starting_rows(settings, seed);

    while world.phase != CombatPhase::GameOver && world.round <= MAX_ROUNDS {
        let round = world.round;
        play_round(&mut world);
        if world.round == round && world.phase != CombatPhase::GameOver {
            break;
        }
    }

    let snapshot = world.snapshot();
    log::info!(
        "Finished at round {} with score {} ({} enemies on board, {:?})",
        snapshot.round,
        snapshot.score,
        snapshot.enemies.len(),
        snapshot.phase
    );
    println!("round={} score={}", snapshot.round, snapshot.score);
}
