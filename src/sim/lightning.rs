//! Lightning chain propagation
//!
//! From a struck enemy, arc to the nearest unvisited active enemy within the
//! chain radius, roll the conduction chance, and recurse. Every successful
//! arc appends to the shared history, so the pool of candidates strictly
//! shrinks and the recursion terminates.

use rand::Rng;

use super::events::{CombatEvent, SoundCue};
use super::state::CombatWorld;

/// Conduction chance toward `target_temperature` (cold conducts better)
pub fn chain_chance(base: f32, cold_bonus: f32, target_temperature: f32) -> f32 {
    if target_temperature < 0.0 {
        (base + target_temperature.abs() * cold_bonus).min(1.0)
    } else {
        base
    }
}

/// Nearest active enemy within `radius` of the source that is not in `history`
fn nearest_unvisited(world: &CombatWorld, source_idx: usize, history: &[u32]) -> Option<usize> {
    let source = &world.enemies[source_idx];
    let radius = world.settings.balance.lightning_chain_radius;

    let mut best: Option<(usize, f32)> = None;
    for (idx, e) in world.enemies.iter().enumerate() {
        if idx == source_idx || !e.active || history.contains(&e.id) {
            continue;
        }
        let d = source.logical_pos.distance(e.logical_pos);
        if d < radius && best.is_none_or(|(_, bd)| d < bd) {
            best = Some((idx, d));
        }
    }
    best.map(|(idx, _)| idx)
}

/// Try to propagate a chain from `source_idx`; returns true if at least one
/// arc fired
pub fn trigger_lightning_chain(
    world: &mut CombatWorld,
    source_idx: usize,
    damage: f32,
    history: &mut Vec<u32>,
) -> bool {
    let Some(source) = world.enemies.get(source_idx) else {
        return false;
    };
    let source_id = source.id;
    let source_pos = source.logical_pos;
    if !history.contains(&source_id) {
        history.push(source_id);
    }

    let Some(target_idx) = nearest_unvisited(world, source_idx, history) else {
        return false;
    };

    let balance = &world.settings.balance;
    let p = chain_chance(
        balance.lightning_base_chance,
        balance.lightning_cold_bonus,
        world.enemies[target_idx].temperature,
    );
    let temp_increase = balance.lightning_temp_increase;
    if world.rng.random::<f32>() >= p {
        return false;
    }

    let target = &mut world.enemies[target_idx];
    let target_id = target.id;
    let target_pos = target.logical_pos;
    let max_hp = target.max_hp;
    target.apply_temperature(temp_increase);
    let killed = target.take_damage(damage);

    world.record_damage(damage);
    world.emit(CombatEvent::Arc {
        from: source_pos,
        to: target_pos,
    });
    world.emit(CombatEvent::Sound(SoundCue::Zap));
    if killed {
        let score = world.add_score(max_hp);
        world.emit(CombatEvent::EnemyKilled {
            id: target_id,
            pos: target_pos,
            score,
        });
    }
    log::debug!("Lightning arc {source_id} -> {target_id} ({damage} dmg)");

    history.push(target_id);
    trigger_lightning_chain(world, target_idx, damage, history);
    true
}
