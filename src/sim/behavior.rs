//! Per-enemy turn behavior
//!
//! Invoked by the wavefront once an enemy's status tick leaves it able to
//! act. All placement decisions read logical positions.

use glam::Vec2;
use rand::Rng;

use super::events::{CombatEvent, SoundCue, VisualEffect};
use super::flags::Affix;
use super::geometry::Aabb;
use super::spawn::trigger_clone_spawn;
use super::state::{CombatWorld, EnemyKind};
use crate::consts::OCCUPANCY_MARGIN;

/// True if a box at `center` would overlap any active enemy's logical cell
///
/// Enemies buffered for spawning this tick count as present.
pub fn is_area_occupied(world: &CombatWorld, center: Vec2, size: Vec2, exclude: Option<u32>) -> bool {
    let probe = Aabb::from_center_size(center, size);
    world
        .enemies
        .iter()
        .chain(world.pending_enemies.iter())
        .filter(|e| e.active && Some(e.id) != exclude)
        .any(|e| probe.intersects(&e.aabb().expand(-OCCUPANCY_MARGIN)))
}

/// Summary of one enemy's turn
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TurnReport {
    pub actions: u32,
    /// Rows advanced (jumps count every row crossed)
    pub rows_moved: u32,
    pub blocked: bool,
}

fn action_count(world: &mut CombatWorld, idx: usize) -> u32 {
    let enemy = &world.enemies[idx];
    if enemy.frozen_this_turn {
        return 0;
    }
    let affixes = &world.settings.affixes;
    if enemy.has(Affix::Haste) {
        return affixes.haste_actions;
    }
    let t = enemy.temperature;
    if enemy.has(Affix::Berserk) && t > 0.0 && t < 100.0 {
        let chance = t / 100.0 * affixes.berserk_chance_mult;
        if world.rng.random::<f32>() < chance {
            return 2;
        }
    }
    1
}

fn regenerate(world: &mut CombatWorld, idx: usize) {
    let percent = world.settings.affixes.regen_percent;
    let enemy = &mut world.enemies[idx];
    let amount = (enemy.max_hp * percent).floor().max(1.0);
    let healed = enemy.heal(amount);
    if healed > 0.0 {
        let pos = enemy.logical_pos;
        world.emit(CombatEvent::visual(VisualEffect::Heal, pos));
        world.emit(CombatEvent::text(pos, format!("+{amount}")));
    }
}

fn heal_neighbors(world: &mut CombatWorld, idx: usize) {
    let affixes = &world.settings.affixes;
    let healer = &world.enemies[idx];
    let (healer_id, center) = (healer.id, healer.logical_pos);
    let range = healer.size.x * affixes.healer_range;
    let percent = affixes.healer_percent;

    let mut healed = Vec::new();
    for other in world.enemies.iter_mut() {
        if other.id == healer_id || !other.active || other.hp >= other.max_hp {
            continue;
        }
        if center.distance(other.logical_pos) < range {
            let amount = (other.max_hp * percent).ceil();
            other.heal(amount);
            healed.push((other.logical_pos, amount));
        }
    }
    if !healed.is_empty() {
        world.emit(CombatEvent::visual(VisualEffect::Shockwave, center));
        for (pos, amount) in healed {
            world.emit(CombatEvent::text(pos, format!("+{amount}")));
        }
    }
}

fn devour(world: &mut CombatWorld, idx: usize) {
    let affixes = &world.settings.affixes;
    let chance = affixes.devour_chance;
    let predator = &world.enemies[idx];
    let (predator_id, center) = (predator.id, predator.logical_pos);
    let range = predator.size.x * affixes.devour_range;
    if world.rng.random::<f32>() >= chance {
        return;
    }

    let neighbors: Vec<usize> = world
        .enemies
        .iter()
        .enumerate()
        .filter(|(_, e)| {
            e.id != predator_id
                && e.active
                && e.kind != EnemyKind::Boss
                && center.distance(e.logical_pos) < range
        })
        .map(|(i, _)| i)
        .collect();
    if neighbors.is_empty() {
        return;
    }

    let victim_idx = neighbors[world.rng.random_range(0..neighbors.len())];
    let victim = &mut world.enemies[victim_idx];
    let (hp, max_hp, absorbed, victim_id, victim_pos) = (
        victim.hp,
        victim.max_hp,
        victim.affixes,
        victim.id,
        victim.logical_pos,
    );
    victim.hp = 0.0;
    victim.active = false;

    let predator = &mut world.enemies[idx];
    predator.max_hp += max_hp;
    predator.hp += hp;
    predator.affixes = predator.affixes.union(absorbed);

    world.emit(CombatEvent::visual(VisualEffect::Devour, victim_pos));
    world.emit(CombatEvent::text(center, "DEVOUR!"));
    log::debug!("Enemy {predator_id} devoured {victim_id}");
}

/// Try to advance one row, or leap over a blocked cell with the jump affix
fn advance(world: &mut CombatWorld, idx: usize, report: &mut TurnReport) {
    let enemy = &world.enemies[idx];
    let (id, pos, size) = (enemy.id, enemy.logical_pos, enemy.size);
    let can_jump = enemy.has(Affix::Jump);
    let step = size.y;
    let probe = size * 0.8;

    let target = pos + Vec2::new(0.0, step);
    if !is_area_occupied(world, target, probe, Some(id)) {
        world.enemies[idx].logical_pos = target;
        report.rows_moved += 1;
        return;
    }

    if can_jump {
        let rows = world.settings.affixes.jump_rows;
        let leap = pos + Vec2::new(0.0, step * rows as f32);
        if !is_area_occupied(world, leap, probe, Some(id)) {
            world.enemies[idx].logical_pos = leap;
            report.rows_moved += rows;
            return;
        }
    }
    report.blocked = true;
}

/// Run an enemy's actions for this turn: affix effects, then movement
pub fn perform_turn_action(world: &mut CombatWorld, idx: usize) -> TurnReport {
    let mut report = TurnReport::default();
    if !world.enemies.get(idx).is_some_and(|e| e.active) {
        return report;
    }

    let count = action_count(world, idx);
    if count == 0 {
        let pos = world.enemies[idx].logical_pos;
        world.emit(CombatEvent::visual(VisualEffect::Frost, pos));
        world.emit(CombatEvent::Sound(SoundCue::Freeze));
        return report;
    }

    for action in 0..count {
        if !world.enemies[idx].active {
            break;
        }
        let enemy = &world.enemies[idx];
        let affixes = enemy.affixes;
        let pos = enemy.logical_pos;

        if affixes.contains(Affix::Regen) {
            regenerate(world, idx);
        }
        if affixes.contains(Affix::Healer) {
            heal_neighbors(world, idx);
        }
        if affixes.contains(Affix::Devour) {
            devour(world, idx);
        }
        if affixes.contains(Affix::Clone)
            && world.rng.random::<f32>() < world.settings.affixes.clone_chance_turn
        {
            trigger_clone_spawn(world, idx);
        }
        if action == 1 {
            world.emit(CombatEvent::text(pos, "DOUBLE!"));
        }

        advance(world, idx, &mut report);
        report.actions += 1;
    }
    report
}
