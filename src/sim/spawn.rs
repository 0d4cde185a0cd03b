//! Enemy spawning
//!
//! Rows are laid out on a fixed column grid. Layout strategies occasionally
//! leave gaps or weak spots so that every round has an opening.

use glam::Vec2;
use rand::Rng;
use rand::seq::SliceRandom;

use super::behavior::is_area_occupied;
use super::events::{CombatEvent, VisualEffect};
use super::flags::{AffixSet, ROLLABLE_AFFIXES};
use super::scheduler::WavefrontPhase;
use super::state::{CombatWorld, Enemy, EnemyKind};

/// Row layout strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowLayout {
    Random,
    /// One column left empty
    Gap,
    /// One column holds a 1 HP enemy with no affixes
    WeakSpot,
    /// Every other column left empty
    Checkerboard,
}

const SPECIAL_LAYOUTS: [RowLayout; 3] = [RowLayout::Gap, RowLayout::WeakSpot, RowLayout::Checkerboard];

/// Roll 0-2 distinct affixes; none before the affix round threshold
pub fn generate_affixes(world: &mut CombatWorld) -> AffixSet {
    let balance = &world.settings.balance;
    if world.round <= balance.affix_min_round {
        return AffixSet::empty();
    }
    let chance = balance.affix_base_chance + world.round as f32 * balance.affix_round_growth;

    let rng = &mut world.rng;
    let count = if rng.random::<f32>() < chance * 0.5 {
        2
    } else if rng.random::<f32>() < chance {
        1
    } else {
        0
    };

    let mut affixes = AffixSet::empty();
    for _ in 0..count {
        let pick = ROLLABLE_AFFIXES[rng.random_range(0..ROLLABLE_AFFIXES.len())];
        affixes.insert(pick);
    }
    affixes
}

fn choose_layout(world: &mut CombatWorld) -> RowLayout {
    let help_chance = if world.round < 8 { 0.7 } else { 0.3 };
    if world.rng.random::<f32>() < help_chance {
        SPECIAL_LAYOUTS[world.rng.random_range(0..SPECIAL_LAYOUTS.len())]
    } else {
        RowLayout::Random
    }
}

/// Spawn one row centered at `y`; returns the number of enemies placed
pub fn spawn_enemy_row_at(world: &mut CombatWorld, y: f32) -> usize {
    let layout = choose_layout(world);
    spawn_enemy_row_with_layout(world, y, layout)
}

pub fn spawn_enemy_row_with_layout(world: &mut CombatWorld, y: f32, layout: RowLayout) -> usize {
    let arena = world.settings.arena.clone();
    let balance = world.settings.balance.clone();
    let cols = arena.enemy_cols as usize;
    let size = world.enemy_size();

    let base_hp = (balance.enemy_base_hp
        + world.round as f32 * balance.enemy_hp_per_round * world.next_round_hp_multiplier)
        .floor();

    let mut occupied = vec![false; cols];
    let mut weak_spot = None;
    match layout {
        RowLayout::Random => {}
        RowLayout::Gap => {
            let gap = world.rng.random_range(0..cols);
            occupied[gap] = true;
        }
        RowLayout::WeakSpot => {
            weak_spot = Some(world.rng.random_range(0..cols));
        }
        RowLayout::Checkerboard => {
            let parity = usize::from(world.rng.random_bool(0.5));
            for (c, slot) in occupied.iter_mut().enumerate() {
                if c % 2 == parity {
                    *slot = true;
                }
            }
        }
    }

    let min_enemies = cols.min(arena.spawn_min as usize + world.round as usize / 4);
    // Blocked columns count toward the minimum so gapped rows stay sparse
    let mut count = occupied.iter().filter(|o| **o).count();
    let mut free: Vec<usize> = (0..cols).filter(|c| !occupied[*c]).collect();
    free.shuffle(&mut world.rng);

    let mut placed = 0;
    for c in free {
        let is_weak = weak_spot == Some(c);
        let should_spawn =
            is_weak || count < min_enemies || world.rng.random::<f32>() < balance.spawn_prob;
        let center = Vec2::new(c as f32 * size.x + size.x * 0.5, y);
        if !should_spawn || is_area_occupied(world, center, size * 0.8, None) {
            continue;
        }

        let jitter = 0.8 + world.rng.random::<f32>() * 0.4;
        let id = world.next_entity_id();
        let mut enemy = Enemy::new(id, center, size, (base_hp * jitter).floor());
        if is_weak {
            enemy.hp = 1.0;
            enemy.max_hp = 1.0;
        } else {
            enemy.affixes = generate_affixes(world);
            if !enemy.affixes.is_empty() {
                enemy.kind = EnemyKind::Elite;
                if world.round > balance.boss_min_round
                    && world.rng.random::<f32>() < balance.boss_chance
                {
                    enemy.kind = EnemyKind::Boss;
                    enemy.max_hp = (enemy.max_hp * balance.boss_hp_mult).floor();
                    enemy.hp = enemy.max_hp;
                    log::info!("Boss {id} spawned with {} HP", enemy.hp);
                }
            }
        }
        world.emit(CombatEvent::EnemySpawned { id, pos: center });
        world.enemies.push(enemy);
        count += 1;
        placed += 1;
    }

    log::debug!("Spawned row at y={y} ({layout:?}): {placed} enemies");
    placed
}

/// Spawn `count` rows stacked upward from the first enemy row
pub fn spawn_enemy_rows(world: &mut CombatWorld, count: u32) -> usize {
    let start_y = world.settings.arena.enemy_start_y;
    let h = world.settings.arena.enemy_height();
    (0..count)
        .map(|i| spawn_enemy_row_at(world, start_y - i as f32 * h))
        .sum()
}

/// Fill the starting rows downward from the first enemy row
pub fn populate_initial_rows(world: &mut CombatWorld) {
    let start_y = world.settings.arena.enemy_start_y;
    let h = world.settings.arena.enemy_height();
    let rows = world.settings.arena.start_rows;
    let placed: usize = (0..rows)
        .map(|i| spawn_enemy_row_at(world, start_y + i as f32 * h))
        .sum();
    log::info!("Populated {rows} starting rows with {placed} enemies");
}

/// Spawn a weakened, affix-less copy of an enemy in a free top-row cell
///
/// Returns the clone's id, or `None` when the top rows are full.
pub fn trigger_clone_spawn(world: &mut CombatWorld, source_idx: usize) -> Option<u32> {
    let source = world.enemies.get(source_idx)?;
    let source_pos = source.logical_pos;
    let clone_hp = (source.max_hp * world.settings.balance.clone_hp_fraction)
        .floor()
        .max(1.0);

    let arena = &world.settings.arena;
    let size = world.enemy_size();
    let mut cells = Vec::new();
    for r in 0..3 {
        for c in 0..arena.enemy_cols {
            let cell = Vec2::new(
                c as f32 * size.x + size.x * 0.5,
                arena.enemy_start_y + r as f32 * size.y,
            );
            if !is_area_occupied(world, cell, size * 0.9, None) {
                cells.push(cell);
            }
        }
    }
    if cells.is_empty() {
        return None;
    }

    let pos = cells[world.rng.random_range(0..cells.len())];
    let id = world.next_entity_id();
    let mut clone = Enemy::new(id, pos, size, clone_hp);
    // Clones born mid-sweep wait for the next enemy turn
    clone.has_acted = world.wavefront.phase != WavefrontPhase::Idle;

    world.emit(CombatEvent::visual(VisualEffect::CloneSpore, source_pos));
    world.emit(CombatEvent::text(pos, "SPAWN"));
    world.queue_enemy(clone);
    log::debug!("Enemy {} cloned into {id}", world.enemies[source_idx].id);
    Some(id)
}
