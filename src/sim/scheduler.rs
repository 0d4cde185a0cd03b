//! Turn scheduler (wavefront)
//!
//! Once the player's munitions are spent, a scan line sweeps from below the
//! arena toward the top. Each enemy resolves its turn exactly once, when the
//! line reaches its lower edge. The line slows near unresolved enemies and
//! dwells briefly after each resolution.

use std::collections::BTreeSet;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::behavior::{TurnReport, perform_turn_action};
use super::events::{CombatEvent, SoundCue, VisualEffect};
use super::flags::Affix;
use super::spawn::spawn_enemy_rows;
use super::state::{CombatPhase, CombatWorld};
use super::thermal::resolve_status_turn;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum WavefrontPhase {
    /// Player's turn; scheduler dormant
    #[default]
    Idle,
    /// Scan line sweeping upward
    Scanning,
    /// Line has left the arena; waiting for enemies to finish animating
    Settling,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Wavefront {
    pub phase: WavefrontPhase,
    /// Scan-line y (decreases toward the top of the arena)
    pub scan_y: f32,
    /// Ticks of forced confirmation speed remaining
    pub momentum: f32,
    /// Ticks without any enemy animating
    pub settle_timer: f32,
}

impl Wavefront {
    #[inline]
    pub fn is_active(&self) -> bool {
        self.phase != WavefrontPhase::Idle
    }
}

/// Result of finalizing a round
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundOutcome {
    /// Round number after finalization
    pub round: u32,
    pub defeated: bool,
    pub spawned: usize,
}

/// Enter the enemy turn: clear per-turn flags and place the line below the arena
pub fn start_enemy_turn(world: &mut CombatWorld) {
    for e in &mut world.enemies {
        e.has_acted = false;
        e.frozen_this_turn = false;
    }
    let start = world.settings.arena.height + world.settings.scan.start_offset;
    world.wavefront = Wavefront {
        phase: WavefrontPhase::Scanning,
        scan_y: start,
        momentum: 0.0,
        settle_timer: 0.0,
    };
    world.phase = CombatPhase::EnemyTurn;
    log::info!(
        "Enemy turn {} started ({} enemies)",
        world.round,
        world.active_enemy_count()
    );
}

/// Distance from the line to the nearest unresolved enemy ahead of it
fn nearest_unresolved_distance(world: &CombatWorld) -> Option<f32> {
    let scan = &world.settings.scan;
    let line = world.wavefront.scan_y;
    world
        .enemies
        .iter()
        .filter(|e| e.active && !e.has_acted)
        .filter_map(|e| {
            let bottom = e.bottom();
            if bottom > line + scan.lookahead {
                return None;
            }
            let dist = line - bottom;
            (dist >= -scan.behind_tolerance).then_some(dist)
        })
        .min_by(f32::total_cmp)
}

/// Scan-line speed for this tick
pub fn scan_speed(world: &CombatWorld, ts: f32) -> f32 {
    let scan = &world.settings.scan;
    let max = scan.max_speed * ts;
    let confirm = scan.confirm_speed * ts;
    let line = world.wavefront.scan_y;

    if world.wavefront.momentum > 0.0 {
        return confirm;
    }
    if line < -scan.exit_margin {
        return max;
    }
    if world.active_enemy_count() == 0 {
        return scan.clear_speed * ts;
    }
    if line > world.settings.arena.height - scan.defense_zone {
        return max;
    }

    match nearest_unresolved_distance(world) {
        None => max,
        Some(d) if d > scan.slow_down_range => max,
        Some(d) if d < scan.stop_range => confirm,
        Some(d) => {
            let t = d / scan.slow_down_range;
            confirm + (max - confirm) * t * t
        }
    }
}

/// Resolve one enemy's turn: status tick, then action unless frozen
///
/// Returns `None` for inactive or already-resolved enemies.
pub fn process_single_enemy_turn(world: &mut CombatWorld, idx: usize) -> Option<TurnReport> {
    let enemy = world.enemies.get(idx)?;
    if !enemy.active || enemy.has_acted {
        return None;
    }
    world.wavefront.momentum = world.settings.scan.momentum_ticks;
    let roll = world.rng.random::<f32>();

    let enemy = &mut world.enemies[idx];
    enemy.has_acted = true;
    let status = resolve_status_turn(enemy, roll);
    let (id, pos, active) = (enemy.id, enemy.logical_pos, enemy.active);

    if status.frozen {
        world.emit(CombatEvent::visual(VisualEffect::Frost, pos));
        world.emit(CombatEvent::Sound(SoundCue::Freeze));
    }
    if status.burn_damage > 0.0 {
        world.emit(CombatEvent::text(pos, format!("-{}", status.burn_damage.floor())));
        world.emit(CombatEvent::Sound(SoundCue::Burn));
        if status.killed {
            world.emit(CombatEvent::EnemyKilled { id, pos, score: 0 });
        }
    }
    log::debug!(
        "Enemy {id} turn: frozen={} burn={}",
        status.frozen,
        status.burn_damage
    );

    if active && !status.frozen {
        Some(perform_turn_action(world, idx))
    } else {
        Some(TurnReport::default())
    }
}

fn has_unresolved(world: &CombatWorld) -> bool {
    world.enemies.iter().any(|e| e.active && !e.has_acted)
}

/// Advance the wavefront by one tick
///
/// Returns the round outcome on the tick the round finalizes.
pub fn advance_wavefront(world: &mut CombatWorld, ts: f32) -> Option<RoundOutcome> {
    match world.wavefront.phase {
        WavefrontPhase::Idle => None,
        WavefrontPhase::Scanning => {
            if world.wavefront.momentum > 0.0 {
                world.wavefront.momentum = (world.wavefront.momentum - ts).max(0.0);
            }
            let speed = scan_speed(world, ts);
            world.wavefront.scan_y -= speed;
            let line = world.wavefront.scan_y;

            // Enemies only grow through the pending buffer here, so indices are stable
            for idx in 0..world.enemies.len() {
                let e = &world.enemies[idx];
                if e.active && !e.has_acted && e.bottom() >= line {
                    process_single_enemy_turn(world, idx);
                }
            }
            world.flush_pending_enemies();

            if line < -world.settings.scan.exit_margin && !has_unresolved(world) {
                world.wavefront.phase = WavefrontPhase::Settling;
                world.wavefront.settle_timer = 0.0;
            }
            None
        }
        WavefrontPhase::Settling => {
            if world.enemies.iter().any(|e| e.active && e.is_animating()) {
                world.wavefront.settle_timer = 0.0;
                return None;
            }
            world.wavefront.settle_timer += ts;
            if world.wavefront.settle_timer > world.settings.scan.settle_ticks {
                world.wavefront.phase = WavefrontPhase::Idle;
                return Some(finalize_round(world));
            }
            None
        }
    }
}

/// Any active enemy's logical center beyond the defeat line
pub fn check_defeat(world: &CombatWorld) -> bool {
    let line = world.settings.arena.defeat_line_y();
    world
        .enemies
        .iter()
        .any(|e| e.active && e.logical_pos.y > line)
}

/// Close out the enemy turn: late-game haste buff, new rows, round counter,
/// defeat check
pub fn finalize_round(world: &mut CombatWorld) -> RoundOutcome {
    let h = world.settings.arena.enemy_height();
    let rows: BTreeSet<i32> = world
        .enemies
        .iter()
        .filter(|e| e.active)
        .map(|e| (e.logical_pos.y / h).round() as i32)
        .collect();
    let active = world.active_enemy_count();

    if rows.len() <= 1 || active <= 5 {
        let mut buffed = Vec::new();
        for e in world.enemies.iter_mut().filter(|e| e.active) {
            if e.affixes.insert(Affix::Haste) {
                buffed.push(e.logical_pos);
            }
        }
        if !buffed.is_empty() {
            log::info!("{} enemies gained haste", buffed.len());
            for pos in buffed {
                world.emit(CombatEvent::visual(VisualEffect::Haste, pos));
            }
        }
    }

    let spawn_count = if rows.len() < 4 { 3 } else { 1 };
    let spawned = spawn_enemy_rows(world, spawn_count);

    if world.next_round_hp_multiplier > 1.0 {
        log::info!(
            "Spawned rows with HP x{}, resetting",
            world.next_round_hp_multiplier
        );
        world.next_round_hp_multiplier = 1.0;
    }

    world.round += 1;
    world.prev_round_damage = world.round_damage;
    world.round_damage = 0.0;

    let defeated = check_defeat(world);
    world.phase = if defeated {
        CombatPhase::GameOver
    } else if world.ammo_queue.is_empty() {
        CombatPhase::Loadout
    } else {
        CombatPhase::PlayerTurn
    };
    world.emit(CombatEvent::RoundFinalized {
        round: world.round,
        defeated,
    });
    if defeated {
        log::info!("Defeat line crossed in round {}", world.round);
    } else {
        log::info!("Round {} begins ({} enemies)", world.round, world.active_enemy_count());
    }

    RoundOutcome {
        round: world.round,
        defeated,
        spawned,
    }
}
