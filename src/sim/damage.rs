//! Damage resolution dispatcher
//!
//! Single entry point for every hit: projectile contacts, beam segments and
//! shield reflections all end up in [`apply_damage`].

use glam::Vec2;
use rand::Rng;

use super::events::{CombatEvent, SoundCue, VisualEffect};
use super::flags::Affix;
use super::lightning::trigger_lightning_chain;
use super::munition::MunitionProfile;
use super::spawn::trigger_clone_spawn;
use super::state::{CombatWorld, EnemyKind};
use super::thermal::BURN_THRESHOLD;
use crate::settings::BalanceSettings;

/// Everything the dispatcher needs to know about the source of a hit
#[derive(Debug)]
pub struct HitContext<'a> {
    pub profile: &'a MunitionProfile,
    /// Impact point (explosions are centered here)
    pub position: Vec2,
    /// Scatter copies deal reduced damage
    pub is_copy: bool,
    /// Lightning/beam visit history for the current propagation event
    pub chain_history: &'a mut Vec<u32>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DamageResult {
    pub killed: bool,
    /// Score gained from this hit and everything it triggered
    pub score_delta: u64,
}

/// Apply a hit to the enemy at `idx`
///
/// A no-op on inactive enemies.
pub fn apply_damage(world: &mut CombatWorld, idx: usize, ctx: HitContext<'_>) -> DamageResult {
    if !world.enemies.get(idx).is_some_and(|e| e.active) {
        return DamageResult::default();
    }
    let score_before = world.score;
    let profile = ctx.profile;
    let balance = world.settings.balance.clone();

    // (1) effective damage
    let dmg = if ctx.is_copy {
        profile.damage * balance.copy_damage_mult
    } else {
        profile.damage
    };

    // (2) thermal deltas
    {
        let enemy = &mut world.enemies[idx];
        if profile.cryo > 0 {
            enemy.apply_temperature(-balance.cryo_amount * profile.cryo as f32);
        }
        if profile.pyro > 0 {
            enemy.apply_temperature(balance.pyro_amount * profile.pyro as f32);
        }
    }

    // (3) lightning: the struck enemy only heats up if the chain fired
    if profile.lightning > 0 {
        let chained = trigger_lightning_chain(world, idx, dmg, ctx.chain_history);
        let enemy = &mut world.enemies[idx];
        if chained {
            enemy.apply_temperature(profile.lightning as f32);
        }
        if !ctx.chain_history.contains(&enemy.id) {
            ctx.chain_history.push(enemy.id);
        }
    }

    // (4) hit points
    let enemy = &mut world.enemies[idx];
    let killed = enemy.take_damage(dmg);
    let (id, pos, max_hp, temperature, kind) = (
        enemy.id,
        enemy.logical_pos,
        enemy.max_hp,
        enemy.temperature,
        enemy.kind,
    );
    let has_clone = enemy.has(Affix::Clone);
    world.record_damage(dmg);
    world.emit(CombatEvent::visual(VisualEffect::Spark, ctx.position));
    world.emit(CombatEvent::Sound(SoundCue::Hit));
    log::debug!("Enemy {id} took {dmg} damage (killed: {killed})");

    // (5) clone on hit
    if !killed && has_clone && world.rng.random::<f32>() < balance.clone_chance_hit {
        trigger_clone_spawn(world, idx);
    }

    // (6) kill rewards and burn spread
    if killed {
        let score = world.add_score(max_hp);
        world.emit(CombatEvent::EnemyKilled { id, pos, score });
        world.emit(CombatEvent::Sound(SoundCue::Kill));

        if temperature >= BURN_THRESHOLD {
            burn_spread(world, idx, &balance);
        }
        if kind == EnemyKind::Boss {
            log::info!("Boss {id} defeated");
            world.emit(CombatEvent::BossDefeated { id });
        }
    }

    // (7) explosive splash around the impact point
    if profile.is_explosive() {
        explode(world, idx, ctx.position, dmg, profile, &balance);
    }

    if world.active_enemy_count() == 0 && !world.enemies.is_empty() {
        world.clear_requested = true;
    }

    DamageResult {
        killed,
        score_delta: world.score - score_before,
    }
}

/// Damage and heat every active neighbor of a burning corpse
fn burn_spread(world: &mut CombatWorld, corpse_idx: usize, balance: &BalanceSettings) {
    let corpse = &world.enemies[corpse_idx];
    let center = corpse.logical_pos;
    let damage = corpse.max_hp * balance.fire_spread_damage_percent;

    world.emit(CombatEvent::visual(VisualEffect::FireWave, center));
    world.emit(CombatEvent::text(center, "SPREAD!"));
    world.emit(CombatEvent::Sound(SoundCue::Burn));

    let mut dealt = 0.0;
    let mut kills = Vec::new();
    for (i, other) in world.enemies.iter_mut().enumerate() {
        if i == corpse_idx || !other.active {
            continue;
        }
        if center.distance(other.logical_pos) < balance.fire_spread_radius {
            other.apply_temperature(balance.fire_spread_temp_increase);
            if other.take_damage(damage) {
                kills.push((other.id, other.logical_pos));
            }
            dealt += damage;
        }
    }
    world.record_damage(dealt);

    // Spread kills are reported but never scored
    for (id, pos) in kills {
        world.emit(CombatEvent::EnemyKilled { id, pos, score: 0 });
    }
}

/// Half-strength pass over every other enemy near the impact
fn explode(
    world: &mut CombatWorld,
    struck_idx: usize,
    center: Vec2,
    dmg: f32,
    profile: &MunitionProfile,
    balance: &BalanceSettings,
) {
    world.emit(CombatEvent::visual(VisualEffect::Explosion, center));
    world.emit(CombatEvent::Sound(SoundCue::Explosion));

    let aoe = dmg * balance.explosive_damage_mult;
    let mut kills = Vec::new();
    let mut dealt = 0.0;
    for (i, other) in world.enemies.iter_mut().enumerate() {
        if i == struck_idx || !other.active {
            continue;
        }
        if center.distance(other.logical_pos) >= balance.explosive_radius {
            continue;
        }
        if other.take_damage(aoe) {
            kills.push((other.id, other.logical_pos, other.max_hp));
        }
        dealt += aoe;
        if profile.cryo > 0 {
            other.apply_temperature(-balance.cryo_amount * profile.cryo as f32 * 0.5);
        }
        if profile.pyro > 0 {
            other.apply_temperature(balance.pyro_amount * profile.pyro as f32 * 0.5);
        }
        if profile.lightning > 0 {
            other.apply_temperature(
                balance.explosive_lightning_temp * profile.lightning as f32 * 0.5,
            );
        }
    }
    world.record_damage(dealt);

    for (id, pos, max_hp) in kills {
        let score = world.add_score(max_hp);
        world.emit(CombatEvent::EnemyKilled { id, pos, score });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::CombatSettings;
    use crate::sim::flags::Facet;

    fn world() -> CombatWorld {
        let mut settings = CombatSettings::default();
        settings.balance.clone_chance_hit = 0.0;
        settings.balance.lightning_base_chance = 1.0;
        settings.balance.lightning_cold_bonus = 0.0;
        CombatWorld::new(settings, 3)
    }

    fn hit(
        world: &mut CombatWorld,
        idx: usize,
        profile: &MunitionProfile,
        is_copy: bool,
    ) -> DamageResult {
        let mut history = Vec::new();
        let position = world.enemies[idx].logical_pos;
        apply_damage(
            world,
            idx,
            HitContext {
                profile,
                position,
                is_copy,
                chain_history: &mut history,
            },
        )
    }

    #[test]
    fn test_copy_deals_half_damage() {
        let mut w = world();
        w.spawn_enemy(Vec2::new(50.0, 80.0), 20.0);
        let profile = MunitionProfile {
            damage: 6.0,
            ..Default::default()
        };
        hit(&mut w, 0, &profile, true);
        assert_eq!(w.enemies[0].hp, 17.0);
        hit(&mut w, 0, &profile, false);
        assert_eq!(w.enemies[0].hp, 11.0);
        assert_eq!(w.round_damage, 9.0);
    }

    #[test]
    fn test_thermal_deltas_scale_with_level() {
        let mut w = world();
        w.spawn_enemy(Vec2::new(50.0, 80.0), 20.0);
        let cryo = MunitionProfile {
            cryo: 2,
            damage: 1.0,
            ..Default::default()
        };
        hit(&mut w, 0, &cryo, false);
        assert_eq!(w.enemies[0].temperature, -2.0);
        let pyro = MunitionProfile {
            pyro: 2,
            damage: 1.0,
            ..Default::default()
        };
        hit(&mut w, 0, &pyro, false);
        assert_eq!(w.enemies[0].temperature, 0.0);
    }

    #[test]
    fn test_lightning_heats_source_only_when_chained() {
        let mut w = world();
        w.spawn_enemy(Vec2::new(50.0, 80.0), 20.0);
        let profile = MunitionProfile {
            lightning: 2,
            damage: 1.0,
            ..Default::default()
        };
        // Alone: no propagation, no heat
        hit(&mut w, 0, &profile, false);
        assert_eq!(w.enemies[0].temperature, 0.0);

        w.spawn_enemy(Vec2::new(150.0, 80.0), 20.0);
        hit(&mut w, 0, &profile, false);
        assert_eq!(w.enemies[0].temperature, 2.0);
        assert_eq!(w.enemies[1].hp, 19.0);
    }

    #[test]
    fn test_kill_awards_score_and_requests_clear() {
        let mut w = world();
        w.spawn_enemy(Vec2::new(50.0, 80.0), 4.0);
        let profile = MunitionProfile {
            damage: 5.0,
            ..Default::default()
        };
        let result = hit(&mut w, 0, &profile, false);
        assert!(result.killed);
        assert_eq!(result.score_delta, 4);
        assert!(w.clear_requested);
    }

    #[test]
    fn test_burning_corpse_spreads_fire() {
        let mut w = world();
        w.spawn_enemy(Vec2::new(50.0, 80.0), 40.0);
        w.spawn_enemy(Vec2::new(130.0, 80.0), 50.0);
        w.spawn_enemy(Vec2::new(450.0, 80.0), 50.0);
        w.enemies[0].temperature = 120.0;
        w.enemies[0].hp = 1.0;
        let profile = MunitionProfile {
            damage: 5.0,
            ..Default::default()
        };
        hit(&mut w, 0, &profile, false);
        // 25% of the corpse's max HP
        assert_eq!(w.enemies[1].hp, 40.0);
        assert_eq!(w.enemies[1].temperature, 50.0);
        assert_eq!(w.enemies[2].hp, 50.0);
        assert!(!w.clear_requested);
    }

    #[test]
    fn test_spread_kill_is_reported_without_score() {
        let mut w = world();
        w.spawn_enemy(Vec2::new(50.0, 80.0), 40.0);
        let victim = w.spawn_enemy(Vec2::new(130.0, 80.0), 10.0);
        w.spawn_enemy(Vec2::new(450.0, 80.0), 50.0);
        w.enemies[0].temperature = 120.0;
        w.enemies[0].hp = 1.0;
        let profile = MunitionProfile {
            damage: 5.0,
            ..Default::default()
        };
        let result = hit(&mut w, 0, &profile, false);
        assert!(!w.enemies[1].active);
        // Only the corpse itself scores
        assert_eq!(result.score_delta, 40);
        let victim_kills: Vec<u64> = w
            .drain_events()
            .into_iter()
            .filter_map(|e| match e {
                CombatEvent::EnemyKilled { id, score, .. } if id == victim => Some(score),
                _ => None,
            })
            .collect();
        assert_eq!(victim_kills, vec![0]);
    }

    #[test]
    fn test_explosive_splash_halves_everything() {
        let mut w = world();
        w.spawn_enemy(Vec2::new(50.0, 80.0), 40.0);
        w.spawn_enemy(Vec2::new(130.0, 80.0), 40.0);
        w.spawn_enemy(Vec2::new(350.0, 80.0), 40.0);
        let mut profile = MunitionProfile {
            damage: 8.0,
            cryo: 2,
            ..Default::default()
        };
        profile.facets.insert(Facet::Explosive);
        profile.refresh_facets();
        hit(&mut w, 0, &profile, false);
        assert_eq!(w.enemies[0].hp, 32.0);
        assert_eq!(w.enemies[0].temperature, -2.0);
        assert_eq!(w.enemies[1].hp, 36.0);
        assert_eq!(w.enemies[1].temperature, -1.0);
        assert_eq!(w.enemies[2].hp, 40.0);
    }

    #[test]
    fn test_inactive_enemy_is_noop() {
        let mut w = world();
        w.spawn_enemy(Vec2::new(50.0, 80.0), 4.0);
        w.enemies[0].active = false;
        let profile = MunitionProfile::default();
        let result = hit(&mut w, 0, &profile, false);
        assert_eq!(result, DamageResult::default());
        assert_eq!(w.round_damage, 0.0);
    }

    #[test]
    fn test_clone_on_hit_spawns_weakened_copy() {
        let mut settings = CombatSettings::default();
        settings.balance.clone_chance_hit = 1.0;
        let mut w = CombatWorld::new(settings, 5);
        let id = w.spawn_enemy(Vec2::new(50.0, 480.0), 30.0);
        w.enemies[0].affixes.insert(Affix::Clone);
        let profile = MunitionProfile {
            damage: 1.0,
            ..Default::default()
        };
        hit(&mut w, 0, &profile, false);
        w.flush_pending_enemies();
        assert_eq!(w.enemies.len(), 2);
        let clone = w.enemies.iter().find(|e| e.id != id).unwrap();
        assert_eq!(clone.max_hp, 6.0);
        assert!(clone.affixes.is_empty());
    }
}
