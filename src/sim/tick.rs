//! Fixed-order simulation tick
//!
//! Each call advances the world by `ts` (time scale, 1.0 = one nominal tick):
//! queued burst shots, the wavefront, projectiles, then timers. Entities
//! spawned during a pass are buffered and appended once it completes.

use glam::Vec2;

use super::beam::{BeamTrace, fire_beams};
use super::collision::advance_projectile;
use super::events::{CombatEvent, SoundCue};
use super::flags::Facet;
use super::munition::{MunitionProfile, scatter_offset};
use super::scheduler::{RoundOutcome, advance_wavefront, start_enemy_turn};
use super::state::{BurstShot, CombatPhase, CombatWorld, Projectile};
use crate::consts::MULTICAST_DELAY;
use crate::rotate;

/// What a single fired shot produced
#[derive(Debug, Clone, Default)]
pub struct ShotReport {
    /// Ids of spawned projectiles (main shot first, then scatter copies)
    pub projectiles: Vec<u32>,
    pub beams: Vec<BeamTrace>,
}

/// Hand the player a fresh ammo queue and start their turn
///
/// Returns false once the game is over.
pub fn begin_player_turn(world: &mut CombatWorld, ammo: Vec<MunitionProfile>) -> bool {
    if world.phase == CombatPhase::GameOver {
        return false;
    }
    world.ammo_queue = ammo.into();
    world.burst_queue.clear();
    world.reset_multiplier();
    world.phase = CombatPhase::PlayerTurn;
    log::info!(
        "Round {}: player turn with {} shots",
        world.round,
        world.ammo_queue.len()
    );
    true
}

/// Spawn a shot: a beam volley for beam profiles, otherwise a projectile plus
/// scatter copies
pub fn fire_shot(world: &mut CombatWorld, origin: Vec2, vel: Vec2, profile: MunitionProfile) -> ShotReport {
    let mut report = ShotReport::default();
    if profile.is_beam() {
        report.beams = fire_beams(world, origin, vel, &profile);
        return report;
    }

    let lifetime = world.settings.balance.projectile_lifetime_ticks;
    let copies = profile.scatter;
    let copy_profile = (copies > 0).then(|| profile.scatter_copy());

    let id = world.next_entity_id();
    world
        .projectiles
        .push(Projectile::new(id, origin, vel, profile, false, lifetime));
    report.projectiles.push(id);

    if let Some(copy_profile) = copy_profile {
        for i in 1..=copies {
            let id = world.next_entity_id();
            let v = rotate(vel, scatter_offset(i));
            world.projectiles.push(Projectile::new(
                id,
                origin,
                v,
                copy_profile.clone(),
                true,
                lifetime,
            ));
            report.projectiles.push(id);
        }
    }
    report
}

/// Pop the head of the ammo queue; nested profiles swallow the next one
fn pull_next(world: &mut CombatWorld) -> Option<MunitionProfile> {
    let mut profile = world.ammo_queue.pop_front()?;
    if profile.has(Facet::Nested) && profile.nested_payload.is_none() {
        if let Some(inner) = pull_next(world) {
            profile.nested_payload = Some(Box::new(inner));
        }
    }
    Some(profile)
}

/// Queue the next munition for launch, with its multicast follow-ups
///
/// Returns false when it is not the player's turn or the queue is empty.
pub fn fire_next_shot(world: &mut CombatWorld, vel: Vec2) -> bool {
    if world.phase != CombatPhase::PlayerTurn {
        return false;
    }
    let Some(profile) = pull_next(world) else {
        return false;
    };

    for i in 1..=profile.multicast {
        world.burst_queue.push(BurstShot {
            delay: i as f32 * MULTICAST_DELAY,
            vel,
            profile: profile.clone(),
        });
    }
    log::debug!(
        "Fired shot (multicast {}, {} left in queue)",
        profile.multicast,
        world.ammo_queue.len()
    );
    world.burst_queue.push(BurstShot {
        delay: 0.0,
        vel,
        profile,
    });
    true
}

fn process_bursts(world: &mut CombatWorld, ts: f32) {
    if world.burst_queue.is_empty() {
        return;
    }
    let origin = world.launcher_pos();
    let mut waiting = Vec::with_capacity(world.burst_queue.len());
    for mut shot in std::mem::take(&mut world.burst_queue) {
        shot.delay -= ts;
        if shot.delay <= 0.0 {
            fire_shot(world, origin, shot.vel, shot.profile);
        } else {
            waiting.push(shot);
        }
    }
    // Anything queued while firing goes after the survivors
    waiting.append(&mut world.burst_queue);
    world.burst_queue = waiting;
}

fn advance_projectiles(world: &mut CombatWorld, ts: f32) {
    let mut projectiles = std::mem::take(&mut world.projectiles);
    let mut spawns = Vec::new();
    for proj in &mut projectiles {
        advance_projectile(world, proj, ts, &mut spawns);
    }
    projectiles.retain(|p| p.active);
    projectiles.append(&mut world.projectiles);
    world.projectiles = projectiles;

    if world.clear_requested {
        world.clear_requested = false;
        world.clear_projectiles();
        log::info!("Board wiped; clearing projectiles");
        return;
    }
    for spawn in spawns {
        fire_shot(world, spawn.pos, spawn.vel, spawn.profile);
    }
}

/// Every enemy is gone while ammo remains: multiply the score and harden the
/// next wave
fn perfect_clear(world: &mut CombatWorld) {
    let leftover = world.ammo_queue.len();
    let bonus = world.settings.balance.unused_ammo_score_mult.powi(leftover as i32);
    world.score = (world.score as f64 * bonus as f64).floor() as u64;
    world.next_round_hp_multiplier = world.settings.balance.next_round_difficulty_mult;
    world.ammo_queue.clear();
    world.clear_projectiles();
    world.emit(CombatEvent::PerfectClear {
        bonus_multiplier: bonus,
    });
    world.emit(CombatEvent::Sound(SoundCue::Skill));
    log::info!("Perfect clear with {leftover} shots left: score x{bonus}");
}

/// Advance the world by one tick scaled by `ts`
///
/// Returns the round outcome on the tick a round finalizes.
pub fn tick(world: &mut CombatWorld, ts: f32) -> Option<RoundOutcome> {
    if world.phase == CombatPhase::GameOver || ts <= 0.0 {
        return None;
    }

    process_bursts(world, ts);

    if world.phase == CombatPhase::PlayerTurn && world.player_munitions_exhausted() {
        start_enemy_turn(world);
    }
    let outcome = advance_wavefront(world, ts);

    advance_projectiles(world, ts);

    for e in &mut world.enemies {
        e.animate(ts);
    }

    if world.phase == CombatPhase::PlayerTurn
        && world.active_enemy_count() == 0
        && !world.ammo_queue.is_empty()
    {
        perfect_clear(world);
    }

    world.flush_pending_enemies();
    world.sweep_enemies();
    world.time_ticks += 1;
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::CombatSettings;
    use crate::sim::scheduler::WavefrontPhase;

    fn world() -> CombatWorld {
        let mut settings = CombatSettings::default();
        settings.balance.clone_chance_hit = 0.0;
        settings.affixes.clone_chance_turn = 0.0;
        CombatWorld::new(settings, 12345)
    }

    fn nested() -> MunitionProfile {
        let mut p = MunitionProfile::default();
        p.facets.insert(Facet::Nested);
        p
    }

    #[test]
    fn test_multicast_queues_delayed_shots() {
        let mut w = world();
        let profile = MunitionProfile {
            multicast: 2,
            ..Default::default()
        };
        begin_player_turn(&mut w, vec![profile]);
        assert!(fire_next_shot(&mut w, Vec2::new(0.0, -10.0)));
        let mut delays: Vec<f32> = w.burst_queue.iter().map(|b| b.delay).collect();
        delays.sort_by(f32::total_cmp);
        assert_eq!(delays, vec![0.0, 20.0, 40.0]);
        assert!(!fire_next_shot(&mut w, Vec2::new(0.0, -10.0)));
    }

    #[test]
    fn test_nested_profile_captures_following_shots() {
        let mut w = world();
        let inner = MunitionProfile {
            damage: 9.0,
            ..Default::default()
        };
        let last = MunitionProfile {
            damage: 4.0,
            ..Default::default()
        };
        begin_player_turn(&mut w, vec![nested(), nested(), inner, last]);
        fire_next_shot(&mut w, Vec2::new(0.0, -10.0));

        let shot = &w.burst_queue[0].profile;
        let middle = shot.nested_payload.as_deref().unwrap();
        assert!(middle.has(Facet::Nested));
        assert_eq!(middle.nested_payload.as_deref().unwrap().damage, 9.0);
        assert_eq!(w.ammo_queue.len(), 1);
    }

    #[test]
    fn test_scatter_spawns_copies() {
        let mut w = world();
        let profile = MunitionProfile {
            scatter: 2,
            ..Default::default()
        };
        let origin = w.launcher_pos();
        let report = fire_shot(&mut w, origin, Vec2::new(0.0, -10.0), profile);
        assert_eq!(report.projectiles.len(), 3);
        assert!(!w.projectiles[0].is_copy);
        assert!(w.projectiles[1..].iter().all(|p| p.is_copy && p.profile.scatter == 0));
        assert!(w.projectiles[1].vel.x > 0.0);
        assert!(w.projectiles[2].vel.x < 0.0);
    }

    #[test]
    fn test_beam_shot_spawns_no_projectile() {
        let mut w = world();
        w.spawn_enemy(Vec2::new(300.0, 500.0), 10.0);
        let mut profile = MunitionProfile::default();
        profile.facets.insert(Facet::Beam);
        let origin = w.launcher_pos();
        let report = fire_shot(&mut w, origin, Vec2::new(0.0, -10.0), profile);
        assert!(report.projectiles.is_empty());
        assert_eq!(report.beams.len(), 1);
        assert!(w.projectiles.is_empty());
        assert_eq!(w.enemies[0].hp, 8.0);
    }

    #[test]
    fn test_burst_fires_from_launcher() {
        let mut w = world();
        w.spawn_enemy(Vec2::new(50.0, 80.0), 10.0);
        begin_player_turn(&mut w, vec![MunitionProfile::default()]);
        fire_next_shot(&mut w, Vec2::new(0.0, -10.0));
        tick(&mut w, 1.0);
        assert_eq!(w.projectiles.len(), 1);
        assert_eq!(w.projectiles[0].pos, Vec2::new(300.0, 810.0));
        assert!(w.burst_queue.is_empty());
    }

    #[test]
    fn test_perfect_clear_multiplies_score() {
        let mut w = world();
        w.spawn_enemy(Vec2::new(300.0, 500.0), 4.0);
        let strong = MunitionProfile {
            damage: 5.0,
            ..Default::default()
        };
        begin_player_turn(&mut w, vec![strong.clone(), strong.clone(), strong]);
        fire_next_shot(&mut w, Vec2::new(0.0, -10.0));
        let mut cleared = false;
        for _ in 0..60 {
            tick(&mut w, 1.0);
            cleared |= w
                .drain_events()
                .iter()
                .any(|e| matches!(e, CombatEvent::PerfectClear { .. }));
        }
        assert!(cleared);
        // 4 points x 1.5^2
        assert_eq!(w.score, 9);
        assert_eq!(w.next_round_hp_multiplier, 12.0);
        assert!(w.ammo_queue.is_empty());
        assert!(w.projectiles.is_empty());
        assert_eq!(w.phase, CombatPhase::EnemyTurn);
    }

    #[test]
    fn test_nested_payload_joins_the_volley() {
        let mut w = world();
        w.spawn_enemy(Vec2::new(50.0, 80.0), 10.0);
        begin_player_turn(&mut w, Vec::new());

        let mut parent = nested();
        parent.nested_payload = Some(Box::new(MunitionProfile {
            damage: 3.0,
            scatter: 2,
            ..Default::default()
        }));
        let start = Vec2::new(300.0, 500.0);
        fire_shot(&mut w, start, Vec2::new(3.0, -4.0), parent);
        w.projectiles[0].lifetime = 1.0;

        tick(&mut w, 1.0);
        assert_eq!(w.phase, CombatPhase::PlayerTurn);
        assert_eq!(w.projectiles.len(), 3);
        let main = &w.projectiles[0];
        assert!(!main.is_copy);
        assert_eq!(main.profile.damage, 3.0);
        assert!((main.vel - Vec2::new(3.3, -4.4)).length() < 1e-4);
        assert!(w.projectiles[1..].iter().all(|p| p.is_copy));
        assert!(w.projectiles.iter().all(|p| p.pos == start));

        let before: Vec<(Vec2, Vec2)> = w.projectiles.iter().map(|p| (p.pos, p.vel)).collect();
        tick(&mut w, 1.0);
        assert_eq!(w.phase, CombatPhase::PlayerTurn);
        assert_eq!(w.projectiles.len(), 3);
        for (p, (pos, vel)) in w.projectiles.iter().zip(before) {
            assert!((p.pos - (pos + vel)).length() < 1e-4);
        }
    }

    #[test]
    fn test_board_wipe_clears_other_projectiles() {
        let mut w = world();
        w.spawn_enemy(Vec2::new(300.0, 700.0), 1.0);
        begin_player_turn(&mut w, Vec::new());
        fire_shot(&mut w, Vec2::new(300.0, 760.0), Vec2::new(0.0, -10.0), MunitionProfile::default());
        fire_shot(&mut w, Vec2::new(500.0, 300.0), Vec2::new(0.0, -1.0), MunitionProfile::default());
        for _ in 0..5 {
            tick(&mut w, 1.0);
        }
        assert!(w.enemies.is_empty());
        assert!(w.projectiles.is_empty());
    }

    #[test]
    fn test_empty_queue_starts_enemy_turn() {
        let mut w = world();
        w.spawn_enemy(Vec2::new(50.0, 80.0), 10.0);
        begin_player_turn(&mut w, Vec::new());
        tick(&mut w, 1.0);
        assert_eq!(w.phase, CombatPhase::EnemyTurn);
        assert_eq!(w.wavefront.phase, WavefrontPhase::Scanning);
        assert!(w.snapshot().scan_y.is_some());
    }

    #[test]
    fn test_full_round_completes() {
        let mut w = CombatWorld::with_starting_rows(CombatSettings::default(), 5);
        begin_player_turn(&mut w, vec![MunitionProfile::default()]);
        fire_next_shot(&mut w, Vec2::new(1.0, -12.0));

        let mut outcome = None;
        for _ in 0..5000 {
            if let Some(o) = tick(&mut w, 1.0) {
                outcome = Some(o);
                break;
            }
        }
        let outcome = outcome.expect("round should finish");
        assert_eq!(outcome.round, 2);
        assert_eq!(w.round, 2);
        assert!(matches!(w.phase, CombatPhase::Loadout | CombatPhase::GameOver));
        assert!(w.enemies.iter().all(|e| e.active));
    }

    #[test]
    fn test_time_scale_halves_progress() {
        let mut a = world();
        let mut b = world();
        for w in [&mut a, &mut b] {
            fire_shot(w, Vec2::new(300.0, 500.0), Vec2::new(0.0, -4.0), MunitionProfile::default());
        }
        tick(&mut a, 1.0);
        tick(&mut b, 0.5);
        tick(&mut b, 0.5);
        assert!((a.projectiles[0].pos.y - b.projectiles[0].pos.y).abs() < 1e-4);
    }

    #[test]
    fn test_determinism() {
        let run = || {
            let mut w = CombatWorld::with_starting_rows(CombatSettings::default(), 99);
            let ammo = vec![
                MunitionProfile {
                    scatter: 2,
                    bounce: 2,
                    ..Default::default()
                },
                MunitionProfile {
                    lightning: 2,
                    pyro: 1,
                    ..Default::default()
                },
            ];
            begin_player_turn(&mut w, ammo);
            for t in 0..1500 {
                if t % 100 == 0 {
                    fire_next_shot(&mut w, Vec2::new(-3.0, -12.0));
                }
                tick(&mut w, 1.0);
            }
            w
        };
        let a = run();
        let b = run();
        assert_eq!(a.score, b.score);
        assert_eq!(a.round, b.round);
        assert_eq!(
            serde_json::to_string(&a.snapshot()).unwrap(),
            serde_json::to_string(&b.snapshot()).unwrap()
        );
    }

    #[test]
    fn test_game_over_freezes_world() {
        let mut w = world();
        w.phase = CombatPhase::GameOver;
        assert!(tick(&mut w, 1.0).is_none());
        assert_eq!(w.time_ticks, 0);
        assert!(!begin_player_turn(&mut w, Vec::new()));
    }
}
