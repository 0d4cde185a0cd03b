//! Projectile motion and collision response
//!
//! Projectiles move in sub-steps no longer than 0.8x their radius so fast
//! shots cannot tunnel through a cell. Enemy contacts run through the damage
//! dispatcher and then spend pierce or bounce charges; walls always reflect,
//! the floor only with the combat wall.

use glam::Vec2;
use rand::Rng;

use super::damage::{HitContext, apply_damage};
use super::events::{CombatEvent, SoundCue, VisualEffect};
use super::geometry::{Aabb, Axis, min_penetration_axis, reflect_axis};
use super::state::{CombatWorld, Projectile, SpawnRequest};
use crate::consts::*;

/// Deactivate a projectile and release its nested payload, if any
///
/// Copies never release payloads. The payload keeps the heading with a 1.1x
/// speed boost, or launches straight up when the parent had nearly stopped.
pub fn destroy_projectile(proj: &mut Projectile, spawns: &mut Vec<SpawnRequest>) {
    if !proj.active {
        return;
    }
    proj.active = false;
    if proj.is_copy {
        return;
    }
    if let Some(payload) = proj.profile.nested_payload.take() {
        let mut vel = proj.vel * NESTED_SPEED_BOOST;
        if vel.length() < NESTED_MIN_SPEED {
            vel = Vec2::new(0.0, -NESTED_FALLBACK_SPEED);
        }
        log::debug!("Projectile {} released nested payload", proj.id);
        spawns.push(SpawnRequest {
            pos: proj.pos,
            vel,
            profile: *payload,
        });
    }
}

/// Move by `step` and resolve arena boundaries
///
/// Reflections flip both the velocity and the rest of the current sub-step.
fn apply_move(
    world: &mut CombatWorld,
    proj: &mut Projectile,
    step: &mut Vec2,
    spawns: &mut Vec<SpawnRequest>,
) {
    let (width, height) = (world.settings.arena.width, world.settings.arena.height);
    let r = proj.radius;
    proj.pos += *step;

    if proj.pos.x < r {
        proj.pos.x = r;
        proj.vel.x = proj.vel.x.abs();
        step.x = step.x.abs();
    }
    if proj.pos.x > width - r {
        proj.pos.x = width - r;
        proj.vel.x = -proj.vel.x.abs();
        step.x = -step.x.abs();
    }
    if proj.pos.y < r {
        proj.pos.y = r;
        proj.vel.y = proj.vel.y.abs();
        step.y = step.y.abs();
    }

    if proj.pos.y > height - r {
        let can_rebound = world.combat_wall && proj.durability() > 0;
        if can_rebound {
            if proj.pierce_left > 0 {
                proj.pierce_left -= 1;
            } else {
                proj.bounce_left -= 1;
            }
            proj.pos.y = height - r;
            proj.vel.y = -proj.vel.y.abs();
            step.y = -step.y.abs();
            proj.vel.x += (world.rng.random::<f32>() - 0.5) * 2.0;
            world.emit(CombatEvent::visual(
                VisualEffect::Shockwave,
                Vec2::new(proj.pos.x, height),
            ));
            world.emit(CombatEvent::Sound(SoundCue::Bounce));
        } else {
            destroy_projectile(proj, spawns);
        }
    }
    if proj.pos.y > height + BELOW_ARENA_CULL {
        destroy_projectile(proj, spawns);
    }
}

/// Advance one projectile by `vel × ts`
///
/// The projectile must not be part of `world.projectiles` while this runs;
/// nested payloads are pushed onto `spawns` instead of the live collection.
pub fn advance_projectile(
    world: &mut CombatWorld,
    proj: &mut Projectile,
    ts: f32,
    spawns: &mut Vec<SpawnRequest>,
) {
    if !proj.active {
        return;
    }

    proj.hit_cooldowns.retain(|_, remaining| {
        *remaining -= ts;
        *remaining > 0.0
    });

    proj.lifetime -= ts;
    if proj.lifetime <= 0.0 {
        log::debug!("Projectile {} expired", proj.id);
        destroy_projectile(proj, spawns);
        return;
    }

    let full_move = proj.vel * ts;
    let distance = full_move.length();
    let r = proj.radius;

    // Broad phase: only enemies touching the swept box of this tick
    let candidates: Vec<usize> = if distance > r {
        let swept = Aabb::swept_circle(proj.pos, proj.pos + full_move, r);
        world
            .enemies
            .iter()
            .enumerate()
            .filter(|(_, e)| e.active && e.aabb().intersects(&swept))
            .map(|(i, _)| i)
            .collect()
    } else {
        (0..world.enemies.len()).collect()
    };

    if candidates.is_empty() {
        proj.phasing_through = None;
        let mut step = full_move;
        apply_move(world, proj, &mut step, spawns);
        return;
    }

    let steps = ((distance / (r * SUBSTEP_FRACTION)).ceil() as u32).max(1);
    if steps > SUBSTEP_WARN_THRESHOLD {
        log::warn!(
            "Projectile {} needs {steps} sub-steps (speed {distance:.1}/tick)",
            proj.id
        );
    }
    let mut step = full_move / steps as f32;
    let cooldown = world.settings.balance.hit_cooldown_ticks;

    for _ in 0..steps {
        apply_move(world, proj, &mut step, spawns);
        if !proj.active {
            return;
        }

        let mut inside_phased = false;
        for &idx in &candidates {
            let enemy = &world.enemies[idx];
            if !enemy.active {
                continue;
            }
            let (id, center) = (enemy.id, enemy.logical_pos);
            let half = enemy.size * 0.5;
            let delta = proj.pos - center;
            let overlap = half + Vec2::splat(r) - delta.abs();
            if overlap.x <= 0.0 || overlap.y <= 0.0 {
                continue;
            }
            if proj.phasing_through == Some(id) {
                inside_phased = true;
            }

            if !proj.hit_cooldowns.contains_key(&id) {
                proj.hit_cooldowns.clear();
                proj.hit_cooldowns.insert(id, cooldown);
                apply_damage(
                    world,
                    idx,
                    HitContext {
                        profile: &proj.profile,
                        position: proj.pos,
                        is_copy: proj.is_copy,
                        chain_history: &mut proj.chain_history,
                    },
                );

                if proj.pierce_left > 0 {
                    proj.pierce_left -= 1;
                    proj.phasing_through = Some(id);
                    inside_phased = true;
                    continue;
                }
                proj.phasing_through = None;
                if proj.bounce_left > 0 {
                    proj.bounce_left -= 1;
                } else {
                    destroy_projectile(proj, spawns);
                    return;
                }
            } else if proj.pierce_left > 0 || proj.phasing_through == Some(id) {
                continue;
            }

            // Minimum translation: reflect on the shallower axis and push clear
            let axis = min_penetration_axis(overlap);
            proj.vel = reflect_axis(proj.vel, axis);
            step = reflect_axis(step, axis);
            match axis {
                Axis::X => {
                    let side = if delta.x < 0.0 { -1.0 } else { 1.0 };
                    proj.pos.x = center.x + side * (half.x + r + SEPARATION_EPSILON);
                }
                Axis::Y => {
                    let side = if delta.y < 0.0 { -1.0 } else { 1.0 };
                    proj.pos.y = center.y + side * (half.y + r + SEPARATION_EPSILON);
                }
            }
            world.emit(CombatEvent::Sound(SoundCue::Bounce));
        }
        // Pass-through ends once the pierced enemy is left behind
        if !inside_phased {
            proj.phasing_through = None;
        }
    }
}
