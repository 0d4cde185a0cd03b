//! Raycast beams
//!
//! A beam is resolved synchronously when fired: the ray is walked segment by
//! segment between reflectors (arena walls and shielded enemies), damaging
//! every ordinary enemy it passes. Each reflection spends one bounce.

use glam::Vec2;

use super::damage::{HitContext, apply_damage};
use super::events::{CombatEvent, SoundCue, VisualEffect};
use super::flags::Affix;
use super::geometry::{Aabb, Axis, point_segment_distance, ray_aabb_intersection, reflect_axis};
use super::munition::{MunitionProfile, scatter_offset};
use super::state::CombatWorld;
use crate::consts::*;
use crate::rotate;

/// Surface a ray can stop at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reflector {
    /// Nothing within range
    None,
    /// Arena wall with the given normal axis
    Wall(Axis),
    /// Shielded enemy at this index in `CombatWorld::enemies`
    Shield { idx: usize, axis: Axis },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub dist: f32,
    pub reflector: Reflector,
}

/// Resolved beam path and its results
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BeamTrace {
    /// Origin followed by every segment end
    pub points: Vec<Vec2>,
    pub width: f32,
    pub bounces_used: u32,
    /// Damage applications (an enemy crossed by two segments counts twice)
    pub hits: u32,
    pub kills: u32,
    pub score_delta: u64,
}

impl BeamTrace {
    pub fn length(&self) -> f32 {
        self.points.windows(2).map(|w| w[0].distance(w[1])).sum()
    }
}

/// Nearest reflector along `dir` within `max_dist`
///
/// Walls are inset by the bullet radius; the floor only reflects with the
/// combat wall. Shielded enemies are padded slightly so grazing rays bounce.
pub fn cast_ray_to_reflectors(world: &CombatWorld, start: Vec2, dir: Vec2, max_dist: f32) -> RayHit {
    let arena = &world.settings.arena;
    let mut best = RayHit {
        dist: max_dist,
        reflector: Reflector::None,
    };
    let consider = |dist: f32, reflector: Reflector, best: &mut RayHit| {
        if dist > RAY_EPSILON && dist < best.dist {
            *best = RayHit { dist, reflector };
        }
    };

    if dir.x < 0.0 {
        consider((BULLET_RADIUS - start.x) / dir.x, Reflector::Wall(Axis::X), &mut best);
    }
    if dir.x > 0.0 {
        consider(
            (arena.width - BULLET_RADIUS - start.x) / dir.x,
            Reflector::Wall(Axis::X),
            &mut best,
        );
    }
    if dir.y < 0.0 {
        consider((BULLET_RADIUS - start.y) / dir.y, Reflector::Wall(Axis::Y), &mut best);
    }
    if world.combat_wall && dir.y > 0.0 {
        consider(
            (arena.height - BULLET_RADIUS - start.y) / dir.y,
            Reflector::Wall(Axis::Y),
            &mut best,
        );
    }

    for (idx, e) in world.enemies.iter().enumerate() {
        if !e.active || !e.has(Affix::Shield) {
            continue;
        }
        let padded = e.aabb().expand(SHIELD_PADDING);
        let Some(t) = ray_aabb_intersection(start, dir, &padded) else {
            continue;
        };
        // Side faces reflect X, top and bottom faces reflect Y
        let half = padded.size() * 0.5;
        let rel = (start + dir * t - e.logical_pos).abs() / half;
        let axis = if rel.x > rel.y { Axis::X } else { Axis::Y };
        consider(t, Reflector::Shield { idx, axis }, &mut best);
    }

    best
}

/// Damage every unshielded enemy within reach of segment `a`-`b`
fn penetrate_segment(
    world: &mut CombatWorld,
    a: Vec2,
    b: Vec2,
    profile: &MunitionProfile,
    history: &mut Vec<u32>,
    trace: &mut BeamTrace,
) {
    let bounds = Aabb::new(a, b);
    let half_width = profile.beam_half_width();

    for idx in 0..world.enemies.len() {
        let e = &world.enemies[idx];
        if !e.active || e.has(Affix::Shield) {
            continue;
        }
        let reach = e.size.x.min(e.size.y) * 0.5 + half_width;
        if !bounds.expand(reach).contains(e.logical_pos) {
            continue;
        }
        let Some((dist, closest)) = point_segment_distance(e.logical_pos, a, b) else {
            return;
        };
        if dist >= reach {
            continue;
        }
        let result = apply_damage(
            world,
            idx,
            HitContext {
                profile,
                position: closest,
                is_copy: false,
                chain_history: &mut *history,
            },
        );
        trace.hits += 1;
        trace.kills += u32::from(result.killed);
        trace.score_delta += result.score_delta;
    }
}

/// Trace and resolve a single beam from `origin` along `vel`
pub fn fire_beam(world: &mut CombatWorld, origin: Vec2, vel: Vec2, profile: &MunitionProfile) -> BeamTrace {
    let mut trace = BeamTrace {
        points: vec![origin],
        width: profile.beam_width(),
        ..Default::default()
    };
    let mut dir = vel.normalize_or_zero();
    if dir == Vec2::ZERO {
        log::warn!("Beam fired with zero velocity; ignoring");
        return trace;
    }

    let mut pos = origin;
    let mut remaining = profile.max_beam_length();
    let mut bounces = profile.bounce;
    let mut history = Vec::new();

    while remaining > 0.0 {
        let hit = cast_ray_to_reflectors(world, pos, dir, remaining);
        let next = pos + dir * hit.dist;
        penetrate_segment(world, pos, next, profile, &mut history, &mut trace);
        trace.points.push(next);
        remaining -= hit.dist;
        pos = next;

        let axis = match hit.reflector {
            Reflector::None => break,
            Reflector::Wall(axis) | Reflector::Shield { axis, .. } => axis,
        };
        if bounces == 0 {
            world.emit(CombatEvent::visual(VisualEffect::Spark, next));
            break;
        }
        bounces -= 1;
        trace.bounces_used += 1;

        if let Reflector::Shield { idx, .. } = hit.reflector {
            let result = apply_damage(
                world,
                idx,
                HitContext {
                    profile,
                    position: next,
                    is_copy: false,
                    chain_history: &mut history,
                },
            );
            trace.hits += 1;
            trace.kills += u32::from(result.killed);
            trace.score_delta += result.score_delta;
        }
        world.emit(CombatEvent::visual(VisualEffect::Spark, next));
        world.emit(CombatEvent::Sound(SoundCue::Bounce));
        dir = reflect_axis(dir, axis);
    }

    world.emit(CombatEvent::Beam {
        points: trace.points.clone(),
        width: trace.width,
    });
    world.emit(CombatEvent::Sound(SoundCue::Beam));
    log::debug!(
        "Beam: {} segments, {} hits, {} kills",
        trace.points.len() - 1,
        trace.hits,
        trace.kills
    );
    trace
}

/// Fire a beam plus one extra beam per scatter level at alternating offsets
pub fn fire_beams(world: &mut CombatWorld, origin: Vec2, vel: Vec2, profile: &MunitionProfile) -> Vec<BeamTrace> {
    let mut traces = vec![fire_beam(world, origin, vel, profile)];
    if profile.scatter > 0 {
        let spread = MunitionProfile {
            scatter: 0,
            ..profile.clone()
        };
        for i in 1..=profile.scatter {
            let v = rotate(vel, scatter_offset(i));
            traces.push(fire_beam(world, origin, v, &spread));
        }
    }
    traces
}
