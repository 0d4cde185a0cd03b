//! Player skills
//!
//! Skills cost skill points and are only usable on the player's turn. They
//! act directly on enemies or buff the next munition in the ammo queue.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::events::{CombatEvent, SoundCue, VisualEffect};
use super::flags::Facet;
use super::lightning::trigger_lightning_chain;
use super::state::{CombatPhase, CombatWorld};

/// Level buffs added to the head of the ammo queue
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelBuffs {
    pub damage: f32,
    pub bounce: u32,
    pub pierce: u32,
    pub multicast: u32,
    pub scatter: u32,
    pub laser: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SkillEffect {
    /// Push every enemy back up the board
    Repulsion { push_rows: u32 },
    /// Strike every enemy and start a lightning chain from each
    Storm { base_damage: f32, damage_per_round: f32 },
    /// Buff the next munition
    Enhance {
        buffs: LevelBuffs,
        force_explosive: bool,
        force_beam: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Skill {
    pub id: String,
    pub cost: u32,
    pub effect: SkillEffect,
}

impl Skill {
    pub fn repulsion() -> Self {
        Self {
            id: "repulsion".into(),
            cost: 2,
            effect: SkillEffect::Repulsion { push_rows: 2 },
        }
    }

    pub fn storm() -> Self {
        Self {
            id: "storm".into(),
            cost: 3,
            effect: SkillEffect::Storm {
                base_damage: 10.0,
                damage_per_round: 5.0,
            },
        }
    }

    pub fn enhance_normal() -> Self {
        Self {
            id: "enhance_normal".into(),
            cost: 2,
            effect: SkillEffect::Enhance {
                buffs: LevelBuffs {
                    damage: 5.0,
                    bounce: 3,
                    pierce: 2,
                    multicast: 1,
                    scatter: 4,
                    laser: 0,
                },
                force_explosive: true,
                force_beam: false,
            },
        }
    }

    pub fn enhance_beam() -> Self {
        Self {
            id: "enhance_beam".into(),
            cost: 1,
            effect: SkillEffect::Enhance {
                buffs: LevelBuffs {
                    damage: 5.0,
                    bounce: 0,
                    pierce: 8,
                    multicast: 2,
                    scatter: 0,
                    laser: 5,
                },
                force_explosive: false,
                force_beam: true,
            },
        }
    }

    /// Every built-in skill
    pub fn catalog() -> Vec<Skill> {
        vec![
            Self::repulsion(),
            Self::storm(),
            Self::enhance_normal(),
            Self::enhance_beam(),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkillOutcome {
    Activated,
    /// Not the player's turn; nothing spent
    WrongPhase,
    InsufficientPoints,
    /// Nothing to act on; points returned
    Refunded,
}

/// Spend points and apply a skill
pub fn activate_skill(world: &mut CombatWorld, skill: &Skill) -> SkillOutcome {
    if world.phase != CombatPhase::PlayerTurn {
        return SkillOutcome::WrongPhase;
    }
    if world.skill_points < skill.cost {
        return SkillOutcome::InsufficientPoints;
    }
    world.skill_points -= skill.cost;
    world.emit(CombatEvent::Sound(SoundCue::Skill));

    let applied = match &skill.effect {
        SkillEffect::Repulsion { push_rows } => {
            repulse(world, *push_rows);
            true
        }
        SkillEffect::Storm {
            base_damage,
            damage_per_round,
        } => {
            storm(world, base_damage + world.round as f32 * damage_per_round);
            true
        }
        SkillEffect::Enhance {
            buffs,
            force_explosive,
            force_beam,
        } => enhance(world, buffs, *force_explosive, *force_beam),
    };

    if applied {
        log::info!("Skill {} activated ({} points left)", skill.id, world.skill_points);
        SkillOutcome::Activated
    } else {
        world.skill_points += skill.cost;
        log::debug!("Skill {} had no target; refunded", skill.id);
        SkillOutcome::Refunded
    }
}

fn repulse(world: &mut CombatWorld, rows: u32) {
    let push = world.settings.arena.enemy_height() * rows as f32;
    let floor_y = world.settings.arena.enemy_start_y;
    for e in world.enemies.iter_mut().filter(|e| e.active) {
        e.logical_pos.y = (e.logical_pos.y - push).max(floor_y);
        e.display_pos = e.logical_pos;
    }
    let arena = &world.settings.arena;
    let center = Vec2::new(arena.width * 0.5, arena.height * 0.5);
    world.emit(CombatEvent::visual(VisualEffect::Shockwave, center));
}

fn storm(world: &mut CombatWorld, damage: f32) {
    let heat = world.settings.balance.lightning_temp_increase;
    for idx in (0..world.enemies.len()).rev() {
        let e = &mut world.enemies[idx];
        if !e.active {
            continue;
        }
        let (id, pos, max_hp) = (e.id, e.logical_pos, e.max_hp);
        let killed = e.take_damage(damage);
        e.apply_temperature(heat);
        world.record_damage(damage);
        world.emit(CombatEvent::visual(VisualEffect::LightningBolt, pos));
        world.emit(CombatEvent::text(pos, format!("-{damage}")));

        let mut history = vec![id];
        trigger_lightning_chain(world, idx, damage, &mut history);

        if killed {
            let score = world.add_score(max_hp);
            world.emit(CombatEvent::EnemyKilled { id, pos, score });
        }
    }
    world.emit(CombatEvent::Sound(SoundCue::Zap));
}

fn enhance(world: &mut CombatWorld, buffs: &LevelBuffs, force_explosive: bool, force_beam: bool) -> bool {
    let Some(head) = world.ammo_queue.front_mut() else {
        return false;
    };
    head.damage += buffs.damage;
    head.bounce += buffs.bounce;
    head.pierce += buffs.pierce;
    head.multicast += buffs.multicast;
    head.scatter += buffs.scatter;
    head.laser += buffs.laser;
    if force_beam {
        head.facets.insert(Facet::Beam);
        head.laser = head.laser.max(1);
    }
    if force_explosive {
        head.facets.insert(Facet::Explosive);
    }
    head.refresh_facets();

    let launcher = world.launcher_pos();
    world.emit(CombatEvent::visual(VisualEffect::Explosion, launcher));
    world.emit(CombatEvent::text(launcher - Vec2::new(0.0, 40.0), "ENHANCED!"));
    true
}
