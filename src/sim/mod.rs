//! Deterministic combat simulation
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Time-scaled ticks only (no wall clock)
//! - Seeded RNG only
//! - Stable iteration order (entity vectors in insertion order)
//! - No rendering, audio or platform dependencies

pub mod beam;
pub mod behavior;
pub mod collision;
pub mod damage;
pub mod events;
pub mod flags;
pub mod geometry;
pub mod lightning;
pub mod munition;
pub mod scheduler;
pub mod skills;
pub mod spawn;
pub mod state;
pub mod thermal;
pub mod tick;

pub use beam::{BeamTrace, Reflector, cast_ray_to_reflectors, fire_beam, fire_beams};
pub use damage::{DamageResult, HitContext, apply_damage};
pub use events::{CombatEvent, SoundCue, VisualEffect};
pub use flags::{Affix, AffixSet, Facet, FacetSet};
pub use geometry::{Aabb, Axis};
pub use munition::{MunitionProfile, RecipeLevels};
pub use scheduler::{RoundOutcome, Wavefront, WavefrontPhase};
pub use skills::{Skill, SkillEffect, SkillOutcome, activate_skill};
pub use state::{CombatPhase, CombatWorld, Enemy, EnemyKind, Projectile, WorldSnapshot};
pub use thermal::ThermalState;
pub use tick::{ShotReport, begin_player_turn, fire_next_shot, fire_shot, tick};
