//! Outbound notifications for the host
//!
//! The core never calls into rendering, audio or UI. Everything the host may
//! want to present is pushed onto `CombatWorld::events` and drained after
//! each tick. Correctness never depends on the host consuming them.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Visual effect request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VisualEffect {
    Spark,
    Explosion,
    Shockwave,
    FireWave,
    LightningBolt,
    Frost,
    Heal,
    CloneSpore,
    Devour,
    Haste,
}

/// Sound cue request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SoundCue {
    Hit,
    Bounce,
    Kill,
    Explosion,
    Zap,
    Beam,
    Freeze,
    Burn,
    Skill,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CombatEvent {
    Visual {
        effect: VisualEffect,
        pos: Vec2,
    },
    /// Lightning arc between two points
    Arc {
        from: Vec2,
        to: Vec2,
    },
    Sound(SoundCue),
    FloatingText {
        pos: Vec2,
        text: String,
    },
    /// Resolved beam path (first point is the origin)
    Beam {
        points: Vec<Vec2>,
        width: f32,
    },
    EnemySpawned {
        id: u32,
        pos: Vec2,
    },
    EnemyKilled {
        id: u32,
        pos: Vec2,
        score: u64,
    },
    BossDefeated {
        id: u32,
    },
    PerfectClear {
        bonus_multiplier: f32,
    },
    RoundFinalized {
        round: u32,
        defeated: bool,
    },
}

impl CombatEvent {
    pub fn visual(effect: VisualEffect, pos: Vec2) -> Self {
        Self::Visual { effect, pos }
    }

    pub fn text(pos: Vec2, text: impl Into<String>) -> Self {
        Self::FloatingText {
            pos,
            text: text.into(),
        }
    }
}
