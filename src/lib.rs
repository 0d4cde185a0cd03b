//! Marble Siege - combat core for a turn-structured projectile game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (projectiles, beams, elements, enemy turns)
//! - `settings`: Data-driven combat balance

pub mod settings;
pub mod sim;

pub use settings::CombatSettings;

use glam::Vec2;

/// Fixed simulation constants (not exposed as balance knobs)
pub mod consts {
    /// Wall inset used by beams (matches the combat bullet radius)
    pub const BULLET_RADIUS: f32 = 11.0;

    /// Projectile radius defaults
    pub const BASE_PROJECTILE_RADIUS: f32 = 7.0;
    pub const RADIUS_PER_DAMAGE: f32 = 0.4;
    pub const MAX_RADIUS_BONUS: f32 = 5.0;
    pub const COPY_RADIUS_SCALE: f32 = 0.6;
    pub const EXPLOSIVE_RADIUS_SCALE: f32 = 1.15;
    pub const PIERCE_RADIUS_SCALE: f32 = 0.9;

    /// Sub-step size as a fraction of projectile radius (anti-tunneling)
    pub const SUBSTEP_FRACTION: f32 = 0.8;
    /// Sub-step counts above this are logged as suspect velocities
    pub const SUBSTEP_WARN_THRESHOLD: u32 = 256;
    /// Push-out distance after resolving an enemy overlap
    pub const SEPARATION_EPSILON: f32 = 0.1;
    /// Projectiles this far below the arena are always destroyed
    pub const BELOW_ARENA_CULL: f32 = 50.0;

    /// Nested payload launch speed multiplier
    pub const NESTED_SPEED_BOOST: f32 = 1.1;
    /// Minimum nested payload speed before falling back to a straight-up launch
    pub const NESTED_MIN_SPEED: f32 = 2.0;
    pub const NESTED_FALLBACK_SPEED: f32 = 5.0;

    /// Angular step between scatter copies (radians)
    pub const SCATTER_ANGLE_STEP: f32 = 0.2;
    /// Delay between multicast follow-up shots (ticks)
    pub const MULTICAST_DELAY: f32 = 20.0;

    /// Beam range: base + per pierce level
    pub const BEAM_BASE_LENGTH: f32 = 500.0;
    pub const BEAM_LENGTH_PER_PIERCE: f32 = 250.0;
    /// Shielded enemy reflector padding
    pub const SHIELD_PADDING: f32 = 5.0;
    /// Beam half-width for penetration tests
    pub const BEAM_HALF_WIDTH: f32 = 5.0;
    pub const EXPLOSIVE_BEAM_HALF_WIDTH: f32 = 15.0;
    /// Reflectors closer than this are the surface the ray just left
    pub const RAY_EPSILON: f32 = 1e-3;

    /// Display position catch-up speed (units per tick)
    pub const ENEMY_DROP_SPEED: f32 = 3.0;
    /// Display offset beyond which an enemy counts as still animating
    pub const ANIMATION_TOLERANCE: f32 = 1.0;
    /// Hit flash duration (ticks)
    pub const HIT_FLASH_TICKS: f32 = 10.0;
    /// Occupancy tests shrink both boxes by this margin
    pub const OCCUPANCY_MARGIN: f32 = 2.0;
}

/// Rotate a vector by `angle` radians
#[inline]
pub fn rotate(v: Vec2, angle: f32) -> Vec2 {
    Vec2::from_angle(angle).rotate(v)
}

/// Round to one decimal place (score multiplier bookkeeping)
#[inline]
pub fn round_tenth(value: f32) -> f32 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotate_quarter_turn() {
        let v = rotate(Vec2::new(1.0, 0.0), std::f32::consts::FRAC_PI_2);
        assert!(v.x.abs() < 1e-5);
        assert!((v.y - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_round_tenth() {
        assert_eq!(round_tenth(1.2000001), 1.2);
        assert_eq!(round_tenth(1.0 + 0.2 + 0.2), 1.4);
    }
}
