//! Elemental status model
//!
//! Temperature is a signed scalar per enemy. Hits only add deltas to it; the
//! state transitions below run once per enemy turn.

use serde::{Deserialize, Serialize};

use super::state::Enemy;

/// Below this temperature a freeze may trigger
pub const FREEZE_THRESHOLD: f32 = -50.0;
/// At or above this temperature the enemy burns
pub const BURN_THRESHOLD: f32 = 100.0;
/// Flat decay per turn while heating
pub const HEAT_DECAY: f32 = 5.0;
/// Base damage-over-time while burning
pub const BURN_BASE_DAMAGE: f32 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ThermalState {
    DeepFrozen,
    Cooling,
    Stable,
    Heating,
    Burning,
}

/// Classify a temperature (a triggered freeze counts as deep-frozen)
pub fn classify(temperature: f32, frozen: bool) -> ThermalState {
    if frozen || temperature <= -BURN_THRESHOLD {
        ThermalState::DeepFrozen
    } else if temperature < 0.0 {
        ThermalState::Cooling
    } else if temperature == 0.0 {
        ThermalState::Stable
    } else if temperature < BURN_THRESHOLD {
        ThermalState::Heating
    } else {
        ThermalState::Burning
    }
}

/// Freeze probability for a turn: `min(|T|, 100) / 200`, zero above -50
pub fn freeze_chance(temperature: f32) -> f32 {
    if temperature > FREEZE_THRESHOLD {
        return 0.0;
    }
    temperature.abs().min(100.0) / 200.0
}

/// Outcome of one turn's status resolution
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StatusTick {
    pub frozen: bool,
    /// Damage-over-time to apply (already subtracted from the enemy)
    pub burn_damage: f32,
    pub killed: bool,
}

/// Resolve temperature effects for an enemy's turn
///
/// `roll` is a uniform sample in `[0, 1)` used for the freeze check.
pub fn resolve_status_turn(enemy: &mut Enemy, roll: f32) -> StatusTick {
    let mut tick = StatusTick::default();
    if !enemy.active {
        return tick;
    }

    if enemy.temperature < 0.0 {
        tick.frozen = roll < freeze_chance(enemy.temperature);
        enemy.frozen_this_turn = tick.frozen;
        enemy.temperature = (enemy.temperature / 2.0).ceil();
    }

    if enemy.temperature > 0.0 {
        if enemy.temperature < BURN_THRESHOLD {
            enemy.temperature = (enemy.temperature - HEAT_DECAY).max(0.0);
        } else {
            let dot = BURN_BASE_DAMAGE + (enemy.temperature - BURN_THRESHOLD);
            tick.burn_damage = dot;
            tick.killed = enemy.take_damage(dot);
            let decay = (enemy.temperature / 20.0).floor();
            enemy.temperature = (enemy.temperature - decay).max(0.0);
        }
    }

    tick
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;
    use proptest::prelude::*;

    fn enemy(temperature: f32, hp: f32) -> Enemy {
        let mut e = Enemy::new(1, Vec2::new(50.0, 80.0), Vec2::splat(100.0), hp);
        e.temperature = temperature;
        e
    }

    #[test]
    fn test_three_pyro_hits_then_decay() {
        let mut e = enemy(0.0, 20.0);
        for _ in 0..3 {
            e.apply_temperature(1.0);
        }
        assert_eq!(e.temperature, 3.0);
        let tick = resolve_status_turn(&mut e, 0.99);
        assert_eq!(e.temperature, 0.0);
        assert_eq!(tick.burn_damage, 0.0);
        assert_eq!(e.hp, 20.0);
    }

    #[test]
    fn test_burning_damage_and_decay() {
        let mut e = enemy(150.0, 100.0);
        let tick = resolve_status_turn(&mut e, 0.99);
        assert_eq!(tick.burn_damage, 55.0);
        assert_eq!(e.hp, 45.0);
        assert_eq!(e.temperature, 143.0);
        assert!(!tick.killed);
    }

    #[test]
    fn test_burn_can_kill() {
        let mut e = enemy(120.0, 10.0);
        let tick = resolve_status_turn(&mut e, 0.5);
        assert!(tick.killed);
        assert!(!e.active);
    }

    #[test]
    fn test_cold_halves_toward_zero() {
        let mut e = enemy(-7.0, 10.0);
        let tick = resolve_status_turn(&mut e, 0.0);
        // Above the freeze threshold: no freeze even with a zero roll
        assert!(!tick.frozen);
        assert_eq!(e.temperature, -3.0);
    }

    #[test]
    fn test_deep_cold_freezes_on_low_roll() {
        let mut e = enemy(-80.0, 10.0);
        let tick = resolve_status_turn(&mut e, 0.39);
        assert!(tick.frozen);
        assert!(e.frozen_this_turn);
        assert_eq!(e.temperature, -40.0);

        let mut e = enemy(-80.0, 10.0);
        let tick = resolve_status_turn(&mut e, 0.41);
        assert!(!tick.frozen);
        assert_eq!(e.temperature, -40.0);
    }

    #[test]
    fn test_cryo_pyro_round_trip() {
        let cryo_amount = 1.0;
        let mut e = enemy(12.0, 10.0);
        e.apply_temperature(-2.0 * cryo_amount);
        e.apply_temperature(2.0 * cryo_amount);
        assert_eq!(e.temperature, 12.0);
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify(-100.0, false), ThermalState::DeepFrozen);
        assert_eq!(classify(-20.0, true), ThermalState::DeepFrozen);
        assert_eq!(classify(-20.0, false), ThermalState::Cooling);
        assert_eq!(classify(0.0, false), ThermalState::Stable);
        assert_eq!(classify(99.0, false), ThermalState::Heating);
        assert_eq!(classify(100.0, false), ThermalState::Burning);
    }

    #[test]
    fn test_freeze_chance_caps_at_half() {
        assert_eq!(freeze_chance(-49.9), 0.0);
        assert_eq!(freeze_chance(-50.0), 0.25);
        assert_eq!(freeze_chance(-100.0), 0.5);
        assert_eq!(freeze_chance(-500.0), 0.5);
    }

    proptest! {
        #[test]
        fn test_freeze_chance_monotonic(a in -1000.0f32..-50.0, b in -1000.0f32..-50.0) {
            let (colder, warmer) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(freeze_chance(colder) >= freeze_chance(warmer));
        }

        #[test]
        fn test_no_freeze_above_threshold(t in -49.99f32..1000.0) {
            prop_assert_eq!(freeze_chance(t), 0.0);
        }
    }
}
