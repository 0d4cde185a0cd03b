//! Combat balance settings
//!
//! Loaded once at world creation. Every knob has a default matching the
//! shipped balance; JSON overrides may specify any subset of fields.

use serde::{Deserialize, Serialize};

/// Arena geometry and row layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaSettings {
    pub width: f32,
    pub height: f32,
    /// Number of enemy columns (enemy width = width / columns)
    pub enemy_cols: u32,
    /// Rows populated at game start
    pub start_rows: u32,
    /// Minimum enemies per spawned row (before round scaling)
    pub spawn_min: u32,
    /// Logical y of the first enemy row
    pub enemy_start_y: f32,
    /// Distance of the defeat line above the bottom edge
    pub defeat_margin: f32,
    /// Distance of the launcher above the bottom edge
    pub launcher_offset: f32,
}

impl Default for ArenaSettings {
    fn default() -> Self {
        Self {
            width: 600.0,
            height: 900.0,
            enemy_cols: 6,
            start_rows: 4,
            spawn_min: 3,
            enemy_start_y: 80.0,
            defeat_margin: 120.0,
            launcher_offset: 80.0,
        }
    }
}

impl ArenaSettings {
    #[inline]
    pub fn enemy_width(&self) -> f32 {
        self.width / self.enemy_cols.max(1) as f32
    }

    /// Enemies are square
    #[inline]
    pub fn enemy_height(&self) -> f32 {
        self.enemy_width()
    }

    #[inline]
    pub fn defeat_line_y(&self) -> f32 {
        self.height - self.defeat_margin
    }
}

/// Damage, elemental and scoring knobs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BalanceSettings {
    // === Enemy scaling ===
    pub enemy_base_hp: f32,
    pub enemy_hp_per_round: f32,
    pub spawn_prob: f32,
    pub affix_base_chance: f32,
    pub affix_round_growth: f32,
    /// Affixes only roll after this round
    pub affix_min_round: u32,
    /// Chance an elite is promoted to a boss (only after `boss_min_round`)
    pub boss_chance: f32,
    pub boss_min_round: u32,
    pub boss_hp_mult: f32,

    // === Elemental deltas ===
    pub cryo_amount: f32,
    pub pyro_amount: f32,
    pub lightning_temp_increase: f32,

    // === Hit resolution ===
    /// Damage multiplier for scatter copies
    pub copy_damage_mult: f32,
    /// Ticks before the same projectile may damage the same enemy again
    pub hit_cooldown_ticks: f32,
    /// Ticks before a projectile expires regardless of position
    pub projectile_lifetime_ticks: f32,

    // === Burn spread (killed while burning) ===
    pub fire_spread_radius: f32,
    pub fire_spread_damage_percent: f32,
    pub fire_spread_temp_increase: f32,

    // === Explosive AOE ===
    pub explosive_radius: f32,
    pub explosive_damage_mult: f32,
    /// Temperature per lightning level applied by explosions (before halving)
    pub explosive_lightning_temp: f32,

    // === Lightning chain ===
    pub lightning_chain_radius: f32,
    pub lightning_base_chance: f32,
    /// Extra chain chance per degree below zero
    pub lightning_cold_bonus: f32,

    // === Clone affix ===
    pub clone_chance_hit: f32,
    pub clone_hp_fraction: f32,

    // === Scoring ===
    pub score_multiplier_step: f32,
    pub unused_ammo_score_mult: f32,
    pub next_round_difficulty_mult: f32,
}

impl Default for BalanceSettings {
    fn default() -> Self {
        Self {
            enemy_base_hp: 2.0,
            enemy_hp_per_round: 7.0,
            spawn_prob: 0.6,
            affix_base_chance: 0.05,
            affix_round_growth: 0.05,
            affix_min_round: 3,
            boss_chance: 0.05,
            boss_min_round: 5,
            boss_hp_mult: 42.0,

            cryo_amount: 1.0,
            pyro_amount: 1.0,
            lightning_temp_increase: 3.0,

            copy_damage_mult: 0.5,
            hit_cooldown_ticks: 42.0,
            projectile_lifetime_ticks: 60.0 * 15.0,

            fire_spread_radius: 100.0,
            fire_spread_damage_percent: 0.25,
            fire_spread_temp_increase: 50.0,

            explosive_radius: 100.0,
            explosive_damage_mult: 0.5,
            explosive_lightning_temp: 10.0,

            lightning_chain_radius: 150.0,
            lightning_base_chance: 0.15,
            lightning_cold_bonus: 0.0085,

            clone_chance_hit: 0.2,
            clone_hp_fraction: 0.2,

            score_multiplier_step: 0.2,
            unused_ammo_score_mult: 1.5,
            next_round_difficulty_mult: 12.0,
        }
    }
}

/// Enemy affix behavior knobs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AffixSettings {
    pub haste_actions: u32,
    pub regen_percent: f32,
    pub clone_chance_turn: f32,
    pub berserk_chance_mult: f32,
    pub healer_percent: f32,
    /// Healing range in enemy widths
    pub healer_range: f32,
    pub devour_chance: f32,
    /// Devour range in enemy widths
    pub devour_range: f32,
    pub jump_rows: u32,
}

impl Default for AffixSettings {
    fn default() -> Self {
        Self {
            haste_actions: 2,
            regen_percent: 0.1,
            clone_chance_turn: 0.2,
            berserk_chance_mult: 0.5,
            healer_percent: 0.1,
            healer_range: 1.5,
            devour_chance: 0.5,
            devour_range: 1.2,
            jump_rows: 2,
        }
    }
}

/// Wavefront scan-line knobs (speeds in units per tick at time scale 1.0)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanSettings {
    pub max_speed: f32,
    /// Minimum "confirmation" speed near an unresolved enemy
    pub confirm_speed: f32,
    /// Speed used when no enemies remain
    pub clear_speed: f32,
    pub slow_down_range: f32,
    pub stop_range: f32,
    /// Forced confirmation-speed ticks after an enemy resolves
    pub momentum_ticks: f32,
    /// Scan starts this far below the arena
    pub start_offset: f32,
    /// Scan ends this far above the arena
    pub exit_margin: f32,
    /// Below `height - defense_zone` the line always travels at full speed
    pub defense_zone: f32,
    /// Enemies whose bottom is within this distance past the line still count as ahead
    pub lookahead: f32,
    pub behind_tolerance: f32,
    /// Ticks with no enemy animating before the round finalizes
    pub settle_ticks: f32,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            max_speed: 25.0,
            confirm_speed: 3.0,
            clear_speed: 12.0,
            slow_down_range: 150.0,
            stop_range: 10.0,
            momentum_ticks: 45.0,
            start_offset: 50.0,
            exit_margin: 50.0,
            defense_zone: 100.0,
            lookahead: 50.0,
            behind_tolerance: 20.0,
            settle_ticks: 80.0,
        }
    }
}

/// All combat settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatSettings {
    pub arena: ArenaSettings,
    pub balance: BalanceSettings,
    pub affixes: AffixSettings,
    pub scan: ScanSettings,
}

impl CombatSettings {
    /// Parse settings from JSON (missing fields keep their defaults)
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<Self>(json).map(Self::sanitized)
    }

    /// Parse settings, falling back to defaults on malformed input
    pub fn load_or_default(json: &str) -> Self {
        match Self::from_json(json) {
            Ok(settings) => {
                log::info!("Loaded combat settings");
                settings
            }
            Err(e) => {
                log::warn!("Invalid combat settings ({e}), using defaults");
                Self::default()
            }
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Clamp knobs that would stall or invert the simulation
    pub fn sanitized(mut self) -> Self {
        let arena = &mut self.arena;
        if arena.enemy_cols == 0 {
            log::warn!("enemy_cols must be > 0, using 1");
            arena.enemy_cols = 1;
        }
        if arena.width <= 0.0 || arena.height <= 0.0 {
            log::warn!("Arena must have positive size, using defaults");
            let defaults = ArenaSettings::default();
            arena.width = defaults.width;
            arena.height = defaults.height;
        }

        let scan = &mut self.scan;
        if scan.confirm_speed <= 0.0 {
            log::warn!("confirm_speed must be > 0, using default");
            scan.confirm_speed = ScanSettings::default().confirm_speed;
        }
        scan.max_speed = scan.max_speed.max(scan.confirm_speed);
        scan.clear_speed = scan.clear_speed.max(scan.confirm_speed);
        scan.slow_down_range = scan.slow_down_range.max(scan.stop_range);

        let balance = &mut self.balance;
        for (name, p) in [
            ("spawn_prob", &mut balance.spawn_prob),
            ("lightning_base_chance", &mut balance.lightning_base_chance),
            ("clone_chance_hit", &mut balance.clone_chance_hit),
            ("boss_chance", &mut balance.boss_chance),
        ] {
            if !(0.0..=1.0).contains(&*p) {
                log::warn!("{name} out of range ({p}), clamping to [0, 1]");
                *p = p.clamp(0.0, 1.0);
            }
        }
        balance.hit_cooldown_ticks = balance.hit_cooldown_ticks.max(0.0);

        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let settings =
            CombatSettings::from_json(r#"{ "balance": { "cryo_amount": 4.0 } }"#).unwrap();
        assert_eq!(settings.balance.cryo_amount, 4.0);
        assert_eq!(settings.balance.pyro_amount, 1.0);
        assert_eq!(settings.arena, ArenaSettings::default());
    }

    #[test]
    fn test_invalid_json_falls_back() {
        let settings = CombatSettings::load_or_default("{ not json");
        assert_eq!(settings, CombatSettings::default());
    }

    #[test]
    fn test_sanitize_clamps_probabilities() {
        let settings = CombatSettings::from_json(
            r#"{ "balance": { "lightning_base_chance": 3.0 }, "arena": { "enemy_cols": 0 } }"#,
        )
        .unwrap();
        assert_eq!(settings.balance.lightning_base_chance, 1.0);
        assert_eq!(settings.arena.enemy_cols, 1);
    }

    #[test]
    fn test_json_roundtrip() {
        let settings = CombatSettings::default();
        let json = settings.to_json().unwrap();
        assert_eq!(CombatSettings::from_json(&json).unwrap(), settings);
    }

    #[test]
    fn test_enemy_cell_size() {
        let arena = ArenaSettings::default();
        assert_eq!(arena.enemy_width(), 100.0);
        assert_eq!(arena.enemy_height(), 100.0);
        assert_eq!(arena.defeat_line_y(), 780.0);
    }
}
