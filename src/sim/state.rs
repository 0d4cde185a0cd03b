//! Combat state and core simulation types
//!
//! `CombatWorld` owns every entity collection; subsystems receive it by
//! mutable reference. Enemy occupancy, collision and turn logic read only
//! `Enemy::logical_pos`; `display_pos` trails it for presentation.

use std::collections::{BTreeMap, VecDeque};

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::events::CombatEvent;
use super::flags::{Affix, AffixSet};
use super::geometry::Aabb;
use super::munition::MunitionProfile;
use super::scheduler::{Wavefront, WavefrontPhase};
use super::thermal::{self, ThermalState};
use crate::consts::*;
use crate::settings::CombatSettings;
use crate::round_tenth;

/// High-level combat phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CombatPhase {
    /// Waiting for the host to supply ammo
    Loadout,
    /// Ammo queued or in flight
    PlayerTurn,
    /// Wavefront sweeping and settling
    EnemyTurn,
    /// Defeat line crossed
    GameOver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnemyKind {
    Normal,
    /// Spawned with at least one affix
    Elite,
    Boss,
}

/// An enemy entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enemy {
    pub id: u32,
    pub kind: EnemyKind,
    /// Grid position used by all gameplay logic (center)
    pub logical_pos: Vec2,
    /// Animated position; catches up with `logical_pos` at a fixed rate
    pub display_pos: Vec2,
    pub size: Vec2,
    pub hp: f32,
    pub max_hp: f32,
    pub temperature: f32,
    pub affixes: AffixSet,
    pub active: bool,
    pub has_acted: bool,
    pub frozen_this_turn: bool,
    /// Hit flash ticks remaining
    #[serde(default)]
    pub hit_timer: f32,
}

impl Enemy {
    pub fn new(id: u32, pos: Vec2, size: Vec2, hp: f32) -> Self {
        let hp = hp.max(1.0);
        Self {
            id,
            kind: EnemyKind::Normal,
            logical_pos: pos,
            display_pos: pos,
            size,
            hp,
            max_hp: hp,
            temperature: 0.0,
            affixes: AffixSet::empty(),
            active: true,
            has_acted: false,
            frozen_this_turn: false,
            hit_timer: 0.0,
        }
    }

    pub fn with_affixes(mut self, affixes: &[Affix]) -> Self {
        self.affixes = AffixSet::from_slice(affixes);
        if !self.affixes.is_empty() && self.kind == EnemyKind::Normal {
            self.kind = EnemyKind::Elite;
        }
        self
    }

    #[inline]
    pub fn aabb(&self) -> Aabb {
        Aabb::from_center_size(self.logical_pos, self.size)
    }

    /// Lower edge of the logical box (+y is down)
    #[inline]
    pub fn bottom(&self) -> f32 {
        self.logical_pos.y + self.size.y * 0.5
    }

    #[inline]
    pub fn has(&self, affix: Affix) -> bool {
        self.affixes.contains(affix)
    }

    /// Subtract hit points; returns true if this hit killed the enemy
    ///
    /// Inactive enemies ignore further damage.
    pub fn take_damage(&mut self, amount: f32) -> bool {
        if !self.active {
            return false;
        }
        self.hp -= amount;
        self.hit_timer = HIT_FLASH_TICKS;
        if self.hp <= 0.0 {
            self.active = false;
            return true;
        }
        false
    }

    /// Heal up to max HP; returns the amount actually restored
    pub fn heal(&mut self, amount: f32) -> f32 {
        if !self.active || self.hp >= self.max_hp {
            return 0.0;
        }
        let before = self.hp;
        self.hp = (self.hp + amount).min(self.max_hp);
        self.hp - before
    }

    /// Additive temperature delta (no state transition is evaluated here)
    #[inline]
    pub fn apply_temperature(&mut self, delta: f32) {
        self.temperature += delta;
    }

    /// Move the display position toward the logical one
    pub fn animate(&mut self, ts: f32) {
        let step = ENEMY_DROP_SPEED * ts;
        self.display_pos.x = self.logical_pos.x;
        let dy = self.logical_pos.y - self.display_pos.y;
        if dy.abs() <= step {
            self.display_pos.y = self.logical_pos.y;
        } else {
            self.display_pos.y += step * dy.signum();
        }
        if self.hit_timer > 0.0 {
            self.hit_timer = (self.hit_timer - ts).max(0.0);
        }
    }

    #[inline]
    pub fn is_animating(&self) -> bool {
        (self.display_pos.y - self.logical_pos.y).abs() > ANIMATION_TOLERANCE
    }

    pub fn thermal_state(&self) -> ThermalState {
        thermal::classify(self.temperature, self.frozen_this_turn)
    }
}

/// A projectile in flight
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projectile {
    pub id: u32,
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub profile: MunitionProfile,
    /// Scatter-spawned copy (half damage, no payload release)
    pub is_copy: bool,
    pub pierce_left: u32,
    pub bounce_left: u32,
    /// Enemy id -> ticks until it may be damaged again
    pub hit_cooldowns: BTreeMap<u32, f32>,
    /// Enemies already struck by this projectile's lightning chains
    pub chain_history: Vec<u32>,
    /// Enemy this projectile is piercing; overlap with it never deflects
    pub phasing_through: Option<u32>,
    pub lifetime: f32,
    pub active: bool,
}

impl Projectile {
    pub fn new(
        id: u32,
        pos: Vec2,
        vel: Vec2,
        profile: MunitionProfile,
        is_copy: bool,
        lifetime: f32,
    ) -> Self {
        Self {
            id,
            pos,
            vel,
            radius: profile.projectile_radius(is_copy),
            pierce_left: profile.pierce,
            bounce_left: profile.bounce,
            profile,
            is_copy,
            hit_cooldowns: BTreeMap::new(),
            chain_history: Vec::new(),
            phasing_through: None,
            lifetime,
            active: true,
        }
    }

    /// Remaining pierce + bounce charges
    #[inline]
    pub fn durability(&self) -> u32 {
        self.pierce_left + self.bounce_left
    }
}

/// Queued shot waiting for its delay to elapse
#[derive(Debug, Clone)]
pub struct BurstShot {
    pub delay: f32,
    pub vel: Vec2,
    pub profile: MunitionProfile,
}

/// Projectile spawn buffered during a projectile pass
#[derive(Debug, Clone)]
pub struct SpawnRequest {
    pub pos: Vec2,
    pub vel: Vec2,
    pub profile: MunitionProfile,
}

/// Complete combat state (deterministic given seed, settings and inputs)
#[derive(Debug, Clone)]
pub struct CombatWorld {
    pub settings: CombatSettings,
    /// Run seed for reproducibility
    pub seed: u64,
    pub phase: CombatPhase,
    pub round: u32,
    pub score: u64,
    pub score_multiplier: f32,
    pub round_damage: f32,
    pub prev_round_damage: f32,
    /// HP multiplier applied to the next spawned rows (perfect clear penalty)
    pub next_round_hp_multiplier: f32,
    pub skill_points: u32,
    /// Floor reflects projectiles instead of destroying them
    pub combat_wall: bool,
    /// Active enemies (append-only within a tick; swept at tick end)
    pub enemies: Vec<Enemy>,
    pub projectiles: Vec<Projectile>,
    pub ammo_queue: VecDeque<MunitionProfile>,
    pub burst_queue: Vec<BurstShot>,
    pub wavefront: Wavefront,
    pub time_ticks: u64,
    /// Enemies spawned mid-pass, appended once the pass completes
    pub(crate) pending_enemies: Vec<Enemy>,
    /// A kill emptied the board; projectiles are cleared after the pass
    pub(crate) clear_requested: bool,
    pub events: Vec<CombatEvent>,
    pub rng: Pcg32,
    next_id: u32,
}

impl CombatWorld {
    /// Create an empty world (no enemies) with the given seed
    pub fn new(settings: CombatSettings, seed: u64) -> Self {
        Self {
            settings,
            seed,
            phase: CombatPhase::Loadout,
            round: 1,
            score: 0,
            score_multiplier: 1.0,
            round_damage: 0.0,
            prev_round_damage: 0.0,
            next_round_hp_multiplier: 1.0,
            skill_points: 0,
            combat_wall: false,
            enemies: Vec::new(),
            projectiles: Vec::new(),
            ammo_queue: VecDeque::new(),
            burst_queue: Vec::new(),
            wavefront: Wavefront::default(),
            time_ticks: 0,
            pending_enemies: Vec::new(),
            clear_requested: false,
            events: Vec::new(),
            rng: Pcg32::seed_from_u64(seed),
            next_id: 1,
        }
    }

    /// Create a world and populate the starting rows
    pub fn with_starting_rows(settings: CombatSettings, seed: u64) -> Self {
        let mut world = Self::new(settings, seed);
        super::spawn::populate_initial_rows(&mut world);
        world
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Enemy cell size from arena settings
    pub fn enemy_size(&self) -> Vec2 {
        Vec2::new(
            self.settings.arena.enemy_width(),
            self.settings.arena.enemy_height(),
        )
    }

    /// Launcher position (shots leave from here)
    pub fn launcher_pos(&self) -> Vec2 {
        let arena = &self.settings.arena;
        Vec2::new(arena.width * 0.5, arena.height - arena.launcher_offset)
    }

    /// Place a standard-sized enemy immediately; returns its id
    pub fn spawn_enemy(&mut self, pos: Vec2, hp: f32) -> u32 {
        let id = self.next_entity_id();
        let enemy = Enemy::new(id, pos, self.enemy_size(), hp);
        self.enemies.push(enemy);
        id
    }

    #[inline]
    pub fn enemy_index(&self, id: u32) -> Option<usize> {
        self.enemies.iter().position(|e| e.id == id)
    }

    pub fn enemy(&self, id: u32) -> Option<&Enemy> {
        self.enemies.iter().find(|e| e.id == id)
    }

    pub fn active_enemy_count(&self) -> usize {
        self.enemies.iter().filter(|e| e.active).count()
    }

    /// Buffer an enemy spawned while collections are being walked
    pub fn queue_enemy(&mut self, enemy: Enemy) {
        self.events.push(CombatEvent::EnemySpawned {
            id: enemy.id,
            pos: enemy.logical_pos,
        });
        self.pending_enemies.push(enemy);
    }

    pub(crate) fn flush_pending_enemies(&mut self) {
        if !self.pending_enemies.is_empty() {
            self.enemies.append(&mut self.pending_enemies);
        }
    }

    /// Award `floor(amount × multiplier)` and raise the multiplier
    pub fn add_score(&mut self, amount: f32) -> u64 {
        let gained = (amount * self.score_multiplier).floor().max(0.0) as u64;
        self.score += gained;
        self.score_multiplier =
            round_tenth(self.score_multiplier + self.settings.balance.score_multiplier_step);
        gained
    }

    pub fn reset_multiplier(&mut self) {
        self.score_multiplier = 1.0;
    }

    #[inline]
    pub fn record_damage(&mut self, amount: f32) {
        self.round_damage += amount;
    }

    #[inline]
    pub fn emit(&mut self, event: CombatEvent) {
        self.events.push(event);
    }

    /// Take all events produced since the last drain
    pub fn drain_events(&mut self) -> Vec<CombatEvent> {
        std::mem::take(&mut self.events)
    }

    /// Drop projectiles and queued shots (board wipe or perfect clear)
    pub fn clear_projectiles(&mut self) {
        self.projectiles.clear();
        self.burst_queue.clear();
    }

    /// True when nothing the player fired is still pending
    pub fn player_munitions_exhausted(&self) -> bool {
        self.ammo_queue.is_empty() && self.projectiles.is_empty() && self.burst_queue.is_empty()
    }

    /// Remove inactive enemies (never called while enemies are being walked)
    pub(crate) fn sweep_enemies(&mut self) {
        self.enemies.retain(|e| e.active);
    }

    /// Read-only view for the host
    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot {
            phase: self.phase,
            round: self.round,
            score: self.score,
            score_multiplier: self.score_multiplier,
            scan_y: (self.wavefront.phase == WavefrontPhase::Scanning)
                .then_some(self.wavefront.scan_y),
            ammo_remaining: self.ammo_queue.len(),
            enemies: self
                .enemies
                .iter()
                .filter(|e| e.active)
                .map(|e| EnemyView {
                    id: e.id,
                    kind: e.kind,
                    logical_pos: e.logical_pos,
                    display_pos: e.display_pos,
                    hp: e.hp,
                    max_hp: e.max_hp,
                    temperature: e.temperature,
                    thermal: e.thermal_state(),
                    affixes: e.affixes,
                })
                .collect(),
            projectiles: self
                .projectiles
                .iter()
                .filter(|p| p.active)
                .map(|p| ProjectileView {
                    id: p.id,
                    pos: p.pos,
                    vel: p.vel,
                    radius: p.radius,
                    is_copy: p.is_copy,
                    pierce_left: p.pierce_left,
                    bounce_left: p.bounce_left,
                    profile: p.profile.clone(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemyView {
    pub id: u32,
    pub kind: EnemyKind,
    pub logical_pos: Vec2,
    pub display_pos: Vec2,
    pub hp: f32,
    pub max_hp: f32,
    pub temperature: f32,
    pub thermal: ThermalState,
    pub affixes: AffixSet,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectileView {
    pub id: u32,
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub is_copy: bool,
    pub pierce_left: u32,
    pub bounce_left: u32,
    pub profile: MunitionProfile,
}

/// Serializable read-only snapshot of the world
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub phase: CombatPhase,
    pub round: u32,
    pub score: u64,
    pub score_multiplier: f32,
    /// Scan-line coordinate while the wavefront is sweeping
    pub scan_y: Option<f32>,
    pub ammo_remaining: usize,
    pub enemies: Vec<EnemyView>,
    pub projectiles: Vec<ProjectileView>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world() -> CombatWorld {
        CombatWorld::new(CombatSettings::default(), 7)
    }

    #[test]
    fn test_entity_ids_are_monotonic() {
        let mut w = world();
        let a = w.next_entity_id();
        let b = w.next_entity_id();
        assert!(b > a);
    }

    #[test]
    fn test_take_damage_deactivates_at_zero() {
        let mut w = world();
        let id = w.spawn_enemy(Vec2::new(50.0, 80.0), 5.0);
        let idx = w.enemy_index(id).unwrap();
        let e = &mut w.enemies[idx];
        assert!(!e.take_damage(4.0));
        assert!(e.take_damage(1.0));
        assert!(!e.active);
        // Already resolved: no-op
        assert!(!e.take_damage(10.0));
        assert_eq!(e.hp, 0.0);
    }

    #[test]
    fn test_heal_is_clamped() {
        let mut e = Enemy::new(1, Vec2::ZERO, Vec2::splat(100.0), 10.0);
        e.hp = 8.0;
        assert_eq!(e.heal(5.0), 2.0);
        assert_eq!(e.hp, e.max_hp);
        assert_eq!(e.heal(5.0), 0.0);
    }

    #[test]
    fn test_score_multiplier_steps() {
        let mut w = world();
        assert_eq!(w.add_score(10.0), 10);
        assert_eq!(w.score_multiplier, 1.2);
        assert_eq!(w.add_score(10.0), 12);
        assert_eq!(w.score_multiplier, 1.4);
        assert_eq!(w.score, 22);
        w.reset_multiplier();
        assert_eq!(w.score_multiplier, 1.0);
    }

    #[test]
    fn test_display_position_catches_up() {
        let mut e = Enemy::new(1, Vec2::new(50.0, 80.0), Vec2::splat(100.0), 3.0);
        e.logical_pos.y += 10.0;
        assert!(e.is_animating());
        for _ in 0..3 {
            e.animate(1.0);
        }
        assert!(!e.is_animating());
        e.animate(1.0);
        assert_eq!(e.display_pos, e.logical_pos);
    }

    #[test]
    fn test_queued_enemies_flush_after_pass() {
        let mut w = world();
        let id = w.next_entity_id();
        let size = w.enemy_size();
        w.queue_enemy(Enemy::new(id, Vec2::new(50.0, 80.0), size, 3.0));
        assert!(w.enemies.is_empty());
        w.flush_pending_enemies();
        assert_eq!(w.enemies.len(), 1);
        assert!(matches!(
            w.drain_events().as_slice(),
            [CombatEvent::EnemySpawned { .. }]
        ));
    }

    #[test]
    fn test_snapshot_serializes() {
        let mut w = world();
        w.spawn_enemy(Vec2::new(50.0, 80.0), 3.0);
        let snap = w.snapshot();
        assert_eq!(snap.enemies.len(), 1);
        assert!(snap.scan_y.is_none());
        let json = serde_json::to_string(&snap).unwrap();
        let back: WorldSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snap);
    }
}
