//! Munition profiles ("recipes")
//!
//! A profile is built once per shot by the loadout collaborator and read by
//! the combat core. Raw levels arrive as signed integers and are clamped to
//! zero at this boundary.

use serde::{Deserialize, Serialize};

use super::flags::{Facet, FacetSet};
use crate::consts::*;

/// Raw, unvalidated levels as produced by the loadout front end
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecipeLevels {
    pub damage: f32,
    pub bounce: i32,
    pub pierce: i32,
    pub scatter: i32,
    pub cryo: i32,
    pub pyro: i32,
    pub lightning: i32,
    pub laser: i32,
    pub multicast: i32,
    pub explosive: bool,
    pub beam: bool,
    /// Matryoshka: capture the next queued profile as a nested payload
    pub nested: bool,
}

/// Validated munition profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MunitionProfile {
    pub damage: f32,
    pub bounce: u32,
    pub pierce: u32,
    pub scatter: u32,
    pub cryo: u32,
    pub pyro: u32,
    pub lightning: u32,
    pub laser: u32,
    pub multicast: u32,
    pub facets: FacetSet,
    /// Profile released when this projectile is destroyed
    pub nested_payload: Option<Box<MunitionProfile>>,
}

impl Default for MunitionProfile {
    fn default() -> Self {
        Self {
            damage: 2.0,
            bounce: 0,
            pierce: 0,
            scatter: 0,
            cryo: 0,
            pyro: 0,
            lightning: 0,
            laser: 0,
            multicast: 0,
            facets: FacetSet::empty(),
            nested_payload: None,
        }
    }
}

#[inline]
fn level(raw: i32) -> u32 {
    raw.max(0) as u32
}

impl MunitionProfile {
    /// Build a profile from raw levels, clamping negatives to zero
    pub fn from_levels(raw: &RecipeLevels) -> Self {
        let damage = if raw.damage.is_finite() {
            raw.damage.max(0.0)
        } else {
            0.0
        };
        let mut profile = Self {
            damage,
            bounce: level(raw.bounce),
            pierce: level(raw.pierce),
            scatter: level(raw.scatter),
            cryo: level(raw.cryo),
            pyro: level(raw.pyro),
            lightning: level(raw.lightning),
            laser: level(raw.laser),
            multicast: level(raw.multicast),
            facets: FacetSet::empty(),
            nested_payload: None,
        };
        if raw.explosive {
            profile.facets.insert(Facet::Explosive);
        }
        if raw.beam {
            profile.facets.insert(Facet::Beam);
        }
        if raw.nested {
            profile.facets.insert(Facet::Nested);
        }
        profile.refresh_facets();
        profile
    }

    /// Re-derive elemental facets from levels (after a level buff)
    pub fn refresh_facets(&mut self) {
        for (facet, lvl) in [
            (Facet::Cryo, self.cryo),
            (Facet::Pyro, self.pyro),
            (Facet::Lightning, self.lightning),
        ] {
            if lvl > 0 {
                self.facets.insert(facet);
            } else {
                self.facets.remove(facet);
            }
        }
    }

    #[inline]
    pub fn has(&self, facet: Facet) -> bool {
        self.facets.contains(facet)
    }

    #[inline]
    pub fn is_beam(&self) -> bool {
        self.has(Facet::Beam)
    }

    #[inline]
    pub fn is_explosive(&self) -> bool {
        self.has(Facet::Explosive)
    }

    /// Collision radius; grows with damage up to a cap
    pub fn projectile_radius(&self, is_copy: bool) -> f32 {
        let mut r = BASE_PROJECTILE_RADIUS
            + ((self.damage - 2.0) * RADIUS_PER_DAMAGE).min(MAX_RADIUS_BONUS);
        if is_copy {
            r *= COPY_RADIUS_SCALE;
        }
        if self.is_explosive() {
            r *= EXPLOSIVE_RADIUS_SCALE;
        }
        if self.pierce > 0 {
            r *= PIERCE_RADIUS_SCALE;
        }
        r.max(1.0)
    }

    /// Visual beam width reported with a beam trace
    pub fn beam_width(&self) -> f32 {
        3.0 + self.laser as f32 * 4.0 + if self.is_explosive() { 10.0 } else { 0.0 }
    }

    pub fn max_beam_length(&self) -> f32 {
        BEAM_BASE_LENGTH + self.pierce as f32 * BEAM_LENGTH_PER_PIERCE
    }

    /// Half-width used when testing enemies against a beam segment
    pub fn beam_half_width(&self) -> f32 {
        if self.is_explosive() {
            EXPLOSIVE_BEAM_HALF_WIDTH
        } else {
            BEAM_HALF_WIDTH
        }
    }

    /// Profile carried by scatter copies: no further scatter, no payload
    pub fn scatter_copy(&self) -> Self {
        let mut copy = self.clone();
        copy.scatter = 0;
        copy.nested_payload = None;
        copy.facets.remove(Facet::Nested);
        copy
    }
}

/// Angular offset of the `i`-th scatter copy (1-based): +0.2, -0.2, +0.4, ...
pub fn scatter_offset(i: u32) -> f32 {
    let sign = if i % 2 == 0 { -1.0 } else { 1.0 };
    SCATTER_ANGLE_STEP * i.div_ceil(2) as f32 * sign
}
