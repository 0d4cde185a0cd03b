//! Compact capability sets
//!
//! Enemy affixes and munition facets are small closed enums; both are stored
//! as a one-byte bitset so each capability can be tested independently.

use std::fmt;
use std::marker::PhantomData;

use serde::{Deserialize, Serialize};

/// An enum usable as a member of a [`FlagSet`]
pub trait Flag: Copy + fmt::Debug + 'static {
    /// Every variant, in bit order
    const ALL: &'static [Self];

    fn bit(self) -> u8;
}

/// Set of flags packed into a single byte
#[derive(Serialize, Deserialize)]
#[serde(transparent, bound = "")]
pub struct FlagSet<T: Flag> {
    bits: u8,
    #[serde(skip)]
    _marker: PhantomData<T>,
}

impl<T: Flag> FlagSet<T> {
    pub const fn empty() -> Self {
        Self {
            bits: 0,
            _marker: PhantomData,
        }
    }

    pub fn from_slice(flags: &[T]) -> Self {
        let mut set = Self::empty();
        for &flag in flags {
            set.insert(flag);
        }
        set
    }

    #[inline]
    pub fn contains(&self, flag: T) -> bool {
        self.bits & flag.bit() != 0
    }

    /// Insert a flag, returning true if it was not already present
    #[inline]
    pub fn insert(&mut self, flag: T) -> bool {
        let added = !self.contains(flag);
        self.bits |= flag.bit();
        added
    }

    #[inline]
    pub fn remove(&mut self, flag: T) {
        self.bits &= !flag.bit();
    }

    #[inline]
    pub fn union(self, other: Self) -> Self {
        Self {
            bits: self.bits | other.bits,
            _marker: PhantomData,
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bits == 0
    }

    pub fn len(&self) -> usize {
        self.bits.count_ones() as usize
    }

    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        T::ALL.iter().copied().filter(|f| self.contains(*f))
    }
}

// Manual impls: derives would require `T: Clone`/`T: PartialEq` bounds on the marker.
impl<T: Flag> Clone for FlagSet<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: Flag> Copy for FlagSet<T> {}

impl<T: Flag> Default for FlagSet<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T: Flag> PartialEq for FlagSet<T> {
    fn eq(&self, other: &Self) -> bool {
        self.bits == other.bits
    }
}

impl<T: Flag> Eq for FlagSet<T> {}

impl<T: Flag> fmt::Debug for FlagSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<T: Flag> FromIterator<T> for FlagSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = Self::empty();
        for flag in iter {
            set.insert(flag);
        }
        set
    }
}

/// Behavioral capability attached to an enemy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Affix {
    /// Reflects beams and takes beam damage only as a direct hit
    Shield,
    /// Acts twice per turn
    Haste,
    /// Heals itself each action
    Regen,
    /// May spawn weakened copies when hit or on its turn
    Clone,
    /// May act twice while heated
    Berserk,
    /// Heals nearby enemies each action
    Healer,
    /// May absorb a neighbor
    Devour,
    /// Leaps over a blocked cell
    Jump,
}

impl Flag for Affix {
    const ALL: &'static [Self] = &[
        Affix::Shield,
        Affix::Haste,
        Affix::Regen,
        Affix::Clone,
        Affix::Berserk,
        Affix::Healer,
        Affix::Devour,
        Affix::Jump,
    ];

    #[inline]
    fn bit(self) -> u8 {
        1 << self as u8
    }
}

/// Affixes that may roll on freshly spawned enemies (berserk is never rolled)
pub const ROLLABLE_AFFIXES: [Affix; 7] = [
    Affix::Shield,
    Affix::Haste,
    Affix::Regen,
    Affix::Clone,
    Affix::Healer,
    Affix::Devour,
    Affix::Jump,
];

/// Independent elemental/behavioral facet of a munition profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Facet {
    Cryo,
    Pyro,
    Lightning,
    Explosive,
    Beam,
    /// Carries a nested payload released on destruction
    Nested,
}

impl Flag for Facet {
    const ALL: &'static [Self] = &[
        Facet::Cryo,
        Facet::Pyro,
        Facet::Lightning,
        Facet::Explosive,
        Facet::Beam,
        Facet::Nested,
    ];

    #[inline]
    fn bit(self) -> u8 {
        1 << self as u8
    }
}

pub type AffixSet = FlagSet<Affix>;
pub type FacetSet = FlagSet<Facet>;
