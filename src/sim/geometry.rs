//! Geometry utilities
//!
//! Pure functions over axis-aligned boxes, rays and segments. Coordinates use
//! the canvas convention: +y points down, the arena top is y = 0.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self {
            min: min.min(max),
            max: max.max(min),
        }
    }

    pub fn from_center_size(center: Vec2, size: Vec2) -> Self {
        let half = size * 0.5;
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// Box swept by a circle moving from `from` to `to`
    pub fn swept_circle(from: Vec2, to: Vec2, radius: f32) -> Self {
        Self {
            min: from.min(to) - Vec2::splat(radius),
            max: from.max(to) + Vec2::splat(radius),
        }
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    #[inline]
    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    /// Grow (or shrink, for negative `amount`) on every side
    pub fn expand(&self, amount: f32) -> Self {
        Self {
            min: self.min - Vec2::splat(amount),
            max: self.max + Vec2::splat(amount),
        }
    }

    /// Strict overlap test (touching edges do not intersect)
    #[inline]
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
    }

    #[inline]
    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    /// Penetration depth on each axis (non-positive components mean no overlap)
    pub fn overlap(&self, other: &Aabb) -> Vec2 {
        Vec2::new(
            self.max.x.min(other.max.x) - self.min.x.max(other.min.x),
            self.max.y.min(other.max.y) - self.min.y.max(other.min.y),
        )
    }
}

/// Coordinate axis, used for surface normals of axis-aligned reflectors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
}

/// Mirror `v` across a surface whose normal lies along `axis`
#[inline]
pub fn reflect_axis(v: Vec2, axis: Axis) -> Vec2 {
    match axis {
        Axis::X => Vec2::new(-v.x, v.y),
        Axis::Y => Vec2::new(v.x, -v.y),
    }
}

/// Axis of minimum penetration between two overlapping boxes
///
/// Ties resolve to Y (rows of enemies are mostly struck from below).
pub fn min_penetration_axis(overlap: Vec2) -> Axis {
    if overlap.x < overlap.y { Axis::X } else { Axis::Y }
}

/// Ray vs AABB slab test
///
/// Returns the entry distance along `dir` when the ray starts outside the box
/// and enters it ahead of the origin. A zero direction component only
/// intersects if the origin already lies within that slab.
pub fn ray_aabb_intersection(start: Vec2, dir: Vec2, aabb: &Aabb) -> Option<f32> {
    let mut tmin = f32::NEG_INFINITY;
    let mut tmax = f32::INFINITY;

    for (s, d, lo, hi) in [
        (start.x, dir.x, aabb.min.x, aabb.max.x),
        (start.y, dir.y, aabb.min.y, aabb.max.y),
    ] {
        if d != 0.0 {
            let t1 = (lo - s) / d;
            let t2 = (hi - s) / d;
            tmin = tmin.max(t1.min(t2));
            tmax = tmax.min(t1.max(t2));
        } else if s < lo || s > hi {
            return None;
        }
    }

    if tmax >= tmin && tmin >= 0.0 {
        Some(tmin)
    } else {
        None
    }
}

/// Distance from `p` to segment `a`-`b` and the closest point on the segment
///
/// Degenerate (zero-length) segments return `None`.
pub fn point_segment_distance(p: Vec2, a: Vec2, b: Vec2) -> Option<(f32, Vec2)> {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq == 0.0 {
        return None;
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    let closest = a + ab * t;
    Some((p.distance(closest), closest))
}
