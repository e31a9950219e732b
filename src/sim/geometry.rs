//! Geometry helpers for sweep collisions
//!
//! Distances between swept segments and token diamonds, horizontal spans,
//! and the quadratic solve used to derive jump timings.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Tolerance for boundary-inclusive contact tests
pub const CONTACT_EPSILON: f32 = 1e-3;

/// Closed horizontal interval
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub min: f32,
    pub max: f32,
}

impl Span {
    pub fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Inclusive containment
    #[inline]
    pub fn contains(&self, x: f32) -> bool {
        x >= self.min && x <= self.max
    }

    /// Empty space between two spans (0 if they overlap)
    #[inline]
    pub fn gap(&self, other: &Span) -> f32 {
        (other.min - self.max).max(self.min - other.max).max(0.0)
    }

    #[inline]
    pub fn overlaps(&self, other: &Span) -> bool {
        self.min <= other.max && other.min <= self.max
    }

    #[inline]
    pub fn center(&self) -> f32 {
        (self.min + self.max) / 2.0
    }
}

/// Axis-aligned box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    /// Bounding box of a segment grown by `radius`
    pub fn swept(a: Vec2, b: Vec2, radius: f32) -> Self {
        Self {
            min: a.min(b) - Vec2::splat(radius),
            max: a.max(b) + Vec2::splat(radius),
        }
    }

    #[inline]
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x
            && other.min.x <= self.max.x
            && self.min.y <= other.max.y
            && other.min.y <= self.max.y
    }
}

/// Rhombus with axis-aligned diagonals (the token outline)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Diamond {
    pub center: Vec2,
    pub half_width: f32,
    pub half_height: f32,
}

impl Diamond {
    pub fn new(center: Vec2, width: f32, height: f32) -> Self {
        Self {
            center,
            half_width: width / 2.0,
            half_height: height / 2.0,
        }
    }

    /// Top, right, bottom, left
    pub fn vertices(&self) -> [Vec2; 4] {
        let c = self.center;
        [
            Vec2::new(c.x, c.y - self.half_height),
            Vec2::new(c.x + self.half_width, c.y),
            Vec2::new(c.x, c.y + self.half_height),
            Vec2::new(c.x - self.half_width, c.y),
        ]
    }

    pub fn bounds(&self) -> Aabb {
        let half = Vec2::new(self.half_width, self.half_height);
        Aabb {
            min: self.center - half,
            max: self.center + half,
        }
    }

    pub fn contains_point(&self, p: Vec2) -> bool {
        let d = (p - self.center).abs();
        d.x / self.half_width + d.y / self.half_height <= 1.0
    }

    /// Shortest distance from the segment `a→b` to the diamond (0 if they touch)
    pub fn distance_to_segment(&self, a: Vec2, b: Vec2) -> f32 {
        if self.contains_point(a) || self.contains_point(b) {
            return 0.0;
        }
        let v = self.vertices();
        (0..4)
            .map(|i| segment_segment_distance(a, b, v[i], v[(i + 1) % 4]))
            .fold(f32::MAX, f32::min)
    }

    pub fn distance_to_point(&self, p: Vec2) -> f32 {
        self.distance_to_segment(p, p)
    }
}

/// Distance from point `p` to segment `a→b`
pub fn segment_point_distance(a: Vec2, b: Vec2, p: Vec2) -> f32 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq == 0.0 {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}

#[inline]
fn cross(o: Vec2, a: Vec2, b: Vec2) -> f32 {
    (a - o).perp_dot(b - o)
}

/// Whether two closed segments share a point
pub fn segments_intersect(a: Vec2, b: Vec2, c: Vec2, d: Vec2) -> bool {
    let d1 = cross(c, d, a);
    let d2 = cross(c, d, b);
    let d3 = cross(a, b, c);
    let d4 = cross(a, b, d);

    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        return true;
    }

    // Collinear / touching cases
    let on_segment = |p: Vec2, q: Vec2, r: Vec2| {
        r.x >= p.x.min(q.x) && r.x <= p.x.max(q.x) && r.y >= p.y.min(q.y) && r.y <= p.y.max(q.y)
    };
    (d1 == 0.0 && on_segment(c, d, a))
        || (d2 == 0.0 && on_segment(c, d, b))
        || (d3 == 0.0 && on_segment(a, b, c))
        || (d4 == 0.0 && on_segment(a, b, d))
}

/// Shortest distance between segments `a→b` and `c→d`
pub fn segment_segment_distance(a: Vec2, b: Vec2, c: Vec2, d: Vec2) -> f32 {
    if segments_intersect(a, b, c, d) {
        return 0.0;
    }
    segment_point_distance(c, d, a)
        .min(segment_point_distance(c, d, b))
        .min(segment_point_distance(a, b, c))
        .min(segment_point_distance(a, b, d))
}

/// Larger real root of `ax² + bx + c = 0`, `None` if there is no real root.
///
/// A zero `a` degrades to the linear solution.
pub fn solve_quadratic(a: f64, b: f64, c: f64) -> Option<f64> {
    if a == 0.0 {
        return if b == 0.0 { None } else { Some(-c / b) };
    }
    let d = b * b - 4.0 * a * c;
    if d < 0.0 || !d.is_finite() {
        None
    } else if d == 0.0 {
        Some(-b / (2.0 * a))
    } else {
        let sqrt_d = d.sqrt();
        let x1 = (-b + sqrt_d) / (2.0 * a);
        let x2 = (-b - sqrt_d) / (2.0 * a);
        Some(x1.max(x2))
    }
}
