//! Math utilities and types
//!
//! Provides the 2D math types used by the spatial indices and gameplay code.

use serde::{Deserialize, Serialize};

pub use nalgebra::Vector2;

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 2D point type
pub type Point2 = nalgebra::Point2<f32>;

/// Canonical direction used when a direction vector degenerates to zero length
pub const DEFAULT_DIRECTION: Vec2 = Vec2::new(1.0, 0.0);

/// Normalize `v`, returning `fallback` when `v` has zero length or is not finite
pub fn normalize_or(v: Vec2, fallback: Vec2) -> Vec2 {
    let length = v.magnitude();
    if length > f32::EPSILON && length.is_finite() {
        v / length
    } else {
        fallback
    }
}

/// Normalize a direction vector, falling back to [`DEFAULT_DIRECTION`]
pub fn direction_or_default(v: Vec2) -> Vec2 {
    normalize_or(v, DEFAULT_DIRECTION)
}

/// Axis-aligned rectangle in world space.
///
/// Y grows downwards (screen convention), so the "top" of a rectangle is its
/// minimum y coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Minimum (top-left) corner
    pub min: Vec2,
    /// Maximum (bottom-right) corner
    pub max: Vec2,
}

impl Rect {
    /// Create a rectangle from two corners. Swapped corners are normalized.
    pub fn new(a: Vec2, b: Vec2) -> Self {
        Self {
            min: Vec2::new(a.x.min(b.x), a.y.min(b.y)),
            max: Vec2::new(a.x.max(b.x), a.y.max(b.y)),
        }
    }

    /// Create a rectangle from its top-left corner and size
    pub fn from_xywh(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self::new(Vec2::new(x, y), Vec2::new(x + width, y + height))
    }

    /// Create a rectangle centered on `center` with the given half extents
    pub fn from_center_half_extents(center: Vec2, half_extents: Vec2) -> Self {
        Self::new(center - half_extents, center + half_extents)
    }

    /// Square of side `2 * radius` centered on `center`
    pub fn around(center: Vec2, radius: f32) -> Self {
        Self::from_center_half_extents(center, Vec2::new(radius, radius))
    }

    /// Center point
    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// Width along x
    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    /// Height along y
    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    /// Overlap test. Touching edges count as overlapping.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }

    /// True when `other` lies entirely inside this rectangle (edges inclusive)
    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.min.x >= self.min.x
            && other.max.x <= self.max.x
            && other.min.y >= self.min.y
            && other.max.y <= self.max.y
    }

    /// True when `point` lies inside this rectangle (edges inclusive)
    pub fn contains_point(&self, point: Vec2) -> bool {
        point.x >= self.min.x && point.x <= self.max.x && point.y >= self.min.y && point.y <= self.max.y
    }

    /// Split into quadrants ordered top-left, top-right, bottom-left, bottom-right
    pub fn quadrants(&self) -> [Rect; 4] {
        let c = self.center();
        [
            Rect::new(self.min, c),
            Rect::new(Vec2::new(c.x, self.min.y), Vec2::new(self.max.x, c.y)),
            Rect::new(Vec2::new(self.min.x, c.y), Vec2::new(c.x, self.max.y)),
            Rect::new(c, self.max),
        ]
    }
}

impl Default for Rect {
    fn default() -> Self {
        Self::from_xywh(0.0, 0.0, 1024.0, 1024.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_zero_vector_falls_back() {
        let dir = direction_or_default(Vec2::zeros());
        assert_eq!(dir, DEFAULT_DIRECTION);

        let nan = normalize_or(Vec2::new(f32::NAN, 1.0), Vec2::new(0.0, -1.0));
        assert_eq!(nan, Vec2::new(0.0, -1.0));
    }

    #[test]
    fn test_normalize_or_unit_length() {
        let dir = direction_or_default(Vec2::new(3.0, 4.0));
        assert_relative_eq!(dir.magnitude(), 1.0, epsilon = 1e-6);
        assert_relative_eq!(dir.x, 0.6, epsilon = 1e-6);
    }

    #[test]
    fn test_rect_swapped_corners() {
        let r = Rect::new(Vec2::new(10.0, 10.0), Vec2::new(0.0, 0.0));
        assert_eq!(r.min, Vec2::new(0.0, 0.0));
        assert_eq!(r.max, Vec2::new(10.0, 10.0));
        assert_relative_eq!(r.width(), 10.0);
    }

    #[test]
    fn test_rect_intersection() {
        let a = Rect::from_xywh(0.0, 0.0, 10.0, 10.0);
        let b = Rect::from_xywh(5.0, 5.0, 10.0, 10.0);
        let c = Rect::from_xywh(20.0, 20.0, 1.0, 1.0);
        let touching = Rect::from_xywh(10.0, 0.0, 5.0, 5.0);

        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
        assert!(a.intersects(&touching));
    }

    #[test]
    fn test_quadrants_cover_parent() {
        let r = Rect::from_xywh(0.0, 0.0, 100.0, 100.0);
        let [tl, tr, bl, br] = r.quadrants();

        assert_eq!(tl, Rect::from_xywh(0.0, 0.0, 50.0, 50.0));
        assert_eq!(tr, Rect::from_xywh(50.0, 0.0, 50.0, 50.0));
        assert_eq!(bl, Rect::from_xywh(0.0, 50.0, 50.0, 50.0));
        assert_eq!(br, Rect::from_xywh(50.0, 50.0, 50.0, 50.0));
        assert!(r.contains_rect(&br));
    }
}
