//! Static shapes: axis-aligned boxes, spheres and grid obstacles

use serde::{Deserialize, Serialize};

use super::vector::Vector3;

/// Axis-aligned box kept in both center/extent and min/max form
///
/// Invariant: `min == center - extent` and `max == center + extent` after
/// every mutation. Fields are private so the two forms cannot drift apart.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    center: Vector3,
    extent: Vector3,
    min: Vector3,
    max: Vector3,
}

impl Aabb {
    pub fn from_min_max(min: Vector3, max: Vector3) -> Self {
        let mut aabb = Self {
            center: Vector3::ZERO,
            extent: Vector3::ZERO,
            min,
            max,
        };
        aabb.recalculate_center_extent();
        aabb
    }

    pub fn from_center_extent(center: Vector3, extent: Vector3) -> Self {
        let mut aabb = Self {
            center,
            extent,
            min: Vector3::ZERO,
            max: Vector3::ZERO,
        };
        aabb.recalculate_min_max();
        aabb
    }

    #[inline]
    pub fn min(&self) -> Vector3 {
        self.min
    }

    #[inline]
    pub fn max(&self) -> Vector3 {
        self.max
    }

    #[inline]
    pub fn center(&self) -> Vector3 {
        self.center
    }

    /// Half-widths along each axis
    #[inline]
    pub fn extent(&self) -> Vector3 {
        self.extent
    }

    pub fn set_min_max(&mut self, min: Vector3, max: Vector3) {
        self.min = min;
        self.max = max;
        self.recalculate_center_extent();
    }

    pub fn set_center_extent(&mut self, center: Vector3, extent: Vector3) {
        self.center = center;
        self.extent = extent;
        self.recalculate_min_max();
    }

    pub fn set_center(&mut self, center: Vector3) {
        self.center = center;
        self.recalculate_min_max();
    }

    pub fn set_extent(&mut self, extent: Vector3) {
        self.extent = extent;
        self.recalculate_min_max();
    }

    /// True when `min < max` on every axis and all corners are finite
    pub fn is_valid(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.min.cmplt(self.max).all()
    }

    fn recalculate_min_max(&mut self) {
        self.min = self.center - self.extent;
        self.max = self.center + self.extent;
    }

    fn recalculate_center_extent(&mut self) {
        self.center = (self.min + self.max) / 2.0;
        self.extent = (self.max - self.min) / 2.0;
    }
}

/// A sphere by center and radius
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sphere {
    pub center: Vector3,
    pub radius: f64,
}

impl Sphere {
    pub fn new(center: Vector3, radius: f64) -> Self {
        Self { center, radius }
    }
}

/// Static box geometry registered in a broad phase
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub aabb: Aabb,
    /// Surface friction coefficient in [0, 1]
    pub friction: f64,
}

impl Obstacle {
    pub fn new(min: Vector3, max: Vector3, friction: f64) -> Self {
        Self {
            aabb: Aabb::from_min_max(min, max),
            friction,
        }
    }

    pub fn from_center_extent(center: Vector3, extent: Vector3, friction: f64) -> Self {
        Self {
            aabb: Aabb::from_center_extent(center, extent),
            friction,
        }
    }

    #[inline]
    pub fn center(&self) -> Vector3 {
        self.aabb.center()
    }

    #[inline]
    pub fn extent(&self) -> Vector3 {
        self.aabb.extent()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_min_max_derives_center_extent() {
        let aabb = Aabb::from_min_max(Vector3::new(112.0, -50.0, -26.0), Vector3::new(267.0, 50.0, 88.0));
        assert_eq!(aabb.center(), Vector3::new(189.5, 0.0, 31.0));
        assert_eq!(aabb.extent(), Vector3::new(77.5, 50.0, 57.0));
    }

    #[test]
    fn test_setters_keep_forms_consistent() {
        let mut aabb = Aabb::from_center_extent(Vector3::ZERO, Vector3::ONE);
        aabb.set_center(Vector3::new(5.0, 5.0, 5.0));
        assert_eq!(aabb.min(), Vector3::splat(4.0));
        assert_eq!(aabb.max(), Vector3::splat(6.0));

        aabb.set_extent(Vector3::new(2.0, 1.0, 0.5));
        assert_eq!(aabb.min(), Vector3::new(3.0, 4.0, 4.5));

        aabb.set_min_max(Vector3::ZERO, Vector3::new(2.0, 4.0, 6.0));
        assert_eq!(aabb.center(), Vector3::new(1.0, 2.0, 3.0));
        assert_eq!(aabb.extent(), Vector3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_validity() {
        assert!(Aabb::from_min_max(Vector3::ZERO, Vector3::ONE).is_valid());
        assert!(!Aabb::from_min_max(Vector3::ONE, Vector3::ZERO).is_valid());
        assert!(!Aabb::from_min_max(Vector3::ZERO, Vector3::new(1.0, f64::NAN, 1.0)).is_valid());
    }
}
