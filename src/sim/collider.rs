//! Narrow-phase geometric tests
//!
//! Stateless predicates on points, spheres and boxes, plus the slab-method
//! ray/box intersection used to find where a particle entered an obstacle.

use super::shape::{Aabb, Sphere};
use super::vector::Vector3;

/// Where a ray first enters a box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// Parametric distance along the direction
    pub t: f64,
    /// `origin + direction * t`
    pub point: Vector3,
    /// Signed unit axis of the entry face, facing the ray origin
    pub normal: Vector3,
}

/// Inclusive containment: `min <= p <= max` on every axis
#[inline]
pub fn test_point_box(p: Vector3, b: &Aabb) -> bool {
    let (min, max) = (b.min(), b.max());
    !(max.x < p.x || min.x > p.x || max.y < p.y || min.y > p.y || max.z < p.z || min.z > p.z)
}

/// Strict interior containment
#[inline]
pub fn test_point_box_exclusive(p: Vector3, b: &Aabb) -> bool {
    p.cmpgt(b.min()).all() && p.cmplt(b.max()).all()
}

/// Separating-axis test on the three box axes
pub fn test_box_box(a: &Aabb, b: &Aabb) -> bool {
    let (a_min, a_max) = (a.min(), a.max());
    let (b_min, b_max) = (b.min(), b.max());

    if a_max.x < b_min.x || a_min.x > b_max.x {
        return false;
    }
    if a_max.y < b_min.y || a_min.y > b_max.y {
        return false;
    }
    if a_max.z < b_min.z || a_min.z > b_max.z {
        return false;
    }
    true
}

pub fn test_sphere_sphere(a: &Sphere, b: &Sphere) -> bool {
    let d = a.center - b.center;
    let rad_sum = a.radius + b.radius;
    d.dot(d) < rad_sum * rad_sum
}

/// Sphere overlaps box when the closest box point is within the radius
pub fn test_sphere_box(s: &Sphere, b: &Aabb) -> bool {
    let closest = s.center.max(b.min()).min(b.max());
    test_point_sphere(closest, s)
}

pub fn test_point_sphere(p: Vector3, s: &Sphere) -> bool {
    let d = p - s.center;
    d.dot(d) < s.radius * s.radius
}

/// Slab-method ray/box intersection
///
/// `direction` does not need to be normalized; `t` is expressed in its units.
/// Axes where the direction is zero never divide: the ray is parallel to
/// that slab and misses unless the origin already lies between its planes.
/// Returns `None` when the slabs do not overlap or the box is behind the ray.
pub fn intersect_ray_box(origin: Vector3, direction: Vector3, b: &Aabb) -> Option<RayHit> {
    let inv_dir = direction.recip();
    let min = b.min();
    let max = b.max();

    let mut tmin = f64::NEG_INFINITY;
    let mut tmax = f64::INFINITY;
    let mut normal = Vector3::ZERO;

    for axis in 0..3 {
        let o = origin[axis];
        if direction[axis] == 0.0 {
            if o < min[axis] || o > max[axis] {
                return None;
            }
            continue;
        }

        let negative = inv_dir[axis] < 0.0;
        let (near, far) = if negative {
            (max[axis], min[axis])
        } else {
            (min[axis], max[axis])
        };
        let t_near = (near - o) * inv_dir[axis];
        let t_far = (far - o) * inv_dir[axis];

        if tmin > t_far || t_near > tmax {
            return None;
        }

        if t_near > tmin {
            tmin = t_near;
            // moving toward -axis means we enter through the +axis face
            let mut n = Vector3::ZERO;
            n[axis] = if negative { 1.0 } else { -1.0 };
            normal = n;
        }
        tmax = tmax.min(t_far);
    }

    // zero direction on every axis: no movement, no entry face
    if normal == Vector3::ZERO || tmax < 0.0 {
        return None;
    }

    Some(RayHit {
        t: tmin,
        point: origin + direction * tmin,
        normal,
    })
}

/// Intersect the segment `from -> to` with a box, using a normalized direction
///
/// A zero-length segment (particle that did not move) never hits.
pub fn intersect_segment_box(from: Vector3, to: Vector3, b: &Aabb) -> Option<RayHit> {
    let direction = (to - from).normalize_or_zero();
    if direction == Vector3::ZERO {
        return None;
    }
    intersect_ray_box(from, direction, b)
}
