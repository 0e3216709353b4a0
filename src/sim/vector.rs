//! Double-precision 3D vector algebra
//!
//! `Vector3` is a `Copy` value, so the operators always produce new values and
//! the constants (`Vector3::ZERO`, `Vector3::X`, `Vector3::NEG_Z`, ...) can
//! never be mutated through an alias. The few in-place operations the kernel
//! needs are spelled out in [`VectorExt`].

pub use glam::DVec3 as Vector3;

/// The six signed unit axes, the only normals a box face can have
pub const SIGNED_AXES: [Vector3; 6] = [
    Vector3::X,
    Vector3::NEG_X,
    Vector3::Y,
    Vector3::NEG_Y,
    Vector3::Z,
    Vector3::NEG_Z,
];

/// Explicit in-place and component-wise helpers
pub trait VectorExt {
    /// Clamp in place: `self = max(self, min); self = min(self, max)`
    fn clamp_into(&mut self, min: Vector3, max: Vector3);

    /// Component-wise `|v|·v`: squares the magnitude, keeps the sign
    fn signed_square(self) -> Vector3;

    /// Plain array form, handy for error reports
    fn to_array3(self) -> [f64; 3];
}

impl VectorExt for Vector3 {
    #[inline]
    fn clamp_into(&mut self, min: Vector3, max: Vector3) {
        *self = self.max(min).min(max);
    }

    #[inline]
    fn signed_square(self) -> Vector3 {
        self.abs() * self
    }

    #[inline]
    fn to_array3(self) -> [f64; 3] {
        self.to_array()
    }
}
