//! Point-mass sphere advanced by the simulator

use serde::{Deserialize, Serialize};

use super::shape::Sphere;
use super::vector::Vector3;
use crate::SimError;
use crate::consts::*;
use crate::sphere_density;

/// A non-rotating sphere with movement state and material properties
///
/// Mass, radius and density are kept in sync by the setters: density is
/// always `mass / sphere_volume(radius)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Particle {
    pub center: Vector3,
    /// Center at the start of the current step; origin of the tunneling ray
    pub old_center: Vector3,
    pub velocity: Vector3,
    pub acceleration: Vector3,
    /// Force accumulator, reset at every evaluation
    pub force: Vector3,
    radius: f64,
    mass: f64,
    inv_mass: f64,
    density: f64,
    restitution: f64,
    friction: f64,
}

impl Particle {
    /// Unit-mass, unit-radius particle at rest
    pub fn new(center: Vector3) -> Self {
        Self {
            center,
            old_center: center,
            velocity: Vector3::ZERO,
            acceleration: Vector3::ZERO,
            force: Vector3::ZERO,
            radius: DEFAULT_RADIUS,
            mass: DEFAULT_MASS,
            inv_mass: 1.0 / DEFAULT_MASS,
            density: sphere_density(DEFAULT_MASS, DEFAULT_RADIUS),
            restitution: DEFAULT_RESTITUTION,
            friction: DEFAULT_FRICTION,
        }
    }

    pub fn with_mass_radius(
        mass: f64,
        radius: f64,
        center: Vector3,
        velocity: Vector3,
    ) -> Result<Self, SimError> {
        let mut p = Self::new(center);
        p.set_radius(radius)?;
        p.set_mass(mass)?;
        p.velocity = velocity;
        Ok(p)
    }

    #[inline]
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Mass in kg; infinite for immovable particles
    #[inline]
    pub fn mass(&self) -> f64 {
        self.mass
    }

    #[inline]
    pub fn inv_mass(&self) -> f64 {
        self.inv_mass
    }

    #[inline]
    pub fn density(&self) -> f64 {
        self.density
    }

    #[inline]
    pub fn restitution(&self) -> f64 {
        self.restitution
    }

    #[inline]
    pub fn friction(&self) -> f64 {
        self.friction
    }

    /// Zero inverse mass: never moved by the integrator
    #[inline]
    pub fn is_immovable(&self) -> bool {
        self.inv_mass == 0.0
    }

    pub fn as_sphere(&self) -> Sphere {
        Sphere::new(self.center, self.radius)
    }

    pub fn set_radius(&mut self, radius: f64) -> Result<(), SimError> {
        if !(radius.is_finite() && radius > 0.0) {
            return Err(reject("radius", radius));
        }
        self.radius = radius;
        self.density = sphere_density(self.mass, radius);
        Ok(())
    }

    pub fn set_mass(&mut self, mass: f64) -> Result<(), SimError> {
        if !(mass.is_finite() && mass > 0.0) {
            return Err(reject("mass", mass));
        }
        self.mass = mass;
        self.inv_mass = 1.0 / mass;
        self.density = sphere_density(mass, self.radius);
        Ok(())
    }

    /// Set mass through its inverse; `0.0` makes the particle immovable
    pub fn set_inv_mass(&mut self, inv_mass: f64) -> Result<(), SimError> {
        if !(inv_mass.is_finite() && inv_mass >= 0.0) {
            return Err(reject("inv_mass", inv_mass));
        }
        self.inv_mass = inv_mass;
        self.mass = if inv_mass == 0.0 {
            f64::INFINITY
        } else {
            1.0 / inv_mass
        };
        self.density = sphere_density(self.mass, self.radius);
        Ok(())
    }

    pub fn set_restitution(&mut self, restitution: f64) -> Result<(), SimError> {
        if !(0.0..=MAX_RESTITUTION).contains(&restitution) {
            return Err(reject("restitution", restitution));
        }
        self.restitution = restitution;
        Ok(())
    }

    pub fn set_friction(&mut self, friction: f64) -> Result<(), SimError> {
        if !(0.0..=1.0).contains(&friction) {
            return Err(reject("friction", friction));
        }
        self.friction = friction;
        Ok(())
    }

    /// Teleport: the previous center becomes `old_center`
    pub fn set_center(&mut self, center: Vector3) {
        self.old_center = self.center;
        self.center = center;
    }
}

fn reject(field: &'static str, value: f64) -> SimError {
    log::warn!("Rejected particle {}: {}", field, value);
    SimError::InvalidParticle { field, value }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sphere_volume;

    #[test]
    fn test_defaults() {
        let p = Particle::new(Vector3::new(10.0, 10.0, 10.0));
        assert_eq!(p.old_center, p.center);
        assert_eq!(p.mass(), 1.0);
        assert_eq!(p.inv_mass(), 1.0);
        assert_eq!(p.friction(), 0.4);
        assert_eq!(p.restitution(), 0.0);
        assert!(!p.is_immovable());
    }

    #[test]
    fn test_density_tracks_mass_and_radius() {
        let mut p = Particle::new(Vector3::ZERO);
        p.set_mass(70.0).unwrap();
        p.set_radius(0.25).unwrap();
        assert!((p.density() - 70.0 / sphere_volume(0.25)).abs() < 1e-9);

        p.set_radius(0.5).unwrap();
        assert!((p.density() - 70.0 / sphere_volume(0.5)).abs() < 1e-9);
    }

    #[test]
    fn test_rejects_invalid_properties() {
        let mut p = Particle::new(Vector3::ZERO);
        assert!(p.set_radius(0.0).is_err());
        assert!(p.set_radius(-1.0).is_err());
        assert!(p.set_radius(f64::NAN).is_err());
        assert!(p.set_mass(0.0).is_err());
        assert!(p.set_mass(f64::INFINITY).is_err());
        assert!(p.set_inv_mass(-0.5).is_err());
        assert!(p.set_restitution(2.5).is_err());
        assert!(p.set_friction(1.5).is_err());
        // untouched after rejection
        assert_eq!(p.radius(), 1.0);
        assert_eq!(p.mass(), 1.0);
    }

    #[test]
    fn test_zero_inv_mass_is_immovable() {
        let mut p = Particle::new(Vector3::ZERO);
        p.set_inv_mass(0.0).unwrap();
        assert!(p.is_immovable());
        assert!(p.mass().is_infinite());

        p.set_inv_mass(0.5).unwrap();
        assert_eq!(p.mass(), 2.0);
    }

    #[test]
    fn test_as_sphere_tracks_center_and_radius() {
        let mut p = Particle::new(Vector3::new(1.0, 2.0, 3.0));
        p.set_radius(0.25).unwrap();
        let s = p.as_sphere();
        assert_eq!(s.center, Vector3::new(1.0, 2.0, 3.0));
        assert_eq!(s.radius, 0.25);
    }

    #[test]
    fn test_set_center_records_previous() {
        let mut p = Particle::new(Vector3::ZERO);
        p.set_center(Vector3::X);
        assert_eq!(p.old_center, Vector3::ZERO);
        assert_eq!(p.center, Vector3::X);
    }

    #[test]
    fn test_with_mass_radius_validates() {
        assert!(Particle::with_mass_radius(1.0, 0.0, Vector3::ZERO, Vector3::ZERO).is_err());
        let p = Particle::with_mass_radius(2.0, 0.5, Vector3::ZERO, Vector3::X).unwrap();
        assert_eq!(p.velocity, Vector3::X);
        assert_eq!(p.inv_mass(), 0.5);
    }
}
