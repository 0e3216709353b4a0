//! Verlet Sim - a real-time particle physics kernel
//!
//! Core modules:
//! - `sim`: Deterministic simulation (integrator, environment, broad/narrow phase, contact response)
//! - `settings`: Data-driven world configuration
//! - `error`: Error type shared by constructors and validated setters

pub mod error;
pub mod settings;
pub mod sim;

pub use error::SimError;
pub use settings::{FluidPreset, Settings};
pub use sim::{
    ArrayGrid2D, BroadPhase, Cell, CellWorld, NullBroadPhase, NullWorld, Obstacle, Particle,
    ParticleId, Simulator, Vector3, World,
};

use std::f64::consts::PI;

/// Physical and tuning constants
pub mod consts {
    /// Earth gravity as an acceleration along -Z (m/s²)
    pub const EARTH_GRAVITY: f64 = -9.81;

    /// Common fluid densities (kg/m³)
    pub const AIR_DENSITY: f64 = 1.1;
    pub const WATER_DENSITY: f64 = 1000.0;

    /// Dynamic viscosities (Pa·s), for Stokes drag
    pub const AIR_VISCOSITY: f64 = 0.000_019_83;
    pub const WATER_VISCOSITY: f64 = 0.001;

    /// Particle defaults
    pub const DEFAULT_MASS: f64 = 1.0;
    pub const DEFAULT_RADIUS: f64 = 1.0;
    pub const DEFAULT_RESTITUTION: f64 = 0.0;
    pub const DEFAULT_FRICTION: f64 = 0.4;
    /// Restitution above 1 models "energetic" materials
    pub const MAX_RESTITUTION: f64 = 2.0;

    /// Initial particle storage, doubled on overflow
    pub const INITIAL_PARTICLE_CAPACITY: usize = 1000;

    /// Distance a resolved particle is pushed out along the contact normal.
    /// Keeps the next step from re-triggering the same contact.
    pub const CONTACT_EPSILON: f64 = 0.01;
    /// Empirical gain on the contact impulse. The second-half velocity
    /// correction of the integrator removes half of any force that is gone
    /// at the new position, so the impulse is doubled up front.
    pub const IMPULSE_GAIN: f64 = 2.0;
}

/// Volume of a sphere of the given radius
#[inline]
pub fn sphere_volume(radius: f64) -> f64 {
    (4.0 / 3.0) * PI * radius * radius * radius
}

/// Density of a sphere with the given mass and radius
#[inline]
pub fn sphere_density(mass: f64, radius: f64) -> f64 {
    mass / sphere_volume(radius)
}

/// Cross-section factor `π·r²·ρ/4` shared by the quadratic fluid laws
#[inline]
pub fn quadratic_drag_factor(radius: f64, fluid_density: f64) -> f64 {
    PI * radius * radius * fluid_density * 0.25
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_sphere_volume_unit() {
        assert!((sphere_volume(1.0) - 4.188_790_204_786_391).abs() < 1e-12);
    }

    #[test]
    fn test_default_particle_density() {
        // 1 kg in a unit sphere
        let density = sphere_density(1.0, 1.0);
        assert!((density - 0.238_732_414_637_843).abs() < 1e-12);
    }

    proptest! {
        #[test]
        fn density_round_trip(r in 0.001f64..100.0, rho in 0.001f64..20_000.0) {
            let mass = sphere_volume(r) * rho;
            let back = sphere_density(mass, r);
            prop_assert!((back - rho).abs() <= rho * 1e-12);
        }
    }
}
