//! Force laws and contact response
//!
//! Fluid laws are pure functions of velocity and geometry. Contact response
//! turns a detected penetration into an impulse-equivalent force plus kinetic
//! friction, and moves the particle back out of the obstacle.

use std::f64::consts::PI;

use super::collider::{intersect_segment_box, test_point_box};
use super::particle::Particle;
use super::shape::Obstacle;
use super::vector::{Vector3, VectorExt};
use crate::consts::{CONTACT_EPSILON, IMPULSE_GAIN};
use crate::quadratic_drag_factor;

/// Outcome of resolving one particle against one obstacle
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Contact {
    /// No penetration, nothing changed
    None,
    /// Started the step inside the obstacle: frozen at `old_center`
    Stuck,
    /// Entered the obstacle this step and was pushed back out
    Impact {
        point: Vector3,
        normal: Vector3,
        /// Force added to the accumulator
        force: Vector3,
    },
}

impl Contact {
    pub fn is_contact(&self) -> bool {
        !matches!(self, Contact::None)
    }
}

/// Quadratic drag on a sphere, opposing its velocity
pub fn sphere_quadratic_drag(velocity: Vector3, fluid_density: f64, radius: f64) -> Vector3 {
    -velocity.signed_square() * quadratic_drag_factor(radius, fluid_density)
}

/// Push of a moving fluid on a sphere, along the flow
pub fn sphere_quadratic_flow(flow: Vector3, fluid_density: f64, radius: f64) -> Vector3 {
    flow.signed_square() * quadratic_drag_factor(radius, fluid_density)
}

/// Stokes' law linear drag, `-6π·r·η·v`
pub fn sphere_stokes_drag(velocity: Vector3, viscosity: f64, radius: f64) -> Vector3 {
    velocity * (-6.0 * PI * radius * viscosity)
}

/// Impulse along the contact normal, rounded to whole units
///
/// `normal · round(-(1 + restitution) · mass · (normal · velocity))`
pub fn impact_impulse(normal: Vector3, velocity: Vector3, restitution: f64, mass: f64) -> Vector3 {
    normal * (-(1.0 + restitution) * mass * normal.dot(velocity)).round()
}

/// Friction impulse opposing the tangential velocity
///
/// Proportional to velocity rather than to the normal force.
pub fn kinetic_friction(tangential: Vector3, ud: f64, mass: f64) -> Vector3 {
    -tangential * (ud * mass)
}

/// Resolve a particle against a single obstacle, mutating it on contact
pub fn resolve_impact(p: &mut Particle, obstacle: &Obstacle, dt: f64) -> Contact {
    // embedded since the start of the step: absolute immobility
    if test_point_box(p.old_center, &obstacle.aabb) {
        p.velocity = Vector3::ZERO;
        p.center = p.old_center;
        return Contact::Stuck;
    }

    if !test_point_box(p.center, &obstacle.aabb) {
        return Contact::None;
    }

    let Some(hit) = intersect_segment_box(p.old_center, p.center, &obstacle.aabb) else {
        return Contact::None;
    };
    apply_impact(p, obstacle, hit.point, hit.normal, dt)
}

/// Resolve against the first stuck candidate or, failing that, the nearest
/// penetrated one. At most one contact is applied.
pub fn resolve_contacts(p: &mut Particle, candidates: &[&Obstacle], dt: f64) -> Contact {
    let mut nearest: Option<(f64, &Obstacle, Vector3, Vector3)> = None;

    for &obstacle in candidates {
        if test_point_box(p.old_center, &obstacle.aabb) {
            return resolve_impact(p, obstacle, dt);
        }
        if !test_point_box(p.center, &obstacle.aabb) {
            continue;
        }
        if let Some(hit) = intersect_segment_box(p.old_center, p.center, &obstacle.aabb) {
            if nearest.is_none_or(|(t, ..)| hit.t < t) {
                nearest = Some((hit.t, obstacle, hit.point, hit.normal));
            }
        }
    }

    match nearest {
        Some((_, obstacle, point, normal)) => apply_impact(p, obstacle, point, normal, dt),
        None => Contact::None,
    }
}

fn apply_impact(
    p: &mut Particle,
    obstacle: &Obstacle,
    point: Vector3,
    normal: Vector3,
    dt: f64,
) -> Contact {
    let mass = p.mass();
    let ud = (p.friction() + obstacle.friction) / 2.0;

    let normal_component = normal * normal.dot(p.velocity);
    let tangential_component = p.velocity - normal_component;

    let impulse = impact_impulse(normal, p.velocity, p.restitution(), mass) * IMPULSE_GAIN
        + kinetic_friction(tangential_component, ud, mass);
    let force = impulse / dt;
    p.force += force;

    p.center = point + normal * CONTACT_EPSILON;

    log::trace!(
        "impact: normal={:?} vel={:?} force={:?} pos={:?}",
        normal,
        p.velocity,
        force,
        p.center
    );

    Contact::Impact {
        point,
        normal,
        force,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slab() -> Obstacle {
        Obstacle::new(Vector3::new(-5.0, -5.0, -1.0), Vector3::new(5.0, 5.0, 0.0), 0.4)
    }

    fn falling(from: Vector3, to: Vector3, velocity: Vector3) -> Particle {
        let mut p = Particle::new(to);
        p.set_mass(70.0).unwrap();
        p.old_center = from;
        p.velocity = velocity;
        p
    }

    #[test]
    fn test_drag_opposes_velocity() {
        let v = Vector3::new(3.0, -2.0, 0.0);
        let drag = sphere_quadratic_drag(v, 1000.0, 0.1);
        assert!(drag.dot(v) < 0.0);
        let k = PI * 0.01 * 1000.0 * 0.25;
        assert!(drag.abs_diff_eq(Vector3::new(-9.0 * k, 4.0 * k, 0.0), 1e-9));
    }

    #[test]
    fn test_flow_pushes_along_flow() {
        let flow = Vector3::new(-100.0, 0.0, 0.0);
        let f = sphere_quadratic_flow(flow, 1.1, 0.5);
        assert!(f.x < 0.0);
        assert_eq!(f.y, 0.0);
    }

    #[test]
    fn test_stokes_drag_linear() {
        let f = sphere_stokes_drag(Vector3::new(2.0, 0.0, 0.0), 0.001, 1.0);
        assert!((f.x + 12.0 * PI * 0.001).abs() < 1e-12);
    }

    #[test]
    fn test_impulse_is_rounded() {
        let j = impact_impulse(Vector3::Z, Vector3::new(0.0, 0.0, -0.3), 0.0, 1.0);
        assert_eq!(j, Vector3::ZERO);
        let j = impact_impulse(Vector3::Z, Vector3::new(0.0, 0.0, -2.0), 0.5, 10.0);
        assert_eq!(j, Vector3::new(0.0, 0.0, 30.0));
    }

    #[test]
    fn test_no_contact_leaves_particle() {
        let mut p = falling(Vector3::new(0.0, 0.0, 3.0), Vector3::new(0.0, 0.0, 2.0), Vector3::NEG_Z);
        let before = p.clone();
        let contact = resolve_impact(&mut p, &slab(), 0.01);
        assert_eq!(contact, Contact::None);
        assert!(!contact.is_contact());
        assert_eq!(p.center, before.center);
        assert_eq!(p.force, Vector3::ZERO);
    }

    #[test]
    fn test_stuck_particle_is_frozen() {
        let mut p = falling(Vector3::new(0.0, 0.0, -0.5), Vector3::new(0.0, 0.0, -0.7), Vector3::new(1.0, 0.0, -2.0));
        let contact = resolve_impact(&mut p, &slab(), 0.01);
        assert_eq!(contact, Contact::Stuck);
        assert!(contact.is_contact());
        assert_eq!(p.velocity, Vector3::ZERO);
        assert_eq!(p.center, Vector3::new(0.0, 0.0, -0.5));
    }

    #[test]
    fn test_penetration_pushes_out_and_up() {
        let dt = 0.01;
        let mut p = falling(Vector3::new(1.0, 0.0, 0.05), Vector3::new(1.0, 0.0, -0.05), Vector3::new(0.0, 0.0, -10.0));
        let contact = resolve_impact(&mut p, &slab(), dt);
        assert!(contact.is_contact());
        let Contact::Impact { point, normal, force } = contact else {
            panic!("expected impact, got {:?}", contact);
        };
        assert_eq!(normal, Vector3::Z);
        assert!(point.abs_diff_eq(Vector3::new(1.0, 0.0, 0.0), 1e-12));
        assert!((p.center.z - CONTACT_EPSILON).abs() < 1e-12);
        // round(-(1+0)*70*-10) * 2 / dt
        assert!((force.z - 700.0 * IMPULSE_GAIN / dt).abs() < 1e-6);
        assert_eq!(p.force, force);
    }

    #[test]
    fn test_friction_opposes_sliding() {
        let dt = 0.01;
        let mut p = falling(Vector3::new(0.0, 0.0, 0.05), Vector3::new(0.1, 0.0, -0.05), Vector3::new(10.0, 0.0, -10.0));
        let Contact::Impact { force, .. } = resolve_impact(&mut p, &slab(), dt) else {
            panic!("expected impact");
        };
        // ud = (0.4 + 0.4)/2, opposing +x sliding
        assert!((force.x + 0.4 * 70.0 * 10.0 / dt).abs() < 1e-6);
    }

    #[test]
    fn test_nearest_candidate_wins() {
        let near = Obstacle::new(Vector3::new(-1.0, -1.0, 4.0), Vector3::new(1.0, 1.0, 5.0), 0.0);
        let far = Obstacle::new(Vector3::new(-1.0, -1.0, 0.0), Vector3::new(1.0, 1.0, 4.5), 0.0);
        let mut p = falling(Vector3::new(0.0, 0.0, 10.0), Vector3::new(0.0, 0.0, 4.2), Vector3::new(0.0, 0.0, -50.0));

        let contact = resolve_contacts(&mut p, &[&far, &near], 0.01);
        let Contact::Impact { point, .. } = contact else {
            panic!("expected impact");
        };
        assert!((point.z - 5.0).abs() < 1e-12);
        assert!((p.center.z - 5.0 - CONTACT_EPSILON).abs() < 1e-12);
    }

    #[test]
    fn test_resolve_contacts_without_candidates() {
        let mut p = falling(Vector3::ZERO, Vector3::X, Vector3::X);
        assert_eq!(resolve_contacts(&mut p, &[], 0.01), Contact::None);
    }
}
