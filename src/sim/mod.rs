//! Simulation module
//!
//! Everything that moves particles lives here. Stepping is deterministic:
//! - Caller-supplied timestep, never wall-clock time
//! - Particles are advanced independently, in storage order
//! - No I/O; configuration is resolved before a simulator is built

pub mod broadphase;
pub mod collider;
pub mod environment;
pub mod forces;
pub mod particle;
pub mod shape;
pub mod simulator;
pub mod vector;

pub use broadphase::{ArrayGrid2D, BroadPhase, NullBroadPhase, ObstacleId};
pub use collider::{RayHit, intersect_ray_box, intersect_segment_box, test_point_box};
pub use environment::{Cell, CellId, CellWorld, FluidCell, NullWorld, World};
pub use forces::{Contact, resolve_contacts, resolve_impact};
pub use particle::Particle;
pub use shape::{Aabb, Obstacle, Sphere};
pub use simulator::{ParticleId, Simulator};
pub use vector::{Vector3, VectorExt};
