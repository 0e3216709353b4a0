//! Particle storage and the velocity Verlet integrator
//!
//! Each particle is advanced independently: forces are evaluated at the
//! current position, position and velocity are integrated, then forces are
//! evaluated again at the new position and the velocity is corrected by half
//! the difference. The second evaluation keeps velocity-dependent forces
//! (drag) consistent to second order.
//!
//! Not safe for concurrent mutation: `add_particle`, `remove_particle` and
//! `update` all take `&mut self`.

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::broadphase::BroadPhase;
use super::environment::World;
use super::forces::resolve_contacts;
use super::particle::Particle;
use super::vector::Vector3;
use crate::consts::INITIAL_PARTICLE_CAPACITY;

/// Collaborators must be shareable across threads when stepping in parallel
#[cfg(feature = "parallel")]
pub trait MaybeSync: Sync {}
#[cfg(feature = "parallel")]
impl<T: Sync> MaybeSync for T {}

#[cfg(not(feature = "parallel"))]
pub trait MaybeSync {}
#[cfg(not(feature = "parallel"))]
impl<T> MaybeSync for T {}

/// Stable handle to a particle; survives growth and swap-removal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParticleId {
    slot: u32,
    /// Unique per insertion, so handles to removed particles never alias
    stamp: u64,
}

#[derive(Debug, Clone, Copy)]
struct Slot {
    dense: u32,
    stamp: u64,
    live: bool,
}

/// Advances particles through a world, colliding with a broad phase
pub struct Simulator<W, B> {
    world: W,
    broadphase: B,
    /// Dense, swap-removed particle array
    particles: Vec<Particle>,
    /// Slot owning each dense entry
    owners: Vec<u32>,
    slots: Vec<Slot>,
    free: Vec<u32>,
    next_stamp: u64,
    capacity: usize,
}

impl<W: World + MaybeSync, B: BroadPhase + MaybeSync> Simulator<W, B> {
    pub fn new(world: W, broadphase: B) -> Self {
        Self::with_capacity(world, broadphase, INITIAL_PARTICLE_CAPACITY)
    }

    /// Start with room for `capacity` particles; doubled whenever full
    pub fn with_capacity(world: W, broadphase: B, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            world,
            broadphase,
            particles: Vec::with_capacity(capacity),
            owners: Vec::with_capacity(capacity),
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
            next_stamp: 0,
            capacity,
        }
    }

    pub fn world(&self) -> &W {
        &self.world
    }

    pub fn broadphase(&self) -> &B {
        &self.broadphase
    }

    /// Obstacle registration goes through here, never during a step
    pub fn broadphase_mut(&mut self) -> &mut B {
        &mut self.broadphase
    }

    /// Add a particle, O(1) amortized
    pub fn add_particle(&mut self, particle: Particle) -> ParticleId {
        if self.particles.len() >= self.capacity {
            self.capacity *= 2;
            let additional = self.capacity - self.particles.len();
            self.particles.reserve_exact(additional);
            self.owners.reserve_exact(additional);
            log::debug!("Particle storage grown to {}", self.capacity);
        }

        let dense = self.particles.len() as u32;
        let stamp = self.next_stamp;
        self.next_stamp += 1;

        let slot = match self.free.pop() {
            Some(slot) => {
                self.slots[slot as usize] = Slot { dense, stamp, live: true };
                slot
            }
            None => {
                self.slots.push(Slot { dense, stamp, live: true });
                self.slots.len() as u32 - 1
            }
        };

        self.particles.push(particle);
        self.owners.push(slot);
        ParticleId { slot, stamp }
    }

    /// Remove a particle by swapping the last one into its place, O(1)
    pub fn remove_particle(&mut self, id: ParticleId) -> Option<Particle> {
        let dense = self.dense_index(id)?;

        let removed = self.particles.swap_remove(dense);
        self.owners.swap_remove(dense);
        if let Some(&moved) = self.owners.get(dense) {
            self.slots[moved as usize].dense = dense as u32;
        }

        self.slots[id.slot as usize].live = false;
        self.free.push(id.slot);
        Some(removed)
    }

    /// Forget every particle, keeping the allocated storage
    pub fn clear_particles(&mut self) {
        self.particles.clear();
        self.owners.clear();
        self.slots.clear();
        self.free.clear();
    }

    pub fn particles_number(&self) -> usize {
        self.particles.len()
    }

    /// Current logical capacity of the particle array
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn contains(&self, id: ParticleId) -> bool {
        self.dense_index(id).is_some()
    }

    pub fn particle(&self, id: ParticleId) -> Option<&Particle> {
        self.dense_index(id).map(|i| &self.particles[i])
    }

    pub fn particle_mut(&mut self, id: ParticleId) -> Option<&mut Particle> {
        self.dense_index(id).map(move |i| &mut self.particles[i])
    }

    /// Read-only view of the active particles, in storage order
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Handles of the active particles, in storage order
    pub fn ids(&self) -> impl Iterator<Item = ParticleId> + '_ {
        self.owners.iter().map(|&slot| ParticleId {
            slot,
            stamp: self.slots[slot as usize].stamp,
        })
    }

    fn dense_index(&self, id: ParticleId) -> Option<usize> {
        let slot = self.slots.get(id.slot as usize)?;
        if !slot.live || slot.stamp != id.stamp {
            return None;
        }
        Some(slot.dense as usize)
    }

    /// Advance every particle by `dt` seconds
    ///
    /// `dt` is not clamped; large steps make the drag terms unstable.
    pub fn update(&mut self, dt: f64) {
        let world = &self.world;
        let broadphase = &self.broadphase;

        #[cfg(feature = "parallel")]
        self.particles
            .par_iter_mut()
            .for_each(|p| step_particle(p, world, broadphase, dt));

        #[cfg(not(feature = "parallel"))]
        for p in &mut self.particles {
            step_particle(p, world, broadphase, dt);
        }
    }

    /// Run fixed steps of `dt` until `seconds` have been simulated
    ///
    /// Returns the number of steps taken.
    pub fn step_time(&mut self, seconds: f64, dt: f64) -> u32 {
        if !(dt > 0.0) {
            return 0;
        }
        let mut steps = 0;
        let mut elapsed = 0.0;
        while elapsed + dt * 0.5 < seconds {
            self.update(dt);
            elapsed += dt;
            steps += 1;
        }
        steps
    }
}

/// Environment, contact and acceleration at the particle's current position
fn evaluate<W: World, B: BroadPhase>(p: &mut Particle, world: &W, broadphase: &B, dt: f64) -> Vector3 {
    p.force = Vector3::ZERO;
    world.process(p, dt);

    let candidates = broadphase.possible_collisions(p.center);
    resolve_contacts(p, &candidates, dt);

    p.force * p.inv_mass()
}

fn step_particle<W: World, B: BroadPhase>(p: &mut Particle, world: &W, broadphase: &B, dt: f64) {
    p.old_center = p.center;
    if p.is_immovable() {
        return;
    }

    let half_dt = dt / 2.0;

    let acc = evaluate(p, world, broadphase, dt);
    p.center += dt * (p.velocity + half_dt * acc);
    p.velocity += dt * acc;

    let new_acc = evaluate(p, world, broadphase, dt);
    p.velocity += half_dt * (new_acc - acc);
    p.acceleration = new_acc;
}
