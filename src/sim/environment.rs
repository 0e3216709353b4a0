//! Environment model: world bounds, gravity and the cells particles move through
//!
//! Cells are flyweights owned by the world: a handful of `Cell` values are
//! stored once and every region of space refers to one of them by `CellId`.

use serde::{Deserialize, Serialize};

use super::collider::test_point_box;
use super::forces::{sphere_quadratic_drag, sphere_quadratic_flow};
use super::particle::Particle;
use super::shape::Aabb;
use super::vector::{Vector3, VectorExt};
use crate::SimError;
use crate::consts::{AIR_DENSITY, EARTH_GRAVITY, WATER_DENSITY};

/// Influence of the surroundings on a particle
pub trait World {
    /// Clamp the particle into the world, then accumulate buoyancy-scaled
    /// gravity and the cell forces into `particle.force`
    fn process(&self, particle: &mut Particle, dt: f64) {
        let (from, mut to) = (particle.old_center, particle.center);
        self.correct_positions(from, &mut to);
        particle.center = to;

        let weight = self.gravity() * (self.buoyancy(particle) * particle.mass());
        particle.force += weight + self.forces(particle, dt);
    }

    /// Environmental forces excluding gravity
    fn forces(&self, particle: &Particle, dt: f64) -> Vector3;

    /// Gravity as an acceleration
    fn gravity(&self) -> Vector3;

    /// Scale applied to gravity for this particle
    fn buoyancy(&self, particle: &Particle) -> f64;

    /// Correct `to` so that a move from `from` stays legal
    fn correct_positions(&self, from: Vector3, to: &mut Vector3);
}

/// Fluid properties of a cell
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FluidCell {
    /// kg/m³
    pub density: f64,
    /// Ambient flow velocity; zero for still fluid
    pub flow: Vector3,
}

impl FluidCell {
    pub fn new(density: f64) -> Self {
        Self {
            density,
            flow: Vector3::ZERO,
        }
    }

    pub fn with_flow(mut self, flow: Vector3) -> Self {
        self.flow = flow;
        self
    }

    /// Empty space: no drag, full gravity
    pub fn vacuum() -> Self {
        Self::new(0.0)
    }

    pub fn air() -> Self {
        Self::new(AIR_DENSITY)
    }

    pub fn water() -> Self {
        Self::new(WATER_DENSITY)
    }

    /// Quadratic drag opposing the particle plus the push of the flow
    pub fn forces(&self, p: &Particle) -> Vector3 {
        let drag = sphere_quadratic_drag(p.velocity, self.density, p.radius());
        if self.flow == Vector3::ZERO {
            return drag;
        }
        drag + sphere_quadratic_flow(self.flow, self.density, p.radius())
    }

    /// `1 - fluid_density / particle_density`
    pub fn buoyancy(&self, p: &Particle) -> f64 {
        1.0 - self.density / p.density()
    }
}

/// Physical content of a region of space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Cell {
    Fluid(FluidCell),
    /// Impenetrable matter. Contact is handled by the collision path
    Solid,
}

impl Cell {
    pub fn forces(&self, p: &Particle, _dt: f64) -> Vector3 {
        match self {
            Cell::Fluid(fluid) => fluid.forces(p),
            Cell::Solid => Vector3::ZERO,
        }
    }

    pub fn buoyancy(&self, p: &Particle) -> f64 {
        match self {
            Cell::Fluid(fluid) => fluid.buoyancy(p),
            Cell::Solid => 1.0,
        }
    }

    pub fn is_solid(&self) -> bool {
        matches!(self, Cell::Solid)
    }
}

/// Index into a world's cell table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellId(u32);

/// A box of space filled with one cell
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub bounds: Aabb,
    pub cell: CellId,
}

/// Bounded world partitioned into regions of flyweight cells
///
/// Lookup walks the regions in insertion order; the first region containing
/// the point wins, otherwise the default cell applies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CellWorld {
    bounds: Aabb,
    gravity: Vector3,
    cells: Vec<Cell>,
    regions: Vec<Region>,
    default_cell: CellId,
}

impl CellWorld {
    /// World filled with `default_cell`, Earth gravity along -Z
    pub fn new(min: Vector3, max: Vector3, default_cell: Cell) -> Result<Self, SimError> {
        let bounds = Aabb::from_min_max(min, max);
        if !bounds.is_valid() {
            return Err(SimError::InvalidBounds {
                min: min.to_array3(),
                max: max.to_array3(),
            });
        }
        log::info!("World created: min={:?} max={:?}", min, max);
        Ok(Self {
            bounds,
            gravity: Vector3::new(0.0, 0.0, EARTH_GRAVITY),
            cells: vec![default_cell],
            regions: Vec::new(),
            default_cell: CellId(0),
        })
    }

    pub fn with_gravity(mut self, gravity: Vector3) -> Self {
        self.gravity = gravity;
        self
    }

    /// Register a cell in the flyweight table
    pub fn add_cell(mut self, cell: Cell) -> (Self, CellId) {
        let id = CellId(self.cells.len() as u32);
        self.cells.push(cell);
        (self, id)
    }

    /// Fill `min..max` with an already registered cell
    pub fn add_region(mut self, min: Vector3, max: Vector3, cell: CellId) -> Result<Self, SimError> {
        let bounds = Aabb::from_min_max(min, max);
        if !bounds.is_valid() {
            return Err(SimError::InvalidBounds {
                min: min.to_array3(),
                max: max.to_array3(),
            });
        }
        if cell.0 as usize >= self.cells.len() {
            return Err(SimError::Config(format!("unknown cell id {}", cell.0)));
        }
        self.regions.push(Region { bounds, cell });
        Ok(self)
    }

    /// Register a cell and fill `min..max` with it
    pub fn with_region(self, min: Vector3, max: Vector3, cell: Cell) -> Result<Self, SimError> {
        let (world, id) = self.add_cell(cell);
        world.add_region(min, max, id)
    }

    pub fn bounds(&self) -> &Aabb {
        &self.bounds
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    /// Cell containing `point`
    pub fn cell(&self, point: Vector3) -> &Cell {
        let id = self
            .regions
            .iter()
            .find(|r| test_point_box(point, &r.bounds))
            .map(|r| r.cell)
            .unwrap_or(self.default_cell);
        &self.cells[id.0 as usize]
    }

    pub fn cell_by_id(&self, id: CellId) -> Option<&Cell> {
        self.cells.get(id.0 as usize)
    }

    /// True if both points lie in the same flyweight cell
    pub fn are_neighbours(&self, a: Vector3, b: Vector3) -> bool {
        std::ptr::eq(self.cell(a), self.cell(b))
    }

    pub fn is_over_bounds(&self, p: Vector3) -> bool {
        !test_point_box(p, &self.bounds)
    }
}

impl World for CellWorld {
    fn forces(&self, particle: &Particle, dt: f64) -> Vector3 {
        self.cell(particle.center).forces(particle, dt)
    }

    fn gravity(&self) -> Vector3 {
        self.gravity
    }

    fn buoyancy(&self, particle: &Particle) -> f64 {
        self.cell(particle.center).buoyancy(particle)
    }

    fn correct_positions(&self, _from: Vector3, to: &mut Vector3) {
        to.clamp_into(self.bounds.min(), self.bounds.max());
    }
}

/// Environment with no gravity, no forces and no bounds
#[derive(Debug, Clone, Copy, Default)]
pub struct NullWorld;

impl World for NullWorld {
    fn process(&self, _particle: &mut Particle, _dt: f64) {}

    fn forces(&self, _particle: &Particle, _dt: f64) -> Vector3 {
        Vector3::ZERO
    }

    fn gravity(&self) -> Vector3 {
        Vector3::ZERO
    }

    fn buoyancy(&self, _particle: &Particle) -> f64 {
        1.0
    }

    fn correct_positions(&self, _from: Vector3, _to: &mut Vector3) {}
}
