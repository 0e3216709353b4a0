//! World configuration
//!
//! Loaded from JSON and turned into ready-to-step collaborators.

use serde::{Deserialize, Serialize};

use crate::SimError;
use crate::consts::{EARTH_GRAVITY, INITIAL_PARTICLE_CAPACITY};
use crate::sim::{ArrayGrid2D, Cell, CellWorld, FluidCell, Simulator, Vector3};

/// Fluid filling the world by default
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum FluidPreset {
    Vacuum,
    #[default]
    Air,
    Water,
}

impl FluidPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            FluidPreset::Vacuum => "Vacuum",
            FluidPreset::Air => "Air",
            FluidPreset::Water => "Water",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "vacuum" | "none" => Some(FluidPreset::Vacuum),
            "air" => Some(FluidPreset::Air),
            "water" => Some(FluidPreset::Water),
            _ => None,
        }
    }

    pub fn fluid(&self) -> FluidCell {
        match self {
            FluidPreset::Vacuum => FluidCell::vacuum(),
            FluidPreset::Air => FluidCell::air(),
            FluidPreset::Water => FluidCell::water(),
        }
    }
}

/// Simulation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === World ===
    pub world_min: Vector3,
    pub world_max: Vector3,
    /// Acceleration applied to every particle (m/s²)
    pub gravity: Vector3,
    /// Fluid everywhere not covered by a region
    pub ambient: FluidPreset,
    /// Uniform flow of the ambient fluid (m/s)
    pub ambient_flow: Vector3,
    /// Fill everything below this height with water
    pub water_level: Option<f64>,

    // === Broad phase ===
    /// Side of a grid cell; obstacles may be at most half this wide
    pub grid_cell_size: f64,

    // === Storage ===
    pub initial_capacity: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            world_min: Vector3::splat(-1000.0),
            world_max: Vector3::splat(1000.0),
            gravity: Vector3::new(0.0, 0.0, EARTH_GRAVITY),
            ambient: FluidPreset::Air,
            ambient_flow: Vector3::ZERO,
            water_level: None,

            grid_cell_size: 10.0,

            initial_capacity: INITIAL_PARTICLE_CAPACITY,
        }
    }
}

impl Settings {
    pub fn from_json(json: &str) -> Result<Self, SimError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        log::info!(
            "Loaded settings: ambient={} cell_size={}",
            settings.ambient.as_str(),
            settings.grid_cell_size
        );
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String, SimError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject settings that no collaborator could be built from
    pub fn validate(&self) -> Result<(), SimError> {
        let finite = self.world_min.is_finite() && self.world_max.is_finite();
        if !finite || !self.world_min.cmplt(self.world_max).all() {
            return Err(SimError::InvalidBounds {
                min: self.world_min.to_array(),
                max: self.world_max.to_array(),
            });
        }
        if !(self.grid_cell_size.is_finite() && self.grid_cell_size > 0.0) {
            return Err(SimError::InvalidCellSize(self.grid_cell_size));
        }
        if !self.gravity.is_finite() || !self.ambient_flow.is_finite() {
            return Err(SimError::Config("gravity and flow must be finite".into()));
        }
        if let Some(level) = self.water_level {
            if !(level > self.world_min.z && level <= self.world_max.z) {
                return Err(SimError::Config(format!("water level {} outside the world", level)));
            }
        }
        if self.initial_capacity == 0 {
            return Err(SimError::Config("initial capacity must be positive".into()));
        }
        Ok(())
    }

    pub fn build_world(&self) -> Result<CellWorld, SimError> {
        let ambient = Cell::Fluid(self.ambient.fluid().with_flow(self.ambient_flow));
        let mut world = CellWorld::new(self.world_min, self.world_max, ambient)?.with_gravity(self.gravity);
        if let Some(level) = self.water_level {
            let top = Vector3::new(self.world_max.x, self.world_max.y, level);
            world = world.with_region(self.world_min, top, Cell::Fluid(FluidCell::water()))?;
        }
        Ok(world)
    }

    /// Grid spanning the world's x/y footprint
    pub fn build_grid(&self) -> Result<ArrayGrid2D, SimError> {
        ArrayGrid2D::new(
            self.world_min.x,
            self.world_max.x,
            self.world_min.y,
            self.world_max.y,
            self.grid_cell_size,
        )
    }

    pub fn build_simulator(&self) -> Result<Simulator<CellWorld, ArrayGrid2D>, SimError> {
        self.validate()?;
        Ok(Simulator::with_capacity(
            self.build_world()?,
            self.build_grid()?,
            self.initial_capacity,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::WATER_DENSITY;
    use crate::sim::{Obstacle, Particle};
    use crate::sim::broadphase::BroadPhase;

    #[test]
    fn test_preset_names() {
        for preset in [FluidPreset::Vacuum, FluidPreset::Air, FluidPreset::Water] {
            assert_eq!(FluidPreset::from_str(preset.as_str()), Some(preset));
        }
        assert_eq!(FluidPreset::from_str("WATER"), Some(FluidPreset::Water));
        assert_eq!(FluidPreset::from_str("lava"), None);
    }

    #[test]
    fn test_default_is_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.ambient, FluidPreset::Air);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings = Settings::from_json(r#"{ "ambient": "Water", "grid_cell_size": 4.0 }"#).unwrap();
        assert_eq!(settings.ambient, FluidPreset::Water);
        assert_eq!(settings.grid_cell_size, 4.0);
        assert_eq!(settings.initial_capacity, INITIAL_PARTICLE_CAPACITY);
    }

    #[test]
    fn test_json_round_trip() {
        let mut settings = Settings::default();
        settings.water_level = Some(-10.0);
        settings.ambient_flow = Vector3::new(-5.0, 0.0, 0.0);
        let json = settings.to_json().unwrap();
        assert_eq!(Settings::from_json(&json).unwrap(), settings);
    }

    #[test]
    fn test_invalid_settings_rejected() {
        assert!(matches!(
            Settings::from_json(r#"{ "grid_cell_size": 0.0 }"#),
            Err(SimError::InvalidCellSize(_))
        ));
        assert!(matches!(
            Settings::from_json(r#"{ "world_min": [0, 0, 0], "world_max": [10, 0, 10] }"#),
            Err(SimError::InvalidBounds { .. })
        ));
        assert!(matches!(
            Settings::from_json(r#"{ "water_level": 5000.0 }"#),
            Err(SimError::Config(_))
        ));
        assert!(matches!(Settings::from_json("{"), Err(SimError::Config(_))));
    }

    #[test]
    fn test_water_level_layers_world() {
        let settings = Settings {
            water_level: Some(0.0),
            ..Settings::default()
        };
        let world = settings.build_world().unwrap();
        let Cell::Fluid(below) = world.cell(Vector3::new(0.0, 0.0, -1.0)) else {
            panic!("expected fluid");
        };
        assert_eq!(below.density, WATER_DENSITY);
        assert!(!world.are_neighbours(Vector3::new(0.0, 0.0, -1.0), Vector3::new(0.0, 0.0, 1.0)));
    }

    #[test]
    fn test_build_simulator() {
        let settings = Settings {
            initial_capacity: 4,
            ..Settings::default()
        };
        let mut sim = settings.build_simulator().unwrap();
        assert_eq!(sim.capacity(), 4);
        assert_eq!(sim.broadphase().cols(), 200);

        sim.broadphase_mut()
            .add(Obstacle::new(Vector3::new(-2.0, -2.0, -2.0), Vector3::new(2.0, 2.0, 0.0), 0.4))
            .unwrap();
        let particle = Particle::with_mass_radius(70.0, 0.25, Vector3::new(0.0, 0.0, 1.0), Vector3::ZERO).unwrap();
        let id = sim.add_particle(particle);
        sim.step_time(2.0, 1.0 / 60.0);
        let z = sim.particle(id).unwrap().center.z;
        assert!(z >= 0.0 - crate::consts::CONTACT_EPSILON && z < 1.0);
    }
}
