//! Error type for construction and validated mutation
//!
//! Stepping never fails; everything that can go wrong is caught when a
//! collaborator is built or a particle property is set.

use std::fmt;

/// Errors reported by constructors, setters and config loading
#[derive(Debug, Clone, PartialEq)]
pub enum SimError {
    /// Grid cell size must be finite and strictly positive
    InvalidCellSize(f64),
    /// Bounds must be finite with `min < max` on every axis
    InvalidBounds { min: [f64; 3], max: [f64; 3] },
    /// Obstacle extent exceeds half a grid cell on the indexed axes
    ObstacleTooLarge { extent: [f64; 3], cell_size: f64 },
    /// Obstacle center falls outside the grid
    OutOfBounds { point: [f64; 3] },
    /// A particle property was rejected
    InvalidParticle { field: &'static str, value: f64 },
    /// Settings could not be parsed or serialized
    Config(String),
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimError::InvalidCellSize(size) => {
                write!(f, "cell size must be positive and finite, got {}", size)
            }
            SimError::InvalidBounds { min, max } => {
                write!(f, "invalid bounds: min {:?} is not below max {:?}", min, max)
            }
            SimError::ObstacleTooLarge { extent, cell_size } => write!(
                f,
                "obstacle extent {:?} exceeds half of grid cell size {}",
                extent, cell_size
            ),
            SimError::OutOfBounds { point } => write!(f, "point {:?} is outside the grid", point),
            SimError::InvalidParticle { field, value } => {
                write!(f, "invalid particle {}: {}", field, value)
            }
            SimError::Config(msg) => write!(f, "config error: {}", msg),
        }
    }
}

impl std::error::Error for SimError {}

impl From<serde_json::Error> for SimError {
    fn from(err: serde_json::Error) -> Self {
        SimError::Config(err.to_string())
    }
}
