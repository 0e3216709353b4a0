//! Broad-phase spatial index for static obstacles
//!
//! Obstacles are bucketed on a uniform 2D grid over X/Y; the Z axis is
//! collapsed, so a bucket is a whole vertical column of the world.
//! Queries return candidates only, exact containment is for the narrow phase.

use serde::{Deserialize, Serialize};

use super::collider::{test_box_box, test_point_box};
use super::shape::{Aabb, Obstacle};
use super::vector::{Vector3, VectorExt};
use crate::SimError;

/// Upper bound on `cols * rows` for a grid
pub const MAX_GRID_BUCKETS: usize = 1 << 24;

/// Stable handle to an obstacle stored in a broad phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObstacleId {
    slot: u32,
    /// Unique per insertion, so a stale handle never reaches a newer obstacle
    stamp: u64,
}

/// Candidate lookup for static geometry
pub trait BroadPhase {
    /// Index an obstacle
    fn add(&mut self, obstacle: Obstacle) -> Result<ObstacleId, SimError>;

    /// Drop an obstacle from the index, returning it
    fn remove(&mut self, id: ObstacleId) -> Option<Obstacle>;

    /// Obstacles that might contain `point`
    fn possible_collisions(&self, point: Vector3) -> Vec<&Obstacle>;

    /// Obstacles that do contain `point`
    fn collisions(&self, point: Vector3) -> Vec<&Obstacle> {
        let mut found = self.possible_collisions(point);
        found.retain(|o| test_point_box(point, &o.aabb));
        found
    }

    /// Obstacles that intersect `aabb`
    ///
    /// Searches around the box center, so it is complete for query boxes no
    /// wider than the obstacles the index accepts.
    fn collisions_box(&self, aabb: &Aabb) -> Vec<&Obstacle> {
        let mut found = self.possible_collisions(aabb.center());
        found.retain(|o| test_box_box(aabb, &o.aabb));
        found
    }

    fn get(&self, id: ObstacleId) -> Option<&Obstacle>;

    /// Remove every obstacle
    fn clear(&mut self);

    /// Number of indexed obstacles
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Broad phase for worlds without static geometry
#[derive(Debug, Clone, Copy, Default)]
pub struct NullBroadPhase;

impl BroadPhase for NullBroadPhase {
    fn add(&mut self, _obstacle: Obstacle) -> Result<ObstacleId, SimError> {
        Ok(ObstacleId { slot: 0, stamp: 0 })
    }

    fn remove(&mut self, _id: ObstacleId) -> Option<Obstacle> {
        None
    }

    fn possible_collisions(&self, _point: Vector3) -> Vec<&Obstacle> {
        Vec::new()
    }

    fn get(&self, _id: ObstacleId) -> Option<&Obstacle> {
        None
    }

    fn clear(&mut self) {}

    fn len(&self) -> usize {
        0
    }
}

/// Uniform grid of obstacle buckets
///
/// Each obstacle lives in the bucket of its center. Because an obstacle may
/// not be wider than half a cell, any point inside it lies in the center's
/// bucket or one of its eight neighbours, so a 3×3 query never misses it.
#[derive(Debug, Clone)]
pub struct ArrayGrid2D {
    x_min: f64,
    y_min: f64,
    cell_size: f64,
    inv_cell_size: f64,
    cols: usize,
    rows: usize,
    buckets: Vec<Vec<ObstacleId>>,
    slots: Vec<ObstacleSlot>,
    free: Vec<u32>,
    next_stamp: u64,
    count: usize,
}

#[derive(Debug, Clone)]
struct ObstacleSlot {
    stamp: u64,
    /// `None` marks a free slot
    obstacle: Option<Obstacle>,
}

impl ArrayGrid2D {
    /// Grid over `[x_min, x_max] × [y_min, y_max]` with square cells
    pub fn new(x_min: f64, x_max: f64, y_min: f64, y_max: f64, cell_size: f64) -> Result<Self, SimError> {
        if !(cell_size.is_finite() && cell_size > 0.0) {
            return Err(SimError::InvalidCellSize(cell_size));
        }
        let bounds_ok = [x_min, x_max, y_min, y_max].iter().all(|v| v.is_finite());
        if !bounds_ok || x_min >= x_max || y_min >= y_max {
            return Err(SimError::InvalidBounds {
                min: [x_min, y_min, 0.0],
                max: [x_max, y_max, 0.0],
            });
        }

        let cols = ((x_max - x_min) / cell_size).ceil();
        let rows = ((y_max - y_min) / cell_size).ceil();
        if cols * rows > MAX_GRID_BUCKETS as f64 {
            log::error!("Grid of {}x{} cells of size {} is too large", cols, rows, cell_size);
            return Err(SimError::InvalidCellSize(cell_size));
        }
        let (cols, rows) = (cols as usize, rows as usize);

        log::info!("Grid created: {}x{} cells of size {}", cols, rows, cell_size);

        Ok(Self {
            x_min,
            y_min,
            cell_size,
            inv_cell_size: 1.0 / cell_size,
            cols,
            rows,
            buckets: vec![Vec::new(); cols * rows],
            slots: Vec::new(),
            free: Vec::new(),
            next_stamp: 0,
            count: 0,
        })
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Add every obstacle, stopping at the first rejection
    pub fn add_all<I>(&mut self, obstacles: I) -> Result<Vec<ObstacleId>, SimError>
    where
        I: IntoIterator<Item = Obstacle>,
    {
        obstacles.into_iter().map(|o| self.add(o)).collect()
    }

    /// Column and row of the cell containing `p`; may lie outside the grid
    #[inline]
    fn cell_coords(&self, p: Vector3) -> (i64, i64) {
        let col = ((p.x - self.x_min) * self.inv_cell_size).floor() as i64;
        let row = ((p.y - self.y_min) * self.inv_cell_size).floor() as i64;
        (col, row)
    }

    /// Bucket index for in-grid coordinates
    #[inline]
    fn bucket_index(&self, col: i64, row: i64) -> Option<usize> {
        if col < 0 || row < 0 || col >= self.cols as i64 || row >= self.rows as i64 {
            return None;
        }
        Some(row as usize * self.cols + col as usize)
    }
}

impl BroadPhase for ArrayGrid2D {
    fn add(&mut self, obstacle: Obstacle) -> Result<ObstacleId, SimError> {
        let extent = obstacle.extent();
        let half_cell = self.cell_size / 2.0;
        if extent.x > half_cell || extent.y > half_cell {
            log::error!(
                "Obstacle {:?} is bigger than a grid cell (size {})",
                obstacle.aabb,
                self.cell_size
            );
            return Err(SimError::ObstacleTooLarge {
                extent: extent.to_array3(),
                cell_size: self.cell_size,
            });
        }

        let center = obstacle.center();
        let (col, row) = self.cell_coords(center);
        let Some(index) = self.bucket_index(col, row) else {
            log::error!("Obstacle center {:?} is outside the grid", center);
            return Err(SimError::OutOfBounds {
                point: center.to_array3(),
            });
        };

        let stamp = self.next_stamp;
        self.next_stamp += 1;
        let entry = ObstacleSlot {
            stamp,
            obstacle: Some(obstacle),
        };
        let slot = match self.free.pop() {
            Some(slot) => {
                self.slots[slot as usize] = entry;
                slot
            }
            None => {
                self.slots.push(entry);
                self.slots.len() as u32 - 1
            }
        };
        let id = ObstacleId { slot, stamp };
        self.buckets[index].push(id);
        self.count += 1;
        Ok(id)
    }

    fn remove(&mut self, id: ObstacleId) -> Option<Obstacle> {
        let entry = self.slots.get_mut(id.slot as usize)?;
        if entry.stamp != id.stamp {
            return None;
        }
        let obstacle = entry.obstacle.take()?;
        let (col, row) = self.cell_coords(obstacle.center());
        if let Some(index) = self.bucket_index(col, row) {
            self.buckets[index].retain(|&other| other != id);
        }
        self.free.push(id.slot);
        self.count -= 1;
        Some(obstacle)
    }

    fn possible_collisions(&self, point: Vector3) -> Vec<&Obstacle> {
        let (col, row) = self.cell_coords(point);
        let mut found = Vec::new();

        for dr in -1..=1 {
            for dc in -1..=1 {
                // edge buckets are skipped, never wrapped
                let Some(index) = self.bucket_index(col.saturating_add(dc), row.saturating_add(dr)) else {
                    continue;
                };
                found.extend(
                    self.buckets[index]
                        .iter()
                        .filter_map(|id| self.slots[id.slot as usize].obstacle.as_ref()),
                );
            }
        }
        found
    }

    fn get(&self, id: ObstacleId) -> Option<&Obstacle> {
        let entry = self.slots.get(id.slot as usize)?;
        if entry.stamp != id.stamp {
            return None;
        }
        entry.obstacle.as_ref()
    }

    fn clear(&mut self) {
        for bucket in &mut self.buckets {
            bucket.clear();
        }
        self.slots.clear();
        self.free.clear();
        self.count = 0;
    }

    fn len(&self) -> usize {
        self.count
    }
}
