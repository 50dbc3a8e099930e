//! Canopy height validation of candidate points

use crate::coordinate::Point;
use crate::raster::HeightGrid;

/// Keeps points standing on vegetation at least `threshold` tall
pub struct HeightFilter {
    grid: HeightGrid,
    threshold: f64,
}

impl HeightFilter {
    /// Create a filter over a loaded height grid
    ///
    /// The threshold is rounded to the precision of the grid's cells, so
    /// an `f32` cell holding the threshold value passes while `f64` cells
    /// are compared at full precision.
    pub fn new(grid: HeightGrid, threshold: f64) -> Self {
        let threshold = grid.cell_precision(threshold);
        HeightFilter { grid, threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Whether the point lies on a valid cell with height `>= threshold`
    pub fn accepts(&self, point: &Point) -> bool {
        self.grid.sample(point).is_some_and(|height| height >= self.threshold)
    }

    pub fn grid(&self) -> &HeightGrid {
        &self.grid
    }
}
