//! Tile-local boxes to world coordinates

use crate::coordinate::Point;
use crate::detector::Detection;
use crate::raster::GeoTransform;

/// Maps detections through the primary raster's affine transform
#[derive(Debug, Clone, Copy)]
pub struct CoordinateMapper {
    transform: GeoTransform,
}

impl CoordinateMapper {
    pub fn new(transform: GeoTransform) -> Self {
        CoordinateMapper { transform }
    }

    /// World position of a detection's box centre
    ///
    /// The centre is shifted by the tile origin into raster pixel space and
    /// then transformed. No clamping is applied.
    pub fn map(&self, origin_x: u32, origin_y: u32, detection: &Detection) -> Point {
        let (cx, cy) = detection.bbox.center();
        self.transform.apply(cx + origin_x as f64, cy + origin_y as f64)
    }
}
