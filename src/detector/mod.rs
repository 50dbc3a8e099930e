//! Object detector interface
//!
//! The model itself lives outside this crate. The pipeline only needs
//! something implementing [`Detector`]: given one tile image and the two
//! thresholds it returns boxes in tile-local pixels. Plain closures
//! implement the trait, and [`ReplayDetector`] serves boxes recorded by an
//! external model run.

mod detection;
mod nms;
mod replay;

pub use detection::{BoundingBox, Detection, DetectionParams};
pub use nms::non_max_suppression;
pub use replay::ReplayDetector;

use std::error::Error;

use crate::pipeline::Tile;

/// Result of one detector call
pub type DetectorResult = Result<Vec<Detection>, Box<dyn Error + Send + Sync>>;

/// Trait for tile detectors
pub trait Detector {
    /// Short name used in log messages
    fn name(&self) -> &str {
        "detector"
    }

    /// Detects objects in one tile
    ///
    /// # Arguments
    /// * `tile` - Tile pixels and origin
    /// * `params` - Confidence and IoU thresholds
    ///
    /// # Returns
    /// Boxes in the tile's own pixel coordinates
    fn detect(&self, tile: &Tile, params: &DetectionParams) -> DetectorResult;
}

impl<F> Detector for F
where
    F: Fn(&Tile, &DetectionParams) -> DetectorResult,
{
    fn name(&self) -> &str {
        "closure"
    }

    fn detect(&self, tile: &Tile, params: &DetectionParams) -> DetectorResult {
        self(tile, params)
    }
}
