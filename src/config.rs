//! Pipeline configuration
//!
//! Values come from built-in defaults, optionally overridden by a TOML file
//! and then by command-line flags. Every field is optional in the file:
//!
//! ```toml
//! height_threshold = 3.0
//! cluster_eps = 2.5
//! assume_crs = "EPSG:32632"
//! ```

use std::fs;
use std::path::Path;

use log::debug;
use serde::Deserialize;

use crate::coordinate::CoordinateSystem;
use crate::detector::DetectionParams;
use crate::errors::{TreeKitError, TreeKitResult};
use crate::raster::RasterLimits;

pub const DEFAULT_TILE_SIZE: u32 = 2048;
pub const DEFAULT_HEIGHT_THRESHOLD: f64 = 2.5;
pub const DEFAULT_CONFIDENCE: f64 = 0.05;
pub const DEFAULT_IOU: f64 = 0.1;
pub const DEFAULT_CLUSTER_EPS: f64 = 2.86;
pub const DEFAULT_OUTPUT_STEM: &str = "Points_shapefile";

/// Settings for one pipeline run
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Nominal tile width and height in pixels
    pub tile_size: u32,
    /// Distance between tile origins; defaults to `tile_size`
    pub tile_step: Option<u32>,
    /// Minimum canopy height, inclusive
    pub height_threshold: f64,
    /// Detector confidence threshold
    pub confidence: f64,
    /// Detector overlap-suppression threshold
    pub iou: f64,
    /// Clustering radius in CRS units
    pub cluster_eps: f64,
    /// DBSCAN neighbourhood size for core points
    pub min_points: usize,
    /// Largest raster accepted, in pixels
    pub max_raster_pixels: Option<u64>,
    /// CRS used when the primary raster declares none
    pub assume_crs: Option<String>,
    /// Base name of the output files
    pub output_stem: String,
    /// Whether to write `<stem>.geojson`
    pub write_geojson: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            tile_size: DEFAULT_TILE_SIZE,
            tile_step: None,
            height_threshold: DEFAULT_HEIGHT_THRESHOLD,
            confidence: DEFAULT_CONFIDENCE,
            iou: DEFAULT_IOU,
            cluster_eps: DEFAULT_CLUSTER_EPS,
            min_points: 1,
            max_raster_pixels: None,
            assume_crs: None,
            output_stem: DEFAULT_OUTPUT_STEM.to_string(),
            write_geojson: true,
        }
    }
}

impl PipelineConfig {
    /// Parses a TOML document; absent keys keep their defaults
    pub fn from_toml_str(content: &str) -> TreeKitResult<Self> {
        let config: PipelineConfig = toml::from_str(content)
            .map_err(|e| TreeKitError::Config(format!("invalid configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a TOML file
    pub fn from_file(path: &Path) -> TreeKitResult<Self> {
        debug!("Loading configuration from {}", path.display());
        let content = fs::read_to_string(path).map_err(|e| TreeKitError::Config(
            format!("cannot read configuration file {}: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    /// Checks value ranges
    pub fn validate(&self) -> TreeKitResult<()> {
        if self.tile_size == 0 || self.tile_step == Some(0) {
            return Err(TreeKitError::Config("tile size and step must be positive".to_string()));
        }

        let non_negative = [
            ("height_threshold", self.height_threshold),
            ("confidence", self.confidence),
            ("iou", self.iou),
            ("cluster_eps", self.cluster_eps),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(TreeKitError::Config(format!("{} must be finite and non-negative, got {}", name, value)));
            }
        }

        if self.min_points == 0 {
            return Err(TreeKitError::Config("min_points must be at least 1".to_string()));
        }
        if self.max_raster_pixels == Some(0) {
            return Err(TreeKitError::Config("max_raster_pixels must be positive".to_string()));
        }
        if self.output_stem.is_empty() || self.output_stem.contains(['/', '\\']) {
            return Err(TreeKitError::Config(format!("invalid output stem {:?}", self.output_stem)));
        }

        self.assumed_crs().map(|_| ())
    }

    /// Step between tile origins
    pub fn step(&self) -> u32 {
        self.tile_step.unwrap_or(self.tile_size)
    }

    /// Parsed `assume_crs`
    pub fn assumed_crs(&self) -> TreeKitResult<Option<CoordinateSystem>> {
        self.assume_crs.as_deref().map(CoordinateSystem::from_string).transpose()
    }

    pub fn detection_params(&self) -> DetectionParams {
        DetectionParams { confidence: self.confidence, iou: self.iou }
    }

    pub fn raster_limits(&self) -> RasterLimits {
        RasterLimits { max_pixels: self.max_raster_pixels }
    }
}
