//! Tree detection over GeoTIFF orthophotos
//!
//! An orthophoto is cut into tiles for a box detector; box centres are
//! mapped to world coordinates, checked against a canopy height raster,
//! merged by density clustering and exported as a zipped shapefile, OSM
//! XML and WGS84 GeoJSON. [`TreeKit`] runs the whole chain.

pub mod io;
pub mod tiff;
pub mod compression;
pub mod extractor;
pub mod coordinate;
pub mod raster;
pub mod detector;
pub mod pipeline;
pub mod vector;
pub mod config;
pub mod errors;
pub mod utils;
pub mod commands;
pub mod api;

pub use crate::api::{ProcessOutput, TreeKit};
pub use crate::config::PipelineConfig;
pub use crate::errors::{TreeKitError, TreeKitResult};

pub use coordinate::{CoordinateSystem, CoordinateTransformer, Point};
pub use detector::{BoundingBox, Detection, DetectionParams, Detector, DetectorResult, ReplayDetector};
pub use pipeline::{ClusterDeduplicator, CoordinateMapper, HeightFilter, Tile, TileGrid};
pub use raster::{GeoRaster, GeoTransform, HeightGrid, RasterLimits};
pub use vector::{FormatConverter, VectorDataset, VectorExporter};
