//! Georeferenced raster access
//!
//! [`GeoRaster`] opens a GeoTIFF read-only and serves pixel windows;
//! [`HeightGrid`] holds a canopy height band for point sampling.

mod transform;
mod georef;
mod dataset;
mod height;
#[cfg(test)]
mod tests;

pub use transform::GeoTransform;
pub use georef::GeoReference;
pub use dataset::{GeoRaster, RasterLimits};
pub use height::{HeightCells, HeightGrid};
