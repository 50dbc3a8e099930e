//! Reprojection to WGS84 longitude/latitude
//!
//! WGS84 input passes through and Web Mercator uses the closed-form
//! inverse. Everything else goes through proj4rs with the definitions from
//! [`CoordinateSystem::proj_string`].

use std::f64::consts::PI;

use proj4rs::proj::Proj;
use proj4rs::transform::transform;

use super::crs::CoordinateSystem;
use super::point::Point;
use crate::errors::{TreeKitError, TreeKitResult};

/// Semi-major axis of the Web Mercator sphere in meters
const EARTH_RADIUS: f64 = 6378137.0;

enum Strategy {
    Identity,
    WebMercatorInverse,
    Proj { source: Proj, target: Proj, source_geographic: bool },
}

/// Converts points from one source CRS to WGS84 lon/lat degrees
pub struct CoordinateTransformer {
    source: CoordinateSystem,
    strategy: Strategy,
}

impl CoordinateTransformer {
    /// Build a transformer from `source` to EPSG:4326
    ///
    /// # Arguments
    /// * `source` - CRS of the input coordinates
    ///
    /// # Returns
    /// The transformer, or a projection error if the CRS has no definition
    pub fn to_wgs84(source: CoordinateSystem) -> TreeKitResult<Self> {
        let strategy = match source {
            CoordinateSystem::WGS84 => Strategy::Identity,
            CoordinateSystem::WebMercator => Strategy::WebMercatorInverse,
            other => {
                let definition = other.proj_string().ok_or_else(|| TreeKitError::Projection(
                    format!("no reprojection available for {}", other.description())))?;
                let target_definition = CoordinateSystem::WGS84.proj_string()
                    .ok_or_else(|| TreeKitError::Projection("missing WGS84 definition".to_string()))?;

                let source_proj = Proj::from_proj_string(&definition)
                    .map_err(|e| TreeKitError::Projection(format!("invalid definition for {}: {:?}", other, e)))?;
                let target_proj = Proj::from_proj_string(&target_definition)
                    .map_err(|e| TreeKitError::Projection(format!("invalid WGS84 definition: {:?}", e)))?;

                Strategy::Proj {
                    source: source_proj,
                    target: target_proj,
                    source_geographic: other.is_geographic(),
                }
            },
        };

        Ok(CoordinateTransformer { source, strategy })
    }

    /// The CRS this transformer reads
    pub fn source(&self) -> CoordinateSystem {
        self.source
    }

    /// Transform one point to longitude/latitude degrees
    pub fn transform(&self, point: &Point) -> TreeKitResult<Point> {
        match &self.strategy {
            Strategy::Identity => Ok(*point),
            Strategy::WebMercatorInverse => Ok(web_mercator_to_wgs84(point)),
            Strategy::Proj { source, target, source_geographic } => {
                let mut coords = if *source_geographic {
                    (point.x.to_radians(), point.y.to_radians(), 0.0)
                } else {
                    (point.x, point.y, 0.0)
                };

                transform(source, target, &mut coords).map_err(|e| TreeKitError::Projection(
                    format!("transform of ({}, {}) from {} failed: {:?}", point.x, point.y, self.source, e)))?;

                Ok(Point::new(coords.0.to_degrees(), coords.1.to_degrees()))
            },
        }
    }
}

/// Inverse spherical Mercator
fn web_mercator_to_wgs84(point: &Point) -> Point {
    let lon = point.x * 180.0 / (EARTH_RADIUS * PI);
    let lat = 180.0 / PI * (2.0 * (point.y / EARTH_RADIUS).exp().atan() - PI / 2.0);
    Point::new(lon, lat)
}
