//! Coordinate handling for geospatial data
//!
//! Points, CRS identification and reprojection to WGS84.

mod point;
mod transform;
mod crs;
#[cfg(test)]
mod tests;

pub use self::point::Point;
pub use self::transform::CoordinateTransformer;
pub use self::crs::CoordinateSystem;
