//! Tests for reprojection to WGS84

extern crate std;

use crate::coordinate::{CoordinateSystem, CoordinateTransformer, Point};
use crate::errors::TreeKitError;

fn assert_close(actual: Point, lon: f64, lat: f64, tolerance: f64) {
    std::assert!((actual.x - lon).abs() < tolerance, "lon {} != {}", actual.x, lon);
    std::assert!((actual.y - lat).abs() < tolerance, "lat {} != {}", actual.y, lat);
}

#[test]
fn test_identity_for_wgs84() {
    let transformer = CoordinateTransformer::to_wgs84(CoordinateSystem::WGS84).unwrap();
    let point = Point::new(8.5, 47.3);
    std::assert_eq!(transformer.transform(&point).unwrap(), point);
}

#[test]
fn test_web_mercator_inverse() {
    let transformer = CoordinateTransformer::to_wgs84(CoordinateSystem::WebMercator).unwrap();
    assert_close(transformer.transform(&Point::new(0.0, 0.0)).unwrap(), 0.0, 0.0, 1e-12);
    assert_close(transformer.transform(&Point::new(20037508.342789244, 0.0)).unwrap(), 180.0, 0.0, 1e-9);
}

#[test]
fn test_utm_central_meridian() {
    // On the central meridian of zone 32 (9 E) at the false easting
    let transformer = CoordinateTransformer::to_wgs84(CoordinateSystem::UTM(32, true)).unwrap();
    let result = transformer.transform(&Point::new(500000.0, 0.0)).unwrap();
    assert_close(result, 9.0, 0.0, 1e-6);
}

#[test]
fn test_utm_south_false_northing() {
    let transformer = CoordinateTransformer::to_wgs84(CoordinateSystem::UTM(33, false)).unwrap();
    let result = transformer.transform(&Point::new(500000.0, 10_000_000.0)).unwrap();
    assert_close(result, 15.0, 0.0, 1e-6);
}

#[test]
fn test_unsupported_crs_is_projection_error() {
    let result = CoordinateTransformer::to_wgs84(CoordinateSystem::Other(9999));
    std::assert!(matches!(result, Err(TreeKitError::Projection(_))));
}
