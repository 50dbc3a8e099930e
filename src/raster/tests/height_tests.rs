//! Tests for canopy height sampling

extern crate std;

use tempfile::TempDir;

use crate::coordinate::Point;
use crate::raster::{GeoRaster, GeoTransform, HeightCells, HeightGrid, RasterLimits};
use crate::tiff::tests::test_utils::{Samples, TestTiff};

fn grid() -> HeightGrid {
    // 3x2 cells of 1 m starting at (0, 2)
    let data = vec![1.0, 2.0, 3.0, 4.0, f32::NAN, -9999.0];
    HeightGrid::from_parts(3, 2, data, GeoTransform::from_origin(0.0, 2.0, 1.0, 1.0), Some(-9999.0)).unwrap()
}

#[test]
fn test_sample_uses_floor() {
    let grid = grid();
    std::assert_eq!(grid.sample(&Point::new(0.0, 2.0)), Some(1.0));
    std::assert_eq!(grid.sample(&Point::new(2.99, 1.01)), Some(3.0));
    std::assert_eq!(grid.sample(&Point::new(0.5, 0.5)), Some(4.0));
    std::assert_eq!(grid.index(&Point::new(0.5, 0.5)), Some((1, 0)));
}

#[test]
fn test_sample_outside_grid() {
    let grid = grid();
    std::assert_eq!(grid.sample(&Point::new(-0.01, 1.0)), None);
    std::assert_eq!(grid.sample(&Point::new(3.0, 1.0)), None);
    std::assert_eq!(grid.sample(&Point::new(1.0, 0.0)), None);
    std::assert_eq!(grid.sample(&Point::new(1.0, 2.5)), None);
}

#[test]
fn test_nodata_and_nan_excluded() {
    let grid = grid();
    std::assert_eq!(grid.sample(&Point::new(1.5, 0.5)), None);
    std::assert_eq!(grid.sample(&Point::new(2.5, 0.5)), None);
}

#[test]
fn test_non_finite_points_sample_nothing() {
    // Cell (0, 0) must not be returned for a NaN coordinate
    let grid = grid();
    std::assert_eq!(grid.index(&Point::new(f64::NAN, f64::NAN)), None);
    std::assert_eq!(grid.sample(&Point::new(f64::NAN, 1.5)), None);
    std::assert_eq!(grid.sample(&Point::new(0.5, f64::INFINITY)), None);
}

#[test]
fn test_double_cells_keep_precision() {
    let data: Vec<f64> = vec![2.46 - 1e-8, 2.46, -9999.0, f64::NAN];
    let grid = HeightGrid::from_parts(2, 2, data, GeoTransform::from_origin(0.0, 2.0, 1.0, 1.0), Some(-9999.0)).unwrap();

    std::assert_eq!(grid.sample(&Point::new(0.5, 1.5)), Some(2.46 - 1e-8));
    std::assert_eq!(grid.sample(&Point::new(1.5, 1.5)), Some(2.46));
    std::assert_eq!(grid.sample(&Point::new(0.5, 0.5)), None);
    std::assert_eq!(grid.sample(&Point::new(1.5, 0.5)), None);
    std::assert_eq!(grid.cell_precision(2.46), 2.46);
}

#[test]
fn test_single_cells_round_to_f32() {
    std::assert_eq!(grid().cell_precision(2.46), 2.46f32 as f64);
}

#[test]
fn test_from_parts_validates() {
    let transform = GeoTransform::from_origin(0.0, 0.0, 1.0, 1.0);
    std::assert!(HeightGrid::from_parts(2, 2, vec![0.0f32; 3], transform, None).is_err());

    let singular = GeoTransform::new([0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
    std::assert!(HeightGrid::from_parts(1, 1, vec![0.0f32], singular, None).is_err());
}

#[test]
fn test_from_raster_reads_band_and_nodata() {
    let dir = TempDir::new().unwrap();
    let mut fixture = TestTiff::new(4, 3, Samples::F32((0..12).map(|i| i as f32 * 1.5).collect()));
    fixture.nodata = Some("0".to_string());
    fixture.tile_size = Some((16, 16));
    let path = dir.path().join("chm.tif");
    std::fs::write(&path, fixture.to_bytes()).unwrap();

    let mut raster = GeoRaster::open(&path, &RasterLimits::default()).unwrap();
    let grid = HeightGrid::from_raster(&mut raster).unwrap();

    std::assert_eq!((grid.width(), grid.height()), (4, 3));
    // Cell (row 1, col 2) at world (1002.5, 1998.5)
    std::assert_eq!(grid.sample(&Point::new(1002.5, 1998.5)), Some(9.0));
    std::assert_eq!(grid.sample(&Point::new(1000.5, 1999.5)), None);
    std::assert!(matches!(grid.cells(), HeightCells::Single(_)));
}

#[test]
fn test_from_raster_keeps_integer_heights_as_double() {
    let dir = TempDir::new().unwrap();
    let fixture = TestTiff::new(2, 2, Samples::U16(vec![100, 200, 300, 65535]));
    let path = dir.path().join("chm_u16.tif");
    std::fs::write(&path, fixture.to_bytes()).unwrap();

    let mut raster = GeoRaster::open(&path, &RasterLimits::default()).unwrap();
    let grid = HeightGrid::from_raster(&mut raster).unwrap();

    std::assert!(matches!(grid.cells(), HeightCells::Double(_)));
    std::assert_eq!(grid.sample(&Point::new(1001.5, 1998.5)), Some(65535.0));
}
