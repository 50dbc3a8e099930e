//! Tests for the per-tile pipeline

extern crate std;

use std::cell::Cell;

use crate::coordinate::Point;
use crate::detector::{Detection, DetectionParams, DetectorResult};
use crate::errors::TreeKitError;
use crate::pipeline::{CoordinateMapper, HeightFilter, Tile, TileGrid, TilePipeline};
use crate::raster::{GeoTransform, HeightGrid};

use super::tiling_tests::BlankSource;

fn transform() -> GeoTransform {
    GeoTransform::from_origin(1000.0, 9000.0, 0.5, 0.5)
}

/// Height grid over the same extent at 16x coarser resolution
fn filter(height: f32) -> HeightFilter {
    let grid = HeightGrid::from_parts(256, 256, vec![height; 256 * 256], GeoTransform::from_origin(1000.0, 9000.0, 8.0, 8.0), None).unwrap();
    HeightFilter::new(grid, 2.5)
}

fn centred_box(_tile: &Tile, _params: &DetectionParams) -> DetectorResult {
    Ok(vec![Detection::new(1000.0, 1000.0, 1048.0, 1048.0, 0.9)])
}

#[test]
fn test_one_box_per_tile_maps_to_four_points() {
    let grid = TileGrid::square(4096, 4096, 2048).unwrap();
    let mut source = BlankSource::new(4096, 4096);
    let filter = filter(12.0);
    let pipeline = TilePipeline::new(&centred_box, CoordinateMapper::new(transform()), &filter, DetectionParams::default());

    let mut calls = Vec::new();
    let set = pipeline.run(&grid, &mut source, |done, total| calls.push((done, total))).unwrap();

    std::assert_eq!(set.tiles, 4);
    std::assert_eq!(set.raw_detections, 4);
    std::assert_eq!(set.points, vec![
        transform().apply(1024.0, 1024.0),
        transform().apply(3072.0, 1024.0),
        transform().apply(1024.0, 3072.0),
        transform().apply(3072.0, 3072.0),
    ]);
    std::assert_eq!(set.points[3], Point::new(2536.0, 7464.0));
    std::assert_eq!(calls, vec![(1, 4), (2, 4), (3, 4), (4, 4)]);
    std::assert_eq!(source.reads.len(), 4);
}

#[test]
fn test_low_canopy_removes_everything() {
    let grid = TileGrid::square(4096, 4096, 2048).unwrap();
    let mut source = BlankSource::new(4096, 4096);
    let filter = filter(1.0);
    let pipeline = TilePipeline::new(&centred_box, CoordinateMapper::new(transform()), &filter, DetectionParams::default());

    let set = pipeline.run(&grid, &mut source, |_, _| {}).unwrap();
    std::assert!(set.is_empty());
    std::assert_eq!(set.raw_detections, 4);
}

#[test]
fn test_params_reach_detector() {
    let seen = Cell::new(0.0);
    let detector = |_tile: &Tile, params: &DetectionParams| -> DetectorResult {
        seen.set(params.confidence);
        Ok(Vec::new())
    };
    let filter = filter(12.0);
    let params = DetectionParams { confidence: 0.25, iou: 0.4 };
    let pipeline = TilePipeline::new(&detector, CoordinateMapper::new(transform()), &filter, params);

    let tile = Tile { origin_x: 0, origin_y: 0, image: image::RgbImage::new(2, 2) };
    let (points, raw) = pipeline.process_tile(&tile).unwrap();
    std::assert!(points.is_empty());
    std::assert_eq!(raw, 0);
    std::assert_eq!(seen.get(), 0.25);
}

#[test]
fn test_detector_failure_names_tile() {
    let detector = |tile: &Tile, _params: &DetectionParams| -> DetectorResult {
        if tile.origin_x == 2048 {
            return Err("model crashed".into());
        }
        Ok(Vec::new())
    };
    let grid = TileGrid::square(4096, 2048, 2048).unwrap();
    let mut source = BlankSource::new(4096, 2048);
    let filter = filter(12.0);
    let pipeline = TilePipeline::new(&detector, CoordinateMapper::new(transform()), &filter, DetectionParams::default());

    match pipeline.run(&grid, &mut source, |_, _| {}) {
        Err(TreeKitError::Detector { tile_x, tile_y, message }) => {
            std::assert_eq!((tile_x, tile_y), (2048, 0));
            std::assert_eq!(message, "model crashed");
        },
        other => panic!("expected detector error, got {:?}", other),
    }
}
