//! End-to-end runs of the detection pipeline over synthetic rasters

extern crate std;

mod common;

use std::fs::{self, File};
use std::io::Read;
use std::path::Path;

use quick_xml::events::Event;
use quick_xml::Reader;
use tempfile::TempDir;

use common::{GeoTiffFixture, ORIGIN_X, ORIGIN_Y};
use treekit::vector::ShapefileContents;
use treekit::{Detection, DetectionParams, DetectorResult, PipelineConfig, Tile, TreeKit, TreeKitError};

/// 64x64 orthophoto and canopy model; the bottom-right quadrant is low vegetation
fn write_rasters(dir: &Path) -> (std::path::PathBuf, std::path::PathBuf) {
    let image = GeoTiffFixture::rgb(64, 64).write(&dir.join("ortho.tif"));
    let chm = GeoTiffFixture::heights(64, 64, |col, row| if col >= 32 && row >= 32 { 1.0 } else { 5.0 })
        .write(&dir.join("chm.tif"));
    (image, chm)
}

fn small_tiles() -> PipelineConfig {
    PipelineConfig { tile_size: 32, ..PipelineConfig::default() }
}

/// One tree in the middle of every tile plus a tree straddling the first tile seam
fn seam_detector(tile: &Tile, _params: &DetectionParams) -> DetectorResult {
    let mut boxes = vec![Detection::new(14.0, 14.0, 18.0, 18.0, 0.9)];
    match (tile.origin_x, tile.origin_y) {
        (0, 0) => boxes.push(Detection::new(30.0, 14.0, 32.0, 18.0, 0.8)),
        (32, 0) => boxes.push(Detection::new(0.0, 14.0, 2.0, 18.0, 0.7)),
        _ => {},
    }
    Ok(boxes)
}

fn osm_nodes(xml: &str) -> Vec<(String, String, String)> {
    let mut reader = Reader::from_str(xml);
    let mut nodes = Vec::new();
    loop {
        match reader.read_event().unwrap() {
            Event::Start(e) | Event::Empty(e) if e.name().as_ref() == b"node" => {
                let attr = |key: &[u8]| e.try_get_attribute(key).unwrap().unwrap().unescape_value().unwrap().into_owned();
                nodes.push((attr(b"id"), attr(b"lon"), attr(b"lat")));
            },
            Event::Eof => break,
            _ => {},
        }
    }
    nodes
}

#[test]
fn test_full_run_deduplicates_and_filters() {
    let dir = TempDir::new().unwrap();
    let (image, chm) = write_rasters(dir.path());
    let out = dir.path().join("out");

    let treekit = TreeKit::new(small_tiles()).unwrap();
    let mut calls = Vec::new();
    let output = treekit.process(&image, &chm, &seam_detector, &out, |done, total| calls.push((done, total))).unwrap();

    std::assert_eq!(calls, vec![(1, 4), (2, 4), (3, 4), (4, 4)]);
    std::assert_eq!(output.tiles, 4);
    std::assert_eq!(output.raw_detections, 6);
    std::assert_eq!(output.accepted_points, 5);
    std::assert_eq!(output.tree_count, 4);

    let contents = ShapefileContents::read(&out.join("Points_shapefile.shp")).unwrap();
    let positions: Vec<(f64, f64)> = contents.geometry.shapes.iter().map(|s| (s[0].x, s[0].y)).collect();
    std::assert_eq!(positions, vec![
        (ORIGIN_X + 16.0, ORIGIN_Y - 16.0),
        (ORIGIN_X + 32.0, ORIGIN_Y - 16.0),
        (ORIGIN_X + 48.0, ORIGIN_Y - 16.0),
        (ORIGIN_X + 16.0, ORIGIN_Y - 48.0),
    ]);
    std::assert_eq!(contents.field_names(), vec!["FID".to_string(), "MEMBERS".to_string()]);

    let mut archive = zip::ZipArchive::new(File::open(&output.archive).unwrap()).unwrap();
    let mut names: Vec<String> = archive.file_names().map(str::to_string).collect();
    names.sort();
    std::assert_eq!(names, vec![
        "Points_shapefile.dbf", "Points_shapefile.prj", "Points_shapefile.shp", "Points_shapefile.shx",
    ]);
    let mut zipped_shp = Vec::new();
    archive.by_name("Points_shapefile.shp").unwrap().read_to_end(&mut zipped_shp).unwrap();
    std::assert_eq!(zipped_shp, fs::read(out.join("Points_shapefile.shp")).unwrap());

    let nodes = osm_nodes(&fs::read_to_string(&output.osm).unwrap());
    std::assert_eq!(nodes.len(), 4);
    std::assert_eq!(nodes.iter().map(|n| n.0.as_str()).collect::<Vec<_>>(), vec!["-1", "-2", "-3", "-4"]);
    for (_, lon, lat) in &nodes {
        let lon: f64 = lon.parse().unwrap();
        let lat: f64 = lat.parse().unwrap();
        std::assert!((8.99..9.01).contains(&lon), "lon {}", lon);
        std::assert!((45.0..45.3).contains(&lat), "lat {}", lat);
    }

    std::assert_eq!(output.geojson.features.len(), 4);
    let written: geojson::GeoJson = fs::read_to_string(output.geojson_path.unwrap()).unwrap().parse().unwrap();
    match written {
        geojson::GeoJson::FeatureCollection(collection) => {
            std::assert_eq!(collection.features.len(), 4);
            let members = collection.features[1].property("MEMBERS").and_then(|v| v.as_i64());
            std::assert_eq!(members, Some(2));
        },
        other => std::panic!("expected a feature collection, got {:?}", other),
    }
}

#[test]
fn test_rerun_reproduces_artifacts() {
    let dir = TempDir::new().unwrap();
    let (image, chm) = write_rasters(dir.path());
    let out = dir.path().join("out");
    let treekit = TreeKit::new(small_tiles()).unwrap();

    let first = treekit.process(&image, &chm, &seam_detector, &out, |_, _| {}).unwrap();
    let dbf = fs::read(out.join("Points_shapefile.dbf")).unwrap();
    let archive = fs::read(&first.archive).unwrap();
    let osm = fs::read(&first.osm).unwrap();

    let second = treekit.process(&image, &chm, &seam_detector, &out, |_, _| {}).unwrap();
    std::assert_eq!(fs::read(out.join("Points_shapefile.dbf")).unwrap(), dbf);
    std::assert_eq!(fs::read(&second.archive).unwrap(), archive);
    std::assert_eq!(fs::read(&second.osm).unwrap(), osm);
}

#[test]
fn test_no_detections_still_writes_artifacts() {
    let dir = TempDir::new().unwrap();
    let (image, chm) = write_rasters(dir.path());
    let out = dir.path().join("out");
    let config = PipelineConfig { write_geojson: false, ..small_tiles() };

    let nothing = |_: &Tile, _: &DetectionParams| -> DetectorResult { Ok(Vec::new()) };
    let output = TreeKit::new(config).unwrap().process(&image, &chm, &nothing, &out, |_, _| {}).unwrap();

    std::assert_eq!(output.tree_count, 0);
    std::assert!(output.geojson.features.is_empty());
    std::assert!(output.geojson_path.is_none());
    std::assert!(!out.join("Points_shapefile.geojson").exists());

    let archive = zip::ZipArchive::new(File::open(&output.archive).unwrap()).unwrap();
    std::assert_eq!(archive.len(), 4);

    let xml = fs::read_to_string(&output.osm).unwrap();
    std::assert!(xml.contains("<osm"));
    std::assert!(osm_nodes(&xml).is_empty());
}

#[test]
fn test_threshold_is_inclusive() {
    let dir = TempDir::new().unwrap();
    let image = GeoTiffFixture::rgb(32, 32).write(&dir.path().join("ortho.tif"));
    let chm = GeoTiffFixture::heights(32, 32, |_, _| 2.5).write(&dir.path().join("chm.tif"));

    let centre = |_: &Tile, _: &DetectionParams| -> DetectorResult { Ok(vec![Detection::new(10.0, 10.0, 20.0, 20.0, 0.5)]) };
    let output = TreeKit::new(small_tiles()).unwrap()
        .process(&image, &chm, &centre, &dir.path().join("out"), |_, _| {}).unwrap();
    std::assert_eq!(output.tree_count, 1);
}

#[test]
fn test_float64_heights_keep_precision() {
    let dir = TempDir::new().unwrap();
    let image = GeoTiffFixture::rgb(32, 32).write(&dir.path().join("ortho.tif"));
    // Just below 2.46, but equal to it once squeezed into f32
    let chm = GeoTiffFixture::heights_f64(32, 32, |_, _| 2.46 - 1e-8).write(&dir.path().join("chm.tif"));
    let config = PipelineConfig { height_threshold: 2.46, ..small_tiles() };

    let centre = |_: &Tile, _: &DetectionParams| -> DetectorResult { Ok(vec![Detection::new(10.0, 10.0, 20.0, 20.0, 0.5)]) };
    let output = TreeKit::new(config.clone()).unwrap()
        .process(&image, &chm, &centre, &dir.path().join("below"), |_, _| {}).unwrap();
    std::assert_eq!(output.raw_detections, 1);
    std::assert_eq!(output.accepted_points, 0);

    let chm = GeoTiffFixture::heights_f64(32, 32, |_, _| 2.46).write(&dir.path().join("chm_exact.tif"));
    let output = TreeKit::new(config).unwrap()
        .process(&image, &chm, &centre, &dir.path().join("exact"), |_, _| {}).unwrap();
    std::assert_eq!(output.accepted_points, 1);
}

#[test]
fn test_non_finite_box_is_not_sampled() {
    let dir = TempDir::new().unwrap();
    let image = GeoTiffFixture::rgb(32, 32).write(&dir.path().join("ortho.tif"));
    let chm = GeoTiffFixture::heights(32, 32, |_, _| 5.0).write(&dir.path().join("chm.tif"));

    let broken = |_: &Tile, _: &DetectionParams| -> DetectorResult {
        Ok(vec![Detection::new(f64::NAN, f64::NAN, f64::NAN, f64::NAN, 0.5)])
    };
    let output = TreeKit::new(small_tiles()).unwrap()
        .process(&image, &chm, &broken, &dir.path().join("out"), |_, _| {}).unwrap();
    std::assert_eq!(output.raw_detections, 1);
    std::assert_eq!(output.accepted_points, 0);
    std::assert_eq!(output.tree_count, 0);
}

#[test]
fn test_nodata_heights_are_skipped() {
    let dir = TempDir::new().unwrap();
    let image = GeoTiffFixture::rgb(32, 32).write(&dir.path().join("ortho.tif"));
    let mut chm = GeoTiffFixture::heights(32, 32, |_, _| 7.0);
    chm.nodata = Some("7".to_string());
    let chm = chm.write(&dir.path().join("chm.tif"));

    let centre = |_: &Tile, _: &DetectionParams| -> DetectorResult { Ok(vec![Detection::new(10.0, 10.0, 20.0, 20.0, 0.5)]) };
    let output = TreeKit::new(small_tiles()).unwrap()
        .process(&image, &chm, &centre, &dir.path().join("out"), |_, _| {}).unwrap();
    std::assert_eq!(output.accepted_points, 0);
    std::assert_eq!(output.tree_count, 0);
}

#[test]
fn test_detector_failure_names_tile() {
    let dir = TempDir::new().unwrap();
    let (image, chm) = write_rasters(dir.path());

    let failing = |tile: &Tile, _: &DetectionParams| -> DetectorResult {
        if tile.origin_x == 32 && tile.origin_y == 32 {
            return Err("model crashed".into());
        }
        Ok(Vec::new())
    };
    let result = TreeKit::new(small_tiles()).unwrap().process(&image, &chm, &failing, &dir.path().join("out"), |_, _| {});

    match result {
        Err(TreeKitError::Detector { tile_x, tile_y, message }) => {
            std::assert_eq!((tile_x, tile_y), (32, 32));
            std::assert!(message.contains("model crashed"));
        },
        other => std::panic!("expected a detector error, got {:?}", other.map(|o| o.tree_count)),
    }
    std::assert!(!dir.path().join("out").join("Points_shapefile.zip").exists());
}

#[test]
fn test_missing_crs_needs_override() {
    let dir = TempDir::new().unwrap();
    let mut ortho = GeoTiffFixture::rgb(32, 32);
    ortho.epsg = None;
    let image = ortho.write(&dir.path().join("ortho.tif"));
    let chm = GeoTiffFixture::heights(32, 32, |_, _| 5.0).write(&dir.path().join("chm.tif"));
    let nothing = |_: &Tile, _: &DetectionParams| -> DetectorResult { Ok(Vec::new()) };

    let result = TreeKit::new(small_tiles()).unwrap().process(&image, &chm, &nothing, &dir.path().join("a"), |_, _| {});
    std::assert!(matches!(result, Err(TreeKitError::Georeference { .. })));

    let config = PipelineConfig { assume_crs: Some("EPSG:32632".to_string()), ..small_tiles() };
    let output = TreeKit::new(config).unwrap().process(&image, &chm, &nothing, &dir.path().join("b"), |_, _| {}).unwrap();
    std::assert_eq!(output.tree_count, 0);
    std::assert!(dir.path().join("b").join("Points_shapefile.prj").exists());
}

#[test]
fn test_pixel_limit_rejects_before_detection() {
    let dir = TempDir::new().unwrap();
    let (image, chm) = write_rasters(dir.path());
    let config = PipelineConfig { max_raster_pixels: Some(1000), ..small_tiles() };

    let never = |_: &Tile, _: &DetectionParams| -> DetectorResult { std::panic!("detector must not run") };
    let result = TreeKit::new(config).unwrap().process(&image, &chm, &never, &dir.path().join("out"), |_, _| {});
    match result {
        Err(TreeKitError::RasterTooLarge { pixels, limit, .. }) => std::assert_eq!((pixels, limit), (4096, 1000)),
        other => std::panic!("expected a size error, got {:?}", other.map(|o| o.tree_count)),
    }
}
