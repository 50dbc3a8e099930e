//! Tests for shapefile export and packaging

extern crate std;

use std::fs::{self, File};

use tempfile::TempDir;
use zip::ZipArchive;

use crate::coordinate::{CoordinateSystem, Point};
use crate::errors::TreeKitError;
use crate::pipeline::Cluster;
use crate::vector::{package, FieldValue, ShapefileContents, VectorDataset, VectorExporter};

fn dataset(crs: CoordinateSystem) -> VectorDataset {
    VectorDataset::from_clusters(crs, &[
        Cluster { centroid: Point::new(500100.0, 4000200.0), members: 3 },
        Cluster { centroid: Point::new(500150.5, 4000180.5), members: 1 },
    ])
}

fn entry_names(path: &std::path::Path) -> Vec<String> {
    let mut archive = ZipArchive::new(File::open(path).unwrap()).unwrap();
    (0..archive.len()).map(|i| archive.by_index(i).unwrap().name().to_string()).collect()
}

#[test]
fn test_export_writes_components_and_archive() {
    let dir = TempDir::new().unwrap();
    let exporter = VectorExporter::new(dir.path(), "Points_shapefile");
    let output = exporter.export(&dataset(CoordinateSystem::UTM(32, true))).unwrap();

    std::assert_eq!(output.feature_count, 2);
    std::assert_eq!(output.archive, dir.path().join("Points_shapefile.zip"));
    std::assert!(output.components.prj.is_some());
    std::assert_eq!(entry_names(&output.archive), vec![
        "Points_shapefile.shp", "Points_shapefile.shx", "Points_shapefile.dbf", "Points_shapefile.prj",
    ]);
    std::assert!(!dir.path().join("Points_shapefile.zip.partial").exists());

    let prj = fs::read_to_string(dir.path().join("Points_shapefile.prj")).unwrap();
    std::assert!(prj.contains("UTM_Zone_32N"));
}

#[test]
fn test_written_shapefile_reads_back() {
    let dir = TempDir::new().unwrap();
    let exporter = VectorExporter::new(dir.path(), "trees");
    exporter.export(&dataset(CoordinateSystem::UTM(32, true))).unwrap();

    let contents = ShapefileContents::read(&dir.path().join("trees.shp")).unwrap();
    std::assert_eq!(contents.field_names(), vec!["FID", "MEMBERS"]);
    std::assert_eq!(contents.geometry.shapes[1], vec![Point::new(500150.5, 4000180.5)]);
    std::assert_eq!(contents.geometry.bounds, (500100.0, 4000180.5, 500150.5, 4000200.0));
    std::assert_eq!(contents.table.records[0], vec![FieldValue::Integer(0), FieldValue::Integer(3)]);
    std::assert_eq!(contents.table.records[1], vec![FieldValue::Integer(1), FieldValue::Integer(1)]);
}

#[test]
fn test_reexport_is_byte_identical() {
    let dir = TempDir::new().unwrap();
    let exporter = VectorExporter::new(dir.path(), "trees");
    let data = dataset(CoordinateSystem::UTM(32, true));

    exporter.export(&data).unwrap();
    let first: Vec<Vec<u8>> = ["shp", "shx", "dbf", "prj", "zip"].iter()
        .map(|ext| fs::read(exporter.path_for(ext)).unwrap())
        .collect();

    exporter.export(&data).unwrap();
    let second: Vec<Vec<u8>> = ["shp", "shx", "dbf", "prj", "zip"].iter()
        .map(|ext| fs::read(exporter.path_for(ext)).unwrap())
        .collect();

    std::assert_eq!(first, second);
}

#[test]
fn test_empty_dataset_exports() {
    let dir = TempDir::new().unwrap();
    let exporter = VectorExporter::new(dir.path(), "empty");
    let output = exporter.export(&VectorDataset::new(CoordinateSystem::WGS84, Vec::new())).unwrap();

    std::assert_eq!(output.feature_count, 0);
    std::assert_eq!(entry_names(&output.archive).len(), 4);

    let contents = ShapefileContents::read(&output.components.shp).unwrap();
    std::assert!(contents.geometry.shapes.is_empty());
    std::assert!(contents.table.records.is_empty());
    std::assert_eq!(contents.field_names(), vec!["FID", "MEMBERS"]);
}

#[test]
fn test_unknown_crs_skips_prj() {
    let dir = TempDir::new().unwrap();
    let exporter = VectorExporter::new(dir.path(), "trees");
    let output = exporter.export(&dataset(CoordinateSystem::Other(31370))).unwrap();

    std::assert!(output.components.prj.is_none());
    std::assert!(!dir.path().join("trees.prj").exists());
    std::assert_eq!(entry_names(&output.archive).len(), 3);
}

#[test]
fn test_export_creates_output_directory() {
    let dir = TempDir::new().unwrap();
    let nested = dir.path().join("a").join("b");
    VectorExporter::new(&nested, "trees").export(&dataset(CoordinateSystem::WGS84)).unwrap();
    std::assert!(nested.join("trees.zip").is_file());
}

#[test]
fn test_package_refuses_missing_component() {
    let dir = TempDir::new().unwrap();
    let present = dir.path().join("a.shp");
    fs::write(&present, b"x").unwrap();

    let archive = dir.path().join("a.zip");
    let result = package(&archive, &[present, dir.path().join("a.dbf")]);
    std::assert!(matches!(result, Err(TreeKitError::Archive { .. })));
    std::assert!(!archive.exists());
}
