//! Shapefile export and packaging

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::errors::{TreeKitError, TreeKitResult};

use super::archive::package;
use super::dataset::VectorDataset;
use super::dbf::{write_dbf, DbfField};
use super::shapefile::{write_points_shp, write_points_shx};

/// Width of the integer attribute columns
const INTEGER_WIDTH: u8 = 10;

/// Paths of the written shapefile components
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapefileComponents {
    pub shp: PathBuf,
    pub shx: PathBuf,
    pub dbf: PathBuf,
    /// Absent when the CRS has no known WKT
    pub prj: Option<PathBuf>,
}

impl ShapefileComponents {
    /// Components in archive order
    pub fn files(&self) -> Vec<PathBuf> {
        let mut files = vec![self.shp.clone(), self.shx.clone(), self.dbf.clone()];
        files.extend(self.prj.clone());
        files
    }
}

/// Result of one export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOutput {
    pub archive: PathBuf,
    pub components: ShapefileComponents,
    pub feature_count: usize,
}

/// Writes a dataset as `<stem>.shp/.shx/.dbf/.prj` and zips them
#[derive(Debug, Clone)]
pub struct VectorExporter {
    directory: PathBuf,
    stem: String,
}

impl VectorExporter {
    pub fn new(directory: impl Into<PathBuf>, stem: impl Into<String>) -> Self {
        VectorExporter { directory: directory.into(), stem: stem.into() }
    }

    /// Path of a component with the given extension
    pub fn path_for(&self, extension: &str) -> PathBuf {
        self.directory.join(format!("{}.{}", self.stem, extension))
    }

    /// Writes the shapefile components and the archive
    ///
    /// # Returns
    /// The archive path, component paths and feature count
    pub fn export(&self, dataset: &VectorDataset) -> TreeKitResult<ExportOutput> {
        fs::create_dir_all(&self.directory).map_err(|e| TreeKitError::export(&self.directory, e))?;

        let components = self.write_components(dataset)?;
        let archive = package(&self.path_for("zip"), &components.files())?;

        info!("Exported {} features to {}", dataset.len(), archive.display());
        Ok(ExportOutput { archive, components, feature_count: dataset.len() })
    }

    /// Writes `.shp`, `.shx`, `.dbf` and, when possible, `.prj`
    pub fn write_components(&self, dataset: &VectorDataset) -> TreeKitResult<ShapefileComponents> {
        let bounds = dataset.bounds();
        let positions: Vec<_> = dataset.points().iter().map(|p| p.position).collect();

        let shp = self.path_for("shp");
        let mut bytes = Vec::new();
        write_points_shp(&mut bytes, &positions, bounds).map_err(|e| TreeKitError::export(&shp, e))?;
        write_file(&shp, &bytes)?;

        let shx = self.path_for("shx");
        let mut bytes = Vec::new();
        write_points_shx(&mut bytes, positions.len(), bounds).map_err(|e| TreeKitError::export(&shx, e))?;
        write_file(&shx, &bytes)?;

        let dbf = self.path_for("dbf");
        let fields: Vec<DbfField> = VectorDataset::field_names().iter()
            .map(|name| DbfField::integer(name, INTEGER_WIDTH))
            .collect();
        let records: Vec<_> = (0..dataset.len()).map(|i| dataset.attributes(i).to_vec()).collect();
        let mut bytes = Vec::new();
        write_dbf(&mut bytes, &fields, &records).map_err(|e| TreeKitError::export(&dbf, e))?;
        write_file(&dbf, &bytes)?;

        let prj = match dataset.crs().esri_wkt() {
            Some(wkt) => {
                let path = self.path_for("prj");
                write_file(&path, wkt.as_bytes())?;
                Some(path)
            },
            None => {
                let stale = self.path_for("prj");
                if stale.exists() {
                    fs::remove_file(&stale).map_err(|e| TreeKitError::export(&stale, e))?;
                }
                warn!("No WKT known for {}, writing shapefile without .prj", dataset.crs());
                None
            },
        };

        Ok(ShapefileComponents { shp, shx, dbf, prj })
    }
}

/// Writes and flushes a whole file
fn write_file(path: &Path, bytes: &[u8]) -> TreeKitResult<()> {
    let mut file = fs::File::create(path).map_err(|e| TreeKitError::export(path, e))?;
    file.write_all(bytes).map_err(|e| TreeKitError::export(path, e))?;
    file.sync_all().map_err(|e| TreeKitError::export(path, e))
}
