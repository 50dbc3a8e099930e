//! Vector export of the detected trees
//!
//! [`VectorExporter`] writes the shapefile family and packages it;
//! [`FormatConverter`] derives OSM XML from the written shapefile and a
//! WGS84 GeoJSON collection from the in-memory dataset.

mod dataset;
mod dbf;
mod shapefile;
mod archive;
mod exporter;
mod osm;
mod features;
#[cfg(test)]
mod tests;

pub use dataset::{FieldValue, TreePoint, VectorDataset, FID_FIELD, MEMBERS_FIELD};
pub use dbf::{read_dbf, write_dbf, DbfField, DbfTable};
pub use shapefile::{read_shp, ShapeFile};
pub use archive::package;
pub use exporter::{ExportOutput, ShapefileComponents, VectorExporter};
pub use osm::{build_nodes, write_osm, NodeIdCounter, OsmNode};
pub use features::{to_feature_collection, write_geojson_file};

use std::fs;
use std::path::Path;

use geojson::FeatureCollection;
use log::info;

use crate::coordinate::{CoordinateSystem, CoordinateTransformer};
use crate::errors::{TreeKitError, TreeKitResult};

/// A shapefile read back from disk
#[derive(Debug, Clone, PartialEq)]
pub struct ShapefileContents {
    pub geometry: ShapeFile,
    pub table: DbfTable,
}

impl ShapefileContents {
    /// Reads `<path>` and the `.dbf` next to it
    pub fn read(shp_path: &Path) -> TreeKitResult<Self> {
        let shp_bytes = fs::read(shp_path).map_err(|e| TreeKitError::export(shp_path, e))?;
        let geometry = read_shp(&shp_bytes).map_err(|e| TreeKitError::export(shp_path, e))?;

        let dbf_path = shp_path.with_extension("dbf");
        let dbf_bytes = fs::read(&dbf_path).map_err(|e| TreeKitError::export(&dbf_path, e))?;
        let table = read_dbf(&dbf_bytes).map_err(|e| TreeKitError::export(&dbf_path, e))?;

        Ok(ShapefileContents { geometry, table })
    }

    pub fn field_names(&self) -> Vec<String> {
        self.table.fields.iter().map(|f| f.name.clone()).collect()
    }
}

/// Converts finished datasets into WGS84 formats
pub struct FormatConverter {
    transformer: CoordinateTransformer,
}

impl FormatConverter {
    /// Create a converter for data in `source`
    ///
    /// Fails if no reprojection from `source` to WGS84 is available.
    pub fn new(source: CoordinateSystem) -> TreeKitResult<Self> {
        Ok(FormatConverter { transformer: CoordinateTransformer::to_wgs84(source)? })
    }

    /// Re-reads a written shapefile and writes it as OSM XML
    ///
    /// # Returns
    /// The number of nodes written
    pub fn shapefile_to_osm(&self, shp_path: &Path, osm_path: &Path) -> TreeKitResult<usize> {
        let contents = ShapefileContents::read(shp_path)?;
        info!("Converting {} records from {} to OSM", contents.geometry.shapes.len(), shp_path.display());

        let nodes = build_nodes(&contents.geometry.shapes, &contents.field_names(), &contents.table.records, &self.transformer)?;
        osm::write_osm_file(osm_path, &nodes)?;
        Ok(nodes.len())
    }

    /// Reprojects the dataset into a GeoJSON feature collection
    pub fn to_geojson(&self, dataset: &VectorDataset) -> TreeKitResult<FeatureCollection> {
        to_feature_collection(dataset, &self.transformer)
    }
}
