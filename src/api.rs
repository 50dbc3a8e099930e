//! Library entry point
//!
//! [`TreeKit`] runs the whole pipeline for one raster pair: tiled detection,
//! height filtering, clustering, shapefile export and the OSM and GeoJSON
//! conversions.

use std::path::{Path, PathBuf};

use geojson::FeatureCollection;
use log::{info, warn};

use crate::config::PipelineConfig;
use crate::coordinate::CoordinateSystem;
use crate::detector::Detector;
use crate::errors::{TreeKitError, TreeKitResult};
use crate::pipeline::{ClusterDeduplicator, CoordinateMapper, DetectionSet, HeightFilter, TileGrid, TilePipeline};
use crate::raster::{GeoRaster, HeightGrid};
use crate::vector::{write_geojson_file, FormatConverter, VectorDataset, VectorExporter};

/// Artifacts and counts of one run
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    /// `<stem>.zip` holding the shapefile components
    pub archive: PathBuf,
    /// Number of trees after clustering
    pub tree_count: usize,
    /// `<stem>.osm`
    pub osm: PathBuf,
    /// The trees in WGS84
    pub geojson: FeatureCollection,
    /// `<stem>.geojson`, when written
    pub geojson_path: Option<PathBuf>,
    /// Tiles processed
    pub tiles: usize,
    /// Boxes returned by the detector before height filtering
    pub raw_detections: usize,
    /// Points that passed the height filter
    pub accepted_points: usize,
}

/// Main interface to the TreeKit library
pub struct TreeKit {
    config: PipelineConfig,
}

impl TreeKit {
    /// Create a TreeKit instance with validated configuration
    pub fn new(config: PipelineConfig) -> TreeKitResult<Self> {
        config.validate()?;
        Ok(TreeKit { config })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Detects trees in `image`, validated against the canopy heights in `chm`
    ///
    /// # Arguments
    /// * `image` - Orthophoto GeoTIFF, tiled for the detector
    /// * `chm` - Canopy height GeoTIFF in the same CRS
    /// * `detector` - Box detector run on each tile
    /// * `output_dir` - Directory receiving the artifacts
    /// * `progress` - Called after each tile with `(done, total)`
    ///
    /// # Returns
    /// Artifact paths, the tree count and the WGS84 feature collection
    pub fn process<D, P>(
        &self,
        image: &Path,
        chm: &Path,
        detector: &D,
        output_dir: &Path,
        progress: P,
    ) -> TreeKitResult<ProcessOutput>
    where
        D: Detector + ?Sized,
        P: FnMut(usize, usize),
    {
        let limits = self.config.raster_limits();
        let mut raster = GeoRaster::open(image, &limits)?;
        let crs = self.resolve_crs(&raster)?;

        let mut height_raster = GeoRaster::open(chm, &limits)?;
        if let Some(height_crs) = height_raster.crs() {
            if height_crs != crs {
                warn!("Height raster CRS {} differs from {}; assuming the same coordinate space",
                      height_crs.description(), crs.description());
            }
        }
        let grid = HeightGrid::from_raster(&mut height_raster)?;
        drop(height_raster);

        // Fails on an unsupported CRS before any tile is read
        let converter = FormatConverter::new(crs)?;

        let filter = HeightFilter::new(grid, self.config.height_threshold);
        let tiles = TileGrid::new(raster.width(), raster.height(), self.config.step(),
                                  self.config.tile_size, self.config.tile_size)?;
        let mapper = CoordinateMapper::new(*raster.transform());
        let pipeline = TilePipeline::new(detector, mapper, &filter, self.config.detection_params());
        let detections = pipeline.run(&tiles, &mut raster, progress)?;

        self.finish(detections, crs, converter, output_dir)
    }

    /// Clusters accepted points and writes every artifact
    fn finish(
        &self,
        detections: DetectionSet,
        crs: CoordinateSystem,
        converter: FormatConverter,
        output_dir: &Path,
    ) -> TreeKitResult<ProcessOutput> {
        let deduplicator = ClusterDeduplicator::new(self.config.cluster_eps, self.config.min_points)?;
        let clusters = deduplicator.deduplicate(&detections.points);
        let dataset = VectorDataset::from_clusters(crs, &clusters);

        let exporter = VectorExporter::new(output_dir, self.config.output_stem.as_str());
        let export = exporter.export(&dataset)?;

        let osm = exporter.path_for("osm");
        converter.shapefile_to_osm(&export.components.shp, &osm)?;

        let geojson = converter.to_geojson(&dataset)?;
        let geojson_path = if self.config.write_geojson {
            let path = exporter.path_for("geojson");
            write_geojson_file(&path, &geojson)?;
            Some(path)
        } else {
            None
        };

        info!("Found {} trees in {} tiles", dataset.len(), detections.tiles);
        Ok(ProcessOutput {
            archive: export.archive,
            tree_count: dataset.len(),
            osm,
            geojson,
            geojson_path,
            tiles: detections.tiles,
            raw_detections: detections.raw_detections,
            accepted_points: detections.len(),
        })
    }

    /// CRS of the primary raster, or the configured fallback
    fn resolve_crs(&self, raster: &GeoRaster) -> TreeKitResult<CoordinateSystem> {
        match (raster.crs(), self.config.assumed_crs()?) {
            (Some(crs), _) => Ok(crs),
            (None, Some(assumed)) => {
                warn!("{} declares no CRS, assuming {}", raster.path().display(), assumed.description());
                Ok(assumed)
            },
            (None, None) => Err(TreeKitError::Georeference {
                path: raster.path().to_path_buf(),
                reason: "no CRS in GeoKey directory; set assume_crs to override".to_string(),
            }),
        }
    }
}
