//! Tiled detection pipeline
//!
//! Tiles are processed one after another. Each tile yields its own list of
//! height-checked world points; the lists are concatenated in tile order
//! into a [`DetectionSet`] before the global clustering step.

mod tiling;
mod mapping;
mod height_filter;
mod cluster;
#[cfg(test)]
mod tests;

pub use tiling::{Tile, TileGrid, TileSource, Tiles};
pub use mapping::CoordinateMapper;
pub use height_filter::HeightFilter;
pub use cluster::{Cluster, ClusterDeduplicator};

use log::{debug, info};

use crate::coordinate::Point;
use crate::detector::{DetectionParams, Detector};
use crate::errors::{TreeKitError, TreeKitResult};

/// Points accepted across all tiles of one run
#[derive(Debug, Clone, Default)]
pub struct DetectionSet {
    /// Accepted points in tile order
    pub points: Vec<Point>,
    /// Tiles processed
    pub tiles: usize,
    /// Boxes returned by the detector before height filtering
    pub raw_detections: usize,
}

impl DetectionSet {
    /// Appends one tile's accepted points
    pub fn merge(&mut self, tile_points: Vec<Point>, raw_detections: usize) {
        self.points.extend(tile_points);
        self.raw_detections += raw_detections;
        self.tiles += 1;
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Detection, mapping and height filtering for every tile of a raster
pub struct TilePipeline<'a, D: Detector + ?Sized> {
    detector: &'a D,
    mapper: CoordinateMapper,
    filter: &'a HeightFilter,
    params: DetectionParams,
}

impl<'a, D: Detector + ?Sized> TilePipeline<'a, D> {
    pub fn new(detector: &'a D, mapper: CoordinateMapper, filter: &'a HeightFilter, params: DetectionParams) -> Self {
        TilePipeline { detector, mapper, filter, params }
    }

    /// Runs the detector on one tile and keeps the points passing the filter
    ///
    /// # Returns
    /// The accepted points and the number of boxes the detector returned
    pub fn process_tile(&self, tile: &Tile) -> TreeKitResult<(Vec<Point>, usize)> {
        let detections = self.detector.detect(tile, &self.params)
            .map_err(|e| TreeKitError::Detector {
                tile_x: tile.origin_x,
                tile_y: tile.origin_y,
                message: e.to_string(),
            })?;

        let points: Vec<Point> = detections.iter()
            .map(|detection| self.mapper.map(tile.origin_x, tile.origin_y, detection))
            .filter(|point| self.filter.accepts(point))
            .collect();

        debug!("Tile ({}, {}): {} boxes, {} kept", tile.origin_x, tile.origin_y, detections.len(), points.len());
        Ok((points, detections.len()))
    }

    /// Processes every tile of the grid
    ///
    /// # Arguments
    /// * `grid` - Tiling of the primary raster
    /// * `source` - Pixel source for the tiles
    /// * `progress` - Called after each tile with `(done, total)`
    pub fn run<S, P>(&self, grid: &TileGrid, source: &mut S, mut progress: P) -> TreeKitResult<DetectionSet>
    where
        S: TileSource + ?Sized,
        P: FnMut(usize, usize),
    {
        let total = grid.tile_count();
        info!("Running {} detector over {} tiles", self.detector.name(), total);

        let mut set = DetectionSet::default();
        for tile in grid.tiles(source) {
            let tile = tile?;
            let (points, raw) = self.process_tile(&tile)?;
            set.merge(points, raw);
            progress(set.tiles, total);
        }

        info!("Detector returned {} boxes; {} passed the height filter", set.raw_detections, set.len());
        Ok(set)
    }
}
